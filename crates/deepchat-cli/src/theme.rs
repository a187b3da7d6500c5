use ratatui::style::Color;

#[derive(Clone)]
pub struct Theme {
    pub name: &'static str,
    pub fg: Color,
    pub accent: Color,
    pub muted: Color,
    pub error: Color,
    pub warning: Color,
    pub user_color: Color,
    pub assistant_color: Color,
    pub system_color: Color,
    pub code_fg: Color,
    pub sidebar_bg: Color,
    pub sidebar_label: Color,
    pub border: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            name: "dark",
            fg: Color::Rgb(220, 220, 220),
            accent: Color::Rgb(122, 162, 247),
            muted: Color::Rgb(100, 100, 100),
            error: Color::Rgb(247, 118, 142),
            warning: Color::Rgb(224, 175, 104),
            user_color: Color::Cyan,
            assistant_color: Color::Green,
            system_color: Color::Yellow,
            code_fg: Color::Rgb(200, 200, 160),
            sidebar_bg: Color::Rgb(36, 40, 48),
            sidebar_label: Color::Rgb(224, 175, 104),
            border: Color::Rgb(60, 60, 60),
        }
    }

    /// Sky-blue sidebar with orange labels.
    pub fn sky() -> Self {
        Self {
            name: "sky",
            fg: Color::Rgb(230, 230, 230),
            accent: Color::Rgb(135, 206, 235),
            muted: Color::Rgb(110, 120, 130),
            error: Color::Rgb(255, 99, 71),
            warning: Color::Rgb(255, 165, 0),
            user_color: Color::Rgb(135, 206, 235),
            assistant_color: Color::Rgb(144, 238, 144),
            system_color: Color::Rgb(255, 165, 0),
            code_fg: Color::Rgb(220, 220, 170),
            sidebar_bg: Color::Rgb(135, 206, 235),
            sidebar_label: Color::Rgb(255, 140, 0),
            border: Color::Rgb(0, 0, 255),
        }
    }

    pub fn dracula() -> Self {
        Self {
            name: "dracula",
            fg: Color::Rgb(248, 248, 242),
            accent: Color::Rgb(255, 121, 198),
            muted: Color::Rgb(98, 114, 164),
            error: Color::Rgb(255, 85, 85),
            warning: Color::Rgb(241, 250, 140),
            user_color: Color::Rgb(139, 233, 253),
            assistant_color: Color::Rgb(80, 250, 123),
            system_color: Color::Rgb(241, 250, 140),
            code_fg: Color::Rgb(241, 250, 140),
            sidebar_bg: Color::Rgb(40, 42, 54),
            sidebar_label: Color::Rgb(255, 184, 108),
            border: Color::Rgb(68, 71, 90),
        }
    }

    pub fn find(name: &str) -> Option<Self> {
        match name {
            "dark" => Some(Self::dark()),
            "sky" => Some(Self::sky()),
            "dracula" => Some(Self::dracula()),
            _ => None,
        }
    }

    /// Like [`find`](Self::find), falling back to `dark`.
    pub fn by_name(name: &str) -> Self {
        Self::find(name).unwrap_or_else(Self::dark)
    }

    pub fn all_names() -> &'static [&'static str] {
        &["dark", "sky", "dracula"]
    }
}
