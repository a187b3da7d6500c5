//! Markdown for assistant replies: headings, emphasis, lists, inline code,
//! fenced code blocks, rules. A leading `<think>` section from a reasoning
//! model is split off and rendered dimmed, outside the markdown pass.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::theme::Theme;

#[derive(Debug, Clone, Copy)]
pub struct MarkdownStyle {
    pub text: Style,
    pub code: Style,
    pub muted: Style,
}

impl MarkdownStyle {
    pub fn from_theme(theme: &Theme) -> Self {
        Self {
            text: Style::default().fg(theme.assistant_color),
            code: Style::default().fg(theme.code_fg),
            muted: Style::default().fg(theme.muted).add_modifier(Modifier::ITALIC),
        }
    }
}

struct Renderer {
    style: MarkdownStyle,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    bold: usize,
    italic: usize,
    heading: bool,
    in_code_block: bool,
    /// Next number per open list; `None` for bullet lists.
    lists: Vec<Option<u64>>,
}

impl Renderer {
    fn new(style: MarkdownStyle) -> Self {
        Self {
            style,
            lines: Vec::new(),
            current: Vec::new(),
            bold: 0,
            italic: 0,
            heading: false,
            in_code_block: false,
            lists: Vec::new(),
        }
    }

    fn text_style(&self) -> Style {
        let mut style = self.style.text;
        if self.bold > 0 || self.heading {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.italic > 0 {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if self.heading {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        style
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            let spans = std::mem::take(&mut self.current);
            self.lines.push(Line::from(spans));
        }
    }

    fn blank(&mut self) {
        self.flush();
        if self.lines.last().is_some_and(|l| !l.spans.is_empty()) {
            self.lines.push(Line::default());
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.in_code_block {
            for line in text.lines() {
                self.lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(line.to_string(), self.style.code),
                ]));
            }
            return;
        }
        self.current
            .push(Span::styled(text.to_string(), self.text_style()));
    }

    fn push_html(&mut self, html: &str) {
        for (i, part) in html.split('\n').enumerate() {
            if i > 0 {
                self.flush();
            }
            if !part.trim().is_empty() {
                self.current
                    .push(Span::styled(part.to_string(), self.style.muted));
            }
        }
    }

    fn start_item(&mut self) {
        self.flush();
        let depth = self.lists.len().saturating_sub(1);
        let marker = match self.lists.last_mut() {
            Some(Some(n)) => {
                let marker = format!("{n}. ");
                *n += 1;
                marker
            }
            _ => "• ".to_string(),
        };
        self.current.push(Span::raw("  ".repeat(depth)));
        self.current.push(Span::styled(marker, self.style.muted));
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Heading { .. }) => {
                self.flush();
                self.heading = true;
            }
            Event::End(TagEnd::Heading(_)) => {
                self.heading = false;
                self.blank();
            }
            Event::End(TagEnd::Paragraph) => {
                if self.lists.is_empty() {
                    self.blank();
                } else {
                    self.flush();
                }
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                self.flush();
                self.in_code_block = true;
                let lang = match kind {
                    CodeBlockKind::Fenced(lang) => lang.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                self.lines.push(Line::from(Span::styled(
                    format!("```{lang}"),
                    self.style.muted,
                )));
            }
            Event::End(TagEnd::CodeBlock) => {
                self.in_code_block = false;
                self.lines
                    .push(Line::from(Span::styled("```", self.style.muted)));
                self.blank();
            }
            Event::Start(Tag::List(start)) => {
                self.flush();
                self.lists.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            Event::Start(Tag::Item) => self.start_item(),
            Event::End(TagEnd::Item) => self.flush(),
            Event::Start(Tag::Strong) => self.bold += 1,
            Event::End(TagEnd::Strong) => self.bold = self.bold.saturating_sub(1),
            Event::Start(Tag::Emphasis) => self.italic += 1,
            Event::End(TagEnd::Emphasis) => self.italic = self.italic.saturating_sub(1),
            Event::Text(text) => self.push_text(&text),
            Event::Code(code) => {
                self.current
                    .push(Span::styled(code.to_string(), self.style.code));
            }
            Event::SoftBreak | Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                self.lines
                    .push(Line::from(Span::styled("────────", self.style.muted)));
            }
            Event::Html(html) | Event::InlineHtml(html) => self.push_html(&html),
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().is_some_and(|l| l.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }
}

/// Split a reply into its leading `<think>` section, if any, and the answer.
/// An unclosed section (a reply cut off mid-thought) is all reasoning.
pub fn split_reasoning(text: &str) -> (Option<&str>, &str) {
    let Some(rest) = text.trim_start().strip_prefix("<think>") else {
        return (None, text);
    };
    match rest.split_once("</think>") {
        Some((reasoning, answer)) => (Some(reasoning), answer),
        None => (Some(rest), ""),
    }
}

pub fn render_markdown(text: &str, style: MarkdownStyle) -> Vec<Line<'static>> {
    let (reasoning, answer) = split_reasoning(text);

    let mut lines: Vec<Line<'static>> = Vec::new();
    if let Some(reasoning) = reasoning {
        lines.extend(
            reasoning
                .trim_matches('\n')
                .lines()
                .map(|l| Line::from(Span::styled(l.trim_end().to_string(), style.muted))),
        );
    }

    let mut renderer = Renderer::new(style);
    for event in Parser::new_ext(answer, Options::ENABLE_STRIKETHROUGH) {
        renderer.handle(event);
    }
    let body = renderer.finish();

    if !lines.is_empty() && !body.is_empty() {
        lines.push(Line::default());
    }
    lines.extend(body);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    fn style() -> MarkdownStyle {
        MarkdownStyle {
            text: Style::default().fg(Color::Green),
            code: Style::default().fg(Color::Yellow),
            muted: Style::default().fg(Color::DarkGray),
        }
    }

    fn plain(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_paragraphs_are_separated() {
        let lines = render_markdown("First.\n\nSecond.", style());
        let text: Vec<String> = lines.iter().map(plain).collect();
        assert_eq!(text, vec!["First.", "", "Second."]);
    }

    #[test]
    fn test_fenced_code_block() {
        let lines = render_markdown("```python\nprint(x)\n```", style());
        let text: Vec<String> = lines.iter().map(plain).collect();
        assert_eq!(text, vec!["```python", "  print(x)", "```"]);
        assert_eq!(lines[1].spans[1].style.fg, Some(Color::Yellow));
    }

    #[test]
    fn test_lists() {
        let lines = render_markdown("- one\n- two\n\n1. a\n2. b", style());
        let text: Vec<String> = lines.iter().map(plain).collect();
        assert_eq!(text, vec!["• one", "• two", "", "1. a", "2. b"]);
    }

    #[test]
    fn test_bold_and_inline_code() {
        let lines = render_markdown("Use **print** with `x`", style());
        assert_eq!(lines.len(), 1);
        let bold = lines[0].spans.iter().find(|s| s.content == "print").unwrap();
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
        let code = lines[0].spans.iter().find(|s| s.content == "x").unwrap();
        assert_eq!(code.style.fg, Some(Color::Yellow));
    }

    fn span_with<'a>(lines: &'a [Line<'static>], text: &str) -> &'a Span<'static> {
        lines
            .iter()
            .flat_map(|l| l.spans.iter())
            .find(|s| s.content.contains(text))
            .unwrap()
    }

    #[test]
    fn test_answer_right_after_closing_think_is_not_dimmed() {
        let lines = render_markdown("<think>\nweighing\n</think>\nAnswer here.", style());
        assert_eq!(span_with(&lines, "weighing").style.fg, Some(Color::DarkGray));
        assert_eq!(span_with(&lines, "Answer here.").style.fg, Some(Color::Green));
    }

    #[test]
    fn test_markdown_after_think_is_rendered() {
        let lines = render_markdown("<think>plan</think>**Use** `Vec`", style());
        let text: Vec<String> = lines.iter().map(plain).collect();
        assert_eq!(text, vec!["plan", "", "Use Vec"]);
        assert!(span_with(&lines, "Use")
            .style
            .add_modifier
            .contains(Modifier::BOLD));
        assert_eq!(span_with(&lines, "Vec").style.fg, Some(Color::Yellow));
    }

    #[test]
    fn test_unclosed_think_is_all_reasoning() {
        assert_eq!(split_reasoning("<think>still going"), (Some("still going"), ""));
        assert_eq!(split_reasoning("no tags"), (None, "no tags"));
        let lines = render_markdown("<think>still going", style());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].spans[0].style.fg, Some(Color::DarkGray));
    }

    #[test]
    fn test_think_block_is_dimmed() {
        let lines = render_markdown("<think>\nweighing options\n</think>\n\nAnswer.", style());
        let reasoning = lines
            .iter()
            .flat_map(|l| l.spans.iter())
            .find(|s| s.content.contains("weighing"))
            .unwrap();
        assert_eq!(reasoning.style.fg, Some(Color::DarkGray));
        let answer = lines
            .iter()
            .flat_map(|l| l.spans.iter())
            .find(|s| s.content == "Answer.")
            .unwrap();
        assert_eq!(answer.style.fg, Some(Color::Green));
    }
}
