use anyhow::{bail, Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use deepchat_core::context::generate;
use deepchat_core::llm::LocalModel;
use deepchat_core::{
    ChatError, ChatSession, Generation, GenerationError, LlmClient, OllamaClient, PendingExchange,
    Role, Settings, SubmitOutcome, Turn,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Terminal,
};
use std::io;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::commands::{self, CommandResult};
use crate::markdown::{render_markdown, MarkdownStyle};
use crate::theme::Theme;

const TITLE: &str = "DeepSeek Powered ChatBot";
const CAPTION: &str = "🚀 Your AI Assistant with Debugging Powers";
const SIDEBAR_WIDTH: u16 = 34;

// ── Single-prompt mode ──────────────────────────────────────────────────

pub async fn run_single_prompt(settings: &Settings, prompt: &str) -> Result<()> {
    let llm = settings.build_llm_client();
    let mut session = ChatSession::from_settings(settings);

    match session.submit(&llm, prompt).await {
        Ok(SubmitOutcome::Replied(reply)) => {
            println!("{reply}");
            Ok(())
        }
        Ok(SubmitOutcome::Ignored) => bail!("prompt is empty"),
        Err(e) => Err(e).with_context(|| format!("model '{}' did not answer", llm.model())),
    }
}

// ── Interactive TUI ─────────────────────────────────────────────────────

/// Shell-side messages (command output, errors). Never part of the
/// conversation log and never sent to the model.
#[derive(Clone)]
struct Notice {
    /// Rendered after this many log turns.
    after_turns: usize,
    text: String,
    is_error: bool,
    timestamp: String,
}

/// What a running background task is doing.
enum WorkKind {
    Submit(String),
    DiscoverModels,
}

/// The one background request the loop is waiting on. Ctrl+C aborts it.
struct InFlight {
    id: u64,
    kind: WorkKind,
    handle: JoinHandle<()>,
}

/// Results sent back from background tasks, tagged with the request id so a
/// late result from a cancelled request can be told apart.
enum WorkerEvent {
    Reply {
        id: u64,
        exchange: PendingExchange,
        result: std::result::Result<Generation, GenerationError>,
    },
    Models {
        id: u64,
        result: std::result::Result<Vec<LocalModel>, GenerationError>,
    },
}

impl WorkerEvent {
    fn id(&self) -> u64 {
        match self {
            WorkerEvent::Reply { id, .. } | WorkerEvent::Models { id, .. } => *id,
        }
    }
}

struct AppState {
    // Input
    input: String,
    /// Cursor position in chars, not bytes.
    cursor_pos: usize,
    input_history: Vec<String>,
    history_pos: Option<usize>,

    // Chat
    session: ChatSession,
    llm: OllamaClient,
    notices: Vec<Notice>,
    scroll_offset: usize,

    // Processing state
    in_flight: Option<InFlight>,
    next_request_id: u64,
    worker_tx: mpsc::UnboundedSender<WorkerEvent>,
    worker_rx: mpsc::UnboundedReceiver<WorkerEvent>,
    status_text: String,

    // Display
    settings: Settings,
    should_quit: bool,
    show_sidebar: bool,
    theme: Theme,
}

impl AppState {
    fn new(settings: Settings) -> Self {
        let (worker_tx, worker_rx) = mpsc::unbounded_channel();
        Self {
            input: String::new(),
            cursor_pos: 0,
            input_history: Vec::new(),
            history_pos: None,

            session: ChatSession::from_settings(&settings),
            llm: settings.build_llm_client(),
            notices: Vec::new(),
            scroll_offset: 0,

            in_flight: None,
            next_request_id: 0,
            worker_tx,
            worker_rx,
            status_text: "Ready".into(),

            should_quit: false,
            show_sidebar: settings.ui.show_sidebar,
            theme: Theme::by_name(&settings.ui.theme),
            settings,
        }
    }

    /// Surface a problem found before the TUI came up, such as a config file
    /// that could not be parsed.
    fn with_startup_warning(mut self, warning: Option<String>) -> Self {
        if let Some(warning) = warning {
            self.notify_error(format!("⚠ {warning}"));
        }
        self
    }

    fn is_processing(&self) -> bool {
        self.in_flight.is_some()
    }

    fn next_id(&mut self) -> u64 {
        self.next_request_id += 1;
        self.next_request_id
    }

    /// Generate a reply for `input` on a background task. The log is only
    /// touched when the result comes back.
    fn start_submit(&mut self, input: String) {
        let Some(exchange) = self.session.prepare(&input) else {
            return;
        };
        tracing::debug!(
            session = self.session.id(),
            model = self.llm.model(),
            templates = exchange.chain().len(),
            "Submitting prompt chain"
        );

        let id = self.next_id();
        let llm = self.llm.clone();
        let tx = self.worker_tx.clone();
        let handle = tokio::spawn(async move {
            let result = generate(exchange.chain(), &llm).await;
            // The receiver is gone once the app has quit.
            let _ = tx.send(WorkerEvent::Reply {
                id,
                exchange,
                result,
            });
        });

        self.status_text = "Processing...".into();
        self.in_flight = Some(InFlight {
            id,
            kind: WorkKind::Submit(input),
            handle,
        });
        self.scroll_to_bottom();
    }

    fn start_discover_models(&mut self) {
        let id = self.next_id();
        let llm = self.llm.clone();
        let tx = self.worker_tx.clone();
        let handle = tokio::spawn(async move {
            let result = llm.list_models().await;
            let _ = tx.send(WorkerEvent::Models { id, result });
        });

        self.status_text = "Listing models...".into();
        self.in_flight = Some(InFlight {
            id,
            kind: WorkKind::DiscoverModels,
            handle,
        });
    }

    /// Abort the running request, if any. Returns whether one was running.
    fn cancel_in_flight(&mut self) -> bool {
        match self.in_flight.take() {
            Some(work) => {
                work.handle.abort();
                tracing::info!(session = self.session.id(), request = work.id, "Request cancelled");
                true
            }
            None => false,
        }
    }

    fn drain_worker_events(&mut self) {
        while let Ok(event) = self.worker_rx.try_recv() {
            handle_worker_event(self, event);
        }
    }

    fn notify(&mut self, text: impl Into<String>) {
        self.push_notice(text.into(), false);
    }

    fn notify_error(&mut self, text: impl Into<String>) {
        self.push_notice(text.into(), true);
    }

    fn push_notice(&mut self, text: String, is_error: bool) {
        self.notices.push(Notice {
            after_turns: self.session.log().len(),
            text,
            is_error,
            timestamp: now_str(),
        });
        self.scroll_to_bottom();
    }

    fn scroll_to_bottom(&mut self) {
        // Resolved on next draw
        self.scroll_offset = usize::MAX;
    }

    fn switch_model(&mut self, model: String) {
        self.settings.select_model(model.clone());
        self.llm = self.settings.build_llm_client();
        tracing::info!(model = %model, "Switched model");
        self.notify(format!("Model changed to: {model}"));
    }

    fn push_history(&mut self, input: String) {
        if !input.is_empty() && self.input_history.last() != Some(&input) {
            self.input_history.push(input);
        }
        self.history_pos = None;
    }

    fn history_prev(&mut self) {
        if self.input_history.is_empty() {
            return;
        }
        let pos = match self.history_pos {
            None => self.input_history.len().saturating_sub(1),
            Some(0) => 0,
            Some(p) => p - 1,
        };
        self.history_pos = Some(pos);
        self.set_input(self.input_history[pos].clone());
    }

    fn history_next(&mut self) {
        match self.history_pos {
            None => {}
            Some(pos) => {
                if pos + 1 >= self.input_history.len() {
                    self.history_pos = None;
                    self.set_input(String::new());
                } else {
                    self.history_pos = Some(pos + 1);
                    self.set_input(self.input_history[pos + 1].clone());
                }
            }
        }
    }

    fn set_input(&mut self, input: String) {
        self.cursor_pos = input.chars().count();
        self.input = input;
    }

    fn insert_char(&mut self, c: char) {
        let idx = byte_index(&self.input, self.cursor_pos);
        self.input.insert(idx, c);
        self.cursor_pos += 1;
    }

    fn backspace(&mut self) {
        if self.cursor_pos == 0 {
            return;
        }
        self.cursor_pos -= 1;
        let idx = byte_index(&self.input, self.cursor_pos);
        self.input.remove(idx);
    }

    fn delete(&mut self) {
        if self.cursor_pos < self.input.chars().count() {
            let idx = byte_index(&self.input, self.cursor_pos);
            self.input.remove(idx);
        }
    }
}

fn byte_index(s: &str, char_pos: usize) -> usize {
    s.char_indices()
        .nth(char_pos)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn run_tui(settings: Settings, startup_warning: Option<String>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = AppState::new(settings).with_startup_warning(startup_warning);
    tracing::info!(session = state.session.id(), model = state.llm.model(), "Session started");

    let result = event_loop(&mut terminal, &mut state).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
) -> Result<()> {
    loop {
        terminal.draw(|f| draw_ui(f, state))?;

        // Results from background tasks (non-blocking)
        state.drain_worker_events();

        // Keys stay live while a request runs, so Ctrl+C can abort it.
        if event::poll(std::time::Duration::from_millis(33))? {
            if let Event::Key(key) = event::read()? {
                handle_key(state, key);
            }
        }

        if state.should_quit {
            state.cancel_in_flight();
            break;
        }
    }
    Ok(())
}

fn handle_worker_event(state: &mut AppState, event: WorkerEvent) {
    if state.in_flight.as_ref().map(|w| w.id) != Some(event.id()) {
        tracing::debug!(request = event.id(), "Dropping result of a cancelled request");
        return;
    }
    state.in_flight = None;

    match event {
        WorkerEvent::Reply {
            exchange, result, ..
        } => match state.session.complete(exchange, result) {
            Ok(SubmitOutcome::Replied(_)) => {
                state.status_text = "Ready".into();
            }
            Ok(SubmitOutcome::Ignored) => {}
            Err(ChatError::Generation(e)) => {
                state.status_text = "Generation failed".into();
                state.notify_error(format!(
                    "⚠ {e}\nYour message was not added. Press ↑ to retry."
                ));
            }
            Err(e) => {
                state.status_text = "Error".into();
                state.notify_error(format!("⚠ {e}"));
            }
        },
        WorkerEvent::Models { result, .. } => match result {
            Ok(models) if models.is_empty() => {
                state.status_text = "Ready".into();
                state.notify("No models installed on the server. Try: ollama pull deepseek-r1");
            }
            Ok(models) => {
                state.status_text = "Ready".into();
                let active = state.llm.model().to_string();
                let list = models
                    .iter()
                    .map(|m| {
                        let marker = if m.name == active { "▸" } else { " " };
                        format!("  {marker} {} ({})", m.name, format_size(m.size))
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                state.notify(format!("Installed models:\n{list}\nUse /model <name> to switch."));
            }
            Err(e) => {
                state.status_text = "Server unavailable".into();
                state.notify_error(format!("⚠ Could not list models: {e}"));
            }
        },
    }
    state.scroll_to_bottom();
}

// ── Drawing ─────────────────────────────────────────────────────────────

fn draw_ui(f: &mut ratatui::Frame, state: &mut AppState) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // header
            Constraint::Min(5),    // chat
            Constraint::Length(3), // input
            Constraint::Length(1), // status
        ])
        .split(f.area());

    draw_header(f, main_chunks[0], &state.theme);

    let show_sidebar = state.show_sidebar && main_chunks[1].width >= SIDEBAR_WIDTH + 40;
    let chat_area = if show_sidebar {
        let h_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(40)])
            .split(main_chunks[1]);
        draw_sidebar(f, h_chunks[0], state);
        h_chunks[1]
    } else {
        main_chunks[1]
    };

    draw_chat(f, chat_area, state);
    draw_input(f, main_chunks[2], state);
    draw_status_bar(f, main_chunks[3], state);
}

fn draw_header(f: &mut ratatui::Frame, area: Rect, theme: &Theme) {
    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            TITLE,
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(CAPTION, Style::default().fg(theme.muted))),
    ]);
    f.render_widget(header, area);
}

fn draw_sidebar(f: &mut ratatui::Frame, area: Rect, state: &AppState) {
    let theme = &state.theme;
    let sidebar = Paragraph::new(sidebar_lines(state, area.width))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" ⚙ Configuration ")
                .border_style(Style::default().fg(theme.border)),
        )
        .style(Style::default().bg(theme.sidebar_bg))
        .wrap(Wrap { trim: false });
    f.render_widget(sidebar, area);
}

fn sidebar_lines(state: &AppState, width: u16) -> Vec<Line<'static>> {
    let theme = &state.theme;
    let label = Style::default()
        .fg(theme.sidebar_label)
        .add_modifier(Modifier::BOLD);
    let divider = Line::from(Span::styled(
        "─".repeat(width.saturating_sub(4) as usize),
        Style::default().fg(theme.border),
    ));

    let mut lines = vec![Line::from(Span::styled("Choose Model", label))];
    let active = state.llm.model();
    for model in &state.settings.llm.models {
        let (marker, style) = if model == active {
            ("▸ ", Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))
        } else {
            ("  ", Style::default().fg(theme.muted))
        };
        lines.push(Line::from(Span::styled(format!("{marker}{model}"), style)));
    }
    lines.push(Line::from(Span::styled(
        format!("  {}", state.llm.base_url()),
        Style::default().fg(theme.muted),
    )));

    lines.push(divider.clone());
    lines.push(Line::from(Span::styled("Model Capabilities", label)));
    for capability in &state.settings.ui.capabilities {
        lines.push(Line::from(Span::styled(
            format!("- {capability}"),
            Style::default().fg(theme.fg),
        )));
    }

    if !state.settings.ui.credits.is_empty() {
        lines.push(divider);
        for credit in &state.settings.ui.credits {
            lines.push(Line::from(Span::styled(
                credit.clone(),
                Style::default().fg(theme.muted),
            )));
        }
    }
    lines
}

fn draw_chat(f: &mut ratatui::Frame, area: Rect, state: &mut AppState) {
    let chat_lines = build_chat_lines(state);

    // Rows after wrapping, minus borders.
    let inner_width = area.width.saturating_sub(2).max(1) as usize;
    let total_rows: usize = chat_lines
        .iter()
        .map(|l| l.width().div_ceil(inner_width).max(1))
        .sum();
    let visible_height = area.height.saturating_sub(2) as usize;
    let max_scroll = total_rows.saturating_sub(visible_height);

    if state.scroll_offset == usize::MAX || state.scroll_offset > max_scroll {
        state.scroll_offset = max_scroll;
    }

    let theme = &state.theme;
    let chat = Paragraph::new(Text::from(chat_lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Chat ")
                .border_style(Style::default().fg(theme.border)),
        )
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset.min(u16::MAX as usize) as u16, 0));
    f.render_widget(chat, area);

    if total_rows > visible_height {
        let mut scrollbar_state = ScrollbarState::new(max_scroll).position(state.scroll_offset);
        f.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("^"))
                .end_symbol(Some("v")),
            area,
            &mut scrollbar_state,
        );
    }
}

fn build_chat_lines(state: &AppState) -> Vec<Line<'static>> {
    let theme = &state.theme;
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut notices = state.notices.iter().peekable();

    for (i, turn) in state.session.log().iter().enumerate() {
        while let Some(notice) = notices.next_if(|n| n.after_turns <= i) {
            lines.extend(render_notice_lines(notice, theme));
            lines.push(Line::raw(""));
        }
        lines.extend(render_turn_lines(turn, theme));
        lines.push(Line::raw(""));
    }
    for notice in notices {
        lines.extend(render_notice_lines(notice, theme));
        lines.push(Line::raw(""));
    }

    match state.in_flight.as_ref().map(|w| &w.kind) {
        Some(WorkKind::Submit(input)) => {
            // Not in the log yet: it is only recorded once the model answers.
            lines.extend(render_turn_lines(&Turn::user(input.clone()), theme));
            lines.push(Line::raw(""));
            lines.push(Line::from(Span::styled(
                "  🧠 Processing... (Ctrl+C to cancel)",
                Style::default().fg(theme.accent).add_modifier(Modifier::DIM),
            )));
        }
        Some(WorkKind::DiscoverModels) => {
            lines.push(Line::from(Span::styled(
                "  Asking the server for its models...",
                Style::default().fg(theme.accent).add_modifier(Modifier::DIM),
            )));
        }
        None => {}
    }

    lines
}

fn render_turn_lines(turn: &Turn, theme: &Theme) -> Vec<Line<'static>> {
    let (prefix, color) = match turn.role() {
        Role::User => ("You > ", theme.user_color),
        Role::Assistant => ("AI > ", theme.assistant_color),
        Role::System => ("System > ", theme.system_color),
    };
    let prefix_style = Style::default().fg(color).add_modifier(Modifier::BOLD);
    let indent = " ".repeat(prefix.chars().count());

    let body: Vec<Line<'static>> = match turn.role() {
        Role::Assistant => render_markdown(turn.content(), MarkdownStyle::from_theme(theme)),
        Role::User | Role::System => turn
            .content()
            .lines()
            .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(color))))
            .collect(),
    };

    let mut lines = Vec::with_capacity(body.len().max(1));
    for (i, line) in body.into_iter().enumerate() {
        let lead = if i == 0 {
            Span::styled(prefix, prefix_style)
        } else {
            Span::raw(indent.clone())
        };
        let mut spans = vec![lead];
        spans.extend(line.spans);
        lines.push(Line::from(spans));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(prefix, prefix_style)));
    }
    lines
}

fn render_notice_lines(notice: &Notice, theme: &Theme) -> Vec<Line<'static>> {
    let color = if notice.is_error {
        theme.error
    } else {
        theme.system_color
    };
    notice
        .text
        .lines()
        .enumerate()
        .map(|(i, l)| {
            let stamp = if i == 0 {
                format!("[{}] ", notice.timestamp)
            } else {
                " ".repeat(notice.timestamp.chars().count() + 3)
            };
            Line::from(vec![
                Span::styled(stamp, Style::default().fg(theme.muted)),
                Span::styled(l.to_string(), Style::default().fg(color)),
            ])
        })
        .collect()
}

fn draw_input(f: &mut ratatui::Frame, area: Rect, state: &AppState) {
    let theme = &state.theme;
    let processing = state.is_processing();
    let input_style = Style::default().fg(theme.fg);

    let (title, placeholder) = if processing {
        (" Input (waiting for reply, Ctrl+C to cancel) ", false)
    } else if state.input.starts_with('/') {
        (" Command ", false)
    } else {
        (" Input ", state.input.is_empty())
    };

    let content = if placeholder {
        Line::from(Span::styled(
            "Type your coding question here...",
            Style::default().fg(theme.muted),
        ))
    } else {
        Line::from(Span::styled(state.input.clone(), input_style))
    };

    let border = if state.input.starts_with('/') {
        theme.accent
    } else {
        theme.border
    };
    let input = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(border)),
    );
    f.render_widget(input, area);

    let cursor_x = area.x + state.cursor_pos as u16 + 1;
    let max_x = area.x + area.width.saturating_sub(2);
    f.set_cursor_position((cursor_x.min(max_x), area.y + 1));
}

fn draw_status_bar(f: &mut ratatui::Frame, area: Rect, state: &AppState) {
    let theme = &state.theme;
    let stats = state.session.stats();
    let tokens_str = if stats.prompt_tokens > 0 || stats.completion_tokens > 0 {
        format!(
            "| {}in/{}out ",
            format_tokens(stats.prompt_tokens),
            format_tokens(stats.completion_tokens),
        )
    } else {
        String::new()
    };

    let status_spans = vec![
        Span::styled(
            " Ollama ",
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("| {} ", state.llm.model()),
            Style::default().fg(theme.accent),
        ),
        Span::styled(
            format!("| {} messages ", state.session.log().len()),
            Style::default().fg(theme.muted),
        ),
        Span::styled(tokens_str, Style::default().fg(theme.muted)),
        Span::styled("| ", Style::default().fg(theme.muted)),
        Span::styled(state.status_text.clone(), Style::default().fg(theme.warning)),
        Span::styled(
            if state.is_processing() {
                "  Ctrl+C to cancel"
            } else {
                "  /help for commands, Ctrl+C to quit"
            },
            Style::default().fg(theme.muted),
        ),
    ];
    f.render_widget(Paragraph::new(Line::from(status_spans)), area);
}

// ── Input handling ──────────────────────────────────────────────────────

fn handle_key(state: &mut AppState, key: KeyEvent) {
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
            // First Ctrl+C aborts the running request.
            if state.cancel_in_flight() {
                state.status_text = "Cancelled".into();
                state.notify("Request cancelled. Your message was not added. Press ↑ to retry.");
            } else {
                state.should_quit = true;
            }
        }
        (KeyModifiers::CONTROL, KeyCode::Char('l')) => {
            handle_command_result(state, CommandResult::Clear);
        }
        (KeyModifiers::CONTROL, KeyCode::Char('n')) => {
            handle_command_result(state, CommandResult::NewConversation);
        }
        (KeyModifiers::CONTROL, KeyCode::Char('b')) => {
            state.show_sidebar = !state.show_sidebar;
        }

        (_, KeyCode::Enter) if state.is_processing() => {
            state.status_text = "Waiting for the model (Ctrl+C to cancel)".into();
        }
        (_, KeyCode::Enter) => {
            let input = std::mem::take(&mut state.input);
            state.cursor_pos = 0;
            // Blank input is dropped here, before it reaches the session.
            if input.trim().is_empty() {
                return;
            }
            state.push_history(input.clone());

            if input.trim_start().starts_with('/') {
                handle_command_result(state, commands::handle_command(&input));
                return;
            }

            state.start_submit(input);
        }

        (_, KeyCode::Tab) => {
            if let Some(completed) = commands::complete_command(&state.input) {
                state.set_input(completed);
            }
        }
        (_, KeyCode::Backspace) => state.backspace(),
        (_, KeyCode::Delete) => state.delete(),
        (_, KeyCode::Left) => state.cursor_pos = state.cursor_pos.saturating_sub(1),
        (_, KeyCode::Right) => {
            state.cursor_pos = (state.cursor_pos + 1).min(state.input.chars().count());
        }
        (_, KeyCode::Home) => state.cursor_pos = 0,
        (_, KeyCode::End) => state.cursor_pos = state.input.chars().count(),
        (_, KeyCode::Up) => state.history_prev(),
        (_, KeyCode::Down) => state.history_next(),
        (_, KeyCode::PageUp) => {
            state.scroll_offset = state.scroll_offset.saturating_sub(10);
        }
        (_, KeyCode::PageDown) => {
            state.scroll_offset = state.scroll_offset.saturating_add(10);
        }
        (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => state.insert_char(c),
        _ => {}
    }
}

fn handle_command_result(state: &mut AppState, result: CommandResult) {
    match result {
        CommandResult::Message(msg) => state.notify(msg),
        CommandResult::Clear => {
            state.cancel_in_flight();
            state.session.clear();
            state.notices.clear();
            state.notify("Chat cleared.");
            state.scroll_offset = 0;
        }
        CommandResult::NewConversation => {
            state.cancel_in_flight();
            state.session.reset();
            state.notices.clear();
            state.scroll_offset = 0;
            state.status_text = "Ready".into();
        }
        CommandResult::Quit => state.should_quit = true,
        CommandResult::ModelChanged(model) => state.switch_model(model),
        CommandResult::ShowModels => {
            let active = state.llm.model().to_string();
            let list = state
                .settings
                .llm
                .models
                .iter()
                .map(|m| {
                    let marker = if *m == active { "▸" } else { " " };
                    format!("  {marker} {m}")
                })
                .collect::<Vec<_>>()
                .join("\n");
            state.notify(format!(
                "Configured models:\n{list}\nUsage: /model <model-name>, /models to ask the server"
            ));
        }
        CommandResult::DiscoverModels => state.start_discover_models(),
        CommandResult::ThemeChanged(name) => match Theme::find(&name) {
            Some(theme) => {
                state.theme = theme;
                state.settings.ui.theme = state.theme.name.to_string();
                state.notify(format!("Theme changed to: {}", state.theme.name));
            }
            None => state.notify_error(format!(
                "Unknown theme: {name}\nAvailable themes: {}",
                Theme::all_names().join(", ")
            )),
        },
        CommandResult::ToggleSidebar => state.show_sidebar = !state.show_sidebar,
        CommandResult::ShowStatus => {
            let stats = state.session.stats();
            state.notify(format!(
                "Model: {}\nServer: {}\nMessages: {} (~{} tokens)\nExchanges: {}, failed: {}\nTokens: {} in / {} out\nSession: {}",
                state.llm.model(),
                state.llm.base_url(),
                state.session.log().len(),
                state.session.log().estimate_tokens(),
                stats.exchanges,
                stats.failures,
                stats.prompt_tokens,
                stats.completion_tokens,
                state.session.id(),
            ));
        }
        CommandResult::ShowSystemPrompt => {
            let text = format!("System instruction:\n{}", state.session.system_instruction());
            state.notify(text);
        }
        CommandResult::SaveSettings => {
            state.settings.ui.show_sidebar = state.show_sidebar;
            match state.settings.save() {
                Ok(()) => state.notify(format!(
                    "Settings saved to {}",
                    Settings::config_path().display()
                )),
                Err(e) => state.notify_error(format!("⚠ Failed to save settings: {e}")),
            }
        }
        CommandResult::NotACommand => {}
    }
}

fn format_tokens(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}k", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

fn format_size(bytes: u64) -> String {
    const GB: f64 = 1024.0 * 1024.0 * 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    let b = bytes as f64;
    if b >= GB {
        format!("{:.1} GB", b / GB)
    } else {
        format!("{:.0} MB", b / MB)
    }
}

fn now_str() -> String {
    chrono::Local::now().format("%H:%M").to_string()
}
