use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use mosscap_core::constants::ui;
use mosscap_core::{ContextBuilder, HistoryStore, Settings, Transcript, TurnReport};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Terminal,
};
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::backend::ChatBackend;
use crate::commands::{self, CommandResult};
use crate::theme::Theme;
use crate::view::{ChatView, Notice, NoticeKind};

// ── Single-prompt mode ──────────────────────────────────────────────────

pub async fn run_single_prompt(settings: &Settings, prompt: &str) -> Result<()> {
    let mut backend = ChatBackend::new(settings.clone(), Arc::new(HistoryStore::new()));

    match backend.submit(prompt).await? {
        Some(report) => println!("{}", report.response),
        None => eprintln!("Nothing to send: the prompt is blank."),
    }

    Ok(())
}

// ── Interactive TUI ─────────────────────────────────────────────────────

/// What the chat worker reports back to the screen.
#[derive(Debug)]
enum ChatEvent {
    Connected,
    Unavailable(String),
    Finished {
        transcript: Transcript,
        report: Option<TurnReport>,
    },
    Failed(String),
}

struct AppState {
    view: ChatView,
    theme: Theme,
    model_name: String,
    session_id: String,
    context: ContextBuilder,
    connected: bool,
    total_tokens_in: u64,
    total_tokens_out: u64,
    should_quit: bool,
}

impl AppState {
    fn new(settings: &Settings) -> Self {
        let mut view = ChatView::new();
        view.status_text = "Connecting...".into();
        Self {
            view,
            theme: Theme::by_name_or_default(&settings.ui.theme),
            model_name: settings.llm.model.clone(),
            session_id: settings.ui.session_id.clone(),
            context: match settings.llm.system_prompt {
                Some(ref prompt) => ContextBuilder::new().with_system_prompt(prompt.clone()),
                None => ContextBuilder::new(),
            },
            connected: false,
            total_tokens_in: 0,
            total_tokens_out: 0,
            should_quit: false,
        }
    }

    fn status_summary(&self) -> String {
        let transcript = self.view.transcript();
        format!(
            "Model: {}\nSession: {}\nTurns: {}\nContext: ~{} tokens (full history is resent each turn)\nTokens used: {} in / {} out",
            self.model_name,
            self.session_id,
            transcript.len(),
            self.view.context_tokens(&self.context),
            self.total_tokens_in,
            self.total_tokens_out,
        )
    }
}

pub async fn run_tui(settings: Settings) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, settings).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    settings: Settings,
) -> Result<()> {
    let mut state = AppState::new(&settings);

    let (chat_event_tx, mut chat_event_rx) = mpsc::unbounded_channel::<ChatEvent>();
    let (user_input_tx, mut user_input_rx) = mpsc::unbounded_channel::<String>();

    // Chat worker: owns the backend, handles one submission at a time.
    let worker = tokio::spawn({
        let mut backend = ChatBackend::new(settings, Arc::new(HistoryStore::new()));
        async move {
            let first = match backend.connect().await {
                Ok(()) => ChatEvent::Connected,
                Err(e) => ChatEvent::Unavailable(e.to_string()),
            };
            if chat_event_tx.send(first).is_err() {
                return;
            }

            while let Some(input) = user_input_rx.recv().await {
                let event = match backend.submit(&input).await {
                    Ok(report) => ChatEvent::Finished {
                        transcript: backend.transcript(),
                        report,
                    },
                    Err(e) => ChatEvent::Failed(e.to_string()),
                };
                if chat_event_tx.send(event).is_err() {
                    break;
                }
            }
        }
    });

    loop {
        terminal.draw(|f| draw_ui(f, &mut state))?;

        while let Ok(chat_event) = chat_event_rx.try_recv() {
            handle_chat_event(&mut state, chat_event);
        }

        if event::poll(std::time::Duration::from_millis(33))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(&mut state, key, &user_input_tx);
                }
            }
        }

        if state.should_quit {
            break;
        }
    }

    worker.abort();
    Ok(())
}

fn handle_chat_event(state: &mut AppState, event: ChatEvent) {
    match event {
        ChatEvent::Connected => {
            state.connected = true;
            state.view.status_text = "Ready".into();
        }
        ChatEvent::Unavailable(e) => {
            state.connected = false;
            state.view.status_text = "Model unavailable".into();
            state.view.push_notice(
                NoticeKind::Error,
                format!("{e}\nYour next message will try to connect again."),
            );
        }
        ChatEvent::Finished { transcript, report } => {
            state.connected = true;
            let recorded = report.is_some();
            if let Some(report) = report {
                if let Some(usage) = report.usage {
                    state.total_tokens_in += usage.input_tokens;
                    state.total_tokens_out += usage.output_tokens;
                }
            }
            state.view.finish_ok(transcript, recorded);
        }
        ChatEvent::Failed(e) => {
            state.view.finish_err(e);
        }
    }
}

fn handle_key(state: &mut AppState, key: KeyEvent, user_input_tx: &mpsc::UnboundedSender<String>) {
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) | (KeyModifiers::CONTROL, KeyCode::Char('d')) => {
            state.should_quit = true;
        }

        (_, KeyCode::Enter) => {
            if state.view.is_pending() {
                return;
            }
            let input = state.view.input().to_string();
            match commands::handle_command(&input) {
                CommandResult::NotACommand => {
                    if let Some(submitted) = state.view.begin_submit() {
                        if user_input_tx.send(submitted).is_err() {
                            state.view.finish_err("The chat worker has stopped.");
                        }
                    }
                }
                result => {
                    state.view.clear_input();
                    handle_command_result(state, result);
                }
            }
        }

        (_, KeyCode::Esc) => state.view.clear_input(),
        (_, KeyCode::Backspace) => state.view.backspace(),
        (_, KeyCode::Delete) => state.view.delete(),
        (_, KeyCode::Left) => state.view.move_left(),
        (_, KeyCode::Right) => state.view.move_right(),
        (_, KeyCode::Home) => state.view.move_home(),
        (_, KeyCode::End) => state.view.move_end(),
        (_, KeyCode::Up) => state.view.history_prev(),
        (_, KeyCode::Down) => state.view.history_next(),
        (_, KeyCode::PageUp) => state.view.scroll_up(10),
        (_, KeyCode::PageDown) => state.view.scroll_down(10),

        (modifiers, KeyCode::Char(c)) if !modifiers.contains(KeyModifiers::CONTROL) => {
            state.view.insert_char(c);
        }

        _ => {}
    }
}

fn handle_command_result(state: &mut AppState, result: CommandResult) {
    match result {
        CommandResult::Message(msg) => state.view.info(msg),
        CommandResult::Quit => state.should_quit = true,
        CommandResult::ShowStatus => {
            let summary = state.status_summary();
            state.view.info(summary);
        }
        CommandResult::ShowModel => {
            let msg = format!(
                "Model: {}\nStart with --llm_model <name> to talk to a different model.",
                state.model_name
            );
            state.view.info(msg);
        }
        CommandResult::ThemeChanged(name) => {
            state.theme = Theme::by_name_or_default(&name);
            state.view.info(format!("Theme set to {}.", state.theme.name));
        }
        CommandResult::NotACommand => {}
    }
}

// ── Rendering ───────────────────────────────────────────────────────────

fn draw_ui(f: &mut ratatui::Frame, state: &mut AppState) {
    let theme = state.theme.clone();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // transcript
            Constraint::Length(3), // input
            Constraint::Length(1), // status
        ])
        .split(f.area());

    let chat_area = chunks[0];
    let chat_lines = build_chat_lines(
        state.view.transcript(),
        state.view.notices(),
        state.view.is_pending(),
        &theme,
    );
    let total_lines = chat_lines.len();
    let visible_height = chat_area.height.saturating_sub(2) as usize;
    let scroll = state.view.resolve_scroll(total_lines, visible_height);

    let chat = Paragraph::new(Text::from(chat_lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Chat with {}: [{}] ", ui::ASSISTANT_NAME, state.model_name))
                .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
                .border_style(Style::default().fg(theme.border)),
        )
        .wrap(Wrap { trim: false })
        .scroll((scroll as u16, 0));
    f.render_widget(chat, chat_area);

    if total_lines > visible_height {
        let max_scroll = total_lines.saturating_sub(visible_height);
        let mut scrollbar_state = ScrollbarState::new(max_scroll).position(scroll);
        f.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("^"))
                .end_symbol(Some("v")),
            chat_area,
            &mut scrollbar_state,
        );
    }

    draw_input(f, chunks[1], state, &theme);
    draw_status_bar(f, chunks[2], state, &theme);
}

fn labeled_lines(label: &str, content: &str, color: ratatui::style::Color) -> Vec<Line<'static>> {
    let prefix = format!("{label}: ");
    let indent = " ".repeat(prefix.len());
    let mut lines = Vec::new();

    for (i, raw_line) in content.lines().enumerate() {
        if i == 0 {
            lines.push(Line::from(vec![
                Span::styled(
                    prefix.clone(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw(raw_line.to_string()),
            ]));
        } else {
            lines.push(Line::from(vec![
                Span::raw(indent.clone()),
                Span::raw(raw_line.to_string()),
            ]));
        }
    }

    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            prefix,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
    }
    lines
}

fn build_chat_lines(
    transcript: &Transcript,
    notices: &[Notice],
    is_pending: bool,
    theme: &Theme,
) -> Vec<Line<'static>> {
    let mut chat_lines: Vec<Line> = Vec::new();

    for turn in transcript.iter() {
        chat_lines.extend(labeled_lines(ui::USER_LABEL, turn.user_message(), theme.user_color));
        chat_lines.extend(labeled_lines(
            ui::ASSISTANT_NAME,
            turn.model_response(),
            theme.assistant_color,
        ));
        chat_lines.push(Line::from(Span::styled(
            format!("─── {}", turn.recorded_at().format("%H:%M")),
            Style::default().fg(theme.muted),
        )));
    }

    for notice in notices {
        let color = match notice.kind {
            NoticeKind::Info => theme.notice_color,
            NoticeKind::Error => theme.error,
        };
        for line in notice.text.lines() {
            chat_lines.push(Line::from(Span::styled(
                format!("  {line}"),
                Style::default().fg(color),
            )));
        }
        chat_lines.push(Line::raw(""));
    }

    if is_pending {
        chat_lines.push(Line::from(Span::styled(
            format!("  {}", ui::THINKING),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::DIM),
        )));
    }

    chat_lines
}

fn draw_input(f: &mut ratatui::Frame, area: Rect, state: &AppState, theme: &Theme) {
    let pending = state.view.is_pending();
    let input = state.view.input();

    let title = if pending {
        " Input (thinking...) "
    } else if input.starts_with('/') {
        " Command "
    } else {
        " Input "
    };

    let body = if input.is_empty() && !pending {
        Span::styled(
            ui::INPUT_PLACEHOLDER,
            Style::default()
                .fg(theme.muted)
                .add_modifier(Modifier::ITALIC),
        )
    } else {
        Span::styled(
            input.to_string(),
            Style::default().fg(if pending { theme.muted } else { theme.fg }),
        )
    };

    let widget = Paragraph::new(Line::from(body)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(if input.starts_with('/') {
                theme.accent
            } else {
                theme.border
            })),
    );
    f.render_widget(widget, area);

    if !pending {
        let cursor_x = area.x + state.view.cursor() as u16 + 1;
        let max_x = area.x + area.width.saturating_sub(2);
        f.set_cursor_position((cursor_x.min(max_x), area.y + 1));
    }
}

fn draw_status_bar(f: &mut ratatui::Frame, area: Rect, state: &AppState, theme: &Theme) {
    let connection = if state.connected { "online" } else { "offline" };

    let tokens_str = if state.total_tokens_in > 0 || state.total_tokens_out > 0 {
        format!(
            "| {}in/{}out ",
            format_tokens(state.total_tokens_in),
            format_tokens(state.total_tokens_out),
        )
    } else {
        String::new()
    };

    let status_spans = vec![
        Span::styled(
            format!(" {} ", state.model_name),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("| {connection} "), Style::default().fg(theme.muted)),
        Span::styled(
            format!("| session {} ", state.session_id),
            Style::default().fg(theme.muted),
        ),
        Span::styled(
            format!(
                "| {} turns ~{} ctx ",
                state.view.transcript().len(),
                format_tokens(state.view.context_tokens(&state.context) as u64),
            ),
            Style::default().fg(theme.muted),
        ),
        Span::styled(tokens_str, Style::default().fg(theme.muted)),
        Span::styled("| ", Style::default().fg(theme.muted)),
        Span::styled(
            state.view.status_text.clone(),
            Style::default().fg(theme.muted),
        ),
        Span::styled("  /help ", Style::default().fg(theme.muted)),
    ];
    f.render_widget(Paragraph::new(Line::from(status_spans)), area);
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
