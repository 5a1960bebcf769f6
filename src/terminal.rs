// SPDX-License-Identifier: GPL-3.0-only

//! Terminal front end
//!
//! Renders the Home, Scanner and Result screens with ratatui and feeds key
//! presses into [`ScanApp::update`]. The scan flow runs on a tokio runtime
//! entered for the lifetime of the UI loop.

use crate::app::frame_processor::{PipelineStats, QrDetector};
use crate::app::lookup::SimulatedLookup;
use crate::app::{Capabilities, Message, ResultStatus, Route, ScanApp};
use crate::backends::camera::FrameSource;
use crate::backends::permission::PromptPermission;
use crate::config::Config;
use crate::constants::ui;
use crate::errors::ScanError;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame as UiFrame, Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};
use std::io::{self, stdout};
use std::sync::Arc;
use tracing::{debug, info};

/// Run the interactive scanner over `source`
pub fn run(config: Config, source: Arc<dyn FrameSource>) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    let _guard = runtime.enter();

    let permission = Arc::new(PromptPermission::new(config.camera_permission));
    let capabilities = Capabilities {
        source,
        detector: Arc::new(QrDetector::with_max_dimension(config.max_dimension)),
        permission: permission.clone(),
        lookup: Arc::new(SimulatedLookup::from_config(&config)),
    };
    let mut app = ScanApp::new(config, capabilities);

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &permission);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut ScanApp,
    permission: &PromptPermission,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut status_message = String::new();

    loop {
        // Detections and permission answers produced in the background
        while let Some(message) = app.try_next_message() {
            dispatch(app, message, &mut status_message);
        }

        terminal.draw(|f| draw(f, app, permission.is_prompting(), &status_message))?;

        if event::poll(ui::INPUT_POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match key_action(key, app.current_route(), permission.is_prompting()) {
                KeyAction::Quit => break,
                KeyAction::Answer(granted) => {
                    permission.answer(granted);
                }
                KeyAction::Send(message) => {
                    status_message.clear();
                    dispatch(app, message, &mut status_message);
                }
                KeyAction::Ignore => {}
            }
        }
    }

    info!("Terminal scanner closed");
    Ok(())
}

/// What a key press means on the current screen
#[derive(Debug, PartialEq)]
enum KeyAction {
    Quit,
    /// Answer the pending permission prompt
    Answer(bool),
    Send(Message),
    Ignore,
}

fn key_action(key: KeyEvent, route: &Route, prompting: bool) -> KeyAction {
    // Quitting works on every screen, prompt included
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return KeyAction::Quit;
        }
        KeyCode::Char('q') => return KeyAction::Quit,
        _ => {}
    }

    if prompting {
        return match key.code {
            KeyCode::Char('y') => KeyAction::Answer(true),
            KeyCode::Char('n') | KeyCode::Esc => KeyAction::Answer(false),
            _ => KeyAction::Ignore,
        };
    }

    match (key.code, route) {
        (KeyCode::Enter, Route::Home) => KeyAction::Send(Message::OpenScanner),
        (KeyCode::Esc, Route::Scanner) => KeyAction::Send(Message::DismissScanner),
        (KeyCode::Esc | KeyCode::Char('r'), Route::Result(_)) => {
            KeyAction::Send(Message::ScanAgain)
        }
        (KeyCode::Char('t'), Route::Result(_)) => KeyAction::Send(Message::RetryLookup),
        _ => KeyAction::Ignore,
    }
}

fn dispatch(app: &mut ScanApp, message: Message, status_message: &mut String) {
    match app.update(message) {
        Ok(()) => {}
        // Raised as a notice by the app
        Err(ScanError::PermissionDenied) => {}
        Err(e) => {
            debug!(error = %e, "Action rejected");
            *status_message = e.to_string();
        }
    }
}

fn draw(f: &mut UiFrame, app: &ScanApp, prompting: bool, status_message: &str) {
    let [body, status_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(f.area());

    match app.current_route() {
        Route::Home => draw_home(f, body, app.awaiting_permission()),
        Route::Scanner => draw_scanner(f, body, app.pipeline_stats()),
        Route::Result(value) => {
            let status = app
                .session()
                .map(|session| session.status())
                .unwrap_or(ResultStatus::Loading);
            draw_result(f, body, value.as_str(), &status);
        }
    }

    let notice = app.active_notice();
    let status = StatusBar {
        message: notice.unwrap_or(if status_message.is_empty() {
            key_hints(app.current_route())
        } else {
            status_message
        }),
        highlight: notice.is_some(),
    };
    f.render_widget(status, status_area);

    if prompting {
        draw_permission_prompt(f, body);
    }
}

fn draw_home(f: &mut UiFrame, area: Rect, awaiting_permission: bool) {
    let mut lines = vec![
        Line::from("QR Scanner").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from(""),
        Line::from("Press Enter to scan a code"),
    ];
    if awaiting_permission {
        lines.push(Line::from(""));
        lines.push(Line::from("Waiting for camera permission..."));
    }
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" Home "));
    f.render_widget(paragraph, area);
}

fn draw_scanner(f: &mut UiFrame, area: Rect, stats: Option<PipelineStats>) {
    let mut lines = vec![
        Line::from("Point the camera at a QR code"),
        Line::from(""),
    ];
    match stats {
        Some(stats) => {
            lines.push(Line::from(format!(
                "frames: {} analyzed, {} skipped, {} superseded",
                stats.analyzed, stats.skipped, stats.superseded
            )));
            if stats.failed > 0 {
                lines.push(Line::from(format!("detector errors: {}", stats.failed)));
            }
        }
        None => lines.push(Line::from("Starting camera...")),
    }
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" Scanner "));
    f.render_widget(paragraph, area);
}

fn draw_result(f: &mut UiFrame, area: Rect, value: &str, status: &ResultStatus) {
    let mut lines = vec![
        Line::from(format!("Code: {}", value)),
        Line::from(""),
    ];
    match status {
        ResultStatus::Loading => lines.push(Line::from("Looking up result...")),
        ResultStatus::Success { outcome, .. } => lines.push(
            Line::from(format!("Outcome: {}", outcome))
                .style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        ),
        ResultStatus::Failed { reason, .. } => {
            lines.push(Line::from(reason.as_str()).style(Style::default().fg(Color::Red)));
            lines.push(Line::from("Press 't' to retry"));
        }
    }
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" Result "));
    f.render_widget(paragraph, area);
}

fn draw_permission_prompt(f: &mut UiFrame, area: Rect) {
    let popup = centered_rect(area, 40, 5);
    let paragraph = Paragraph::new(vec![
        Line::from("Allow camera access?"),
        Line::from(""),
        Line::from("[y] allow   [n] deny"),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title(" Permission "));
    f.render_widget(Clear, popup);
    f.render_widget(paragraph, popup);
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn key_hints(route: &Route) -> &'static str {
    match route {
        Route::Home => "Enter scan | q quit",
        Route::Scanner => "Esc back | q quit",
        Route::Result(_) => "r scan again | t retry | q quit",
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
    highlight: bool,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bg = if self.highlight {
            Color::Red
        } else {
            Color::DarkGray
        };

        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(bg);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(bg),
        );
    }
}
