//! Application core — event loop, action dispatch, chrome.

use std::time::Duration;

use chrono::{DateTime, Utc};
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use fireboard_core::{FeedController, FeedState, Notice, StreamStatus};

use crate::action::Action;
use crate::component::Component;
use crate::data_bridge::spawn_data_bridge;
use crate::event::{Event, EventReader};
use crate::screens::BoardScreen;
use crate::theme;
use crate::tui::Tui;

/// Top-level application state and event loop.
pub struct App {
    controller: FeedController,
    board: BoardScreen,
    running: bool,
    help_visible: bool,
    /// Most recent undismissed notice.
    notice: Option<Notice>,
    stream_status: StreamStatus,
    feed_state: FeedState,
    last_refresh: Option<DateTime<Utc>>,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    pub fn new(controller: FeedController) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        Self {
            controller,
            board: BoardScreen::new(),
            running: true,
            help_visible: false,
            notice: None,
            stream_status: StreamStatus::Stopped,
            feed_state: FeedState::Idle,
            last_refresh: None,
            action_tx,
            action_rx,
        }
    }

    /// Run the main event loop.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        let bridge_cancel = CancellationToken::new();
        let bridge = tokio::spawn(spawn_data_bridge(
            self.controller.clone(),
            self.action_tx.clone(),
            bridge_cancel.clone(),
        ));

        let mut events = EventReader::new(Duration::from_millis(1000), Duration::from_millis(33));

        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        events.stop();
        bridge_cancel.cancel();
        if tokio::time::timeout(Duration::from_secs(2), bridge).await.is_err() {
            debug!("data bridge did not stop in time");
        }
        info!("TUI event loop ended");
        Ok(())
    }

    /// Global keys first; everything else goes to the board.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.help_visible {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::F(1) => Some(Action::ToggleHelp),
                _ => None,
            });
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c' | 'q')) => return Ok(Some(Action::Quit)),
            (KeyModifiers::CONTROL, KeyCode::Char('r')) => return Ok(Some(Action::Refresh)),
            (_, KeyCode::F(1)) => return Ok(Some(Action::ToggleHelp)),
            (_, KeyCode::Esc) => {
                return Ok(self.notice.as_ref().map(|_| Action::DismissNotice));
            }
            _ => {}
        }

        self.board.handle_key_event(key)
    }

    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,
            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::Notify(notice) => self.notice = Some(notice.clone()),
            Action::DismissNotice => self.notice = None,

            Action::StreamStatusChanged(status) => self.stream_status = *status,
            Action::LastRefresh(at) => self.last_refresh = Some(*at),

            Action::Refresh => {
                let ctrl = self.controller.clone();
                tokio::spawn(async move {
                    // Failures arrive as notices through the bridge.
                    let _ = ctrl.refresh().await;
                });
            }

            Action::Submit(text) => {
                let ctrl = self.controller.clone();
                let tx = self.action_tx.clone();
                let text = text.clone();
                tokio::spawn(async move {
                    let outcome = match ctrl.submit(&text).await {
                        Ok(_) => Action::SubmitSucceeded,
                        Err(e) => Action::SubmitFailed(e.to_string()),
                    };
                    let _ = tx.send(outcome);
                });
            }

            Action::FeedStateChanged(state) => {
                self.feed_state = *state;
                self.forward(action)?;
            }

            Action::Render | Action::Tick | Action::Resize(..) => {}

            other => self.forward(other)?,
        }
        Ok(())
    }

    fn forward(&mut self, action: &Action) -> Result<()> {
        if let Some(follow_up) = self.board.update(action)? {
            self.action_tx.send(follow_up)?;
        }
        Ok(())
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let [board_area, notice_area, status_area] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        self.board.render(frame, board_area);
        self.render_notice(frame, notice_area);
        self.render_status_bar(frame, status_area);

        if self.help_visible {
            Self::render_help_overlay(frame, area);
        }
    }

    fn render_notice(&self, frame: &mut Frame, area: Rect) {
        let Some(ref notice) = self.notice else {
            return;
        };
        let line = Line::from(vec![
            Span::styled(format!(" {} ", notice.message), theme::notice(notice.level)),
            Span::styled(" Esc dismiss", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn stream_indicator(&self) -> Span<'static> {
        match self.stream_status {
            StreamStatus::Connected => Span::styled("● live", Style::default().fg(theme::SUCCESS_GREEN)),
            StreamStatus::Connecting => {
                Span::styled("◐ connecting", Style::default().fg(theme::ELECTRIC_YELLOW))
            }
            StreamStatus::Reconnecting { attempt } => Span::styled(
                format!("◐ reconnecting ({attempt})"),
                Style::default().fg(theme::ELECTRIC_YELLOW),
            ),
            StreamStatus::Stopped => Span::styled("○ offline", Style::default().fg(theme::ERROR_RED)),
        }
    }

    fn refreshed_label(&self) -> String {
        match self.last_refresh {
            Some(at) => {
                let secs = (Utc::now() - at).num_seconds().max(0).unsigned_abs();
                format!("refreshed {} ago", humantime::format_duration(Duration::from_secs(secs)))
            }
            None if self.feed_state == FeedState::Loading => "loading…".into(),
            None => "not refreshed".into(),
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let config = self.controller.config();
        let line = Line::from(vec![
            Span::raw(" "),
            self.stream_indicator(),
            Span::styled(
                format!(" │ {} @ {}", config.namespace, config.node_url),
                theme::key_hint(),
            ),
            Span::styled(format!(" │ {}", self.refreshed_label()), theme::key_hint()),
            Span::styled(" │ Enter send  ^R refresh  F1 help  ^C quit", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_help_overlay(frame: &mut Frame, area: Rect) {
        let width = 52u16.min(area.width.saturating_sub(4));
        let height = 14u16.min(area.height.saturating_sub(4));
        let help_area = Rect::new(
            area.x + area.width.saturating_sub(width) / 2,
            area.y + area.height.saturating_sub(height) / 2,
            width,
            height,
        );

        frame.render_widget(Clear, help_area);
        let block = Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(help_area);
        frame.render_widget(block, help_area);

        let row = |key: &'static str, what: &'static str| {
            Line::from(vec![
                Span::styled(format!("  {key:<10}"), theme::key_hint_key()),
                Span::styled(what, theme::key_hint()),
            ])
        };
        let help_text = vec![
            Line::from(""),
            row("Enter", "Broadcast the compose text"),
            row("←/→ Home", "Move the cursor"),
            row("Ctrl+W", "Delete previous word"),
            row("↑/↓ PgUp", "Scroll the feed"),
            row("Ctrl+R", "Refresh now"),
            row("Ctrl+P", "Private send"),
            row("Esc", "Dismiss notice"),
            row("Ctrl+C", "Quit"),
            Line::from(""),
            Line::from(Span::styled("            Esc or F1 to close", theme::key_hint())),
        ];
        frame.render_widget(Paragraph::new(help_text), inner);
    }
}
