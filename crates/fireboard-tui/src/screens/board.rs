//! Board screen — the message feed above a broadcast compose field.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Position, Rect},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};
use tui_input::{Input, InputRequest};

use fireboard_core::{FeedSnapshot, FeedState, Notice};

use crate::action::Action;
use crate::component::Component;
use crate::theme;

const PAGE: isize = 10;

pub struct BoardScreen {
    snapshot: Arc<FeedSnapshot>,
    feed_state: FeedState,
    compose: Input,
    /// A submit is in flight; Enter is ignored until it resolves.
    sending: bool,
    /// First visible feed line.
    scroll: usize,
}

impl Default for BoardScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardScreen {
    pub fn new() -> Self {
        Self {
            snapshot: Arc::new(FeedSnapshot::default()),
            feed_state: FeedState::Idle,
            compose: Input::default(),
            sending: false,
            scroll: 0,
        }
    }

    pub fn compose_text(&self) -> &str {
        self.compose.value()
    }

    fn max_scroll(&self) -> usize {
        self.snapshot.len().saturating_sub(1)
    }

    fn scroll_by(&mut self, delta: isize) {
        self.scroll = self.scroll.saturating_add_signed(delta).min(self.max_scroll());
    }

    fn submit(&mut self) -> Option<Action> {
        if self.sending || self.compose.value().trim().is_empty() {
            return None;
        }
        self.sending = true;
        Some(Action::Submit(self.compose.value().to_owned()))
    }

    fn feed_lines(&self) -> Vec<Line<'static>> {
        if self.snapshot.is_empty() {
            let placeholder = match self.feed_state {
                FeedState::Ready => "No messages yet",
                FeedState::Idle | FeedState::Loading => "Loading messages…",
            };
            return vec![Line::from(Span::styled(placeholder, theme::key_hint()))];
        }

        self.snapshot
            .items()
            .map(|item| {
                let sender_style = if item.message.local {
                    theme::sender_self()
                } else {
                    theme::sender_other()
                };
                Line::from(vec![
                    Span::styled("From ", theme::feed_row()),
                    Span::styled(item.sender().to_owned(), sender_style),
                    Span::styled(": ", theme::feed_row()),
                    Span::styled(item.values_json(), theme::feed_row()),
                ])
            })
            .collect()
    }
}

impl Component for BoardScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let request = match key.code {
            KeyCode::Enter => return Ok(self.submit()),
            KeyCode::Char('p') if ctrl => {
                return Ok(Some(Action::Notify(Notice::warning(
                    "Private send is not supported",
                ))));
            }
            KeyCode::Char('w') if ctrl => InputRequest::DeletePrevWord,
            KeyCode::Char(c) if !ctrl => InputRequest::InsertChar(c),
            KeyCode::Backspace => InputRequest::DeletePrevChar,
            KeyCode::Delete => InputRequest::DeleteNextChar,
            KeyCode::Left => InputRequest::GoToPrevChar,
            KeyCode::Right => InputRequest::GoToNextChar,
            KeyCode::Home => InputRequest::GoToStart,
            KeyCode::End => InputRequest::GoToEnd,

            KeyCode::Up => {
                self.scroll_by(-1);
                return Ok(None);
            }
            KeyCode::Down => {
                self.scroll_by(1);
                return Ok(None);
            }
            KeyCode::PageUp => {
                self.scroll_by(-PAGE);
                return Ok(None);
            }
            KeyCode::PageDown => {
                self.scroll_by(PAGE);
                return Ok(None);
            }
            _ => return Ok(None),
        };
        let _ = self.compose.handle(request);
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::SnapshotUpdated(snapshot) => {
                self.snapshot = Arc::clone(snapshot);
                self.scroll = self.scroll.min(self.max_scroll());
            }
            Action::FeedStateChanged(state) => self.feed_state = *state,
            Action::SubmitSucceeded => {
                self.compose.reset();
                self.sending = false;
            }
            // The text stays so the user can retry.
            Action::SubmitFailed(_) => self.sending = false,
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [feed_area, compose_area] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(3)]).areas(area);

        // ── Feed ──
        let loading = if self.feed_state == FeedState::Loading {
            " ⟳"
        } else {
            ""
        };
        let feed_block = Block::default()
            .title(format!(" Messages ({}){loading} ", self.snapshot.len()))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());
        let scroll = u16::try_from(self.scroll).unwrap_or(u16::MAX);
        frame.render_widget(
            Paragraph::new(self.feed_lines())
                .block(feed_block)
                .scroll((scroll, 0)),
            feed_area,
        );

        // ── Compose ──
        let title = if self.sending {
            " Broadcast · sending… "
        } else {
            " Broadcast "
        };
        let compose_block = Block::default()
            .title(title)
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());
        let inner = compose_block.inner(compose_area);

        let width = usize::from(inner.width.max(1));
        let offset = self.compose.visual_scroll(width);
        frame.render_widget(
            Paragraph::new(self.compose.value())
                .style(theme::feed_row())
                .scroll((0, u16::try_from(offset).unwrap_or(0)))
                .block(compose_block),
            compose_area,
        );

        let cursor = self.compose.visual_cursor().saturating_sub(offset);
        frame.set_cursor_position(Position::new(
            inner.x + u16::try_from(cursor).unwrap_or(0).min(inner.width.saturating_sub(1)),
            inner.y,
        ));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fireboard_core::{Data, Message, NoticeLevel};
    use pretty_assertions::assert_eq;
    use ratatui::{Terminal, backend::TestBackend};
    use serde_json::json;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(screen: &mut BoardScreen, text: &str) {
        for c in text.chars() {
            screen.handle_key_event(key(KeyCode::Char(c))).unwrap();
        }
    }

    fn snapshot() -> Arc<FeedSnapshot> {
        let message: Message = serde_json::from_value(json!({
            "header": { "id": "m1", "author": "org1" },
            "data": [{ "id": "d1" }]
        }))
        .unwrap();
        let data: Data = serde_json::from_value(json!({ "id": "d1", "value": "hello" })).unwrap();
        Arc::new(FeedSnapshot::new(vec![message], vec![data]))
    }

    #[test]
    fn enter_submits_compose_text() {
        let mut screen = BoardScreen::new();
        type_text(&mut screen, "ping");

        let action = screen.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert!(matches!(action, Some(Action::Submit(ref t)) if t == "ping"));

        // A second Enter while the first is in flight does nothing.
        assert!(screen.handle_key_event(key(KeyCode::Enter)).unwrap().is_none());
    }

    #[test]
    fn blank_compose_is_not_submitted() {
        let mut screen = BoardScreen::new();
        type_text(&mut screen, "   ");
        assert!(screen.handle_key_event(key(KeyCode::Enter)).unwrap().is_none());
    }

    #[test]
    fn success_clears_compose() {
        let mut screen = BoardScreen::new();
        type_text(&mut screen, "ping");
        screen.handle_key_event(key(KeyCode::Enter)).unwrap();

        screen.update(&Action::SubmitSucceeded).unwrap();
        assert_eq!(screen.compose_text(), "");
    }

    #[test]
    fn failure_retains_compose() {
        let mut screen = BoardScreen::new();
        type_text(&mut screen, "ping");
        screen.handle_key_event(key(KeyCode::Enter)).unwrap();

        screen.update(&Action::SubmitFailed("node down".into())).unwrap();
        assert_eq!(screen.compose_text(), "ping");

        // Retry is possible once the failure is reported.
        let retry = screen.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert!(matches!(retry, Some(Action::Submit(_))));
    }

    #[test]
    fn ctrl_p_reports_private_unsupported() {
        let mut screen = BoardScreen::new();
        let action = screen
            .handle_key_event(KeyEvent::new(KeyCode::Char('p'), KeyModifiers::CONTROL))
            .unwrap();
        match action {
            Some(Action::Notify(n)) => {
                assert_eq!(n.level, NoticeLevel::Warning);
                assert_eq!(n.message, "Private send is not supported");
            }
            other => panic!("expected notice, got {other:?}"),
        }
        assert_eq!(screen.compose_text(), "");
    }

    #[test]
    fn backspace_edits_compose() {
        let mut screen = BoardScreen::new();
        type_text(&mut screen, "pong");
        screen.handle_key_event(key(KeyCode::Backspace)).unwrap();
        assert_eq!(screen.compose_text(), "pon");
    }

    #[test]
    fn renders_feed_lines() {
        let mut screen = BoardScreen::new();
        screen.update(&Action::SnapshotUpdated(snapshot())).unwrap();
        screen.update(&Action::FeedStateChanged(FeedState::Ready)).unwrap();

        let mut terminal = Terminal::new(TestBackend::new(60, 10)).unwrap();
        terminal.draw(|f| screen.render(f, f.area())).unwrap();

        let text: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(ratatui::buffer::Cell::symbol)
            .collect();
        assert!(text.contains(r#"From org1: ["hello"]"#), "{text}");
        assert!(text.contains("Messages (1)"));
    }
}
