//! Neon palette and semantic styling for the board.

use ratatui::style::{Color, Modifier, Style};

use fireboard_core::NoticeLevel;

// ── Core Palette ──────────────────────────────────────────────────────

pub const ELECTRIC_PURPLE: Color = Color::Rgb(225, 53, 255); // #e135ff
pub const NEON_CYAN: Color = Color::Rgb(128, 255, 234); // #80ffea
pub const CORAL: Color = Color::Rgb(255, 106, 193); // #ff6ac1
pub const ELECTRIC_YELLOW: Color = Color::Rgb(241, 250, 140); // #f1fa8c
pub const SUCCESS_GREEN: Color = Color::Rgb(80, 250, 123); // #50fa7b
pub const ERROR_RED: Color = Color::Rgb(255, 99, 99); // #ff6363

// ── Extended Palette ──────────────────────────────────────────────────

pub const DIM_WHITE: Color = Color::Rgb(189, 193, 207); // #bdc1cf
pub const BORDER_GRAY: Color = Color::Rgb(98, 114, 164); // #6272a4
pub const BG_DARK: Color = Color::Rgb(30, 31, 41); // #1e1f29

// ── Semantic Styles ───────────────────────────────────────────────────

/// Title text for blocks/panels.
pub fn title_style() -> Style {
    Style::default().fg(NEON_CYAN).add_modifier(Modifier::BOLD)
}

/// Border for a focused panel.
pub fn border_focused() -> Style {
    Style::default().fg(ELECTRIC_PURPLE)
}

/// Border for an unfocused panel.
pub fn border_default() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Sender prefix of a feed line.
pub fn sender_self() -> Style {
    Style::default().fg(CORAL).add_modifier(Modifier::BOLD)
}

pub fn sender_other() -> Style {
    Style::default().fg(NEON_CYAN)
}

/// Normal list text.
pub fn feed_row() -> Style {
    Style::default().fg(DIM_WHITE)
}

/// Key hint text (e.g., "Enter send").
pub fn key_hint() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Key hint key character.
pub fn key_hint_key() -> Style {
    Style::default().fg(NEON_CYAN).add_modifier(Modifier::BOLD)
}

/// Toast colour for a notice.
pub fn notice(level: NoticeLevel) -> Style {
    let fg = match level {
        NoticeLevel::Info => SUCCESS_GREEN,
        NoticeLevel::Warning => ELECTRIC_YELLOW,
        NoticeLevel::Error => ERROR_RED,
    };
    Style::default().fg(fg).add_modifier(Modifier::BOLD)
}
