use crate::palette::{Palette, PaletteColor};

use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders},
};

/// Styles shared by the deck viewer.
pub struct Theme;

impl Theme {
    pub const KEY_FG: Color = Color::Rgb(255, 255, 255);

    pub fn label() -> Style {
        Style::default()
            .fg(Palette::ACCENT.tui())
            .add_modifier(Modifier::BOLD)
    }

    pub fn emphasis() -> Style {
        Style::default().add_modifier(Modifier::BOLD)
    }

    pub fn backdrop<'a>() -> Block<'a> {
        Block::default()
    }

    pub fn panel_with_line<'a>(title: Line<'a>) -> Block<'a> {
        Self::bordered(Palette::BORDER).title(title)
    }

    /// A card face: rounded border tinted with the face color.
    pub fn card_face<'a>(title: Line<'a>, flipped: bool) -> Block<'a> {
        let face = if flipped { Palette::BACK } else { Palette::FRONT };
        Self::bordered(face)
            .border_type(BorderType::Thick)
            .title(title)
    }

    fn bordered<'a>(color: PaletteColor) -> Block<'a> {
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(color.tui()))
            .title_alignment(Alignment::Left)
    }

    pub fn face_label(flipped: bool) -> Span<'static> {
        let (text, color) = if flipped {
            (" Answer ", Palette::BACK)
        } else {
            (" Question ", Palette::FRONT)
        };
        Span::styled(
            text,
            Style::default()
                .fg(color.tui())
                .add_modifier(Modifier::BOLD),
        )
    }

    pub fn label_span(text: impl Into<String>) -> Span<'static> {
        Span::styled(text.into(), Self::label())
    }

    pub fn span(text: impl Into<String>) -> Span<'static> {
        Span::raw(text.into())
    }

    pub fn key_chip(text: impl Into<String>) -> Span<'static> {
        Span::styled(
            format!(" {} ", text.into()),
            Style::default()
                .fg(Self::KEY_FG)
                .bg(Palette::ACCENT.tui())
                .add_modifier(Modifier::BOLD),
        )
    }

    pub fn bullet() -> Span<'static> {
        Self::span(" • ")
    }

    pub fn section_header(text: impl Into<String>) -> Line<'static> {
        Line::from(vec![Span::styled(text.into(), Self::emphasis())])
    }
}
