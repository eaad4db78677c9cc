use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout},
    text::Line,
    widgets::{Paragraph, Wrap},
};

use crate::card::FlashcardSet;
use crate::palette::Palette;
use crate::tui::{DeckView, Theme};

/// Prints every card as a numbered question/answer pair.
pub fn print_plain(cards: &FlashcardSet) {
    for (idx, card) in cards.iter().enumerate() {
        println!(
            "{} {}",
            Palette::paint(Palette::FRONT, format!("{:>2}. Q:", idx + 1)),
            card.question()
        );
        println!(
            "{} {}",
            Palette::paint(Palette::BACK, "    A:"),
            card.answer()
        );
        if idx + 1 < cards.len() {
            println!();
        }
    }
}

/// Shows the deck one card at a time until the user exits.
pub fn run(cards: FlashcardSet, title: &str) -> Result<()> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to configure terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to start terminal")?;
    terminal.hide_cursor().context("failed to hide cursor")?;

    let mut view = DeckView::new(cards);
    let loop_result = view_loop(&mut terminal, &mut view, title);

    teardown_terminal(&mut terminal)?;
    loop_result
}

fn view_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    view: &mut DeckView,
    title: &str,
) -> Result<()> {
    loop {
        terminal
            .draw(|frame| {
                let area = frame.area();
                frame.render_widget(Theme::backdrop(), area);
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(5), Constraint::Length(3)])
                    .split(area);

                let header = Line::from(vec![
                    Theme::label_span(format!(
                        " Card {}/{} ",
                        (view.position() + 1).min(view.len()),
                        view.len()
                    )),
                    Theme::bullet(),
                    Theme::span(title.to_string()),
                    Theme::bullet(),
                    Theme::face_label(view.is_flipped()),
                ]);

                let card_widget = Paragraph::new(view.face_text().to_string())
                    .block(Theme::card_face(header, view.is_flipped()))
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true });
                frame.render_widget(card_widget, chunks[0]);

                let footer = Paragraph::new(controls_line())
                    .block(Theme::panel_with_line(Theme::section_header("Controls")));
                frame.render_widget(footer, chunks[1]);
            })
            .context("failed to render frame")?;

        if event::poll(Duration::from_millis(16))?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if key.code == KeyCode::Esc
                || key.code == KeyCode::Char('q')
                || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
            {
                return Ok(());
            }
            match key.code {
                KeyCode::Char(' ') | KeyCode::Enter => view.flip(),
                KeyCode::Right | KeyCode::Char('l') => {
                    view.next();
                }
                KeyCode::Left | KeyCode::Char('h') => {
                    view.previous();
                }
                _ => {}
            }
        }
    }
}

fn controls_line() -> Line<'static> {
    Line::from(vec![
        Theme::key_chip("Space"),
        Theme::span(" flip"),
        Theme::bullet(),
        Theme::key_chip("←"),
        Theme::span(" / "),
        Theme::key_chip("→"),
        Theme::span(" move"),
        Theme::bullet(),
        Theme::key_chip("Esc"),
        Theme::span(" / "),
        Theme::key_chip("q"),
        Theme::span(" exit"),
    ])
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("failed to restore terminal")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}
