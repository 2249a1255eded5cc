use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use randofun::{clock::Clock, finger::RoundState, usage::GameKind};

use super::{recent_line, screen::Screen};
use crate::{finger_id, finger_label, App, KEY_ROWS};

/// One colour per participant slot
const SLOT_COLORS: [Color; 5] = [
    Color::Cyan,
    Color::Magenta,
    Color::Yellow,
    Color::Blue,
    Color::Red,
];

pub struct FingerScreen;

impl Screen for FingerScreen {
    fn keys(&self) -> &'static str {
        "(a-z) press/lift   (space) lift all   (1-4) winners   (+/-) spotlight time"
    }

    fn render<C: Clock>(&self, app: &App<C>, area: Rect, buf: &mut Buffer) {
        let bold = Style::default().add_modifier(Modifier::BOLD);

        let status = match app.finger.state() {
            RoundState::Idle if app.finger.participants().is_empty() => Line::from(Span::styled(
                "Everyone press a letter key to join",
                Style::default().add_modifier(Modifier::ITALIC),
            )),
            RoundState::Idle => Line::from("Nobody held long enough, lift every key to retry"),
            RoundState::Counting { remaining } => Line::from(Span::styled(
                format!("Hold on... {remaining}"),
                bold.fg(Color::Yellow),
            )),
            RoundState::Selecting { .. } => {
                Line::from(Span::styled("Choosing...", bold.fg(Color::Cyan)))
            }
            RoundState::Finished { winners } => {
                let title = if winners.len() == 1 { "Winner" } else { "Winners" };
                Line::from(vec![
                    Span::styled(format!("{title}: "), bold),
                    Span::styled(
                        winners.iter().map(|id| finger_label(*id)).join(", "),
                        bold.fg(Color::Green),
                    ),
                ])
            }
        };

        let config = app.finger.config();
        let settings = Line::from(Span::styled(
            format!(
                "{} winner(s), {:.0}s spotlight",
                app.settings.max_winners,
                app.settings.orbit_secs
            ),
            Style::default().add_modifier(Modifier::DIM),
        ));

        let mut lines = vec![status, Line::default()];
        for (row, keys) in KEY_ROWS.iter().enumerate() {
            let mut spans = vec![Span::raw(" ".repeat(row * 2))];
            spans.extend(keys.chars().map(|c| key_span(app, c)));
            lines.push(Line::from(spans));
            lines.push(Line::default());
        }
        lines.push(settings);
        if config.max_winners != app.settings.max_winners {
            lines.push(Line::from(Span::styled(
                "new settings apply to the next round",
                Style::default().add_modifier(Modifier::DIM),
            )));
        }
        lines.push(recent_line(app, GameKind::Finger));

        let top = area.height.saturating_sub(lines.len() as u16) / 2;
        let body = Rect {
            y: area.y + top,
            height: area.height - top,
            ..area
        };
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(body, buf);
    }
}

fn key_span<C: Clock>(app: &App<C>, c: char) -> Span<'static> {
    let id = finger_id(c);
    let winner = matches!(app.finger.state(), RoundState::Finished { winners } if winners.contains(&id));

    match app.finger.participant(id) {
        _ if winner => Span::styled(
            format!("[{c}]"),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Some(_) if app.spotlight == Some(id) => Span::styled(
            format!("[{c}]"),
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Some(p) => Span::styled(
            format!("[{c}]"),
            Style::default()
                .fg(SLOT_COLORS[p.slot % SLOT_COLORS.len()])
                .add_modifier(Modifier::BOLD),
        ),
        None => Span::styled(
            format!(" {c} "),
            Style::default().add_modifier(Modifier::DIM),
        ),
    }
}
