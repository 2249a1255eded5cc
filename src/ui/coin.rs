use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use randofun::{clock::Clock, coin::CoinFace, usage::GameKind};
use unicode_width::UnicodeWidthStr;

use super::{recent_line, screen::Screen};
use crate::App;

pub struct CoinScreen;

impl Screen for CoinScreen {
    fn keys(&self) -> &'static str {
        "(enter) flip   (r) reset counts   (s) change style"
    }

    fn render<C: Clock>(&self, app: &App<C>, area: Rect, buf: &mut Buffer) {
        let coin = &app.coin;
        let face = coin.showing();
        let color = match face {
            CoinFace::Heads => Color::Yellow,
            CoinFace::Tails => Color::Cyan,
        };
        let mut face_style = Style::default().fg(color).add_modifier(Modifier::BOLD);
        if coin.is_flipping() {
            face_style = face_style.add_modifier(Modifier::DIM);
        }

        let mut lines = coin_art(coin.style().face_label(face), face_style);
        lines.push(Line::default());
        lines.push(Line::from(vec![
            Span::styled(
                format!("Heads {}", coin.heads()),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw("   "),
            Span::styled(
                format!("Tails {}", coin.tails()),
                Style::default().fg(Color::Cyan),
            ),
        ]));
        lines.push(Line::from(Span::styled(
            format!("style: {}", coin.style()),
            Style::default().add_modifier(Modifier::DIM),
        )));
        lines.push(recent_line(app, GameKind::Coin));

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

/// Round frame sized to the face's display width
fn coin_art(label: &str, style: Style) -> Vec<Line<'static>> {
    let inner = label.width() + 4;
    vec![
        Line::from(Span::styled(format!("╭{}╮", "─".repeat(inner)), style)),
        Line::from(Span::styled(format!("│{}│", " ".repeat(inner)), style)),
        Line::from(Span::styled(format!("│  {label}  │"), style)),
        Line::from(Span::styled(format!("│{}│", " ".repeat(inner)), style)),
        Line::from(Span::styled(format!("╰{}╯", "─".repeat(inner)), style)),
    ]
}
