pub mod coin;
pub mod finger;
pub mod screen;
pub mod wheel;

use chrono::{DateTime, Local};
use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Tabs, Widget, Wrap},
    Frame,
};
use randofun::{clock::Clock, usage::GameKind};

use crate::App;
use screen::Screen;

const HORIZONTAL_MARGIN: u16 = 2;

pub fn draw<C: Clock>(app: &App<C>, f: &mut Frame) {
    f.render_widget(app, f.area());
}

fn tab_title(kind: GameKind) -> &'static str {
    match kind {
        GameKind::Coin => "Coin flip",
        GameKind::Finger => "Finger picker",
        GameKind::Spinner => "Spinner",
    }
}

impl<C: Clock> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::vertical([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(area);

        let selected = GameKind::ALL
            .iter()
            .position(|k| *k == self.tab)
            .unwrap_or(0);
        Tabs::new(GameKind::ALL.map(tab_title))
            .block(Block::bordered().title(" randofun "))
            .select(selected)
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .render(chunks[0], buf);

        let body = chunks[1].inner(Margin {
            horizontal: HORIZONTAL_MARGIN,
            vertical: 0,
        });
        let keys = match self.tab {
            GameKind::Coin => render_screen(&coin::CoinScreen, self, body, buf),
            GameKind::Finger => render_screen(&finger::FingerScreen, self, body, buf),
            GameKind::Spinner => render_screen(&wheel::WheelScreen, self, body, buf),
        };

        footer(self, keys).render(chunks[2], buf);
    }
}

fn render_screen<S: Screen, C: Clock>(
    screen: &S,
    app: &App<C>,
    area: Rect,
    buf: &mut Buffer,
) -> &'static str {
    screen.render(app, area, buf);
    screen.keys()
}

fn footer<C: Clock>(app: &App<C>, keys: &'static str) -> Paragraph<'static> {
    let dim = Style::default().add_modifier(Modifier::DIM);
    let plays = match app.remaining_plays(app.tab) {
        Some(left) => format!("free plays left: {left}"),
        None => "unlimited plays".to_string(),
    };

    let status = match &app.notice {
        Some(notice) => Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Yellow),
        )),
        None => Line::from(Span::styled(plays, dim)),
    };

    Paragraph::new(vec![
        status,
        Line::from(Span::styled(
            format!("{keys}   (del) clear history   (tab) next game   (esc) quit"),
            dim,
        )),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
}

/// "Recent: x (2m ago), y (1h ago)" for one game, newest first
fn recent_line<C: Clock>(app: &App<C>, kind: GameKind) -> Line<'static> {
    let now = Local::now();
    let recent = app
        .recent(kind)
        .map(|r| format!("{} ({})", r.summary, age(r.timestamp, now)))
        .join(", ");
    if recent.is_empty() {
        return Line::default();
    }
    Line::from(vec![
        Span::styled("Recent: ", Style::default().add_modifier(Modifier::DIM)),
        Span::raw(recent),
    ])
}

fn age(at: DateTime<Local>, now: DateTime<Local>) -> String {
    let secs = (now - at).num_seconds().max(0);
    match secs {
        0..=59 => "just now".to_string(),
        60..=3599 => format!("{}m ago", secs / 60),
        3600..=86399 => format!("{}h ago", secs / 3600),
        _ => format!("{}d ago", secs / 86400),
    }
}
