use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Line as Stroke},
        Block, Paragraph, Widget, Wrap,
    },
};
use randofun::{
    clock::Clock,
    spinner::option::{percent_label, shares},
    usage::GameKind,
};

use super::{recent_line, screen::Screen};
use crate::App;

const PALETTE: [Color; 6] = [
    Color::Red,
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
];

/// Canvas units from the centre to the top edge
const HALF_HEIGHT: f64 = 1.3;

pub struct WheelScreen;

impl Screen for WheelScreen {
    fn keys(&self) -> &'static str {
        "(enter) spin"
    }

    fn render<C: Clock>(&self, app: &App<C>, area: Rect, buf: &mut Buffer) {
        let rows = Layout::vertical([Constraint::Length(1), Constraint::Min(1)]).split(area);
        Paragraph::new(Span::styled(
            app.settings.spinner_title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .render(rows[0], buf);

        let cols = Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[1]);
        render_wheel(app, cols[0], buf);
        render_legend(app, cols[1], buf);
    }
}

fn render_wheel<C: Clock>(app: &App<C>, area: Rect, buf: &mut Buffer) {
    let block = Block::bordered();
    let inner = block.inner(area);
    // braille dots are square when x spans w/2h of the y range
    let half_width = if inner.height == 0 {
        HALF_HEIGHT
    } else {
        HALF_HEIGHT * f64::from(inner.width) / (2.0 * f64::from(inner.height))
    };

    let rotation = app.spinner.rotation();
    let arcs = app.spinner.arcs().arcs().to_vec();
    let under_pointer = app.spinner.resolve_index(rotation);

    Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([-half_width, half_width])
        .y_bounds([-HALF_HEIGHT, HALF_HEIGHT])
        .paint(move |ctx| {
            ctx.draw(&Circle {
                x: 0.0,
                y: 0.0,
                radius: 1.0,
                color: Color::White,
            });
            for (i, arc) in arcs.iter().enumerate() {
                // screen angles run clockwise from twelve o'clock
                let edge = arc.start + rotation;
                ctx.draw(&Stroke::new(0.0, 0.0, edge.sin(), edge.cos(), Color::DarkGray));

                let mid = arc.mid() + rotation;
                let style = if i == under_pointer {
                    Style::default()
                        .fg(PALETTE[i % PALETTE.len()])
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else {
                    Style::default().fg(PALETTE[i % PALETTE.len()])
                };
                ctx.print(
                    mid.sin() * 0.65,
                    mid.cos() * 0.65,
                    Span::styled(format!("{}", i + 1), style),
                );
            }
            ctx.print(
                0.0,
                1.15,
                Span::styled("▼", Style::default().fg(Color::White)),
            );
        })
        .render(area, buf);
}

fn render_legend<C: Clock>(app: &App<C>, area: Rect, buf: &mut Buffer) {
    let options = app.spinner.options();
    let current = app.spinner.resolve_index(app.spinner.rotation());

    let mut lines: Vec<Line> = options
        .iter()
        .zip(shares(options))
        .enumerate()
        .map(|(i, (option, share))| {
            let color = PALETTE[i % PALETTE.len()];
            let marker = if i == current { "▶ " } else { "  " };
            let label_style = if i == current {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::raw(marker),
                Span::styled(format!("{:>2} ", i + 1), Style::default().fg(color)),
                Span::styled(option.label.clone(), label_style),
                Span::styled(
                    format!("  {}", percent_label(share)),
                    Style::default().add_modifier(Modifier::DIM),
                ),
            ])
        })
        .collect();

    lines.push(Line::default());
    let status = if app.spinner.is_spinning() {
        Line::from(vec![
            Span::raw("Spinning... "),
            Span::styled(
                app.spinner.current_option().label.clone(),
                Style::default().fg(Color::Cyan),
            ),
        ])
    } else if let Some(result) = &app.last_spin {
        Line::from(vec![
            Span::raw("Result: "),
            Span::styled(
                result.label.clone(),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        Line::from(Span::styled(
            "Press enter to spin",
            Style::default().add_modifier(Modifier::ITALIC),
        ))
    };
    lines.push(status);
    lines.push(recent_line(app, GameKind::Spinner));

    Paragraph::new(lines)
        .block(Block::bordered().title(" options "))
        .wrap(Wrap { trim: true })
        .render(area, buf);
}
