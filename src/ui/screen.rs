use ratatui::{buffer::Buffer, layout::Rect};
use randofun::clock::Clock;

use crate::App;

/// A UI Screen boundary: one per game tab
pub trait Screen {
    /// Key help for the footer
    fn keys(&self) -> &'static str;
    fn render<C: Clock>(&self, app: &App<C>, area: Rect, buf: &mut Buffer);
}
