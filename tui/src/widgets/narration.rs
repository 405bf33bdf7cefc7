//! Narration Column Widget
//!
//! Draws the visible slice of the page: headings with a trailing rule, and
//! narration lines that brighten (with a marker in the gutter) while their
//! step is active.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::Widget;
use unicode_width::UnicodeWidthStr;

use crate::page::{LineKind, ViewLine};
use crate::theme;

const GUTTER: &str = "▌ ";

/// The narration column for one frame
pub struct NarrationColumn<'a> {
    lines: &'a [ViewLine],
}

impl<'a> NarrationColumn<'a> {
    pub fn new(lines: &'a [ViewLine]) -> Self {
        Self { lines }
    }
}

impl Widget for NarrationColumn<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let gutter = u16::try_from(GUTTER.width()).unwrap_or(2);
        let text_x = area.x + gutter.min(area.width);
        let text_width = usize::from(area.width.saturating_sub(gutter));

        for (row, view) in self.lines.iter().take(usize::from(area.height)).enumerate() {
            let y = area.y + u16::try_from(row).unwrap_or(u16::MAX);
            match view.line.kind {
                LineKind::Blank => {}
                LineKind::Heading => {
                    let title = &view.line.text;
                    let rule = "─".repeat(text_width.saturating_sub(title.width() + 1));
                    buf.set_stringn(
                        text_x,
                        y,
                        format!("{title} {rule}"),
                        text_width,
                        theme::heading(),
                    );
                }
                LineKind::Text => {
                    if view.active {
                        buf.set_stringn(
                            area.x,
                            y,
                            GUTTER,
                            usize::from(area.width),
                            Style::default().fg(theme::ACTIVE_MARKER),
                        );
                    }
                    buf.set_stringn(
                        text_x,
                        y,
                        &view.line.text,
                        text_width,
                        theme::narration(view.active),
                    );
                }
            }
        }
    }
}
