//! Terminal-backed display surface.

use std::io::{self, Stdout};

use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};

use crate::render::{Attr, DisplaySurface};

/// Maps a display attribute to terminal colours.
#[must_use]
pub fn style_for(attr: Attr) -> Style {
    let base = Style::default();
    match attr {
        Attr::Plain => base,
        Attr::Header => base.fg(Color::Cyan).add_modifier(Modifier::BOLD),
        Attr::Wait => base.fg(Color::Yellow),
        Attr::Status => base.fg(Color::White),
        Attr::Footer => base.fg(Color::Black).bg(Color::Cyan),
        Attr::Focused => base.add_modifier(Modifier::REVERSED),
        Attr::Selected => base.fg(Color::Green).add_modifier(Modifier::BOLD),
        Attr::SelectedFocused => base.fg(Color::Black).bg(Color::Green),
        Attr::Fetched => base.fg(Color::DarkGray),
        Attr::FetchedFocused => base.fg(Color::Black).bg(Color::DarkGray),
        Attr::Alert => base.fg(Color::White).bg(Color::Red).add_modifier(Modifier::BOLD),
        Attr::AlertBorder => base.fg(Color::Yellow).bg(Color::Red),
    }
}

/// Cell buffer drawn on the consumer thread and copied to the terminal on
/// every refresh.
pub struct TerminalSurface {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    buffer: Buffer,
    cursor: (u16, u16),
}

impl TerminalSurface {
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be queried or cleared.
    pub fn new() -> io::Result<Self> {
        let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        terminal.clear()?;
        let size = terminal.size()?;
        Ok(Self {
            terminal,
            buffer: Buffer::empty(Rect::new(0, 0, size.width, size.height)),
            cursor: (0, 0),
        })
    }
}

impl DisplaySurface for TerminalSurface {
    fn size(&self) -> (u16, u16) {
        (self.buffer.area.height, self.buffer.area.width)
    }

    fn move_cursor(&mut self, row: u16, col: u16) {
        self.cursor = (row, col);
    }

    fn clear_to_line_end(&mut self) {
        let (row, col) = self.cursor;
        for x in col..self.buffer.area.width {
            if let Some(cell) = self.buffer.cell_mut((x, row)) {
                cell.reset();
            }
        }
    }

    fn insert_text(&mut self, text: &str, width_limit: u16, attr: Attr) {
        let (row, col) = self.cursor;
        let area = self.buffer.area;
        if row >= area.height || col >= area.width {
            return;
        }
        let limit = width_limit.min(area.width - col);
        let (x, _) = self
            .buffer
            .set_stringn(col, row, text, usize::from(limit), style_for(attr));
        self.cursor = (row, x);
    }

    fn refresh(&mut self) -> io::Result<()> {
        let source = &self.buffer;
        self.terminal.draw(|frame| {
            let target = frame.buffer_mut();
            let area = target.area.intersection(source.area);
            for y in area.top()..area.bottom() {
                for x in area.left()..area.right() {
                    if let (Some(from), Some(to)) = (source.cell((x, y)), target.cell_mut((x, y))) {
                        *to = from.clone();
                    }
                }
            }
        })?;
        Ok(())
    }

    fn resize(&mut self, rows: u16, cols: u16) {
        self.buffer.resize(Rect::new(0, 0, cols, rows));
        self.buffer.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_styles_are_distinct() {
        let rows = [
            Attr::Plain,
            Attr::Focused,
            Attr::Selected,
            Attr::SelectedFocused,
            Attr::Fetched,
            Attr::FetchedFocused,
        ];
        for (i, a) in rows.iter().enumerate() {
            for b in &rows[i + 1..] {
                assert_ne!(style_for(*a), style_for(*b), "{a:?} vs {b:?}");
            }
        }
    }
}
