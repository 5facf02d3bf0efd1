//! Render command queue and its single consumer.
//!
//! Every change to the screen is expressed as a [`RenderCommand`] and pushed
//! onto a [`RenderQueue`]. Exactly one [`Renderer`] pops commands in arrival
//! order, applies them to the shared list model and the [`DisplaySurface`],
//! and refreshes the surface once per command.

use std::io;
use std::sync::Arc;
use std::sync::mpsc as std_mpsc;
use std::thread::JoinHandle;

use tokio::sync::mpsc;
use unicode_width::UnicodeWidthStr;

use crate::columns::{Align, DisplayList, pad};
use crate::format::format_bytes;
use crate::list::{ListModel, RowMark, RowStyle};
use crate::session::ListState;

/// First screen row of the list region. Row 0 is the header, row 1 the status line.
pub const LIST_TOP: u16 = 2;

/// Number of list rows that fit on a screen `rows` high.
#[must_use]
pub const fn list_rows(rows: u16) -> usize {
    rows.saturating_sub(LIST_TOP + 1) as usize
}

/// Display attribute of a run of text. The terminal front end maps these to
/// colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attr {
    Plain,
    Header,
    Wait,
    Status,
    Footer,
    Focused,
    Selected,
    SelectedFocused,
    Fetched,
    FetchedFocused,
    Alert,
    AlertBorder,
}

impl From<RowStyle> for Attr {
    fn from(style: RowStyle) -> Self {
        match style {
            RowStyle::FetchedFocused => Self::FetchedFocused,
            RowStyle::Fetched => Self::Fetched,
            RowStyle::SelectedFocused => Self::SelectedFocused,
            RowStyle::Selected => Self::Selected,
            RowStyle::Focused => Self::Focused,
            RowStyle::Plain => Self::Plain,
        }
    }
}

/// Character-cell output device driven by the render consumer.
pub trait DisplaySurface {
    /// Current size as `(rows, cols)`.
    fn size(&self) -> (u16, u16);

    fn move_cursor(&mut self, row: u16, col: u16);

    /// Blanks from the cursor to the end of its line.
    fn clear_to_line_end(&mut self);

    /// Writes at most `width_limit` cells of `text` at the cursor and
    /// advances it.
    fn insert_text(&mut self, text: &str, width_limit: u16, attr: Attr);

    /// Makes everything written since the last refresh visible.
    ///
    /// # Errors
    ///
    /// Returns an error if the output device cannot be written.
    fn refresh(&mut self) -> io::Result<()>;

    /// Adopts a new size. Contents may be discarded.
    fn resize(&mut self, rows: u16, cols: u16);
}

/// A deferred display action.
#[derive(Debug)]
pub enum RenderCommand {
    /// Replace the displayed list; resets every row mark.
    ShowList(Arc<DisplayList>),
    DrawRow(usize),
    DrawList,
    RedrawAll,
    Header(String),
    Status(String),
    /// Status text drawn in the waiting style.
    Wait(String),
    /// Appends a dot to the status line.
    WaitDot,
    Footer(String),
    /// Draws `glyph` in the status cell of `index` if it is on screen.
    Spinner { index: usize, glyph: char },
    /// Moves the current row by a number of rows.
    Navigate(isize),
    /// Moves the current row by a number of screens.
    Page(isize),
    /// Focuses a row; out-of-range indices clamp to the last row.
    JumpTo(usize),
    /// Focuses the row drawn on a screen line.
    ClickLine(u16),
    ToggleCurrent,
    /// Marks the current row again even if it was already fetched.
    RequeueCurrent,
    Resize { rows: u16, cols: u16 },
    /// Centered box over the list. Cleared by the next full redraw.
    Alert(Vec<String>),
    /// Signals the sender once every earlier command has been applied.
    Barrier(std_mpsc::Sender<()>),
    Shutdown,
}

/// Producer side of the render queue. Cheap to clone, usable from any thread.
#[derive(Debug, Clone)]
pub struct RenderQueue {
    tx: mpsc::UnboundedSender<RenderCommand>,
}

/// Consumer side of the render queue.
#[derive(Debug)]
pub struct RenderReceiver {
    rx: mpsc::UnboundedReceiver<RenderCommand>,
}

#[cfg(test)]
impl RenderReceiver {
    /// Takes every command queued so far without blocking.
    pub(crate) fn drain(&mut self) -> Vec<RenderCommand> {
        std::iter::from_fn(|| self.rx.try_recv().ok()).collect()
    }
}

impl RenderQueue {
    #[must_use]
    pub fn channel() -> (Self, RenderReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, RenderReceiver { rx })
    }

    /// Never blocks. Commands sent after the consumer stopped are discarded.
    pub fn enqueue(&self, command: RenderCommand) {
        if let Err(e) = self.tx.send(command) {
            log::debug!("Render consumer gone, dropped {:?}", e.0);
        }
    }

    pub fn status(&self, text: impl Into<String>) {
        self.enqueue(RenderCommand::Status(text.into()));
    }

    /// Blocks until every command queued before this call has been applied.
    /// Returns `false` if the consumer is no longer running.
    pub fn flush(&self) -> bool {
        let (tx, rx) = std_mpsc::channel();
        self.enqueue(RenderCommand::Barrier(tx));
        rx.recv().is_ok()
    }

    pub fn shutdown(&self) {
        self.enqueue(RenderCommand::Shutdown);
    }
}

/// The single render consumer.
pub struct Renderer<S> {
    surface: S,
    state: ListState,
    list: Arc<DisplayList>,
    header: String,
    status: String,
    status_attr: Attr,
    footer: String,
}

impl<S: DisplaySurface> Renderer<S> {
    /// Sizes the shared list model to the surface.
    pub fn new(surface: S, state: ListState) -> Self {
        let (rows, _) = surface.size();
        state.model().resize(list_rows(rows));
        Self {
            surface,
            state,
            list: Arc::new(DisplayList::default()),
            header: String::new(),
            status: String::new(),
            status_attr: Attr::Status,
            footer: String::new(),
        }
    }

    /// Pops and applies commands until [`RenderCommand::Shutdown`] arrives or
    /// every producer is dropped, then hands the surface back.
    pub fn run(mut self, mut receiver: RenderReceiver) -> S {
        while let Some(command) = receiver.rx.blocking_recv() {
            if matches!(command, RenderCommand::Shutdown) {
                break;
            }
            self.execute(command);
            if let Err(e) = self.surface.refresh() {
                log::warn!("Screen refresh failed: {e}");
            }
        }
        log::debug!("Render consumer stopped");
        self.surface
    }

    /// Runs the consumer on its own thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn(self, receiver: RenderReceiver) -> io::Result<JoinHandle<S>>
    where
        S: Send + 'static,
    {
        std::thread::Builder::new()
            .name("render".into())
            .spawn(move || self.run(receiver))
    }

    /// Applies one command without refreshing.
    pub fn execute(&mut self, command: RenderCommand) {
        match command {
            RenderCommand::ShowList(list) => {
                self.state.model().reset(list.len());
                self.list = list;
                self.draw_list();
            }
            RenderCommand::DrawRow(index) => self.draw_row(index),
            RenderCommand::DrawList => self.draw_list(),
            RenderCommand::RedrawAll => self.redraw_all(),
            RenderCommand::Header(text) => {
                self.header = text;
                self.draw_header();
            }
            RenderCommand::Status(text) => {
                self.status = text;
                self.status_attr = Attr::Status;
                self.draw_status();
            }
            RenderCommand::Wait(text) => {
                self.status = text;
                self.status_attr = Attr::Wait;
                self.draw_status();
            }
            RenderCommand::WaitDot => {
                let (_, cols) = self.surface.size();
                if self.status.as_str().width() < usize::from(cols) {
                    self.status.push('.');
                    self.draw_status();
                }
            }
            RenderCommand::Footer(text) => {
                self.footer = text;
                self.draw_footer();
            }
            RenderCommand::Spinner { index, glyph } => self.draw_spinner(index, glyph),
            RenderCommand::Navigate(delta) => self.navigate(|m| m.move_current(delta)),
            RenderCommand::Page(pages) => self.navigate(|m| {
                let screen = isize::try_from(m.visible_rows().max(1)).unwrap_or(isize::MAX);
                m.move_current(pages.saturating_mul(screen));
            }),
            RenderCommand::JumpTo(index) => self.navigate(|m| m.set_current(index)),
            RenderCommand::ClickLine(row) => {
                if let Some(line) = row.checked_sub(LIST_TOP) {
                    self.navigate(|m| {
                        if let Some(index) = m.index_at_line(usize::from(line)) {
                            m.set_current(index);
                        }
                    });
                }
            }
            RenderCommand::ToggleCurrent => self.mark_current(false),
            RenderCommand::RequeueCurrent => self.mark_current(true),
            RenderCommand::Resize { rows, cols } => {
                self.surface.resize(rows, cols);
                self.state.model().resize(list_rows(rows));
                self.redraw_all();
            }
            RenderCommand::Alert(lines) => self.draw_alert(&lines),
            RenderCommand::Barrier(done) => {
                let _ = done.send(());
            }
            RenderCommand::Shutdown => {}
        }
    }

    fn navigate(&mut self, step: impl FnOnce(&mut ListModel)) {
        let (before, after, scrolled) = {
            let mut model = self.state.model();
            let before = model.current();
            let offset = model.offset();
            step(&mut *model);
            (before, model.current(), offset != model.offset())
        };
        if scrolled {
            self.draw_list();
        } else if before != after {
            if let Some(index) = before {
                self.draw_row(index);
            }
            if let Some(index) = after {
                self.draw_row(index);
            }
        }
    }

    fn mark_current(&mut self, requeue: bool) {
        let current = {
            let mut model = self.state.model();
            let current = model.current();
            if let Some(index) = current {
                if requeue {
                    model.reselect(index);
                } else {
                    model.toggle_select(index);
                }
            }
            current
        };
        let Some(index) = current else {
            return;
        };
        self.draw_row(index);
        // Category rows have no items behind them.
        if self.state.item_count() == 0 {
            return;
        }
        let (count, bytes) = self.state.selection_summary();
        self.status = if bytes > 0 {
            format!("{count} items queued.  Total size:  {}", format_bytes(bytes))
        } else {
            format!("{count} items queued.")
        };
        self.status_attr = Attr::Status;
        self.draw_status();
    }

    fn put_line(&mut self, row: u16, text: &str, attr: Attr) {
        let (rows, cols) = self.surface.size();
        if row >= rows {
            return;
        }
        self.surface.move_cursor(row, 0);
        self.surface.clear_to_line_end();
        self.surface.insert_text(text, cols, attr);
    }

    fn draw_header(&mut self) {
        let header = std::mem::take(&mut self.header);
        self.put_line(0, &header, Attr::Header);
        self.header = header;
    }

    fn draw_status(&mut self) {
        let status = std::mem::take(&mut self.status);
        self.put_line(1, &status, self.status_attr);
        self.status = status;
    }

    fn draw_footer(&mut self) {
        let (rows, _) = self.surface.size();
        if rows <= LIST_TOP {
            return;
        }
        let footer = std::mem::take(&mut self.footer);
        self.put_line(rows - 1, &footer, Attr::Footer);
        self.footer = footer;
    }

    fn row_line(&self, index: usize, glyph: char, cols: u16) -> String {
        let mut line = String::new();
        let Some(cells) = self.list.row(index) else {
            return line;
        };
        let status_column = self.list.status_column();
        for (column, (start, width)) in self.list.layout(cols).into_iter().enumerate() {
            if width == 0 {
                continue;
            }
            let have = line.width();
            line.extend(std::iter::repeat_n(' ', usize::from(start).saturating_sub(have)));
            if Some(column) == status_column {
                line.push(glyph);
                continue;
            }
            let text = cells.get(column).map_or("", String::as_str);
            line.push_str(&self.list.cell_text(column, text, width));
        }
        let have = line.width();
        line.extend(std::iter::repeat_n(' ', usize::from(cols).saturating_sub(have)));
        line
    }

    /// Screen row and render decision of `index`, if it is on screen.
    fn placement(&self, index: usize) -> Option<(u16, RowStyle, RowMark)> {
        let model = self.state.model();
        let line = model.line_of(index)?;
        let row = LIST_TOP.checked_add(u16::try_from(line).ok()?)?;
        let mark = model.row(index)?.mark();
        Some((row, model.style(index), mark))
    }

    fn draw_row(&mut self, index: usize) {
        let Some((row, style, mark)) = self.placement(index) else {
            return;
        };
        let (rows, cols) = self.surface.size();
        if row + 1 >= rows {
            return;
        }
        let line = self.row_line(index, mark.glyph(), cols);
        self.surface.move_cursor(row, 0);
        self.surface.insert_text(&line, cols, Attr::from(style));
    }

    fn draw_spinner(&mut self, index: usize, glyph: char) {
        let Some((row, style, _)) = self.placement(index) else {
            return;
        };
        let (rows, cols) = self.surface.size();
        let Some(x) = self.list.status_x(cols) else {
            return;
        };
        if row + 1 >= rows {
            return;
        }
        self.surface.move_cursor(row, x);
        self.surface.insert_text(&glyph.to_string(), 1, Attr::from(style));
    }

    fn draw_list(&mut self) {
        let (rows, _) = self.surface.size();
        let visible = self.state.model().visible_rows();
        for line in 0..visible {
            let Some(row) = u16::try_from(line).ok().and_then(|l| LIST_TOP.checked_add(l)) else {
                break;
            };
            if row + 1 >= rows {
                break;
            }
            let index = self.state.model().index_at_line(line);
            match index {
                Some(index) => self.draw_row(index),
                None => {
                    self.surface.move_cursor(row, 0);
                    self.surface.clear_to_line_end();
                }
            }
        }
    }

    fn redraw_all(&mut self) {
        let (rows, _) = self.surface.size();
        for row in 0..rows {
            self.surface.move_cursor(row, 0);
            self.surface.clear_to_line_end();
        }
        self.draw_header();
        self.draw_status();
        self.draw_list();
        self.draw_footer();
    }

    fn draw_alert(&mut self, lines: &[String]) {
        let (rows, cols) = self.surface.size();
        let inner = lines.iter().map(|l| l.as_str().width()).max().unwrap_or(0);
        let width = u16::try_from(inner + 4).unwrap_or(u16::MAX).min(cols);
        let height = u16::try_from(lines.len() + 2).unwrap_or(u16::MAX).min(rows);
        if width < 2 || height < 2 {
            return;
        }
        let top = (rows - height) / 2;
        let left = (cols - width) / 2;
        let bar = "─".repeat(usize::from(width - 2));

        self.surface.move_cursor(top, left);
        self.surface
            .insert_text(&format!("┌{bar}┐"), width, Attr::AlertBorder);
        for (i, text) in lines.iter().take(usize::from(height - 2)).enumerate() {
            let row = top + 1 + u16::try_from(i).unwrap_or(0);
            let padded = pad(text, inner, Align::Left);
            self.surface.move_cursor(row, left);
            self.surface.insert_text("│", 1, Attr::AlertBorder);
            self.surface
                .insert_text(&format!(" {padded} "), width.saturating_sub(2), Attr::Alert);
            self.surface.insert_text("│", 1, Attr::AlertBorder);
        }
        self.surface.move_cursor(top + height - 1, left);
        self.surface
            .insert_text(&format!("└{bar}┘"), width, Attr::AlertBorder);
    }
}
