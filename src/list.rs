//! Selectable list state: per-row marks, the current-row pointer and the
//! scroll window.

/// Per-row flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowState {
    pub selected: bool,
    pub fetched: bool,
}

/// What a row carries, ignoring focus. `Fetched` wins over `Selected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowMark {
    Plain,
    Selected,
    Fetched,
}

impl RowState {
    #[must_use]
    pub const fn mark(self) -> RowMark {
        if self.fetched {
            RowMark::Fetched
        } else if self.selected {
            RowMark::Selected
        } else {
            RowMark::Plain
        }
    }
}

impl RowMark {
    /// Glyph shown in the status column.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Plain => ' ',
            Self::Selected => '-',
            Self::Fetched => 'X',
        }
    }
}

/// How a row is drawn. Variants are listed in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStyle {
    FetchedFocused,
    Fetched,
    SelectedFocused,
    Selected,
    Focused,
    Plain,
}

impl RowStyle {
    /// Combines a row mark with the orthogonal focus overlay.
    #[must_use]
    pub const fn resolve(mark: RowMark, focused: bool) -> Self {
        match (mark, focused) {
            (RowMark::Fetched, true) => Self::FetchedFocused,
            (RowMark::Fetched, false) => Self::Fetched,
            (RowMark::Selected, true) => Self::SelectedFocused,
            (RowMark::Selected, false) => Self::Selected,
            (RowMark::Plain, true) => Self::Focused,
            (RowMark::Plain, false) => Self::Plain,
        }
    }
}

/// Row state for every entry of the displayed list plus the visible window.
#[derive(Debug, Clone, Default)]
pub struct ListModel {
    rows: Vec<RowState>,
    current: Option<usize>,
    offset: usize,
    visible_rows: usize,
}

impl ListModel {
    #[must_use]
    pub const fn new(visible_rows: usize) -> Self {
        Self {
            rows: Vec::new(),
            current: None,
            offset: 0,
            visible_rows,
        }
    }

    /// Replaces every row with `len` unmarked rows and focuses the first.
    pub fn reset(&mut self, len: usize) {
        self.rows = vec![RowState::default(); len];
        self.current = if len == 0 { None } else { Some(0) };
        self.offset = 0;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn row(&self, index: usize) -> Option<RowState> {
        self.rows.get(index).copied()
    }

    #[must_use]
    pub const fn current(&self) -> Option<usize> {
        self.current
    }

    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub const fn visible_rows(&self) -> usize {
        self.visible_rows
    }

    /// Flips `selected` unless the row has already been fetched.
    /// Returns the new selected flag.
    pub fn toggle_select(&mut self, index: usize) -> bool {
        match self.rows.get_mut(index) {
            Some(row) if !row.fetched => {
                row.selected = !row.selected;
                row.selected
            }
            Some(row) => row.selected,
            None => false,
        }
    }

    /// Queues a row again even if it was fetched before.
    pub fn reselect(&mut self, index: usize) {
        if let Some(row) = self.rows.get_mut(index) {
            row.selected = true;
        }
    }

    pub fn mark_fetched(&mut self, index: usize) {
        if let Some(row) = self.rows.get_mut(index) {
            row.fetched = true;
            row.selected = false;
        }
    }

    pub fn clear_selected(&mut self, index: usize) {
        if let Some(row) = self.rows.get_mut(index) {
            row.selected = false;
        }
    }

    /// Moves the current row by `delta`, clamped to the list bounds.
    pub fn move_current(&mut self, delta: isize) {
        let Some(current) = self.current else {
            return;
        };
        self.set_current(current.saturating_add_signed(delta));
    }

    /// Focuses `index` (clamped to the last row) and scrolls it into view.
    pub fn set_current(&mut self, index: usize) {
        if self.rows.is_empty() {
            self.current = None;
            return;
        }
        let index = index.min(self.rows.len() - 1);
        self.current = Some(index);
        self.scroll_to(index);
    }

    /// Recomputes the window height, keeping the current row visible.
    pub fn resize(&mut self, visible_rows: usize) {
        self.visible_rows = visible_rows;
        let max_offset = self.rows.len().saturating_sub(visible_rows.max(1));
        self.offset = self.offset.min(max_offset);
        if let Some(current) = self.current {
            self.scroll_to(current);
        }
    }

    fn scroll_to(&mut self, index: usize) {
        let window = self.visible_rows.max(1);
        if index < self.offset {
            self.offset = index;
        } else if index >= self.offset + window {
            self.offset = index + 1 - window;
        }
    }

    /// Screen line (relative to the list region) of `index`, if visible.
    #[must_use]
    pub fn line_of(&self, index: usize) -> Option<usize> {
        (index < self.rows.len() && index >= self.offset && index < self.offset + self.visible_rows)
            .then(|| index - self.offset)
    }

    #[must_use]
    pub fn is_visible(&self, index: usize) -> bool {
        self.line_of(index).is_some()
    }

    /// Row shown on `line` of the list region, if any.
    #[must_use]
    pub fn index_at_line(&self, line: usize) -> Option<usize> {
        let index = self.offset + line;
        (line < self.visible_rows && index < self.rows.len()).then_some(index)
    }

    /// Render decision for `index`.
    #[must_use]
    pub fn style(&self, index: usize) -> RowStyle {
        let mark = self.row(index).map_or(RowMark::Plain, RowState::mark);
        RowStyle::resolve(mark, self.current == Some(index))
    }

    pub fn selected_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.selected)
            .map(|(i, _)| i)
    }

    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.rows.iter().filter(|row| row.selected).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(len: usize, visible: usize) -> ListModel {
        let mut model = ListModel::new(visible);
        model.reset(len);
        model
    }

    // ==================== Marks ====================

    #[test]
    fn toggle_flips_selection() {
        let mut m = model(3, 10);
        assert!(m.toggle_select(1));
        assert_eq!(m.row(1).unwrap().mark(), RowMark::Selected);
        assert!(!m.toggle_select(1));
        assert_eq!(m.row(1).unwrap().mark(), RowMark::Plain);
    }

    #[test]
    fn fetched_rows_ignore_toggle() {
        let mut m = model(3, 10);
        m.mark_fetched(0);
        assert!(!m.toggle_select(0));
        assert_eq!(m.row(0), Some(RowState { selected: false, fetched: true }));
    }

    #[test]
    fn reselect_queues_fetched_row_again() {
        let mut m = model(3, 10);
        m.mark_fetched(2);
        m.reselect(2);
        let row = m.row(2).unwrap();
        assert!(row.selected && row.fetched);
        // Fetched still takes visual priority.
        assert_eq!(row.mark(), RowMark::Fetched);
        assert_eq!(m.selected_indices().collect::<Vec<_>>(), [2]);
    }

    #[test]
    fn out_of_range_indices_are_ignored() {
        let mut m = model(2, 10);
        assert!(!m.toggle_select(9));
        m.mark_fetched(9);
        m.reselect(9);
        m.clear_selected(9);
        assert_eq!(m.selected_count(), 0);
        assert_eq!(m.style(9), RowStyle::Plain);
    }

    #[test]
    fn selected_count_and_indices() {
        let mut m = model(5, 10);
        for i in [0, 2, 4] {
            m.toggle_select(i);
        }
        assert_eq!(m.selected_count(), 3);
        assert_eq!(m.selected_indices().collect::<Vec<_>>(), [0, 2, 4]);
    }

    // ==================== Render decision ====================

    #[test]
    fn style_priority_table() {
        let mut m = model(6, 10);
        // row 0 current + plain
        assert_eq!(m.style(0), RowStyle::Focused);
        assert_eq!(m.style(1), RowStyle::Plain);

        m.toggle_select(1);
        assert_eq!(m.style(1), RowStyle::Selected);
        m.set_current(1);
        assert_eq!(m.style(1), RowStyle::SelectedFocused);

        m.mark_fetched(1);
        assert_eq!(m.style(1), RowStyle::FetchedFocused);
        m.set_current(2);
        assert_eq!(m.style(1), RowStyle::Fetched);
    }

    #[test]
    fn glyphs_follow_marks() {
        assert_eq!(RowMark::Plain.glyph(), ' ');
        assert_eq!(RowMark::Selected.glyph(), '-');
        assert_eq!(RowMark::Fetched.glyph(), 'X');
    }

    // ==================== Navigation ====================

    #[test]
    fn reset_focuses_first_row() {
        let m = model(4, 2);
        assert_eq!(m.current(), Some(0));
        assert_eq!(model(0, 2).current(), None);
    }

    #[test]
    fn move_current_clamps() {
        let mut m = model(4, 10);
        m.move_current(-3);
        assert_eq!(m.current(), Some(0));
        m.move_current(100);
        assert_eq!(m.current(), Some(3));
    }

    #[test]
    fn move_on_empty_list_is_noop() {
        let mut m = model(0, 10);
        m.move_current(1);
        assert_eq!(m.current(), None);
    }

    #[test]
    fn scrolling_keeps_current_visible() {
        let mut m = model(10, 3);
        m.move_current(4);
        assert_eq!(m.current(), Some(4));
        assert_eq!(m.offset(), 2);
        assert!(m.is_visible(4));
        assert!(!m.is_visible(1));

        m.move_current(-3);
        assert_eq!(m.offset(), 1);
        assert_eq!(m.line_of(1), Some(0));
    }

    #[test]
    fn index_at_line_maps_through_offset() {
        let mut m = model(10, 3);
        m.set_current(6);
        assert_eq!(m.offset(), 4);
        assert_eq!(m.index_at_line(0), Some(4));
        assert_eq!(m.index_at_line(2), Some(6));
        assert_eq!(m.index_at_line(3), None);
    }

    #[test]
    fn resize_keeps_marks_and_current_visible() {
        let mut m = model(20, 10);
        m.toggle_select(3);
        m.mark_fetched(5);
        m.set_current(9);
        m.resize(4);
        assert_eq!(m.visible_rows(), 4);
        assert!(m.is_visible(9));
        assert_eq!(m.row(3).unwrap().mark(), RowMark::Selected);
        assert_eq!(m.row(5).unwrap().mark(), RowMark::Fetched);

        m.resize(40);
        assert_eq!(m.offset(), 0);
        assert!(m.is_visible(19));
    }

    #[test]
    fn zero_height_window_shows_nothing() {
        let mut m = model(5, 0);
        m.move_current(2);
        assert_eq!(m.current(), Some(2));
        assert!(!m.is_visible(2));
        assert_eq!(m.index_at_line(0), None);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn toggle_parity(len in 1usize..50, index in 0usize..50, toggles in 0usize..40) {
                let mut m = model(len, 10);
                let index = index % len;
                for _ in 0..toggles {
                    m.toggle_select(index);
                }
                prop_assert_eq!(m.row(index).unwrap().selected, toggles % 2 == 1);
            }

            #[test]
            fn mark_fetched_is_idempotent(ops in proptest::collection::vec(any::<bool>(), 0..40)) {
                let mut m = model(3, 10);
                m.mark_fetched(1);
                for op in ops {
                    if op { m.mark_fetched(1); } else { m.toggle_select(1); }
                    let row = m.row(1).unwrap();
                    prop_assert!(row.fetched);
                    prop_assert!(!row.selected);
                }
            }

            #[test]
            fn current_always_visible(len in 1usize..100, visible in 1usize..30,
                                      moves in proptest::collection::vec(-40isize..40, 0..30)) {
                let mut m = model(len, visible);
                for delta in moves {
                    m.move_current(delta);
                    let current = m.current().unwrap();
                    prop_assert!(current < len);
                    prop_assert!(m.is_visible(current));
                }
            }
        }
    }
}
