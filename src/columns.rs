//! Column layout for the list region.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::feed::{Category, ResultItem};
use crate::format::{format_bytes, format_pub_date};

/// Horizontal placement of text inside a fixed-width column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// One column. A width of zero takes whatever the fixed columns leave over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub width: u16,
    pub align: Align,
}

impl Column {
    #[must_use]
    pub const fn fixed(width: u16, align: Align) -> Self {
        Self { width, align }
    }

    #[must_use]
    pub const fn flexible() -> Self {
        Self {
            width: 0,
            align: Align::Left,
        }
    }
}

/// Rows of pre-formatted cells ready for the render consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayList {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
    status_column: Option<usize>,
}

impl DisplayList {
    #[must_use]
    pub const fn new(columns: Vec<Column>, rows: Vec<Vec<String>>, status_column: Option<usize>) -> Self {
        Self {
            columns,
            rows,
            status_column,
        }
    }

    /// Index, status glyph, title, date and size, one row per hit.
    #[must_use]
    pub fn for_results(items: &[ResultItem]) -> Self {
        let rows = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                vec![
                    format!("{:04}", i + 1),
                    String::new(),
                    item.display_title(),
                    format_pub_date(&item.pub_date),
                    format_bytes(item.size_bytes),
                ]
            })
            .collect();
        Self::new(
            vec![
                Column::fixed(4, Align::Left),
                Column::fixed(1, Align::Left),
                Column::flexible(),
                Column::fixed(22, Align::Center),
                Column::fixed(10, Align::Right),
            ],
            rows,
            Some(1),
        )
    }

    /// Status glyph, id and name; subcategories are indented under their parent.
    #[must_use]
    pub fn for_categories(categories: &[Category]) -> Self {
        let rows = categories
            .iter()
            .map(|c| {
                let name = if c.is_subcategory {
                    format!("    {}", c.name)
                } else {
                    c.name.clone()
                };
                vec![String::new(), c.id.clone(), name]
            })
            .collect();
        Self::new(
            vec![
                Column::fixed(1, Align::Left),
                Column::fixed(6, Align::Right),
                Column::flexible(),
            ],
            rows,
            Some(0),
        )
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
    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    #[must_use]
    pub const fn status_column(&self) -> Option<usize> {
        self.status_column
    }

    /// Start column and width of every column for a line `total` cells wide.
    ///
    /// Columns are separated by one space. Columns that no longer fit get a
    /// width of zero.
    #[must_use]
    pub fn layout(&self, total: u16) -> Vec<(u16, u16)> {
        let separators = u16::try_from(self.columns.len().saturating_sub(1)).unwrap_or(u16::MAX);
        let fixed: u16 = self
            .columns
            .iter()
            .fold(0u16, |acc, c| acc.saturating_add(c.width));
        let flexible_count = self.columns.iter().filter(|c| c.width == 0).count();
        let spare = total.saturating_sub(fixed.saturating_add(separators));
        let flexible_width = u16::try_from(flexible_count)
            .ok()
            .filter(|&n| n > 0)
            .map_or(0, |n| spare / n);

        let mut x = 0u16;
        self.columns
            .iter()
            .map(|c| {
                let wanted = if c.width == 0 { flexible_width } else { c.width };
                let width = wanted.min(total.saturating_sub(x));
                let start = x;
                x = x.saturating_add(width).saturating_add(1).min(total);
                (start, width)
            })
            .collect()
    }

    /// Start position of the status cell for a line `total` cells wide.
    #[must_use]
    pub fn status_x(&self, total: u16) -> Option<u16> {
        let column = self.status_column?;
        self.layout(total)
            .get(column)
            .filter(|(_, width)| *width > 0)
            .map(|(start, _)| *start)
    }

    /// Text of one cell padded to its column.
    #[must_use]
    pub fn cell_text(&self, column: usize, text: &str, width: u16) -> String {
        let align = self.columns.get(column).map_or(Align::Left, |c| c.align);
        pad(text, usize::from(width), align)
    }
}

/// Longest prefix of `text` that fits in `width` terminal cells, and its
/// width in cells.
#[must_use]
pub fn truncate_to_width(text: &str, width: usize) -> (String, usize) {
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        out.push(c);
    }
    (out, used)
}

/// Pads or cuts `text` to exactly `width` terminal cells.
#[must_use]
pub fn pad(text: &str, width: usize, align: Align) -> String {
    let len = text.width();
    if len >= width {
        // A wide glyph that straddles the edge leaves one blank cell.
        let (cut, used) = truncate_to_width(text, width);
        return format!("{cut}{}", " ".repeat(width - used));
    }
    let gap = width - len;
    match align {
        Align::Left => format!("{text}{}", " ".repeat(gap)),
        Align::Right => format!("{}{text}", " ".repeat(gap)),
        Align::Center => {
            let left = gap / 2;
            format!("{}{text}{}", " ".repeat(left), " ".repeat(gap - left))
        }
    }
}
