//! Test doubles: an in-memory indexer and a recording surface.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use unicode_width::UnicodeWidthChar;

use crate::columns::truncate_to_width;
use crate::error::{Error, Result};
use crate::fetch::RemoteFetch;
use crate::render::{Attr, DisplaySurface, RenderQueue};
use crate::session::Session;

/// Serves search pages for `available` results, caps documents and
/// downloads. URLs containing a registered failure pattern fail with a
/// transport error.
#[derive(Debug, Default)]
pub struct FakeFeed {
    available: usize,
    failing: Vec<String>,
    delay: Duration,
    requests: Mutex<Vec<String>>,
}

impl FakeFeed {
    pub fn new(available: usize) -> Self {
        Self {
            available,
            ..Self::default()
        }
    }

    pub fn failing(mut self, pattern: &str) -> Self {
        self.failing.push(pattern.to_string());
        self
    }

    /// Delay applied to download requests.
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// `limit` parameter of every search request, in order.
    pub fn requested_limits(&self) -> Vec<usize> {
        self.requests()
            .iter()
            .filter_map(|url| query(url).get("limit").and_then(|l| l.parse().ok()))
            .collect()
    }

    fn search_page(&self, params: &HashMap<String, String>) -> String {
        let offset: usize = params.get("offset").and_then(|o| o.parse().ok()).unwrap_or(0);
        let limit: usize = params.get("limit").and_then(|l| l.parse().ok()).unwrap_or(100);
        let end = self.available.min(offset + limit);
        let mut body = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>fake</title>"#);
        for i in offset..end {
            let _ = write!(
                body,
                "<item><title>Result {i}</title><pubDate>Tue, 14 Jan 2025 18:02:11 +0000</pubDate>\
                 <link>http://fake.example/get/{i}?apikey=k&amp;amp;x=1</link><category>TV &gt; HD</category>\
                 <enclosure url=\"http://fake.example/get/{i}\" length=\"{}\" type=\"application/x-nzb\"/></item>",
                (i + 1) * 1024
            );
        }
        body.push_str("</channel></rss>");
        body
    }
}

const CAPS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<caps>
  <categories>
    <category id="2000" name="Movies">
      <subcat id="2040" name="HD"/>
    </category>
    <category id="5000" name="TV">
      <subcat id="5030" name="SD"/>
      <subcat id="5040" name="HD"/>
    </category>
  </categories>
</caps>"#;

fn query(url: &str) -> HashMap<String, String> {
    reqwest::Url::parse(url)
        .map(|u| u.query_pairs().into_owned().collect())
        .unwrap_or_default()
}

impl RemoteFetch for FakeFeed {
    fn fetch(&self, url: &str) -> Result<Bytes> {
        self.requests.lock().unwrap().push(url.to_string());
        if self.failing.iter().any(|p| url.contains(p.as_str())) {
            return Err(Error::Transport(format!("connection refused: {url}")));
        }
        let params = query(url);
        match params.get("t").map(String::as_str) {
            Some("caps") => Ok(Bytes::from_static(CAPS.as_bytes())),
            Some(_) => Ok(Bytes::from(self.search_page(&params))),
            None => {
                std::thread::sleep(self.delay);
                Ok(Bytes::from(format!("<nzb>{url}</nzb>")))
            }
        }
    }
}

pub fn test_session(queue: RenderQueue) -> Session {
    Session::new(Arc::new(FakeFeed::new(0)), std::env::temp_dir(), queue)
}

/// One `insert_text` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Write {
    pub row: u16,
    pub col: u16,
    pub text: String,
    pub attr: Attr,
}

/// Character grid that records every write.
#[derive(Debug)]
pub struct RecordingSurface {
    rows: u16,
    cols: u16,
    grid: Vec<Vec<(char, Attr)>>,
    cursor: (u16, u16),
    writes: Vec<Write>,
    refreshes: usize,
}

impl RecordingSurface {
    pub fn new(rows: u16, cols: u16) -> Self {
        Self {
            rows,
            cols,
            grid: blank(rows, cols),
            cursor: (0, 0),
            writes: Vec::new(),
            refreshes: 0,
        }
    }

    pub fn line(&self, row: u16) -> String {
        self.grid
            .get(usize::from(row))
            .map(|cells| {
                cells
                    .iter()
                    .map(|(c, _)| *c)
                    .filter(|&c| c != WIDE_TAIL)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn char_at(&self, row: u16, col: u16) -> Option<char> {
        self.cell(row, col).map(|(c, _)| c)
    }

    pub fn attr_at(&self, row: u16, col: u16) -> Option<Attr> {
        self.cell(row, col).map(|(_, a)| a)
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    pub const fn refreshes(&self) -> usize {
        self.refreshes
    }

    fn cell(&self, row: u16, col: u16) -> Option<(char, Attr)> {
        self.grid.get(usize::from(row))?.get(usize::from(col)).copied()
    }
}

const WIDE_TAIL: char = '\0';

fn blank(rows: u16, cols: u16) -> Vec<Vec<(char, Attr)>> {
    vec![vec![(' ', Attr::Plain); usize::from(cols)]; usize::from(rows)]
}

impl DisplaySurface for RecordingSurface {
    fn size(&self) -> (u16, u16) {
        (self.rows, self.cols)
    }

    fn move_cursor(&mut self, row: u16, col: u16) {
        self.cursor = (row, col);
    }

    fn clear_to_line_end(&mut self) {
        let (row, col) = self.cursor;
        if let Some(cells) = self.grid.get_mut(usize::from(row)) {
            for cell in cells.iter_mut().skip(usize::from(col)) {
                *cell = (' ', Attr::Plain);
            }
        }
    }

    fn insert_text(&mut self, text: &str, width_limit: u16, attr: Attr) {
        let (row, col) = self.cursor;
        let (text, used) = truncate_to_width(text, usize::from(width_limit));
        let mut x = usize::from(col);
        if let Some(cells) = self.grid.get_mut(usize::from(row)) {
            for c in text.chars() {
                let w = c.width().unwrap_or(0);
                if let Some(cell) = cells.get_mut(x) {
                    *cell = (c, attr);
                }
                // Trailing half of a wide glyph.
                for cont in cells.iter_mut().skip(x + 1).take(w.saturating_sub(1)) {
                    *cont = (WIDE_TAIL, attr);
                }
                x += w;
            }
        }
        self.cursor = (row, col.saturating_add(u16::try_from(used).unwrap_or(u16::MAX)));
        self.writes.push(Write { row, col, text, attr });
    }

    fn refresh(&mut self) -> std::io::Result<()> {
        self.refreshes += 1;
        Ok(())
    }

    fn resize(&mut self, rows: u16, cols: u16) {
        self.rows = rows;
        self.cols = cols;
        self.grid = blank(rows, cols);
    }
}
