//! getnzbs - search Newznab-compatible indexers and retrieve NZB files.
//!
//! Searches and retrievals run on background threads. They never touch the
//! screen; they push [`RenderCommand`]s onto a [`RenderQueue`] that a single
//! [`Renderer`] applies to the shared [`ListModel`] and a [`DisplaySurface`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use getnzbs::{HttpFetcher, SearchJob, SearchParams, SearchRequest};
//!
//! # fn example() -> getnzbs::Result<()> {
//! let fetcher = Arc::new(HttpFetcher::new(Duration::from_secs(30))?);
//! let request = SearchRequest {
//!     base_url: "https://indexer.example".to_string(),
//!     params: SearchParams {
//!         api_key: "0123456789abcdef".to_string(),
//!         query: Some("big buck bunny".to_string()),
//!         ..SearchParams::default()
//!     },
//!     offset: 0,
//!     limit: 300,
//!     page_size: 100,
//! };
//! let results = SearchJob::new(request, fetcher).spawn()?.join()?;
//! println!("{} results", results.len());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod cli;
pub mod columns;
pub mod config;
pub mod dispatch;
pub mod download;
pub mod error;
pub mod feed;
pub mod fetch;
pub mod format;
pub mod list;
pub mod logging;
pub mod render;
pub mod search;
pub mod session;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use cli::{Cli, RunOptions};
pub use columns::DisplayList;
pub use config::{AppConfig, Defaults, ServerConfig};
pub use dispatch::{DispatchReport, Dispatcher};
pub use download::{DownloadJob, RunningDownload, destination_path, sanitize_title};
pub use error::{Error, ParseError, Result};
pub use feed::{Category, ResultItem, parse_caps, parse_feed};
pub use fetch::{HttpFetcher, RemoteFetch, USER_AGENT};
pub use format::{format_bytes, format_pub_date};
pub use list::{ListModel, RowMark, RowState, RowStyle};
pub use render::{Attr, DisplaySurface, RenderCommand, RenderQueue, RenderReceiver, Renderer};
pub use search::{SearchHandle, SearchJob, SearchKind, SearchParams, SearchRequest, sort_results};
pub use session::{ListState, Session};
