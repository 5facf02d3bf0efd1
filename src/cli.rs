//! Command line arguments.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::AppConfig;
use crate::error::Result;
use crate::search::{SearchKind, SearchParams, SearchRequest};

#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "getnzbs",
    version,
    about = "Query Newznab and compatible servers"
)]
pub struct Cli {
    /// Search term(s)
    #[arg(value_name = "QUERY")]
    pub query: Vec<String>,

    /// NZB server to query
    #[arg(short, long)]
    pub server: Option<String>,

    /// Category to search or browse
    #[arg(long = "cat", value_name = "CAT")]
    pub category: Option<String>,

    /// Browse categories before searching
    #[arg(short, long)]
    pub browse: bool,

    /// Limit number of results returned
    #[arg(short, long, value_name = "N")]
    pub limit: Option<u64>,

    /// Skip the first N results
    #[arg(short, long, value_name = "N", default_value_t = 0)]
    pub offset: u64,

    /// Search movies
    #[arg(short = 'm')]
    pub movie: bool,

    /// imdb.com id (implies -m)
    #[arg(long = "imdb", value_name = "ID")]
    pub imdb_id: Option<String>,

    /// tvdb.com id (implies -t)
    #[arg(long = "tvdb", value_name = "ID")]
    pub tvdb_id: Option<String>,

    /// Search TV shows
    #[arg(short = 't')]
    pub tv: bool,

    /// Season number
    #[arg(short = 'S', long)]
    pub season: Option<String>,

    /// Episode number (requires --season)
    #[arg(short = 'E', long, requires = "season")]
    pub episode: Option<String>,

    /// Shorthand for category 5070: Anime
    #[arg(short, long)]
    pub anime: bool,

    /// Search books
    #[arg(long)]
    pub book: bool,

    /// Author (case insensitive)
    #[arg(long, num_args = 1..)]
    pub author: Vec<String>,

    /// Shorthand for category 7030: Comics
    #[arg(short, long)]
    pub comics: bool,

    /// Search music
    #[arg(long)]
    pub music: bool,

    /// Artist (case insensitive)
    #[arg(long, num_args = 1..)]
    pub artist: Vec<String>,

    /// Reverse sort
    #[arg(short = 'r')]
    pub reverse: bool,

    /// Sort alphabetically
    #[arg(long)]
    pub alpha: bool,

    /// Configuration file to use instead of the default locations
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file (default: <data dir>/getnzbs/getnzbs.log)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Everything the front end needs for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub server_name: String,
    pub request: SearchRequest,
    pub query: String,
    pub browse: bool,
    pub alpha: bool,
    pub reverse: bool,
    pub destination: PathBuf,
    pub timeout: Duration,
}

impl Cli {
    #[must_use]
    pub fn query_text(&self) -> String {
        self.query.join(" ")
    }

    /// Search function and parameters selected by the flags.
    #[must_use]
    pub fn search_params(&self, api_key: &str) -> SearchParams {
        let mut params = SearchParams {
            api_key: api_key.to_string(),
            query: (!self.query.is_empty()).then(|| self.query_text()),
            ..SearchParams::default()
        };

        if self.tv || self.tvdb_id.is_some() {
            params.kind = SearchKind::TvSearch;
            params.tvdb_id.clone_from(&self.tvdb_id);
            if self.season.is_some() {
                params.season.clone_from(&self.season);
                params.episode.clone_from(&self.episode);
            }
        } else if self.movie || self.imdb_id.is_some() {
            params.kind = SearchKind::Movie;
            params.imdb_id = self
                .imdb_id
                .as_deref()
                .map(|id| id.trim_start_matches("tt").to_string());
        } else if self.book || !self.author.is_empty() {
            params.kind = SearchKind::Book;
            params.category = Some("7020".to_string());
            params.author = (!self.author.is_empty()).then(|| self.author.join(","));
        } else if self.music || !self.artist.is_empty() {
            params.kind = SearchKind::Music;
            params.category = Some("3010,3040".to_string());
            params.artist = (!self.artist.is_empty()).then(|| self.artist.join(","));
        }

        if self.anime {
            params.category = Some("5070".to_string());
        } else if self.comics {
            params.category = Some("7030".to_string());
        } else if self.category.is_some() {
            params.category.clone_from(&self.category);
        }
        params
    }

    /// Resolves the server and builds the search request.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the server cannot be resolved.
    pub fn run_options(&self, config: &AppConfig) -> Result<RunOptions> {
        let (name, server) = config.server(self.server.as_deref())?;
        let request = SearchRequest {
            base_url: server.url.clone(),
            params: self.search_params(&server.api_key),
            offset: self.offset,
            limit: self.limit.unwrap_or(config.defaults.max_results),
            page_size: server.page_size,
        };
        Ok(RunOptions {
            server_name: name.to_string(),
            request,
            query: self.query_text(),
            browse: self.browse,
            alpha: self.alpha,
            reverse: self.reverse,
            destination: config.prepare_destination(),
            timeout: config.request_timeout(),
        })
    }
}
