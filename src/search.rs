//! Paginated background search.

use std::sync::Arc;
use std::thread::JoinHandle;

use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::feed::{ResultItem, parse_feed};
use crate::fetch::RemoteFetch;

/// Newznab search function, sent as the `t` parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchKind {
    #[default]
    Search,
    TvSearch,
    Movie,
    Book,
    Music,
}

impl SearchKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::TvSearch => "tvsearch",
            Self::Movie => "movie",
            Self::Book => "book",
            Self::Music => "music",
        }
    }
}

/// Query parameters other than paging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub kind: SearchKind,
    pub api_key: String,
    pub query: Option<String>,
    pub category: Option<String>,
    pub tvdb_id: Option<String>,
    pub season: Option<String>,
    pub episode: Option<String>,
    pub imdb_id: Option<String>,
    pub author: Option<String>,
    pub artist: Option<String>,
}

impl SearchParams {
    /// Parameters in the order they are sent. Absent values are omitted.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("t", self.kind.as_str().to_string()), ("apikey", self.api_key.clone())];
        let optional = [
            ("q", &self.query),
            ("cat", &self.category),
            ("tvdbid", &self.tvdb_id),
            ("season", &self.season),
            ("ep", &self.episode),
            ("imdbid", &self.imdb_id),
            ("author", &self.author),
            ("artist", &self.artist),
        ];
        pairs.extend(
            optional
                .into_iter()
                .filter_map(|(key, value)| value.as_ref().map(|v| (key, v.clone()))),
        );
        pairs
    }
}

/// Builds `<base>/api?<pairs>`.
///
/// # Errors
///
/// Returns [`Error::Config`] if `base_url` is not a valid URL.
pub fn api_url<K, V>(base_url: &str, pairs: impl IntoIterator<Item = (K, V)>) -> Result<String>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let endpoint = format!("{}/api", base_url.trim_end_matches('/'));
    reqwest::Url::parse_with_params(&endpoint, pairs)
        .map(String::from)
        .map_err(|e| Error::Config(format!("invalid server url {base_url:?}: {e}")))
}

/// One paginated search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub base_url: String,
    pub params: SearchParams,
    /// Index of the first result wanted.
    pub offset: u64,
    /// Maximum number of results overall.
    pub limit: u64,
    /// Results the server returns per page.
    pub page_size: u64,
}

impl SearchRequest {
    /// URL of one page.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the base URL is invalid.
    pub fn page_url(&self, offset: u64, limit: u64) -> Result<String> {
        let mut pairs = self.params.query_pairs();
        pairs.push(("offset", offset.to_string()));
        pairs.push(("limit", limit.to_string()));
        api_url(&self.base_url, pairs)
    }

    /// The query without paging, for display.
    #[must_use]
    pub fn display_url(&self) -> String {
        let pairs = self
            .params
            .query_pairs()
            .into_iter()
            .filter(|(key, _)| *key != "apikey");
        api_url(&self.base_url, pairs).unwrap_or_else(|_| self.base_url.clone())
    }
}

/// Fetches pages until the limit is reached or the server runs out.
pub struct SearchJob {
    request: SearchRequest,
    fetcher: Arc<dyn RemoteFetch>,
    cancel: CancellationToken,
}

impl SearchJob {
    #[must_use]
    pub fn new(request: SearchRequest, fetcher: Arc<dyn RemoteFetch>) -> Self {
        Self {
            request,
            fetcher,
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Runs the search on the calling thread.
    ///
    /// # Errors
    ///
    /// The first transport failure, unparseable page, incomplete record or
    /// server error document ends the search.
    pub fn run(&self) -> Result<Vec<ResultItem>> {
        let page_size = self.request.page_size.max(1);
        let mut offset = self.request.offset;
        let mut remaining = self.request.limit;
        let mut results = Vec::new();
        let mut page = 0usize;

        log::info!(
            "Searching {} (limit {remaining}, page size {page_size})",
            self.request.display_url()
        );
        while remaining > 0 {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let page_limit = page_size.min(remaining);
            let url = self.request.page_url(offset, page_limit)?;
            let body = self.fetcher.fetch(&url).inspect_err(|e| {
                log::warn!("Page {page} failed: {e}");
            })?;
            let mut items = parse_feed(&body).inspect_err(|e| {
                log::warn!("Page {page} unreadable: {e}");
            })?;
            let received = items.len();
            items.truncate(usize::try_from(page_limit).unwrap_or(usize::MAX));
            log::debug!("Page {page}: offset {offset}, {received} of {page_limit}");
            results.extend(items);

            if (received as u64) < page_limit {
                break;
            }
            offset += page_size;
            remaining = remaining.saturating_sub(page_size);
            page += 1;
        }
        log::info!("Search finished with {} results", results.len());
        Ok(results)
    }

    /// Runs the search on its own thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn(self) -> std::io::Result<SearchHandle> {
        let handle = std::thread::Builder::new()
            .name("search".into())
            .spawn(move || self.run())?;
        Ok(SearchHandle { handle })
    }
}

/// A search running in the background.
#[derive(Debug)]
pub struct SearchHandle {
    handle: JoinHandle<Result<Vec<ResultItem>>>,
}

impl SearchHandle {
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the outcome.
    ///
    /// # Errors
    ///
    /// Returns the search's error, or [`Error::Job`] if the thread panicked.
    pub fn join(self) -> Result<Vec<ResultItem>> {
        self.handle
            .join()
            .unwrap_or_else(|_| Err(Error::Job("search thread panicked".to_string())))
    }
}

/// Optional alphabetical sort by title, then optional reversal.
pub fn sort_results(results: &mut [ResultItem], alpha: bool, reverse: bool) {
    if alpha {
        results.sort_by(|a, b| a.title.cmp(&b.title));
    }
    if reverse {
        results.reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeFeed;

    fn request(limit: u64, page_size: u64) -> SearchRequest {
        SearchRequest {
            base_url: "http://fake.example/".to_string(),
            params: SearchParams {
                api_key: "k".into(),
                query: Some("some show".into()),
                ..SearchParams::default()
            },
            offset: 0,
            limit,
            page_size,
        }
    }

    fn run(feed: FakeFeed, request: SearchRequest) -> (Result<Vec<ResultItem>>, Arc<FakeFeed>) {
        let feed = Arc::new(feed);
        let result = SearchJob::new(request, feed.clone()).run();
        (result, feed)
    }

    #[test]
    fn short_last_page_ends_the_search() {
        let (result, feed) = run(FakeFeed::new(250), request(300, 100));
        let results = result.unwrap();
        assert_eq!(results.len(), 250);
        assert_eq!(feed.requested_limits(), [100, 100, 100]);
        assert_eq!(results[0].title, "Result 0");
        assert_eq!(results[249].title, "Result 249");
    }

    #[test]
    fn transport_failure_is_terminal() {
        let (result, feed) = run(FakeFeed::new(250).failing("/api"), request(300, 100));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Fetch Error"));
        assert_eq!(feed.requests().len(), 1);
    }

    #[test]
    fn last_page_limit_is_the_remainder() {
        let (result, feed) = run(FakeFeed::new(1000), request(250, 100));
        assert_eq!(result.unwrap().len(), 250);
        assert_eq!(feed.requested_limits(), [100, 100, 50]);
    }

    #[test]
    fn offset_advances_by_page_size() {
        let mut req = request(200, 100);
        req.offset = 30;
        let (result, feed) = run(FakeFeed::new(1000), req);
        assert_eq!(result.unwrap()[0].title, "Result 30");
        let offsets: Vec<String> = feed
            .requests()
            .iter()
            .filter_map(|u| {
                reqwest::Url::parse(u)
                    .ok()?
                    .query_pairs()
                    .find(|(k, _)| k == "offset")
                    .map(|(_, v)| v.into_owned())
            })
            .collect();
        assert_eq!(offsets, ["30", "130"]);
    }

    #[test]
    fn zero_limit_makes_no_requests() {
        let (result, feed) = run(FakeFeed::new(10), request(0, 100));
        assert!(result.unwrap().is_empty());
        assert!(feed.requests().is_empty());
    }

    #[test]
    fn cancelled_search_stops_before_fetching() {
        let token = CancellationToken::new();
        token.cancel();
        let feed = Arc::new(FakeFeed::new(10));
        let result = SearchJob::new(request(10, 100), feed.clone())
            .with_cancellation(token)
            .run();
        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(feed.requests().is_empty());
    }

    #[test]
    fn spawned_search_reports_through_its_handle() {
        let feed = Arc::new(FakeFeed::new(5));
        let handle = SearchJob::new(request(100, 100), feed).spawn().unwrap();
        let results = handle.join().unwrap();
        assert_eq!(results.len(), 5);
    }

    #[test]
    fn page_url_carries_every_parameter() {
        let mut req = request(10, 100);
        req.params.kind = SearchKind::TvSearch;
        req.params.season = Some("2".into());
        req.params.episode = Some("3".into());
        let url = req.page_url(200, 50).unwrap();
        assert_eq!(
            url,
            "http://fake.example/api?t=tvsearch&apikey=k&q=some+show&season=2&ep=3&offset=200&limit=50"
        );
        assert!(!req.display_url().contains("apikey"));
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let mut req = request(10, 100);
        req.base_url = "not a url".into();
        assert!(matches!(req.page_url(0, 10), Err(Error::Config(_))));
    }

    #[test]
    fn sorting_and_reversal() {
        let mut items: Vec<ResultItem> = ["b", "c", "a"]
            .iter()
            .map(|t| ResultItem {
                title: (*t).to_string(),
                pub_date: String::new(),
                link: String::new(),
                category: String::new(),
                size_bytes: 0,
                fetched: false,
            })
            .collect();
        sort_results(&mut items, true, false);
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["a", "b", "c"]);
        sort_results(&mut items, false, true);
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["c", "b", "a"]);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn result_count_is_min_of_limit_and_available(
                available in 0usize..400,
                limit in 0u64..400,
                page_size in 1u64..120,
            ) {
                let (result, _) = run(FakeFeed::new(available), request(limit, page_size));
                let expected = usize::try_from(limit).unwrap().min(available);
                prop_assert_eq!(result.unwrap().len(), expected);
            }
        }
    }
}
