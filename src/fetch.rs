//! Remote fetch abstraction for testability.

use std::time::Duration;

use bytes::Bytes;

use crate::error::Result;

/// `User-Agent` header sent with every request.
pub const USER_AGENT: &str = concat!("getnzbs/", env!("CARGO_PKG_VERSION"));

/// Abstraction over a blocking HTTP GET.
///
/// Jobs run on plain OS threads and call this synchronously.
pub trait RemoteFetch: Send + Sync {
    /// Fetches `url` and returns the response body.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Transport`] on network failure or a non-success
    /// status code.
    fn fetch(&self, url: &str) -> Result<Bytes>;
}

/// Default implementation backed by a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Builds a client with the fixed user agent and the given timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self { client })
    }
}

impl RemoteFetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Bytes> {
        log::debug!("GET {url}");
        let response = self.client.get(url).send()?.error_for_status()?;
        Ok(response.bytes()?)
    }
}
