//! Error types for the getnzbs library.

use thiserror::Error;

/// Errors raised while turning a feed document into records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The body is not well-formed XML (or not XML at all).
    #[error("server returned non-XML: {0}")]
    Xml(String),

    /// A result record lacks one of the fields every item must carry.
    #[error("item {item}: missing <{field}>")]
    MissingField {
        /// Zero-based position of the record in its page.
        item: usize,
        /// Name of the absent element or attribute.
        field: &'static str,
    },

    /// The enclosure length attribute is not a byte count.
    #[error("item {item}: invalid enclosure length {value:?}")]
    InvalidSize {
        /// Zero-based position of the record in its page.
        item: usize,
        /// The offending attribute value.
        value: String,
    },

    /// The indexer answered with a Newznab `<error>` document.
    #[error("server error {code}: {description}")]
    Api {
        /// Newznab error code.
        code: String,
        /// Human readable description sent by the server.
        description: String,
    },
}

/// Errors that can occur while searching and retrieving.
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP failure.
    #[error("Fetch Error: {0}")]
    Transport(String),

    /// The response could not be understood.
    #[error("Parse Error: {0}")]
    Parse(#[from] ParseError),

    /// I/O error while writing files or driving the terminal.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The job observed its cancellation token.
    #[error("cancelled")]
    Cancelled,

    /// A background thread ended without reporting an outcome.
    #[error("background job failed: {0}")]
    Job(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl Error {
    /// Process exit status for an error surfaced before the list is shown.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            _ => 1,
        }
    }
}

/// A specialized `Result` type for getnzbs operations.
pub type Result<T> = std::result::Result<T, Error>;
