//! Single-item NZB retrieval.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, LazyLock};
use std::thread::JoinHandle;
use std::time::Duration;

use regex::Regex;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::feed::ResultItem;
use crate::fetch::RemoteFetch;
use crate::render::RenderQueue;
use crate::session::Session;

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[/\\\x00-\x1f]").expect("valid regex"));

/// Makes a title usable as a file name.
#[must_use]
pub fn sanitize_title(title: &str) -> String {
    let cleaned = UNSAFE_CHARS.replace_all(title.trim(), "_");
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "untitled".to_string()
    } else {
        cleaned.to_string()
    }
}

/// `<dir>/<sanitized title>.nzb`
#[must_use]
pub fn destination_path(dir: &Path, title: &str) -> PathBuf {
    dir.join(format!("{}.nzb", sanitize_title(title)))
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Retrieves one item and writes it to disk.
pub struct DownloadJob {
    source_url: String,
    title: String,
    destination_path: PathBuf,
    fetcher: Arc<dyn RemoteFetch>,
    queue: RenderQueue,
    cancel: CancellationToken,
}

impl DownloadJob {
    #[must_use]
    pub fn new(item: &ResultItem, session: &Session) -> Self {
        Self {
            source_url: item.download_url(),
            title: item.title.clone(),
            destination_path: destination_path(session.destination(), &item.title),
            fetcher: session.fetcher(),
            queue: session.queue().clone(),
            cancel: session.child_token(),
        }
    }

    #[must_use]
    pub fn destination_path(&self) -> &Path {
        &self.destination_path
    }

    /// Fetches the item and moves it into place.
    ///
    /// Bytes are written to a `.part` sibling first. The `.part` file is
    /// removed on any failure and a cancelled job never renames.
    ///
    /// # Errors
    ///
    /// Returns the transport or I/O error, or [`Error::Cancelled`].
    pub fn retrieve(&self) -> Result<()> {
        self.queue.status(self.title.as_str());
        let bytes = self.fetcher.fetch(&self.source_url)?;
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let part = part_path(&self.destination_path);
        let written = std::fs::write(&part, &bytes).map_err(Error::from).and_then(|()| {
            if self.cancel.is_cancelled() {
                Err(Error::Cancelled)
            } else {
                std::fs::rename(&part, &self.destination_path).map_err(Error::from)
            }
        });
        if written.is_err() {
            let _ = std::fs::remove_file(&part);
        }
        written
    }

    /// Retrieves and reports the outcome on the status line.
    pub fn run(&self) -> bool {
        match self.retrieve() {
            Ok(()) => {
                log::info!("Saved {}", self.destination_path.display());
                self.queue.status("");
                true
            }
            Err(Error::Cancelled) => {
                log::info!("Retrieval of {:?} cancelled", self.title);
                false
            }
            Err(e) => {
                log::warn!("Retrieval of {:?} failed: {e}", self.title);
                self.queue.status(e.to_string());
                false
            }
        }
    }

    /// Runs the job on its own thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn(self) -> std::io::Result<RunningDownload> {
        let (tx, rx) = mpsc::channel();
        let handle = std::thread::Builder::new()
            .name("download".into())
            .spawn(move || {
                let _ = tx.send(self.run());
            })?;
        Ok(RunningDownload { rx, handle })
    }
}

/// A download running in the background.
#[derive(Debug)]
pub struct RunningDownload {
    rx: Receiver<bool>,
    handle: JoinHandle<()>,
}

impl RunningDownload {
    /// Waits up to `timeout` for the outcome. `None` means still running.
    /// A job thread that died without reporting counts as a failure.
    #[must_use]
    pub fn poll(&self, timeout: Duration) -> Option<bool> {
        match self.rx.recv_timeout(timeout) {
            Ok(success) => Some(success),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(false),
        }
    }

    /// Reaps the finished thread.
    pub fn finish(self) {
        if self.handle.join().is_err() {
            log::error!("Download thread panicked");
        }
    }
}
