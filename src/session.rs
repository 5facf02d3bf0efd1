//! Per-run context shared by the input thread, the render consumer and
//! background jobs.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tokio_util::sync::CancellationToken;

use crate::feed::ResultItem;
use crate::fetch::RemoteFetch;
use crate::list::ListModel;
use crate::render::RenderQueue;

/// The list model and the records behind its rows.
///
/// Lock order is model first, then items.
#[derive(Debug, Clone, Default)]
pub struct ListState {
    model: Arc<Mutex<ListModel>>,
    items: Arc<RwLock<Vec<ResultItem>>>,
}

impl ListState {
    /// Locks the list model. A poisoned lock is recovered; row flags stay
    /// consistent because every mutation is a single field write.
    pub fn model(&self) -> MutexGuard<'_, ListModel> {
        self.model.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_items(&self, items: Vec<ResultItem>) {
        *self.items.write().unwrap_or_else(PoisonError::into_inner) = items;
    }

    #[must_use]
    pub fn item(&self, index: usize) -> Option<ResultItem> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index)
            .cloned()
    }

    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn mark_item_fetched(&self, index: usize) {
        if let Some(item) = self
            .items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(index)
        {
            item.fetched = true;
        }
    }

    /// Number of marked rows and their combined size.
    #[must_use]
    pub fn selection_summary(&self) -> (usize, u64) {
        let model = self.model();
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        model.selected_indices().fold((0, 0), |(count, bytes), i| {
            let size = items.get(i).map_or(0, |item| item.size_bytes);
            (count + 1, bytes + size)
        })
    }
}

/// Everything a job needs, passed explicitly.
#[derive(Clone)]
pub struct Session {
    fetcher: Arc<dyn RemoteFetch>,
    list: ListState,
    destination: PathBuf,
    queue: RenderQueue,
    cancel: CancellationToken,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("destination", &self.destination)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Session {
    #[must_use]
    pub fn new(fetcher: Arc<dyn RemoteFetch>, destination: PathBuf, queue: RenderQueue) -> Self {
        Self {
            fetcher,
            list: ListState::default(),
            destination,
            queue,
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn fetcher(&self) -> Arc<dyn RemoteFetch> {
        Arc::clone(&self.fetcher)
    }

    #[must_use]
    pub const fn list(&self) -> &ListState {
        &self.list
    }

    pub fn model(&self) -> MutexGuard<'_, ListModel> {
        self.list.model()
    }

    pub fn set_items(&self, items: Vec<ResultItem>) {
        self.list.set_items(items);
    }

    #[must_use]
    pub fn item(&self, index: usize) -> Option<ResultItem> {
        self.list.item(index)
    }

    #[must_use]
    pub fn selection_summary(&self) -> (usize, u64) {
        self.list.selection_summary()
    }

    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    #[must_use]
    pub const fn queue(&self) -> &RenderQueue {
        &self.queue
    }

    /// Token for one job; cancelled together with the session.
    #[must_use]
    pub fn child_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
