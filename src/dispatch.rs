//! Sequential retrieval of every marked row.

use std::thread::JoinHandle;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::download::DownloadJob;
use crate::render::RenderCommand;
use crate::session::Session;

/// Time between spinner frames.
pub const SPIN_INTERVAL: Duration = Duration::from_millis(250);

pub const SPINNER_GLYPHS: [char; 4] = ['|', '/', '-', '\\'];

/// Outcome of one dispatcher run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub fetched: Vec<usize>,
    pub failed: Vec<usize>,
    pub cancelled: bool,
}

/// Walks the list in index order and retrieves each marked row, one at a
/// time, animating the row's status cell while its job runs.
pub struct Dispatcher {
    session: Session,
    spin_interval: Duration,
    cancel: CancellationToken,
}

impl Dispatcher {
    #[must_use]
    pub fn new(session: Session) -> Self {
        let cancel = session.child_token();
        Self {
            session,
            spin_interval: SPIN_INTERVAL,
            cancel,
        }
    }

    #[must_use]
    pub const fn with_spin_interval(mut self, interval: Duration) -> Self {
        self.spin_interval = interval;
        self
    }

    pub fn run(&self) -> DispatchReport {
        let queue = self.session.queue();
        let mut report = DispatchReport::default();
        let len = self.session.model().len();

        for index in 0..len {
            if self.cancel.is_cancelled() {
                log::info!("Retrieval cancelled before row {index}");
                report.cancelled = true;
                break;
            }
            // Selection is read per row; the user may keep marking while we run.
            let marked = self.session.model().row(index).is_some_and(|row| row.selected);
            if !marked {
                continue;
            }
            let Some(item) = self.session.item(index) else {
                continue;
            };

            let success = match DownloadJob::new(&item, &self.session).spawn() {
                Ok(running) => {
                    let mut frame = 0usize;
                    let success = loop {
                        if let Some(success) = running.poll(self.spin_interval) {
                            break success;
                        }
                        if self.session.model().is_visible(index) {
                            queue.enqueue(RenderCommand::Spinner {
                                index,
                                glyph: SPINNER_GLYPHS[frame % SPINNER_GLYPHS.len()],
                            });
                        }
                        frame += 1;
                    };
                    running.finish();
                    success
                }
                Err(e) => {
                    log::error!("Could not start retrieval of row {index}: {e}");
                    queue.status(format!("Could not start retrieval: {e}"));
                    false
                }
            };

            {
                let mut model = self.session.model();
                if success {
                    model.mark_fetched(index);
                } else {
                    model.clear_selected(index);
                }
            }
            if success {
                self.session.list().mark_item_fetched(index);
                report.fetched.push(index);
            } else {
                report.failed.push(index);
            }
            queue.enqueue(RenderCommand::DrawRow(index));
            queue.enqueue(RenderCommand::DrawList);
        }

        log::info!(
            "Retrieval finished: {} fetched, {} failed",
            report.fetched.len(),
            report.failed.len()
        );
        report
    }

    /// Runs the dispatcher on its own thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn(self) -> std::io::Result<JoinHandle<DispatchReport>> {
        std::thread::Builder::new()
            .name("dispatch".into())
            .spawn(move || self.run())
    }
}
