//! Interactive terminal front end.

mod browse;
mod input;
mod surface;

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};

use crate::cli::RunOptions;
use crate::columns::DisplayList;
use crate::dispatch::{DispatchReport, Dispatcher};
use crate::error::Result;
use crate::fetch::{HttpFetcher, RemoteFetch};
use crate::render::{RenderCommand, RenderQueue, Renderer};
use crate::search::{SearchJob, sort_results};
use crate::session::Session;

pub use browse::{choose_categories, selected_ids};
pub use input::{Action, action_for, confirmation};
pub use surface::{TerminalSurface, style_for};

/// Interval between "please wait" dots while a search runs.
const WAIT_TICK: Duration = Duration::from_millis(250);

/// How long quitting waits for a running dispatcher.
pub const QUIT_GRACE: Duration = Duration::from_secs(2);

const RESULTS_FOOTER: &str =
    "Press 'Q' to quit,  'Space' to queue,  'x' to re-queue,  'Enter' to retrieve";

/// How an interactive run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Quit,
    NoResults,
}

static PANIC_HOOK: Once = Once::new();

/// Set while the terminal is in raw mode on the alternate screen.
static TERMINAL_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Leaves raw mode and the alternate screen if a [`TerminalGuard`] set them
/// up. Returns whether anything was restored.
fn restore_terminal() -> bool {
    if !TERMINAL_ACTIVE.swap(false, Ordering::SeqCst) {
        return false;
    }
    let _ = disable_raw_mode();
    let _ = crossterm::execute!(
        io::stdout(),
        crossterm::cursor::Show,
        DisableMouseCapture,
        LeaveAlternateScreen
    );
    true
}

/// Chains terminal restoration in front of the current panic hook. The hook
/// runs before the process aborts, so release builds (`panic = "abort"`)
/// leave a usable terminal too.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore_terminal();
            hook(info);
        }));
    });
}

/// Puts the terminal into raw mode for its lifetime.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> io::Result<Self> {
        install_panic_hook();
        enable_raw_mode()?;
        TERMINAL_ACTIVE.store(true, Ordering::SeqCst);
        let guard = Self;
        crossterm::execute!(
            io::stdout(),
            EnterAlternateScreen,
            EnableMouseCapture,
            crossterm::cursor::Hide
        )?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

/// Render command for actions that only touch the list and the screen.
#[must_use]
pub fn list_command(action: Action) -> Option<RenderCommand> {
    let command = match action {
        Action::Toggle => RenderCommand::ToggleCurrent,
        Action::Requeue => RenderCommand::RequeueCurrent,
        Action::Redraw => RenderCommand::RedrawAll,
        Action::Move(delta) => RenderCommand::Navigate(delta),
        Action::Page(pages) => RenderCommand::Page(pages),
        Action::Home => RenderCommand::JumpTo(0),
        Action::End => RenderCommand::JumpTo(usize::MAX),
        Action::Click(row) => RenderCommand::ClickLine(row),
        Action::Resize { rows, cols } => RenderCommand::Resize { rows, cols },
        Action::Quit | Action::Retrieve => return None,
    };
    Some(command)
}

/// Waits up to `grace` for `handle`, joining it if it finished.
/// Returns `false` if the thread was left running.
pub fn join_within<T>(handle: JoinHandle<T>, grace: Duration) -> bool {
    let deadline = Instant::now() + grace;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    if handle.join().is_err() {
        log::error!("Background thread panicked");
    }
    true
}

/// Runs one interactive session: optional category browsing, the search,
/// then the result list until the user quits.
///
/// # Errors
///
/// Returns an error if the search fails before the list is shown or the
/// terminal cannot be driven. The terminal is restored before returning.
pub fn run(options: RunOptions) -> Result<Outcome> {
    let fetcher: Arc<dyn RemoteFetch> = Arc::new(HttpFetcher::new(options.timeout)?);
    let guard = TerminalGuard::new()?;
    let surface = TerminalSurface::new()?;

    let (queue, receiver) = RenderQueue::channel();
    let session = Session::new(fetcher, options.destination.clone(), queue);
    let consumer = Renderer::new(surface, session.list().clone()).spawn(receiver)?;

    let mut front = FrontEnd {
        session,
        options,
        dispatcher: None,
    };
    let outcome = front.run();
    front.stop(consumer);
    drop(guard);
    outcome
}

struct FrontEnd {
    session: Session,
    options: RunOptions,
    dispatcher: Option<JoinHandle<DispatchReport>>,
}

impl FrontEnd {
    fn queue(&self) -> &RenderQueue {
        self.session.queue()
    }

    fn run(&mut self) -> Result<Outcome> {
        let mut request = self.options.request.clone();
        if self.options.browse {
            match choose_categories(&self.session, &request)? {
                Some(ids) if !ids.is_empty() => request.params.category = Some(ids),
                Some(_) => {}
                None => return Ok(Outcome::Quit),
            }
        }

        let query = self.options.query.clone();
        self.queue().enqueue(RenderCommand::Footer(request.display_url()));
        self.queue()
            .enqueue(RenderCommand::Wait("~~~ Please Wait ".into()));
        let base_url = request.base_url.clone();
        let handle = SearchJob::new(request, self.session.fetcher())
            .with_cancellation(self.session.child_token())
            .spawn()?;

        while !handle.is_finished() {
            if event::poll(WAIT_TICK)? {
                match action_for(&event::read()?) {
                    Some(Action::Quit) => return Ok(Outcome::Quit),
                    Some(Action::Resize { rows, cols }) => {
                        self.queue().enqueue(RenderCommand::Resize { rows, cols });
                    }
                    _ => {}
                }
            } else {
                self.queue().enqueue(RenderCommand::WaitDot);
            }
        }

        let mut results = handle.join()?;
        if results.is_empty() {
            return Ok(Outcome::NoResults);
        }
        sort_results(&mut results, self.options.alpha, self.options.reverse);
        let display = Arc::new(DisplayList::for_results(&results));
        let count = results.len();
        self.session.set_items(results);

        let queue = self.queue();
        queue.enqueue(RenderCommand::ShowList(display));
        queue.enqueue(RenderCommand::Header(format!("{count:03} Results returned")));
        queue.status(format!("{}:  {query}", self.options.server_name));
        queue.enqueue(RenderCommand::Footer(RESULTS_FOOTER.into()));
        queue.enqueue(RenderCommand::RedrawAll);
        log::info!("Showing {count} results from {base_url}");

        self.input_loop()
    }

    fn input_loop(&mut self) -> Result<Outcome> {
        loop {
            let Some(action) = action_for(&event::read()?) else {
                continue;
            };
            match action {
                Action::Quit => {
                    if self.confirm_quit()? {
                        return Ok(Outcome::Quit);
                    }
                }
                Action::Retrieve => self.retrieve()?,
                other => {
                    if let Some(command) = list_command(other) {
                        self.queue().enqueue(command);
                    }
                }
            }
        }
    }

    /// Asks for confirmation when rows are still marked.
    fn confirm_quit(&self) -> Result<bool> {
        self.queue().flush();
        let count = self.session.model().selected_count();
        if count == 0 {
            return Ok(true);
        }
        let alert = vec![
            format!("{count} items are queued."),
            "Are you sure? [Y/N]".to_string(),
        ];
        self.queue().enqueue(RenderCommand::Alert(alert.clone()));
        let answer = loop {
            let event = event::read()?;
            if let Some(Action::Resize { rows, cols }) = action_for(&event) {
                self.queue().enqueue(RenderCommand::Resize { rows, cols });
                self.queue().enqueue(RenderCommand::Alert(alert.clone()));
                continue;
            }
            if let Some(answer) = confirmation(&event) {
                break answer;
            }
        };
        if !answer {
            self.queue().enqueue(RenderCommand::RedrawAll);
        }
        Ok(answer)
    }

    /// Starts the dispatcher unless one is already running.
    fn retrieve(&mut self) -> Result<()> {
        if let Some(handle) = self.dispatcher.take() {
            if !handle.is_finished() {
                self.dispatcher = Some(handle);
                self.queue().status("Retrieval already in progress");
                return Ok(());
            }
            if let Ok(report) = handle.join() {
                log::debug!("Previous retrieval: {report:?}");
            }
        }
        self.queue().flush();
        if self.session.model().selected_count() == 0 {
            self.queue().status("Nothing queued");
            return Ok(());
        }
        self.dispatcher = Some(Dispatcher::new(self.session.clone()).spawn()?);
        Ok(())
    }

    /// Cancels background work, gives a running dispatcher [`QUIT_GRACE`] to
    /// stop, then shuts the render consumer down.
    fn stop(&mut self, consumer: JoinHandle<TerminalSurface>) {
        self.session.cancel();
        if let Some(handle) = self.dispatcher.take()
            && !join_within(handle, QUIT_GRACE)
        {
            log::warn!("Retrieval still running after {QUIT_GRACE:?}; abandoning it");
        }
        self.queue().shutdown();
        if consumer.join().is_err() {
            log::error!("Render consumer panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_actions_become_commands() {
        assert!(matches!(list_command(Action::Home), Some(RenderCommand::JumpTo(0))));
        assert!(matches!(
            list_command(Action::End),
            Some(RenderCommand::JumpTo(usize::MAX))
        ));
        assert!(matches!(
            list_command(Action::Move(-1)),
            Some(RenderCommand::Navigate(-1))
        ));
        assert!(matches!(
            list_command(Action::Click(4)),
            Some(RenderCommand::ClickLine(4))
        ));
        assert!(matches!(
            list_command(Action::Toggle),
            Some(RenderCommand::ToggleCurrent)
        ));
        assert!(list_command(Action::Quit).is_none());
        assert!(list_command(Action::Retrieve).is_none());
    }

    #[test]
    fn panic_hook_leaves_an_untouched_terminal_alone() {
        install_panic_hook();
        install_panic_hook();
        assert!(PANIC_HOOK.is_completed());
        assert!(!restore_terminal());
        let result = std::thread::spawn(|| panic!("boom")).join();
        assert!(result.is_err());
        assert!(!TERMINAL_ACTIVE.load(Ordering::SeqCst));
    }

    #[test]
    fn join_within_reaps_finished_threads() {
        let handle = std::thread::spawn(|| 1);
        assert!(join_within(handle, Duration::from_secs(1)));
    }

    #[test]
    fn join_within_gives_up_after_grace() {
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        let handle = std::thread::spawn(move || {
            let _ = rx.recv();
        });
        assert!(!join_within(handle, Duration::from_millis(50)));
        drop(tx);
    }
}
