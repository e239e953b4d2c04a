//! Ctrl-C routing.
//!
//! While [`Interrupts::listen`] runs, Ctrl-C no longer kills the process.
//! A press while a terminal prompt is open cancels that prompt. A press at
//! any other time asks the runner to stop before the next device, so the
//! current session is still disconnected cleanly. A second press while
//! stopping exits at once.

use std::convert::Infallible;
use std::io::IsTerminal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use dialoguer::console::Term;
use log::{debug, warn};
use tokio::sync::oneshot;

/// Where a Ctrl-C press was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// An open prompt was cancelled.
    Prompt,

    /// The run was asked to stop.
    Stop,

    /// The run was already stopping.
    AlreadyStopping,
}

/// Shared Ctrl-C state. Clones refer to the same state.
#[derive(Clone, Default)]
pub struct Interrupts {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    /// Cancels the open prompt, if any.
    prompt: Mutex<Option<oneshot::Sender<()>>>,
    stop: AtomicBool,
}

impl Interrupts {
    /// Create routing state with nothing listening for Ctrl-C yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive Ctrl-C presses and route them. Never returns; run it
    /// alongside the work it guards.
    pub async fn listen(&self) -> Infallible {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("cannot listen for Ctrl-C: {e}");
                return std::future::pending().await;
            }
            if self.interrupt() == Route::AlreadyStopping {
                eprintln!();
                std::process::exit(130);
            }
        }
    }

    /// Route one Ctrl-C press.
    pub fn interrupt(&self) -> Route {
        let cancel = self.inner.prompt.lock().ok().and_then(|mut slot| slot.take());
        if let Some(cancel) = cancel {
            if cancel.send(()).is_ok() {
                debug!("Ctrl-C cancelled the open prompt");
                return Route::Prompt;
            }
        }

        if self.inner.stop.swap(true, Ordering::SeqCst) {
            Route::AlreadyStopping
        } else {
            eprintln!("\nInterrupted; stopping after the current device");
            Route::Stop
        }
    }

    /// Whether Ctrl-C was pressed outside a prompt.
    pub fn stop_requested(&self) -> bool {
        self.inner.stop.load(Ordering::SeqCst)
    }

    /// Run a blocking terminal prompt off the runtime thread.
    ///
    /// Returns `None` when Ctrl-C cancels the prompt. The read itself
    /// cannot be aborted, so it is left behind, and the terminal modes in
    /// effect before the prompt are put back.
    pub async fn prompt<T, F>(&self, read: F) -> Option<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let modes = TerminalModes::capture();
        let (cancel, cancelled) = oneshot::channel();
        if let Ok(mut slot) = self.inner.prompt.lock() {
            *slot = Some(cancel);
        }
        let _open = OpenPrompt(&self.inner);

        let reading = tokio::task::spawn_blocking(read);
        let answer = tokio::select! {
            biased;
            Ok(()) = cancelled => None,
            joined = reading => match joined {
                Ok(answer) => Some(answer),
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => {
                    warn!("prompt task failed: {e}");
                    None
                }
            },
        };

        modes.restore();
        answer
    }
}

/// Clears the prompt slot when a prompt finishes.
struct OpenPrompt<'a>(&'a Inner);

impl Drop for OpenPrompt<'_> {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.0.prompt.lock() {
            *slot = None;
        }
    }
}

/// Terminal modes saved before a prompt that may be abandoned mid-read.
///
/// Password entry turns echo off and the yes/no prompt hides the cursor;
/// neither is undone when the read is abandoned.
struct TerminalModes {
    #[cfg(unix)]
    saved: Option<nix::sys::termios::Termios>,
    interactive: bool,
}

impl TerminalModes {
    fn capture() -> Self {
        let stdin = std::io::stdin();
        let interactive = stdin.is_terminal();
        Self {
            #[cfg(unix)]
            saved: if interactive {
                nix::sys::termios::tcgetattr(&stdin).ok()
            } else {
                None
            },
            interactive,
        }
    }

    fn restore(&self) {
        #[cfg(unix)]
        if let Some(ref saved) = self.saved {
            let stdin = std::io::stdin();
            if let Err(e) = nix::sys::termios::tcsetattr(&stdin, nix::sys::termios::SetArg::TCSANOW, saved) {
                warn!("cannot restore terminal modes: {e}");
            }
        }
        if self.interactive {
            let _ = Term::stderr().show_cursor();
        }
    }
}
