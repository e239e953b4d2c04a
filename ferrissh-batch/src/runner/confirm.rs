//! Operator confirmation before saving.

use std::future::Future;
use std::io::IsTerminal;

use dialoguer::Confirm;
use log::{debug, warn};

use crate::error::ConfigError;
use crate::interrupt::Interrupts;

/// Asks whether a device's changes should be saved.
pub trait SaveConfirmer {
    /// `true` only on an explicit yes.
    fn confirm_save(&mut self, device: &str) -> impl Future<Output = bool>;
}

/// Reads one yes/no answer; `None` when the operator escapes out.
type AskFn = fn(String) -> dialoguer::Result<Option<bool>>;

/// Terminal yes/no prompt. Escape, Ctrl-C and prompt errors all count
/// as no.
///
/// The prompt runs off the runtime thread so open sessions keep being
/// serviced while the operator thinks.
pub struct PromptConfirmer {
    interrupts: Interrupts,
    ask: AskFn,
}

impl PromptConfirmer {
    /// Create a confirmer whose prompts Ctrl-C on `interrupts` cancels.
    pub fn new(interrupts: Interrupts) -> Self {
        Self {
            interrupts,
            ask: ask_terminal,
        }
    }
}

impl Default for PromptConfirmer {
    fn default() -> Self {
        Self::new(Interrupts::new())
    }
}

impl SaveConfirmer for PromptConfirmer {
    async fn confirm_save(&mut self, device: &str) -> bool {
        let ask = self.ask;
        let question = format!("Save changes on {device}?");

        match self.interrupts.prompt(move || ask(question)).await {
            Some(Ok(Some(yes))) => yes,
            Some(Ok(None)) => false,
            Some(Err(e)) => {
                warn!("confirmation prompt for {device} failed: {e}");
                false
            }
            None => {
                eprintln!();
                debug!("confirmation for {device} cancelled");
                false
            }
        }
    }
}

fn ask_terminal(question: String) -> dialoguer::Result<Option<bool>> {
    Confirm::new()
        .with_prompt(question)
        .default(false)
        .show_default(true)
        .interact_opt()
}

/// Fail unless stdin is a terminal an operator can answer from.
pub fn ensure_interactive() -> Result<(), ConfigError> {
    if std::io::stdin().is_terminal() {
        Ok(())
    } else {
        Err(ConfigError::NotInteractive)
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::time::Duration;

    use super::*;
    use crate::interrupt::Route;

    fn confirmer(interrupts: &Interrupts, ask: AskFn) -> PromptConfirmer {
        PromptConfirmer {
            interrupts: interrupts.clone(),
            ask,
        }
    }

    #[tokio::test]
    async fn test_ctrl_c_during_confirmation_is_no() {
        let interrupts = Interrupts::new();
        let mut confirmer = confirmer(&interrupts, |_| {
            std::thread::sleep(Duration::from_millis(300));
            Ok(Some(true))
        });

        let presser = interrupts.clone();
        let (saved, route) = tokio::join!(confirmer.confirm_save("mx1"), async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            presser.interrupt()
        });

        assert!(!saved);
        assert_eq!(route, Route::Prompt);
        assert!(!interrupts.stop_requested());
    }

    #[tokio::test]
    async fn test_answers_map_to_save_decision() {
        let interrupts = Interrupts::new();

        assert!(confirmer(&interrupts, |_| Ok(Some(true))).confirm_save("sw1").await);
        assert!(!confirmer(&interrupts, |_| Ok(Some(false))).confirm_save("sw1").await);
        assert!(!confirmer(&interrupts, |_| Ok(None)).confirm_save("sw1").await);

        let interrupted: AskFn = |_| Err(dialoguer::Error::IO(io::Error::from(io::ErrorKind::Interrupted)));
        assert!(!confirmer(&interrupts, interrupted).confirm_save("sw1").await);
    }

    #[tokio::test]
    async fn test_question_names_the_device() {
        let interrupts = Interrupts::new();
        let mut confirmer = confirmer(&interrupts, |question| Ok(Some(question == "Save changes on fw1?")));
        assert!(confirmer.confirm_save("fw1").await);
    }
}
