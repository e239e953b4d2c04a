//! Run-wide credentials.
//!
//! One username/password pair is obtained before the first device is
//! touched and shared by every session of the run. The password doubles
//! as the enable secret.

use std::future::Future;
use std::io;

use dialoguer::Password;
use log::debug;
use secrecy::{ExposeSecret, SecretString};

use crate::error::CredentialError;
use crate::interrupt::Interrupts;

/// Environment variables consulted for the local username, in order.
const USERNAME_VARS: [&str; 4] = ["LOGNAME", "USER", "LNAME", "USERNAME"];

/// Username and password shared by all device sessions.
#[derive(Debug)]
pub struct Credentials {
    /// Login name.
    pub username: String,

    password: SecretString,
}

impl Credentials {
    /// Create a credential pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// The password.
    pub fn password(&self) -> &SecretString {
        &self.password
    }

    /// An owned copy of the password for a new session.
    pub fn password_copy(&self) -> SecretString {
        SecretString::from(self.password.expose_secret().to_owned())
    }
}

/// Source of the run's credentials.
pub trait CredentialProvider {
    /// Obtain the credential pair. Called once per run.
    fn obtain(&mut self) -> impl Future<Output = Result<Credentials, CredentialError>>;
}

/// Reads a masked password for the given prompt.
type ReadPasswordFn = fn(String) -> dialoguer::Result<String>;

/// Prompts for the password on the terminal.
///
/// The username is taken from `--username` when given, otherwise from the
/// operator's login environment. Ctrl-C at the prompt is
/// [`CredentialError::Cancelled`], with echo turned back on.
pub struct PromptCredentials {
    username: Option<String>,
    interrupts: Interrupts,
    read_password: ReadPasswordFn,
}

impl PromptCredentials {
    /// Create a prompting provider with an optional username override.
    pub fn new(username: Option<String>, interrupts: Interrupts) -> Self {
        Self {
            username,
            interrupts,
            read_password,
        }
    }
}

impl CredentialProvider for PromptCredentials {
    async fn obtain(&mut self) -> Result<Credentials, CredentialError> {
        let username = match self.username.clone() {
            Some(username) => username,
            None => local_username(|key| std::env::var(key).ok()).ok_or(CredentialError::NoUsername)?,
        };
        debug!("prompting for password of '{username}'");

        let read = self.read_password;
        let prompt = format!("Password for {username}");
        let password = match self.interrupts.prompt(move || read(prompt)).await {
            Some(entered) => entered.map_err(prompt_error)?,
            None => {
                eprintln!();
                return Err(CredentialError::Cancelled);
            }
        };

        Ok(Credentials::new(username, password))
    }
}

fn read_password(prompt: String) -> dialoguer::Result<String> {
    Password::new().with_prompt(prompt).interact()
}

/// The invoking operator's login name.
pub fn local_username(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    USERNAME_VARS
        .iter()
        .filter_map(|key| lookup(key))
        .find(|value| !value.trim().is_empty())
}

fn prompt_error(err: dialoguer::Error) -> CredentialError {
    match err {
        dialoguer::Error::IO(e)
            if matches!(
                e.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::UnexpectedEof
            ) =>
        {
            CredentialError::Cancelled
        }
        dialoguer::Error::IO(e) => CredentialError::Prompt(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_logname_wins() {
        let lookup = env(&[("USER", "bob"), ("LOGNAME", "alice")]);
        assert_eq!(local_username(lookup), Some("alice".to_string()));
    }

    #[test]
    fn test_falls_back_to_windows_username() {
        let lookup = env(&[("LOGNAME", ""), ("USERNAME", "netops")]);
        assert_eq!(local_username(lookup), Some("netops".to_string()));
    }

    #[test]
    fn test_no_username() {
        assert_eq!(local_username(env(&[])), None);
    }

    #[test]
    fn test_password_not_in_debug_output() {
        let creds = Credentials::new("netops", "hunter2");
        let debug = format!("{creds:?}");
        assert!(debug.contains("netops"));
        assert!(!debug.contains("hunter2"));
        assert_eq!(creds.password_copy().expose_secret(), "hunter2");
    }

    #[tokio::test]
    async fn test_ctrl_c_at_password_prompt_cancels() {
        let interrupts = Interrupts::new();
        let mut provider = PromptCredentials {
            username: Some("netops".to_string()),
            interrupts: interrupts.clone(),
            read_password: |_| {
                std::thread::sleep(std::time::Duration::from_millis(300));
                Ok("hunter2".to_string())
            },
        };

        let presser = interrupts.clone();
        let (result, _) = tokio::join!(provider.obtain(), async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            presser.interrupt()
        });

        assert!(matches!(result, Err(CredentialError::Cancelled)));
        assert!(!interrupts.stop_requested());
    }

    #[tokio::test]
    async fn test_prompted_password_is_used() {
        let mut provider = PromptCredentials {
            username: Some("netops".to_string()),
            interrupts: Interrupts::new(),
            read_password: |prompt| {
                assert_eq!(prompt, "Password for netops");
                Ok("hunter2".to_string())
            },
        };

        let creds = provider.obtain().await.unwrap();
        assert_eq!(creds.username, "netops");
        assert_eq!(creds.password().expose_secret(), "hunter2");
    }

    #[test]
    fn test_interrupted_prompt_is_cancellation() {
        let err = prompt_error(dialoguer::Error::IO(io::Error::from(io::ErrorKind::Interrupted)));
        assert!(matches!(err, CredentialError::Cancelled));

        let err = prompt_error(dialoguer::Error::IO(io::Error::other("no tty")));
        assert!(matches!(err, CredentialError::Prompt(_)));
    }
}
