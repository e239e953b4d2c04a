//! Response type for command execution results.

use std::time::Duration;

/// Response from a command or command set.
#[derive(Debug, Clone, Default)]
pub struct Response {
    /// The command that was executed. For a command set, the lines joined
    /// with newlines.
    pub command: String,

    /// The command output (normalized: command echo and trailing prompt removed).
    pub result: String,

    /// The raw output before normalization, echo and prompts included.
    pub raw_result: String,

    /// The prompt that was matched at the end.
    pub prompt: String,

    /// Time taken to execute the command.
    pub elapsed: Duration,

    /// Failure pattern found in the output, if any.
    pub failure_message: Option<String>,
}

impl Response {
    /// Create a new successful response.
    pub fn new(
        command: impl Into<String>,
        result: impl Into<String>,
        raw_result: impl Into<String>,
        prompt: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            result: result.into(),
            raw_result: raw_result.into(),
            prompt: prompt.into(),
            elapsed,
            failure_message: None,
        }
    }

    /// Attach a failure message.
    pub fn with_failure(mut self, failure_message: Option<String>) -> Self {
        self.failure_message = failure_message;
        self
    }

    /// Check if the response indicates success.
    pub fn is_success(&self) -> bool {
        self.failure_message.is_none()
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.result)
    }
}
