//! Transport error type.

use std::time::Duration;

use thiserror::Error;

/// An upstream call that produced no response.
///
/// The message flattens the whole `source()` chain, since the interesting
/// cause (a certificate problem, a refused connection) usually sits several
/// levels below "error sending request".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Flatten `err` and its causes into `outer: inner: innermost`.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            let text = cause.to_string();
            if !message.contains(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = cause.source();
        }
        Self { message }
    }

    pub fn timed_out(after: Duration) -> Self {
        Self::new(format!(
            "upstream did not respond within {} seconds",
            after.as_secs()
        ))
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
