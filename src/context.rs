//! Per-run diagnostics channel.

use serde::{Deserialize, Serialize};

/// Side-channel for non-fatal diagnostics reported while executing steps.
///
/// Diagnostics carry no control-flow meaning: a step may report an error
/// and still continue, or halt without reporting anything. The engine never
/// inspects the context; it only hands it down to every step of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    errors: Vec<String>,
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic message.
    pub fn report_error(&mut self, message: impl Into<String>) {
        let message = message.into();

        #[cfg(feature = "tracing")]
        tracing::debug!(message = %message, "context.error");

        self.errors.push(message);
    }

    /// Returns `true` if at least one diagnostic was reported.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Reported diagnostics in insertion order.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Number of reported diagnostics.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns `true` if nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Consume the context and return its diagnostics.
    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }
}
