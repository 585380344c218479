//! Result and error types for Paso.

use thiserror::Error;

/// Result type for Paso operations
pub type PasoResult<T> = Result<T, PasoError>;

/// Errors that can occur while sequencing UI actions
#[derive(Debug, Error)]
pub enum PasoError {
    /// No element matched the selector within the bounded wait
    #[error("Element not found: {selector} (waited {waited_ms}ms)")]
    ElementNotFound {
        /// Selector that failed to resolve
        selector: String,
        /// How long the lookup polled before giving up
        waited_ms: u64,
    },

    /// Element was located but cannot receive the action
    #[error("Element not interactable: {selector} ({reason})")]
    ElementNotInteractable {
        /// Selector the handle was resolved from
        selector: String,
        /// Why the action was refused (stale, hidden, disabled, detached)
        reason: String,
    },

    /// An assert step evaluated to false
    #[error("Assertion failed: {check} (expected {expected}, got {actual})")]
    AssertionFailed {
        /// Human-readable description of the check
        check: String,
        /// Expected value rendering
        expected: String,
        /// Actual value rendering
        actual: String,
    },

    /// Session creation or navigation failed; fatal for the current run
    #[error("Session unavailable: {message}")]
    SessionUnavailable {
        /// Error message
        message: String,
    },

    /// Scenario is structurally invalid (empty steps, unknown target name,
    /// unsupported schema version)
    #[error("Invalid scenario: {message}")]
    InvalidScenario {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl PasoError {
    /// Create a stale-handle interactability error
    #[must_use]
    pub fn stale(selector: impl Into<String>) -> Self {
        Self::ElementNotInteractable {
            selector: selector.into(),
            reason: "stale element reference".to_string(),
        }
    }

    /// Check whether this error aborts the whole run rather than one step
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::SessionUnavailable { .. })
    }
}
