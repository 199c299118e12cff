//! Result and error types for Taladro.

use thiserror::Error;

/// Result type for Taladro operations
pub type TaladroResult<T> = Result<T, TaladroError>;

/// Errors that can occur while probing the UI under test
#[derive(Debug, Error)]
pub enum TaladroError {
    /// Expected element is absent from the current UI tree
    #[error("Element {selector} not found")]
    NotFound {
        /// Selector that matched nothing
        selector: String,
    },

    /// Element expected to be absent is still present
    #[error("Element {selector} is present but was expected to be missing")]
    StillPresent {
        /// Selector that still matched
        selector: String,
    },

    /// Interactive element exists but is disabled at click time
    #[error("Element {selector} is disabled")]
    ElementDisabled {
        /// Selector of the disabled element
        selector: String,
    },

    /// Label-based scan exhausted all menu candidates without a match
    #[error("No action matching text \"{label}\"")]
    ActionNotFound {
        /// Label that was searched for
        label: String,
    },

    /// Polling wait expired
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Page-level error (evaluate failed, handle went stale, etc.)
    #[error("Page error: {message}")]
    Page {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
