//! Typed selectors for element location.
//!
//! Elements in the UI under test carry a stable `data-test-subj` attribute,
//! independent of styling or visible text. Selectors here are strict and
//! typed: the original substring query (`[data-test-subj*="..."]`) is
//! replaced by an explicit prefix variant with a predicate that mock
//! backends apply to element descriptors directly, while the browser
//! backend emits a `^=` attribute selector.

use serde::{Deserialize, Serialize};

/// Default timeout for existence polling (5 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default polling interval for existence checks (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Selector for locating elements in the UI under test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selector {
    /// Exact `data-test-subj` match
    TestSubj(String),
    /// `data-test-subj` prefix match (replaces substring query semantics)
    TestSubjPrefix(String),
    /// Raw CSS selector (escape hatch, browser backend only)
    Css(String),
}

impl Selector {
    /// Create an exact test-subject selector
    #[must_use]
    pub fn test_subj(subj: impl Into<String>) -> Self {
        Self::TestSubj(subj.into())
    }

    /// Create a test-subject prefix selector
    #[must_use]
    pub fn test_subj_prefix(prefix: impl Into<String>) -> Self {
        Self::TestSubjPrefix(prefix.into())
    }

    /// Create a raw CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Convert to a CSS selector string
    #[must_use]
    pub fn to_css(&self) -> String {
        match self {
            Self::TestSubj(subj) => format!("[data-test-subj=\"{subj}\"]"),
            Self::TestSubjPrefix(prefix) => format!("[data-test-subj^=\"{prefix}\"]"),
            Self::Css(css) => css.clone(),
        }
    }

    /// Predicate form of the selector, applied to an element descriptor's
    /// test subject. Raw CSS selectors carry no subject semantics and never
    /// match by predicate.
    #[must_use]
    pub fn matches_subject(&self, subject: Option<&str>) -> bool {
        match self {
            Self::TestSubj(subj) => subject == Some(subj.as_str()),
            Self::TestSubjPrefix(prefix) => {
                subject.is_some_and(|s| s.starts_with(prefix.as_str()))
            }
            Self::Css(_) => false,
        }
    }

    /// Convert to a JavaScript expression returning the first match
    #[must_use]
    pub fn to_query(&self) -> String {
        let css = self.to_css();
        format!("document.querySelector({css:?})")
    }

    /// Convert to a JavaScript expression counting matches
    #[must_use]
    pub fn to_count_query(&self) -> String {
        let css = self.to_css();
        format!("document.querySelectorAll({css:?}).length")
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_css())
    }
}
