//! Wait mechanisms for existence polling.
//!
//! The prober itself owns no timeout or retry policy: existence checks
//! delegate to the locator service, which polls with these options, while
//! click primitives never retry.

use crate::locator::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS};
use crate::result::{TaladroError, TaladroResult};
use std::future::Future;
use std::time::{Duration, Instant};

/// Options for polling waits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Poll an async probe until it reports true or the timeout expires.
///
/// The probe runs at least once, so a zero timeout still observes the
/// current state exactly once.
///
/// # Errors
///
/// Returns `Timeout` if the probe never reports true within the window;
/// probe errors propagate immediately.
pub async fn poll_until<F, Fut>(options: WaitOptions, mut probe: F) -> TaladroResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = TaladroResult<bool>>,
{
    let deadline = Instant::now() + options.timeout();
    loop {
        if probe().await? {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(TaladroError::Timeout {
                ms: options.timeout_ms,
            });
        }
        tokio::time::sleep(options.poll_interval()).await;
    }
}
