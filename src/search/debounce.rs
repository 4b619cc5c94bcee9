//! Debounced request coalescing for suggestion lookups.
//!
//! Every call supersedes the previous one: the earlier call's token is cancelled,
//! so its caller resolves to `None` immediately, whether it was still waiting
//! out the delay or already running its lookup (the lookup future is dropped).
//! Only a call that stays current for the whole quiet period runs, and its
//! result is published only while its token is still valid.

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Quiet period before a lookup runs.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    /// Token of the most recent call.
    current: Mutex<CancellationToken>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            current: Mutex::new(CancellationToken::new()),
        }
    }

    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Install a fresh token and cancel the one it replaces.
    fn supersede(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let previous = {
            let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *current, token.clone())
        };
        previous.cancel();
        token
    }

    /// Cancel whatever call is pending without starting a new one.
    pub fn cancel(&self) {
        self.supersede().cancel();
    }

    /// Run `lookup` after the quiet period unless a newer call arrives first.
    ///
    /// Returns `None` when superseded.
    pub async fn call<F, Fut, T>(&self, lookup: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let token = self.supersede();

        tokio::select! {
            biased;
            () = token.cancelled() => return None,
            () = tokio::time::sleep(self.delay) => {}
        }

        tokio::select! {
            biased;
            () = token.cancelled() => {
                tracing::debug!("Dropping superseded lookup");
                None
            }
            result = lookup() => Some(result),
        }
    }
}
