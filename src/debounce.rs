//! Deadline-based debouncing for free-text input.
//!
//! Every [`Debouncer::observe`] moves the deadline to `now + quiet`. Nothing
//! is emitted while edits keep arriving; once the deadline passes, the last
//! observed value is emitted exactly once. The caller drives emission either
//! by polling from its own tick ([`Debouncer::poll`]) or by awaiting
//! [`Debouncer::settled`] inside its event loop.

use std::time::Duration;
use tokio::time::Instant;

/// Default quiet interval for search input.
pub const DEFAULT_QUIET: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    deadline: Instant,
}

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet: Duration,
    current: T,
    pending: Option<Pending<T>>,
}

impl<T: Clone> Debouncer<T> {
    pub fn new(quiet: Duration, initial: T) -> Self {
        Self {
            quiet,
            current: initial,
            pending: None,
        }
    }

    /// Last emitted value.
    pub fn current(&self) -> &T {
        &self.current
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Record a new value and restart the quiet period.
    ///
    /// Any value observed earlier in the same burst is dropped.
    pub fn observe(&mut self, value: T) {
        self.pending = Some(Pending {
            value,
            deadline: Instant::now() + self.quiet,
        });
    }

    /// Emit the pending value if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = self.pending.as_ref().is_some_and(|p| p.deadline <= now);
        if due {
            self.emit()
        } else {
            None
        }
    }

    /// Wait for the pending value to settle, then emit it.
    ///
    /// Never resolves while nothing is pending. Dropping the future (for
    /// example when another `select!` branch wins) loses nothing: the value
    /// stays pending until the next call.
    pub async fn settled(&mut self) -> T {
        loop {
            let Some(deadline) = self.deadline() else {
                std::future::pending::<()>().await;
                continue;
            };
            tokio::time::sleep_until(deadline).await;
            if let Some(value) = self.poll(Instant::now()) {
                return value;
            }
        }
    }

    /// Emit the pending value immediately, skipping the rest of the quiet period.
    pub fn flush(&mut self) -> Option<T> {
        self.emit()
    }

    /// Drop any pending value without emitting it.
    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            tracing::trace!("Pending debounce cancelled");
        }
    }

    /// Cancel pending input and set the current value directly.
    pub fn reset(&mut self, value: T) {
        self.pending = None;
        self.current = value;
    }

    fn emit(&mut self) -> Option<T> {
        let pending = self.pending.take()?;
        self.current = pending.value.clone();
        Some(pending.value)
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if self.pending.take().is_some() {
            tracing::trace!("Debouncer dropped with pending value");
        }
    }
}
