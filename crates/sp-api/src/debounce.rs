use std::time::{Duration, Instant};

/// Coalesces requests: only the latest one survives, and only once it has
/// been left alone for `delay`. Time is passed in by the caller.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
}

#[derive(Debug, Clone)]
struct Pending<T> {
    request: T,
    due: Instant,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Replaces any pending request. Returns whether one was dropped.
    pub fn submit(&mut self, request: T, now: Instant) -> bool {
        self.pending
            .replace(Pending {
                request,
                due: now + self.delay,
            })
            .is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.due)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        if self.pending.as_ref().is_some_and(|pending| pending.due <= now) {
            self.pending.take().map(|pending| pending.request)
        } else {
            None
        }
    }
}
