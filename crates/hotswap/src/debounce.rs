use std::time::{Duration, Instant};

/// Identifies one scheduled validation attempt. Later edits get larger values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

#[derive(Debug, Clone, Copy)]
struct PendingAttempt {
    generation: Generation,
    deadline: Instant,
}

/// Coalesces bursts of edits into a single attempt per quiet period.
///
/// At most one attempt is pending; scheduling a new one replaces it, so a
/// superseded attempt can never fire.
#[derive(Debug, Clone)]
pub struct EditDebouncer {
    quiet_period: Duration,
    latest: Generation,
    pending: Option<PendingAttempt>,
}

impl EditDebouncer {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            latest: Generation(0),
            pending: None,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Restarts the quiet period from `now`.
    pub fn schedule(&mut self, now: Instant) -> Generation {
        self.latest = Generation(self.latest.0 + 1);
        if let Some(previous) = self.pending.replace(PendingAttempt {
            generation: self.latest,
            deadline: now + self.quiet_period,
        }) {
            tracing::debug!(
                superseded = previous.generation.0,
                generation = self.latest.0,
                "edit superseded pending validation"
            );
        } else {
            tracing::debug!(generation = self.latest.0, "edit scheduled validation");
        }
        self.latest
    }

    /// Returns the pending attempt once its quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<Generation> {
        let pending = self.pending?;
        if now < pending.deadline {
            return None;
        }
        self.pending = None;
        Some(pending.generation)
    }

    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            tracing::debug!(generation = pending.generation.0, "pending validation cancelled");
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.map(|pending| pending.deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The most recently scheduled generation, fired or not.
    pub fn latest(&self) -> Generation {
        self.latest
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        generation == self.latest
    }
}
