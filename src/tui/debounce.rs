//! Single-flight debouncing for the dashboard search box.
//!
//! Each keystroke submits the whole query. A newer submission replaces the
//! pending one outright, so at most one query is ever in flight and a
//! superseded query is never applied.

use std::time::{Duration, Instant};

#[derive(Debug)]
struct Pending<T> {
    value: T,
    generation: u64,
    fire_at: Instant,
}

#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    generation: u64,
    pending: Option<Pending<T>>,
}

impl<T> Debouncer<T> {
    /// Create a debouncer with the given quiet period.
    pub fn new(delay: Duration) -> Self {
        Debouncer { delay, generation: 0, pending: None }
    }

    /// Queue `value`, superseding anything still pending. Returns its generation.
    pub fn submit(&mut self, value: T, now: Instant) -> u64 {
        self.generation += 1;
        if self.pending.is_some() {
            tracing::trace!(generation = self.generation, "superseding pending search");
        }
        self.pending = Some(Pending { value, generation: self.generation, fire_at: now + self.delay });
        self.generation
    }

    /// Take the pending value once its quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<(u64, T)> {
        let ready = self.pending.as_ref().is_some_and(|p| p.fire_at <= now);
        if ready {
            self.flush()
        } else {
            None
        }
    }

    /// Take the pending value immediately, ignoring the quiet period.
    pub fn flush(&mut self) -> Option<(u64, T)> {
        self.pending.take().map(|p| (p.generation, p.value))
    }

    /// Drop the pending value without applying it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Whether a value is waiting for its quiet period.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Generation of the most recent submission.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(250);

    #[test]
    fn fires_only_after_quiet_period() {
        let start = Instant::now();
        let mut d = Debouncer::new(DELAY);
        d.submit("d", start);
        assert_eq!(d.poll(start + Duration::from_millis(100)), None);
        assert_eq!(d.poll(start + DELAY), Some((1, "d")));
        assert!(!d.is_pending());
        assert_eq!(d.poll(start + DELAY * 2), None);
    }

    #[test]
    fn newer_keystroke_supersedes_pending_query() {
        let start = Instant::now();
        let mut d = Debouncer::new(DELAY);
        d.submit("d", start);
        d.submit("do", start + Duration::from_millis(100));
        let last = d.submit("dog", start + Duration::from_millis(200));
        assert_eq!(last, 3);
        // The first query's deadline passes but it was replaced.
        assert_eq!(d.poll(start + Duration::from_millis(300)), None);
        assert_eq!(d.poll(start + Duration::from_millis(450)), Some((3, "dog")));
        assert_eq!(d.poll(start + Duration::from_millis(900)), None);
    }

    #[test]
    fn cancel_drops_pending_query() {
        let start = Instant::now();
        let mut d = Debouncer::new(DELAY);
        d.submit("meal", start);
        d.cancel();
        assert_eq!(d.poll(start + DELAY), None);
        assert_eq!(d.generation(), 1);
    }

    #[test]
    fn flush_applies_immediately() {
        let start = Instant::now();
        let mut d = Debouncer::new(DELAY);
        d.submit("vet", start);
        assert_eq!(d.flush(), Some((1, "vet")));
        assert_eq!(d.flush(), None);
    }
}
