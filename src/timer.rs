// One-shot deferred action, polled from the host's event loop.
// There is no background thread: the loop calls `fire_if_due` every frame,
// so cancelling is just forgetting the deadline.

use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct Deferred {
    due: Option<Instant>,
}

impl Deferred {
    pub fn new() -> Self {
        Self { due: None }
    }

    /// Arm for `now + delay`, replacing anything already pending.
    pub fn schedule(&mut self, now: Instant, delay: Duration) {
        self.due = Some(now + delay);
    }

    /// Disarm. Returns true if something was pending.
    pub fn cancel(&mut self) -> bool {
        self.due.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.due.is_some()
    }

    /// True exactly once, on the first poll at or after the deadline.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.due {
            Some(due) if now >= due => {
                self.due = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_at_the_deadline() {
        let t0 = Instant::now();
        let mut task = Deferred::new();
        task.schedule(t0, Duration::from_millis(2000));

        assert!(!task.fire_if_due(t0 + Duration::from_millis(1999)));
        assert!(task.is_pending());
        assert!(task.fire_if_due(t0 + Duration::from_millis(2000)));
        assert!(!task.fire_if_due(t0 + Duration::from_millis(5000)));
        assert!(!task.is_pending());
    }

    #[test]
    fn cancelled_task_never_fires() {
        let t0 = Instant::now();
        let mut task = Deferred::new();
        task.schedule(t0, Duration::from_millis(10));
        assert!(task.cancel());
        assert!(!task.cancel());
        assert!(!task.fire_if_due(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn rescheduling_moves_the_deadline() {
        let t0 = Instant::now();
        let mut task = Deferred::new();
        task.schedule(t0, Duration::from_millis(100));
        task.schedule(t0 + Duration::from_millis(50), Duration::from_millis(100));
        assert!(!task.fire_if_due(t0 + Duration::from_millis(120)));
        assert!(task.fire_if_due(t0 + Duration::from_millis(150)));
    }
}
