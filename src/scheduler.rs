use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// One-shot timers, in the spirit of `setTimeout`/`clearTimeout`.
pub trait Scheduler {
    fn set_timeout(&mut self, delay: Duration) -> TimerId;
    fn clear_timeout(&mut self, id: TimerId);
}

/// Timer bookkeeping driven by an externally supplied clock.
///
/// The host advances the clock and dispatches whatever came due; nothing runs
/// on its own.
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    next_id: u64,
    now: Duration,
    pending: Vec<(TimerId, Duration)>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|(pending, _)| *pending == id)
    }

    /// Time left until the earliest pending timer.
    pub fn time_to_next(&self) -> Option<Duration> {
        self.pending
            .iter()
            .map(|(_, deadline)| deadline.saturating_sub(self.now))
            .min()
    }

    /// Move the clock to `now` and return the timers that came due, earliest
    /// first. The clock never moves backwards.
    pub fn advance_to(&mut self, now: Duration) -> Vec<TimerId> {
        if now > self.now {
            self.now = now;
        }
        let mut due: Vec<(TimerId, Duration)> = Vec::new();
        self.pending.retain(|(id, deadline)| {
            if *deadline <= now {
                due.push((*id, *deadline));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|(id, deadline)| (*deadline, *id));
        due.into_iter().map(|(id, _)| id).collect()
    }

    pub fn advance_by(&mut self, delta: Duration) -> Vec<TimerId> {
        let now = self.now + delta;
        self.advance_to(now)
    }
}

impl Scheduler for TimerQueue {
    fn set_timeout(&mut self, delay: Duration) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending.push((id, self.now + delay));
        id
    }

    fn clear_timeout(&mut self, id: TimerId) {
        self.pending.retain(|(pending, _)| *pending != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timers_fire_in_deadline_order() {
        let mut queue = TimerQueue::new();
        let late = queue.set_timeout(Duration::from_millis(300));
        let early = queue.set_timeout(Duration::from_millis(100));

        assert!(queue.advance_by(Duration::from_millis(50)).is_empty());
        assert_eq!(queue.time_to_next(), Some(Duration::from_millis(50)));
        assert_eq!(queue.advance_by(Duration::from_millis(300)), vec![early, late]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_cleared_timer_never_fires() {
        let mut queue = TimerQueue::new();
        let id = queue.set_timeout(Duration::from_millis(10));
        queue.clear_timeout(id);
        assert!(!queue.is_pending(id));
        assert!(queue.advance_by(Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn test_zero_delay_fires_on_next_advance() {
        let mut queue = TimerQueue::new();
        let id = queue.set_timeout(Duration::ZERO);
        assert_eq!(queue.advance_by(Duration::ZERO), vec![id]);
    }

    #[test]
    fn test_clock_is_monotonic() {
        let mut queue = TimerQueue::new();
        queue.advance_to(Duration::from_millis(500));
        queue.advance_to(Duration::from_millis(100));
        assert_eq!(queue.now(), Duration::from_millis(500));
    }
}
