/// One-shot deadline on the host clock (milliseconds).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timeout {
    deadline: f64,
}

impl Timeout {
    /// A timeout that fires `delay` ms after `now`.
    pub fn after(now: f64, delay: f64) -> Self {
        Self {
            deadline: now + delay.max(0.0),
        }
    }

    pub fn deadline(&self) -> f64 {
        self.deadline
    }

    pub fn is_due(&self, now: f64) -> bool {
        now >= self.deadline
    }
}

/// Fixed-period repeating timer.
///
/// Accumulates host time between polls and reports how many periods have
/// elapsed, independently of how often frames are scheduled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    /// Period in ms.
    period: f64,
    /// Host time the last counted period ended at.
    last: f64,
}

impl Interval {
    /// Cap on periods reported per poll, so a stalled host doesn't replay
    /// a long backlog.
    const MAX_STEPS: u32 = 10;

    pub fn new(period: f64, now: f64) -> Self {
        Self {
            period: period.max(1.0),
            last: now,
        }
    }

    /// Number of whole periods elapsed since the previous poll.
    pub fn poll(&mut self, now: f64) -> u32 {
        let elapsed = now - self.last;
        if elapsed < self.period {
            return 0;
        }
        let steps = (elapsed / self.period) as u32;
        if steps > Self::MAX_STEPS {
            self.last = now;
            return Self::MAX_STEPS;
        }
        self.last += steps as f64 * self.period;
        steps
    }

    pub fn period(&self) -> f64 {
        self.period
    }
}
