use std::time::{Duration, Instant};

/// A fixed-period schedule. The runner asks it whether a tick is due; it
/// never calls back on its own, so ticks cannot overlap.
pub struct Interval {
    period: Duration,
    next_due: Option<Instant>,
}

impl Interval {
    pub fn start(period: Duration, now: Instant) -> Self {
        Interval { period, next_due: Some(now + period) }
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    /// Consumes one due tick, if any. Late ticks are delivered one per call
    /// so the caller can catch up without running them concurrently.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if due <= now => {
                self.next_due = Some(due + self.period);
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_cancelled(&self) -> bool {
        self.next_due.is_none()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Tick {
    Movement,
    Clock,
}

/// The movement and clock intervals of one game. Idle until the first move,
/// stopped for good at game over.
#[derive(Default)]
pub struct Scheduler {
    movement: Option<Interval>,
    clock: Option<Interval>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts both intervals. Does nothing if they are already running or
    /// have been stopped.
    pub fn start(&mut self, movement_period: Duration, clock_period: Duration, now: Instant) {
        if self.movement.is_some() || self.clock.is_some() {
            return;
        }

        self.movement = Some(Interval::start(movement_period, now));
        self.clock = Some(Interval::start(clock_period, now));
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.movement.iter().chain(self.clock.iter()).filter_map(Interval::next_due).min()
    }

    /// The oldest due tick, consumed. A movement tick wins a tie.
    pub fn poll(&mut self, now: Instant) -> Option<Tick> {
        let movement_due = self.movement.as_ref().and_then(Interval::next_due);
        let clock_due = self.clock.as_ref().and_then(Interval::next_due);

        let (tick, interval) = match (movement_due, clock_due) {
            (Some(m), Some(c)) if c < m => (Tick::Clock, self.clock.as_mut()),
            (Some(_), _) => (Tick::Movement, self.movement.as_mut()),
            (None, Some(_)) => (Tick::Clock, self.clock.as_mut()),
            (None, None) => return None,
        };

        let interval = interval?;
        if interval.poll(now) {
            Some(tick)
        } else {
            None
        }
    }

    /// Cancels both intervals. Returns false if there was nothing left to cancel.
    pub fn stop(&mut self) -> bool {
        let mut cancelled = false;

        for interval in self.movement.iter_mut().chain(self.clock.iter_mut()) {
            if !interval.is_cancelled() {
                interval.cancel();
                cancelled = true;
            }
        }

        cancelled
    }
}
