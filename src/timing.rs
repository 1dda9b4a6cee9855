use std::cell::Cell;
use std::time::Instant;

/// Milliseconds since the session clock started.
pub type Millis = u64;

/// Source of monotonic session time.
pub trait Clock {
    fn now_ms(&self) -> Millis;
}

/// Wall clock anchored at construction
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> Millis {
        self.origin.elapsed().as_millis() as Millis
    }
}

/// Hand-advanced clock for deterministic tests
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Millis>,
}

impl ManualClock {
    pub fn new(start: Millis) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance(&self, by: Millis) -> Millis {
        self.now.set(self.now.get() + by);
        self.now.get()
    }

    pub fn set(&self, to: Millis) {
        self.now.set(to);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.get()
    }
}

/// Ease-in/ease-out envelope: progress climbs linearly from 0 to 1 over the
/// first half of the duration, then falls back to 0 over the second half.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EaseEnvelope {
    pub start_ms: Millis,
    pub duration_ms: Millis,
}

impl EaseEnvelope {
    pub fn new(start_ms: Millis, duration_ms: Millis) -> Self {
        Self {
            start_ms,
            duration_ms,
        }
    }

    pub fn elapsed(&self, now: Millis) -> Millis {
        now.saturating_sub(self.start_ms)
    }

    pub fn is_finished(&self, now: Millis) -> bool {
        self.elapsed(now) >= self.duration_ms
    }

    /// Progress in `[0, 1]`, or `None` once the envelope has run out.
    pub fn progress(&self, now: Millis) -> Option<f64> {
        if self.is_finished(now) {
            return None;
        }
        let elapsed = self.elapsed(now) as f64;
        let half = self.duration_ms as f64 / 2.0;
        let progress = if elapsed < half {
            elapsed / half
        } else {
            1.0 - (elapsed - half) / half
        };
        Some(progress.clamp(0.0, 1.0))
    }

    /// Speed multiplier at `now`: 1 at the edges, `peak` at the midpoint.
    pub fn multiplier(&self, now: Millis, peak: f64) -> Option<f64> {
        self.progress(now)
            .map(|progress| 1.0 + (peak - 1.0) * progress)
    }
}
