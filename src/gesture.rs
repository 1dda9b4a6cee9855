use thiserror::Error;

use crate::node_machine::ShowRejected;
use crate::timing::Millis;

/// Raw touch input as the host reports it. `touches` is the number of
/// contact points involved; `y` is in pixels from the top of the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchEvent {
    Start { touches: usize, y: f64 },
    End { touches: usize, y: Option<f64> },
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Direction {
    /// Swipe up: advance to the next node.
    Forward,
    /// Swipe down: go back one node.
    Backward,
}

impl Direction {
    pub fn sign(&self) -> isize {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

/// Why a navigation intent was dropped. None of these are errors; they are
/// logged and otherwise ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NavRejection {
    #[error("reset sequence in flight")]
    ResetInFlight,
    #[error("transition in progress")]
    Transitioning,
    #[error("lockout active for another {remaining_ms}ms")]
    Lockout { remaining_ms: Millis },
    #[error(transparent)]
    Show(#[from] ShowRejected),
}

/// Outcome of a completed single touch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Swipe { direction: Direction, distance: f64 },
    /// A touch that never travelled far enough to count as a swipe.
    Tap,
}

/// Classify a vertical travel. Positive distance means the finger moved up.
pub fn classify(distance: f64, min_swipe_distance: f64) -> Gesture {
    if distance.abs() > min_swipe_distance {
        let direction = if distance > 0.0 {
            Direction::Forward
        } else {
            Direction::Backward
        };
        Gesture::Swipe {
            direction,
            distance,
        }
    } else {
        Gesture::Tap
    }
}

/// Pairs a single-finger touch start with its end.
#[derive(Debug, Default, Clone)]
pub struct GestureTracker {
    start_y: Option<f64>,
    // Another contact landed while the first was down.
    tainted: bool,
}

impl GestureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.start_y.is_some()
    }

    /// Multi-touch starts are ignored. A start while one is already tracked
    /// means a second finger, so the tracked touch can no longer be a swipe.
    pub fn start(&mut self, touches: usize, y: f64) -> bool {
        if self.is_active() {
            self.tainted = true;
            return false;
        }
        if touches != 1 {
            return false;
        }
        self.start_y = Some(y);
        true
    }

    /// Finish the tracked touch. Returns `startY - endY`, or `None` when the
    /// touch was malformed (no start, no end point, several contacts).
    pub fn end(&mut self, touches: usize, y: Option<f64>) -> Option<f64> {
        let start = self.start_y.take()?;
        let tainted = std::mem::take(&mut self.tainted);
        if tainted || touches != 1 {
            return None;
        }
        y.map(|end| start - end)
    }

    pub fn cancel(&mut self) {
        self.start_y = None;
        self.tainted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn threshold_is_exclusive() {
        assert_eq!(classify(300.0, 300.0), Gesture::Tap);
        assert_eq!(classify(-300.0, 300.0), Gesture::Tap);
        assert_matches!(
            classify(301.0, 300.0),
            Gesture::Swipe {
                direction: Direction::Forward,
                ..
            }
        );
        assert_matches!(
            classify(-301.0, 300.0),
            Gesture::Swipe {
                direction: Direction::Backward,
                ..
            }
        );
    }

    #[test]
    fn single_touch_yields_distance() {
        let mut t = GestureTracker::new();
        assert!(t.start(1, 900.0));
        assert_eq!(t.end(1, Some(500.0)), Some(400.0));
        assert!(!t.is_active());
    }

    #[test]
    fn multi_touch_is_discarded() {
        let mut t = GestureTracker::new();
        assert!(!t.start(2, 900.0));
        assert_eq!(t.end(1, Some(100.0)), None);

        assert!(t.start(1, 900.0));
        assert_eq!(t.end(2, Some(100.0)), None);
        assert!(!t.is_active(), "malformed end still clears the touch");
    }

    #[test]
    fn second_contact_spoils_the_tracked_touch() {
        let mut t = GestureTracker::new();
        t.start(1, 800.0);
        assert!(!t.start(2, 700.0));
        assert_eq!(t.end(1, Some(0.0)), None);
        assert!(!t.is_active());

        t.start(1, 800.0);
        assert!(!t.start(1, 100.0));
        assert_eq!(t.end(1, Some(0.0)), None);

        // The next clean touch is unaffected.
        t.start(1, 800.0);
        assert_eq!(t.end(1, Some(0.0)), Some(800.0));
    }

    #[test]
    fn missing_end_point_or_cancel_is_discarded() {
        let mut t = GestureTracker::new();
        t.start(1, 800.0);
        assert_eq!(t.end(1, None), None);

        t.start(1, 800.0);
        t.cancel();
        assert_eq!(t.end(1, Some(0.0)), None);
    }

    #[test]
    fn direction_signs() {
        assert_eq!(Direction::Forward.sign(), 1);
        assert_eq!(Direction::Backward.sign(), -1);
    }
}
