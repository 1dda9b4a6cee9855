use crate::timing::Millis;

/// What started a reset sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ResetTrigger {
    TerminalSwipe,
    Inactivity,
    StillTimeout,
}

/// Full-screen fade bracketing a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fade {
    None,
    Out { since_ms: Millis },
    In { since_ms: Millis },
}

impl Fade {
    /// Opacity of the white overlay, 0 (clear) to 1 (solid).
    pub fn opacity(&self, now: Millis, duration_ms: Millis) -> f64 {
        let ramp = |since: Millis| {
            (now.saturating_sub(since) as f64 / duration_ms.max(1) as f64).clamp(0.0, 1.0)
        };
        match *self {
            Fade::None => 0.0,
            Fade::Out { since_ms } => ramp(since_ms),
            Fade::In { since_ms } => 1.0 - ramp(since_ms),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionState {
    /// Last accepted swipe or emoji tap; drives the lockout window.
    pub last_interaction_ms: Millis,
    pub last_frame_ms: Millis,
    pub fade: Fade,
    pub reset: Option<ResetTrigger>,
    pub attract_prompt_visible: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            last_interaction_ms: 0,
            last_frame_ms: 0,
            fade: Fade::None,
            reset: None,
            attract_prompt_visible: true,
        }
    }
}

impl SessionState {
    pub fn lockout_remaining(&self, now: Millis, lockout_ms: Millis) -> Option<Millis> {
        let since = now.saturating_sub(self.last_interaction_ms);
        (since < lockout_ms).then(|| lockout_ms - since)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fade_ramps() {
        assert_eq!(Fade::None.opacity(5, 1000), 0.0);
        assert_eq!(Fade::Out { since_ms: 0 }.opacity(500, 1000), 0.5);
        assert_eq!(Fade::Out { since_ms: 0 }.opacity(5000, 1000), 1.0);
        assert_eq!(Fade::In { since_ms: 1000 }.opacity(1250, 1000), 0.75);
    }

    #[test]
    fn lockout_window_is_half_open() {
        let s = SessionState {
            last_interaction_ms: 1000,
            ..SessionState::default()
        };
        assert_eq!(s.lockout_remaining(1000 + 2799, 2800), Some(1));
        assert_eq!(s.lockout_remaining(1000 + 2800, 2800), None);
    }
}
