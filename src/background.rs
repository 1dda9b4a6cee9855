//! Parallax tile background.
//!
//! Each column scrolls by its own base speed while the attract screen is up
//! or a swipe boost is running. Positions are integrated per frame and wrap
//! modulo one cycle of the column's (duplicated) content.

use crate::config::KioskConfig;
use crate::gesture::Direction;
use crate::timing::{EaseEnvelope, Millis};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoostState {
    Inactive,
    Active {
        envelope: EaseEnvelope,
        direction: Direction,
    },
}

impl BoostState {
    fn expire(&mut self, now: Millis) {
        if let BoostState::Active { envelope, .. } = self {
            if envelope.is_finished(now) {
                *self = BoostState::Inactive;
            }
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, BoostState::Active { .. })
    }

    fn is_backward(&self) -> bool {
        matches!(
            self,
            BoostState::Active {
                direction: Direction::Backward,
                ..
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub position: f64,
    pub base_speed: f64,
    /// Height of one non-duplicated set of tiles.
    pub cycle_height: f64,
}

impl Column {
    fn wrap(&mut self, backward: bool) {
        if self.cycle_height <= 0.0 {
            self.position = 0.0;
        } else if backward {
            if self.position > 0.0 {
                self.position = -self.cycle_height;
            }
        } else if self.position.abs() >= self.cycle_height {
            self.position = 0.0;
        }
    }
}

#[derive(Debug, Clone)]
pub struct BackgroundAnimator {
    pub columns: Vec<Column>,
    swipe_boost: BoostState,
    periodic_boost: Option<EaseEnvelope>,
    speed_boost_multiplier: f64,
    speed_transition_duration_ms: Millis,
    periodic_boost_multiplier: f64,
    periodic_boost_duration_ms: Millis,
}

impl BackgroundAnimator {
    pub fn new(config: &KioskConfig, cycle_heights: &[f64]) -> Self {
        let columns = config
            .column_speeds
            .iter()
            .enumerate()
            .map(|(i, &base_speed)| Column {
                position: 0.0,
                base_speed,
                cycle_height: cycle_heights.get(i).copied().unwrap_or(0.0),
            })
            .collect();

        Self {
            columns,
            swipe_boost: BoostState::Inactive,
            periodic_boost: None,
            speed_boost_multiplier: config.speed_boost_multiplier,
            speed_transition_duration_ms: config.speed_transition_duration_ms,
            periodic_boost_multiplier: config.periodic_boost_multiplier,
            periodic_boost_duration_ms: config.periodic_boost_duration_ms,
        }
    }

    pub fn positions(&self) -> Vec<f64> {
        self.columns.iter().map(|c| c.position).collect()
    }

    pub fn swipe_boost(&self) -> BoostState {
        self.swipe_boost
    }

    pub fn periodic_boost(&self) -> Option<EaseEnvelope> {
        self.periodic_boost
    }

    pub fn set_cycle_heights(&mut self, heights: &[f64]) {
        for (column, &h) in self.columns.iter_mut().zip(heights) {
            column.cycle_height = h;
            column.wrap(false);
        }
    }

    pub fn start_swipe_boost(&mut self, now: Millis, direction: Direction) {
        self.swipe_boost = BoostState::Active {
            envelope: EaseEnvelope::new(now, self.speed_transition_duration_ms),
            direction,
        };
    }

    pub fn end_swipe_boost(&mut self) {
        self.swipe_boost = BoostState::Inactive;
    }

    pub fn start_periodic_boost(&mut self, now: Millis) {
        self.periodic_boost = Some(EaseEnvelope::new(now, self.periodic_boost_duration_ms));
    }

    pub fn stop_periodic_boost(&mut self) {
        self.periodic_boost = None;
    }

    /// Drop boosts whose envelope has run out.
    pub fn expire_boosts(&mut self, now: Millis) {
        self.swipe_boost.expire(now);
        if self.periodic_boost.is_some_and(|e| e.is_finished(now)) {
            self.periodic_boost = None;
        }
    }

    /// Signed per-frame speed for a column. Zero unless the attract screen is
    /// up or a swipe boost is running; negative while boosting backward.
    pub fn column_speed(&self, index: usize, now: Millis, on_attract: bool) -> f64 {
        let Some(column) = self.columns.get(index) else {
            return 0.0;
        };
        if !on_attract && !self.swipe_boost.is_active() {
            return 0.0;
        }

        let mut speed = column.base_speed;
        if on_attract {
            if let Some(m) = self
                .periodic_boost
                .and_then(|e| e.multiplier(now, self.periodic_boost_multiplier))
            {
                speed *= m;
            }
        }
        if let BoostState::Active { envelope, .. } = self.swipe_boost {
            if let Some(m) = envelope.multiplier(now, self.speed_boost_multiplier) {
                speed *= m;
            }
        }

        if self.swipe_boost.is_backward() {
            -speed
        } else {
            speed
        }
    }

    /// Advance every column by one frame.
    pub fn advance(&mut self, now: Millis, on_attract: bool) {
        self.expire_boosts(now);
        let backward = self.swipe_boost.is_backward();
        let speeds: Vec<f64> = (0..self.columns.len())
            .map(|i| self.column_speed(i, now, on_attract))
            .collect();
        for (column, speed) in self.columns.iter_mut().zip(speeds) {
            column.position -= speed;
            column.wrap(backward);
        }
    }

    pub fn reset(&mut self) {
        for column in &mut self.columns {
            column.position = 0.0;
        }
        self.swipe_boost = BoostState::Inactive;
        self.periodic_boost = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animator(heights: &[f64]) -> BackgroundAnimator {
        BackgroundAnimator::new(&KioskConfig::default(), heights)
    }

    #[test]
    fn still_off_attract_without_boost() {
        let mut bg = animator(&[1000.0, 1000.0, 1000.0]);
        bg.advance(16, false);
        assert_eq!(bg.positions(), vec![0.0, 0.0, 0.0]);
        assert_eq!(bg.column_speed(1, 16, false), 0.0);
    }

    #[test]
    fn attract_drifts_at_base_speed() {
        let mut bg = animator(&[1000.0, 1000.0, 1000.0]);
        bg.advance(16, true);
        assert_eq!(bg.positions(), vec![-0.35, -0.5, -0.2]);
    }

    #[test]
    fn swipe_boost_envelope_bounds() {
        let mut bg = animator(&[1e9, 1e9, 1e9]);
        bg.start_swipe_boost(1000, Direction::Forward);
        let base = 0.5;
        assert!((bg.column_speed(1, 1000, false) - base).abs() < 1e-9);
        assert!((bg.column_speed(1, 2500, false) - base * 350.0).abs() < 1e-9);
        let near_end = bg.column_speed(1, 3999, false);
        assert!(near_end < base * 2.0, "near end speed {near_end}");

        bg.advance(4000, false);
        assert!(!bg.swipe_boost().is_active());
        assert_eq!(bg.column_speed(1, 4000, false), 0.0);
    }

    #[test]
    fn backward_boost_flips_sign() {
        let mut bg = animator(&[1e9, 1e9, 1e9]);
        bg.start_swipe_boost(0, Direction::Backward);
        assert!(bg.column_speed(0, 100, false) < 0.0);
    }

    #[test]
    fn periodic_boost_only_applies_on_attract() {
        let mut bg = animator(&[1e9, 1e9, 1e9]);
        bg.start_periodic_boost(0);
        assert!((bg.column_speed(2, 1250, true) - 0.2 * 200.0).abs() < 1e-9);
        assert_eq!(bg.column_speed(2, 1250, false), 0.0);
    }

    #[test]
    fn boosts_compose_multiplicatively() {
        let mut bg = animator(&[1e9, 1e9, 1e9]);
        bg.start_periodic_boost(0);
        bg.start_swipe_boost(0, Direction::Forward);
        // 1250ms: periodic at its peak, swipe boost at progress 1250/1500.
        let swipe = 1.0 + 349.0 * (1250.0 / 1500.0);
        let expected = 0.35 * 200.0 * swipe;
        assert!((bg.column_speed(0, 1250, true) - expected).abs() < 1e-6);
    }

    #[test]
    fn forward_wrap_never_exceeds_cycle() {
        let h = 100.0;
        let mut bg = animator(&[h, h, h]);
        bg.start_swipe_boost(0, Direction::Forward);
        for now in (0..3000).step_by(16) {
            bg.advance(now, true);
            for p in bg.positions() {
                assert!(p.abs() < h, "position {p} escaped the cycle");
                assert!(p <= 0.0);
            }
        }
    }

    #[test]
    fn backward_wrap_lands_on_negative_cycle() {
        let h = 100.0;
        let mut bg = animator(&[h, h, h]);
        bg.start_swipe_boost(0, Direction::Backward);
        bg.advance(16, false);
        // From 0 the first backward step overshoots and wraps to -H exactly.
        assert_eq!(bg.positions(), vec![-h, -h, -h]);
        for now in (32..3000).step_by(16) {
            bg.advance(now, false);
            for p in bg.positions() {
                assert!((-h..=0.0).contains(&p), "position {p} escaped the cycle");
            }
        }
    }

    #[test]
    fn reset_zeroes_columns_and_boosts() {
        let mut bg = animator(&[1000.0, 1000.0, 1000.0]);
        bg.start_swipe_boost(0, Direction::Forward);
        bg.start_periodic_boost(0);
        bg.advance(500, true);
        bg.reset();
        assert_eq!(bg.positions(), vec![0.0, 0.0, 0.0]);
        assert!(!bg.swipe_boost().is_active());
        assert!(bg.periodic_boost().is_none());
    }
}
