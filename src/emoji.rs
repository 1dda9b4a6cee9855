use rand::Rng;

use crate::config::KioskConfig;
use crate::timing::Millis;

/// Rise of a particle in screen heights over its lifetime.
const RISE_SCREENS: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojiCounter {
    pub symbol: char,
    pub count: u32,
}

/// One floating copy of a tapped emoji. Coordinates are fractions of the
/// screen: `x` from the left edge, vertical travel derived from age.
#[derive(Debug, Clone, PartialEq)]
pub struct EmojiParticle {
    pub symbol: char,
    pub x: f64,
    pub spawn_at_ms: Millis,
    pub lifetime_ms: Millis,
    pub clockwise: bool,
}

impl EmojiParticle {
    fn age(&self, now: Millis) -> Option<f64> {
        if now < self.spawn_at_ms {
            return None;
        }
        let age = (now - self.spawn_at_ms) as f64 / self.lifetime_ms.max(1) as f64;
        (age < 1.0).then_some(age)
    }

    /// Height above the bottom edge in screen fractions, once spawned.
    pub fn rise(&self, now: Millis) -> Option<f64> {
        self.age(now).map(|age| age * RISE_SCREENS)
    }

    pub fn opacity(&self, now: Millis) -> f64 {
        self.age(now).map(|age| 1.0 - age).unwrap_or(0.0)
    }

    pub fn is_expired(&self, now: Millis) -> bool {
        now >= self.spawn_at_ms + self.lifetime_ms
    }
}

/// Tap counters shown on content nodes plus the particles their taps spawn.
#[derive(Debug)]
pub struct EmojiCounters {
    pub counters: Vec<EmojiCounter>,
    pub particles: Vec<EmojiParticle>,
    counter_range: (u32, u32),
    burst_range: (usize, usize),
    stagger_ms: Millis,
    lifetime_ms: Millis,
}

impl EmojiCounters {
    pub fn new(config: &KioskConfig) -> Self {
        let mut counters = Self {
            counters: config
                .emoji_symbols
                .iter()
                .map(|&symbol| EmojiCounter { symbol, count: 0 })
                .collect(),
            particles: Vec::new(),
            counter_range: (config.counter_min, config.counter_max),
            burst_range: (config.burst_min, config.burst_max),
            stagger_ms: config.particle_stagger_ms,
            lifetime_ms: config.particle_lifetime_ms,
        };
        counters.randomize();
        counters
    }

    pub fn randomize(&mut self) {
        let mut rng = rand::thread_rng();
        let (lo, hi) = self.counter_range;
        for counter in &mut self.counters {
            counter.count = rng.gen_range(lo..=hi);
        }
        self.particles.clear();
    }

    /// Bump a counter and launch its burst. Returns false for an unknown index.
    pub fn tap(&mut self, index: usize, now: Millis) -> bool {
        let Some(counter) = self.counters.get_mut(index) else {
            return false;
        };
        counter.count = counter.count.saturating_add(1);
        let symbol = counter.symbol;

        let mut rng = rand::thread_rng();
        let (lo, hi) = self.burst_range;
        let burst = rng.gen_range(lo..=hi);
        for i in 0..burst {
            self.particles.push(EmojiParticle {
                symbol,
                // Right quarter of the screen, clear of the edge.
                x: rng.gen_range(0.75..0.95),
                spawn_at_ms: now + i as Millis * self.stagger_ms,
                lifetime_ms: self.lifetime_ms,
                clockwise: rng.gen_bool(0.5),
            });
        }
        true
    }

    pub fn update(&mut self, now: Millis) {
        self.particles.retain(|p| !p.is_expired(now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_randomize_within_range() {
        let cfg = KioskConfig::default();
        let mut emoji = EmojiCounters::new(&cfg);
        for _ in 0..20 {
            emoji.randomize();
            for c in &emoji.counters {
                assert!((223..=856).contains(&c.count), "count {}", c.count);
            }
        }
        assert_eq!(emoji.counters.len(), cfg.emoji_symbols.len());
    }

    #[test]
    fn tap_increments_and_spawns_staggered_burst() {
        let mut emoji = EmojiCounters::new(&KioskConfig::default());
        let before = emoji.counters[1].count;
        assert!(emoji.tap(1, 1000));
        assert_eq!(emoji.counters[1].count, before + 1);

        let n = emoji.particles.len();
        assert!((8..=15).contains(&n));
        assert_eq!(emoji.particles[0].spawn_at_ms, 1000);
        assert_eq!(emoji.particles[n - 1].spawn_at_ms, 1000 + (n as u64 - 1) * 75);
        assert!(emoji.particles.iter().all(|p| (0.75..0.95).contains(&p.x)));
    }

    #[test]
    fn unknown_counter_is_ignored() {
        let mut emoji = EmojiCounters::new(&KioskConfig::default());
        assert!(!emoji.tap(42, 0));
        assert!(emoji.particles.is_empty());
    }

    #[test]
    fn particles_rise_then_expire() {
        let mut emoji = EmojiCounters::new(&KioskConfig::default());
        emoji.tap(0, 0);
        let first = emoji.particles[0].clone();
        assert_eq!(first.rise(0), Some(0.0));
        assert!(first.rise(1325).unwrap() > 0.9);
        assert!(first.opacity(1325) < 0.6);

        emoji.update(2000);
        assert!(!emoji.particles.is_empty());
        emoji.update(2650 + 15 * 75);
        assert!(emoji.particles.is_empty());
    }

    #[test]
    fn pending_particles_are_not_drawn_yet() {
        let mut emoji = EmojiCounters::new(&KioskConfig::default());
        emoji.tap(0, 100);
        let last = emoji.particles.last().unwrap().clone();
        assert_eq!(last.rise(100), None);
        assert_eq!(last.opacity(100), 0.0);
    }
}
