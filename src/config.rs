use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::error::{KioskError, Result};

/// What a node hosts, derived from its position in the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum NodeKind {
    Attract,
    Video { duration_ms: u64 },
    Panel,
    Still,
    Closing,
}

/// Every duration, threshold and count the kiosk runs on. Times are in
/// milliseconds, distances in pixels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KioskConfig {
    pub node_count: usize,
    pub lockout_ms: u64,
    pub inactivity_timeout_ms: u64,
    pub video_durations_ms: Vec<u64>,
    pub min_swipe_distance: f64,
    pub transition_delay_ms: u64,
    pub reset_transition_delay_ms: u64,
    pub reset_delay_ms: u64,
    pub fade_duration_ms: u64,
    pub node_slide_ms: u64,

    pub column_speeds: Vec<f64>,
    pub speed_boost_multiplier: f64,
    pub speed_transition_duration_ms: u64,
    pub periodic_boost_interval_ms: u64,
    pub periodic_boost_duration_ms: u64,
    pub periodic_boost_multiplier: f64,

    pub still_prompt_ms: u64,
    pub still_reset_ms: u64,
    pub unmute_delay_ms: u64,
    pub reset_fade: bool,
    pub timeout_reset_via_closing: bool,

    pub emoji_symbols: Vec<char>,
    pub counter_min: u32,
    pub counter_max: u32,
    pub burst_min: usize,
    pub burst_max: usize,
    pub particle_stagger_ms: u64,
    pub particle_lifetime_ms: u64,

    pub featured_tiles: usize,
    pub tile_height_px: f64,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            node_count: 7,
            lockout_ms: 2800,
            inactivity_timeout_ms: 1000,
            video_durations_ms: vec![0, 12000, 17500, 21300, 20020, 10000, 0],
            min_swipe_distance: 300.0,
            transition_delay_ms: 2300,
            reset_transition_delay_ms: 100,
            reset_delay_ms: 800,
            fade_duration_ms: 1000,
            node_slide_ms: 800,

            column_speeds: vec![0.35, 0.5, 0.2],
            speed_boost_multiplier: 350.0,
            speed_transition_duration_ms: 3000,
            periodic_boost_interval_ms: 25000,
            periodic_boost_duration_ms: 2500,
            periodic_boost_multiplier: 200.0,

            still_prompt_ms: 15000,
            still_reset_ms: 15000,
            unmute_delay_ms: 50,
            reset_fade: true,
            timeout_reset_via_closing: false,

            emoji_symbols: vec!['❤', '★', '☺'],
            counter_min: 223,
            counter_max: 856,
            burst_min: 8,
            burst_max: 15,
            particle_stagger_ms: 75,
            particle_lifetime_ms: 2650,

            featured_tiles: 10,
            tile_height_px: 96.0,
        }
    }
}

impl KioskConfig {
    pub fn validate(&self) -> Result<()> {
        if self.node_count < 3 {
            return Err(KioskError::InvalidConfig(format!(
                "node_count must be at least 3 (attract, content, closing), got {}",
                self.node_count
            )));
        }
        if self.video_durations_ms.len() != self.node_count {
            return Err(KioskError::InvalidConfig(format!(
                "video_durations_ms has {} entries for {} nodes",
                self.video_durations_ms.len(),
                self.node_count
            )));
        }
        if self.column_speeds.is_empty() {
            return Err(KioskError::InvalidConfig(
                "column_speeds must name at least one column".into(),
            ));
        }
        if self.counter_min > self.counter_max {
            return Err(KioskError::InvalidConfig(format!(
                "counter_min {} exceeds counter_max {}",
                self.counter_min, self.counter_max
            )));
        }
        if self.burst_min > self.burst_max {
            return Err(KioskError::InvalidConfig(format!(
                "burst_min {} exceeds burst_max {}",
                self.burst_min, self.burst_max
            )));
        }
        Ok(())
    }

    pub fn column_count(&self) -> usize {
        self.column_speeds.len()
    }

    pub fn closing_node(&self) -> usize {
        self.node_count - 1
    }

    /// The last content node; swiping forward from here runs the reset sequence.
    pub fn terminal_node(&self) -> usize {
        self.node_count - 2
    }

    pub fn node_kind(&self, node: usize) -> NodeKind {
        if node == 0 {
            NodeKind::Attract
        } else if node >= self.closing_node() {
            NodeKind::Closing
        } else if node == self.terminal_node() {
            NodeKind::Still
        } else {
            match self.video_durations_ms.get(node).copied().unwrap_or(0) {
                0 => NodeKind::Panel,
                duration_ms => NodeKind::Video { duration_ms },
            }
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Result<KioskConfig>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, cfg: &KioskConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// A missing file means defaults; anything unreadable or malformed is an error.
    fn load(&self) -> Result<KioskConfig> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(KioskConfig::default()),
            Err(e) => return Err(e.into()),
        };
        let cfg = serde_json::from_slice::<KioskConfig>(&bytes)?;
        cfg.validate()?;
        Ok(cfg)
    }
}
