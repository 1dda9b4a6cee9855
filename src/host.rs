//! Capabilities the kiosk drives but does not own: video playback and sound.

use std::collections::BTreeMap;
use std::io::{self, Write};

use tracing::debug;

use crate::error::{KioskError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Sound {
    Swipe,
    Tap,
}

/// Fire-and-forget audio. Callers log failures and move on.
pub trait AudioSink {
    fn play(&mut self, sound: Sound) -> Result<()>;
}

impl<A: AudioSink + ?Sized> AudioSink for Box<A> {
    fn play(&mut self, sound: Sound) -> Result<()> {
        (**self).play(sound)
    }
}

/// Per-node video element, addressed by node index.
pub trait VideoHost {
    fn play_from_start(&mut self, node: usize) -> Result<()>;
    fn pause(&mut self, node: usize);
    fn rewind(&mut self, node: usize);
    fn set_muted(&mut self, node: usize, muted: bool);
    fn is_playing(&self, node: usize) -> bool;
}

/// Rings the terminal bell.
#[derive(Debug, Default)]
pub struct BellAudio;

impl AudioSink for BellAudio {
    fn play(&mut self, sound: Sound) -> Result<()> {
        let mut out = io::stdout();
        out.write_all(b"\x07")
            .and_then(|_| out.flush())
            .map_err(|e| KioskError::Audio(format!("{sound}: {e}")))
    }
}

#[derive(Debug, Default)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play(&mut self, sound: Sound) -> Result<()> {
        debug!(%sound, "sound muted");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VideoSlot {
    pub playing: bool,
    pub muted: bool,
    pub plays: u32,
}

/// Tracks play/pause/mute per node; the UI draws its state as a fake player.
#[derive(Debug, Default)]
pub struct SimulatedVideoHost {
    slots: BTreeMap<usize, VideoSlot>,
}

impl SimulatedVideoHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, node: usize) -> VideoSlot {
        self.slots.get(&node).copied().unwrap_or(VideoSlot {
            muted: true,
            ..VideoSlot::default()
        })
    }

    fn slot_mut(&mut self, node: usize) -> &mut VideoSlot {
        self.slots.entry(node).or_insert(VideoSlot {
            muted: true,
            ..VideoSlot::default()
        })
    }
}

impl VideoHost for SimulatedVideoHost {
    fn play_from_start(&mut self, node: usize) -> Result<()> {
        let slot = self.slot_mut(node);
        slot.playing = true;
        slot.plays += 1;
        Ok(())
    }

    fn pause(&mut self, node: usize) {
        self.slot_mut(node).playing = false;
    }

    fn rewind(&mut self, _node: usize) {}

    fn set_muted(&mut self, node: usize, muted: bool) {
        self.slot_mut(node).muted = muted;
    }

    fn is_playing(&self, node: usize) -> bool {
        self.slot(node).playing
    }
}

/// Everything a [`RecordingVideoHost`] was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Play(usize),
    Pause(usize),
    Rewind(usize),
    Mute(usize, bool),
}

/// Video host for tests: records calls and can be told to fail playback.
#[derive(Debug, Default)]
pub struct RecordingVideoHost {
    pub calls: Vec<HostCall>,
    pub failing_nodes: Vec<usize>,
    inner: SimulatedVideoHost,
}

impl RecordingVideoHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(nodes: &[usize]) -> Self {
        Self {
            failing_nodes: nodes.to_vec(),
            ..Self::default()
        }
    }
}

impl VideoHost for RecordingVideoHost {
    fn play_from_start(&mut self, node: usize) -> Result<()> {
        self.calls.push(HostCall::Play(node));
        if self.failing_nodes.contains(&node) {
            return Err(KioskError::Playback {
                node,
                reason: "autoplay blocked".into(),
            });
        }
        self.inner.play_from_start(node)
    }

    fn pause(&mut self, node: usize) {
        self.calls.push(HostCall::Pause(node));
        self.inner.pause(node);
    }

    fn rewind(&mut self, node: usize) {
        self.calls.push(HostCall::Rewind(node));
    }

    fn set_muted(&mut self, node: usize, muted: bool) {
        self.calls.push(HostCall::Mute(node, muted));
        self.inner.set_muted(node, muted);
    }

    fn is_playing(&self, node: usize) -> bool {
        self.inner.is_playing(node)
    }
}

#[derive(Debug, Default)]
pub struct RecordingAudio {
    pub played: Vec<Sound>,
    pub fail: bool,
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, sound: Sound) -> Result<()> {
        self.played.push(sound);
        if self.fail {
            Err(KioskError::Audio(format!("{sound}: device busy")))
        } else {
            Ok(())
        }
    }
}
