//! Inactivity and video-lifecycle timers.
//!
//! A video node plays its clip, reveals the swipe-up prompt after one
//! playthrough and stops the clip after the second; from then on the generic
//! inactivity timer decides when to reset. The still node runs its own
//! two-stage prompt/reset timer instead. The generic timer never runs on the
//! attract screen, while a clip is in its playback window, or mid-transition.

use tracing::{debug, warn};

use crate::config::{KioskConfig, NodeKind};
use crate::host::VideoHost;
use crate::scheduler::{Scheduler, TaskHandle, TimerAction, TimerKind};
use crate::timing::Millis;

/// What the watchdog needs to know about the session to decide on arming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleContext {
    pub node: usize,
    pub kind: NodeKind,
    pub transitioning: bool,
    pub resetting: bool,
}

#[derive(Debug, Clone)]
pub struct Watchdog {
    playing: Option<usize>,
    playback_started_ms: Option<Millis>,
    swipe_prompt: bool,
    /// The inactivity timer, or the still node's prompt/reset timer.
    idle_timer: Option<TaskHandle>,
    inactivity_timeout_ms: Millis,
    unmute_delay_ms: Millis,
    still_prompt_ms: Millis,
    still_reset_ms: Millis,
}

impl Watchdog {
    pub fn new(config: &KioskConfig) -> Self {
        Self {
            playing: None,
            playback_started_ms: None,
            swipe_prompt: false,
            idle_timer: None,
            inactivity_timeout_ms: config.inactivity_timeout_ms,
            unmute_delay_ms: config.unmute_delay_ms,
            still_prompt_ms: config.still_prompt_ms,
            still_reset_ms: config.still_reset_ms,
        }
    }

    /// Node whose clip is inside its intended playback window.
    pub fn playing(&self) -> Option<usize> {
        self.playing
    }

    pub fn is_video_playing(&self) -> bool {
        self.playing.is_some()
    }

    pub fn playback_started_ms(&self) -> Option<Millis> {
        self.playback_started_ms
    }

    pub fn swipe_prompt_visible(&self) -> bool {
        self.swipe_prompt
    }

    fn cancel_idle_timer(&mut self, scheduler: &mut Scheduler) {
        if let Some(handle) = self.idle_timer.take() {
            handle.cancel(scheduler);
        }
    }

    /// The node became visible.
    pub fn on_node_enter<V: VideoHost + ?Sized>(
        &mut self,
        ctx: IdleContext,
        now: Millis,
        scheduler: &mut Scheduler,
        video: &mut V,
    ) {
        self.swipe_prompt = false;
        match ctx.kind {
            NodeKind::Video { duration_ms } => {
                self.start_video(ctx, duration_ms, now, scheduler, video)
            }
            _ => {
                self.rearm(ctx, now, scheduler);
            }
        }
    }

    fn start_video<V: VideoHost + ?Sized>(
        &mut self,
        ctx: IdleContext,
        duration_ms: Millis,
        now: Millis,
        scheduler: &mut Scheduler,
        video: &mut V,
    ) {
        let node = ctx.node;
        match video.play_from_start(node) {
            Ok(()) => {
                self.playing = Some(node);
                self.playback_started_ms = Some(now);
                self.cancel_idle_timer(scheduler);
                scheduler.schedule(
                    TimerKind::Unmute { node },
                    now,
                    self.unmute_delay_ms,
                    TimerAction::Unmute { node },
                );
                scheduler.schedule(
                    TimerKind::SwipeUp { node },
                    now,
                    duration_ms,
                    TimerAction::RevealVideoPrompt { node },
                );
                debug!(node, duration_ms, "video started");
            }
            Err(e) => {
                // Fall back to the idle path so a dead clip cannot pin the kiosk.
                warn!(node, error = %e, "video failed to start");
                self.playing = None;
                self.playback_started_ms = None;
                self.rearm(ctx, now, scheduler);
            }
        }
    }

    /// First playthrough finished: show the prompt and give it one more.
    pub fn reveal_video_prompt(
        &mut self,
        node: usize,
        duration_ms: Millis,
        now: Millis,
        scheduler: &mut Scheduler,
    ) {
        self.swipe_prompt = true;
        scheduler.schedule(
            TimerKind::SwipeUp { node },
            now,
            duration_ms,
            TimerAction::PlaythroughsDone { node },
        );
    }

    /// Second playthrough finished with nobody touching the screen.
    pub fn end_playback<V: VideoHost + ?Sized>(&mut self, node: usize, video: &mut V) {
        video.pause(node);
        if self.playing == Some(node) {
            self.playing = None;
            self.playback_started_ms = None;
        }
        debug!(node, "playback window over");
    }

    /// The node left the screen. Always stops its clip and timers.
    pub fn on_node_exit<V: VideoHost + ?Sized>(
        &mut self,
        node: usize,
        kind: NodeKind,
        scheduler: &mut Scheduler,
        video: &mut V,
    ) {
        if let NodeKind::Video { .. } = kind {
            video.pause(node);
            video.rewind(node);
            video.set_muted(node, true);
            scheduler.cancel(TimerKind::SwipeUp { node });
            scheduler.cancel(TimerKind::Unmute { node });
        }
        self.cancel_idle_timer(scheduler);
        if self.playing == Some(node) {
            self.playing = None;
            self.playback_started_ms = None;
        }
        self.swipe_prompt = false;
    }

    /// Cancel-and-replace the idle timer for the node in view. Returns whether
    /// a timer is now armed.
    pub fn rearm(&mut self, ctx: IdleContext, now: Millis, scheduler: &mut Scheduler) -> bool {
        self.cancel_idle_timer(scheduler);
        if ctx.node == 0 || self.playing.is_some() || ctx.transitioning || ctx.resetting {
            return false;
        }
        match ctx.kind {
            NodeKind::Attract | NodeKind::Closing => false,
            NodeKind::Still => {
                // Back to stage one, so the prompt goes until it is due again.
                self.swipe_prompt = false;
                self.idle_timer = Some(scheduler.schedule(
                    TimerKind::StillNode,
                    now,
                    self.still_prompt_ms,
                    TimerAction::RevealStillPrompt,
                ));
                true
            }
            NodeKind::Video { .. } | NodeKind::Panel => {
                self.idle_timer = Some(scheduler.schedule(
                    TimerKind::Inactivity,
                    now,
                    self.inactivity_timeout_ms,
                    TimerAction::InactivityExpired,
                ));
                true
            }
        }
    }

    pub fn reveal_still_prompt(&mut self, now: Millis, scheduler: &mut Scheduler) {
        self.swipe_prompt = true;
        self.idle_timer = Some(scheduler.schedule(
            TimerKind::StillNode,
            now,
            self.still_reset_ms,
            TimerAction::StillNodeExpired,
        ));
    }

    /// Back to a fresh-load state. Timers are the caller's to clear.
    pub fn reset<V: VideoHost + ?Sized>(&mut self, video: &mut V) {
        if let Some(node) = self.playing.take() {
            video.pause(node);
            video.rewind(node);
            video.set_muted(node, true);
        }
        self.playback_started_ms = None;
        self.swipe_prompt = false;
        self.idle_timer = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostCall, RecordingVideoHost};

    fn ctx(node: usize, kind: NodeKind) -> IdleContext {
        IdleContext {
            node,
            kind,
            transitioning: false,
            resetting: false,
        }
    }

    #[test]
    fn video_entry_plays_and_suppresses_inactivity() {
        let mut wd = Watchdog::new(&KioskConfig::default());
        let mut sched = Scheduler::new();
        let mut video = RecordingVideoHost::new();
        assert!(wd.rearm(ctx(1, NodeKind::Panel), 0, &mut sched));
        assert!(sched.is_live(TimerKind::Inactivity));

        let kind = NodeKind::Video { duration_ms: 12000 };
        wd.on_node_enter(ctx(1, kind), 100, &mut sched, &mut video);

        assert_eq!(wd.playing(), Some(1));
        assert!(!sched.is_live(TimerKind::Inactivity));
        assert_eq!(sched.due_at(TimerKind::SwipeUp { node: 1 }), Some(12100));
        assert_eq!(video.calls, vec![HostCall::Play(1)]);
        assert!(!wd.rearm(ctx(1, kind), 200, &mut sched));
    }

    #[test]
    fn prompt_then_playthrough_expiry() {
        let mut wd = Watchdog::new(&KioskConfig::default());
        let mut sched = Scheduler::new();
        let mut video = RecordingVideoHost::new();
        let kind = NodeKind::Video { duration_ms: 1000 };
        wd.on_node_enter(ctx(2, kind), 0, &mut sched, &mut video);

        wd.reveal_video_prompt(2, 1000, 1000, &mut sched);
        assert!(wd.swipe_prompt_visible());
        assert_eq!(sched.due_at(TimerKind::SwipeUp { node: 2 }), Some(2000));

        wd.end_playback(2, &mut video);
        assert!(!wd.is_video_playing());
        assert!(wd.rearm(ctx(2, kind), 2000, &mut sched));
        assert_eq!(sched.due_at(TimerKind::Inactivity), Some(3000));
    }

    #[test]
    fn exit_unconditionally_stops_clip() {
        let mut wd = Watchdog::new(&KioskConfig::default());
        let mut sched = Scheduler::new();
        let mut video = RecordingVideoHost::new();
        let kind = NodeKind::Video { duration_ms: 5000 };
        wd.on_node_enter(ctx(3, kind), 0, &mut sched, &mut video);
        wd.on_node_exit(3, kind, &mut sched, &mut video);

        assert!(!wd.is_video_playing());
        assert!(!sched.is_live(TimerKind::SwipeUp { node: 3 }));
        assert!(!sched.is_live(TimerKind::Unmute { node: 3 }));
        assert!(video.calls.contains(&HostCall::Pause(3)));
        assert!(video.calls.contains(&HostCall::Mute(3, true)));
    }

    #[test]
    fn failed_video_falls_back_to_idle_timer() {
        let mut wd = Watchdog::new(&KioskConfig::default());
        let mut sched = Scheduler::new();
        let mut video = RecordingVideoHost::failing(&[1]);
        let kind = NodeKind::Video { duration_ms: 12000 };
        wd.on_node_enter(ctx(1, kind), 0, &mut sched, &mut video);

        assert!(!wd.is_video_playing());
        assert!(!sched.is_live(TimerKind::SwipeUp { node: 1 }));
        assert_eq!(sched.due_at(TimerKind::Inactivity), Some(1000));
    }

    #[test]
    fn still_node_uses_two_stage_timer() {
        let cfg = KioskConfig::default();
        let mut wd = Watchdog::new(&cfg);
        let mut sched = Scheduler::new();
        let mut video = RecordingVideoHost::new();
        wd.on_node_enter(ctx(5, NodeKind::Still), 0, &mut sched, &mut video);

        assert!(!sched.is_live(TimerKind::Inactivity));
        assert_eq!(sched.due_at(TimerKind::StillNode), Some(15000));
        wd.reveal_still_prompt(15000, &mut sched);
        assert!(wd.swipe_prompt_visible());
        assert_eq!(sched.due_at(TimerKind::StillNode), Some(30000));

        // A tap starts stage one over and hides the prompt with it.
        assert!(wd.rearm(ctx(5, NodeKind::Still), 20000, &mut sched));
        assert!(!wd.swipe_prompt_visible());
        assert_eq!(sched.due_at(TimerKind::StillNode), Some(35000));

        wd.on_node_exit(5, NodeKind::Still, &mut sched, &mut video);
        assert_eq!(sched.live_count(), 0);
    }

    #[test]
    fn no_idle_timer_on_attract_or_mid_transition() {
        let mut wd = Watchdog::new(&KioskConfig::default());
        let mut sched = Scheduler::new();
        assert!(!wd.rearm(ctx(0, NodeKind::Attract), 0, &mut sched));
        let moving = IdleContext {
            transitioning: true,
            ..ctx(2, NodeKind::Panel)
        };
        assert!(!wd.rearm(moving, 0, &mut sched));
        assert_eq!(sched.live_count(), 0);
    }
}
