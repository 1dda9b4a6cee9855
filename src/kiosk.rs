//! The kiosk controller.
//!
//! Owns every piece of session state and is the only place that moves the
//! node machine. All entry points take the current session time so the whole
//! automaton can be driven deterministically without a terminal.

use tracing::{debug, info, warn};

use crate::background::BackgroundAnimator;
use crate::config::{KioskConfig, NodeKind};
use crate::emoji::EmojiCounters;
use crate::error::Result;
use crate::gesture::{classify, Direction, Gesture, GestureTracker, NavRejection, TouchEvent};
use crate::host::{AudioSink, Sound, VideoHost};
use crate::node_machine::{NodeMachine, NodeState, ShowRejected, Transition};
use crate::scheduler::{ResetStep, Scheduler, TimerAction, TimerKind};
use crate::session::{Fade, ResetTrigger, SessionState};
use crate::timing::Millis;
use crate::watchdog::{IdleContext, Watchdog};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    Moved(Transition),
    ResetStarted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchOutcome {
    /// Touch start, cancel, or malformed input.
    Ignored,
    Tap,
    Navigated(NavOutcome),
    Rejected(NavRejection),
}

pub struct Kiosk<V: VideoHost, A: AudioSink> {
    config: KioskConfig,
    machine: NodeMachine,
    background: BackgroundAnimator,
    watchdog: Watchdog,
    emoji: EmojiCounters,
    gesture: GestureTracker,
    scheduler: Scheduler,
    session: SessionState,
    video: V,
    audio: A,
}

impl<V: VideoHost, A: AudioSink> Kiosk<V, A> {
    /// `cycle_heights` is the one-cycle content height of each background column.
    pub fn new(config: KioskConfig, cycle_heights: &[f64], video: V, audio: A) -> Result<Self> {
        config.validate()?;
        let mut kiosk = Self {
            machine: NodeMachine::new(config.node_count),
            background: BackgroundAnimator::new(&config, cycle_heights),
            watchdog: Watchdog::new(&config),
            emoji: EmojiCounters::new(&config),
            gesture: GestureTracker::new(),
            scheduler: Scheduler::new(),
            session: SessionState::default(),
            config,
            video,
            audio,
        };
        kiosk.reset_to_start(0);
        Ok(kiosk)
    }

    pub fn config(&self) -> &KioskConfig {
        &self.config
    }

    pub fn state(&self) -> NodeState {
        self.machine.state()
    }

    pub fn machine(&self) -> &NodeMachine {
        &self.machine
    }

    pub fn current_node(&self) -> usize {
        self.machine.current()
    }

    pub fn current_kind(&self) -> NodeKind {
        self.config.node_kind(self.machine.current())
    }

    pub fn is_transitioning(&self) -> bool {
        self.machine.is_transitioning()
    }

    pub fn background(&self) -> &BackgroundAnimator {
        &self.background
    }

    pub fn watchdog(&self) -> &Watchdog {
        &self.watchdog
    }

    pub fn emoji(&self) -> &EmojiCounters {
        &self.emoji
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn video(&self) -> &V {
        &self.video
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn set_cycle_heights(&mut self, heights: &[f64]) {
        self.background.set_cycle_heights(heights);
    }

    fn idle_context(&self) -> IdleContext {
        IdleContext {
            node: self.machine.current(),
            kind: self.current_kind(),
            transitioning: self.machine.is_transitioning(),
            resetting: self.session.reset.is_some(),
        }
    }

    fn play(&mut self, sound: Sound) {
        if let Err(e) = self.audio.play(sound) {
            warn!(%sound, error = %e, "sound failed");
        }
    }

    pub fn touch(&mut self, event: TouchEvent, now: Millis) -> TouchOutcome {
        match event {
            TouchEvent::Start { touches, y } => {
                self.gesture.start(touches, y);
                TouchOutcome::Ignored
            }
            TouchEvent::Cancel => {
                self.gesture.cancel();
                TouchOutcome::Ignored
            }
            TouchEvent::End { touches, y } => {
                let Some(distance) = self.gesture.end(touches, y) else {
                    return TouchOutcome::Ignored;
                };
                match classify(distance, self.config.min_swipe_distance) {
                    Gesture::Tap => {
                        let ctx = self.idle_context();
                        self.watchdog.rearm(ctx, now, &mut self.scheduler);
                        TouchOutcome::Tap
                    }
                    Gesture::Swipe { direction, .. } => match self.navigate(direction, now) {
                        Ok(outcome) => TouchOutcome::Navigated(outcome),
                        Err(rejection) => TouchOutcome::Rejected(rejection),
                    },
                }
            }
        }
    }

    /// Act on a classified swipe. Rejections change nothing.
    pub fn navigate(
        &mut self,
        direction: Direction,
        now: Millis,
    ) -> std::result::Result<NavOutcome, NavRejection> {
        let result = self.try_navigate(direction, now);
        if let Err(rejection) = &result {
            debug!(%direction, %rejection, "swipe rejected");
        }
        result
    }

    fn try_navigate(
        &mut self,
        direction: Direction,
        now: Millis,
    ) -> std::result::Result<NavOutcome, NavRejection> {
        if self.session.reset.is_some() {
            return Err(NavRejection::ResetInFlight);
        }
        if self.machine.is_transitioning() {
            return Err(NavRejection::Transitioning);
        }
        let current = self.machine.current();
        if current != 0 {
            if let Some(remaining_ms) = self
                .session
                .lockout_remaining(now, self.config.lockout_ms)
            {
                return Err(NavRejection::Lockout { remaining_ms });
            }
        }
        let target = current as isize + direction.sign();
        if target < 0 || target >= self.config.node_count as isize {
            return Err(ShowRejected::OutOfRange {
                target,
                node_count: self.config.node_count,
            }
            .into());
        }

        self.play(Sound::Swipe);
        self.session.last_interaction_ms = now;
        self.background.start_swipe_boost(now, direction);
        self.scheduler.schedule(
            TimerKind::SpeedBoostDecay,
            now,
            self.config.speed_transition_duration_ms,
            TimerAction::EndSpeedBoost,
        );

        if current == self.config.terminal_node() && direction == Direction::Forward {
            self.begin_reset(ResetTrigger::TerminalSwipe, now);
            return Ok(NavOutcome::ResetStarted);
        }
        Ok(NavOutcome::Moved(self.show(target, false, now)?))
    }

    /// Start an ordinary slide to `target`.
    pub fn request_show(
        &mut self,
        target: isize,
        now: Millis,
    ) -> std::result::Result<Transition, ShowRejected> {
        self.show(target, false, now)
    }

    fn show(
        &mut self,
        target: isize,
        is_reset: bool,
        now: Millis,
    ) -> std::result::Result<Transition, ShowRejected> {
        let from_kind = self.current_kind();
        let transition = self.machine.request_show(target, is_reset, now)?;

        self.scheduler.cancel_per_node();
        self.watchdog
            .on_node_exit(transition.from, from_kind, &mut self.scheduler, &mut self.video);
        self.session.attract_prompt_visible = transition.to == 0;

        let delay = if is_reset {
            self.config.reset_transition_delay_ms
        } else {
            self.config.transition_delay_ms
        };
        self.scheduler.schedule(
            TimerKind::Transition,
            now,
            delay,
            TimerAction::CompleteTransition,
        );
        info!(
            from = transition.from,
            to = transition.to,
            is_reset,
            "transition started"
        );
        Ok(transition)
    }

    fn complete_transition(&mut self, now: Millis) {
        let Some(node) = self.machine.complete(now) else {
            return;
        };
        info!(node, "node in view");
        let ctx = self.idle_context();
        self.watchdog
            .on_node_enter(ctx, now, &mut self.scheduler, &mut self.video);
    }

    /// Start the reset choreography. Returns false when one is already running.
    pub fn begin_reset(&mut self, trigger: ResetTrigger, now: Millis) -> bool {
        if self.session.reset.is_some() {
            return false;
        }
        self.session.reset = Some(trigger);
        self.scheduler.cancel_per_node();
        info!(%trigger, "reset sequence started");

        let via_closing =
            trigger == ResetTrigger::TerminalSwipe || self.config.timeout_reset_via_closing;
        if via_closing {
            let closing = self.config.closing_node();
            if self.machine.current() != closing {
                if let Err(e) = self.show(closing as isize, true, now) {
                    debug!(error = %e, "closing node skipped");
                }
            }
            self.scheduler.schedule(
                TimerKind::ResetStep,
                now,
                self.config.reset_delay_ms,
                TimerAction::Reset(ResetStep::FadeOut),
            );
        } else {
            self.run_reset_step(ResetStep::FadeOut, now);
        }
        true
    }

    fn run_reset_step(&mut self, step: ResetStep, now: Millis) {
        match step {
            ResetStep::FadeOut if self.config.reset_fade => {
                self.session.fade = Fade::Out { since_ms: now };
                self.scheduler.schedule(
                    TimerKind::ResetStep,
                    now,
                    self.config.fade_duration_ms,
                    TimerAction::Reset(ResetStep::Restore),
                );
            }
            ResetStep::FadeOut | ResetStep::Restore => {
                self.reset_to_start(now);
                if self.config.reset_fade {
                    self.session.fade = Fade::In { since_ms: now };
                    self.scheduler.schedule(
                        TimerKind::ResetStep,
                        now,
                        self.config.fade_duration_ms,
                        TimerAction::Reset(ResetStep::FadeInDone),
                    );
                }
            }
            ResetStep::FadeInDone => self.session.fade = Fade::None,
        }
    }

    /// Put everything back to a fresh-load state on the attract screen.
    pub fn reset_to_start(&mut self, now: Millis) {
        // Timeout resets fade straight out of the node in view, so it is left here.
        let current = self.machine.current();
        let kind = self.current_kind();
        self.watchdog
            .on_node_exit(current, kind, &mut self.scheduler, &mut self.video);
        self.machine.reset(now);
        self.scheduler.cancel_all();
        self.watchdog.reset(&mut self.video);
        self.background.reset();
        self.emoji.randomize();
        self.gesture.cancel();
        self.session.fade = Fade::None;
        self.session.reset = None;
        self.session.attract_prompt_visible = true;
        info!("reset to attract screen");
    }

    /// Tap an emoji counter. Only content nodes take taps.
    pub fn tap_emoji(&mut self, index: usize, now: Millis) -> bool {
        let current = self.machine.current();
        if self.machine.is_transitioning()
            || self.session.reset.is_some()
            || current == 0
            || current >= self.config.closing_node()
            || index >= self.emoji.counters.len()
        {
            return false;
        }
        self.play(Sound::Tap);
        self.emoji.tap(index, now);
        self.session.last_interaction_ms = now;
        let ctx = self.idle_context();
        self.watchdog.rearm(ctx, now, &mut self.scheduler);
        true
    }

    /// One repaint: fire due timers, keep the attract boost armed, move the background.
    pub fn on_frame(&mut self, now: Millis) {
        self.session.last_frame_ms = now;
        self.fire_due_timers(now);

        let on_attract = self.machine.current() == 0;
        if on_attract {
            if !self.scheduler.is_live(TimerKind::PeriodicBoost) {
                self.scheduler.schedule(
                    TimerKind::PeriodicBoost,
                    now,
                    self.config.periodic_boost_interval_ms,
                    TimerAction::StartPeriodicBoost,
                );
            }
        } else {
            self.scheduler.cancel(TimerKind::PeriodicBoost);
            self.background.stop_periodic_boost();
        }

        self.background.advance(now, on_attract);
        self.emoji.update(now);
    }

    /// Drain every timer due by `now`, each handled at its own due time.
    pub fn fire_due_timers(&mut self, now: Millis) {
        while let Some(task) = self.scheduler.take_due(now) {
            debug!(kind = ?task.kind, due = task.due_ms, "timer fired");
            self.dispatch(task.action, task.due_ms);
        }
    }

    fn dispatch(&mut self, action: TimerAction, at: Millis) {
        let current = self.machine.current();
        let settled = !self.machine.is_transitioning() && self.session.reset.is_none();
        match action {
            TimerAction::CompleteTransition => self.complete_transition(at),
            TimerAction::InactivityExpired => {
                if current != 0 && settled && !self.watchdog.is_video_playing() {
                    self.begin_reset(ResetTrigger::Inactivity, at);
                }
            }
            TimerAction::RevealVideoPrompt { node } => {
                if let NodeKind::Video { duration_ms } = self.current_kind() {
                    if current == node && settled {
                        self.watchdog
                            .reveal_video_prompt(node, duration_ms, at, &mut self.scheduler);
                    }
                }
            }
            TimerAction::PlaythroughsDone { node } => {
                if current == node && settled {
                    self.watchdog.end_playback(node, &mut self.video);
                    let ctx = self.idle_context();
                    self.watchdog.rearm(ctx, at, &mut self.scheduler);
                }
            }
            TimerAction::Unmute { node } => self.video.set_muted(node, false),
            TimerAction::RevealStillPrompt => {
                if settled && self.current_kind() == NodeKind::Still {
                    self.watchdog.reveal_still_prompt(at, &mut self.scheduler);
                }
            }
            TimerAction::StillNodeExpired => {
                if settled && self.current_kind() == NodeKind::Still {
                    self.begin_reset(ResetTrigger::StillTimeout, at);
                }
            }
            TimerAction::StartPeriodicBoost => {
                if current == 0 {
                    self.background.start_periodic_boost(at);
                    self.scheduler.schedule(
                        TimerKind::PeriodicBoost,
                        at,
                        self.config.periodic_boost_interval_ms,
                        TimerAction::StartPeriodicBoost,
                    );
                }
            }
            TimerAction::EndSpeedBoost => self.background.end_swipe_boost(),
            TimerAction::Reset(step) => self.run_reset_step(step, at),
        }
    }
}
