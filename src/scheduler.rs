//! Cancellable one-shot timers keyed by category.
//!
//! Each [`TimerKind`] holds at most one live task; scheduling a kind that is
//! already live replaces it. Nothing fires on its own: the frame loop drains
//! due tasks with [`Scheduler::take_due`] and dispatches their actions.

use std::collections::BTreeMap;

use crate::timing::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKind {
    Transition,
    Inactivity,
    /// Swipe-up prompt and playthrough expiry for one node's video.
    SwipeUp { node: usize },
    Unmute { node: usize },
    StillNode,
    PeriodicBoost,
    SpeedBoostDecay,
    ResetStep,
}

impl TimerKind {
    /// Timers owned by the node in view; a node change cancels all of them.
    pub fn is_per_node(&self) -> bool {
        matches!(
            self,
            TimerKind::Inactivity
                | TimerKind::SwipeUp { .. }
                | TimerKind::Unmute { .. }
                | TimerKind::StillNode
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetStep {
    FadeOut,
    Restore,
    FadeInDone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    CompleteTransition,
    InactivityExpired,
    RevealVideoPrompt { node: usize },
    PlaythroughsDone { node: usize },
    Unmute { node: usize },
    RevealStillPrompt,
    StillNodeExpired,
    StartPeriodicBoost,
    EndSpeedBoost,
    Reset(ResetStep),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskHandle {
    kind: TimerKind,
    id: u64,
}

impl TaskHandle {
    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    /// Cancels this task if it is still the live one for its kind.
    pub fn cancel(self, scheduler: &mut Scheduler) -> bool {
        let live = scheduler
            .tasks
            .get(&self.kind)
            .is_some_and(|task| task.id == self.id);
        if live {
            scheduler.tasks.remove(&self.kind);
        }
        live
    }
}

/// A task taken off the registry, with the time it was due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueTask {
    pub kind: TimerKind,
    pub action: TimerAction,
    pub due_ms: Millis,
}

#[derive(Debug, Clone, Copy)]
struct ScheduledTask {
    id: u64,
    due_ms: Millis,
    action: TimerAction,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: BTreeMap<TimerKind, ScheduledTask>,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel whatever is live for `kind` and schedule `action` after `delay_ms`.
    pub fn schedule(
        &mut self,
        kind: TimerKind,
        now: Millis,
        delay_ms: Millis,
        action: TimerAction,
    ) -> TaskHandle {
        let id = self.next_id;
        self.next_id += 1;
        // A zero delay would be due inside the drain that scheduled it.
        let due_ms = now + delay_ms.max(1);
        self.tasks.insert(kind, ScheduledTask { id, due_ms, action });
        TaskHandle { kind, id }
    }

    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        self.tasks.remove(&kind).is_some()
    }

    pub fn cancel_per_node(&mut self) {
        self.tasks.retain(|kind, _| !kind.is_per_node());
    }

    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    pub fn is_live(&self, kind: TimerKind) -> bool {
        self.tasks.contains_key(&kind)
    }

    pub fn due_at(&self, kind: TimerKind) -> Option<Millis> {
        self.tasks.get(&kind).map(|t| t.due_ms)
    }

    pub fn live_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn live_per_node(&self) -> usize {
        self.tasks.keys().filter(|k| k.is_per_node()).count()
    }

    pub fn live_kinds(&self) -> Vec<TimerKind> {
        self.tasks.keys().copied().collect()
    }

    /// Remove and return the earliest task due at or before `now`.
    /// Ties go to the task scheduled first.
    pub fn take_due(&mut self, now: Millis) -> Option<DueTask> {
        let kind = self
            .tasks
            .iter()
            .filter(|(_, task)| task.due_ms <= now)
            .min_by_key(|(_, task)| (task.due_ms, task.id))
            .map(|(kind, _)| *kind)?;
        self.tasks.remove(&kind).map(|task| DueTask {
            kind,
            action: task.action,
            due_ms: task.due_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_replaces_live_task_of_same_kind() {
        let mut s = Scheduler::new();
        s.schedule(TimerKind::Inactivity, 0, 100, TimerAction::InactivityExpired);
        s.schedule(TimerKind::Inactivity, 50, 100, TimerAction::InactivityExpired);
        assert_eq!(s.live_count(), 1);
        assert_eq!(s.due_at(TimerKind::Inactivity), Some(150));
        assert_eq!(s.take_due(120), None);
        assert_eq!(
            s.take_due(160),
            Some(DueTask {
                kind: TimerKind::Inactivity,
                action: TimerAction::InactivityExpired,
                due_ms: 150,
            })
        );
    }

    #[test]
    fn stale_handle_does_not_cancel_replacement() {
        let mut s = Scheduler::new();
        let old = s.schedule(TimerKind::StillNode, 0, 10, TimerAction::RevealStillPrompt);
        let new = s.schedule(TimerKind::StillNode, 5, 10, TimerAction::StillNodeExpired);
        assert!(!old.cancel(&mut s));
        assert!(s.is_live(TimerKind::StillNode));
        assert!(new.cancel(&mut s));
        assert!(!s.is_live(TimerKind::StillNode));
    }

    #[test]
    fn take_due_orders_by_due_time_then_schedule_order() {
        let mut s = Scheduler::new();
        s.schedule(TimerKind::ResetStep, 0, 30, TimerAction::Reset(ResetStep::FadeOut));
        s.schedule(TimerKind::Transition, 0, 10, TimerAction::CompleteTransition);
        s.schedule(TimerKind::SpeedBoostDecay, 0, 10, TimerAction::EndSpeedBoost);

        let order: Vec<TimerKind> =
            std::iter::from_fn(|| s.take_due(100).map(|t| t.kind)).collect();
        assert_eq!(
            order,
            vec![
                TimerKind::Transition,
                TimerKind::SpeedBoostDecay,
                TimerKind::ResetStep
            ]
        );
    }

    #[test]
    fn cancel_per_node_keeps_global_timers() {
        let mut s = Scheduler::new();
        s.schedule(TimerKind::Inactivity, 0, 10, TimerAction::InactivityExpired);
        s.schedule(
            TimerKind::SwipeUp { node: 2 },
            0,
            10,
            TimerAction::RevealVideoPrompt { node: 2 },
        );
        s.schedule(TimerKind::PeriodicBoost, 0, 10, TimerAction::StartPeriodicBoost);
        s.cancel_per_node();
        assert_eq!(s.live_per_node(), 0);
        assert_eq!(s.live_kinds(), vec![TimerKind::PeriodicBoost]);
    }

    #[test]
    fn zero_delay_is_clamped() {
        let mut s = Scheduler::new();
        s.schedule(TimerKind::Transition, 40, 0, TimerAction::CompleteTransition);
        assert_eq!(s.take_due(40), None);
        assert!(s.take_due(41).is_some());
    }
}
