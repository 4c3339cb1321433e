//! Loop phase, pause flag, and the single-slot auto-resolve countdown shared by
//! the turn-based variants.
use serde::{Deserialize, Serialize};

use crate::catalog::SupportKind;

/// Progression state machine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopPhase {
    #[default]
    AwaitingStep,
    PendingResolution,
    Resolved,
    Terminal,
}

impl LoopPhase {
    #[must_use]
    pub const fn accepts_advance(self) -> bool {
        matches!(self, Self::AwaitingStep | Self::Resolved)
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Terminal)
    }
}

/// Why a request left the run untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ignored {
    Terminal,
    Paused,
    WrongPhase,
    NoPendingEvent,
    NoCoveringToken,
    NoScheduledTask,
    Unchanged,
}

/// What a request did to a turn-based run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Advanced,
    Counting(u32),
    Resolved,
    Intervened(SupportKind),
    Updated,
    /// The request moved the run into `Terminal`.
    Finished,
    Ignored(Ignored),
}

impl Outcome {
    #[must_use]
    pub const fn is_ignored(self) -> bool {
        matches!(self, Self::Ignored(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    AutoResolve,
}

/// A scheduled callback with whole-second granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub kind: TaskKind,
    pub remaining_secs: u32,
}

/// Result of a countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickResult {
    Idle,
    Counting(u32),
    Fired(TaskKind),
}

/// Loop bookkeeping embedded in every turn-based run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoopControl {
    pub phase: LoopPhase,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub auto_resolve: bool,
    #[serde(default)]
    pending_task: Option<ScheduledTask>,
}

impl LoopControl {
    #[must_use]
    pub fn new(auto_resolve: bool) -> Self {
        Self {
            auto_resolve,
            ..Self::default()
        }
    }

    /// Guard shared by every advance request.
    ///
    /// # Errors
    ///
    /// Returns the reason the advance must be ignored.
    pub const fn check_advance(&self) -> Result<(), Ignored> {
        if self.phase.is_terminal() {
            return Err(Ignored::Terminal);
        }
        if self.paused {
            return Err(Ignored::Paused);
        }
        if !self.phase.accepts_advance() {
            return Err(Ignored::WrongPhase);
        }
        Ok(())
    }

    /// Enter `PendingResolution`, scheduling an auto-resolve when enabled.
    pub fn begin_pending(&mut self, countdown_secs: u32) {
        self.phase = LoopPhase::PendingResolution;
        if self.auto_resolve {
            self.schedule(TaskKind::AutoResolve, countdown_secs);
        } else {
            self.cancel();
        }
    }

    /// Enter `Resolved` and drop any outstanding countdown.
    pub fn finish_resolution(&mut self) {
        self.cancel();
        self.phase = LoopPhase::Resolved;
    }

    /// Move to `Terminal`; returns `false` when the run was already terminal.
    pub fn mark_terminal(&mut self) -> bool {
        self.cancel();
        if self.phase.is_terminal() {
            return false;
        }
        self.phase = LoopPhase::Terminal;
        true
    }

    /// Place a task in the single slot, replacing whatever was there.
    pub fn schedule(&mut self, kind: TaskKind, secs: u32) -> Option<ScheduledTask> {
        self.pending_task.replace(ScheduledTask {
            kind,
            remaining_secs: secs.max(1),
        })
    }

    /// Clear the slot.
    pub fn cancel(&mut self) -> Option<ScheduledTask> {
        self.pending_task.take()
    }

    #[must_use]
    pub const fn pending_task(&self) -> Option<ScheduledTask> {
        self.pending_task
    }

    /// Seconds left on the countdown, if one is running.
    #[must_use]
    pub fn time_remaining(&self) -> Option<u32> {
        self.pending_task.map(|task| task.remaining_secs)
    }

    /// Advance the countdown by one second. Ticks while paused are dropped.
    pub fn tick(&mut self) -> TickResult {
        if self.paused || self.phase.is_terminal() {
            return TickResult::Idle;
        }
        let Some(task) = self.pending_task.as_mut() else {
            return TickResult::Idle;
        };
        task.remaining_secs = task.remaining_secs.saturating_sub(1);
        if task.remaining_secs == 0 {
            let kind = task.kind;
            self.pending_task = None;
            TickResult::Fired(kind)
        } else {
            TickResult::Counting(task.remaining_secs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_guard_orders_reasons() {
        let mut control = LoopControl::new(false);
        assert_eq!(control.check_advance(), Ok(()));
        control.paused = true;
        assert_eq!(control.check_advance(), Err(Ignored::Paused));
        control.paused = false;
        control.begin_pending(5);
        assert_eq!(control.check_advance(), Err(Ignored::WrongPhase));
        control.finish_resolution();
        assert_eq!(control.check_advance(), Ok(()));
        assert!(control.mark_terminal());
        assert_eq!(control.check_advance(), Err(Ignored::Terminal));
    }

    #[test]
    fn countdown_fires_after_full_duration() {
        let mut control = LoopControl::new(true);
        control.begin_pending(3);
        assert_eq!(control.time_remaining(), Some(3));
        assert_eq!(control.tick(), TickResult::Counting(2));
        assert_eq!(control.tick(), TickResult::Counting(1));
        assert_eq!(control.tick(), TickResult::Fired(TaskKind::AutoResolve));
        assert_eq!(control.time_remaining(), None);
        assert_eq!(control.tick(), TickResult::Idle);
    }

    #[test]
    fn ticks_during_pause_are_dropped() {
        let mut control = LoopControl::new(true);
        control.begin_pending(2);
        control.paused = true;
        for _ in 0..10 {
            assert_eq!(control.tick(), TickResult::Idle);
        }
        assert_eq!(control.time_remaining(), Some(2));
        control.paused = false;
        assert_eq!(control.tick(), TickResult::Counting(1));
    }

    #[test]
    fn scheduling_replaces_previous_task() {
        let mut control = LoopControl::new(true);
        control.schedule(TaskKind::AutoResolve, 5);
        control.tick();
        let previous = control.schedule(TaskKind::AutoResolve, 5);
        assert_eq!(previous.map(|t| t.remaining_secs), Some(4));
        assert_eq!(control.time_remaining(), Some(5));
        assert!(control.cancel().is_some());
        assert!(control.cancel().is_none());
    }

    #[test]
    fn manual_mode_never_schedules() {
        let mut control = LoopControl::new(false);
        control.begin_pending(5);
        assert_eq!(control.phase, LoopPhase::PendingResolution);
        assert!(control.pending_task().is_none());
    }

    #[test]
    fn terminal_happens_once() {
        let mut control = LoopControl::new(true);
        control.begin_pending(5);
        assert!(control.mark_terminal());
        assert!(!control.mark_terminal());
        assert!(control.pending_task().is_none());
    }
}
