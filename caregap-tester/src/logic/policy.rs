use std::fmt;
use std::str::FromStr;

use caregap_game::{
    BoardAction, BoardRun, DashInput, DashRun, JourneyAction, JourneyRun, LoopPhase, PatientId,
};

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Next request for a journey that is not terminal.
    fn next_journey(&mut self, run: &JourneyRun) -> JourneyAction;

    /// Next request for a board race that is not terminal.
    fn next_board(&mut self, run: &BoardRun) -> BoardAction;

    /// Input to send before the next dash frame, if any.
    fn next_dash(&mut self, run: &DashRun) -> Option<DashInput>;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameplayStrategy {
    /// Accept every delay; no tokens spent, no dash input.
    Baseline,
    /// Spend a covering token whenever one is available; dash with the pilot.
    Advocate,
}

impl GameplayStrategy {
    pub const ALL: [Self; 2] = [Self::Baseline, Self::Advocate];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Baseline => "Baseline",
            Self::Advocate => "Advocate",
        }
    }

    #[must_use]
    pub fn create_policy(self) -> Box<dyn PlayerPolicy + Send> {
        match self {
            Self::Baseline => Box::new(BaselinePolicy),
            Self::Advocate => Box::new(AdvocatePolicy),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GameplayStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "baseline" | "passive" => Ok(Self::Baseline),
            "advocate" | "intervene" | "pilot" => Ok(Self::Advocate),
            other => Err(format!("unknown strategy: {other}")),
        }
    }
}

const fn journey_step(run: &JourneyRun) -> JourneyAction {
    match run.phase() {
        LoopPhase::PendingResolution => JourneyAction::Resolve,
        _ => JourneyAction::Advance,
    }
}

const fn board_step(run: &BoardRun) -> BoardAction {
    match run.phase() {
        LoopPhase::PendingResolution => BoardAction::Resolve,
        _ => BoardAction::Roll,
    }
}

struct BaselinePolicy;

impl PlayerPolicy for BaselinePolicy {
    fn name(&self) -> &'static str {
        "baseline"
    }

    fn next_journey(&mut self, run: &JourneyRun) -> JourneyAction {
        journey_step(run)
    }

    fn next_board(&mut self, run: &BoardRun) -> BoardAction {
        board_step(run)
    }

    fn next_dash(&mut self, _run: &DashRun) -> Option<DashInput> {
        None
    }
}

struct AdvocatePolicy;

impl PlayerPolicy for AdvocatePolicy {
    fn name(&self) -> &'static str {
        "advocate"
    }

    fn next_journey(&mut self, run: &JourneyRun) -> JourneyAction {
        if run.phase() == LoopPhase::PendingResolution {
            let view = run.view();
            let covered = PatientId::ALL.into_iter().find(|id| {
                view.patients[id.index()]
                    .pending
                    .as_ref()
                    .is_some_and(|effect| effect.can_intervene)
            });
            if let Some(id) = covered {
                return JourneyAction::Intervene(id);
            }
        }
        journey_step(run)
    }

    fn next_board(&mut self, run: &BoardRun) -> BoardAction {
        if let Some(pending) = run.pending()
            && run.view().pending.is_some_and(|card| card.can_intervene)
        {
            return BoardAction::Intervene(pending.player);
        }
        board_step(run)
    }

    fn next_dash(&mut self, run: &DashRun) -> Option<DashInput> {
        run.pilot_input()
    }
}
