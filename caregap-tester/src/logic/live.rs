//! Real-time play: drives one run on a wall-clock interval and streams what
//! happens to a writer, the way a player would see it.
use std::io::Write;
use std::time::Duration;

use anyhow::{Result, bail};
use caregap_game::report::{board_export, dash_export, journey_export};
use caregap_game::{
    BoardAction, BoardRun, DashAction, DashOutcome, DashRun, JourneyAction, JourneyRun, Outcome,
    PatientId, SimVariant, share_query,
};
use log::debug;
use tokio::time::{MissedTickBehavior, interval};

use crate::logic::game_tester::GameTester;
use crate::logic::policy::{GameplayStrategy, PlayerPolicy};

/// How a live session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveReport {
    pub variant: SimVariant,
    pub seed: u64,
    pub ticks: u64,
    pub finished: bool,
    pub interrupted: bool,
    pub export: String,
}

enum LiveRun {
    Journey(JourneyRun),
    Board(BoardRun),
    Dash(DashRun),
}

impl LiveRun {
    fn is_done(&self) -> bool {
        match self {
            Self::Journey(run) => run.is_terminal(),
            Self::Board(run) => run.is_terminal(),
            Self::Dash(run) => run.is_finished(),
        }
    }

    fn export(&self) -> String {
        match self {
            Self::Journey(run) => journey_export(&run.summary()),
            Self::Board(run) => board_export(&run.summary()),
            Self::Dash(run) => dash_export(run),
        }
    }

    /// One interval's worth of play. Returns the lines to print.
    fn frame(&mut self, policy: &mut dyn PlayerPolicy) -> Vec<String> {
        match self {
            Self::Journey(run) => journey_frame(run, policy),
            Self::Board(run) => board_frame(run, policy),
            Self::Dash(run) => dash_frame(run, policy),
        }
    }
}

/// Resolution is left to the countdown; only advances and interventions are
/// requested explicitly.
fn journey_frame(run: &mut JourneyRun, policy: &mut dyn PlayerPolicy) -> Vec<String> {
    let action = match policy.next_journey(run) {
        JourneyAction::Resolve => JourneyAction::Tick,
        other => other,
    };
    let outcome = run.apply(action);
    let mut lines = Vec::new();
    match outcome {
        Outcome::Advanced => {
            let view = run.view();
            lines.push(format!("📍 {}", view.current_step));
            for (id, patient) in PatientId::ALL.into_iter().zip(&view.patients) {
                match &patient.pending {
                    Some(effect) => lines.push(format!(
                        "   {}: {} ({})",
                        id.label(),
                        effect.headline(),
                        effect.effect_line()
                    )),
                    None => lines.push(format!("   {}: no delay this step", id.label())),
                }
            }
        }
        Outcome::Counting(left) => lines.push(format!("   ⏳ resolving in {left}s")),
        Outcome::Intervened(kind) => {
            lines.push(format!("   🛡️ used {}", run.catalog().support_label(kind)));
        }
        Outcome::Resolved | Outcome::Finished => {
            for id in PatientId::ALL {
                let patient = run.patient(id);
                if let Some(entry) = patient.log.latest() {
                    lines.push(format!(
                        "   {}: {} ({} days total)",
                        id.label(),
                        entry.title,
                        patient.delay
                    ));
                }
            }
            if outcome == Outcome::Finished {
                lines.push(format!("🏁 equity gap {} days", run.summary().equity_gap));
            }
        }
        Outcome::Updated | Outcome::Ignored(_) => debug!("journey frame: {outcome:?}"),
    }
    lines
}

fn board_frame(run: &mut BoardRun, policy: &mut dyn PlayerPolicy) -> Vec<String> {
    let action = match policy.next_board(run) {
        BoardAction::Resolve => BoardAction::Tick,
        other => other,
    };
    let outcome = run.apply(action);
    let mut lines = Vec::new();
    match outcome {
        Outcome::Advanced => {
            let view = run.view();
            let roll = view.last_roll.unwrap_or_default();
            lines.push(format!("🎲 turn {}: rolled {roll}", view.turn));
            if let Some(card) = view.pending {
                lines.push(format!(
                    "   {} draws {} ({:+} spaces)",
                    card.player, card.title, card.spaces
                ));
            }
        }
        Outcome::Counting(left) => lines.push(format!("   ⏳ resolving in {left}s")),
        Outcome::Intervened(kind) => {
            lines.push(format!("   🛡️ used {}", run.catalog().support_label(kind)));
        }
        Outcome::Resolved | Outcome::Finished => {
            let view = run.view();
            let positions = view
                .players
                .iter()
                .map(|p| format!("{}@{}", p.id, p.position))
                .collect::<Vec<_>>()
                .join("  ");
            lines.push(format!("   {positions}"));
            if let Some(winner) = view.winner {
                lines.push(format!("🏁 {winner} reaches treatment first"));
            }
        }
        Outcome::Updated | Outcome::Ignored(_) => debug!("board frame: {outcome:?}"),
    }
    lines
}

fn dash_frame(run: &mut DashRun, policy: &mut dyn PlayerPolicy) -> Vec<String> {
    if let Some(input) = policy.next_dash(run) {
        run.apply(DashAction::Input(input));
    }
    let before = run.display_seconds();
    match run.apply(DashAction::Tick) {
        DashOutcome::Finished(ending) => vec![format!(
            "🏁 {} (score {}, coins {})",
            ending.title(),
            run.score(),
            run.coins()
        )],
        _ if run.display_seconds() != before => vec![format!(
            "   ⏱️ {}s  score {}  shield {}",
            run.display_seconds(),
            run.score(),
            run.shield()
        )],
        _ => Vec::new(),
    }
}

/// Play `seed` in real time, one frame per `tick`, until the run ends,
/// `max_frames` pass, or Ctrl-C.
///
/// # Errors
///
/// Returns an error if the run cannot be created or output cannot be written.
pub async fn run_live<W: Write>(
    tester: &GameTester,
    variant: SimVariant,
    strategy: GameplayStrategy,
    seed: u64,
    tick: Duration,
    max_frames: u64,
    out: &mut W,
) -> Result<LiveReport> {
    if tick.is_zero() {
        bail!("live tick must be longer than zero");
    }
    let assets = tester.assets();
    let mut run = match variant {
        SimVariant::Journey => LiveRun::Journey(
            JourneyRun::new(seed, assets.config().journey.clone()).with_auto_resolve(true),
        ),
        SimVariant::Board => LiveRun::Board(
            BoardRun::new(seed, assets.config().board.clone()).with_auto_resolve(true),
        ),
        SimVariant::Dash => LiveRun::Dash(DashRun::new(seed)),
    };
    let mut policy = strategy.create_policy();

    writeln!(
        out,
        "▶️ {} · seed {seed} ({}) · {}",
        variant.title(),
        share_query(seed),
        policy.name()
    )?;

    let mut timer = interval(tick);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut ticks = 0;
    let mut interrupted = false;
    while !run.is_done() && ticks < max_frames {
        tokio::select! {
            _ = timer.tick() => {
                ticks += 1;
                for line in run.frame(policy.as_mut()) {
                    writeln!(out, "{line}")?;
                }
            }
            _ = &mut ctrl_c => {
                interrupted = true;
                writeln!(out, "⏸️ interrupted after {ticks} frames")?;
                break;
            }
        }
    }
    out.flush()?;

    Ok(LiveReport {
        variant,
        seed,
        ticks,
        finished: run.is_done(),
        interrupted,
        export: run.export(),
    })
}
