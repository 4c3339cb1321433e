use std::convert::Infallible;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use caregap_game::report::{board_export, dash_export, journey_export};
use caregap_game::{
    BoardRun, BoardSummary, Catalog, DashAction, DashEnding, DashOutcome, DashRun, DashStats,
    DataLoader, JourneyRun, JourneySummary, MemoryStorage, Outcome, PolicyLevers, SimConfig,
    SimEngine, SimVariant, Snapshot, SnapshotStorage,
};

use crate::logic::policy::{GameplayStrategy, PlayerPolicy};

/// Hard stop for a single headless run.
pub const DEFAULT_ACTION_LIMIT: usize = 5_000;
const SNAPSHOT_SLOT: &str = "tester-midpoint";

/// Immutable content and tuning shared by every simulated run.
#[derive(Debug, Clone)]
pub struct TesterAssets {
    config: SimConfig,
    catalog: Catalog,
}

impl TesterAssets {
    #[must_use]
    pub fn load_default() -> Self {
        Self::with_config(SimConfig::default())
    }

    #[must_use]
    pub fn with_config(config: SimConfig) -> Self {
        Self {
            config,
            catalog: Catalog::load_from_static(),
        }
    }

    /// Read a JSON tuning document; missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails validation.
    pub fn from_config_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = SimConfig::from_json(&json)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(Self::with_config(config))
    }

    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }
}

impl DataLoader for TesterAssets {
    type Error = Infallible;

    fn load_catalog(&self) -> Result<Catalog, Self::Error> {
        Ok(self.catalog.clone())
    }

    fn load_config(&self) -> Result<SimConfig, Self::Error> {
        Ok(self.config.clone())
    }
}

type TesterEngine = SimEngine<TesterAssets, MemoryStorage>;

/// Declarative plan for running a simulation session.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub variant: SimVariant,
    pub strategy: GameplayStrategy,
    pub levers: PolicyLevers,
    pub max_actions: usize,
    /// Replay the same seed and compare exports.
    pub verify_replay: bool,
    /// Save at the midpoint, resume from the snapshot, and compare exports.
    pub verify_snapshot: bool,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub fn new(variant: SimVariant, strategy: GameplayStrategy) -> Self {
        Self {
            variant,
            strategy,
            levers: PolicyLevers::default(),
            max_actions: DEFAULT_ACTION_LIMIT,
            verify_replay: false,
            verify_snapshot: false,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_levers(mut self, levers: PolicyLevers) -> Self {
        self.levers = levers;
        self
    }

    #[must_use]
    pub const fn with_max_actions(mut self, max_actions: usize) -> Self {
        self.max_actions = max_actions;
        self
    }

    #[must_use]
    pub const fn with_replay_check(mut self) -> Self {
        self.verify_replay = true;
        self
    }

    #[must_use]
    pub const fn with_snapshot_check(mut self) -> Self {
        self.verify_snapshot = true;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// Variant-specific result of a finished (or halted) run.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Journey(JourneySummary),
    Board(BoardSummary),
    Dash {
        score: u32,
        coins: u32,
        ending: Option<DashEnding>,
        stats: DashStats,
    },
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub variant: SimVariant,
    pub strategy: GameplayStrategy,
    pub actions: usize,
    pub interventions: usize,
    pub finished: bool,
    pub outcome: RunOutcome,
    pub export: String,
    pub replay_matches: Option<bool>,
    pub snapshot_matches: Option<bool>,
}

impl SimulationSummary {
    /// Days (journey), spaces (board), or clock seconds (dash) lost.
    #[must_use]
    pub fn delay_total(&self) -> u32 {
        match &self.outcome {
            RunOutcome::Journey(summary) => summary.patient_a.delay + summary.patient_b.delay,
            RunOutcome::Board(summary) => summary.standings.iter().map(|s| s.totals.delay).sum(),
            RunOutcome::Dash { stats, .. } => {
                u32::try_from(stats.clock_lost_ms / 1000).unwrap_or(u32::MAX)
            }
        }
    }

    #[must_use]
    pub fn ending_label(&self) -> String {
        match &self.outcome {
            RunOutcome::Journey(summary) if summary.finished => {
                format!("Treatment started (gap {} days)", summary.equity_gap)
            }
            RunOutcome::Board(summary) => summary
                .winner
                .as_ref()
                .map_or_else(|| String::from("No winner"), |w| format!("{w} wins")),
            RunOutcome::Dash {
                ending: Some(ending),
                coins,
                ..
            } => format!("{} ({coins} coins)", ending.title()),
            _ => String::from("Halted"),
        }
    }
}

/// A finished run plus the bookkeeping the tester tracks while driving it.
struct Played<R> {
    run: R,
    actions: usize,
    interventions: usize,
}

/// Headless deterministic runner for the simulations.
#[derive(Clone)]
pub struct GameTester {
    verbose: bool,
    assets: Arc<TesterAssets>,
}

impl GameTester {
    #[must_use]
    pub const fn new(assets: Arc<TesterAssets>, verbose: bool) -> Self {
        Self { verbose, assets }
    }

    #[must_use]
    pub fn try_new(verbose: bool) -> Self {
        Self::new(Arc::new(TesterAssets::load_default()), verbose)
    }

    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    #[must_use]
    pub fn assets(&self) -> &TesterAssets {
        &self.assets
    }

    fn engine(&self) -> TesterEngine {
        SimEngine::new(TesterAssets::clone(&self.assets), MemoryStorage::new())
    }

    /// Play one run of `plan` on `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the run cannot be created or a snapshot cannot be
    /// saved or restored.
    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
        let mut summary = self.play(plan, seed, None)?;
        if plan.verify_replay {
            let replay = self.play(plan, seed, None)?;
            summary.replay_matches = Some(replay.export == summary.export);
        }
        if plan.verify_snapshot {
            let midpoint = (summary.actions / 2).max(1);
            let resumed = self.play(plan, seed, Some(midpoint))?;
            summary.snapshot_matches = Some(resumed.export == summary.export);
        }
        if self.verbose {
            println!(
                "   ↳ {} seed {} via {}: {} after {} actions",
                plan.variant,
                seed,
                plan.strategy,
                summary.ending_label(),
                summary.actions
            );
        }
        Ok(summary)
    }

    fn play(
        &self,
        plan: &SimulationPlan,
        seed: u64,
        snapshot_at: Option<usize>,
    ) -> Result<SimulationSummary> {
        let engine = self.engine();
        let mut policy = plan.strategy.create_policy();
        let summary = match plan.variant {
            SimVariant::Journey => {
                let run = engine
                    .create_journey(seed)?
                    .with_levers(plan.levers)
                    .with_auto_resolve(false);
                let played = drive(
                    &engine,
                    run,
                    plan.max_actions,
                    snapshot_at,
                    JourneyRun::is_terminal,
                    |run| {
                        let action = policy.next_journey(run);
                        let outcome = run.apply(action);
                        (matches!(outcome, Outcome::Intervened(_)), outcome.is_ignored())
                    },
                    Snapshot::journey,
                    Snapshot::into_journey,
                )?;
                let journey = played.run.summary();
                self.summarize(
                    plan,
                    seed,
                    &played,
                    played.run.is_terminal(),
                    journey_export(&journey),
                    RunOutcome::Journey(journey),
                )
            }
            SimVariant::Board => {
                let run = engine
                    .create_board(seed)?
                    .with_levers(plan.levers)
                    .with_auto_resolve(false);
                let played = drive(
                    &engine,
                    run,
                    plan.max_actions,
                    snapshot_at,
                    BoardRun::is_terminal,
                    |run| {
                        let action = policy.next_board(run);
                        let outcome = run.apply(action);
                        (matches!(outcome, Outcome::Intervened(_)), outcome.is_ignored())
                    },
                    Snapshot::board,
                    Snapshot::into_board,
                )?;
                let board = played.run.summary();
                self.summarize(
                    plan,
                    seed,
                    &played,
                    played.run.is_terminal(),
                    board_export(&board),
                    RunOutcome::Board(board),
                )
            }
            SimVariant::Dash => {
                let run = engine.create_dash(seed);
                let played = drive(
                    &engine,
                    run,
                    plan.max_actions,
                    snapshot_at,
                    DashRun::is_finished,
                    |run| dash_frame(policy.as_mut(), run),
                    Snapshot::dash,
                    Snapshot::into_dash,
                )?;
                let outcome = RunOutcome::Dash {
                    score: played.run.score(),
                    coins: played.run.coins(),
                    ending: played.run.ending(),
                    stats: played.run.stats(),
                };
                self.summarize(
                    plan,
                    seed,
                    &played,
                    played.run.is_finished(),
                    dash_export(&played.run),
                    outcome,
                )
            }
        };
        Ok(summary)
    }

    fn summarize<R>(
        &self,
        plan: &SimulationPlan,
        seed: u64,
        played: &Played<R>,
        finished: bool,
        export: String,
        outcome: RunOutcome,
    ) -> SimulationSummary {
        if self.verbose && !finished {
            println!(
                "   ⚠️ {} seed {} halted after {} actions",
                plan.variant, seed, played.actions
            );
        }
        SimulationSummary {
            seed,
            variant: plan.variant,
            strategy: plan.strategy,
            actions: played.actions,
            interventions: played.interventions,
            finished,
            outcome,
            export,
            replay_matches: None,
            snapshot_matches: None,
        }
    }
}

/// One dash frame: optional input, then a tick.
fn dash_frame(policy: &mut (dyn PlayerPolicy + Send), run: &mut DashRun) -> (bool, bool) {
    if let Some(input) = policy.next_dash(run) {
        run.apply(DashAction::Input(input));
    }
    let outcome = run.apply(DashAction::Tick);
    (false, matches!(outcome, DashOutcome::Ignored(_)))
}

/// Drive `run` until `done` or the action limit, optionally round-tripping it
/// through storage after `snapshot_at` actions.
#[allow(clippy::too_many_arguments)]
fn drive<R>(
    engine: &TesterEngine,
    mut run: R,
    max_actions: usize,
    snapshot_at: Option<usize>,
    done: impl Fn(&R) -> bool,
    mut step: impl FnMut(&mut R) -> (bool, bool),
    save: impl Fn(&R) -> Snapshot,
    restore: impl Fn(Snapshot) -> Option<R>,
) -> Result<Played<R>> {
    let mut actions = 0;
    let mut interventions = 0;
    let mut stalled = 0;
    while !done(&run) && actions < max_actions {
        if snapshot_at == Some(actions) {
            engine.storage().save(SNAPSHOT_SLOT, &save(&run))?;
            let Some(restored) = engine.load(SNAPSHOT_SLOT)?.and_then(&restore) else {
                bail!("snapshot in {SNAPSHOT_SLOT} did not restore the same variant");
            };
            run = restored;
        }
        let (intervened, ignored) = step(&mut run);
        actions += 1;
        if intervened {
            interventions += 1;
        }
        stalled = if ignored { stalled + 1 } else { 0 };
        if stalled > 3 {
            bail!("run stopped responding after {actions} actions");
        }
    }
    Ok(Played {
        run,
        actions,
        interventions,
    })
}
