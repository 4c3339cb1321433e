use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::common::scenario::TestScenario;
use crate::logic::game_tester::{GameTester, RunOutcome, SimulationPlan, SimulationSummary};
use crate::logic::seeds::SeedInfo;

/// Flat per-run row used by the CSV report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub scenario_name: String,
    pub variant: String,
    pub strategy: String,
    pub seed_code: String,
    pub seed_value: u64,
    pub finished: bool,
    pub actions: usize,
    pub interventions: usize,
    pub delay_total: u32,
    pub equity_gap: Option<u32>,
    pub winner: Option<String>,
    pub score: Option<u32>,
    pub ending: String,
}

impl RunRecord {
    fn from_summary(scenario: &str, seed_code: String, summary: &SimulationSummary) -> Self {
        let (equity_gap, winner, score) = match &summary.outcome {
            RunOutcome::Journey(journey) => (Some(journey.equity_gap), None, None),
            RunOutcome::Board(board) => (None, board.winner.clone(), None),
            RunOutcome::Dash { score, .. } => (None, None, Some(*score)),
        };
        Self {
            scenario_name: scenario.to_string(),
            variant: summary.variant.key().to_string(),
            strategy: summary.strategy.label().to_string(),
            seed_code,
            seed_value: summary.seed,
            finished: summary.finished,
            actions: summary.actions,
            interventions: summary.interventions,
            delay_total: summary.delay_total(),
            equity_gap,
            winner,
            score,
            ending: summary.ending_label(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
    #[serde(default)]
    pub runs: Vec<RunRecord>,
}

pub struct LogicTester {
    tester: GameTester,
}

impl LogicTester {
    pub const fn new(tester: GameTester) -> Self {
        Self { tester }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[SeedInfo],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for seed in seeds {
            if self.tester.verbose() {
                println!(
                    "🧪 Testing scenario: {} (variant: {} seed: {})",
                    scenario.name.bright_white(),
                    scenario.plan.variant,
                    seed.seed
                );
            }

            results.push(self.run_single_scenario(scenario, seed, iterations));
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: &SeedInfo,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();
        let mut runs = Vec::new();
        let plan = &scenario.plan;

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed
                .seed
                .wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let seed_code = if i == 0 {
                seed.share_code_for(plan.variant)
            } else {
                caregap_game::encode_friendly(plan.variant, iteration_seed)
            };

            let summary = match self.tester.run_plan(plan, iteration_seed) {
                Ok(summary) => summary,
                Err(err) => {
                    failures.push(format!("Iteration {} (seed {iteration_seed}): {err:#}", i + 1));
                    continue;
                }
            };
            runs.push(RunRecord::from_summary(&scenario.name, seed_code, &summary));

            if let Some(err) = evaluate_expectations(plan, &summary) {
                failures.push(format!(
                    "Iteration {} ({} {}, seed {}, actions {}, ending '{}'): {}",
                    i + 1,
                    summary.variant,
                    summary.strategy.label(),
                    summary.seed,
                    summary.actions,
                    summary.ending_label(),
                    err
                ));
                if self.tester.verbose() {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        err.red()
                    );
                }
            } else {
                successes += 1;
                let duration = start_time.elapsed();
                performance_data.push(duration);
                if self.tester.verbose() {
                    println!(
                        "  ✅ Iteration {}/{} passed ({duration:?}) delay:{} ending:{}",
                        i + 1,
                        iterations,
                        summary.delay_total(),
                        summary.ending_label()
                    );
                }
            }
        }

        let avg_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration: avg_duration,
            performance_data,
            runs,
        }
    }
}

fn evaluate_expectations(plan: &SimulationPlan, summary: &SimulationSummary) -> Option<String> {
    if summary.replay_matches == Some(false) {
        return Some(String::from("replaying the same seed produced a different run"));
    }
    if summary.snapshot_matches == Some(false) {
        return Some(String::from("resuming from a snapshot changed the run"));
    }
    plan.expectations
        .iter()
        .find_map(|expectation| expectation.evaluate(summary).err())
        .map(|err| err.to_string())
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis_vec
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}
