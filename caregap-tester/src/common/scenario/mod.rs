pub mod catalog;

use anyhow::Result;
use caregap_game::{DashEnding, SimVariant};

use crate::logic::game_tester::{RunOutcome, SimulationPlan, SimulationSummary};
use crate::logic::policy::GameplayStrategy;
use catalog::find_catalog_scenario;

/// Score a dash needs at the bell to count as made.
const DASH_MADE_IT_SCORE: u32 = 220;

#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }

    /// Copy of this scenario with `strategy` swapped in.
    #[must_use]
    pub fn with_strategy(mut self, strategy: GameplayStrategy) -> Self {
        self.plan.strategy = strategy;
        self
    }
}

pub(crate) fn finished_expectation(summary: &SimulationSummary) -> Result<()> {
    anyhow::ensure!(
        summary.finished,
        "{} run should finish within {} actions",
        summary.variant,
        summary.actions
    );
    Ok(())
}

fn journey_expectation(summary: &SimulationSummary) -> Result<()> {
    finished_expectation(summary)?;
    let RunOutcome::Journey(journey) = &summary.outcome else {
        anyhow::bail!("expected a journey outcome");
    };
    anyhow::ensure!(
        journey.steps_completed > 0,
        "journey should complete at least one step"
    );
    anyhow::ensure!(
        journey.equity_gap == journey.patient_a.delay.abs_diff(journey.patient_b.delay),
        "equity gap {} should equal the difference in delays",
        journey.equity_gap
    );
    Ok(())
}

fn board_expectation(summary: &SimulationSummary) -> Result<()> {
    finished_expectation(summary)?;
    let RunOutcome::Board(board) = &summary.outcome else {
        anyhow::bail!("expected a board outcome");
    };
    let Some(winner) = &board.winner else {
        anyhow::bail!("finished race should name a winner");
    };
    let leader = board
        .standings
        .first()
        .map(|standing| standing.totals.id.as_str());
    anyhow::ensure!(
        leader == Some(winner.as_str()),
        "winner {winner} should rank first, found {leader:?}"
    );
    Ok(())
}

fn dash_expectation(summary: &SimulationSummary) -> Result<()> {
    finished_expectation(summary)?;
    let RunOutcome::Dash { score, ending, .. } = &summary.outcome else {
        anyhow::bail!("expected a dash outcome");
    };
    let expected = if *score >= DASH_MADE_IT_SCORE {
        DashEnding::MadeIt
    } else {
        DashEnding::Missed
    };
    anyhow::ensure!(
        *ending == Some(expected),
        "score {score} should end as {expected:?}, got {ending:?}"
    );
    Ok(())
}

fn variant_scenario(
    name: &'static str,
    variant: SimVariant,
    strategy: GameplayStrategy,
) -> TestScenario {
    let plan = SimulationPlan::new(variant, strategy);
    let plan = match variant {
        SimVariant::Journey => plan.with_expectation(journey_expectation),
        SimVariant::Board => plan.with_expectation(board_expectation),
        SimVariant::Dash => plan.with_expectation(dash_expectation),
    };
    TestScenario::simulation(name, plan)
}

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    match name.to_lowercase().as_str() {
        "smoke" => Some(variant_scenario(
            "Smoke Test",
            SimVariant::Journey,
            GameplayStrategy::Baseline,
        )),
        "journey-baseline" | "journey" => Some(variant_scenario(
            "Journey - Baseline",
            SimVariant::Journey,
            GameplayStrategy::Baseline,
        )),
        "journey-advocate" => Some(variant_scenario(
            "Journey - Advocate",
            SimVariant::Journey,
            GameplayStrategy::Advocate,
        )),
        "board-race" | "board" => Some(variant_scenario(
            "Board Race - Baseline",
            SimVariant::Board,
            GameplayStrategy::Baseline,
        )),
        "board-advocate" => Some(variant_scenario(
            "Board Race - Advocate",
            SimVariant::Board,
            GameplayStrategy::Advocate,
        )),
        "dash-pilot" | "dash" => Some(variant_scenario(
            "Chemo Dash - Pilot",
            SimVariant::Dash,
            GameplayStrategy::Advocate,
        )),
        "dash-idle" => Some(variant_scenario(
            "Chemo Dash - Idle",
            SimVariant::Dash,
            GameplayStrategy::Baseline,
        )),
        "journey-policy" | "policy" => find_catalog_scenario("Journey - All Policy Levers"),
        "board-policy" => find_catalog_scenario("Board Race - All Policy Levers"),
        "deterministic" | "replay" => find_catalog_scenario("Deterministic Replay"),
        "snapshot-resume" | "snapshot" => find_catalog_scenario("Snapshot Resume"),
        "share-code" | "share-code-consistency" => {
            find_catalog_scenario("Share Code Round Trip")
        }
        _ => None,
    }
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("smoke", "Smoke Test"),
        ("journey-baseline", "Journey - Baseline"),
        ("journey-advocate", "Journey - Advocate"),
        ("journey-policy", "Journey - All Policy Levers"),
        ("board-race", "Board Race - Baseline"),
        ("board-advocate", "Board Race - Advocate"),
        ("board-policy", "Board Race - All Policy Levers"),
        ("dash-pilot", "Chemo Dash - Pilot"),
        ("dash-idle", "Chemo Dash - Idle"),
        ("deterministic", "Deterministic Replay"),
        ("snapshot-resume", "Snapshot Resume"),
        ("share-code", "Share Code Round Trip"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_scenario_resolves() {
        for (key, title) in list_scenarios() {
            let scenario = get_scenario(key).unwrap_or_else(|| panic!("missing {key}"));
            assert_eq!(scenario.name, title);
        }
        assert!(get_scenario("SMOKE").is_some());
        assert!(get_scenario("nope").is_none());
    }

    #[test]
    fn strategy_override_keeps_expectations() {
        let scenario = get_scenario("dash-idle")
            .unwrap()
            .with_strategy(GameplayStrategy::Advocate);
        assert_eq!(scenario.plan.strategy, GameplayStrategy::Advocate);
        assert_eq!(scenario.plan.expectations.len(), 1);
    }
}
