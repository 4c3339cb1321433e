//! Plain-text exports and end-of-run messages.
use std::fmt::Write as _;

use crate::dash::{DashEnding, DashRun};
use crate::result::{BoardSummary, JourneySummary};

pub const TAKEAWAY: &str =
    "Takeaway: delays are often non-medical. Support and policy reduce harm, but access is uneven.";

/// Copyable summary of a journey run.
#[must_use]
pub fn journey_export(summary: &JourneySummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Two Patients, One Diagnosis");
    let _ = writeln!(out, "Seed: {}", summary.seed);
    for patient in [&summary.patient_a, &summary.patient_b] {
        let _ = writeln!(
            out,
            "Patient {} days: {}, stress: {}",
            patient.id, patient.delay, patient.stress
        );
    }
    let _ = writeln!(out, "Equity Gap: {} days", summary.equity_gap);
    let _ = writeln!(out);
    let _ = writeln!(out, "Category days (A vs B):");
    for (category, a, b) in summary.category_rows() {
        let _ = writeln!(out, "{}: {a} vs {b}", category.name());
    }
    let _ = writeln!(out);
    out.push_str(TAKEAWAY);
    out
}

/// Title and body shown when a journey reaches its last step.
#[must_use]
pub fn journey_ending(summary: &JourneySummary) -> (String, String) {
    let body = format!(
        "Patient A waited {} days.\nPatient B waited {} days.\n\nEquity Gap: {} days.\n\n{TAKEAWAY}",
        summary.patient_a.delay, summary.patient_b.delay, summary.equity_gap
    );
    (String::from("Treatment Started"), body)
}

#[must_use]
pub fn board_export(summary: &BoardSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Care Gap Board Race");
    let _ = writeln!(out, "Seed: {}", summary.seed);
    let _ = writeln!(out, "Turns: {}", summary.turns);
    match &summary.winner {
        Some(winner) => {
            let _ = writeln!(out, "Winner: {winner}");
        }
        None => {
            let _ = writeln!(out, "Winner: (race still running)");
        }
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Standings:");
    for standing in &summary.standings {
        let totals = &standing.totals;
        let _ = writeln!(
            out,
            "{}. {} on space {} (lost {} spaces, stress {}, {} tokens left)",
            standing.rank, totals.id, totals.position, totals.delay, totals.stress, totals.tokens_held
        );
    }
    let _ = writeln!(out);
    out.push_str(TAKEAWAY);
    out
}

#[must_use]
pub fn dash_export(run: &DashRun) -> String {
    let mut out = String::new();
    let stats = run.stats();
    let _ = writeln!(out, "Chemo Dash");
    let _ = writeln!(out, "Seed: {}", run.seed());
    let _ = writeln!(out, "Score: {}", run.score());
    let _ = writeln!(out, "Coins: {}", run.coins());
    let _ = writeln!(
        out,
        "Barriers cleared: {}, hits: {}, shields spent: {}",
        stats.cleared, stats.hits, stats.shields_spent
    );
    let _ = writeln!(out, "Clock lost to delays: {} s", stats.clock_lost_ms / 1000);
    match run.ending() {
        Some(ending) => out.push_str(&dash_ending(ending)),
        None => {
            let _ = write!(out, "Still running: {} s left", run.display_seconds());
        }
    }
    out
}

/// Ending overlay text.
#[must_use]
pub fn dash_ending(ending: DashEnding) -> String {
    let mut out = format!("{}\n{}\n\nWhat could help:", ending.title(), ending.message());
    for idea in DashEnding::what_could_help() {
        let _ = write!(out, "\n• {idea}");
    }
    out
}
