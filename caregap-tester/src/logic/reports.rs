use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::{RunRecord, ScenarioResult};
use crate::common::report_stamp;

const CSV_HEADER: &str = "scenario,variant,strategy,seed_code,seed,finished,actions,interventions,delay_total,equity_gap,winner,score,ending";

#[allow(clippy::cast_precision_loss)]
fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64) * 100.0
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: impl Iterator<Item = u32>) -> Option<f64> {
    let (sum, count) = values.fold((0_u64, 0_u64), |(sum, count), v| {
        (sum + u64::from(v), count + 1)
    });
    (count > 0).then(|| sum as f64 / count as f64)
}

pub fn generate_console_report<W: Write>(
    out: &mut W,
    results: &[ScenarioResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Scenario Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "===========================".cyan())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "Total scenarios: {total_tests}")?;
    writeln!(out, "Passed: {}", passed_tests.to_string().green())?;
    writeln!(out, "Failed: {}", failed_tests.to_string().red())?;
    writeln!(
        out,
        "Success rate: {:.1}%",
        percent(passed_tests, total_tests)
    )?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };

        writeln!(out, "{} {}", status, result.scenario_name.bold())?;
        writeln!(
            out,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;
        if let Some(delay) = mean(result.runs.iter().map(|r| r.delay_total)) {
            writeln!(out, "   Average delay: {delay:.1}")?;
        }
        if let Some(gap) = mean(result.runs.iter().filter_map(|r| r.equity_gap)) {
            writeln!(out, "   Average equity gap: {gap:.1} days")?;
        }
        if let Some(score) = mean(result.runs.iter().filter_map(|r| r.score)) {
            writeln!(out, "   Average dash score: {score:.1}")?;
        }

        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }

    let fastest = results.iter().min_by_key(|r| r.average_duration);
    let slowest = results.iter().max_by_key(|r| r.average_duration);
    if let (Some(fastest), Some(slowest)) = (fastest, slowest) {
        writeln!(out, "{}", "⚡ Performance Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "=====================".yellow())?;
        writeln!(
            out,
            "Fastest: {} ({:?})",
            fastest.scenario_name.green(),
            fastest.average_duration
        )?;
        writeln!(
            out,
            "Slowest: {} ({:?})",
            slowest.scenario_name.yellow(),
            slowest.average_duration
        )?;
    }
    Ok(())
}

pub fn generate_json_report<W: Write>(out: &mut W, results: &[ScenarioResult]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, results)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report<W: Write>(out: &mut W, results: &[ScenarioResult]) -> Result<()> {
    writeln!(out, "# Care Gap Scenario Results\n")?;
    writeln!(out, "_Generated {}_\n", report_stamp())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total scenarios**: {total_tests}")?;
    writeln!(out, "- **Passed**: {passed_tests}")?;
    writeln!(out, "- **Failed**: {failed_tests}")?;
    writeln!(
        out,
        "- **Success rate**: {:.1}%\n",
        percent(passed_tests, total_tests)
    )?;

    writeln!(out, "## Detailed Results\n")?;

    for result in results {
        let status = if result.passed { "✅" } else { "❌" };

        writeln!(out, "### {} {}\n", status, result.scenario_name)?;
        writeln!(
            out,
            "- **Iterations**: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "- **Average time**: {:?}", result.average_duration)?;

        if !result.runs.is_empty() {
            writeln!(out, "\n| Seed | Code | Ending | Delay |")?;
            writeln!(out, "|---:|---|---|---:|")?;
            for run in &result.runs {
                writeln!(
                    out,
                    "| {} | {} | {} | {} |",
                    run.seed_value, run.seed_code, run.ending, run.delay_total
                )?;
            }
            writeln!(out)?;
        }

        if !result.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_row(run: &RunRecord) -> String {
    let optional = |v: Option<u32>| v.map(|v| v.to_string()).unwrap_or_default();
    [
        csv_field(&run.scenario_name),
        run.variant.clone(),
        run.strategy.clone(),
        run.seed_code.clone(),
        run.seed_value.to_string(),
        run.finished.to_string(),
        run.actions.to_string(),
        run.interventions.to_string(),
        run.delay_total.to_string(),
        optional(run.equity_gap),
        csv_field(run.winner.as_deref().unwrap_or_default()),
        optional(run.score),
        csv_field(&run.ending),
    ]
    .join(",")
}

pub fn generate_csv_report<W: Write>(out: &mut W, results: &[ScenarioResult]) -> Result<()> {
    writeln!(out, "{CSV_HEADER}")?;
    for run in results.iter().flat_map(|r| r.runs.iter()) {
        writeln!(out, "{}", csv_row(run))?;
    }
    Ok(())
}
