use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::ScenarioResult;
use super::playability::{PlayabilityAggregate, PlayabilityRecord};

const MARKDOWN_TITLE: &str = "# Limestone GeoGuesser Logic Test Results";

fn success_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let passed = u32::try_from(passed).unwrap_or(u32::MAX);
    let total = u32::try_from(total).unwrap_or(u32::MAX);
    f64::from(passed) / f64::from(total) * 100.0
}

pub fn generate_console_report<W: Write>(
    out: &mut W,
    results: &[ScenarioResult],
    aggregates: &[PlayabilityAggregate],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Logic Test Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==============================".cyan())?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(out, "Total scenarios: {total}")?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", (total - passed).to_string().red())?;
    writeln!(out, "Success rate: {:.1}%", success_rate(passed, total))?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            out,
            "{} {} [{}]",
            status,
            result.scenario_name.bold(),
            result.share_code
        )?;
        writeln!(
            out,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;
        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }

    if let (Some(fastest), Some(slowest)) = (
        results.iter().min_by_key(|r| r.average_duration),
        results.iter().max_by_key(|r| r.average_duration),
    ) {
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
        writeln!(out)?;
    }

    if !aggregates.is_empty() {
        writeln!(out, "{}", "🎯 Playability Summary".bright_magenta().bold())?;
        writeln!(out, "{}", "=====================".magenta())?;
        for aggregate in aggregates {
            writeln!(
                out,
                "{:<18} runs {:>3} | score {:>8.0} ±{:<6.0} [{}..{}] | acc {:>5.1}% | avg dist {:>7.0}m | hints {:>4.1} | skips {:>5.1}%",
                aggregate.scenario_name,
                aggregate.iterations,
                aggregate.mean_score,
                aggregate.std_score,
                aggregate.min_score,
                aggregate.max_score,
                aggregate.mean_accuracy,
                aggregate.mean_avg_distance,
                aggregate.mean_hints,
                aggregate.skip_rate * 100.0
            )?;
        }
    }
    Ok(())
}

pub fn generate_json_report<W: Write>(out: &mut W, results: &[ScenarioResult]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, results)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report<W: Write>(out: &mut W, results: &[ScenarioResult]) -> Result<()> {
    writeln!(out, "{MARKDOWN_TITLE}\n")?;
    writeln!(
        out,
        "_Generated {}_\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total scenarios**: {total}")?;
    writeln!(out, "- **Passed**: {passed}")?;
    writeln!(out, "- **Failed**: {}", total - passed)?;
    writeln!(out, "- **Success rate**: {:.1}%\n", success_rate(passed, total))?;

    writeln!(out, "## Detailed Results\n")?;
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        writeln!(out, "### {status} {} (`{}`)\n", result.scenario_name, result.share_code)?;
        writeln!(
            out,
            "- **Iterations**: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "- **Average time**: {:?}", result.average_duration)?;
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

/// One line per simulated session.
pub fn generate_csv_report<W: Write>(out: &mut W, records: &[PlayabilityRecord]) -> Result<()> {
    writeln!(
        out,
        "scenario,difficulty,strategy,seed_code,seed_value,score,accuracy,avg_distance_m,rounds_played,hints_used,skipped,perfect_rounds,unique_landmarks,new_best"
    )?;
    for record in records {
        let m = &record.metrics;
        writeln!(
            out,
            "{},{},{},{},{},{},{},{:.1},{},{},{},{},{},{}",
            record.scenario_name,
            record.difficulty,
            record.strategy,
            record.seed_code,
            record.seed_value,
            m.score,
            m.accuracy,
            m.avg_distance,
            m.rounds_played,
            m.hints_used,
            m.skipped,
            m.perfect_rounds,
            m.unique_landmarks,
            m.is_new_best
        )?;
    }
    Ok(())
}
