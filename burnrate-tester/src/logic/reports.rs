use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use super::aggregate::StrategyAggregate;
use super::simulation::SimulationSummary;

#[derive(Serialize)]
struct JsonReport<'a> {
    aggregates: &'a [StrategyAggregate],
    runs: &'a [SimulationSummary],
}

pub fn generate_console_report<W: Write>(
    out: &mut W,
    runs: &[SimulationSummary],
    aggregates: &[StrategyAggregate],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Playthrough Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "======================".cyan())?;

    let failed = runs.iter().filter(|run| !run.passed()).count();
    writeln!(out, "Total runs: {}", runs.len())?;
    writeln!(out, "Clean: {}", (runs.len() - failed).to_string().green())?;
    writeln!(out, "With failures: {}", failed.to_string().red())?;
    writeln!(out, "Simulation time: {total_duration:?}")?;
    writeln!(out)?;

    for aggregate in aggregates {
        writeln!(out, "{}", aggregate.strategy.label().bold())?;
        writeln!(
            out,
            "   Victories: {}/{} ({:.1}%)",
            aggregate.victories,
            aggregate.runs,
            aggregate.victory_rate * 100.0
        )?;
        writeln!(
            out,
            "   Turns: {:.1} ± {:.1}   Days: {:.1}   Events: {:.1}",
            aggregate.mean_turns, aggregate.std_turns, aggregate.mean_days, aggregate.mean_events
        )?;
        writeln!(
            out,
            "   Score: mean {:.0}, best {}",
            aggregate.mean_score, aggregate.best_score
        )?;
        let endings: Vec<String> = aggregate
            .endings
            .iter()
            .map(|(key, count)| format!("{key} ×{count}"))
            .collect();
        writeln!(out, "   Endings: {}", endings.join(", "))?;
        writeln!(out)?;
    }

    let failing: Vec<&SimulationSummary> = runs.iter().filter(|run| !run.passed()).collect();
    if !failing.is_empty() {
        writeln!(out, "{}", "❌ Failures".bright_red().bold())?;
        for run in failing {
            for failure in &run.failures {
                writeln!(
                    out,
                    "   • [{} seed {}] {}",
                    run.strategy.key(),
                    run.seed,
                    failure.red()
                )?;
            }
        }
    }
    Ok(())
}

pub fn generate_json_report<W: Write>(
    out: &mut W,
    runs: &[SimulationSummary],
    aggregates: &[StrategyAggregate],
) -> Result<()> {
    let report = JsonReport { aggregates, runs };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report<W: Write>(
    out: &mut W,
    runs: &[SimulationSummary],
    aggregates: &[StrategyAggregate],
) -> Result<()> {
    writeln!(out, "# Burnrate Playthrough Results\n")?;
    writeln!(out, "## Summary\n")?;
    writeln!(
        out,
        "| Strategy | Runs | Victory rate | Mean turns | Mean days | Mean score | Best score |"
    )?;
    writeln!(out, "|---|---|---|---|---|---|---|")?;
    for aggregate in aggregates {
        writeln!(
            out,
            "| {} | {} | {:.1}% | {:.1} | {:.1} | {:.0} | {} |",
            aggregate.strategy.label(),
            aggregate.runs,
            aggregate.victory_rate * 100.0,
            aggregate.mean_turns,
            aggregate.mean_days,
            aggregate.mean_score,
            aggregate.best_score
        )?;
    }
    writeln!(out)?;

    writeln!(out, "## Endings\n")?;
    for aggregate in aggregates {
        writeln!(out, "### {}\n", aggregate.strategy.label())?;
        for (key, count) in &aggregate.endings {
            writeln!(out, "- **{key}**: {count}")?;
        }
        writeln!(out)?;
    }

    let failing: Vec<&SimulationSummary> = runs.iter().filter(|run| !run.passed()).collect();
    if !failing.is_empty() {
        writeln!(out, "## Failures\n")?;
        for run in failing {
            for failure in &run.failures {
                writeln!(out, "- `{}` seed {}: {failure}", run.strategy.key(), run.seed)?;
            }
        }
    }
    Ok(())
}

pub fn generate_csv_report<W: Write>(out: &mut W, runs: &[SimulationSummary]) -> Result<()> {
    writeln!(
        out,
        "strategy,seed,archetype,turns,ending,stage,funding,product,runway,days,events,score,failures"
    )?;
    for run in runs {
        let summary = &run.final_summary;
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{},{}",
            run.strategy.key(),
            run.seed,
            run.archetype,
            run.turns,
            summary.ending_key(),
            summary.stage.as_str(),
            summary.funding,
            summary.product,
            summary.runway,
            summary.days_survived,
            run.events_triggered,
            summary.score,
            run.failures.len()
        )?;
    }
    Ok(())
}
