//! experiment-runner: headless A/B experiment analysis.
//!
//! Usage:
//!   experiment-runner --seed 42 --days 30
//!   experiment-runner --config experiment.json --json
//!   experiment-runner --events events.jsonl

use abtest_core::{
    config::ExperimentConfig,
    event::EventTable,
    pipeline::ExperimentPipeline,
    report::{ExperimentReport, TestOutcome},
    stats::HypothesisTest,
};
use anyhow::{Context, Result};
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

const BAR_WIDTH: usize = 40;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let json_output = args.iter().any(|a| a == "--json");
    let config_path = string_arg(&args, "--config");
    let events_path = string_arg(&args, "--events");

    let mut config = match config_path {
        Some(path) => {
            log::info!("Loading experiment config from {path}");
            ExperimentConfig::load(path)?
        }
        None => ExperimentConfig::reference(),
    };
    config.seed = parse_arg(&args, "--seed", config.seed);
    config.num_days = parse_arg(&args, "--days", config.num_days);
    config.validate()?;

    let run_id = run_id_for(events_path, config.seed);
    let pipeline = ExperimentPipeline::build(run_id, config);

    let report = match events_path {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("Cannot open {path}"))?;
            let events = EventTable::from_json_lines(BufReader::new(file))?;
            pipeline.analyze(&events)
        }
        None => pipeline.run(),
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&pipeline, &report);
    }
    Ok(())
}

fn print_summary(pipeline: &ExperimentPipeline, report: &ExperimentReport) {
    let config = pipeline.config();
    println!("A/B Experiment: experiment-runner");
    println!("  run_id:    {}", report.run_id);
    match report.seed {
        Some(seed) => println!("  seed:      {seed}"),
        None => println!("  seed:      (imported events)"),
    }
    println!("  days:      {}", config.num_days);
    println!("  events:    {}", report.event_count);
    println!("  kpi rows:  {}", report.kpis.len());
    println!();

    println!("=== GROUP TOTALS ===");
    for (group, totals) in &report.totals {
        let r = totals.ratios();
        println!(
            "  {group:<10} | views: {:>6} | clicks: {:>5} | purchases: {:>4} | revenue: ${:>10.2}",
            totals.views, totals.clicks, totals.purchases, totals.revenue
        );
        println!(
            "  {:<10} | CTR: {:>6.2}% | CVR: {:>6.2}% | AOV: ${:>7.2}",
            "", r.ctr, r.cvr, r.aov
        );
        match config.group(group) {
            Ok(g) => println!(
                "  {:<10} | configured p_click: {:.2} | p_purchase: {:.2}",
                "", g.click_probability, g.purchase_probability
            ),
            Err(_) => println!("  {:<10} | (not in config)", ""),
        }
    }
    println!();

    println!("=== EVENT DISTRIBUTION ===");
    let max = report
        .charts
        .event_distribution
        .values()
        .flat_map(|c| [c.view, c.click, c.purchase])
        .max()
        .unwrap_or(0);
    for (group, counts) in &report.charts.event_distribution {
        for (label, value) in [("view", counts.view), ("click", counts.click), ("purchase", counts.purchase)] {
            println!(
                "  {group:<10} {label:<9} {:<width$} {value}",
                bar(value, max),
                width = BAR_WIDTH
            );
        }
    }
    println!();

    let alpha = report.significance_level;
    println!("=== HYPOTHESIS TESTS (alpha = {alpha}) ===");
    match &report.aov_test {
        TestOutcome::Computed { result: t } => {
            println!(
                "  AOV t-test ({:?} variance): t = {:.4}, df = {:.1}, p = {:.4}{}",
                t.variance,
                t.statistic,
                t.df,
                t.p_value,
                below_alpha(t, alpha)
            );
            println!(
                "    mean daily AOV: treatment ${:.2} vs control ${:.2}",
                t.treatment_mean, t.control_mean
            );
        }
        TestOutcome::Skipped { reason } => println!("  AOV t-test: not computable ({reason})"),
    }

    match (&report.cvr_test, &report.contingency) {
        (TestOutcome::Computed { result: c }, Some(table)) => {
            println!(
                "  CVR chi-squared: chi2 = {:.4}, dof = {}, p = {:.4}{}",
                c.statistic,
                c.dof,
                c.p_value,
                below_alpha(c, alpha)
            );
            for (i, group) in table.groups.iter().enumerate() {
                let [purchases, non_purchases] = table.observed[i];
                let [e_p, e_n] = c.expected[i];
                println!(
                    "    {group:<10} purchases: {purchases:>5} (expected {e_p:>8.1}) | non-purchases: {non_purchases:>6} (expected {e_n:>9.1})"
                );
            }
        }
        (outcome, _) => println!(
            "  CVR chi-squared: not computable ({})",
            outcome.skipped_reason().unwrap_or("no contingency table")
        ),
    }
}

fn below_alpha(test: &impl HypothesisTest, alpha: f64) -> &'static str {
    if test.is_significant(alpha) {
        "  [p < alpha]"
    } else {
        ""
    }
}

fn bar(value: u64, max: u64) -> String {
    if max == 0 {
        return String::new();
    }
    let len = (value as f64 / max as f64 * BAR_WIDTH as f64).round() as usize;
    "#".repeat(len)
}

/// Simulated runs are named after the seed; imported logs after the file.
fn run_id_for(events_path: Option<&str>, seed: u64) -> String {
    match events_path {
        Some(path) => {
            let stem = Path::new(path)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("events");
            format!("import-{stem}")
        }
        None => format!("run-{seed}"),
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imported_runs_are_named_after_the_file() {
        assert_eq!(run_id_for(Some("data/week-12.jsonl"), 42), "import-week-12");
        assert_eq!(run_id_for(Some("events"), 42), "import-events");
    }

    #[test]
    fn simulated_runs_are_named_after_the_seed() {
        assert_eq!(run_id_for(None, 42), "run-42");
    }

    #[test]
    fn flags_fall_back_to_defaults() {
        let args: Vec<String> = ["experiment-runner", "--days", "7", "--seed", "oops"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(parse_arg(&args, "--days", 30u32), 7);
        assert_eq!(parse_arg(&args, "--seed", 42u64), 42);
        assert_eq!(string_arg(&args, "--config"), None);
    }
}
