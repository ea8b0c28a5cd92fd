//! Sync runner results into TestRail

use anyhow::{Context, Result};
use caserail_core::{HttpTestRail, Reporter, ReporterConfig};

use super::input::InputArgs;
use super::scan::{collect_results, print_results};

/// Run the sync command
pub async fn run(config: ReporterConfig, input: &InputArgs, dry_run: bool) -> Result<()> {
    let events = input.read_events()?;

    if dry_run {
        let collector = collect_results(events, &config.case_prefix)?;
        tracing::info!(
            "Dry run: {} result(s) would be submitted to project {}",
            collector.len(),
            config.project_id
        );
        return print_results(collector.results());
    }

    let api = HttpTestRail::new(&config).context("Failed to create TestRail client")?;
    let mut reporter = Reporter::new(api, config)?;

    match reporter
        .replay(events)
        .await
        .context("TestRail synchronization failed")?
    {
        Some(report) => {
            println!("{}", report.run_url);
            tracing::info!(
                "Run {}: {} submitted, {} not in run, {}",
                report.run_id,
                report.submitted.len(),
                report.excluded.len(),
                if report.closed { "closed" } else { "left open" }
            );
        }
        None => tracing::info!("Nothing to report"),
    }
    Ok(())
}
