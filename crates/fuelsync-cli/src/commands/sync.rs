use fuelsync_core::config::SyncConfig;
use fuelsync_core::reconcile::PassStatus;
use fuelsync_core::sync::{sync_configured, SyncOptions, VehicleOutcome};

use crate::error::CliError;

pub async fn run_sync(config: &SyncConfig, options: SyncOptions) -> Result<(), CliError> {
    if options.dry_run {
        tracing::info!("Dry run: nothing will be added to Lubelogger");
    }

    let outcomes = sync_configured(config, options).await?;
    for outcome in &outcomes {
        tracing::info!("{}", summarize_outcome(outcome, options.dry_run));
    }

    let failed = outcomes.iter().filter(|outcome| outcome.is_failure()).count();
    if failed > 0 {
        return Err(CliError::VehiclesFailed {
            failed,
            total: outcomes.len(),
        });
    }
    Ok(())
}

pub fn summarize_outcome(outcome: &VehicleOutcome, dry_run: bool) -> String {
    let label = format!(
        "Fuelio vehicle {} -> Lubelogger vehicle {}",
        outcome.pairing.fuelio_id, outcome.pairing.lubelogger_id
    );
    let report = match &outcome.result {
        Ok(report) => report,
        Err(error) => return format!("{label}: failed ({error})"),
    };

    match report.status() {
        PassStatus::NoSourceData => format!("{label}: no fillups in backup"),
        PassStatus::UpToDate => format!("{label}: up to date"),
        PassStatus::Changed => {
            let added = if dry_run {
                format!("{} would be added", report.would_insert.len())
            } else {
                format!("{} added", report.inserted.len())
            };
            let mut summary = format!(
                "{label}: {added}, {} conflict(s), {} already present",
                report.conflicts.len(),
                report.exact_matches
            );
            if !report.failed.is_empty() {
                summary.push_str(&format!(", {} failed", report.failed.len()));
            }
            summary
        }
    }
}
