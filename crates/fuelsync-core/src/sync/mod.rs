//! Per-vehicle sync passes.
//!
//! Each configured pairing is synced on its own: a missing backup or an
//! unknown Lubelogger vehicle fails that pairing and the run moves on.

use crate::config::{SyncConfig, VehiclePairing};
use crate::destination::{FillupDestination, LubeloggerClient, LubeloggerSettings};
use crate::error::{Error, Result};
use crate::reconcile::{ReconcileReport, Reconciler};
use crate::source::fuelio::records_from_rows;
use crate::source::{BackupSource, BackupSourceKind};

/// Options shared by every pass of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    pub dry_run: bool,
    /// Only sync the pairing with this Fuelio vehicle ID.
    pub only_fuelio_id: Option<u32>,
}

/// Result of syncing one pairing.
#[derive(Debug)]
pub struct VehicleOutcome {
    pub pairing: VehiclePairing,
    pub result: Result<ReconcileReport>,
}

impl VehicleOutcome {
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.result.is_err()
    }
}

/// Sync one Fuelio vehicle into its Lubelogger counterpart.
pub async fn sync_vehicle<S, D>(
    source: &S,
    destination: &D,
    pairing: VehiclePairing,
    dry_run: bool,
) -> Result<ReconcileReport>
where
    S: BackupSource,
    D: FillupDestination,
{
    let vehicle = destination.vehicle_info(pairing.lubelogger_id).await?;
    tracing::info!(
        "Syncing Fuelio vehicle {} into {}",
        pairing.fuelio_id,
        vehicle.title()
    );

    let rows = source.fetch(pairing.fuelio_id).await?;
    let fillups = records_from_rows(&rows)?;
    if fillups.is_empty() {
        tracing::warn!(
            "Fuelio backup for vehicle {} has no fillups",
            pairing.fuelio_id
        );
        return Ok(ReconcileReport::default());
    }

    let existing = destination.list_fillups(pairing.lubelogger_id).await?;
    tracing::info!(
        "Found {} fillups in Fuelio backup and {} in Lubelogger",
        fillups.len(),
        existing.len()
    );

    Ok(Reconciler::new(destination, pairing.lubelogger_id)
        .dry_run(dry_run)
        .run(fillups, &existing)
        .await)
}

/// Sync every pairing in turn, isolating failures to their own pairing.
pub async fn sync_all<S, D>(
    source: &S,
    destination: &D,
    pairings: &[VehiclePairing],
    options: SyncOptions,
) -> Result<Vec<VehicleOutcome>>
where
    S: BackupSource,
    D: FillupDestination,
{
    let selected = select_pairings(pairings, options.only_fuelio_id)?;

    let mut outcomes = Vec::with_capacity(selected.len());
    for pairing in selected {
        let result = sync_vehicle(source, destination, pairing, options.dry_run).await;
        if let Err(error) = &result {
            tracing::error!(
                "Sync failed for Fuelio vehicle {} -> Lubelogger vehicle {}: {}",
                pairing.fuelio_id,
                pairing.lubelogger_id,
                error
            );
        }
        outcomes.push(VehicleOutcome { pairing, result });
    }
    Ok(outcomes)
}

/// Build the configured adapters and sync every pairing.
pub async fn sync_configured(
    config: &SyncConfig,
    options: SyncOptions,
) -> Result<Vec<VehicleOutcome>> {
    let source = BackupSourceKind::from_config(config)?;
    let destination = LubeloggerClient::new(LubeloggerSettings::from_config(config))?;
    sync_all(&source, &destination, &config.sync_vehicles, options).await
}

fn select_pairings(
    pairings: &[VehiclePairing],
    only: Option<u32>,
) -> Result<Vec<VehiclePairing>> {
    let Some(fuelio_id) = only else {
        return Ok(pairings.to_vec());
    };
    let selected: Vec<_> = pairings
        .iter()
        .copied()
        .filter(|pairing| pairing.fuelio_id == fuelio_id)
        .collect();
    if selected.is_empty() {
        return Err(Error::Configuration(format!(
            "Fuelio vehicle {fuelio_id} is not listed in sync_vehicles"
        )));
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::NaiveDate;
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::destination::test_support::RecordingDestination;
    use crate::models::{FillupRecord, VehicleInfo};
    use crate::reconcile::PassStatus;
    use crate::source::DirectoryBackupSource;
    use crate::ErrorKind;

    const EXTRACT: &str = "\
\"## Log\"
\"Data\",\"Odo (km)\",\"Fuel (litres)\",\"Full\",\"Price (optional)\",\"l/100km (optional)\",\"latitude (optional)\",\"longitude (optional)\",\"City (optional)\",\"Notes (optional)\",\"Missed\"
\"2024-01-20 18:05\",\"10890.0\",\"30.5\",\"1\",\"52.10\",\"0\",\"51.5\",\"-0.12\",\"Tesco\",\"\",\"0\"
\"2024-01-10 08:30\",\"10560.4\",\"28.0\",\"0\",\"47.25\",\"0\",\"51.4\",\"-0.11\",\"Shell\",\"\",\"0\"
";

    const PAIRING: VehiclePairing = VehiclePairing {
        fuelio_id: 2,
        lubelogger_id: 7,
    };

    fn civic() -> VehicleInfo {
        VehicleInfo {
            id: 7,
            year: Some(2019),
            make: "Honda".to_string(),
            model: "Civic".to_string(),
            license_plate: String::new(),
        }
    }

    fn backup_dir(extract: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("vehicle-2-sync.csv"), extract).unwrap();
        dir
    }

    fn destination() -> RecordingDestination {
        RecordingDestination {
            vehicles: vec![civic()],
            ..RecordingDestination::default()
        }
    }

    #[tokio::test]
    async fn sync_vehicle_inserts_backup_oldest_first() {
        let dir = backup_dir(EXTRACT);
        let source = DirectoryBackupSource::new(dir.path());
        let destination = destination();

        let report = sync_vehicle(&source, &destination, PAIRING, false)
            .await
            .unwrap();

        let dates: Vec<NaiveDate> = destination
            .added()
            .iter()
            .map(FillupRecord::date)
            .collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
            ]
        );
        assert_eq!(report.inserted.len(), 2);
    }

    #[tokio::test]
    async fn sync_vehicle_without_fillups_leaves_destination_alone() {
        let dir = backup_dir("\"## Vehicle\"\n\"Civic\"\n");
        let source = DirectoryBackupSource::new(dir.path());
        let destination = destination();

        let report = sync_vehicle(&source, &destination, PAIRING, false)
            .await
            .unwrap();
        assert_eq!(report.status(), PassStatus::NoSourceData);
        assert!(destination.added().is_empty());
    }

    #[tokio::test]
    async fn sync_vehicle_unknown_lubelogger_vehicle_is_not_found() {
        let dir = backup_dir(EXTRACT);
        let source = DirectoryBackupSource::new(dir.path());
        let destination = RecordingDestination::default();

        let error = sync_vehicle(&source, &destination, PAIRING, false)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn sync_vehicle_stops_when_lubelogger_log_is_unreadable() {
        let dir = backup_dir(EXTRACT);
        let source = DirectoryBackupSource::new(dir.path());
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/vehicles");
                then.status(200).json_body(json!([{"id": 7, "make": "Honda"}]));
            })
            .await;
        // Same fillup as the backup's Jan 20 entry, served month-first.
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/vehicle/gasrecords");
                then.status(200).json_body(json!([{
                    "date": "01/20/2024",
                    "odometer": "10890",
                    "fuelConsumed": "30.5",
                    "cost": "52.10",
                    "isFillToFull": "True",
                    "missedFuelUp": "False",
                    "notes": ""
                }]));
            })
            .await;
        let add = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/vehicle/gasrecords/add");
                then.status(200).json_body(json!({"success": true}));
            })
            .await;

        let destination = LubeloggerClient::new(LubeloggerSettings {
            url: server.base_url(),
            username: "admin".to_string(),
            password: "hunter2".to_string(),
            date_format: "%d/%m/%Y".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        let error = sync_vehicle(&source, &destination, PAIRING, false)
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Input);
        add.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn sync_all_continues_past_failed_pairing() {
        let dir = backup_dir(EXTRACT);
        let source = DirectoryBackupSource::new(dir.path());
        let destination = destination();
        let missing_backup = VehiclePairing {
            fuelio_id: 9,
            lubelogger_id: 7,
        };

        let outcomes = sync_all(
            &source,
            &destination,
            &[missing_backup, PAIRING],
            SyncOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].is_failure());
        assert!(!outcomes[1].is_failure());
        assert_eq!(destination.added().len(), 2);
    }

    #[tokio::test]
    async fn sync_all_dry_run_inserts_nothing() {
        let dir = backup_dir(EXTRACT);
        let source = DirectoryBackupSource::new(dir.path());
        let destination = destination();
        let options = SyncOptions {
            dry_run: true,
            only_fuelio_id: None,
        };

        let outcomes = sync_all(&source, &destination, &[PAIRING], options)
            .await
            .unwrap();

        let report = outcomes[0].result.as_ref().unwrap();
        assert_eq!(report.would_insert.len(), 2);
        assert!(destination.added().is_empty());
    }

    #[test]
    fn select_pairings_filters_by_fuelio_id() {
        let other = VehiclePairing {
            fuelio_id: 3,
            lubelogger_id: 8,
        };
        let pairings = [PAIRING, other];
        assert_eq!(select_pairings(&pairings, None).unwrap().len(), 2);
        assert_eq!(select_pairings(&pairings, Some(3)).unwrap(), vec![other]);

        let error = select_pairings(&pairings, Some(5)).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }
}
