//! Fillup reconciliation.
//!
//! Compares a vehicle's source fillups against the destination's existing
//! log and copies across whatever is missing. Fillups that share a
//! `(date, odometer)` with an existing entry but differ elsewhere are
//! reported, never overwritten.

use crate::destination::FillupDestination;
use crate::models::{Discrepancy, FillupRecord};

/// How one source fillup relates to the destination log.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification<'a> {
    /// An existing fillup is equal in every field.
    Exact,
    /// The first existing fillup with the same natural key, and how it differs.
    Conflict {
        existing: &'a FillupRecord,
        discrepancies: Vec<Discrepancy>,
    },
    /// Nothing in the destination resembles this fillup.
    New,
}

/// Classify `record` against the destination snapshot.
///
/// The exact-match scan covers the whole snapshot before any natural-key
/// lookup, so the snapshot's order only matters for picking the conflict
/// candidate.
#[must_use]
pub fn classify<'a>(record: &FillupRecord, existing: &'a [FillupRecord]) -> Classification<'a> {
    if existing.iter().any(|candidate| record.identical(candidate)) {
        return Classification::Exact;
    }

    let key = record.natural_key();
    match existing.iter().find(|candidate| candidate.natural_key() == key) {
        Some(candidate) => Classification::Conflict {
            existing: candidate,
            discrepancies: record.discrepancies(candidate),
        },
        None => Classification::New,
    }
}

/// A source fillup held back because the destination already has a
/// different fillup under the same natural key.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub incoming: FillupRecord,
    pub existing: FillupRecord,
    pub discrepancies: Vec<Discrepancy>,
}

/// Overall result of one vehicle pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStatus {
    /// The source had no fillups; the destination was left alone.
    NoSourceData,
    /// Every source fillup was already in the destination.
    UpToDate,
    /// New fillups or conflicts were found.
    Changed,
}

/// What a pass did with each source fillup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub source_count: usize,
    pub exact_matches: usize,
    pub inserted: Vec<FillupRecord>,
    /// Fillups a dry run would have inserted.
    pub would_insert: Vec<FillupRecord>,
    pub failed: Vec<FillupRecord>,
    pub conflicts: Vec<Conflict>,
}

impl ReconcileReport {
    /// Fillups found missing from the destination, whether or not they
    /// made it across.
    #[must_use]
    pub fn new_records(&self) -> usize {
        self.inserted.len() + self.would_insert.len() + self.failed.len()
    }

    #[must_use]
    pub fn status(&self) -> PassStatus {
        if self.source_count == 0 {
            PassStatus::NoSourceData
        } else if self.new_records() == 0 && self.conflicts.is_empty() {
            PassStatus::UpToDate
        } else {
            PassStatus::Changed
        }
    }
}

/// Runs reconciliation passes for one destination vehicle.
pub struct Reconciler<'d, D> {
    destination: &'d D,
    vehicle_id: i64,
    dry_run: bool,
}

impl<'d, D: FillupDestination> Reconciler<'d, D> {
    pub const fn new(destination: &'d D, vehicle_id: i64) -> Self {
        Self {
            destination,
            vehicle_id,
            dry_run: false,
        }
    }

    /// Report would-be insertions instead of performing them.
    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Reconcile `source` against the `existing` destination snapshot.
    ///
    /// Source fillups are handled oldest first. The snapshot is not
    /// refreshed as fillups are inserted. Insert failures are logged and
    /// the pass carries on.
    pub async fn run(
        &self,
        mut source: Vec<FillupRecord>,
        existing: &[FillupRecord],
    ) -> ReconcileReport {
        let mut report = ReconcileReport {
            source_count: source.len(),
            ..ReconcileReport::default()
        };
        if source.is_empty() {
            tracing::info!("No Fuelio fillups to sync for vehicle {}", self.vehicle_id);
            return report;
        }

        source.sort_by_key(FillupRecord::date);

        for record in source {
            match classify(&record, existing) {
                Classification::Exact => report.exact_matches += 1,
                Classification::Conflict {
                    existing,
                    discrepancies,
                } => {
                    log_conflict(&record, existing, &discrepancies);
                    report.conflicts.push(Conflict {
                        incoming: record.clone(),
                        existing: existing.clone(),
                        discrepancies,
                    });
                }
                Classification::New => self.insert(record, &mut report).await,
            }
        }

        if report.status() == PassStatus::UpToDate {
            tracing::info!("Nothing to add, Lubelogger fuel logs are up to date!");
        }
        report
    }

    async fn insert(&self, record: FillupRecord, report: &mut ReconcileReport) {
        if self.dry_run {
            tracing::info!("Dry run: would add fuel fillup from {}", record.date());
            report.would_insert.push(record);
            return;
        }

        match self.destination.add_fillup(self.vehicle_id, &record).await {
            Ok(()) => {
                tracing::info!(
                    "Added fuel fillup from {} ({} km)",
                    record.date(),
                    record.odometer()
                );
                report.inserted.push(record);
            }
            Err(error) => {
                tracing::error!(
                    "Failed to add fuel fillup from {}: {}",
                    record.date(),
                    error
                );
                report.failed.push(record);
            }
        }
    }
}

fn log_conflict(incoming: &FillupRecord, existing: &FillupRecord, discrepancies: &[Discrepancy]) {
    tracing::warn!(
        "Fillup on {} at {} km is already in Lubelogger with different details; not adding it",
        incoming.date(),
        incoming.odometer()
    );
    for discrepancy in discrepancies {
        tracing::warn!(
            "  {}: Lubelogger has {}, Fuelio has {}",
            discrepancy.field,
            discrepancy.existing,
            discrepancy.incoming
        );
    }
    tracing::debug!("Lubelogger fillup: {existing:?}");
    tracing::debug!("Fuelio fillup: {incoming:?}");
}
