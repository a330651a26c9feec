//! Fuelio sync-extract rows.
//!
//! The extract is one CSV holding several sections (vehicle, log, costs, ...).
//! Only log rows start with a `YYYY-MM-DD HH:MM` timestamp, so that is what
//! picks fillups out of everything else. Each fillup row is read once into a
//! [`FuelioFillup`] with named fields; nothing downstream looks at column
//! positions.

use chrono::NaiveDateTime;
use csv::StringRecord;

use crate::error::{Error, Result};
use crate::models::FillupRecord;

pub const FUELIO_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

mod column {
    pub const TAKEN_AT: usize = 0;
    pub const ODOMETER: usize = 1;
    pub const FUEL: usize = 2;
    pub const FULL: usize = 3;
    pub const PRICE: usize = 4;
    pub const LATITUDE: usize = 6;
    pub const LONGITUDE: usize = 7;
    pub const STATION: usize = 8;
    pub const NOTES: usize = 9;
    pub const MISSED: usize = 10;
}

/// A fillup as logged by Fuelio.
#[derive(Debug, Clone, PartialEq)]
pub struct FuelioFillup {
    pub taken_at: NaiveDateTime,
    pub odometer: f64,
    pub fuel: f64,
    pub full: bool,
    pub price: f64,
    pub latitude: String,
    pub longitude: String,
    pub station: String,
    pub notes: String,
    pub missed: bool,
}

impl FuelioFillup {
    /// Convert into the common fillup schema.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_record(&self) -> FillupRecord {
        FillupRecord::new(
            self.taken_at.date(),
            self.odometer.trunc() as i64,
            self.fuel,
            self.price,
            self.full,
            self.missed,
        )
        .with_notes(self.compose_notes())
    }

    fn compose_notes(&self) -> String {
        let (lat, lon) = (&self.latitude, &self.longitude);
        let mut notes = format!(
            "Fuel station: {}\n\nLocation: [{lat},{lon}](https://www.google.com/maps/place/{lat},{lon})\n\nTime: {}",
            self.station.trim(),
            self.taken_at.format("%H:%M"),
        );
        if !self.notes.is_empty() {
            notes.push_str("\n\n###### Fuelio notes:\n\n");
            notes.push_str(&self.notes);
        }
        notes
    }
}

/// Timestamp of a log row, or `None` for rows that are not fillups.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), FUELIO_DATETIME_FORMAT).ok()
}

/// Keep only fillup rows and read them into named fields, in file order.
///
/// Rows whose first column is not a timestamp are skipped. A fillup row whose
/// numeric columns do not parse is an error: the backup is damaged.
pub fn parse_fillups(rows: &[StringRecord]) -> Result<Vec<FuelioFillup>> {
    let mut fillups = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        let Some(taken_at) = row.get(column::TAKEN_AT).and_then(parse_timestamp) else {
            continue;
        };
        let fillup = parse_row(row, taken_at).map_err(|message| {
            Error::InvalidInput(format!(
                "malformed fillup on line {} ({taken_at}): {message}",
                index + 1
            ))
        })?;
        fillups.push(fillup);
    }
    Ok(fillups)
}

fn parse_row(
    row: &StringRecord,
    taken_at: NaiveDateTime,
) -> std::result::Result<FuelioFillup, String> {
    let text = |index: usize| row.get(index).unwrap_or_default().to_string();
    Ok(FuelioFillup {
        taken_at,
        odometer: parse_number(row, column::ODOMETER, "odometer")?,
        fuel: parse_number(row, column::FUEL, "fuel")?,
        full: parse_flag(row, column::FULL, "full")?,
        price: parse_number(row, column::PRICE, "price")?,
        latitude: text(column::LATITUDE),
        longitude: text(column::LONGITUDE),
        station: text(column::STATION),
        notes: text(column::NOTES),
        missed: parse_flag(row, column::MISSED, "missed")?,
    })
}

fn parse_number(
    row: &StringRecord,
    index: usize,
    name: &str,
) -> std::result::Result<f64, String> {
    let raw = row.get(index).unwrap_or_default().trim();
    raw.parse::<f64>()
        .map_err(|_| format!("{name} '{raw}' is not a number"))
}

// Missing or empty flag columns read as unset; older extracts omit them.
fn parse_flag(row: &StringRecord, index: usize, name: &str) -> std::result::Result<bool, String> {
    let raw = row.get(index).unwrap_or_default().trim();
    if raw.is_empty() {
        return Ok(false);
    }
    raw.parse::<i64>()
        .map(|value| value == 1)
        .map_err(|_| format!("{name} flag '{raw}' is not an integer"))
}

/// Fuelio writes its log newest-first; return it oldest-first.
///
/// Entries are reversed first so that fillups sharing a timestamp keep
/// their relative order from the file, then stable-sorted by timestamp.
#[must_use]
pub fn into_chronological(mut fillups: Vec<FuelioFillup>) -> Vec<FuelioFillup> {
    fillups.reverse();
    fillups.sort_by_key(|fillup| fillup.taken_at);
    fillups
}

/// Raw extract rows → common-schema records, oldest first.
pub fn records_from_rows(rows: &[StringRecord]) -> Result<Vec<FillupRecord>> {
    let fillups = into_chronological(parse_fillups(rows)?);
    Ok(fillups.iter().map(FuelioFillup::to_record).collect())
}
