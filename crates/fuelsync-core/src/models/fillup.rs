//! Fillup record model

use std::any::{type_name, Any};
use std::fmt;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::util::to_lower_camel_case;

/// The `(date, odometer)` pair used to spot likely duplicates across two logs
/// that share no common identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NaturalKey {
    pub date: NaiveDate,
    pub odometer: i64,
}

/// One refueling event in the common schema shared by both logs.
///
/// Records are immutable once built: fields are only readable through
/// accessors, and the only way to change a value is to build a new record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FillupRecord {
    date: NaiveDate,
    odometer: i64,
    fuel_consumed: f64,
    cost: f64,
    is_fill_to_full: bool,
    missed_fuel_up: bool,
    #[serde(default)]
    notes: String,
}

impl FillupRecord {
    /// Create a fillup with empty notes
    #[must_use]
    pub fn new(
        date: NaiveDate,
        odometer: i64,
        fuel_consumed: f64,
        cost: f64,
        is_fill_to_full: bool,
        missed_fuel_up: bool,
    ) -> Self {
        Self {
            date,
            odometer,
            fuel_consumed,
            cost,
            is_fill_to_full,
            missed_fuel_up,
            notes: String::new(),
        }
    }

    /// Return a copy of this fillup carrying the given notes
    #[must_use]
    pub fn with_notes(self, notes: impl Into<String>) -> Self {
        Self {
            notes: notes.into(),
            ..self
        }
    }

    /// Build a fillup from a mapping of snake_case field names.
    ///
    /// Every field is required except `notes`, which defaults to empty.
    /// Dates use ISO `YYYY-MM-DD`.
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self> {
        serde_json::from_value(Value::Object(fields.clone()))
            .map_err(|error| Error::InvalidInput(format!("invalid fillup fields: {error}")))
    }

    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    #[must_use]
    pub const fn odometer(&self) -> i64 {
        self.odometer
    }

    #[must_use]
    pub fn fuel_consumed(&self) -> f64 {
        self.fuel_consumed
    }

    #[must_use]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    #[must_use]
    pub const fn is_fill_to_full(&self) -> bool {
        self.is_fill_to_full
    }

    #[must_use]
    pub const fn missed_fuel_up(&self) -> bool {
        self.missed_fuel_up
    }

    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }

    #[must_use]
    pub const fn natural_key(&self) -> NaturalKey {
        NaturalKey {
            date: self.date,
            odometer: self.odometer,
        }
    }

    /// Read one field as a comparable value
    #[must_use]
    pub fn value(&self, field: FillupField) -> FieldValue {
        match field {
            FillupField::Date => FieldValue::Date(self.date),
            FillupField::Odometer => FieldValue::Integer(self.odometer),
            FillupField::FuelConsumed => FieldValue::Decimal(self.fuel_consumed),
            FillupField::Cost => FieldValue::Decimal(self.cost),
            FillupField::IsFillToFull => FieldValue::Flag(self.is_fill_to_full),
            FillupField::MissedFuelUp => FieldValue::Flag(self.missed_fuel_up),
            FillupField::Notes => FieldValue::Text(self.notes.clone()),
        }
    }

    /// Exact match: every field equal, not just the natural key.
    #[must_use]
    pub fn identical(&self, other: &Self) -> bool {
        self == other
    }

    /// Exact match against a value of any type.
    ///
    /// Comparing with anything other than a `FillupRecord` is a caller
    /// contract violation and fails with [`Error::TypeMismatch`].
    pub fn try_identical<T: Any>(&self, other: &T) -> Result<bool> {
        let other: &dyn Any = other;
        other
            .downcast_ref::<Self>()
            .map(|record| self.identical(record))
            .ok_or(Error::TypeMismatch {
                expected: "FillupRecord",
                found: type_name::<T>(),
            })
    }

    /// Fields where `self` (incoming) differs from `existing`, in schema order.
    #[must_use]
    pub fn discrepancies(&self, existing: &Self) -> Vec<Discrepancy> {
        FillupField::ALL
            .iter()
            .filter_map(|&field| {
                let incoming = self.value(field);
                let current = existing.value(field);
                (incoming != current).then_some(Discrepancy {
                    field,
                    existing: current,
                    incoming,
                })
            })
            .collect()
    }
}

/// Named fields of [`FillupRecord`], in schema order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillupField {
    Date,
    Odometer,
    FuelConsumed,
    Cost,
    IsFillToFull,
    MissedFuelUp,
    Notes,
}

impl FillupField {
    pub const ALL: [Self; 7] = [
        Self::Date,
        Self::Odometer,
        Self::FuelConsumed,
        Self::Cost,
        Self::IsFillToFull,
        Self::MissedFuelUp,
        Self::Notes,
    ];

    /// Common-schema (snake_case) name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Odometer => "odometer",
            Self::FuelConsumed => "fuel_consumed",
            Self::Cost => "cost",
            Self::IsFillToFull => "is_fill_to_full",
            Self::MissedFuelUp => "missed_fuel_up",
            Self::Notes => "notes",
        }
    }

    /// Name used by the destination API (lowerCamelCase)
    #[must_use]
    pub fn api_name(self) -> String {
        to_lower_camel_case(self.name())
    }
}

impl fmt::Display for FillupField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single field value, typed so differing fields can be compared and shown.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Date(NaiveDate),
    Integer(i64),
    Decimal(f64),
    Flag(bool),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{date}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Decimal(value) if value.fract() == 0.0 => write!(f, "{value:.1}"),
            Self::Decimal(value) => write!(f, "{value}"),
            Self::Flag(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// One field on which an incoming fillup disagrees with an existing one.
#[derive(Debug, Clone, PartialEq)]
pub struct Discrepancy {
    pub field: FillupField,
    pub existing: FieldValue,
    pub incoming: FieldValue,
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.field, self.existing, self.incoming)
    }
}
