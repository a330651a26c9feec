//! Data models for fuelsync

mod fillup;
mod vehicle;

pub use fillup::{Discrepancy, FieldValue, FillupField, FillupRecord, NaturalKey};
pub use vehicle::VehicleInfo;
