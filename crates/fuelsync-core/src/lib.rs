//! fuelsync-core - Core library for fuelsync
//!
//! Reads Fuelio backup extracts, compares them with a vehicle's Lubelogger
//! fuel log, and adds the fillups Lubelogger is missing. Used by the
//! `fuelsync` CLI.

pub mod config;
pub mod destination;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod source;
pub mod sync;
pub mod util;

pub use error::{Error, ErrorKind, Result};
pub use models::FillupRecord;
