//! Destination fillup logs.

mod lubelogger;

use crate::error::Result;
use crate::models::{FillupRecord, VehicleInfo};

pub use lubelogger::{LubeloggerClient, LubeloggerSettings};

/// The long-term fillup log that missing source fillups are copied into.
#[allow(async_fn_in_trait)]
pub trait FillupDestination {
    /// Every fillup logged for a vehicle.
    ///
    /// Timeouts and HTTP failures are logged by the implementation and
    /// yield an empty list. A listing that arrives but cannot be read is an
    /// error, so the pass stops before inserting anything.
    async fn list_fillups(&self, vehicle_id: i64) -> Result<Vec<FillupRecord>>;

    /// Submit one new fillup. Errors are returned for the caller to log;
    /// there is no retry.
    async fn add_fillup(&self, vehicle_id: i64, fillup: &FillupRecord) -> Result<()>;

    /// Describe a vehicle, failing with `NotFound` when it does not exist.
    async fn vehicle_info(&self, vehicle_id: i64) -> Result<VehicleInfo>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::cell::RefCell;

    use chrono::NaiveDate;

    use super::FillupDestination;
    use crate::error::{Error, Result};
    use crate::models::{FillupRecord, VehicleInfo};

    /// In-memory destination that records every insert it receives.
    #[derive(Default)]
    pub struct RecordingDestination {
        pub log: RefCell<Vec<FillupRecord>>,
        pub added: RefCell<Vec<FillupRecord>>,
        pub reject_dates: Vec<NaiveDate>,
        pub vehicles: Vec<VehicleInfo>,
    }

    impl RecordingDestination {
        pub fn with_log(log: Vec<FillupRecord>) -> Self {
            Self {
                log: RefCell::new(log),
                ..Self::default()
            }
        }

        pub fn added(&self) -> Vec<FillupRecord> {
            self.added.borrow().clone()
        }
    }

    impl FillupDestination for RecordingDestination {
        async fn list_fillups(&self, _vehicle_id: i64) -> Result<Vec<FillupRecord>> {
            Ok(self.log.borrow().clone())
        }

        async fn add_fillup(&self, _vehicle_id: i64, fillup: &FillupRecord) -> Result<()> {
            if self.reject_dates.contains(&fillup.date()) {
                return Err(Error::Api("Lubelogger returned HTTP 500".to_string()));
            }
            self.added.borrow_mut().push(fillup.clone());
            self.log.borrow_mut().push(fillup.clone());
            Ok(())
        }

        async fn vehicle_info(&self, vehicle_id: i64) -> Result<VehicleInfo> {
            self.vehicles
                .iter()
                .find(|vehicle| vehicle.id == vehicle_id)
                .cloned()
                .ok_or_else(|| {
                    Error::NotFound(format!("no Lubelogger vehicle with ID {vehicle_id}"))
                })
        }
    }
}
