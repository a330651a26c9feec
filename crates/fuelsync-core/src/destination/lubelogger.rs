//! Lubelogger REST client.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Deserializer};

use super::FillupDestination;
use crate::config::SyncConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::models::{FieldValue, FillupField, FillupRecord, VehicleInfo};
use crate::util::{compact_text, ensure_success};

const SERVICE_NAME: &str = "Lubelogger";

/// Connection settings for a Lubelogger instance.
#[derive(Clone)]
pub struct LubeloggerSettings {
    pub url: String,
    pub username: String,
    pub password: String,
    pub date_format: String,
    pub timeout: Duration,
}

impl LubeloggerSettings {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            url: config.lubelogger_url.clone(),
            username: config.lubelogger_username.clone(),
            password: config.lubelogger_password.clone(),
            date_format: config.lubelogger_date_format.clone(),
            timeout: config.request_timeout(),
        }
    }
}

impl std::fmt::Debug for LubeloggerSettings {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("LubeloggerSettings")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("date_format", &self.date_format)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Clone)]
pub struct LubeloggerClient {
    base_url: String,
    username: String,
    password: String,
    date_format: String,
    client: Client,
}

/// Gas record as served by `/api/vehicle/gasrecords`. Lubelogger sends most
/// values as text, including booleans (`"True"`/`"False"`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiFillup {
    date: String,
    #[serde(deserialize_with = "text_from_any")]
    odometer: String,
    #[serde(deserialize_with = "text_from_any")]
    fuel_consumed: String,
    #[serde(deserialize_with = "text_from_any")]
    cost: String,
    #[serde(default, deserialize_with = "text_from_any")]
    is_fill_to_full: String,
    #[serde(default, deserialize_with = "text_from_any")]
    missed_fuel_up: String,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OperationResponse {
    success: Option<bool>,
    message: Option<String>,
}

impl ApiFillup {
    #[allow(clippy::cast_possible_truncation)]
    fn into_record(self, date_format: &str) -> Result<FillupRecord> {
        let date = NaiveDate::parse_from_str(self.date.trim(), date_format).map_err(|error| {
            Error::InvalidInput(format!(
                "date '{}' does not match '{date_format}': {error}",
                self.date
            ))
        })?;
        let odometer = self
            .odometer
            .trim()
            .parse::<i64>()
            .or_else(|_| {
                parse_decimal(&self.odometer, "odometer").map(|value| value.trunc() as i64)
            })?;

        Ok(FillupRecord::new(
            date,
            odometer,
            parse_decimal(&self.fuel_consumed, "fuelConsumed")?,
            parse_decimal(&self.cost, "cost")?,
            parse_api_flag(&self.is_fill_to_full),
            parse_api_flag(&self.missed_fuel_up),
        )
        .with_notes(self.notes.unwrap_or_default()))
    }
}

fn parse_decimal(raw: &str, field: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| Error::InvalidInput(format!("{field} '{raw}' is not a number")))
}

fn parse_api_flag(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}

const fn api_flag(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

fn text_from_any<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(text)) => text,
        Some(serde_json::Value::Number(number)) => number.to_string(),
        Some(serde_json::Value::Bool(flag)) => api_flag(flag).to_string(),
        _ => String::new(),
    })
}

impl LubeloggerClient {
    pub fn new(settings: LubeloggerSettings) -> Result<Self> {
        Ok(Self {
            base_url: settings.url.trim_end_matches('/').to_string(),
            username: settings.username,
            password: settings.password,
            date_format: settings.date_format,
            client: Client::builder().timeout(settings.timeout).build()?,
        })
    }

    /// List a vehicle's fillups, surfacing transport failures instead of
    /// hiding them.
    ///
    /// A record that cannot be read fails the whole listing, since leaving
    /// it out would let its source counterpart be inserted a second time.
    pub async fn try_list_fillups(&self, vehicle_id: i64) -> Result<Vec<FillupRecord>> {
        let response = self
            .client
            .get(format!("{}/api/vehicle/gasrecords", self.base_url))
            .basic_auth(&self.username, Some(&self.password))
            .query(&[("vehicleId", vehicle_id)])
            .send()
            .await?;
        let body = ensure_success(response, SERVICE_NAME).await?.text().await?;
        let payload: Vec<ApiFillup> = serde_json::from_str(&body)?;

        payload
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                raw.into_record(&self.date_format).map_err(|error| {
                    Error::InvalidInput(format!(
                        "unreadable Lubelogger fillup #{} for vehicle {vehicle_id}: {error}",
                        index + 1
                    ))
                })
            })
            .collect()
    }

    /// Form body for `/api/vehicle/gasrecords/add`, in schema order.
    pub fn to_api_form(&self, fillup: &FillupRecord) -> Vec<(String, String)> {
        FillupField::ALL
            .iter()
            .map(|&field| {
                let value = match fillup.value(field) {
                    FieldValue::Date(date) => date.format(&self.date_format).to_string(),
                    FieldValue::Flag(flag) => api_flag(flag).to_string(),
                    other => other.to_string(),
                };
                (field.api_name(), value)
            })
            .collect()
    }
}

impl FillupDestination for LubeloggerClient {
    async fn list_fillups(&self, vehicle_id: i64) -> Result<Vec<FillupRecord>> {
        match self.try_list_fillups(vehicle_id).await {
            Ok(fillups) => Ok(fillups),
            Err(error) if error.is_timeout() => {
                tracing::error!(
                    "Lubelogger API timed out listing fillups for vehicle {vehicle_id}"
                );
                Ok(Vec::new())
            }
            Err(error) if error.kind() == ErrorKind::Transport => {
                tracing::error!(
                    "Failed to list Lubelogger fillups for vehicle {vehicle_id}: {error}"
                );
                Ok(Vec::new())
            }
            Err(error) => Err(error),
        }
    }

    async fn add_fillup(&self, vehicle_id: i64, fillup: &FillupRecord) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/api/vehicle/gasrecords/add", self.base_url))
            .basic_auth(&self.username, Some(&self.password))
            .query(&[("vehicleId", vehicle_id)])
            .form(&self.to_api_form(fillup))
            .send()
            .await?;
        let body = ensure_success(response, SERVICE_NAME).await?.text().await?;

        // Lubelogger can answer 200 with `{"success": false, "message": ...}`.
        if let Ok(OperationResponse {
            success: Some(false),
            message,
        }) = serde_json::from_str::<OperationResponse>(&body)
        {
            return Err(Error::Api(format!(
                "{SERVICE_NAME} rejected fillup: {}",
                compact_text(message.as_deref().unwrap_or("no message"))
            )));
        }
        Ok(())
    }

    async fn vehicle_info(&self, vehicle_id: i64) -> Result<VehicleInfo> {
        let response = self
            .client
            .get(format!("{}/api/vehicles", self.base_url))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;
        let vehicles = ensure_success(response, SERVICE_NAME)
            .await?
            .json::<Vec<VehicleInfo>>()
            .await?;
        vehicles
            .into_iter()
            .find(|vehicle| vehicle.id == vehicle_id)
            .ok_or_else(|| Error::NotFound(format!("no Lubelogger vehicle with ID {vehicle_id}")))
    }
}
