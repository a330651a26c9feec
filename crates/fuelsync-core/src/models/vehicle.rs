//! Destination vehicle model

use serde::{Deserialize, Deserializer};

/// Vehicle as described by the destination's `/api/vehicles` listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInfo {
    pub id: i64,
    #[serde(default, deserialize_with = "year_from_any")]
    pub year: Option<i64>,
    #[serde(default)]
    pub make: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub license_plate: String,
}

impl VehicleInfo {
    /// Human-readable label, e.g. `2019 Honda Civic (AB12 CDE)`
    #[must_use]
    pub fn title(&self) -> String {
        let mut parts = Vec::new();
        if let Some(year) = self.year {
            parts.push(year.to_string());
        }
        for part in [&self.make, &self.model] {
            if !part.trim().is_empty() {
                parts.push(part.trim().to_string());
            }
        }
        if !self.license_plate.trim().is_empty() {
            parts.push(format!("({})", self.license_plate.trim()));
        }
        if parts.is_empty() {
            format!("vehicle {}", self.id)
        } else {
            parts.join(" ")
        }
    }
}

// Lubelogger has served the year both as a number and as a string.
fn year_from_any<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(number)) => number.as_i64(),
        Some(serde_json::Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    })
}
