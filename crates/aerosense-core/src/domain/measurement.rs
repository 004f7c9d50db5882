use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{UtcDateTime, ValidationError};

/// Pollutant identifier in canonical lowercase form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pollutant {
    Pm25,
    Pm10,
    No2,
    Other(String),
}

impl Pollutant {
    /// Pollutants requested from and extracted out of upstream providers, in output order.
    pub const TRACKED: [Self; 3] = [Self::Pm25, Self::Pm10, Self::No2];

    pub fn parse(label: &str) -> Self {
        let normalized = label.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pm25" | "pm2.5" | "pm2_5" => Self::Pm25,
            "pm10" => Self::Pm10,
            "no2" => Self::No2,
            _ => Self::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pm25 => "pm25",
            Self::Pm10 => "pm10",
            Self::No2 => "no2",
            Self::Other(label) => label,
        }
    }
}

impl Display for Pollutant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Pollutant {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Pollutant {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        if value.trim().is_empty() {
            return Err(D::Error::custom("pollutant label cannot be empty"));
        }
        Ok(Self::parse(&value))
    }
}

/// Latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Canonical air quality reading, independent of the provider it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<Pollutant>,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<UtcDateTime>,
}

impl Measurement {
    pub fn new(value: f64, location: impl Into<String>) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "value" });
        }

        Ok(Self {
            parameter: None,
            value,
            unit: None,
            location: location.into(),
            coordinates: None,
            timestamp: None,
        })
    }

    pub fn with_parameter(mut self, parameter: Option<Pollutant>) -> Self {
        self.parameter = parameter;
        self
    }

    pub fn with_unit(mut self, unit: Option<String>) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_coordinates(mut self, coordinates: Option<Coordinates>) -> Self {
        self.coordinates = coordinates;
        self
    }

    pub fn with_timestamp(mut self, timestamp: Option<UtcDateTime>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// First geocoder match for a free-text city name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub latitude: f64,
    pub longitude: f64,
    pub label: String,
}

impl GeocodeResult {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// Joins the non-empty name parts with `", "`.
    pub fn label_from_parts(name: Option<&str>, state: Option<&str>, country: Option<&str>) -> String {
        [name, state, country]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
