use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Upstream providers known to the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Primary measurement search provider.
    OpenAq,
    /// Secondary geocode + air pollution provider.
    OpenWeatherMap,
}

impl ProviderId {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAq => "openaq",
            Self::OpenWeatherMap => "openweathermap",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
