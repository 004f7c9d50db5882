//! Upstream provider adapters.
//!
//! | Adapter | Role | Credential |
//! |---------|------|------------|
//! | [`OpenAqAdapter`] | primary measurement search | `X-API-Key` header |
//! | [`OpenWeatherMapAdapter`] | secondary, geocode + air pollution | `appid` query parameter |

pub mod geocoding;
pub mod openaq;
pub mod openweathermap;

pub use geocoding::{OpenWeatherMapGeocoder, OPENWEATHERMAP_BASE_URL};
pub use openaq::{OpenAqAdapter, OPENAQ_BASE_URL};
pub use openweathermap::{extract_components, OpenWeatherMapAdapter};
