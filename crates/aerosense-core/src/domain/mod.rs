//! Canonical domain types shared by every provider adapter.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Measurement`] | One normalized pollutant reading |
//! | [`Pollutant`] | Canonical pollutant identifier |
//! | [`Coordinates`] | Latitude/longitude pair |
//! | [`GeocodeResult`] | Resolved city position and display label |
//! | [`UtcDateTime`] | RFC3339 instant in UTC |
//!
//! All values are request scoped: adapters build them fresh per call and
//! never mutate them afterwards.

mod measurement;
mod timestamp;

pub use measurement::{Coordinates, GeocodeResult, Measurement, Pollutant};
pub use timestamp::UtcDateTime;
