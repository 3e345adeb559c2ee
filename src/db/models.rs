use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Mirrors the `period` Postgres enum.
///
/// Every sample is classified into one of three time-of-day buckets at
/// ingestion time (server clock): hour < 12 → Morning, hour < 18 →
/// Afternoon, otherwise Evening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "period")]
pub enum Period {
    Morning,
    Afternoon,
    Evening,
}

impl Period {
    /// Fixed presentation order for day-view buckets.
    pub const ALL: [Period; 3] = [Period::Morning, Period::Afternoon, Period::Evening];
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Period::Morning => "Morning",
            Period::Afternoon => "Afternoon",
            Period::Evening => "Evening",
        };
        f.write_str(s)
    }
}

/// Mirrors the `lights_state` Postgres enum. Carried as a discrete state,
/// never averaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lights_state", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum LightsState {
    On,
    Off,
}

impl FromStr for LightsState {
    type Err = anyhow::Error;

    /// Case-normalizes upward, so devices may report `on`/`On`/`ON`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ON" => Ok(Self::On),
            "OFF" => Ok(Self::Off),
            other => Err(anyhow::anyhow!("unknown lights state: {other:?}")),
        }
    }
}

impl fmt::Display for LightsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LightsState::On => "ON",
            LightsState::Off => "OFF",
        })
    }
}

/// A sensor device owned by exactly one user. Aggregation queries are
/// always scoped to the full device set of the requesting user.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Device {
    pub id: i64,
    pub user_id: i64,
    pub device_name: String,
    pub created_at: DateTime<Utc>,
}

/// One immutable telemetry sample. Append-only; many samples may share a
/// `(device_id, sample_date, period)` triple, and the one with the latest
/// `recorded_at` is the "current" value for that bucket.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Sample {
    pub id: i64,
    pub device_id: i64,
    pub sample_date: NaiveDate,
    /// Weekday name derived from `sample_date` at ingestion (e.g. "Monday").
    pub day_name: String,
    pub period: Period,
    pub temperature: f64,
    pub humidity: f64,
    pub voltage: f64,
    pub lights: LightsState,
    pub recorded_at: DateTime<Utc>,
}
