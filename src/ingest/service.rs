use anyhow::Result;
use chrono::{Local, Timelike};
use sqlx::PgPool;
use tracing::info;

use crate::db::models::{LightsState, Period, Sample};

/// Classifies a time of day into its period bucket: hour < 12 → Morning,
/// 12 ≤ hour < 18 → Afternoon, otherwise Evening.
pub fn classify_period(hour: u32) -> Period {
    match hour {
        0..=11 => Period::Morning,
        12..=17 => Period::Afternoon,
        _ => Period::Evening,
    }
}

/// Normalizes and appends incoming telemetry samples.
///
/// The server's clock is authoritative: date, weekday name, and period
/// bucket are derived from the current local time at ingestion, never from
/// anything the device sends. Telemetry values are stored as given — no
/// range validation. Duplicate deliveries land as additional rows.
pub struct IngestService {
    pool: PgPool,
}

impl IngestService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// True if a device with this id is registered.
    pub async fn device_exists(&self, device_id: i64) -> Result<bool> {
        let id: Option<i64> = sqlx::query_scalar("SELECT id FROM devices WHERE id = $1")
            .bind(device_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id.is_some())
    }

    /// Stamps the sample with the server's current date, weekday, and
    /// period, then appends one immutable row. The store sets
    /// `recorded_at` at insert time.
    pub async fn record(
        &self,
        device_id: i64,
        temperature: f64,
        humidity: f64,
        voltage: f64,
        lights: LightsState,
    ) -> Result<Sample> {
        let now = Local::now();
        let sample_date = now.date_naive();
        let day_name = sample_date.format("%A").to_string();
        let period = classify_period(now.hour());

        let sample = sqlx::query_as::<_, Sample>(
            r#"
            INSERT INTO samples
                (device_id, sample_date, day_name, period,
                 temperature, humidity, voltage, lights)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, device_id, sample_date, day_name, period,
                      temperature, humidity, voltage, lights, recorded_at
            "#,
        )
        .bind(device_id)
        .bind(sample_date)
        .bind(&day_name)
        .bind(period)
        .bind(temperature)
        .bind(humidity)
        .bind(voltage)
        .bind(lights)
        .fetch_one(&self.pool)
        .await?;

        info!(
            device_id,
            period = %sample.period,
            temperature,
            humidity,
            voltage,
            lights = %sample.lights,
            "Telemetry sample persisted"
        );
        Ok(sample)
    }
}
