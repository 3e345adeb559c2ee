//! Pure aggregation over raw sample sets.
//!
//! The dashboard service fetches every sample in the query window once;
//! these functions fold that set into the day-view buckets (latest sample
//! wins per period), the week/month trend buckets (per-date arithmetic
//! means), and the window-level summary statistics.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::models::{LightsState, Period, Sample};

/// One day-view row: the most recently ingested values for a
/// `(period, date)` bucket. Values are never averaged here.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DayBucket {
    pub period: Period,
    pub date: NaiveDate,
    pub temperature: f64,
    pub humidity: f64,
    pub voltage: f64,
    pub lights: LightsState,
}

/// One week/month-view row: per-date means plus the share of samples with
/// lights on.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TrendBucket {
    pub date: NaiveDate,
    pub avg_temp: f64,
    pub avg_hum: f64,
    pub avg_voltage: f64,
    pub lights_on_pct: f64,
}

/// Window-level summary statistics. All fields are null when the window
/// holds no samples — an empty window is a valid outcome, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct WindowStats {
    pub low_temp: Option<f64>,
    pub high_temp: Option<f64>,
    pub low_hum: Option<f64>,
    pub high_hum: Option<f64>,
    pub avg_voltage: Option<f64>,
}

/// Builds the day-view series: one row per period bucket with at least one
/// sample, in fixed Morning → Afternoon → Evening order.
///
/// Within a bucket the sample with the latest `recorded_at` wins; ties on
/// the timestamp resolve to the highest row id, so re-delivered duplicates
/// pick a deterministic winner.
pub fn day_series(samples: &[Sample]) -> Vec<DayBucket> {
    Period::ALL
        .iter()
        .filter_map(|&period| {
            samples
                .iter()
                .filter(|s| s.period == period)
                .max_by_key(|s| (s.recorded_at, s.id))
                .map(|latest| DayBucket {
                    period,
                    date: latest.sample_date,
                    temperature: latest.temperature,
                    humidity: latest.humidity,
                    voltage: latest.voltage,
                    lights: latest.lights,
                })
        })
        .collect()
}

/// Builds the week/month-view series: one row per calendar date with at
/// least one sample, ascending by date. Temperature, humidity, and voltage
/// are arithmetic means rounded to 2 decimals; `lights_on_pct` is
/// `100 * count(ON) / count(*)` rounded to 1 decimal.
pub fn trend_series(samples: &[Sample]) -> Vec<TrendBucket> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&Sample>> = BTreeMap::new();
    for sample in samples {
        by_date.entry(sample.sample_date).or_default().push(sample);
    }

    by_date
        .into_iter()
        .map(|(date, group)| {
            let n = group.len() as f64;
            let on = group
                .iter()
                .filter(|s| s.lights == LightsState::On)
                .count() as f64;
            TrendBucket {
                date,
                avg_temp: round2(group.iter().map(|s| s.temperature).sum::<f64>() / n),
                avg_hum: round2(group.iter().map(|s| s.humidity).sum::<f64>() / n),
                avg_voltage: round2(group.iter().map(|s| s.voltage).sum::<f64>() / n),
                lights_on_pct: round1(100.0 * on / n),
            }
        })
        .collect()
}

/// Computes min/max temperature and humidity plus the mean voltage
/// (rounded to 2 decimals) over the whole window.
pub fn window_stats(samples: &[Sample]) -> WindowStats {
    if samples.is_empty() {
        return WindowStats::default();
    }

    let temps = || samples.iter().map(|s| s.temperature);
    let hums = || samples.iter().map(|s| s.humidity);
    let voltage_sum: f64 = samples.iter().map(|s| s.voltage).sum();

    WindowStats {
        low_temp: Some(temps().fold(f64::INFINITY, f64::min)),
        high_temp: Some(temps().fold(f64::NEG_INFINITY, f64::max)),
        low_hum: Some(hums().fold(f64::INFINITY, f64::min)),
        high_hum: Some(hums().fold(f64::NEG_INFINITY, f64::max)),
        avg_voltage: Some(round2(voltage_sum / samples.len() as f64)),
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
