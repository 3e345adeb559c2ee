use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    aggregate::{DayBucket, TrendBucket, WindowStats},
    dashboard::{BucketSeries, DashboardView},
    db::models::Device,
    timeline::Granularity,
};

/// Telemetry payload pushed by the ingestion client. The period bucket is
/// deliberately absent — it is recomputed server-side at ingestion time.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IngestRequest {
    pub device_id: i64,
    pub temperature: f64,
    pub humidity: f64,
    pub voltage: f64,
    /// "ON" or "OFF", any case.
    pub lights: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeviceDto {
    pub id: i64,
    pub device_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<Device> for DeviceDto {
    fn from(d: Device) -> Self {
        Self {
            id: d.id,
            device_name: d.device_name,
            created_at: d.created_at,
        }
    }
}

/// Bucket rows of a dashboard window. Day views carry latest-wins period
/// rows; week and month views carry per-date trend rows.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum SeriesDto {
    Day(Vec<DayBucket>),
    Trend(Vec<TrendBucket>),
}

/// Response for `GET /dashboard`.
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub view: Granularity,
    /// Canonical anchor token for the window actually served (the request
    /// token may have been malformed and silently replaced).
    pub selected_date: String,
    pub prev_date: String,
    pub next_date: String,
    pub devices: Vec<DeviceDto>,
    pub data: SeriesDto,
    pub stats: WindowStats,
}

impl From<DashboardView> for DashboardResponse {
    fn from(v: DashboardView) -> Self {
        Self {
            view: v.granularity,
            selected_date: v.selected,
            prev_date: v.prev,
            next_date: v.next,
            devices: v.devices.into_iter().map(Into::into).collect(),
            data: match v.series {
                BucketSeries::Day(rows) => SeriesDto::Day(rows),
                BucketSeries::Trend(rows) => SeriesDto::Trend(rows),
            },
            stats: v.stats,
        }
    }
}
