use anyhow::Result;
use chrono::{Local, NaiveDate};
use sqlx::PgPool;
use tracing::debug;

use crate::{
    aggregate::{self, DayBucket, TrendBucket, WindowStats},
    db::models::{Device, Sample},
    timeline::{self, Granularity},
};

/// Bucket rows for one window; the shape depends on the granularity.
#[derive(Debug, Clone, PartialEq)]
pub enum BucketSeries {
    Day(Vec<DayBucket>),
    Trend(Vec<TrendBucket>),
}

/// Everything the presentation layer needs to render one dashboard window.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub granularity: Granularity,
    pub selected: String,
    pub prev: String,
    pub next: String,
    pub devices: Vec<Device>,
    pub series: BucketSeries,
    pub stats: WindowStats,
}

/// Serves the aggregation query contract: resolves the anchor, computes
/// the window, and folds the user's raw samples into bucket rows and
/// summary statistics.
pub struct DashboardService {
    pool: PgPool,
}

impl DashboardService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Builds the view for `user_id` anchored at `anchor_token` (or today).
    pub async fn view(
        &self,
        user_id: i64,
        granularity: Granularity,
        anchor_token: Option<&str>,
    ) -> Result<DashboardView> {
        self.view_at(user_id, granularity, anchor_token, Local::now().date_naive())
            .await
    }

    /// Like [`view`](Self::view) with an explicit "today", so the fallback
    /// and token synthesis are deterministic under test.
    pub async fn view_at(
        &self,
        user_id: i64,
        granularity: Granularity,
        anchor_token: Option<&str>,
        today: NaiveDate,
    ) -> Result<DashboardView> {
        let anchor = timeline::resolve(granularity, anchor_token, today);
        let window = timeline::compute(granularity, anchor.date);
        debug!(
            user_id,
            ?granularity,
            selected = %anchor.token,
            start = %window.start,
            end = %window.end,
            "Resolved dashboard window"
        );

        let devices = self.devices_for_user(user_id).await?;
        let empty_series = || match granularity {
            Granularity::Day => BucketSeries::Day(Vec::new()),
            _ => BucketSeries::Trend(Vec::new()),
        };

        // No devices means nothing to query; an empty series is a valid
        // outcome and navigation tokens are still meaningful.
        if devices.is_empty() {
            return Ok(DashboardView {
                granularity,
                selected: anchor.token,
                prev: window.prev_token,
                next: window.next_token,
                devices,
                series: empty_series(),
                stats: WindowStats::default(),
            });
        }

        let device_ids: Vec<i64> = devices.iter().map(|d| d.id).collect();
        let samples = self
            .samples_in_window(&device_ids, window.start, window.end)
            .await?;

        let series = match granularity {
            Granularity::Day => BucketSeries::Day(aggregate::day_series(&samples)),
            Granularity::Week | Granularity::Month => {
                BucketSeries::Trend(aggregate::trend_series(&samples))
            }
        };
        let stats = aggregate::window_stats(&samples);

        Ok(DashboardView {
            granularity,
            selected: anchor.token,
            prev: window.prev_token,
            next: window.next_token,
            devices,
            series,
            stats,
        })
    }

    async fn devices_for_user(&self, user_id: i64) -> Result<Vec<Device>> {
        let devices = sqlx::query_as::<_, Device>(
            "SELECT id, user_id, device_name, created_at \
             FROM devices WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(devices)
    }

    async fn samples_in_window(
        &self,
        device_ids: &[i64],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Sample>> {
        let samples = sqlx::query_as::<_, Sample>(
            r#"
            SELECT id, device_id, sample_date, day_name, period,
                   temperature, humidity, voltage, lights, recorded_at
            FROM samples
            WHERE device_id = ANY($1)
              AND sample_date BETWEEN $2 AND $3
            ORDER BY sample_date ASC, recorded_at ASC, id ASC
            "#,
        )
        .bind(device_ids)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(samples)
    }
}
