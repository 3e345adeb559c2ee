mod service;

pub use service::{BucketSeries, DashboardService, DashboardView};
