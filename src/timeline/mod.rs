//! Calendar arithmetic for the dashboard views: anchor token parsing and
//! inclusive query windows with previous/next navigation.
//!
//! All date math is explicit (no reliance on store-side date functions) so
//! window semantics are identical across storage engines.

pub mod anchor;
pub mod window;

pub use anchor::{resolve, Anchor};
pub use window::{compute, ViewWindow};

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The three supported view granularities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Week,
    Month,
}

/// Monday of the ISO week containing `date`.
pub(crate) fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Day 1 of the month containing `date`.
pub(crate) fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day()) - 1)
}
