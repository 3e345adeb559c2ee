use chrono::{Datelike, NaiveDate, Weekday};

use super::{first_of_month, monday_of, Granularity};

/// A resolved view anchor: the canonical calendar date plus the canonical
/// token string for the granularity it was resolved under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub date: NaiveDate,
    pub token: String,
}

/// Resolves an optional raw anchor token into a canonical anchor.
///
/// An absent token synthesizes the anchor from `today`. A malformed token
/// (wrong format, out-of-range week, invalid month or day) falls back to
/// `today` silently — a bad anchor never fails the request.
///
/// The resolved date is always canonical for the granularity: week anchors
/// land on the Monday of the ISO week, month anchors on day 1.
pub fn resolve(granularity: Granularity, raw: Option<&str>, today: NaiveDate) -> Anchor {
    let date = raw
        .and_then(|token| parse_token(granularity, token))
        .unwrap_or_else(|| canonical_date(granularity, today));
    Anchor {
        date,
        token: format_token(granularity, date),
    }
}

/// Parses a token in the granularity's expected format. Returns the
/// canonical anchor date, or `None` on any malformation.
fn parse_token(granularity: Granularity, token: &str) -> Option<NaiveDate> {
    match granularity {
        Granularity::Day => NaiveDate::parse_from_str(token, "%Y-%m-%d").ok(),
        Granularity::Week => {
            let (year, week) = token.split_once("-W")?;
            let year: i32 = year.parse().ok()?;
            let week: u32 = week.parse().ok()?;
            // Rejects week 0 and weeks past the last ISO week of `year`.
            NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
        }
        Granularity::Month => {
            let (year, month) = token.split_once('-')?;
            let year: i32 = year.parse().ok()?;
            let month: u32 = month.parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, 1)
        }
    }
}

/// Formats the canonical token for `date` under `granularity`.
pub fn format_token(granularity: Granularity, date: NaiveDate) -> String {
    match granularity {
        Granularity::Day => date.format("%Y-%m-%d").to_string(),
        Granularity::Week => {
            let iso = date.iso_week();
            format!("{}-W{:02}", iso.year(), iso.week())
        }
        Granularity::Month => date.format("%Y-%m").to_string(),
    }
}

fn canonical_date(granularity: Granularity, date: NaiveDate) -> NaiveDate {
    match granularity {
        Granularity::Day => date,
        Granularity::Week => monday_of(date),
        Granularity::Month => first_of_month(date),
    }
}
