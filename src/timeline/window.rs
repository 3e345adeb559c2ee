use chrono::{Duration, NaiveDate};

use super::{anchor::format_token, first_of_month, monday_of, Granularity};

/// The inclusive query window for a resolved anchor, plus the anchor tokens
/// for the previous and next windows of the same granularity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub prev_token: String,
    pub next_token: String,
}

/// Computes the window covering `anchor` for `granularity`.
///
/// - day: the single anchor date; previous/next are ±1 day.
/// - week: Monday through Sunday of the ISO week containing the anchor;
///   previous/next are the ISO week tokens of the anchor ∓/± 7 days.
/// - month: first through last day of the anchor's month. The last day is
///   derived (day 28 plus 4 days always lands in the following month,
///   whatever the current month's length), so 28/29/30/31-day months and
///   leap years need no special casing.
pub fn compute(granularity: Granularity, anchor: NaiveDate) -> ViewWindow {
    match granularity {
        Granularity::Day => ViewWindow {
            start: anchor,
            end: anchor,
            prev_token: format_token(granularity, anchor - Duration::days(1)),
            next_token: format_token(granularity, anchor + Duration::days(1)),
        },
        Granularity::Week => {
            let start = monday_of(anchor);
            ViewWindow {
                start,
                end: start + Duration::days(6),
                prev_token: format_token(granularity, start - Duration::days(7)),
                next_token: format_token(granularity, start + Duration::days(7)),
            }
        }
        Granularity::Month => {
            let start = first_of_month(anchor);
            let next_first = first_of_month(start + Duration::days(27 + 4));
            ViewWindow {
                start,
                end: next_first - Duration::days(1),
                prev_token: format_token(granularity, start - Duration::days(1)),
                next_token: format_token(granularity, next_first),
            }
        }
    }
}
