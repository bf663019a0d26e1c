use chrono::NaiveDate;
use serde::Serialize;

use super::domain::Permit;

/// Inclusive upper bound (in days) of the Urgent tier.
pub const URGENT_WINDOW_DAYS: i64 = 7;
/// Inclusive upper bound (in days) of the Warning tier.
pub const WARNING_WINDOW_DAYS: i64 = 30;

/// Urgency tier of a permit relative to "today". Recomputed on every read so
/// date drift is always reflected; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryUrgency {
    Expired,
    Urgent,
    Warning,
    Ok,
}

impl ExpiryUrgency {
    pub const fn label(self) -> &'static str {
        match self {
            ExpiryUrgency::Expired => "expired",
            ExpiryUrgency::Urgent => "urgent",
            ExpiryUrgency::Warning => "warning",
            ExpiryUrgency::Ok => "ok",
        }
    }
}

/// Signed day count from `today` to `expiry`; negative once expired. `None`
/// when the permit carries no expiry date.
pub fn days_until(expiry: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
    expiry.map(|date| (date - today).num_days())
}

/// Tier for an exact day offset.
pub fn classify_days(days_until_expiry: i64) -> ExpiryUrgency {
    if days_until_expiry < 0 {
        ExpiryUrgency::Expired
    } else if days_until_expiry <= URGENT_WINDOW_DAYS {
        ExpiryUrgency::Urgent
    } else if days_until_expiry <= WARNING_WINDOW_DAYS {
        ExpiryUrgency::Warning
    } else {
        ExpiryUrgency::Ok
    }
}

/// Tier for a permit's expiry date, `None` when unclassifiable.
pub fn classify(expiry: Option<NaiveDate>, today: NaiveDate) -> Option<ExpiryUrgency> {
    days_until(expiry, today).map(classify_days)
}

/// Dashboard ordering: ascending by expiry date, permits without one last.
pub fn sort_by_expiry(permits: &mut [Permit]) {
    permits.sort_by_key(|permit| match permit.expiry_date {
        Some(date) => (false, date),
        None => (true, NaiveDate::MAX),
    });
}
