use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::domain::{Booking, ValidationError};

/// Percent-of-cap at which the usage tier moves from Ok to Warning.
pub const WARNING_USAGE_PERCENT: f64 = 75.0;
/// Percent-of-cap at which the usage tier moves to Danger.
pub const DANGER_USAGE_PERCENT: f64 = 90.0;

/// Alert tier driven by percent of the annual night cap consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapUsage {
    Ok,
    Warning,
    Danger,
}

impl CapUsage {
    pub const fn label(self) -> &'static str {
        match self {
            CapUsage::Ok => "ok",
            CapUsage::Warning => "warning",
            CapUsage::Danger => "danger",
        }
    }

    fn from_percent(percent: Option<f64>) -> Self {
        match percent {
            Some(pct) if pct >= DANGER_USAGE_PERCENT => Self::Danger,
            Some(pct) if pct >= WARNING_USAGE_PERCENT => Self::Warning,
            _ => Self::Ok,
        }
    }
}

/// Night-cap usage for one property and one calendar year. Derived on every
/// query from the booking rows; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSummary {
    pub year: i32,
    pub total_nights: i64,
    pub night_cap: Option<u32>,
    pub remaining: Option<i64>,
    pub percent_used: Option<f64>,
    pub usage: CapUsage,
}

/// Reject a stay whose check-out does not fall strictly after its check-in.
/// Applied to the proposed dates on both create and edit.
pub fn validate_stay(check_in: NaiveDate, check_out: NaiveDate) -> Result<(), ValidationError> {
    if check_out <= check_in {
        return Err(ValidationError::StayOrder {
            check_in,
            check_out,
        });
    }
    Ok(())
}

/// Total nights consumed in `year` and how they measure against the cap.
///
/// A booking counts toward the calendar year of its check-in date, even when
/// the stay crosses into the next year. A cap of zero behaves as uncapped.
pub fn year_summary(year: i32, night_cap: Option<u32>, bookings: &[Booking]) -> YearSummary {
    let total_nights: i64 = bookings
        .iter()
        .filter(|booking| booking.check_in.year() == year)
        .map(Booking::nights)
        .sum();

    let cap = night_cap.filter(|cap| *cap > 0);
    let remaining = cap.map(|cap| (i64::from(cap) - total_nights).max(0));
    let percent_used = cap.map(|cap| (total_nights as f64 / f64::from(cap) * 100.0).min(100.0));

    YearSummary {
        year,
        total_nights,
        night_cap: cap,
        remaining,
        percent_used,
        usage: CapUsage::from_percent(percent_used),
    }
}
