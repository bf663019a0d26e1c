use super::common::*;
use crate::workflows::compliance::expiry::{classify, days_until, sort_by_expiry, ExpiryUrgency};

#[test]
fn tier_boundaries_around_today() {
    let today = date(2025, 8, 15);

    let cases = [
        (-30, ExpiryUrgency::Expired),
        (-1, ExpiryUrgency::Expired),
        (0, ExpiryUrgency::Urgent),
        (7, ExpiryUrgency::Urgent),
        (8, ExpiryUrgency::Warning),
        (30, ExpiryUrgency::Warning),
        (31, ExpiryUrgency::Ok),
        (365, ExpiryUrgency::Ok),
    ];

    for (offset, expected) in cases {
        let expiry = today + chrono::Duration::days(offset);
        assert_eq!(
            classify(Some(expiry), today),
            Some(expected),
            "offset {offset} should classify as {expected:?}"
        );
    }
}

#[test]
fn missing_expiry_is_never_classified() {
    let today = date(2025, 8, 15);
    assert_eq!(classify(None, today), None);
    assert_eq!(days_until(None, today), None);
}

#[test]
fn days_until_is_signed() {
    let today = date(2025, 8, 15);
    assert_eq!(days_until(Some(date(2025, 8, 22)), today), Some(7));
    assert_eq!(days_until(Some(date(2025, 8, 14)), today), Some(-1));
}

#[test]
fn ordering_is_ascending_with_undated_last() {
    let mut permits = vec![
        permit("p-none", None),
        permit("p-late", Some(date(2026, 1, 1))),
        permit("p-soon", Some(date(2025, 9, 1))),
    ];
    sort_by_expiry(&mut permits);

    let order: Vec<&str> = permits.iter().map(|p| p.id.0.as_str()).collect();
    assert_eq!(order, ["p-soon", "p-late", "p-none"]);
}

#[test]
fn renewal_advances_expiry_one_year_and_reactivates() {
    use crate::workflows::compliance::domain::PermitStatus;

    let mut renewed = permit("p1", Some(date(2025, 3, 1)));
    renewed.status = PermitStatus::Expired;
    renewed.renew().expect("permit has an expiry date");

    assert_eq!(renewed.expiry_date, Some(date(2026, 3, 1)));
    assert_eq!(renewed.status, PermitStatus::Active);
}

#[test]
fn renewal_without_expiry_is_rejected() {
    use crate::workflows::compliance::domain::ValidationError;

    let mut undated = permit("p1", None);
    assert!(matches!(
        undated.renew(),
        Err(ValidationError::RenewWithoutExpiry)
    ));
}

#[test]
fn renewal_past_the_calendar_ceiling_leaves_the_permit_untouched() {
    use crate::workflows::compliance::domain::{PermitStatus, ValidationError};

    let mut extreme = permit("p1", Some(chrono::NaiveDate::MAX));
    extreme.status = PermitStatus::Expired;
    let before = extreme.clone();

    assert!(matches!(
        extreme.renew(),
        Err(ValidationError::ExpiryOutOfRange(_))
    ));
    assert_eq!(extreme, before);
}

#[test]
fn leap_day_renewal_clamps_to_february_end() {
    let mut leap = permit("p1", Some(date(2024, 2, 29)));
    leap.renew().expect("permit has an expiry date");
    assert_eq!(leap.expiry_date, Some(date(2025, 2, 28)));
}
