use std::sync::Arc;

use serde::Serialize;

use crate::config::ReminderConfig;

use super::repository::{Clock, RecordStore, ReminderCandidate, ReminderEmail, ReminderSender};

/// Day-offsets before expiry at which exactly one reminder fires per permit.
/// The offsets are disjoint, so threshold processing order is irrelevant.
pub const REMINDER_THRESHOLDS: [u16; 3] = [60, 30, 7];

/// Daily sweep over active permits crossing a reminder threshold. Stateless
/// between runs except for the dispatch ledger, which makes re-running the
/// same day's sweep a no-op for already-notified (permit, threshold) pairs.
pub struct ReminderSweep<S, N, C> {
    store: Arc<S>,
    sender: Arc<N>,
    clock: Arc<C>,
    config: ReminderConfig,
}

/// Outcome counters for one sweep execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Notifications handed to the sender successfully.
    pub sent: usize,
    /// Sends whose ledger write found an existing row (an overlapping sweep
    /// got there first).
    pub skipped: usize,
    /// Permits whose notification failed; retried on the next scheduled run.
    pub failed: usize,
}

impl<S, N, C> ReminderSweep<S, N, C>
where
    S: RecordStore + 'static,
    N: ReminderSender + 'static,
    C: Clock + 'static,
{
    pub fn new(store: Arc<S>, sender: Arc<N>, clock: Arc<C>, config: ReminderConfig) -> Self {
        Self {
            store,
            sender,
            clock,
            config,
        }
    }

    /// Run one sweep. Sends first, records second: a crash between the two
    /// can re-send on the next run, an accepted at-least-once tradeoff since
    /// the notification transport is not transactional with the ledger.
    /// Failures are isolated per permit and never abort the sweep.
    pub fn run(&self) -> SweepReport {
        let today = self.clock.today();
        let mut report = SweepReport::default();

        for days_before in REMINDER_THRESHOLDS {
            let candidates = match self.store.due_reminders(days_before, today) {
                Ok(candidates) => candidates,
                Err(error) => {
                    tracing::error!(days_before, %error, "reminder query failed, skipping threshold");
                    continue;
                }
            };

            for candidate in candidates {
                let permit_id = candidate.permit.id.clone();
                let email = renewal_notice(&candidate, days_before, &self.config);

                if let Err(error) = self.sender.send(&email) {
                    tracing::warn!(
                        permit_id = %permit_id.0,
                        days_before,
                        %error,
                        "reminder send failed"
                    );
                    report.failed += 1;
                    continue;
                }

                match self.store.record_dispatch(&permit_id, days_before, today) {
                    Ok(true) => {
                        tracing::info!(
                            permit_id = %permit_id.0,
                            days_before,
                            to = %candidate.owner_email,
                            "reminder sent"
                        );
                        report.sent += 1;
                    }
                    Ok(false) => {
                        tracing::info!(
                            permit_id = %permit_id.0,
                            days_before,
                            "dispatch already recorded by a concurrent sweep"
                        );
                        report.skipped += 1;
                    }
                    Err(error) => {
                        // The email went out; count it as sent so operators
                        // see the true dispatch volume.
                        tracing::error!(
                            permit_id = %permit_id.0,
                            days_before,
                            %error,
                            "dispatch ledger write failed after send"
                        );
                        report.sent += 1;
                    }
                }
            }
        }

        report
    }
}

/// Render the renewal notice for one due permit.
fn renewal_notice(
    candidate: &ReminderCandidate,
    days_before: u16,
    config: &ReminderConfig,
) -> ReminderEmail {
    let permit = &candidate.permit;
    let subject = format!(
        "Permit expiring in {days_before} days - {name}",
        name = permit.name
    );

    let greeting = candidate.owner_name.as_deref().unwrap_or("there");
    let location = match &candidate.property_city {
        Some(city) => format!("{} in {}", candidate.property_name, city),
        None => candidate.property_name.clone(),
    };

    let mut body = format!(
        "Hi {greeting},\n\n\
         Your {name} for {location} expires in {days_before} days.\n",
        name = permit.name,
    );
    if let Some(expiry) = permit.expiry_date {
        body.push_str(&format!("Expiry date: {expiry}\n"));
    }
    if let Some(number) = &permit.permit_number {
        body.push_str(&format!("Permit number: {number}\n"));
    }
    body.push_str(&format!(
        "\nView your dashboard: {url}\n\n\
         StayCompliant - permit tracker for STR hosts\n",
        url = config.dashboard_url,
    ));

    ReminderEmail {
        from: config.from_address.clone(),
        to: candidate.owner_email.clone(),
        subject,
        body,
    }
}
