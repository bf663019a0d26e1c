use crate::infra::{
    demo_host, parse_date, seed_demo_data, FixedDateClock, InMemoryRecordStore,
    InMemoryReminderSender, LocalArtifactStore,
};
use chrono::{Local, NaiveDate};
use clap::Args;
use staycompliant::config::AppConfig;
use staycompliant::error::AppError;
use staycompliant::workflows::compliance::{
    BookingLog, ComplianceService, PermitCountdown, PermitId, PropertyId, ReminderSweep,
    SweepReport,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reference date for the demo (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SweepArgs {
    /// Run the sweep as if it were this date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

type DemoService =
    ComplianceService<InMemoryRecordStore, LocalArtifactStore, FixedDateClock>;
type DemoSweep = ReminderSweep<InMemoryRecordStore, InMemoryReminderSender, FixedDateClock>;

fn build_demo_world(
    today: NaiveDate,
) -> Result<(Arc<DemoService>, DemoSweep, Arc<InMemoryReminderSender>), AppError> {
    let store = Arc::new(InMemoryRecordStore::default());
    seed_demo_data(&store, today);

    let clock = Arc::new(FixedDateClock(today));
    let sender = Arc::new(InMemoryReminderSender::default());
    let service = Arc::new(ComplianceService::new(
        store.clone(),
        Arc::new(LocalArtifactStore),
        clock.clone(),
    ));
    let sweep = ReminderSweep::new(store, sender.clone(), clock, AppConfig::load()?.reminders);

    Ok((service, sweep, sender))
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let (service, sweep, sender) = build_demo_world(today)?;
    let host = demo_host();

    println!("StayCompliant demo ({today})");

    println!("\nBooking log: Lakeview Cottage");
    match service.booking_log(&host, &PropertyId("prop-lakeview".to_string()), None) {
        Ok(log) => render_booking_log(&log),
        Err(err) => println!("  booking log unavailable: {err}"),
    }

    println!("\nPermit dashboard");
    match service.permit_dashboard(&host) {
        Ok(entries) => render_dashboard(&entries),
        Err(err) => println!("  dashboard unavailable: {err}"),
    }

    println!("\nReminder sweep");
    render_sweep_report("first run", sweep.run());
    render_sweep_report("second run (same day)", sweep.run());
    for email in sender.sent() {
        println!("  -> {} [{}]", email.subject, email.to);
    }

    println!("\nMark renewed: Fire Inspection Certificate");
    match service.renew_permit(
        &host,
        &PropertyId("prop-alpine".to_string()),
        &PermitId("pmt-demo-2".to_string()),
    ) {
        Ok(permit) => match permit.expiry_date {
            Some(expiry) => println!("  new expiry {expiry}, status {}", permit.status.label()),
            None => println!("  renewed, no expiry recorded"),
        },
        Err(err) => println!("  renewal failed: {err}"),
    }

    Ok(())
}

pub(crate) fn run_sweep(args: SweepArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let (_, sweep, sender) = build_demo_world(today)?;

    println!("Reminder sweep for {today} (seeded demo dataset)");
    render_sweep_report("result", sweep.run());
    for email in sender.sent() {
        println!("  -> {} [{}]", email.subject, email.to);
    }

    Ok(())
}

fn render_booking_log(log: &BookingLog) {
    for booking in &log.bookings {
        let guest = booking.guest_name.as_deref().unwrap_or("(no guest name)");
        println!(
            "  {} -> {}  {} night(s)  {}  {}",
            booking.check_in, booking.check_out, booking.nights, booking.platform, guest
        );
    }

    let summary = &log.summary;
    match (summary.night_cap, summary.remaining, summary.percent_used) {
        (Some(cap), Some(remaining), Some(percent)) => println!(
            "  {year}: {nights} of {cap} nights used ({percent:.0}%, {remaining} remaining, {tier})",
            year = summary.year,
            nights = summary.total_nights,
            tier = summary.usage.label(),
        ),
        _ => println!(
            "  {year}: {nights} nights used, no cap configured",
            year = summary.year,
            nights = summary.total_nights,
        ),
    }
}

fn render_dashboard(entries: &[PermitCountdown]) {
    if entries.is_empty() {
        println!("  no active permits");
        return;
    }
    for entry in entries {
        let place = entry.property_name.as_deref().unwrap_or("(unknown property)");
        let countdown = match (entry.days_until_expiry, entry.urgency) {
            (Some(days), Some(urgency)) => {
                format!("expires in {days} day(s) [{}]", urgency.label())
            }
            _ => "no expiry date".to_string(),
        };
        println!("  {} @ {place}: {countdown}", entry.permit.name);
    }
}

fn render_sweep_report(label: &str, report: SweepReport) {
    println!(
        "  {label}: sent {}, skipped {}, failed {}",
        report.sent, report.skipped, report.failed
    );
}
