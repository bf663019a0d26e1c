//! Short-term-rental compliance engine: night-cap accounting, permit-expiry
//! classification, the deduplicated renewal-reminder sweep, and the ownership
//! guard every stateful operation passes through.

pub mod accounting;
pub mod domain;
pub mod expiry;
pub mod reminders;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use accounting::{validate_stay, year_summary, CapUsage, YearSummary};
pub use domain::{
    Booking, BookingDraft, BookingId, BookingPlatform, Document, DocumentId, DocumentUpload,
    Permit, PermitDraft, PermitId, PermitStatus, PermitUpdate, Property, PropertyId,
    ReminderDispatch, UserId, ValidationError,
};
pub use expiry::{classify, classify_days, days_until, ExpiryUrgency};
pub use reminders::{ReminderSweep, SweepReport, REMINDER_THRESHOLDS};
pub use repository::{
    ArtifactStore, Clock, OwnedPermit, RecordStore, ReminderCandidate, ReminderEmail,
    ReminderSender, SendError, StoreError, SystemClock,
};
pub use router::{compliance_router, Requester, REQUESTER_HEADER};
pub use service::{
    BookingLog, BookingView, ComplianceError, ComplianceService, PermitCountdown,
};
