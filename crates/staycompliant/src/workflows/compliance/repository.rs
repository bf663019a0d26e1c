use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{
    Booking, BookingId, Document, DocumentId, Permit, PermitId, Property, PropertyId, UserId,
};

/// Persistence abstraction over the ownership-scoped record store. Interactive
/// operations and the reminder sweep both talk to the store through this seam
/// so the core can be exercised against in-memory fakes.
pub trait RecordStore: Send + Sync {
    fn get_property(&self, id: &PropertyId) -> Result<Option<Property>, StoreError>;

    fn list_bookings(&self, property: &PropertyId) -> Result<Vec<Booking>, StoreError>;
    fn get_booking(
        &self,
        property: &PropertyId,
        id: &BookingId,
    ) -> Result<Option<Booking>, StoreError>;
    fn insert_booking(&self, booking: Booking) -> Result<Booking, StoreError>;
    fn update_booking(&self, booking: Booking) -> Result<Booking, StoreError>;
    /// Removing an absent booking is a no-op, not an error.
    fn delete_booking(&self, property: &PropertyId, id: &BookingId) -> Result<(), StoreError>;

    fn list_permits(&self, property: &PropertyId) -> Result<Vec<Permit>, StoreError>;
    /// Cross-property listing for the dashboard: every permit under a
    /// property owned by `user`, paired with its owning property.
    fn list_permits_for_user(&self, user: &UserId) -> Result<Vec<OwnedPermit>, StoreError>;
    fn get_permit(
        &self,
        property: &PropertyId,
        id: &PermitId,
    ) -> Result<Option<Permit>, StoreError>;
    fn insert_permit(&self, permit: Permit) -> Result<Permit, StoreError>;
    fn update_permit(&self, permit: Permit) -> Result<Permit, StoreError>;
    fn delete_permit(&self, property: &PropertyId, id: &PermitId) -> Result<(), StoreError>;

    /// Active permits whose expiry falls exactly `days_before` days after
    /// `today` and which have no dispatch-ledger row for that threshold,
    /// joined with owner contact details for the notification body.
    fn due_reminders(
        &self,
        days_before: u16,
        today: NaiveDate,
    ) -> Result<Vec<ReminderCandidate>, StoreError>;
    /// Insert-if-absent write to the dispatch ledger. Returns `false` when a
    /// row for (permit, days_before) already exists, so overlapping sweeps
    /// cannot double-record.
    fn record_dispatch(
        &self,
        permit: &PermitId,
        days_before: u16,
        today: NaiveDate,
    ) -> Result<bool, StoreError>;

    fn list_documents(&self, property: &PropertyId) -> Result<Vec<Document>, StoreError>;
    fn insert_document(&self, document: Document) -> Result<Document, StoreError>;
    /// Returns the removed row so the caller can discard the stored artifact.
    fn delete_document(
        &self,
        property: &PropertyId,
        id: &DocumentId,
    ) -> Result<Option<Document>, StoreError>;
}

/// A permit joined with its owning property, as the dashboard query returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedPermit {
    pub permit: Permit,
    pub property: Property,
}

/// A permit due for a reminder, carrying everything the email template needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderCandidate {
    pub permit: Permit,
    pub property_name: String,
    pub property_city: Option<String>,
    pub owner_name: Option<String>,
    pub owner_email: String,
}

/// Error enumeration for record-store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("record already exists")]
    Conflict,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Rendered reminder notification handed to the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Outbound email capability. Failure is a returned value, never a panic;
/// the sweep treats it as a per-permit transport error.
pub trait ReminderSender: Send + Sync {
    fn send(&self, email: &ReminderEmail) -> Result<(), SendError>;
}

/// Notification dispatch error. Retryable on the next scheduled sweep.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Single source of "today" so the classifier and the sweep can be tested
/// against fixed dates. Calendar-date granularity only.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Production clock backed by local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Storage for uploaded document artifacts. The core only ever discards:
/// writes happen in the transport layer before authorization can be checked,
/// so failed requests must be able to roll the artifact back.
pub trait ArtifactStore: Send + Sync {
    fn discard(&self, storage_key: &str) -> Result<(), StoreError>;
}
