use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Datelike;
use serde::Serialize;

use super::accounting::{validate_stay, year_summary, YearSummary};
use super::domain::{
    Booking, BookingDraft, BookingId, Document, DocumentId, DocumentUpload, Permit, PermitDraft,
    PermitId, PermitStatus, PermitUpdate, Property, PropertyId, UserId, ValidationError,
};
use super::expiry::{self, ExpiryUrgency};
use super::repository::{ArtifactStore, Clock, RecordStore, StoreError};

/// Service composing the ownership guard, record store, and the derived
/// accounting/classification views. Every operation takes the requesting
/// user explicitly; there is no ambient identity.
pub struct ComplianceService<S, B, C> {
    store: Arc<S>,
    artifacts: Arc<B>,
    clock: Arc<C>,
}

static BOOKING_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static PERMIT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static DOCUMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_booking_id() -> BookingId {
    let id = BOOKING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    BookingId(format!("bkg-{id:06}"))
}

fn next_permit_id() -> PermitId {
    let id = PERMIT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    PermitId(format!("pmt-{id:06}"))
}

fn next_document_id() -> DocumentId {
    let id = DOCUMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    DocumentId(format!("doc-{id:06}"))
}

const ALLOWED_DOCUMENT_TYPES: [&str; 5] = [
    "application/pdf",
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
];

fn validate_document_type(mime_type: &str) -> Result<(), ValidationError> {
    let parsed: mime::Mime = mime_type
        .parse()
        .map_err(|_| ValidationError::UnsupportedDocumentType(mime_type.to_string()))?;
    if ALLOWED_DOCUMENT_TYPES.contains(&parsed.essence_str()) {
        Ok(())
    } else {
        Err(ValidationError::UnsupportedDocumentType(
            mime_type.to_string(),
        ))
    }
}

impl<S, B, C> ComplianceService<S, B, C>
where
    S: RecordStore + 'static,
    B: ArtifactStore + 'static,
    C: Clock + 'static,
{
    pub fn new(store: Arc<S>, artifacts: Arc<B>, clock: Arc<C>) -> Self {
        Self {
            store,
            artifacts,
            clock,
        }
    }

    /// Ownership guard: resolve the property and require `owner_id` to match
    /// the requester. A missing property is indistinguishable from a foreign
    /// one so the response never confirms existence.
    fn authorize(
        &self,
        user: &UserId,
        property_id: &PropertyId,
    ) -> Result<Property, ComplianceError> {
        match self.store.get_property(property_id)? {
            Some(property) if property.owner_id == *user => Ok(property),
            _ => Err(ComplianceError::Forbidden(property_id.clone())),
        }
    }

    /// Bookings for a property, newest check-in first, with the night-cap
    /// summary for `year` (defaults to the current calendar year).
    pub fn booking_log(
        &self,
        user: &UserId,
        property_id: &PropertyId,
        year: Option<i32>,
    ) -> Result<BookingLog, ComplianceError> {
        let property = self.authorize(user, property_id)?;
        let year = year.unwrap_or_else(|| self.clock.today().year());

        let mut bookings = self.store.list_bookings(property_id)?;
        bookings.sort_by(|a, b| b.check_in.cmp(&a.check_in));

        let summary = year_summary(year, property.night_cap, &bookings);
        let bookings = bookings.iter().map(BookingView::from).collect();

        Ok(BookingLog { bookings, summary })
    }

    pub fn create_booking(
        &self,
        user: &UserId,
        property_id: &PropertyId,
        draft: BookingDraft,
    ) -> Result<Booking, ComplianceError> {
        self.authorize(user, property_id)?;
        validate_stay(draft.check_in, draft.check_out)?;

        let booking = Booking {
            id: next_booking_id(),
            property_id: property_id.clone(),
            platform: draft.platform,
            guest_name: draft.guest_name,
            check_in: draft.check_in,
            check_out: draft.check_out,
            notes: draft.notes,
        };
        Ok(self.store.insert_booking(booking)?)
    }

    /// Edit a booking. The stay validation runs against the proposed dates,
    /// not the stored ones.
    pub fn update_booking(
        &self,
        user: &UserId,
        property_id: &PropertyId,
        booking_id: &BookingId,
        draft: BookingDraft,
    ) -> Result<Booking, ComplianceError> {
        self.authorize(user, property_id)?;
        validate_stay(draft.check_in, draft.check_out)?;

        let existing = self
            .store
            .get_booking(property_id, booking_id)?
            .ok_or(ComplianceError::NotFound)?;

        let booking = Booking {
            id: existing.id,
            property_id: property_id.clone(),
            platform: draft.platform,
            guest_name: draft.guest_name,
            check_in: draft.check_in,
            check_out: draft.check_out,
            notes: draft.notes,
        };
        Ok(self.store.update_booking(booking)?)
    }

    pub fn delete_booking(
        &self,
        user: &UserId,
        property_id: &PropertyId,
        booking_id: &BookingId,
    ) -> Result<(), ComplianceError> {
        self.authorize(user, property_id)?;
        self.store.delete_booking(property_id, booking_id)?;
        Ok(())
    }

    /// All active permits across the requester's properties with live urgency
    /// classification, soonest expiry first and undated permits last.
    pub fn permit_dashboard(&self, user: &UserId) -> Result<Vec<PermitCountdown>, ComplianceError> {
        let today = self.clock.today();
        let mut owned = self.store.list_permits_for_user(user)?;
        owned.retain(|entry| entry.permit.status == PermitStatus::Active);
        owned.sort_by_key(|entry| match entry.permit.expiry_date {
            Some(date) => (false, date),
            None => (true, chrono::NaiveDate::MAX),
        });

        Ok(owned
            .into_iter()
            .map(|entry| PermitCountdown::new(entry.permit, Some(entry.property.name), today))
            .collect())
    }

    /// Permits for one property, every status, soonest expiry first.
    pub fn list_permits(
        &self,
        user: &UserId,
        property_id: &PropertyId,
    ) -> Result<Vec<PermitCountdown>, ComplianceError> {
        let property = self.authorize(user, property_id)?;
        let today = self.clock.today();

        let mut permits = self.store.list_permits(property_id)?;
        expiry::sort_by_expiry(&mut permits);

        Ok(permits
            .into_iter()
            .map(|permit| PermitCountdown::new(permit, Some(property.name.clone()), today))
            .collect())
    }

    pub fn create_permit(
        &self,
        user: &UserId,
        property_id: &PropertyId,
        draft: PermitDraft,
    ) -> Result<Permit, ComplianceError> {
        self.authorize(user, property_id)?;
        if draft.name.trim().is_empty() {
            return Err(ValidationError::MissingPermitName.into());
        }

        let permit = Permit {
            id: next_permit_id(),
            property_id: property_id.clone(),
            name: draft.name,
            permit_number: draft.permit_number,
            issue_date: draft.issue_date,
            expiry_date: draft.expiry_date,
            status: PermitStatus::Active,
            notes: draft.notes,
        };
        Ok(self.store.insert_permit(permit)?)
    }

    pub fn update_permit(
        &self,
        user: &UserId,
        property_id: &PropertyId,
        permit_id: &PermitId,
        update: PermitUpdate,
    ) -> Result<Permit, ComplianceError> {
        self.authorize(user, property_id)?;
        if update.name.trim().is_empty() {
            return Err(ValidationError::MissingPermitName.into());
        }

        let existing = self
            .store
            .get_permit(property_id, permit_id)?
            .ok_or(ComplianceError::NotFound)?;

        let permit = Permit {
            id: existing.id,
            property_id: property_id.clone(),
            name: update.name,
            permit_number: update.permit_number,
            issue_date: update.issue_date,
            expiry_date: update.expiry_date,
            status: update.status,
            notes: update.notes,
        };
        Ok(self.store.update_permit(permit)?)
    }

    /// The "mark renewed" action: expiry moves out one year, status resets to
    /// active, independent of the prior status. The permit row is advanced in
    /// place; no new permit is created.
    pub fn renew_permit(
        &self,
        user: &UserId,
        property_id: &PropertyId,
        permit_id: &PermitId,
    ) -> Result<Permit, ComplianceError> {
        self.authorize(user, property_id)?;

        let mut permit = self
            .store
            .get_permit(property_id, permit_id)?
            .ok_or(ComplianceError::NotFound)?;
        permit.renew()?;
        Ok(self.store.update_permit(permit)?)
    }

    pub fn delete_permit(
        &self,
        user: &UserId,
        property_id: &PropertyId,
        permit_id: &PermitId,
    ) -> Result<(), ComplianceError> {
        self.authorize(user, property_id)?;
        self.store.delete_permit(property_id, permit_id)?;
        Ok(())
    }

    pub fn list_documents(
        &self,
        user: &UserId,
        property_id: &PropertyId,
    ) -> Result<Vec<Document>, ComplianceError> {
        self.authorize(user, property_id)?;
        let mut documents = self.store.list_documents(property_id)?;
        documents.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(documents)
    }

    /// Register an uploaded artifact as a compliance document. The artifact is
    /// already in the artifact store when this runs; any rejection discards it
    /// before the error is surfaced so no orphan survives a failed request.
    pub fn attach_document(
        &self,
        user: &UserId,
        property_id: &PropertyId,
        upload: DocumentUpload,
    ) -> Result<Document, ComplianceError> {
        if let Err(error) = self.authorize(user, property_id) {
            self.discard_artifact(&upload.storage_key);
            return Err(error);
        }
        if let Err(error) = validate_document_type(&upload.mime_type) {
            self.discard_artifact(&upload.storage_key);
            return Err(error.into());
        }

        let document = Document {
            id: next_document_id(),
            property_id: property_id.clone(),
            permit_id: upload.permit_id,
            name: upload
                .name
                .unwrap_or_else(|| upload.original_name.clone()),
            original_name: upload.original_name,
            file_size: upload.file_size,
            mime_type: upload.mime_type,
            storage_key: upload.storage_key,
            uploaded_at: self.clock.today(),
        };
        Ok(self.store.insert_document(document)?)
    }

    pub fn delete_document(
        &self,
        user: &UserId,
        property_id: &PropertyId,
        document_id: &DocumentId,
    ) -> Result<(), ComplianceError> {
        self.authorize(user, property_id)?;

        let removed = self
            .store
            .delete_document(property_id, document_id)?
            .ok_or(ComplianceError::NotFound)?;
        self.discard_artifact(&removed.storage_key);
        Ok(())
    }

    fn discard_artifact(&self, storage_key: &str) {
        if let Err(error) = self.artifacts.discard(storage_key) {
            tracing::warn!(%storage_key, %error, "failed to discard document artifact");
        }
    }
}

/// Booking row as exposed to callers, with the derived night count.
#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    pub id: BookingId,
    pub platform: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_name: Option<String>,
    pub check_in: chrono::NaiveDate,
    pub check_out: chrono::NaiveDate,
    pub nights: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<&Booking> for BookingView {
    fn from(booking: &Booking) -> Self {
        Self {
            id: booking.id.clone(),
            platform: booking.platform.label(),
            guest_name: booking.guest_name.clone(),
            check_in: booking.check_in,
            check_out: booking.check_out,
            nights: booking.nights(),
            notes: booking.notes.clone(),
        }
    }
}

/// Booking listing plus the year's night-cap summary.
#[derive(Debug, Clone, Serialize)]
pub struct BookingLog {
    pub bookings: Vec<BookingView>,
    pub summary: YearSummary,
}

/// A permit with its urgency countdown, as rendered on dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct PermitCountdown {
    pub permit: Permit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_name: Option<String>,
    pub days_until_expiry: Option<i64>,
    pub urgency: Option<ExpiryUrgency>,
}

impl PermitCountdown {
    fn new(permit: Permit, property_name: Option<String>, today: chrono::NaiveDate) -> Self {
        let days_until_expiry = expiry::days_until(permit.expiry_date, today);
        let urgency = expiry::classify(permit.expiry_date, today);
        Self {
            permit,
            property_name,
            days_until_expiry,
            urgency,
        }
    }
}

/// Error raised by the compliance service. The variants distinguish
/// retryability: validation and authorization failures are not retryable
/// as-is, missing records are 404-equivalent, store failures are internal.
#[derive(Debug, thiserror::Error)]
pub enum ComplianceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("requester does not own property {}", .0 .0)]
    Forbidden(PropertyId),
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ComplianceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => Self::NotFound,
            other => Self::Store(other),
        }
    }
}
