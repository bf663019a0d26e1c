use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for host accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifier wrapper for rental properties.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyId(pub String);

/// Identifier wrapper for booking records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(pub String);

/// Identifier wrapper for permits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermitId(pub String);

/// Identifier wrapper for stored documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

/// Booking source platform captured at intake.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingPlatform {
    Airbnb,
    Vrbo,
    Direct,
    #[default]
    Other,
}

impl BookingPlatform {
    pub const fn label(self) -> &'static str {
        match self {
            BookingPlatform::Airbnb => "airbnb",
            BookingPlatform::Vrbo => "vrbo",
            BookingPlatform::Direct => "direct",
            BookingPlatform::Other => "other",
        }
    }
}

/// A guest stay at a property. Invariant: `check_out > check_in`, enforced
/// by [`validate_stay`] before any record reaches the store.
///
/// [`validate_stay`]: super::accounting::validate_stay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub property_id: PropertyId,
    pub platform: BookingPlatform,
    pub guest_name: Option<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub notes: Option<String>,
}

impl Booking {
    /// Whole-day difference between check-out and check-in. A valid booking
    /// is always at least one night.
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days().max(0)
    }
}

/// Caller-supplied booking fields, shared by create and edit paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDraft {
    #[serde(default)]
    pub platform: BookingPlatform,
    #[serde(default)]
    pub guest_name: Option<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A short-term-rental property owned by exactly one user. `night_cap` is a
/// policy value set by the owner, never derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub owner_id: UserId,
    pub name: String,
    pub city: Option<String>,
    pub night_cap: Option<u32>,
}

/// Lifecycle state of a permit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermitStatus {
    #[default]
    Active,
    Expired,
    Renewed,
}

impl PermitStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PermitStatus::Active => "active",
            PermitStatus::Expired => "expired",
            PermitStatus::Renewed => "renewed",
        }
    }
}

/// A regulatory permit attached to a property. A permit without an expiry
/// date is never classified against the urgency tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permit {
    pub id: PermitId,
    pub property_id: PropertyId,
    pub name: String,
    pub permit_number: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub status: PermitStatus,
    pub notes: Option<String>,
}

impl Permit {
    /// Apply the "mark renewed" domain action: push the expiry date out by
    /// exactly one calendar year and reset status to active, regardless of
    /// the prior status. Feb 29 clamps to Feb 28 in the target year.
    pub fn renew(&mut self) -> Result<(), ValidationError> {
        let expiry = self.expiry_date.ok_or(ValidationError::RenewWithoutExpiry)?;
        let renewed = expiry
            .checked_add_months(Months::new(12))
            .ok_or(ValidationError::ExpiryOutOfRange(expiry))?;
        self.expiry_date = Some(renewed);
        self.status = PermitStatus::Active;
        Ok(())
    }
}

/// Caller-supplied permit fields for creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitDraft {
    pub name: String,
    #[serde(default)]
    pub permit_number: Option<String>,
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Caller-supplied permit fields for edits. Unlike [`PermitDraft`], edits
/// may also move the status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitUpdate {
    pub name: String,
    #[serde(default)]
    pub permit_number: Option<String>,
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: PermitStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

/// One row of the reminder dispatch ledger. At most one record may exist per
/// (permit, days_before) pair; the ledger is written only by the sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderDispatch {
    pub permit_id: PermitId,
    pub days_before: u16,
    pub sent_at: NaiveDate,
}

/// Metadata for an uploaded compliance document. The artifact itself lives
/// behind the [`ArtifactStore`] collaborator under `storage_key`.
///
/// [`ArtifactStore`]: super::repository::ArtifactStore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub property_id: PropertyId,
    pub permit_id: Option<PermitId>,
    pub name: String,
    pub original_name: String,
    pub file_size: u64,
    pub mime_type: String,
    pub storage_key: String,
    pub uploaded_at: NaiveDate,
}

/// Descriptor for a document whose artifact has already been written to the
/// artifact store. If authorization or validation fails, the artifact must
/// be discarded before the error is surfaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUpload {
    #[serde(default)]
    pub name: Option<String>,
    pub original_name: String,
    pub file_size: u64,
    pub mime_type: String,
    pub storage_key: String,
    #[serde(default)]
    pub permit_id: Option<PermitId>,
}

/// Input validation failures. Surfaced to the caller with no mutation
/// performed; not retryable without changing the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("check_out must be after check_in (got check_in {check_in}, check_out {check_out})")]
    StayOrder {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
    #[error("permit name is required")]
    MissingPermitName,
    #[error("permit has no expiry date to renew")]
    RenewWithoutExpiry,
    #[error("expiry date {0} cannot be advanced a year")]
    ExpiryOutOfRange(NaiveDate),
    #[error("unsupported document type: {0}")]
    UnsupportedDocumentType(String),
}
