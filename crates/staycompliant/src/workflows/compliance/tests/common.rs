use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::config::ReminderConfig;
use crate::workflows::compliance::domain::{
    Booking, BookingDraft, BookingId, BookingPlatform, Document, DocumentId, Permit, PermitId,
    PermitStatus, Property, PropertyId, UserId,
};
use crate::workflows::compliance::reminders::ReminderSweep;
use crate::workflows::compliance::repository::{
    ArtifactStore, Clock, OwnedPermit, RecordStore, ReminderCandidate, ReminderEmail,
    ReminderSender, SendError, StoreError,
};
use crate::workflows::compliance::service::ComplianceService;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn owner() -> UserId {
    UserId("host-1".to_string())
}

pub(super) fn stranger() -> UserId {
    UserId("host-2".to_string())
}

pub(super) fn property_id() -> PropertyId {
    PropertyId("prop-1".to_string())
}

pub(super) fn property(night_cap: Option<u32>) -> Property {
    Property {
        id: property_id(),
        owner_id: owner(),
        name: "Lakeview Cottage".to_string(),
        city: Some("Austin".to_string()),
        night_cap,
    }
}

pub(super) fn booking(id: &str, check_in: NaiveDate, check_out: NaiveDate) -> Booking {
    Booking {
        id: BookingId(id.to_string()),
        property_id: property_id(),
        platform: BookingPlatform::Airbnb,
        guest_name: Some("R. Alvarez".to_string()),
        check_in,
        check_out,
        notes: None,
    }
}

pub(super) fn booking_draft(check_in: NaiveDate, check_out: NaiveDate) -> BookingDraft {
    BookingDraft {
        platform: BookingPlatform::Direct,
        guest_name: None,
        check_in,
        check_out,
        notes: None,
    }
}

pub(super) fn permit(id: &str, expiry: Option<NaiveDate>) -> Permit {
    Permit {
        id: PermitId(id.to_string()),
        property_id: property_id(),
        name: "STR License".to_string(),
        permit_number: Some("STR-2025-0042".to_string()),
        issue_date: None,
        expiry_date: expiry,
        status: PermitStatus::Active,
        notes: None,
    }
}

#[derive(Debug, Clone)]
pub(super) struct OwnerContact {
    pub(super) name: Option<String>,
    pub(super) email: String,
}

/// In-memory record store covering the whole `RecordStore` surface so the
/// service, router, and sweep can be exercised without a database.
#[derive(Default)]
pub(super) struct MemoryStore {
    pub(super) properties: Mutex<HashMap<PropertyId, Property>>,
    pub(super) contacts: Mutex<HashMap<UserId, OwnerContact>>,
    pub(super) bookings: Mutex<HashMap<BookingId, Booking>>,
    pub(super) permits: Mutex<HashMap<PermitId, Permit>>,
    pub(super) dispatches: Mutex<HashSet<(PermitId, u16)>>,
    pub(super) documents: Mutex<HashMap<DocumentId, Document>>,
}

impl MemoryStore {
    pub(super) fn with_property(property: Property) -> Self {
        let store = Self::default();
        store.add_property(property);
        store
    }

    pub(super) fn add_property(&self, property: Property) {
        self.properties
            .lock()
            .expect("properties mutex poisoned")
            .insert(property.id.clone(), property);
    }

    pub(super) fn add_contact(&self, user: UserId, contact: OwnerContact) {
        self.contacts
            .lock()
            .expect("contacts mutex poisoned")
            .insert(user, contact);
    }

    pub(super) fn add_booking(&self, booking: Booking) {
        self.bookings
            .lock()
            .expect("bookings mutex poisoned")
            .insert(booking.id.clone(), booking);
    }

    pub(super) fn add_permit(&self, permit: Permit) {
        self.permits
            .lock()
            .expect("permits mutex poisoned")
            .insert(permit.id.clone(), permit);
    }

    pub(super) fn booking_count(&self) -> usize {
        self.bookings.lock().expect("bookings mutex poisoned").len()
    }

    pub(super) fn dispatch_count(&self) -> usize {
        self.dispatches
            .lock()
            .expect("dispatch mutex poisoned")
            .len()
    }

    pub(super) fn stored_booking(&self, id: &BookingId) -> Option<Booking> {
        self.bookings
            .lock()
            .expect("bookings mutex poisoned")
            .get(id)
            .cloned()
    }

    pub(super) fn stored_permit(&self, id: &PermitId) -> Option<Permit> {
        self.permits
            .lock()
            .expect("permits mutex poisoned")
            .get(id)
            .cloned()
    }
}

impl RecordStore for MemoryStore {
    fn get_property(&self, id: &PropertyId) -> Result<Option<Property>, StoreError> {
        Ok(self
            .properties
            .lock()
            .expect("properties mutex poisoned")
            .get(id)
            .cloned())
    }

    fn list_bookings(&self, property: &PropertyId) -> Result<Vec<Booking>, StoreError> {
        Ok(self
            .bookings
            .lock()
            .expect("bookings mutex poisoned")
            .values()
            .filter(|booking| booking.property_id == *property)
            .cloned()
            .collect())
    }

    fn get_booking(
        &self,
        property: &PropertyId,
        id: &BookingId,
    ) -> Result<Option<Booking>, StoreError> {
        Ok(self
            .bookings
            .lock()
            .expect("bookings mutex poisoned")
            .get(id)
            .filter(|booking| booking.property_id == *property)
            .cloned())
    }

    fn insert_booking(&self, booking: Booking) -> Result<Booking, StoreError> {
        let mut guard = self.bookings.lock().expect("bookings mutex poisoned");
        if guard.contains_key(&booking.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(booking.id.clone(), booking.clone());
        Ok(booking)
    }

    fn update_booking(&self, booking: Booking) -> Result<Booking, StoreError> {
        let mut guard = self.bookings.lock().expect("bookings mutex poisoned");
        if !guard.contains_key(&booking.id) {
            return Err(StoreError::NotFound);
        }
        guard.insert(booking.id.clone(), booking.clone());
        Ok(booking)
    }

    fn delete_booking(&self, property: &PropertyId, id: &BookingId) -> Result<(), StoreError> {
        let mut guard = self.bookings.lock().expect("bookings mutex poisoned");
        if guard
            .get(id)
            .map(|booking| booking.property_id == *property)
            .unwrap_or(false)
        {
            guard.remove(id);
        }
        Ok(())
    }

    fn list_permits(&self, property: &PropertyId) -> Result<Vec<Permit>, StoreError> {
        Ok(self
            .permits
            .lock()
            .expect("permits mutex poisoned")
            .values()
            .filter(|permit| permit.property_id == *property)
            .cloned()
            .collect())
    }

    fn list_permits_for_user(&self, user: &UserId) -> Result<Vec<OwnedPermit>, StoreError> {
        let properties = self.properties.lock().expect("properties mutex poisoned");
        let permits = self.permits.lock().expect("permits mutex poisoned");
        Ok(permits
            .values()
            .filter_map(|permit| {
                properties
                    .get(&permit.property_id)
                    .filter(|property| property.owner_id == *user)
                    .map(|property| OwnedPermit {
                        permit: permit.clone(),
                        property: property.clone(),
                    })
            })
            .collect())
    }

    fn get_permit(
        &self,
        property: &PropertyId,
        id: &PermitId,
    ) -> Result<Option<Permit>, StoreError> {
        Ok(self
            .permits
            .lock()
            .expect("permits mutex poisoned")
            .get(id)
            .filter(|permit| permit.property_id == *property)
            .cloned())
    }

    fn insert_permit(&self, permit: Permit) -> Result<Permit, StoreError> {
        let mut guard = self.permits.lock().expect("permits mutex poisoned");
        if guard.contains_key(&permit.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(permit.id.clone(), permit.clone());
        Ok(permit)
    }

    fn update_permit(&self, permit: Permit) -> Result<Permit, StoreError> {
        let mut guard = self.permits.lock().expect("permits mutex poisoned");
        if !guard.contains_key(&permit.id) {
            return Err(StoreError::NotFound);
        }
        guard.insert(permit.id.clone(), permit.clone());
        Ok(permit)
    }

    fn delete_permit(&self, property: &PropertyId, id: &PermitId) -> Result<(), StoreError> {
        let mut guard = self.permits.lock().expect("permits mutex poisoned");
        if guard
            .get(id)
            .map(|permit| permit.property_id == *property)
            .unwrap_or(false)
        {
            guard.remove(id);
        }
        Ok(())
    }

    fn due_reminders(
        &self,
        days_before: u16,
        today: NaiveDate,
    ) -> Result<Vec<ReminderCandidate>, StoreError> {
        let properties = self.properties.lock().expect("properties mutex poisoned");
        let contacts = self.contacts.lock().expect("contacts mutex poisoned");
        let dispatches = self.dispatches.lock().expect("dispatch mutex poisoned");
        let target = today + chrono::Duration::days(i64::from(days_before));

        Ok(self
            .permits
            .lock()
            .expect("permits mutex poisoned")
            .values()
            .filter(|permit| permit.status == PermitStatus::Active)
            .filter(|permit| permit.expiry_date == Some(target))
            .filter(|permit| !dispatches.contains(&(permit.id.clone(), days_before)))
            .filter_map(|permit| {
                let property = properties.get(&permit.property_id)?;
                let contact = contacts.get(&property.owner_id)?;
                Some(ReminderCandidate {
                    permit: permit.clone(),
                    property_name: property.name.clone(),
                    property_city: property.city.clone(),
                    owner_name: contact.name.clone(),
                    owner_email: contact.email.clone(),
                })
            })
            .collect())
    }

    fn record_dispatch(
        &self,
        permit: &PermitId,
        days_before: u16,
        _today: NaiveDate,
    ) -> Result<bool, StoreError> {
        Ok(self
            .dispatches
            .lock()
            .expect("dispatch mutex poisoned")
            .insert((permit.clone(), days_before)))
    }

    fn list_documents(&self, property: &PropertyId) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .documents
            .lock()
            .expect("documents mutex poisoned")
            .values()
            .filter(|document| document.property_id == *property)
            .cloned()
            .collect())
    }

    fn insert_document(&self, document: Document) -> Result<Document, StoreError> {
        self.documents
            .lock()
            .expect("documents mutex poisoned")
            .insert(document.id.clone(), document.clone());
        Ok(document)
    }

    fn delete_document(
        &self,
        property: &PropertyId,
        id: &DocumentId,
    ) -> Result<Option<Document>, StoreError> {
        let mut guard = self.documents.lock().expect("documents mutex poisoned");
        if guard
            .get(id)
            .map(|document| document.property_id == *property)
            .unwrap_or(false)
        {
            return Ok(guard.remove(id));
        }
        Ok(None)
    }
}

/// Sender capturing every email so tests can assert dispatch counts.
#[derive(Default)]
pub(super) struct MemorySender {
    pub(super) emails: Mutex<Vec<ReminderEmail>>,
}

impl MemorySender {
    pub(super) fn sent(&self) -> Vec<ReminderEmail> {
        self.emails.lock().expect("sender mutex poisoned").clone()
    }
}

impl ReminderSender for MemorySender {
    fn send(&self, email: &ReminderEmail) -> Result<(), SendError> {
        self.emails
            .lock()
            .expect("sender mutex poisoned")
            .push(email.clone());
        Ok(())
    }
}

/// Sender that fails for one recipient and delivers for everyone else.
pub(super) struct FlakySender {
    pub(super) failing_recipient: String,
    pub(super) delivered: Mutex<Vec<ReminderEmail>>,
}

impl ReminderSender for FlakySender {
    fn send(&self, email: &ReminderEmail) -> Result<(), SendError> {
        if email.to == self.failing_recipient {
            return Err(SendError::Transport("mailbox unavailable".to_string()));
        }
        self.delivered
            .lock()
            .expect("sender mutex poisoned")
            .push(email.clone());
        Ok(())
    }
}

/// Deterministic clock pinned to a fixed date.
#[derive(Debug, Clone, Copy)]
pub(super) struct FixedClock(pub(super) NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Artifact store recording discards so rollback behavior is observable.
#[derive(Default)]
pub(super) struct MemoryArtifacts {
    pub(super) discarded: Mutex<Vec<String>>,
}

impl MemoryArtifacts {
    pub(super) fn discarded_keys(&self) -> Vec<String> {
        self.discarded
            .lock()
            .expect("artifact mutex poisoned")
            .clone()
    }
}

impl ArtifactStore for MemoryArtifacts {
    fn discard(&self, storage_key: &str) -> Result<(), StoreError> {
        self.discarded
            .lock()
            .expect("artifact mutex poisoned")
            .push(storage_key.to_string());
        Ok(())
    }
}

pub(super) async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) type TestService = ComplianceService<MemoryStore, MemoryArtifacts, FixedClock>;

pub(super) fn build_service(
    store: MemoryStore,
    today: NaiveDate,
) -> (Arc<TestService>, Arc<MemoryStore>, Arc<MemoryArtifacts>) {
    let store = Arc::new(store);
    let artifacts = Arc::new(MemoryArtifacts::default());
    let service = Arc::new(ComplianceService::new(
        store.clone(),
        artifacts.clone(),
        Arc::new(FixedClock(today)),
    ));
    (service, store, artifacts)
}

pub(super) fn reminder_config() -> ReminderConfig {
    ReminderConfig {
        from_address: "reminders@staycompliant.app".to_string(),
        dashboard_url: "https://staycompliant.app".to_string(),
    }
}

pub(super) fn build_sweep<N: ReminderSender + 'static>(
    store: Arc<MemoryStore>,
    sender: Arc<N>,
    today: NaiveDate,
) -> ReminderSweep<MemoryStore, N, FixedClock> {
    ReminderSweep::new(
        store,
        sender,
        Arc::new(FixedClock(today)),
        reminder_config(),
    )
}
