use chrono::{Duration, NaiveDate};
use metrics_exporter_prometheus::PrometheusHandle;
use staycompliant::workflows::compliance::{
    ArtifactStore, Booking, BookingId, BookingPlatform, Clock, Document, DocumentId, OwnedPermit,
    Permit, PermitId, PermitStatus, Property, PropertyId, RecordStore, ReminderCandidate,
    ReminderEmail, ReminderSender, SendError, StoreError, UserId,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Owner contact details kept alongside the property records. A real
/// deployment reads these from the account system.
#[derive(Debug, Clone)]
pub(crate) struct OwnerContact {
    pub(crate) name: Option<String>,
    pub(crate) email: String,
}

/// Record store backed by in-process maps. Persistence is out of scope for
/// this service; the store exists so the HTTP surface and the sweep run
/// against the same seam a database-backed store would implement.
#[derive(Default, Clone)]
pub(crate) struct InMemoryRecordStore {
    properties: Arc<Mutex<HashMap<PropertyId, Property>>>,
    contacts: Arc<Mutex<HashMap<UserId, OwnerContact>>>,
    bookings: Arc<Mutex<HashMap<BookingId, Booking>>>,
    permits: Arc<Mutex<HashMap<PermitId, Permit>>>,
    dispatches: Arc<Mutex<HashSet<(PermitId, u16)>>>,
    documents: Arc<Mutex<HashMap<DocumentId, Document>>>,
}

impl InMemoryRecordStore {
    pub(crate) fn add_property(&self, property: Property) {
        self.properties
            .lock()
            .expect("properties mutex poisoned")
            .insert(property.id.clone(), property);
    }

    pub(crate) fn add_contact(&self, user: UserId, contact: OwnerContact) {
        self.contacts
            .lock()
            .expect("contacts mutex poisoned")
            .insert(user, contact);
    }

    pub(crate) fn add_booking(&self, booking: Booking) {
        self.bookings
            .lock()
            .expect("bookings mutex poisoned")
            .insert(booking.id.clone(), booking);
    }

    pub(crate) fn add_permit(&self, permit: Permit) {
        self.permits
            .lock()
            .expect("permits mutex poisoned")
            .insert(permit.id.clone(), permit);
    }
}

impl RecordStore for InMemoryRecordStore {
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
        let target = today + Duration::days(i64::from(days_before));

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

/// Sender that logs each notification and keeps it for inspection. Stands in
/// for the SMTP transport, which lives outside this service.
#[derive(Default, Clone)]
pub(crate) struct InMemoryReminderSender {
    emails: Arc<Mutex<Vec<ReminderEmail>>>,
}

impl InMemoryReminderSender {
    pub(crate) fn sent(&self) -> Vec<ReminderEmail> {
        self.emails.lock().expect("sender mutex poisoned").clone()
    }
}

impl ReminderSender for InMemoryReminderSender {
    fn send(&self, email: &ReminderEmail) -> Result<(), SendError> {
        tracing::info!(to = %email.to, subject = %email.subject, "reminder email dispatched");
        self.emails
            .lock()
            .expect("sender mutex poisoned")
            .push(email.clone());
        Ok(())
    }
}

/// Artifact store stub. Upload transport is handled upstream, so the only
/// operation this service needs is the rollback discard.
#[derive(Default, Clone)]
pub(crate) struct LocalArtifactStore;

impl ArtifactStore for LocalArtifactStore {
    fn discard(&self, storage_key: &str) -> Result<(), StoreError> {
        tracing::info!(%storage_key, "discarded document artifact");
        Ok(())
    }
}

/// Clock pinned to a fixed date, used by the demo and one-shot sweep so their
/// output is reproducible.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FixedDateClock(pub(crate) NaiveDate);

impl Clock for FixedDateClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn demo_host() -> UserId {
    UserId("demo-host".to_string())
}

/// Seed the store with two properties, a season of bookings, and permits
/// sitting at interesting points of the expiry countdown relative to `today`.
pub(crate) fn seed_demo_data(store: &InMemoryRecordStore, today: NaiveDate) {
    let host = demo_host();
    store.add_contact(
        host.clone(),
        OwnerContact {
            name: Some("Dana".to_string()),
            email: "dana@example.com".to_string(),
        },
    );

    let lakeview = PropertyId("prop-lakeview".to_string());
    store.add_property(Property {
        id: lakeview.clone(),
        owner_id: host.clone(),
        name: "Lakeview Cottage".to_string(),
        city: Some("Austin".to_string()),
        night_cap: Some(180),
    });

    let alpine = PropertyId("prop-alpine".to_string());
    store.add_property(Property {
        id: alpine.clone(),
        owner_id: host,
        name: "Alpine Loft".to_string(),
        city: Some("Denver".to_string()),
        night_cap: None,
    });

    let stays: [(&str, BookingPlatform, i64, i64, Option<&str>); 3] = [
        ("bkg-demo-1", BookingPlatform::Airbnb, -40, -36, Some("R. Alvarez")),
        ("bkg-demo-2", BookingPlatform::Vrbo, -20, -13, Some("M. Okafor")),
        ("bkg-demo-3", BookingPlatform::Direct, 10, 14, None),
    ];
    for (id, platform, start, end, guest) in stays {
        store.add_booking(Booking {
            id: BookingId(id.to_string()),
            property_id: lakeview.clone(),
            platform,
            guest_name: guest.map(str::to_string),
            check_in: today + Duration::days(start),
            check_out: today + Duration::days(end),
            notes: None,
        });
    }

    store.add_permit(Permit {
        id: PermitId("pmt-demo-1".to_string()),
        property_id: lakeview.clone(),
        name: "STR License".to_string(),
        permit_number: Some("STR-2025-0042".to_string()),
        issue_date: Some(today - Duration::days(335)),
        expiry_date: Some(today + Duration::days(30)),
        status: PermitStatus::Active,
        notes: None,
    });
    store.add_permit(Permit {
        id: PermitId("pmt-demo-2".to_string()),
        property_id: alpine,
        name: "Fire Inspection Certificate".to_string(),
        permit_number: None,
        issue_date: None,
        expiry_date: Some(today + Duration::days(7)),
        status: PermitStatus::Active,
        notes: Some("schedule re-inspection before renewal".to_string()),
    });
    store.add_permit(Permit {
        id: PermitId("pmt-demo-3".to_string()),
        property_id: lakeview,
        name: "Business License".to_string(),
        permit_number: Some("BL-88231".to_string()),
        issue_date: None,
        expiry_date: Some(today + Duration::days(200)),
        status: PermitStatus::Active,
        notes: None,
    });
}
