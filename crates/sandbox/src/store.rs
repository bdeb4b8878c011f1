//! In-memory records held by the sandbox.

use crate::{SandboxError, SandboxResult};
use fhir::{
    AppointmentData, AppointmentStatus, ResourceId, ServiceRequest, ServiceRequestData,
};
use std::collections::BTreeMap;
use std::path::Path;

/// Outcome of [`Store::book`].
#[derive(Debug, PartialEq, Eq)]
pub enum BookOutcome {
    Created(AppointmentData),
    UnknownRequest(String),
    AlreadyBooked { request_id: String, appointment_id: ResourceId },
}

#[derive(Clone, Debug, Default)]
pub struct Store {
    service_requests: BTreeMap<String, ServiceRequestData>,
    appointments: BTreeMap<String, AppointmentData>,
}

impl Store {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Demo data covering each verification outcome.
    ///
    /// - `SR-100`, `SR-300`: active and free
    /// - `SR-200`: active, already booked as `A-1`
    /// - `SR-400`: on hold
    /// - `SR-500`: completed, also searchable through identifier `ORD-500`
    pub fn demo() -> SandboxResult<Self> {
        let mut store = Self::empty();
        for raw in DEMO_SERVICE_REQUESTS {
            store.insert_service_request(ServiceRequest::parse(raw)?);
        }

        store.insert_appointment(demo_appointment(ResourceId::new("A-1")?, "SR-200")?);
        Ok(store)
    }

    /// Read a JSON array of `ServiceRequest` resources from `path`.
    pub fn load_seed_file(path: &Path) -> SandboxResult<Vec<ServiceRequestData>> {
        let text = std::fs::read_to_string(path).map_err(|source| SandboxError::SeedFile {
            path: path.display().to_string(),
            source,
        })?;
        let values: Vec<serde_json::Value> = serde_json::from_str(&text)?;

        values
            .into_iter()
            .map(|value| ServiceRequest::from_value(value).map_err(SandboxError::from))
            .collect()
    }

    /// Insert or replace a service request, keyed by its id.
    pub fn insert_service_request(&mut self, request: ServiceRequestData) {
        self.service_requests
            .insert(request.id.to_string(), request);
    }

    /// Insert an appointment that already carries an id.
    pub fn insert_appointment(&mut self, appointment: AppointmentData) {
        if let Some(id) = appointment.id.clone() {
            self.appointments.insert(id.to_string(), appointment);
        }
    }

    pub fn service_request(&self, id: &str) -> Option<&ServiceRequestData> {
        self.service_requests.get(id)
    }

    /// Requests carrying identifier `value`, restricted to `system` when given.
    pub fn find_by_identifier(&self, system: Option<&str>, value: &str) -> Vec<&ServiceRequestData> {
        self.service_requests
            .values()
            .filter(|request| match system {
                Some(system) => request.has_identifier(system, value),
                None => request
                    .identifiers
                    .iter()
                    .any(|i| i.value.as_deref() == Some(value)),
            })
            .collect()
    }

    /// The appointment currently holding a booking for `request_id`.
    pub fn appointment_for(&self, request_id: &str) -> Option<&AppointmentData> {
        self.appointments.values().find(|appointment| {
            appointment.status.holds_booking()
                && appointment
                    .service_request_ids()
                    .any(|id| id == request_id)
        })
    }

    pub fn appointment_count(&self) -> usize {
        self.appointments.len()
    }

    /// Assign `id` to `appointment` and store it, unless a referenced request is unknown
    /// or already booked.
    pub fn book(&mut self, mut appointment: AppointmentData, id: ResourceId) -> BookOutcome {
        let request_ids: Vec<String> = appointment
            .service_request_ids()
            .map(str::to_string)
            .collect();

        for request_id in &request_ids {
            if !self.service_requests.contains_key(request_id) {
                return BookOutcome::UnknownRequest(request_id.clone());
            }
            if let Some(existing) = self.appointment_for(request_id).and_then(|a| a.id.clone()) {
                return BookOutcome::AlreadyBooked {
                    request_id: request_id.clone(),
                    appointment_id: existing,
                };
            }
        }

        appointment.id = Some(id);
        self.insert_appointment(appointment.clone());
        BookOutcome::Created(appointment)
    }
}

fn demo_appointment(id: ResourceId, request_id: &str) -> SandboxResult<AppointmentData> {
    let start = chrono::NaiveDate::from_ymd_opt(2026, 1, 5)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| SandboxError::Seed("invalid demo appointment start".into()))?;

    Ok(AppointmentData {
        id: Some(id),
        status: AppointmentStatus::Booked,
        based_on: vec![fhir::Reference::to_resource(
            "ServiceRequest",
            request_id,
            format!("Solicitud {request_id}"),
        )],
        start,
        end: start + chrono::TimeDelta::minutes(30),
        appointment_type: None,
        description: None,
        participants: Vec::new(),
        patient_instruction: None,
    })
}

const DEMO_SERVICE_REQUESTS: [&str; 5] = [
    r#"{
        "resourceType": "ServiceRequest",
        "id": "SR-100",
        "status": "active",
        "intent": "order",
        "priority": "routine",
        "identifier": [{"system": "http://hospital.sistema/solicitudes", "value": "ORD-100"}],
        "subject": {"reference": "Patient/P-001", "display": "Ana Torres"},
        "code": {"coding": [{"system": "http://loinc.org", "code": "36643-5", "display": "Radiografía de tórax"}]},
        "note": [{"text": "Paciente con tos persistente"}]
    }"#,
    r#"{
        "resourceType": "ServiceRequest",
        "id": "SR-200",
        "status": "active",
        "priority": "urgent",
        "subject": {"reference": "Patient/P-002", "display": "Luis Ramírez"},
        "code": {"text": "Tomografía de abdomen"}
    }"#,
    r#"{
        "resourceType": "ServiceRequest",
        "id": "SR-300",
        "status": "active",
        "priority": "stat",
        "subject": {"reference": "Patient/P-003"},
        "code": {"coding": [{"code": "MRI-BRAIN"}]}
    }"#,
    r#"{
        "resourceType": "ServiceRequest",
        "id": "SR-400",
        "status": "on-hold",
        "priority": "routine",
        "subject": {"display": "Marta Díaz"}
    }"#,
    r#"{
        "resourceType": "ServiceRequest",
        "id": "SR-500",
        "status": "completed",
        "priority": "asap",
        "identifier": [{"system": "http://hospital.sistema/solicitudes", "value": "ORD-500"}],
        "subject": {"reference": "Patient/P-005", "display": "Jorge Castillo"},
        "code": {"text": "Ecografía abdominal"}
    }"#,
];

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> ResourceId {
        ResourceId::new(value).expect("valid id")
    }

    #[test]
    fn test_demo_store_books_sr_200() {
        let store = Store::demo().expect("demo data is valid");

        let existing = store.appointment_for("SR-200").expect("SR-200 is booked");
        assert_eq!(existing.id.as_ref().map(ResourceId::as_str), Some("A-1"));
        assert!(store.appointment_for("SR-100").is_none());
    }

    #[test]
    fn test_identifier_search_respects_system() {
        let store = Store::demo().expect("demo data is valid");

        let found = store.find_by_identifier(Some("http://hospital.sistema/solicitudes"), "ORD-500");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id.as_str(), "SR-500");

        assert!(store
            .find_by_identifier(Some("urn:other"), "ORD-500")
            .is_empty());
        assert_eq!(store.find_by_identifier(None, "ORD-100").len(), 1);
    }

    #[test]
    fn test_book_rejects_second_booking() {
        let mut store = Store::demo().expect("demo data is valid");
        let appointment = demo_appointment(id("ignored"), "SR-100").expect("appointment");

        let first = store.book(appointment.clone(), id("A-2"));
        assert!(matches!(first, BookOutcome::Created(_)));

        let second = store.book(appointment, id("A-3"));
        assert_eq!(
            second,
            BookOutcome::AlreadyBooked {
                request_id: "SR-100".into(),
                appointment_id: id("A-2"),
            }
        );
        assert_eq!(store.appointment_count(), 2);
    }

    #[test]
    fn test_book_rejects_unknown_request() {
        let mut store = Store::demo().expect("demo data is valid");
        let appointment = demo_appointment(id("ignored"), "SR-999").expect("appointment");

        assert_eq!(
            store.book(appointment, id("A-2")),
            BookOutcome::UnknownRequest("SR-999".into())
        );
    }

    #[test]
    fn test_cancelled_appointment_frees_request() {
        let mut store = Store::demo().expect("demo data is valid");
        let mut cancelled = demo_appointment(id("A-9"), "SR-300").expect("appointment");
        cancelled.status = AppointmentStatus::Cancelled;
        store.insert_appointment(cancelled);

        assert!(store.appointment_for("SR-300").is_none());
    }

    #[test]
    fn test_load_seed_file() {
        let path = std::env::temp_dir().join(format!("radbook-seed-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"[{"resourceType": "ServiceRequest", "id": "SR-900", "status": "draft"}]"#,
        )
        .expect("write seed");

        let loaded = Store::load_seed_file(&path).expect("seed loads");
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id.as_str(), "SR-900");
    }
}
