//! FHIR-aligned appointment wire models and translation helpers.
//!
//! Appointments are built locally from a verified service request and posted once. The same
//! wire model is used to read them back (the sandbox server validates posted bodies with it).
//!
//! Notes:
//! - `start`/`end` are rendered as second-precision UTC instants (`2026-10-20T09:00:00Z`)
//! - `basedOn` is the link back to the service request and drives duplicate detection

use crate::datatypes::{CodeableConceptWire, ReferenceWire};
use crate::{CodeableConcept, FhirError, FhirResult, Reference, ResourceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

// ============================================================================
// Public domain-level types
// ============================================================================

/// Appointment status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppointmentStatus {
    Proposed,
    Pending,
    Booked,
    Arrived,
    Fulfilled,
    Cancelled,
    NoShow,
    EnteredInError,
}

impl AppointmentStatus {
    fn to_wire(self) -> &'static str {
        match self {
            AppointmentStatus::Proposed => "proposed",
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Booked => "booked",
            AppointmentStatus::Arrived => "arrived",
            AppointmentStatus::Fulfilled => "fulfilled",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "noshow",
            AppointmentStatus::EnteredInError => "entered-in-error",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "proposed" => Some(AppointmentStatus::Proposed),
            "pending" => Some(AppointmentStatus::Pending),
            "booked" => Some(AppointmentStatus::Booked),
            "arrived" => Some(AppointmentStatus::Arrived),
            "fulfilled" => Some(AppointmentStatus::Fulfilled),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            "noshow" => Some(AppointmentStatus::NoShow),
            "entered-in-error" => Some(AppointmentStatus::EnteredInError),
            _ => None,
        }
    }

    /// Whether an appointment in this status still occupies its service request.
    pub fn holds_booking(self) -> bool {
        !matches!(
            self,
            AppointmentStatus::Cancelled | AppointmentStatus::EnteredInError
        )
    }
}

/// A participant in the appointment (here: the assigned radiologist).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Participant {
    pub actor: Reference,
    /// Participation status, e.g. `accepted`.
    pub status: String,
}

/// Domain-level carrier for an appointment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppointmentData {
    /// Server-assigned id; `None` for an appointment not yet created.
    pub id: Option<ResourceId>,
    pub status: AppointmentStatus,
    pub based_on: Vec<Reference>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub appointment_type: Option<CodeableConcept>,
    pub description: Option<String>,
    pub participants: Vec<Participant>,
    pub patient_instruction: Option<String>,
}

impl AppointmentData {
    /// Ids of the service requests this appointment is based on.
    pub fn service_request_ids(&self) -> impl Iterator<Item = &str> {
        self.based_on
            .iter()
            .filter_map(|r| r.target_id("ServiceRequest"))
    }
}

// ============================================================================
// Public Appointment operations
// ============================================================================

/// Appointment resource operations.
///
/// This is a zero-sized type used for namespacing appointment operations.
/// All methods are associated functions.
pub struct Appointment;

impl Appointment {
    /// Parse an appointment from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if:
    /// - the text is not JSON or a field has an unexpected type,
    /// - `resourceType` is present and is not "Appointment",
    /// - `status` is missing or outside the FHIR value set,
    /// - `start`/`end` are missing, not RFC 3339 instants, or `end` is not after `start`,
    /// - `id` is present but blank.
    pub fn parse(json_text: &str) -> FhirResult<AppointmentData> {
        let value: serde_json::Value = serde_json::from_str(json_text)?;
        Self::from_value(value)
    }

    /// Translate an already-decoded JSON value. See [`Appointment::parse`].
    pub fn from_value(value: serde_json::Value) -> FhirResult<AppointmentData> {
        let wire: AppointmentWire = crate::from_value_with_path(value, "Appointment")?;
        crate::check_resource_type(wire.resource_type.as_deref(), "Appointment")?;
        wire_to_domain(wire)
    }

    /// Render an appointment as a JSON value.
    pub fn to_value(data: &AppointmentData) -> FhirResult<serde_json::Value> {
        serde_json::to_value(domain_to_wire(data))
            .map_err(|e| FhirError::Translation(format!("Failed to serialise appointment: {e}")))
    }

}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct AppointmentWire {
    #[serde(rename = "resourceType", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(rename = "basedOn", default, skip_serializing_if = "Vec::is_empty")]
    pub based_on: Vec<ReferenceWire>,

    #[serde(default)]
    pub start: Option<String>,

    #[serde(default)]
    pub end: Option<String>,

    #[serde(
        rename = "appointmentType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub appointment_type: Option<CodeableConceptWire>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participant: Vec<ParticipantWire>,

    #[serde(
        rename = "patientInstruction",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub patient_instruction: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct ParticipantWire {
    #[serde(default)]
    pub actor: ReferenceWire,

    pub status: String,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn parse_instant(field: &str, value: Option<&str>) -> FhirResult<DateTime<Utc>> {
    let value =
        value.ok_or_else(|| FhirError::InvalidInput(format!("Appointment.{field} is required")))?;
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| FhirError::Translation(format!("Appointment.{field} '{value}': {e}")))
}

fn wire_to_domain(wire: AppointmentWire) -> FhirResult<AppointmentData> {
    let id = wire
        .id
        .as_deref()
        .map(|raw| {
            ResourceId::new(raw)
                .map_err(|e| FhirError::InvalidId(format!("Appointment id '{raw}': {e}")))
        })
        .transpose()?;

    let status = match wire.status.as_deref() {
        Some(s) => AppointmentStatus::from_wire(s).ok_or_else(|| {
            FhirError::InvalidInput(format!("Unsupported Appointment.status '{s}'"))
        })?,
        None => {
            return Err(FhirError::InvalidInput(
                "Appointment.status is required".into(),
            ))
        }
    };

    let start = parse_instant("start", wire.start.as_deref())?;
    let end = parse_instant("end", wire.end.as_deref())?;
    if end <= start {
        return Err(FhirError::InvalidInput(
            "Appointment.end must be after Appointment.start".into(),
        ));
    }

    Ok(AppointmentData {
        id,
        status,
        based_on: wire.based_on.into_iter().map(Reference::from).collect(),
        start,
        end,
        appointment_type: wire.appointment_type.map(CodeableConcept::from),
        description: wire.description,
        participants: wire
            .participant
            .into_iter()
            .map(|p| Participant {
                actor: Reference::from(p.actor),
                status: p.status,
            })
            .collect(),
        patient_instruction: wire.patient_instruction,
    })
}

fn domain_to_wire(data: &AppointmentData) -> AppointmentWire {
    AppointmentWire {
        resource_type: Some("Appointment".to_string()),
        id: data.id.as_ref().map(ToString::to_string),
        status: Some(data.status.to_wire().to_string()),
        based_on: data.based_on.iter().map(ReferenceWire::from).collect(),
        start: Some(data.start.format(INSTANT_FORMAT).to_string()),
        end: Some(data.end.format(INSTANT_FORMAT).to_string()),
        appointment_type: data.appointment_type.as_ref().map(CodeableConceptWire::from),
        description: data.description.clone(),
        participant: data
            .participants
            .iter()
            .map(|p| ParticipantWire {
                actor: ReferenceWire::from(&p.actor),
                status: p.status.clone(),
            })
            .collect(),
        patient_instruction: data.patient_instruction.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Coding;
    use chrono::TimeZone;

    fn sample() -> AppointmentData {
        AppointmentData {
            id: None,
            status: AppointmentStatus::Booked,
            based_on: vec![Reference::to_resource(
                "ServiceRequest",
                "SR-100",
                "Solicitud SR-100",
            )],
            start: Utc.with_ymd_and_hms(2026, 10, 20, 9, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2026, 10, 20, 9, 30, 0).unwrap(),
            appointment_type: Some(CodeableConcept {
                codings: vec![Coding {
                    system: Some("http://terminology.hl7.org/CodeSystem/v2-0276".into()),
                    code: Some("CT".into()),
                    display: None,
                }],
                text: Some("Tomografía".into()),
            }),
            description: Some("Cita radiológica programada".into()),
            participants: vec![Participant {
                actor: Reference {
                    reference: Some("Practitioner/radiologo".into()),
                    display: Some("Radiólogo asignado".into()),
                },
                status: "accepted".into(),
            }],
            patient_instruction: Some("Llegar 15 minutos antes con orden médica".into()),
        }
    }

    #[test]
    fn renders_wire_shape() {
        let value = Appointment::to_value(&sample()).expect("render");

        assert_eq!(value["resourceType"], "Appointment");
        assert_eq!(value["status"], "booked");
        assert_eq!(value["basedOn"][0]["reference"], "ServiceRequest/SR-100");
        assert_eq!(value["start"], "2026-10-20T09:00:00Z");
        assert_eq!(value["end"], "2026-10-20T09:30:00Z");
        assert_eq!(value["appointmentType"]["coding"][0]["code"], "CT");
        assert_eq!(value["participant"][0]["status"], "accepted");
        assert!(value.get("id").is_none());
    }

    #[test]
    fn parse_reads_back_rendered_appointment() {
        let json = Appointment::to_value(&sample()).expect("render").to_string();
        let parsed = Appointment::parse(&json).expect("parse");

        assert_eq!(parsed, sample());
        assert_eq!(parsed.service_request_ids().collect::<Vec<_>>(), vec!["SR-100"]);
    }

    #[test]
    fn rejects_end_before_start() {
        let mut data = sample();
        data.end = data.start - chrono::Duration::minutes(5);
        let json = Appointment::to_value(&data).expect("render").to_string();

        let err = Appointment::parse(&json).expect_err("should reject inverted window");
        assert!(matches!(err, FhirError::InvalidInput(_)), "got {err:?}");
    }

    #[test]
    fn rejects_missing_or_unknown_status() {
        let err = Appointment::parse(
            r#"{"start": "2026-10-20T09:00:00Z", "end": "2026-10-20T09:30:00Z"}"#,
        )
        .expect_err("missing status");
        assert!(matches!(err, FhirError::InvalidInput(_)));

        let err = Appointment::parse(
            r#"{"status": "maybe", "start": "2026-10-20T09:00:00Z", "end": "2026-10-20T09:30:00Z"}"#,
        )
        .expect_err("unknown status");
        match err {
            FhirError::InvalidInput(msg) => assert!(msg.contains("maybe")),
            other => panic!("expected InvalidInput error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_instant() {
        let err = Appointment::parse(
            r#"{"status": "booked", "start": "2026-10-20", "end": "2026-10-20T09:30:00Z"}"#,
        )
        .expect_err("date without time");
        match err {
            FhirError::Translation(msg) => assert!(msg.contains("start")),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn cancelled_appointments_release_booking() {
        assert!(AppointmentStatus::Booked.holds_booking());
        assert!(!AppointmentStatus::Cancelled.holds_booking());
        assert!(!AppointmentStatus::EnteredInError.holds_booking());
    }
}
