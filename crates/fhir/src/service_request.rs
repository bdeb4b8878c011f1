//! FHIR-aligned service request wire models and translation helpers.
//!
//! A service request is the clinical order an appointment is booked against. The booking
//! workflow only reads it, so the domain type keeps the handful of fields that matter:
//! status (bookability), subject, priority, procedure code and the first note.
//!
//! Responsibilities:
//! - Define public domain-level types for external API use
//! - Define a lenient wire model for the JSON returned by the Clinical Records API
//! - Provide translation helpers between domain primitives and the wire model
//! - Reject resources without a usable `id`

use crate::datatypes::{non_blank, CodeableConceptWire, IdentifierWire, ReferenceWire};
use crate::{CodeableConcept, FhirError, FhirResult, Identifier, Reference, ResourceId};
use serde::{Deserialize, Serialize};

// ============================================================================
// Public domain-level types
// ============================================================================

/// Workflow status of a service request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestStatus {
    Draft,
    Active,
    OnHold,
    Revoked,
    Completed,
    EnteredInError,
    Unknown,
    /// Any value outside the FHIR value set, kept verbatim.
    Other(String),
}

impl RequestStatus {
    /// Only active and completed requests can have an appointment booked against them.
    pub fn is_bookable(&self) -> bool {
        matches!(self, RequestStatus::Active | RequestStatus::Completed)
    }

    pub fn as_wire(&self) -> &str {
        match self {
            RequestStatus::Draft => "draft",
            RequestStatus::Active => "active",
            RequestStatus::OnHold => "on-hold",
            RequestStatus::Revoked => "revoked",
            RequestStatus::Completed => "completed",
            RequestStatus::EnteredInError => "entered-in-error",
            RequestStatus::Unknown => "unknown",
            RequestStatus::Other(other) => other,
        }
    }

    fn from_wire(s: &str) -> Self {
        match s {
            "draft" => RequestStatus::Draft,
            "active" => RequestStatus::Active,
            "on-hold" => RequestStatus::OnHold,
            "revoked" => RequestStatus::Revoked,
            "completed" => RequestStatus::Completed,
            "entered-in-error" => RequestStatus::EnteredInError,
            "unknown" => RequestStatus::Unknown,
            other => RequestStatus::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Urgency of a service request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestPriority {
    Routine,
    Urgent,
    Asap,
    Stat,
    /// Any value outside the FHIR value set, kept verbatim.
    Other(String),
}

impl RequestPriority {
    pub fn as_wire(&self) -> &str {
        match self {
            RequestPriority::Routine => "routine",
            RequestPriority::Urgent => "urgent",
            RequestPriority::Asap => "asap",
            RequestPriority::Stat => "stat",
            RequestPriority::Other(other) => other,
        }
    }

    fn from_wire(s: &str) -> Self {
        match s {
            "routine" => RequestPriority::Routine,
            "urgent" => RequestPriority::Urgent,
            "asap" => RequestPriority::Asap,
            "stat" => RequestPriority::Stat,
            other => RequestPriority::Other(other.to_string()),
        }
    }
}

/// How the subject of a request can be named, in order of preference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubjectName<'a> {
    /// Explicit display text.
    Display(&'a str),
    /// Id part of a `Type/id` reference, or the whole reference when it has no slash.
    Reference(&'a str),
    /// A subject is present but carries neither display nor reference.
    Unnamed,
    /// No subject at all.
    Missing,
}

/// Domain-level carrier for a service request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceRequestData {
    /// Server-assigned identifier. Appointments reference this, never a user-typed id.
    pub id: ResourceId,

    pub status: RequestStatus,

    /// Business identifiers (system + value), used by identifier search.
    pub identifiers: Vec<Identifier>,

    /// Patient the request is for.
    pub subject: Option<Reference>,

    pub priority: Option<RequestPriority>,

    /// Requested procedure.
    pub code: Option<CodeableConcept>,

    /// Text of the first annotation, if any.
    pub note: Option<String>,
}

impl ServiceRequestData {
    pub fn is_bookable_status(&self) -> bool {
        self.status.is_bookable()
    }

    pub fn subject_name(&self) -> SubjectName<'_> {
        let Some(subject) = &self.subject else {
            return SubjectName::Missing;
        };

        if let Some(display) = non_blank(subject.display.as_deref()) {
            return SubjectName::Display(display);
        }

        match non_blank(subject.reference.as_deref()) {
            Some(reference) => match reference.split('/').nth(1) {
                Some(id) if !id.is_empty() => SubjectName::Reference(id),
                _ => SubjectName::Reference(reference),
            },
            None => SubjectName::Unnamed,
        }
    }

    /// Procedure descriptor, see [`CodeableConcept::descriptor`].
    ///
    /// The outer `Option` is `None` when the request has no code at all; the inner one is
    /// `None` when a code is present but carries no usable text.
    pub fn procedure(&self) -> Option<Option<&str>> {
        self.code.as_ref().map(CodeableConcept::descriptor)
    }

    pub fn has_identifier(&self, system: &str, value: &str) -> bool {
        self.identifiers.iter().any(|i| i.matches(system, value))
    }
}

// ============================================================================
// Public ServiceRequest operations
// ============================================================================

/// Service request resource operations.
///
/// This is a zero-sized type used for namespacing service request operations.
/// All methods are associated functions.
pub struct ServiceRequest;

impl ServiceRequest {
    /// Parse a service request from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if:
    /// - the text is not JSON,
    /// - any read field has an unexpected type,
    /// - `resourceType` is present and is not "ServiceRequest",
    /// - the resource has no usable `id`.
    pub fn parse(json_text: &str) -> FhirResult<ServiceRequestData> {
        let value: serde_json::Value = serde_json::from_str(json_text)?;
        Self::from_value(value)
    }

    /// Translate an already-decoded JSON value. See [`ServiceRequest::parse`].
    pub fn from_value(value: serde_json::Value) -> FhirResult<ServiceRequestData> {
        let wire: ServiceRequestWire = crate::from_value_with_path(value, "ServiceRequest")?;
        crate::check_resource_type(wire.resource_type.as_deref(), "ServiceRequest")?;
        wire_to_domain(wire)
    }

    /// Render a service request as a JSON value.
    pub fn to_value(data: &ServiceRequestData) -> FhirResult<serde_json::Value> {
        serde_json::to_value(domain_to_wire(data)).map_err(|e| {
            FhirError::Translation(format!("Failed to serialise service request: {e}"))
        })
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct ServiceRequestWire {
    #[serde(rename = "resourceType", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<IdentifierWire>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<ReferenceWire>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConceptWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub note: Vec<AnnotationWire>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
struct AnnotationWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn wire_to_domain(wire: ServiceRequestWire) -> FhirResult<ServiceRequestData> {
    let raw_id = wire
        .id
        .ok_or_else(|| FhirError::InvalidId("ServiceRequest has no id".into()))?;
    let id = ResourceId::new(&raw_id)
        .map_err(|e| FhirError::InvalidId(format!("ServiceRequest id '{raw_id}': {e}")))?;

    // A missing status is not bookable.
    let status = wire
        .status
        .as_deref()
        .map(RequestStatus::from_wire)
        .unwrap_or(RequestStatus::Unknown);

    let note = wire
        .note
        .into_iter()
        .next()
        .and_then(|n| n.text)
        .filter(|t| !t.trim().is_empty());

    Ok(ServiceRequestData {
        id,
        status,
        identifiers: wire.identifier.into_iter().map(Identifier::from).collect(),
        subject: wire.subject.map(Reference::from),
        priority: wire.priority.as_deref().map(RequestPriority::from_wire),
        code: wire.code.map(CodeableConcept::from),
        note,
    })
}

fn domain_to_wire(data: &ServiceRequestData) -> ServiceRequestWire {
    ServiceRequestWire {
        resource_type: Some("ServiceRequest".to_string()),
        id: Some(data.id.to_string()),
        identifier: data.identifiers.iter().map(IdentifierWire::from).collect(),
        status: Some(data.status.as_wire().to_string()),
        subject: data.subject.as_ref().map(ReferenceWire::from),
        priority: data.priority.as_ref().map(|p| p.as_wire().to_string()),
        code: data.code.as_ref().map(CodeableConceptWire::from),
        note: data
            .note
            .iter()
            .map(|text| AnnotationWire {
                text: Some(text.clone()),
            })
            .collect(),
    }
}
