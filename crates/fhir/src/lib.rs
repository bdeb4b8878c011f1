//! FHIR wire/boundary support for radiology appointment booking.
//!
//! This crate provides **wire models** and **format/translation helpers** for the JSON
//! resources exchanged with the Clinical Records API:
//! - `ServiceRequest` (read-only, fetched during verification)
//! - `Appointment` (constructed locally, posted once)
//!
//! This crate focuses on:
//! - FHIR semantic alignment for the subset of fields the booking workflow uses
//! - serialisation/deserialisation
//! - translation between domain primitives and wire structs
//!
//! HTTP transport lives in `radbook-core`; nothing here performs I/O.

pub mod appointment;
pub mod datatypes;
pub mod service_request;

// Re-export facades
pub use appointment::Appointment;
pub use service_request::ServiceRequest;

// Re-export public domain-level types
pub use appointment::{AppointmentData, AppointmentStatus, Participant};
pub use datatypes::{CodeableConcept, Coding, Identifier, Reference};
pub use service_request::{RequestPriority, RequestStatus, ServiceRequestData, SubjectName};

pub use radbook_types::ResourceId;

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("invalid resource id: {0}")]
    InvalidId(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;

/// Extract the `id` of a single resource object.
///
/// Returns `None` for anything that is not an object with a usable string `id`.
pub fn resource_id_of(value: &serde_json::Value) -> Option<ResourceId> {
    value
        .get("id")
        .and_then(serde_json::Value::as_str)
        .and_then(|id| ResourceId::new(id).ok())
}

/// Reduce a lookup response that may be a single resource, an array of resources or `null`
/// to the first resource it contains.
pub fn first_resource(value: serde_json::Value) -> Option<serde_json::Value> {
    match value {
        serde_json::Value::Array(items) => items.into_iter().next(),
        serde_json::Value::Null => None,
        other => Some(other),
    }
}

/// Deserialize `value` into a wire struct, reporting the failing field path on mismatch.
pub(crate) fn from_value_with_path<T>(value: serde_json::Value, resource: &str) -> FhirResult<T>
where
    T: serde::de::DeserializeOwned,
{
    serde_path_to_error::deserialize::<_, T>(value).map_err(|err| {
        let path = err.path().to_string();
        let source = err.into_inner();
        let path = if path.is_empty() || path == "." {
            "<root>"
        } else {
            path.as_str()
        };
        FhirError::Translation(format!("{resource} schema mismatch at {path}: {source}"))
    })
}

/// Check an optional `resourceType` discriminator.
///
/// The remote API sometimes omits `resourceType`; a present but different value is rejected.
pub(crate) fn check_resource_type(found: Option<&str>, expected: &str) -> FhirResult<()> {
    match found {
        Some(found) if found != expected => Err(FhirError::InvalidInput(format!(
            "Expected resourceType '{expected}', got '{found}'"
        ))),
        _ => Ok(()),
    }
}
