//! Constants used throughout the radbook core crate.
//!
//! Environment variable names, defaults and fixed FHIR systems live here so the client,
//! config and drafting code agree on them.

/// Default Clinical Records API base URL (the local sandbox).
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:3000";

/// Identifier system used for the fallback service request search.
pub const DEFAULT_IDENTIFIER_SYSTEM: &str = "http://hospital.sistema/solicitudes";

/// Timeout for lookups (service request fetch, identifier search, appointment lookup).
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 5_000;

/// Timeout for the appointment create call.
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 10_000;

/// Default slot start (UTC, minutes after midnight) when the form has no explicit times.
pub const DEFAULT_SLOT_START_MINUTES: u32 = 9 * 60;

/// Default slot length in minutes.
pub const DEFAULT_SLOT_MINUTES: u32 = 30;

/// Upper bound for a configured slot length (12 hours).
pub const MAX_SLOT_MINUTES: u32 = 720;

/// Coding system for the appointment type (HL7 v2 table 0276).
pub const APPOINTMENT_TYPE_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v2-0276";

/// Practitioner every appointment is assigned to until a radiologist is scheduled.
pub const DEFAULT_PRACTITIONER_REFERENCE: &str = "Practitioner/radiologo";

/// Participation status recorded for the assigned practitioner.
pub const PARTICIPANT_STATUS_ACCEPTED: &str = "accepted";

pub const ENV_API_BASE_URL: &str = "RADBOOK_API_BASE_URL";
pub const ENV_IDENTIFIER_SYSTEM: &str = "RADBOOK_IDENTIFIER_SYSTEM";
pub const ENV_READ_TIMEOUT_MS: &str = "RADBOOK_READ_TIMEOUT_MS";
pub const ENV_WRITE_TIMEOUT_MS: &str = "RADBOOK_WRITE_TIMEOUT_MS";
pub const ENV_LOCALE: &str = "RADBOOK_LOCALE";
pub const ENV_DUPLICATE_CHECK: &str = "RADBOOK_DUPLICATE_CHECK";
pub const ENV_SLOT_START: &str = "RADBOOK_SLOT_START";
pub const ENV_SLOT_MINUTES: &str = "RADBOOK_SLOT_MINUTES";
pub const ENV_PRACTITIONER_REFERENCE: &str = "RADBOOK_PRACTITIONER_REFERENCE";
