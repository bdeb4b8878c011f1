use chrono::NaiveDate;
use fhir::{RequestStatus, ResourceId};

/// A single problem found while validating the appointment form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldViolation {
    #[error("appointment date is required")]
    MissingDate,
    #[error("appointment date {0} is in the past")]
    DateInPast(NaiveDate),
    #[error("modality is required")]
    MissingModality,
    #[error("unknown modality '{0}'")]
    UnknownModality(String),
    #[error("start and end times must be given together")]
    IncompleteTimeWindow,
    #[error("end time must be after start time")]
    InvertedTimeWindow,
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failures of the Clinical Records API client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{operation} timed out after {timeout_ms} ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },
    #[error("{operation} failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{operation} returned unexpected HTTP status {status}")]
    UnexpectedStatus { operation: &'static str, status: u16 },
    #[error("{operation} returned a malformed body: {detail}")]
    Malformed {
        operation: &'static str,
        detail: String,
    },
    #[error("appointment rejected with HTTP status {status}")]
    Rejected { status: u16, detail: Option<String> },
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Terminal failures of the booking workflow. None of them is retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("service request id is required")]
    EmptyInput,
    #[error("service request '{0}' was not found")]
    NotFound(String),
    #[error("service request {id} has status '{status}' and cannot be booked")]
    InvalidState { id: ResourceId, status: RequestStatus },
    #[error("an appointment already exists for this service request (id: {0})")]
    DuplicateBooking(ResourceId),
    #[error("the service request must be verified before submitting")]
    NotVerified,
    #[error("invalid appointment form: {}", join_violations(.0))]
    ValidationError(Vec<FieldViolation>),
    #[error(
        "appointment was not created (HTTP {status}): {}",
        .detail.as_deref().unwrap_or("no detail")
    )]
    SubmissionError { status: u16, detail: Option<String> },
    #[error("{operation} timed out")]
    TransportTimeout { operation: &'static str },
    #[error("{operation} failed: {detail}")]
    TransportFailure {
        operation: &'static str,
        detail: String,
    },
}

impl From<ApiError> for BookingError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Timeout { operation, .. } => BookingError::TransportTimeout { operation },
            ApiError::Rejected { status, detail } => {
                BookingError::SubmissionError { status, detail }
            }
            ApiError::Transport { operation, source } => BookingError::TransportFailure {
                operation,
                detail: source.to_string(),
            },
            ApiError::UnexpectedStatus { operation, status } => BookingError::TransportFailure {
                operation,
                detail: format!("unexpected HTTP status {status}"),
            },
            ApiError::Malformed { operation, detail } => {
                BookingError::TransportFailure { operation, detail }
            }
        }
    }
}

pub type BookingResult<T> = std::result::Result<T, BookingError>;

/// Invalid startup configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key}='{value}' is invalid: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
