//! # radbook Core
//!
//! Booking workflow for radiology appointments.
//!
//! This crate contains the verify → submit workflow and everything it needs:
//! - [`BookingController`]: the state machine holding the verified service request
//! - Appointment form validation and drafting
//! - Localised labels for summaries, confirmations and error notices
//! - [`ClinicalRecordsApi`] with its reqwest implementation
//! - [`NotificationSurface`], the sink for user-visible feedback
//! - [`BookingConfig`], resolved once at startup
//!
//! **No presentation concerns**: terminal output and servers belong in `radbook-cli` and
//! `radbook-sandbox`.

pub mod client;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod form;
pub mod labels;
pub mod notify;
pub mod summary;

pub use client::{ClinicalRecordsApi, HttpClinicalRecordsApi};
pub use config::{BookingConfig, DuplicateCheckPolicy, SlotPolicy};
pub use controller::{BookingController, BookingState, Clock, Phase};
pub use error::{
    ApiError, ApiResult, BookingError, BookingResult, ConfigError, FieldViolation,
};
pub use form::{AppointmentDraft, AppointmentForm, Modality, ValidatedForm};
pub use labels::{Caption, Locale};
pub use notify::{Control, NoticeKind, NotificationSurface, TracingSurface};
pub use summary::{BookingConfirmation, RequestSummary};
