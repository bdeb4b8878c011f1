//! Booking workflow controller.
//!
//! [`BookingController`] owns the verify → validate → duplicate check → submit → reset
//! sequence. The verified service request lives inside [`BookingState`], so an appointment
//! can only ever be based on the request returned by the last successful
//! [`BookingController::verify`]. Both operations take `&mut self`; a second trigger while
//! one is in flight cannot be expressed.

use crate::client::ClinicalRecordsApi;
use crate::config::{BookingConfig, DuplicateCheckPolicy};
use crate::error::{BookingError, BookingResult};
use crate::form::{AppointmentDraft, AppointmentForm};
use crate::notify::{Control, NoticeKind, NotificationSurface};
use crate::summary::{BookingConfirmation, RequestSummary};
use chrono::{NaiveDate, Utc};
use fhir::{ResourceId, ServiceRequestData};

/// Source of "today" for form defaults and the date floor.
pub type Clock = fn() -> NaiveDate;

fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Workflow state. The held request is only reachable through `Verified` and `Submitting`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BookingState {
    #[default]
    Idle,
    Verifying,
    Verified(ServiceRequestData),
    Submitting(ServiceRequestData),
}

/// Data-free view of [`BookingState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Verifying,
    Verified,
    Submitting,
}

impl BookingState {
    pub fn phase(&self) -> Phase {
        match self {
            BookingState::Idle => Phase::Idle,
            BookingState::Verifying => Phase::Verifying,
            BookingState::Verified(_) => Phase::Verified,
            BookingState::Submitting(_) => Phase::Submitting,
        }
    }

    fn held_request(&self) -> Option<&ServiceRequestData> {
        match self {
            BookingState::Verified(request) | BookingState::Submitting(request) => Some(request),
            BookingState::Idle | BookingState::Verifying => None,
        }
    }
}

pub struct BookingController<A, N> {
    api: A,
    surface: N,
    config: BookingConfig,
    state: BookingState,
    form: AppointmentForm,
    clock: Clock,
}

impl<A, N> BookingController<A, N>
where
    A: ClinicalRecordsApi,
    N: NotificationSurface,
{
    pub fn new(api: A, surface: N, config: BookingConfig) -> Self {
        Self {
            api,
            surface,
            config,
            state: BookingState::Idle,
            form: AppointmentForm::with_defaults(utc_today()),
            clock: utc_today,
        }
    }

    /// Replace the clock. The form defaults are recomputed from it.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self.form = AppointmentForm::with_defaults(clock());
        self
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn state(&self) -> &BookingState {
        &self.state
    }

    /// The service request returned by the last successful verification, if still held.
    pub fn held_request(&self) -> Option<&ServiceRequestData> {
        self.state.held_request()
    }

    /// Form values as last submitted, or the defaults after a reset.
    pub fn form(&self) -> &AppointmentForm {
        &self.form
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn surface(&self) -> &N {
        &self.surface
    }

    /// Verify `request_id` against the Clinical Records API and hold the result.
    ///
    /// Any previously held request is dropped first. On failure the controller is `Idle`.
    pub async fn verify(&mut self, request_id: &str) -> BookingResult<RequestSummary> {
        let locale = self.config.locale();

        let outcome = match parse_request_id(request_id) {
            Err(err) => Err(err),
            Ok(id) => {
                self.state = BookingState::Verifying;
                self.surface.set_busy(Control::Verify, true);
                let outcome = self.fetch_bookable(&id).await;
                self.surface.set_busy(Control::Verify, false);
                outcome
            }
        };

        match outcome {
            Ok(request) => {
                let summary = RequestSummary::new(&request, locale);
                let rendered = summary.render(locale);

                tracing::info!(request_id = %request.id, "service request verified");
                self.surface
                    .present(locale.title_verified(), &rendered, NoticeKind::Success);
                self.surface.show_request_summary(Some(&rendered));
                self.surface.mark_request_input(Some(true));
                self.state = BookingState::Verified(request);
                Ok(summary)
            }
            Err(err) => {
                tracing::debug!(error = %err, "verification failed");
                self.state = BookingState::Idle;
                self.surface.show_request_summary(None);
                self.surface.mark_request_input(Some(false));
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Validate `form`, re-check for duplicates and create the appointment.
    ///
    /// A [`BookingError::ValidationError`] keeps the request held so the form can be
    /// corrected. Every other failure drops it and a new verification is required.
    pub async fn submit(&mut self, form: AppointmentForm) -> BookingResult<BookingConfirmation> {
        let request = match std::mem::take(&mut self.state) {
            BookingState::Verified(request) => request,
            other => {
                self.state = other;
                let err = BookingError::NotVerified;
                self.report(&err);
                return Err(err);
            }
        };

        self.form = form;
        self.state = BookingState::Submitting(request.clone());
        self.surface.set_busy(Control::Submit, true);
        let outcome = self.create_for(&request).await;
        self.surface.set_busy(Control::Submit, false);

        match outcome {
            Ok(confirmation) => {
                let locale = self.config.locale();
                tracing::info!(
                    request_id = %confirmation.request_id,
                    appointment_id = %confirmation.appointment_id,
                    "appointment booked"
                );
                self.surface.present(
                    locale.title_booked(),
                    &confirmation.render(locale),
                    NoticeKind::Success,
                );
                self.reset();
                Ok(confirmation)
            }
            Err(err @ BookingError::ValidationError(_)) => {
                self.state = BookingState::Verified(request);
                self.report(&err);
                Err(err)
            }
            Err(err) => {
                tracing::debug!(error = %err, request_id = %request.id, "submission failed");
                self.state = BookingState::Idle;
                self.surface.show_request_summary(None);
                self.surface.mark_request_input(None);
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Drop any held request and restore the form defaults.
    pub fn reset(&mut self) {
        self.state = BookingState::Idle;
        self.form = AppointmentForm::with_defaults((self.clock)());
        self.surface.show_request_summary(None);
        self.surface.mark_request_input(None);
    }

    async fn fetch_bookable(&mut self, id: &ResourceId) -> BookingResult<ServiceRequestData> {
        self.ensure_not_booked(id).await?;

        let request = match self.api.get_service_request(id).await? {
            Some(request) => request,
            None => self
                .api
                .find_service_request_by_identifier(self.config.identifier_system(), id)
                .await?
                .ok_or_else(|| BookingError::NotFound(id.to_string()))?,
        };

        // The identifier search can resolve to a request with a different server id.
        if &request.id != id {
            self.ensure_not_booked(&request.id).await?;
        }

        if !request.is_bookable_status() {
            return Err(BookingError::InvalidState {
                id: request.id.clone(),
                status: request.status.clone(),
            });
        }

        Ok(request)
    }

    /// Verify-time duplicate check, subject to the configured policy.
    async fn ensure_not_booked(&mut self, id: &ResourceId) -> BookingResult<()> {
        match self.api.find_appointment_for_service_request(id).await {
            Ok(Some(existing)) => Err(BookingError::DuplicateBooking(existing)),
            Ok(None) => Ok(()),
            Err(err) => match self.config.duplicate_check() {
                DuplicateCheckPolicy::FailClosed => Err(err.into()),
                DuplicateCheckPolicy::FailOpen => {
                    tracing::warn!(
                        request_id = %id,
                        error = %err,
                        "duplicate appointment check failed; continuing"
                    );
                    let locale = self.config.locale();
                    self.surface.present(
                        locale.title_warning(),
                        locale.duplicate_check_unavailable(),
                        NoticeKind::Warning,
                    );
                    Ok(())
                }
            },
        }
    }

    async fn create_for(
        &self,
        request: &ServiceRequestData,
    ) -> BookingResult<BookingConfirmation> {
        let locale = self.config.locale();
        let valid = self
            .form
            .validate((self.clock)())
            .map_err(BookingError::ValidationError)?;

        // Always against the backend, and always fail-closed.
        if let Some(existing) = self
            .api
            .find_appointment_for_service_request(&request.id)
            .await?
        {
            return Err(BookingError::DuplicateBooking(existing));
        }

        let draft = AppointmentDraft::new(&request.id, &valid, self.config.slot());
        let appointment = draft.to_appointment(locale, self.config.practitioner_reference());
        let appointment_id = self.api.create_appointment(&appointment).await?;

        Ok(BookingConfirmation {
            appointment_id,
            request_id: request.id.clone(),
            patient: locale.patient_name(request.subject_name()).to_string(),
            procedure: locale.procedure_name(request.procedure()).to_string(),
            date: valid.date(),
        })
    }

    fn report(&mut self, err: &BookingError) {
        let locale = self.config.locale();
        self.surface.present(
            locale.title_error(),
            &locale.error_message(err),
            NoticeKind::Error,
        );
    }
}

/// Trim and check the typed id before anything touches the network.
fn parse_request_id(raw: &str) -> BookingResult<ResourceId> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(BookingError::EmptyInput);
    }
    // Ids the API could never have issued are simply unknown.
    ResourceId::new(trimmed).map_err(|_| BookingError::NotFound(trimmed.to_string()))
}
