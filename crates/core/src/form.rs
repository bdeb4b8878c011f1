//! Appointment form values, validation and drafting.
//!
//! The form holds raw user input. [`AppointmentForm::validate`] collects every violation
//! rather than stopping at the first, and yields a [`ValidatedForm`] that an
//! [`AppointmentDraft`] is built from. A draft is immutable once constructed.

use crate::config::SlotPolicy;
use crate::constants::{APPOINTMENT_TYPE_SYSTEM, PARTICIPANT_STATUS_ACCEPTED};
use crate::error::FieldViolation;
use crate::labels::Locale;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use fhir::{
    AppointmentData, AppointmentStatus, CodeableConcept, Coding, Participant, Reference,
    ResourceId,
};
use radbook_types::NonEmptyText;

/// Imaging modality, coded per HL7 v2 table 0276 as used by the scheduling desk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Modality {
    /// Plain radiography.
    Rx,
    Ct,
    Mri,
    /// Ultrasound.
    Us,
    /// Mammography.
    Mg,
    /// Nuclear medicine.
    Nm,
}

impl Modality {
    pub const ALL: [Modality; 6] = [
        Modality::Rx,
        Modality::Ct,
        Modality::Mri,
        Modality::Us,
        Modality::Mg,
        Modality::Nm,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Modality::Rx => "RX",
            Modality::Ct => "CT",
            Modality::Mri => "MRI",
            Modality::Us => "US",
            Modality::Mg => "MG",
            Modality::Nm => "NM",
        }
    }

    /// Case-insensitive lookup by code.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.code().eq_ignore_ascii_case(code))
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Raw appointment form values as entered by the user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppointmentForm {
    pub date: Option<NaiveDate>,
    /// Modality code as selected; blank means nothing selected.
    pub modality: String,
    pub notes: String,
    /// Explicit slot start (UTC). Must be given together with `end_time`.
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

impl AppointmentForm {
    /// Form defaults: today's date, every optional field empty.
    pub fn with_defaults(today: NaiveDate) -> Self {
        Self {
            date: Some(today),
            ..Self::default()
        }
    }

    /// Validate all fields, reporting every violation together.
    pub fn validate(&self, today: NaiveDate) -> Result<ValidatedForm, Vec<FieldViolation>> {
        let mut violations = Vec::new();

        match self.date {
            None => violations.push(FieldViolation::MissingDate),
            Some(date) if date < today => violations.push(FieldViolation::DateInPast(date)),
            Some(_) => {}
        }

        let modality = match NonEmptyText::optional(&self.modality) {
            None => {
                violations.push(FieldViolation::MissingModality);
                None
            }
            Some(code) => {
                let parsed = Modality::from_code(code.as_str());
                if parsed.is_none() {
                    violations.push(FieldViolation::UnknownModality(code.into_string()));
                }
                parsed
            }
        };

        let window = match (self.start_time, self.end_time) {
            (None, None) => None,
            (Some(start), Some(end)) if end > start => Some((start, end)),
            (Some(_), Some(_)) => {
                violations.push(FieldViolation::InvertedTimeWindow);
                None
            }
            _ => {
                violations.push(FieldViolation::IncompleteTimeWindow);
                None
            }
        };

        match (self.date, modality) {
            (Some(date), Some(modality)) if violations.is_empty() => Ok(ValidatedForm {
                date,
                modality,
                notes: NonEmptyText::optional(&self.notes),
                window,
            }),
            _ => Err(violations),
        }
    }
}

/// Form values that passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedForm {
    date: NaiveDate,
    modality: Modality,
    notes: Option<NonEmptyText>,
    window: Option<(NaiveTime, NaiveTime)>,
}

impl ValidatedForm {
    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

/// An appointment ready to be posted, bound to a verified service request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppointmentDraft {
    based_on: ResourceId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    modality: Modality,
    notes: Option<NonEmptyText>,
}

impl AppointmentDraft {
    /// Build a draft for the verified request `based_on`.
    ///
    /// Explicit form times win over the default slot.
    pub fn new(based_on: &ResourceId, form: &ValidatedForm, slot: SlotPolicy) -> Self {
        let (start, end) = match form.window {
            Some((start, end)) => (
                form.date.and_time(start).and_utc(),
                form.date.and_time(end).and_utc(),
            ),
            None => {
                let start = form.date.and_time(slot.start()).and_utc();
                (start, start + slot.length())
            }
        };

        Self {
            based_on: based_on.clone(),
            start,
            end,
            modality: form.modality,
            notes: form.notes.clone(),
        }
    }

    pub fn based_on(&self) -> &ResourceId {
        &self.based_on
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Translate into the FHIR appointment that is posted.
    pub fn to_appointment(&self, locale: Locale, practitioner_reference: &str) -> AppointmentData {
        let request_id = self.based_on.as_str();

        AppointmentData {
            id: None,
            status: AppointmentStatus::Booked,
            based_on: vec![Reference::to_resource(
                "ServiceRequest",
                request_id,
                locale.request_display(request_id),
            )],
            start: self.start,
            end: self.end,
            appointment_type: Some(CodeableConcept {
                codings: vec![Coding {
                    system: Some(APPOINTMENT_TYPE_SYSTEM.to_string()),
                    code: Some(self.modality.code().to_string()),
                    display: None,
                }],
                text: Some(locale.modality(self.modality).to_string()),
            }),
            description: Some(
                self.notes
                    .as_ref()
                    .map(|n| n.as_str().to_string())
                    .unwrap_or_else(|| locale.default_notes().to_string()),
            ),
            participants: vec![Participant {
                actor: Reference {
                    reference: Some(practitioner_reference.to_string()),
                    display: Some(locale.practitioner_display().to_string()),
                },
                status: PARTICIPANT_STATUS_ACCEPTED.to_string(),
            }],
            patient_instruction: Some(locale.patient_instruction().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
    }

    fn today() -> NaiveDate {
        date(2026, 10, 18)
    }

    fn filled_form() -> AppointmentForm {
        AppointmentForm {
            date: Some(date(2026, 10, 20)),
            modality: "ct".into(),
            notes: "  Bring previous scans  ".into(),
            start_time: None,
            end_time: None,
        }
    }

    #[test]
    fn test_modality_lookup_is_case_insensitive() {
        assert_eq!(Modality::from_code(" mri "), Some(Modality::Mri));
        assert_eq!(Modality::from_code("RX"), Some(Modality::Rx));
        assert_eq!(Modality::from_code("PET"), None);
    }

    #[test]
    fn test_validate_accepts_complete_form() {
        let valid = filled_form().validate(today()).expect("form should be valid");
        assert_eq!(valid.modality, Modality::Ct);
        assert_eq!(valid.date(), date(2026, 10, 20));
    }

    #[test]
    fn test_validate_reports_all_missing_fields_together() {
        let form = AppointmentForm::default();
        let violations = form.validate(today()).expect_err("empty form is invalid");
        assert_eq!(
            violations,
            vec![FieldViolation::MissingDate, FieldViolation::MissingModality]
        );
    }

    #[test]
    fn test_validate_rejects_past_date_and_unknown_modality() {
        let form = AppointmentForm {
            date: Some(date(2026, 10, 17)),
            modality: "PET".into(),
            ..AppointmentForm::default()
        };
        let violations = form.validate(today()).expect_err("should be invalid");
        assert_eq!(
            violations,
            vec![
                FieldViolation::DateInPast(date(2026, 10, 17)),
                FieldViolation::UnknownModality("PET".into()),
            ]
        );
    }

    #[test]
    fn test_validate_accepts_today() {
        let form = AppointmentForm {
            modality: "US".into(),
            ..AppointmentForm::with_defaults(today())
        };
        assert!(form.validate(today()).is_ok());
    }

    #[test]
    fn test_validate_time_window_rules() {
        let half = AppointmentForm {
            start_time: Some(time(10, 0)),
            ..filled_form()
        };
        assert_eq!(
            half.validate(today()).expect_err("half window"),
            vec![FieldViolation::IncompleteTimeWindow]
        );

        let inverted = AppointmentForm {
            start_time: Some(time(10, 0)),
            end_time: Some(time(10, 0)),
            ..filled_form()
        };
        assert_eq!(
            inverted.validate(today()).expect_err("empty window"),
            vec![FieldViolation::InvertedTimeWindow]
        );
    }

    #[test]
    fn test_draft_uses_default_slot() {
        let valid = filled_form().validate(today()).expect("valid");
        let id = ResourceId::new("SR-100").expect("valid id");
        let draft = AppointmentDraft::new(&id, &valid, SlotPolicy::default());

        assert_eq!(draft.start().to_rfc3339(), "2026-10-20T09:00:00+00:00");
        assert_eq!(draft.end().to_rfc3339(), "2026-10-20T09:30:00+00:00");
        assert_eq!(draft.based_on(), &id);
    }

    #[test]
    fn test_draft_uses_explicit_times() {
        let form = AppointmentForm {
            start_time: Some(time(13, 15)),
            end_time: Some(time(14, 0)),
            ..filled_form()
        };
        let valid = form.validate(today()).expect("valid");
        let id = ResourceId::new("SR-100").expect("valid id");
        let draft = AppointmentDraft::new(&id, &valid, SlotPolicy::default());

        assert_eq!(draft.start().to_rfc3339(), "2026-10-20T13:15:00+00:00");
        assert_eq!(draft.end().to_rfc3339(), "2026-10-20T14:00:00+00:00");
    }

    #[test]
    fn test_to_appointment_fills_fhir_fields() {
        let valid = filled_form().validate(today()).expect("valid");
        let id = ResourceId::new("SR-100").expect("valid id");
        let appointment = AppointmentDraft::new(&id, &valid, SlotPolicy::default())
            .to_appointment(Locale::Es, "Practitioner/radiologo");

        assert_eq!(appointment.status, AppointmentStatus::Booked);
        assert_eq!(
            appointment.service_request_ids().collect::<Vec<_>>(),
            vec!["SR-100"]
        );
        assert_eq!(
            appointment.based_on[0].display.as_deref(),
            Some("Solicitud SR-100")
        );
        let kind = appointment.appointment_type.expect("type present");
        assert_eq!(kind.codings[0].code.as_deref(), Some("CT"));
        assert_eq!(kind.text.as_deref(), Some("Tomografía"));
        assert_eq!(
            appointment.description.as_deref(),
            Some("Bring previous scans")
        );
        assert_eq!(appointment.participants[0].status, "accepted");
    }

    #[test]
    fn test_to_appointment_defaults_notes() {
        let form = AppointmentForm {
            notes: "   ".into(),
            ..filled_form()
        };
        let valid = form.validate(today()).expect("valid");
        let id = ResourceId::new("SR-100").expect("valid id");
        let appointment = AppointmentDraft::new(&id, &valid, SlotPolicy::default())
            .to_appointment(Locale::En, "Practitioner/radiologo");

        assert_eq!(
            appointment.description.as_deref(),
            Some("Scheduled radiology appointment")
        );
    }
}
