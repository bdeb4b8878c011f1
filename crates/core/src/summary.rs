//! Rendered summaries shown after verification and after booking.

use crate::labels::{Caption, Locale};
use chrono::NaiveDate;
use fhir::{ResourceId, ServiceRequestData};

/// What the user sees about a verified service request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestSummary {
    pub request_id: ResourceId,
    pub patient: String,
    pub priority: String,
    pub procedure: String,
    pub note: Option<String>,
}

impl RequestSummary {
    pub fn new(request: &ServiceRequestData, locale: Locale) -> Self {
        Self {
            request_id: request.id.clone(),
            patient: locale.patient_name(request.subject_name()).to_string(),
            priority: locale.priority(request.priority.as_ref()).to_string(),
            procedure: locale.procedure_name(request.procedure()).to_string(),
            note: request.note.clone(),
        }
    }

    /// One `Caption: value` line per field; the note line only when a note exists.
    pub fn render(&self, locale: Locale) -> String {
        let mut lines = vec![
            format!("{}: {}", locale.caption(Caption::RequestId), self.request_id),
            format!("{}: {}", locale.caption(Caption::Patient), self.patient),
            format!("{}: {}", locale.caption(Caption::Priority), self.priority),
            format!("{}: {}", locale.caption(Caption::Procedure), self.procedure),
        ];
        if let Some(note) = &self.note {
            lines.push(format!("{}: {}", locale.caption(Caption::Notes), note));
        }
        lines.join("\n")
    }
}

/// Confirmation of a created appointment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingConfirmation {
    pub appointment_id: ResourceId,
    pub request_id: ResourceId,
    pub patient: String,
    pub procedure: String,
    pub date: NaiveDate,
}

impl BookingConfirmation {
    pub fn render(&self, locale: Locale) -> String {
        [
            locale.booked_intro().to_string(),
            String::new(),
            format!(
                "{}: {}",
                locale.caption(Caption::AppointmentId),
                self.appointment_id
            ),
            format!("{}: {}", locale.caption(Caption::Patient), self.patient),
            format!("{}: {}", locale.caption(Caption::Procedure), self.procedure),
            format!(
                "{}: {}",
                locale.caption(Caption::Date),
                locale.long_date(self.date)
            ),
        ]
        .join("\n")
    }
}
