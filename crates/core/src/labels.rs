//! Human-readable labels for the booking workflow.
//!
//! Every string shown to the user goes through [`Locale`]: priority and modality labels,
//! placeholders for missing request data, notification titles, error messages and long
//! dates. Spanish is the default, matching the radiology desks this was built for.

use crate::error::{BookingError, FieldViolation};
use crate::form::Modality;
use chrono::{Datelike, NaiveDate, Weekday};
use fhir::{RequestPriority, SubjectName};

/// Language used for presented text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    Es,
    En,
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lang = s.trim().to_ascii_lowercase();
        let lang = lang.split(['-', '_']).next().unwrap_or_default();
        match lang {
            "es" => Ok(Locale::Es),
            "en" => Ok(Locale::En),
            _ => Err("expected 'es' or 'en'".into()),
        }
    }
}

impl Locale {
    pub fn priority<'a>(&self, priority: Option<&'a RequestPriority>) -> &'a str {
        let Some(priority) = priority else {
            return match self {
                Locale::Es => "No especificada",
                Locale::En => "Not specified",
            };
        };
        match (self, priority) {
            (Locale::Es, RequestPriority::Routine) => "Rutina",
            (Locale::Es, RequestPriority::Urgent) => "Urgente",
            (Locale::En, RequestPriority::Routine) => "Routine",
            (Locale::En, RequestPriority::Urgent) => "Urgent",
            (_, RequestPriority::Asap) => "ASAP",
            (_, RequestPriority::Stat) => "STAT",
            (_, RequestPriority::Other(other)) => other.as_str(),
        }
    }

    pub fn modality(&self, modality: Modality) -> &'static str {
        match (self, modality) {
            (Locale::Es, Modality::Rx) => "Radiografía",
            (Locale::Es, Modality::Ct) => "Tomografía",
            (Locale::Es, Modality::Mri) => "Resonancia",
            (Locale::Es, Modality::Us) => "Ultrasonido",
            (Locale::Es, Modality::Mg) => "Mamografía",
            (Locale::Es, Modality::Nm) => "Medicina nuclear",
            (Locale::En, Modality::Rx) => "X-ray",
            (Locale::En, Modality::Ct) => "CT scan",
            (Locale::En, Modality::Mri) => "MRI",
            (Locale::En, Modality::Us) => "Ultrasound",
            (Locale::En, Modality::Mg) => "Mammography",
            (Locale::En, Modality::Nm) => "Nuclear medicine",
        }
    }

    pub fn patient_name<'a>(&self, subject: SubjectName<'a>) -> &'a str {
        match (self, subject) {
            (_, SubjectName::Display(name)) | (_, SubjectName::Reference(name)) => name,
            (Locale::Es, SubjectName::Unnamed) => "Paciente",
            (Locale::En, SubjectName::Unnamed) => "Patient",
            (Locale::Es, SubjectName::Missing) => "Paciente no especificado",
            (Locale::En, SubjectName::Missing) => "Unspecified patient",
        }
    }

    /// See [`fhir::ServiceRequestData::procedure`] for the nested option.
    pub fn procedure_name<'a>(&self, procedure: Option<Option<&'a str>>) -> &'a str {
        match (self, procedure) {
            (_, Some(Some(name))) => name,
            (Locale::Es, Some(None)) => "Procedimiento",
            (Locale::En, Some(None)) => "Procedure",
            (Locale::Es, None) => "Procedimiento no especificado",
            (Locale::En, None) => "Unspecified procedure",
        }
    }

    pub fn default_notes(&self) -> &'static str {
        match self {
            Locale::Es => "Cita radiológica programada",
            Locale::En => "Scheduled radiology appointment",
        }
    }

    pub fn practitioner_display(&self) -> &'static str {
        match self {
            Locale::Es => "Radiólogo asignado",
            Locale::En => "Assigned radiologist",
        }
    }

    pub fn patient_instruction(&self) -> &'static str {
        match self {
            Locale::Es => "Llegar 15 minutos antes con orden médica",
            Locale::En => "Arrive 15 minutes early with your referral",
        }
    }

    /// Display text for the `basedOn` reference.
    pub fn request_display(&self, id: &str) -> String {
        match self {
            Locale::Es => format!("Solicitud {id}"),
            Locale::En => format!("Request {id}"),
        }
    }

    pub fn title_error(&self) -> &'static str {
        "Error"
    }

    pub fn title_warning(&self) -> &'static str {
        match self {
            Locale::Es => "Advertencia",
            Locale::En => "Warning",
        }
    }

    pub fn title_verified(&self) -> &'static str {
        match self {
            Locale::Es => "Solicitud verificada",
            Locale::En => "Request verified",
        }
    }

    pub fn title_booked(&self) -> &'static str {
        match self {
            Locale::Es => "Cita creada exitosamente",
            Locale::En => "Appointment created",
        }
    }

    pub fn booked_intro(&self) -> &'static str {
        match self {
            Locale::Es => "Se ha agendado la cita correctamente.",
            Locale::En => "The appointment has been booked.",
        }
    }

    pub fn duplicate_check_unavailable(&self) -> &'static str {
        match self {
            Locale::Es => "No se pudo verificar citas existentes. Intente nuevamente.",
            Locale::En => "Existing appointments could not be checked. Please try again.",
        }
    }

    /// Caption for a summary line.
    pub fn caption(&self, caption: Caption) -> &'static str {
        match (self, caption) {
            (_, Caption::RequestId) => "ID",
            (Locale::Es, Caption::Patient) => "Paciente",
            (Locale::En, Caption::Patient) => "Patient",
            (Locale::Es, Caption::Priority) => "Prioridad",
            (Locale::En, Caption::Priority) => "Priority",
            (Locale::Es, Caption::Procedure) => "Estudio",
            (Locale::En, Caption::Procedure) => "Study",
            (Locale::Es, Caption::Notes) => "Notas",
            (Locale::En, Caption::Notes) => "Notes",
            (Locale::Es, Caption::AppointmentId) => "ID de Cita",
            (Locale::En, Caption::AppointmentId) => "Appointment ID",
            (Locale::Es, Caption::Date) => "Fecha",
            (Locale::En, Caption::Date) => "Date",
        }
    }

    pub fn violation(&self, violation: &FieldViolation) -> String {
        match (self, violation) {
            (Locale::Es, FieldViolation::MissingDate) => "Seleccione una fecha válida".into(),
            (Locale::Es, FieldViolation::DateInPast(date)) => {
                format!("La fecha {date} ya pasó; seleccione una fecha válida")
            }
            (Locale::Es, FieldViolation::MissingModality) => "Seleccione una modalidad".into(),
            (Locale::Es, FieldViolation::UnknownModality(code)) => {
                format!("Modalidad desconocida: {code}")
            }
            (Locale::Es, FieldViolation::IncompleteTimeWindow) => {
                "Indique hora de inicio y de fin".into()
            }
            (Locale::Es, FieldViolation::InvertedTimeWindow) => {
                "La hora de fin debe ser posterior a la de inicio".into()
            }
            (Locale::En, other) => capitalise(&other.to_string()),
        }
    }

    /// User-facing message for a workflow failure.
    pub fn error_message(&self, err: &BookingError) -> String {
        match self {
            Locale::En => match err {
                BookingError::SubmissionError { detail: None, .. } => {
                    "Failed to create the appointment".into()
                }
                BookingError::SubmissionError {
                    detail: Some(detail),
                    ..
                } => detail.clone(),
                BookingError::ValidationError(violations) => violations
                    .iter()
                    .map(|v| self.violation(v))
                    .collect::<Vec<_>>()
                    .join("\n"),
                other => capitalise(&other.to_string()),
            },
            Locale::Es => match err {
                BookingError::EmptyInput => "Por favor ingrese el ID de la solicitud".into(),
                BookingError::NotFound(_) => {
                    "Solicitud no encontrada. Verifique el ID e intente nuevamente.".into()
                }
                BookingError::InvalidState { .. } => {
                    "La solicitud no está en un estado válido para agendar".into()
                }
                BookingError::DuplicateBooking(id) => {
                    format!("Ya existe una cita para esta solicitud (ID: {id})")
                }
                BookingError::NotVerified => "Por favor verifique la solicitud primero".into(),
                BookingError::ValidationError(violations) => violations
                    .iter()
                    .map(|v| self.violation(v))
                    .collect::<Vec<_>>()
                    .join("\n"),
                BookingError::SubmissionError { detail, .. } => detail
                    .clone()
                    .unwrap_or_else(|| "Error al crear la cita".into()),
                BookingError::TransportTimeout { .. } => {
                    "El servidor no respondió a tiempo. Intente nuevamente.".into()
                }
                BookingError::TransportFailure { detail, .. } => {
                    format!("Error de comunicación con el servidor: {detail}")
                }
            },
        }
    }

    /// Long date, e.g. `martes, 20 de octubre de 2026` / `Tuesday, October 20, 2026`.
    pub fn long_date(&self, date: NaiveDate) -> String {
        let month = date.month0() as usize;
        match self {
            Locale::Es => format!(
                "{}, {} de {} de {}",
                weekday_es(date.weekday()),
                date.day(),
                MONTHS_ES[month],
                date.year()
            ),
            Locale::En => format!(
                "{}, {} {}, {}",
                weekday_en(date.weekday()),
                MONTHS_EN[month],
                date.day(),
                date.year()
            ),
        }
    }
}

/// Captions used in request summaries and booking confirmations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Caption {
    RequestId,
    Patient,
    Priority,
    Procedure,
    Notes,
    AppointmentId,
    Date,
}

const MONTHS_ES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

const MONTHS_EN: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

fn weekday_es(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "lunes",
        Weekday::Tue => "martes",
        Weekday::Wed => "miércoles",
        Weekday::Thu => "jueves",
        Weekday::Fri => "viernes",
        Weekday::Sat => "sábado",
        Weekday::Sun => "domingo",
    }
}

fn weekday_en(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn capitalise(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhir::ResourceId;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn parses_locale_tags() {
        assert_eq!("es".parse::<Locale>(), Ok(Locale::Es));
        assert_eq!("es-ES".parse::<Locale>(), Ok(Locale::Es));
        assert_eq!(" EN_gb ".parse::<Locale>(), Ok(Locale::En));
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn maps_priorities() {
        assert_eq!(Locale::Es.priority(Some(&RequestPriority::Routine)), "Rutina");
        assert_eq!(Locale::En.priority(Some(&RequestPriority::Routine)), "Routine");
        assert_eq!(Locale::Es.priority(Some(&RequestPriority::Stat)), "STAT");
        assert_eq!(
            Locale::En.priority(Some(&RequestPriority::Other("elective".into()))),
            "elective"
        );
        assert_eq!(Locale::Es.priority(None), "No especificada");
    }

    #[test]
    fn placeholders_for_missing_request_data() {
        assert_eq!(
            Locale::Es.patient_name(SubjectName::Missing),
            "Paciente no especificado"
        );
        assert_eq!(Locale::En.patient_name(SubjectName::Unnamed), "Patient");
        assert_eq!(Locale::En.patient_name(SubjectName::Reference("P-9")), "P-9");
        assert_eq!(Locale::Es.procedure_name(None), "Procedimiento no especificado");
        assert_eq!(Locale::Es.procedure_name(Some(None)), "Procedimiento");
        assert_eq!(Locale::En.procedure_name(Some(Some("CT Chest"))), "CT Chest");
    }

    #[test]
    fn formats_long_dates() {
        assert_eq!(
            Locale::Es.long_date(date(2026, 10, 20)),
            "martes, 20 de octubre de 2026"
        );
        assert_eq!(
            Locale::En.long_date(date(2026, 10, 20)),
            "Tuesday, October 20, 2026"
        );
    }

    #[test]
    fn error_messages_are_localised() {
        let duplicate =
            BookingError::DuplicateBooking(ResourceId::new("A-1").expect("valid id"));
        assert_eq!(
            Locale::Es.error_message(&duplicate),
            "Ya existe una cita para esta solicitud (ID: A-1)"
        );
        assert!(Locale::En.error_message(&duplicate).contains("A-1"));

        let generic = BookingError::SubmissionError {
            status: 500,
            detail: None,
        };
        assert_eq!(Locale::Es.error_message(&generic), "Error al crear la cita");
        assert_eq!(
            Locale::En.error_message(&generic),
            "Failed to create the appointment"
        );

        let validation = BookingError::ValidationError(vec![
            FieldViolation::MissingDate,
            FieldViolation::MissingModality,
        ]);
        assert_eq!(
            Locale::Es.error_message(&validation),
            "Seleccione una fecha válida\nSeleccione una modalidad"
        );
    }
}
