use chrono::{NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use radbook_core::{
    AppointmentForm, BookingConfig, BookingController, HttpClinicalRecordsApi, Locale,
    NoticeKind, NotificationSurface,
};
use std::io::Write;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "radbook")]
#[command(about = "Radiology appointment booking CLI")]
struct Cli {
    /// Label language, overriding RADBOOK_LOCALE (es or en)
    #[arg(long, global = true)]
    locale: Option<Locale>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify that a service request can be booked
    Verify {
        /// Service request id (or identifier value)
        request_id: String,
    },
    /// Verify a service request and book an appointment for it
    Book {
        /// Service request id (or identifier value)
        request_id: String,
        /// Modality code: RX, CT, MRI, US, MG or NM
        #[arg(long, default_value = "")]
        modality: String,
        /// Appointment date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Free-text notes for the appointment
        #[arg(long, default_value = "")]
        notes: String,
        /// Explicit start time (HH:MM, UTC); requires --end
        #[arg(long, value_parser = parse_hhmm)]
        start: Option<NaiveTime>,
        /// Explicit end time (HH:MM, UTC); requires --start
        #[arg(long, value_parser = parse_hhmm)]
        end: Option<NaiveTime>,
    },
}

fn parse_hhmm(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|e| format!("expected HH:MM: {e}"))
}

/// Prints notices to a terminal stream.
struct ConsoleNotifier<W> {
    out: W,
    write_failed: bool,
}

impl<W: Write> ConsoleNotifier<W> {
    fn new(out: W) -> Self {
        Self {
            out,
            write_failed: false,
        }
    }

    /// Whether any notice could not be written.
    fn write_failed(&self) -> bool {
        self.write_failed
    }

    fn write_notice(&mut self, marker: &str, title: &str, message: &str) -> std::io::Result<()> {
        writeln!(self.out, "{marker} {title}")?;
        for line in message.lines() {
            writeln!(self.out, "  {line}")?;
        }
        self.out.flush()
    }
}

impl<W: Write> NotificationSurface for ConsoleNotifier<W> {
    fn present(&mut self, title: &str, message: &str, kind: NoticeKind) {
        let marker = match kind {
            NoticeKind::Success => "✓",
            NoticeKind::Warning => "!",
            NoticeKind::Error => "✗",
        };
        if let Err(e) = self.write_notice(marker, title, message) {
            tracing::error!(error = %e, title, "failed to print notice");
            self.write_failed = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("radbook_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'radbook --help' for commands");
        return Ok(ExitCode::SUCCESS);
    };

    let mut cfg = BookingConfig::from_env()?;
    if let Some(locale) = cli.locale {
        cfg = cfg.with_locale(locale);
    }
    tracing::debug!(api = %cfg.api_base_url(), "resolved configuration");

    let api = HttpClinicalRecordsApi::new(&cfg)?;
    let notifier = ConsoleNotifier::new(std::io::stdout());
    let mut controller = BookingController::new(api, notifier, cfg);

    let outcome = match command {
        Commands::Verify { request_id } => controller.verify(&request_id).await.map(|_| ()),
        Commands::Book {
            request_id,
            modality,
            date,
            notes,
            start,
            end,
        } => {
            let form = AppointmentForm {
                date: Some(date.unwrap_or_else(|| Utc::now().date_naive())),
                modality,
                notes,
                start_time: start,
                end_time: end,
            };
            match controller.verify(&request_id).await {
                Ok(_) => controller.submit(form).await.map(|_| ()),
                Err(e) => Err(e),
            }
        }
    };

    // The notifier has already reported any failure.
    if let Err(e) = &outcome {
        tracing::debug!(error = %e, "command failed");
    }
    Ok(if outcome.is_ok() && !controller.surface().write_failed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hhmm() {
        assert_eq!(
            parse_hhmm(" 09:30 ").expect("valid time"),
            NaiveTime::from_hms_opt(9, 30, 0).expect("valid time")
        );
        assert!(parse_hhmm("9.30").is_err());
    }

    #[test]
    fn test_console_notifier_indents_message_lines() {
        let mut notifier = ConsoleNotifier::new(Vec::new());
        notifier.present("Solicitud verificada", "ID: SR-100\nPaciente: Ana", NoticeKind::Success);

        assert!(!notifier.write_failed());
        let printed = String::from_utf8(notifier.out).expect("utf-8 output");
        assert_eq!(printed, "✓ Solicitud verificada\n  ID: SR-100\n  Paciente: Ana\n");
    }

    struct ClosedStream;

    impl Write for ClosedStream {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stream closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_console_notifier_records_write_failure() {
        let mut notifier = ConsoleNotifier::new(ClosedStream);
        notifier.present("Error", "Solicitud no encontrada", NoticeKind::Error);

        assert!(notifier.write_failed());
    }

    #[test]
    fn test_book_command_parses() {
        let cli = Cli::try_parse_from([
            "radbook", "book", "SR-100", "--modality", "CT", "--date", "2026-10-20", "--start",
            "10:00", "--end", "10:30", "--locale", "en",
        ])
        .expect("arguments parse");

        assert_eq!(cli.locale, Some(Locale::En));
        match cli.command {
            Some(Commands::Book {
                request_id,
                modality,
                date,
                start,
                ..
            }) => {
                assert_eq!(request_id, "SR-100");
                assert_eq!(modality, "CT");
                assert_eq!(date, NaiveDate::from_ymd_opt(2026, 10, 20));
                assert_eq!(start, NaiveTime::from_hms_opt(10, 0, 0));
            }
            _ => panic!("expected book command"),
        }
    }
}
