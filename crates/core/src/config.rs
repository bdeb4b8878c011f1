//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the controller
//! and the HTTP client. Nothing in the booking workflow reads environment variables while
//! an operation is running.

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_IDENTIFIER_SYSTEM, DEFAULT_PRACTITIONER_REFERENCE,
    DEFAULT_READ_TIMEOUT_MS, DEFAULT_SLOT_MINUTES, DEFAULT_SLOT_START_MINUTES,
    DEFAULT_WRITE_TIMEOUT_MS, ENV_API_BASE_URL, ENV_DUPLICATE_CHECK, ENV_IDENTIFIER_SYSTEM,
    ENV_LOCALE, ENV_PRACTITIONER_REFERENCE, ENV_READ_TIMEOUT_MS, ENV_SLOT_MINUTES,
    ENV_SLOT_START, ENV_WRITE_TIMEOUT_MS, MAX_SLOT_MINUTES,
};
use crate::error::ConfigError;
use crate::labels::Locale;
use chrono::{NaiveTime, TimeDelta};
use radbook_types::NonEmptyText;
use reqwest::Url;
use std::time::Duration;

/// What verification does when the duplicate-appointment lookup itself fails.
///
/// The submit-time re-check is always fail-closed regardless of this setting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicateCheckPolicy {
    /// Log and warn, then continue as if no duplicate exists.
    #[default]
    FailOpen,
    /// Fail verification with the transport error.
    FailClosed,
}

impl std::str::FromStr for DuplicateCheckPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-open" | "open" => Ok(DuplicateCheckPolicy::FailOpen),
            "fail-closed" | "closed" => Ok(DuplicateCheckPolicy::FailClosed),
            _ => Err("expected 'fail-open' or 'fail-closed'".into()),
        }
    }
}

/// Default appointment slot used when the form carries no explicit times.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotPolicy {
    start: NaiveTime,
    length: TimeDelta,
}

impl SlotPolicy {
    pub fn new(start: NaiveTime, minutes: u32) -> Result<Self, ConfigError> {
        if minutes == 0 || minutes > MAX_SLOT_MINUTES {
            return Err(ConfigError::invalid(
                ENV_SLOT_MINUTES,
                &minutes.to_string(),
                format!("must be between 1 and {MAX_SLOT_MINUTES}"),
            ));
        }
        Ok(Self {
            start,
            length: TimeDelta::minutes(i64::from(minutes)),
        })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn length(&self) -> TimeDelta {
        self.length
    }
}

impl Default for SlotPolicy {
    fn default() -> Self {
        Self {
            start: NaiveTime::default()
                + TimeDelta::minutes(i64::from(DEFAULT_SLOT_START_MINUTES)),
            length: TimeDelta::minutes(i64::from(DEFAULT_SLOT_MINUTES)),
        }
    }
}

/// Booking configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct BookingConfig {
    api_base_url: Url,
    identifier_system: NonEmptyText,
    read_timeout: Duration,
    write_timeout: Duration,
    locale: Locale,
    duplicate_check: DuplicateCheckPolicy,
    slot: SlotPolicy,
    practitioner_reference: NonEmptyText,
}

impl BookingConfig {
    /// Create a `BookingConfig` for `api_base_url` with every other setting at its default.
    pub fn new(api_base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url(api_base_url)?,
            identifier_system: non_empty(ENV_IDENTIFIER_SYSTEM, DEFAULT_IDENTIFIER_SYSTEM)?,
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
            write_timeout: Duration::from_millis(DEFAULT_WRITE_TIMEOUT_MS),
            locale: Locale::default(),
            duplicate_check: DuplicateCheckPolicy::default(),
            slot: SlotPolicy::default(),
            practitioner_reference: non_empty(
                ENV_PRACTITIONER_REFERENCE,
                DEFAULT_PRACTITIONER_REFERENCE,
            )?,
        })
    }

    /// Resolve configuration from a key lookup (normally the process environment).
    ///
    /// Missing or blank values fall back to defaults; present values must parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let base_url = get(ENV_API_BASE_URL).unwrap_or_else(|| DEFAULT_API_BASE_URL.into());
        let mut cfg = Self::new(&base_url)?;

        if let Some(system) = get(ENV_IDENTIFIER_SYSTEM) {
            cfg.identifier_system = non_empty(ENV_IDENTIFIER_SYSTEM, &system)?;
        }
        if let Some(ms) = get(ENV_READ_TIMEOUT_MS) {
            cfg.read_timeout = parse_timeout(ENV_READ_TIMEOUT_MS, &ms)?;
        }
        if let Some(ms) = get(ENV_WRITE_TIMEOUT_MS) {
            cfg.write_timeout = parse_timeout(ENV_WRITE_TIMEOUT_MS, &ms)?;
        }
        if let Some(locale) = get(ENV_LOCALE) {
            cfg.locale = locale
                .parse()
                .map_err(|reason: String| ConfigError::invalid(ENV_LOCALE, &locale, reason))?;
        }
        if let Some(policy) = get(ENV_DUPLICATE_CHECK) {
            cfg.duplicate_check = policy.parse().map_err(|reason: String| {
                ConfigError::invalid(ENV_DUPLICATE_CHECK, &policy, reason)
            })?;
        }

        let slot_start = match get(ENV_SLOT_START) {
            Some(raw) => NaiveTime::parse_from_str(&raw, "%H:%M")
                .map_err(|e| ConfigError::invalid(ENV_SLOT_START, &raw, e.to_string()))?,
            None => cfg.slot.start(),
        };
        let slot_minutes = match get(ENV_SLOT_MINUTES) {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|e| ConfigError::invalid(ENV_SLOT_MINUTES, &raw, e.to_string()))?,
            None => DEFAULT_SLOT_MINUTES,
        };
        cfg.slot = SlotPolicy::new(slot_start, slot_minutes)?;

        if let Some(reference) = get(ENV_PRACTITIONER_REFERENCE) {
            if !reference.contains('/') {
                return Err(ConfigError::invalid(
                    ENV_PRACTITIONER_REFERENCE,
                    &reference,
                    "expected a 'Practitioner/<id>' reference",
                ));
            }
            cfg.practitioner_reference = non_empty(ENV_PRACTITIONER_REFERENCE, &reference)?;
        }

        Ok(cfg)
    }

    /// Resolve configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn with_timeouts(mut self, read: Duration, write: Duration) -> Self {
        self.read_timeout = read;
        self.write_timeout = write;
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_duplicate_check(mut self, policy: DuplicateCheckPolicy) -> Self {
        self.duplicate_check = policy;
        self
    }

    pub fn api_base_url(&self) -> &Url {
        &self.api_base_url
    }

    pub fn identifier_system(&self) -> &str {
        self.identifier_system.as_str()
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn duplicate_check(&self) -> DuplicateCheckPolicy {
        self.duplicate_check
    }

    pub fn slot(&self) -> SlotPolicy {
        self.slot
    }

    pub fn practitioner_reference(&self) -> &str {
        self.practitioner_reference.as_str()
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::invalid(ENV_API_BASE_URL, raw, e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(
            ENV_API_BASE_URL,
            raw,
            "scheme must be http or https",
        ));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::invalid(
            ENV_API_BASE_URL,
            raw,
            "must not carry a query or fragment",
        ));
    }

    Ok(url)
}

fn parse_timeout(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    match raw.parse::<u64>() {
        Ok(0) => Err(ConfigError::invalid(key, raw, "must be greater than zero")),
        Ok(ms) => Ok(Duration::from_millis(ms)),
        Err(e) => Err(ConfigError::invalid(key, raw, e.to_string())),
    }
}

fn non_empty(key: &'static str, raw: &str) -> Result<NonEmptyText, ConfigError> {
    NonEmptyText::new(raw).map_err(|e| ConfigError::invalid(key, raw, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let cfg = BookingConfig::from_lookup(|_| None).expect("defaults should resolve");

        assert_eq!(cfg.api_base_url().as_str(), "http://127.0.0.1:3000/");
        assert_eq!(cfg.identifier_system(), DEFAULT_IDENTIFIER_SYSTEM);
        assert_eq!(cfg.read_timeout(), Duration::from_millis(5_000));
        assert_eq!(cfg.write_timeout(), Duration::from_millis(10_000));
        assert_eq!(cfg.locale(), Locale::Es);
        assert_eq!(cfg.duplicate_check(), DuplicateCheckPolicy::FailOpen);
        assert_eq!(cfg.slot(), SlotPolicy::default());
        assert_eq!(cfg.practitioner_reference(), "Practitioner/radiologo");
    }

    #[test]
    fn test_default_slot_starts_at_nine() {
        let slot = SlotPolicy::default();
        assert_eq!(slot.start(), NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"));
        assert_eq!(slot.length(), TimeDelta::minutes(30));

        let cfg = BookingConfig::from_lookup(lookup_from(&[(ENV_SLOT_MINUTES, "20")]))
            .expect("slot length override");
        assert_eq!(cfg.slot().start(), slot.start());
        assert_eq!(cfg.slot().length(), TimeDelta::minutes(20));
    }

    #[test]
    fn test_overrides_are_applied() {
        let cfg = BookingConfig::from_lookup(lookup_from(&[
            (ENV_API_BASE_URL, "https://records.example.org/api"),
            (ENV_READ_TIMEOUT_MS, "2500"),
            (ENV_LOCALE, "en"),
            (ENV_DUPLICATE_CHECK, "fail-closed"),
            (ENV_SLOT_START, "14:15"),
            (ENV_SLOT_MINUTES, "45"),
        ]))
        .expect("overrides should resolve");

        assert_eq!(cfg.api_base_url().path(), "/api");
        assert_eq!(cfg.read_timeout(), Duration::from_millis(2_500));
        assert_eq!(cfg.write_timeout(), Duration::from_millis(10_000));
        assert_eq!(cfg.locale(), Locale::En);
        assert_eq!(cfg.duplicate_check(), DuplicateCheckPolicy::FailClosed);
        assert_eq!(
            cfg.slot().start(),
            NaiveTime::from_hms_opt(14, 15, 0).expect("valid time")
        );
        assert_eq!(cfg.slot().length(), TimeDelta::minutes(45));
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let cfg = BookingConfig::from_lookup(lookup_from(&[(ENV_READ_TIMEOUT_MS, "  ")]))
            .expect("blank value should be ignored");
        assert_eq!(cfg.read_timeout(), Duration::from_millis(DEFAULT_READ_TIMEOUT_MS));
    }

    #[test]
    fn test_rejects_invalid_values() {
        let cases: &[(&str, &str)] = &[
            (ENV_API_BASE_URL, "ftp://records.example.org"),
            (ENV_API_BASE_URL, "not a url"),
            (ENV_API_BASE_URL, "http://records.example.org/?x=1"),
            (ENV_READ_TIMEOUT_MS, "0"),
            (ENV_WRITE_TIMEOUT_MS, "soon"),
            (ENV_LOCALE, "fr"),
            (ENV_DUPLICATE_CHECK, "sometimes"),
            (ENV_SLOT_START, "9am"),
            (ENV_SLOT_MINUTES, "0"),
            (ENV_PRACTITIONER_REFERENCE, "radiologo"),
        ];

        for &(key, value) in cases {
            let result = BookingConfig::from_lookup(lookup_from(&[(key, value)]));
            match result {
                Err(ConfigError::InvalidValue { key: got, .. }) => assert_eq!(got, key),
                Ok(_) => panic!("{key}={value} should be rejected"),
            }
        }
    }
}
