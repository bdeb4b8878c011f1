//! # radbook Sandbox
//!
//! In-memory stand-in for the Clinical Records API.
//!
//! Handles:
//! - the four endpoints the booking workflow consumes, plus `/health`
//! - validation of posted appointments through the `fhir` crate
//! - duplicate protection (one holding appointment per service request)
//! - optional response latency, for exercising client timeouts
//!
//! Used by the `radbook-sandbox` binary and by end-to-end tests, which bind it to
//! `127.0.0.1:0` through [`serve`].

#![warn(rust_2018_idioms)]

mod routes;
mod store;

pub use routes::router;
pub use store::{BookOutcome, Store};

use fhir::{AppointmentData, ResourceId};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

pub const ENV_SANDBOX_ADDR: &str = "RADBOOK_SANDBOX_ADDR";
pub const ENV_SANDBOX_SEED: &str = "RADBOOK_SANDBOX_SEED";
pub const ENV_SANDBOX_LATENCY_MS: &str = "RADBOOK_SANDBOX_LATENCY_MS";
pub const DEFAULT_SANDBOX_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("failed to read seed file {path}: {source}")]
    SeedFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("seed file is not a JSON array: {0}")]
    SeedJson(#[from] serde_json::Error),
    #[error("invalid seed resource: {0}")]
    SeedResource(#[from] fhir::FhirError),
    #[error("invalid resource id: {0}")]
    InvalidId(#[from] radbook_types::TextError),
    #[error("invalid seed data: {0}")]
    Seed(String),
    #[error("{key}='{value}' is invalid")]
    InvalidSetting { key: &'static str, value: String },
}

pub type SandboxResult<T> = std::result::Result<T, SandboxError>;

/// Startup settings for the sandbox binary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SandboxConfig {
    pub addr: String,
    pub seed_path: Option<PathBuf>,
    pub latency: Duration,
}

impl SandboxConfig {
    pub fn from_env() -> SandboxResult<Self> {
        let get = |key: &str| {
            std::env::var(key)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let latency = match get(ENV_SANDBOX_LATENCY_MS) {
            Some(raw) => raw
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| SandboxError::InvalidSetting {
                    key: ENV_SANDBOX_LATENCY_MS,
                    value: raw,
                })?,
            None => Duration::ZERO,
        };

        Ok(Self {
            addr: get(ENV_SANDBOX_ADDR).unwrap_or_else(|| DEFAULT_SANDBOX_ADDR.into()),
            seed_path: get(ENV_SANDBOX_SEED).map(PathBuf::from),
            latency,
        })
    }
}

/// Shared handler state. Cloning shares the same store.
#[derive(Clone, Debug)]
pub struct SandboxState {
    store: Arc<RwLock<Store>>,
    latency: Duration,
}

impl SandboxState {
    pub fn new(store: Store) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            latency: Duration::ZERO,
        }
    }

    /// Delay every response by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub async fn appointment_for(&self, request_id: &str) -> Option<AppointmentData> {
        self.store.read().await.appointment_for(request_id).cloned()
    }

    pub async fn appointment_count(&self) -> usize {
        self.store.read().await.appointment_count()
    }

    /// Store `appointment` under a fresh UUID, subject to [`Store::book`] checks.
    pub async fn book(&self, appointment: AppointmentData) -> SandboxResult<BookOutcome> {
        let id = ResourceId::new(uuid::Uuid::new_v4().to_string())?;
        Ok(self.store.write().await.book(appointment, id))
    }

    pub(crate) fn store(&self) -> &RwLock<Store> {
        &self.store
    }
}

/// Serve the sandbox API on an already bound listener until the task is dropped.
pub async fn serve(listener: tokio::net::TcpListener, state: SandboxState) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}
