//! Standalone sandbox Clinical Records API.
//!
//! ## Purpose
//! Serves the endpoints the booking workflow consumes from an in-memory store seeded with
//! demo service requests, so the `radbook` CLI can be exercised without a hospital backend.
//!
//! ## Environment Variables
//! - `RADBOOK_SANDBOX_ADDR`: listen address (default: "0.0.0.0:3000")
//! - `RADBOOK_SANDBOX_SEED`: optional JSON file with an array of ServiceRequest resources,
//!   added on top of the demo data (same id replaces)
//! - `RADBOOK_SANDBOX_LATENCY_MS`: delay added to every response (default: 0)

use radbook_sandbox::{serve, SandboxConfig, SandboxState, Store};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("radbook_sandbox=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = SandboxConfig::from_env()?;

    let mut store = Store::demo()?;
    if let Some(path) = &cfg.seed_path {
        let seeded = Store::load_seed_file(path)?;
        tracing::info!("-- Loaded {} service requests from {}", seeded.len(), path.display());
        for request in seeded {
            store.insert_service_request(request);
        }
    }

    let state = SandboxState::new(store).with_latency(cfg.latency);

    tracing::info!("-- Starting radbook sandbox API on {}", cfg.addr);
    if !cfg.latency.is_zero() {
        tracing::info!("-- Injecting {} ms latency", cfg.latency.as_millis());
    }

    let listener = tokio::net::TcpListener::bind(&cfg.addr).await?;
    serve(listener, state).await?;

    Ok(())
}
