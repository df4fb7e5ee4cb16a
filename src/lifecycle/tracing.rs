//! # Observability & Tracing
//!
//! [`setup_tracing`] installs the global subscriber. The filter comes from `RUST_LOG` when
//! set, otherwise from [`LoggingConfig::level`].
//!
//! The default output is the compact format without module paths (`with_target(false)`);
//! actors tag their lines with `entity_type` instead. Set `logging.json` (or
//! `AURELIO_LOG_JSON=true`) for one JSON object per line.
//!
//! ```bash
//! # Step-by-step provisioning progress
//! RUST_LOG=info cargo run
//!
//! # Full payloads at workflow entry points, plus every actor request
//! RUST_LOG=debug cargo run
//!
//! # Only the billing reconciler
//! RUST_LOG=aurelio_lifecycle::billing=debug cargo run
//! ```
//!
//! A provisioning run at `info` reads:
//!
//! ```text
//! INFO provision{tenant_id=tenant_1}: Provisioning claimed run_id=..
//! INFO provision{tenant_id=tenant_1}: Step completed step=allocate_database
//! INFO provision{tenant_id=tenant_1}: Step completed step=deploy_backend
//! WARN provision{tenant_id=tenant_1}: Non-critical step failed, continuing step=enable_sms ..
//! INFO provision{tenant_id=tenant_1}: Step completed step=register_subscription
//! INFO provision{tenant_id=tenant_1}: Tenant active
//! ```
//!
//! Calling it more than once is harmless; later calls leave the first subscriber in place.

use super::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

pub fn setup_tracing(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let result = if config.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .try_init()
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
