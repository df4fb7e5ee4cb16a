//! # Lifecycle
//!
//! Start-up and shutdown of the platform: configuration, tracing, the
//! [`Platform`] that spawns and wires every actor, and the verification scheduler.

pub mod config;
mod platform;
pub mod scheduler;
pub mod tracing;

pub use config::{ConfigBuilder, ConfigError, PlatformConfig};
pub use platform::{Platform, PlatformError};
pub use self::tracing::setup_tracing;
