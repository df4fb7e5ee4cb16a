//! # Aurelio Tenant Lifecycle
//!
//! > **The core that takes a shop from sign-up to live, and keeps it in step with billing.**
//!
//! Built on the in-repo [`actor_framework`]: every store is a `ResourceActor<T>` owning its
//! records in one task and processing requests one at a time, so single-record checks
//! and updates are atomic without locks.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Stores ([`tenant_actor`], [`domain_actor`], [`subscription_actor`], [`ledger_actor`], [`event_log_actor`])
//! `ActorEntity` implementations holding the business rules for each record type:
//! status transitions, unique keys (slug, domain name, event id, ledger idempotency key)
//! and the provisioning claim.
//!
//! ### 2. The Interface ([`clients`])
//! Typed wrappers over `ResourceClient` that translate framework failures into each
//! store's error enum.
//!
//! ### 3. The Orchestrators ([`provisioning`], [`verification`], [`billing`])
//! - **Provisioning**: ordered steps with a Halt/Continue policy each, resumable after
//!   any failure.
//! - **Verification**: custom-domain state machine, provider status with DNS fallback.
//! - **Billing**: signed webhook verification, typed event decoding, exactly-once effects.
//!
//! ### 4. The Edges ([`providers`])
//! Adapter traits for databases, deployments, DNS, messaging and notifications, with
//! HTTP adapters for the real services and sandbox fakes for local runs and tests.
//!
//! ### 5. Wiring ([`lifecycle`])
//! [`Platform`](lifecycle::Platform) spawns the actors, builds the orchestrators and
//! exposes the operations; configuration and tracing set-up live next to it.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Walkthrough against sandbox providers
//! RUST_LOG=info cargo run
//!
//! # Tests
//! cargo test --workspace
//! ```

pub mod billing;
pub mod clients;
pub mod domain_actor;
pub mod event_log_actor;
pub mod ledger_actor;
pub mod lifecycle;
pub mod model;
pub mod providers;
pub mod provisioning;
pub mod subscription_actor;
pub mod tenant_actor;
pub mod verification;
