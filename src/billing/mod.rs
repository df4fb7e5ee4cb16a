//! # Billing Event Reconciler
//!
//! Inbound billing webhooks go through three stages:
//!
//! 1. [`verify_signature`] on the raw bytes, before anything is parsed.
//! 2. [`BillingEvent::decode`] into a [`BillingEventKind`], with an explicit
//!    `Unknown` arm for event types we do not act on.
//! 3. [`BillingReconciler::apply`], which claims the event id in the event log,
//!    applies the effect, and marks the event applied. A failed effect releases the
//!    claim so the provider's redelivery retries it.

mod error;
pub mod event;
mod reconciler;
pub mod signature;

pub use error::{ReconcileError, WebhookError};
pub use event::{BillingEvent, BillingEventKind, InvoicePayload, SubscriptionPayload};
pub use reconciler::{BillingReconciler, Outcome};
pub use signature::{signature_header, verify_signature};
