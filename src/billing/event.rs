//! Decoding of billing webhook payloads into typed events.

use super::error::WebhookError;
use crate::model::TenantId;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Subscription object carried by `customer.subscription.*` events.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubscriptionPayload {
    pub id: String,
    pub status: String,
    /// Unix seconds.
    #[serde(default)]
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Invoice object carried by `invoice.*` events. Amounts are in cents.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InvoicePayload {
    pub id: String,
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub amount_due: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub period_start: Option<i64>,
    #[serde(default)]
    pub period_end: Option<i64>,
    #[serde(default)]
    pub attempt_count: u32,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

fn default_currency() -> String {
    "usd".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingEventKind {
    SubscriptionCreated(SubscriptionPayload),
    SubscriptionUpdated(SubscriptionPayload),
    SubscriptionDeleted(SubscriptionPayload),
    InvoicePaid(InvoicePayload),
    InvoicePaymentFailed(InvoicePayload),
    /// Any event type the reconciler does not act on.
    Unknown(String),
}

impl BillingEventKind {
    pub fn event_type(&self) -> &str {
        match self {
            BillingEventKind::SubscriptionCreated(_) => "customer.subscription.created",
            BillingEventKind::SubscriptionUpdated(_) => "customer.subscription.updated",
            BillingEventKind::SubscriptionDeleted(_) => "customer.subscription.deleted",
            BillingEventKind::InvoicePaid(_) => "invoice.paid",
            BillingEventKind::InvoicePaymentFailed(_) => "invoice.payment_failed",
            BillingEventKind::Unknown(event_type) => event_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingEvent {
    /// Provider event id, the idempotency key.
    pub id: String,
    pub created: DateTime<Utc>,
    pub kind: BillingEventKind,
}

#[derive(Deserialize)]
struct Envelope {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    created: i64,
    data: EnvelopeData,
}

#[derive(Deserialize)]
struct EnvelopeData {
    object: Value,
}

fn object<T: DeserializeOwned>(event_type: &str, value: Value) -> Result<T, WebhookError> {
    serde_json::from_value(value)
        .map_err(|e| WebhookError::Malformed(format!("{event_type}: {e}")))
}

impl BillingEvent {
    pub fn decode(payload: &[u8]) -> Result<Self, WebhookError> {
        let envelope: Envelope =
            serde_json::from_slice(payload).map_err(|e| WebhookError::Malformed(e.to_string()))?;
        let created = DateTime::from_timestamp(envelope.created, 0)
            .ok_or_else(|| WebhookError::Malformed("created is out of range".into()))?;

        let event_type = envelope.event_type.as_str();
        let object_value = envelope.data.object;
        let kind = match event_type {
            "customer.subscription.created" => {
                BillingEventKind::SubscriptionCreated(object(event_type, object_value)?)
            }
            "customer.subscription.updated" => {
                BillingEventKind::SubscriptionUpdated(object(event_type, object_value)?)
            }
            "customer.subscription.deleted" => {
                BillingEventKind::SubscriptionDeleted(object(event_type, object_value)?)
            }
            "invoice.paid" => BillingEventKind::InvoicePaid(object(event_type, object_value)?),
            "invoice.payment_failed" => {
                BillingEventKind::InvoicePaymentFailed(object(event_type, object_value)?)
            }
            other => BillingEventKind::Unknown(other.to_string()),
        };

        Ok(BillingEvent {
            id: envelope.id,
            created,
            kind,
        })
    }
}

/// Reads the `tenant_id` metadata entry; accepts `tenant_7` and `7`.
pub fn tenant_from_metadata(metadata: &HashMap<String, String>) -> Option<TenantId> {
    let raw = metadata.get("tenant_id")?.trim();
    raw.strip_prefix("tenant_")
        .unwrap_or(raw)
        .parse::<u32>()
        .ok()
        .map(TenantId)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encode(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn decodes_invoice_paid() {
        let payload = encode(json!({
            "id": "evt_1",
            "type": "invoice.paid",
            "created": 1_700_000_000,
            "data": { "object": {
                "id": "in_1",
                "subscription": "sub_1",
                "amount_paid": 2900,
                "currency": "usd",
                "period_start": 1_700_000_000,
                "period_end": 1_702_592_000
            }}
        }));
        let event = BillingEvent::decode(&payload).unwrap();
        assert_eq!(event.id, "evt_1");
        match event.kind {
            BillingEventKind::InvoicePaid(invoice) => {
                assert_eq!(invoice.amount_paid, 2900);
                assert_eq!(invoice.subscription.as_deref(), Some("sub_1"));
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn unknown_type_is_kept() {
        let payload = encode(json!({
            "id": "evt_2",
            "type": "charge.refunded",
            "created": 1_700_000_000,
            "data": { "object": {} }
        }));
        let event = BillingEvent::decode(&payload).unwrap();
        assert_eq!(event.kind, BillingEventKind::Unknown("charge.refunded".into()));
        assert_eq!(event.kind.event_type(), "charge.refunded");
    }

    #[test]
    fn malformed_payloads_are_rejected() {
        assert!(matches!(
            BillingEvent::decode(b"not json"),
            Err(WebhookError::Malformed(_))
        ));
        let missing_status = encode(json!({
            "id": "evt_3",
            "type": "customer.subscription.updated",
            "created": 1_700_000_000,
            "data": { "object": { "id": "sub_1" } }
        }));
        assert!(matches!(
            BillingEvent::decode(&missing_status),
            Err(WebhookError::Malformed(_))
        ));
    }

    #[test]
    fn tenant_metadata_forms() {
        let mut metadata = HashMap::new();
        metadata.insert("tenant_id".to_string(), "tenant_4".to_string());
        assert_eq!(tenant_from_metadata(&metadata), Some(TenantId(4)));
        metadata.insert("tenant_id".to_string(), "4".to_string());
        assert_eq!(tenant_from_metadata(&metadata), Some(TenantId(4)));
        metadata.insert("tenant_id".to_string(), "acme".to_string());
        assert_eq!(tenant_from_metadata(&metadata), None);
    }
}
