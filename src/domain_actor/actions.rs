use chrono::{DateTime, Utc};

/// Actions on a custom domain. Each one answers with the domain as stored afterwards.
#[derive(Debug, Clone)]
pub enum DomainAction {
    /// The DNS provider accepted the domain: `pending -> pending_verification`.
    RecordRegistration { handle: String },
    /// Result of one verification check, applied to both flags at once.
    ///
    /// Never moves a domain backwards; `tls_enabled` is ignored unless `verified`.
    ApplyCheck {
        verified: bool,
        tls_enabled: bool,
        checked_at: DateTime<Utc>,
    },
}
