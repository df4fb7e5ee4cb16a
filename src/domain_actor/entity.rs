use super::actions::DomainAction;
use super::error::DomainError;
use crate::model::{Domain, DomainCreate, DomainId, DomainStatus};
use actor_framework::ActorEntity;
use async_trait::async_trait;

/// Domains have nothing a caller may edit directly.
#[derive(Debug, Clone)]
pub enum DomainUpdate {}

#[async_trait]
impl ActorEntity for Domain {
    type Id = DomainId;
    type Create = DomainCreate;
    type Update = DomainUpdate;
    type Action = DomainAction;
    type ActionResult = Domain;
    type Context = ();
    type Error = DomainError;

    fn from_create_params(id: DomainId, params: DomainCreate) -> Result<Self, Self::Error> {
        if params.name.is_empty() {
            return Err(DomainError::Invalid("domain name must not be empty".into()));
        }
        Ok(Domain {
            id,
            tenant_id: params.tenant_id,
            name: params.name,
            status: DomainStatus::Pending,
            registration: None,
            last_checked_at: None,
            created_at: params.created_at,
        })
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.name.clone())
    }

    async fn on_update(&mut self, update: DomainUpdate, _ctx: &()) -> Result<(), DomainError> {
        match update {}
    }

    async fn handle_action(
        &mut self,
        action: DomainAction,
        _ctx: &(),
    ) -> Result<Domain, DomainError> {
        match action {
            DomainAction::RecordRegistration { handle } => {
                self.registration = Some(handle);
                if self.status == DomainStatus::Pending {
                    self.status = DomainStatus::PendingVerification;
                }
            }
            DomainAction::ApplyCheck {
                verified,
                tls_enabled,
                checked_at,
            } => {
                let observed = match (verified, tls_enabled) {
                    (true, true) => Some(DomainStatus::SslEnabled),
                    (true, false) => Some(DomainStatus::Verified),
                    (false, _) => None,
                };
                if let Some(observed) = observed {
                    self.status = self.status.max(observed);
                }
                self.last_checked_at = Some(checked_at);
            }
        }
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TenantId;
    use chrono::Utc;

    fn domain() -> Domain {
        Domain::from_create_params(
            DomainId(1),
            DomainCreate {
                tenant_id: TenantId(1),
                name: "example.com".into(),
                created_at: Utc::now(),
            },
        )
        .unwrap()
    }

    async fn check(d: &mut Domain, verified: bool, tls: bool) -> Domain {
        d.handle_action(
            DomainAction::ApplyCheck {
                verified,
                tls_enabled: tls,
                checked_at: Utc::now(),
            },
            &(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn registration_moves_to_pending_verification() {
        let mut d = domain();
        let d2 = d
            .handle_action(
                DomainAction::RecordRegistration {
                    handle: "dom_1".into(),
                },
                &(),
            )
            .await
            .unwrap();
        assert_eq!(d2.status, DomainStatus::PendingVerification);
        assert_eq!(d2.registration.as_deref(), Some("dom_1"));
    }

    #[tokio::test]
    async fn tls_without_verification_is_ignored() {
        let mut d = domain();
        let after = check(&mut d, false, true).await;
        assert!(!after.verified());
        assert!(!after.ssl_enabled());
        assert!(after.last_checked_at.is_some());
    }

    #[tokio::test]
    async fn flags_flip_together_and_never_regress() {
        let mut d = domain();
        let after = check(&mut d, true, true).await;
        assert!(after.verified() && after.ssl_enabled());

        let later = check(&mut d, false, false).await;
        assert_eq!(later.status, DomainStatus::SslEnabled);
    }
}
