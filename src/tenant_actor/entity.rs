//! [`ActorEntity`] implementation for [`Tenant`].
//!
//! The slug is the store-wide unique key, so a duplicate `CreateTenant` is refused by
//! the actor before anything is written.

use super::actions::TenantAction;
use super::error::TenantError;
use crate::model::{Tenant, TenantCreate, TenantId, TenantStatus, TenantUpdate};
use actor_framework::ActorEntity;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

impl Tenant {
    fn transition(&mut self, next: TenantStatus) -> Result<(), TenantError> {
        if !self.status.can_transition_to(next) {
            return Err(TenantError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Only the run holding the claim may write provisioning progress.
    fn fence(&self, run_id: Uuid) -> Result<(), TenantError> {
        if self.status != TenantStatus::Provisioning {
            return Err(TenantError::NotProvisioning(self.status));
        }
        match &self.provisioning.claim {
            Some(claim) if claim.run_id == run_id => Ok(()),
            _ => Err(TenantError::ClaimLost(run_id)),
        }
    }
}

#[async_trait]
impl ActorEntity for Tenant {
    type Id = TenantId;
    type Create = TenantCreate;
    type Update = TenantUpdate;
    type Action = TenantAction;
    type ActionResult = Tenant;
    type Context = ();
    type Error = TenantError;

    fn from_create_params(id: TenantId, params: TenantCreate) -> Result<Self, Self::Error> {
        let name = params.name.trim();
        if name.is_empty() {
            return Err(TenantError::Invalid("name must not be empty".into()));
        }
        if params.slug.is_empty() {
            return Err(TenantError::Invalid(
                "name must contain at least one letter or digit".into(),
            ));
        }
        if params.owner_id.trim().is_empty() {
            return Err(TenantError::Invalid("owner id must not be empty".into()));
        }

        Ok(Tenant {
            id,
            name: name.to_string(),
            slug: params.slug,
            subdomain: params.subdomain,
            owner_id: params.owner_id,
            status: TenantStatus::Provisioning,
            database: None,
            backend: None,
            integrations: BTreeMap::new(),
            settings: Default::default(),
            provisioning: Default::default(),
            created_at: params.created_at,
        })
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.slug.clone())
    }

    async fn on_update(&mut self, update: TenantUpdate, _ctx: &()) -> Result<(), TenantError> {
        if self.status == TenantStatus::Deleted {
            return Err(TenantError::TenantDeleted);
        }
        if let Some(name) = update.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(TenantError::Invalid("name must not be empty".into()));
            }
            self.name = name.to_string();
        }
        if let Some(patch) = update.settings {
            for (key, value) in patch {
                if value == Value::Null {
                    self.settings.remove(&key);
                } else {
                    self.settings.insert(key, value);
                }
            }
        }
        Ok(())
    }

    async fn on_delete(&self, _ctx: &()) -> Result<(), TenantError> {
        Err(TenantError::HardDeleteRefused)
    }

    async fn handle_action(
        &mut self,
        action: TenantAction,
        _ctx: &(),
    ) -> Result<Tenant, TenantError> {
        match action {
            TenantAction::ClaimProvisioning { run_id, now, lease } => {
                if self.status != TenantStatus::Provisioning {
                    return Err(TenantError::NotProvisioning(self.status));
                }
                if let Some(claim) = &self.provisioning.claim {
                    if claim.is_live(now) && claim.run_id != run_id {
                        return Err(TenantError::ProvisioningInProgress(claim.run_id));
                    }
                }
                self.provisioning.claim = Some(crate::model::ProvisioningClaim {
                    run_id,
                    expires_at: now + lease,
                });
            }
            TenantAction::ReleaseProvisioning { run_id } => {
                if matches!(&self.provisioning.claim, Some(c) if c.run_id == run_id) {
                    self.provisioning.claim = None;
                }
            }
            TenantAction::RecordDatabase { run_id, handle } => {
                self.fence(run_id)?;
                if self.database.is_some() {
                    return Err(TenantError::AlreadyRecorded("database"));
                }
                self.database = Some(handle);
            }
            TenantAction::RecordBackend { run_id, endpoints } => {
                self.fence(run_id)?;
                if self.backend.is_some() {
                    return Err(TenantError::AlreadyRecorded("backend"));
                }
                self.backend = Some(endpoints);
            }
            TenantAction::RecordIntegration {
                run_id,
                name,
                handle,
            } => {
                self.fence(run_id)?;
                self.integrations.insert(name, handle);
            }
            TenantAction::RecordFailure { run_id, failure } => {
                self.fence(run_id)?;
                self.provisioning.failure = Some(failure);
                self.provisioning.claim = None;
            }
            TenantAction::CompleteProvisioning {
                run_id,
                now,
                suspend,
            } => {
                self.fence(run_id)?;
                if !self.has_all_resources() {
                    return Err(TenantError::MissingResources);
                }
                self.transition(TenantStatus::Active)?;
                if suspend {
                    self.transition(TenantStatus::Suspended)?;
                }
                self.provisioning.claim = None;
                self.provisioning.failure = None;
                self.provisioning.completed_at = Some(now);
            }
            TenantAction::ClearResources { run_id } => {
                match (self.status, run_id) {
                    (TenantStatus::Deleted, _) => {}
                    (TenantStatus::Provisioning, Some(run_id)) => self.fence(run_id)?,
                    (status, _) => return Err(TenantError::ResourcesInUse(status)),
                }
                self.database = None;
                self.backend = None;
                self.integrations.clear();
            }
            TenantAction::Suspend => {
                if self.status == TenantStatus::Active {
                    self.transition(TenantStatus::Suspended)?;
                }
            }
            TenantAction::Reactivate => {
                if self.status == TenantStatus::Suspended {
                    self.transition(TenantStatus::Active)?;
                }
            }
            TenantAction::SoftDelete => {
                if self.status != TenantStatus::Deleted {
                    self.transition(TenantStatus::Deleted)?;
                    self.provisioning.claim = None;
                }
            }
        }
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BackendEndpoints, DatabaseHandle, ProvisioningFailure};
    use chrono::{Duration, Utc};

    fn tenant() -> Tenant {
        Tenant::from_create_params(
            TenantId(1),
            TenantCreate {
                name: "My Shop".into(),
                slug: "my-shop".into(),
                subdomain: "my-shop.aurelio.app".into(),
                owner_id: "user_1".into(),
                created_at: Utc::now(),
            },
        )
        .unwrap()
    }

    async fn claim(t: &mut Tenant, run_id: Uuid) -> Result<Tenant, TenantError> {
        t.handle_action(
            TenantAction::ClaimProvisioning {
                run_id,
                now: Utc::now(),
                lease: Duration::minutes(5),
            },
            &(),
        )
        .await
    }

    fn db() -> DatabaseHandle {
        DatabaseHandle {
            project_id: "p".into(),
            connection_uri: "postgresql://x".into(),
        }
    }

    fn backend() -> BackendEndpoints {
        BackendEndpoints {
            api_url: "https://b/store".into(),
            admin_url: "https://b/app".into(),
        }
    }

    #[tokio::test]
    async fn second_claim_is_refused_while_lease_is_live() {
        let mut t = tenant();
        let first = Uuid::new_v4();
        claim(&mut t, first).await.unwrap();

        let err = claim(&mut t, Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err, TenantError::ProvisioningInProgress(first));
    }

    #[tokio::test]
    async fn expired_claim_can_be_taken_over() {
        let mut t = tenant();
        let stale = Uuid::new_v4();
        t.handle_action(
            TenantAction::ClaimProvisioning {
                run_id: stale,
                now: Utc::now() - Duration::hours(1),
                lease: Duration::minutes(5),
            },
            &(),
        )
        .await
        .unwrap();

        let fresh = Uuid::new_v4();
        claim(&mut t, fresh).await.unwrap();

        let err = t
            .handle_action(
                TenantAction::RecordDatabase {
                    run_id: stale,
                    handle: db(),
                },
                &(),
            )
            .await
            .unwrap_err();
        assert_eq!(err, TenantError::ClaimLost(stale));
    }

    #[tokio::test]
    async fn completion_requires_every_handle() {
        let mut t = tenant();
        let run = Uuid::new_v4();
        claim(&mut t, run).await.unwrap();
        t.handle_action(TenantAction::RecordDatabase { run_id: run, handle: db() }, &())
            .await
            .unwrap();

        let err = t
            .handle_action(
                TenantAction::CompleteProvisioning {
                    run_id: run,
                    now: Utc::now(),
                    suspend: false,
                },
                &(),
            )
            .await
            .unwrap_err();
        assert_eq!(err, TenantError::MissingResources);

        t.handle_action(
            TenantAction::RecordBackend {
                run_id: run,
                endpoints: backend(),
            },
            &(),
        )
        .await
        .unwrap();
        let active = t
            .handle_action(
                TenantAction::CompleteProvisioning {
                    run_id: run,
                    now: Utc::now(),
                    suspend: false,
                },
                &(),
            )
            .await
            .unwrap();
        assert_eq!(active.status, TenantStatus::Active);
        assert!(active.provisioning.claim.is_none());
    }

    #[tokio::test]
    async fn completion_can_finish_suspended() {
        let mut t = tenant();
        let run = Uuid::new_v4();
        claim(&mut t, run).await.unwrap();
        t.database = Some(db());
        t.backend = Some(backend());

        let done = t
            .handle_action(
                TenantAction::CompleteProvisioning {
                    run_id: run,
                    now: Utc::now(),
                    suspend: true,
                },
                &(),
            )
            .await
            .unwrap();
        assert_eq!(done.status, TenantStatus::Suspended);
        assert!(done.provisioning.completed_at.is_some());
        assert!(done.provisioning.claim.is_none());
    }

    #[tokio::test]
    async fn failure_keeps_provisioning_status() {
        let mut t = tenant();
        let run = Uuid::new_v4();
        claim(&mut t, run).await.unwrap();
        let failed = t
            .handle_action(
                TenantAction::RecordFailure {
                    run_id: run,
                    failure: ProvisioningFailure {
                        step: "deploy_backend".into(),
                        message: "timed out".into(),
                        at: Utc::now(),
                    },
                },
                &(),
            )
            .await
            .unwrap();
        assert_eq!(failed.status, TenantStatus::Provisioning);
        assert!(failed.is_failed());
        assert!(failed.provisioning.claim.is_none());
    }

    #[tokio::test]
    async fn suspend_only_touches_active_tenants() {
        let mut t = tenant();
        let unchanged = t.handle_action(TenantAction::Suspend, &()).await.unwrap();
        assert_eq!(unchanged.status, TenantStatus::Provisioning);

        t.status = TenantStatus::Active;
        let suspended = t.handle_action(TenantAction::Suspend, &()).await.unwrap();
        assert_eq!(suspended.status, TenantStatus::Suspended);
        let back = t.handle_action(TenantAction::Reactivate, &()).await.unwrap();
        assert_eq!(back.status, TenantStatus::Active);
    }

    #[tokio::test]
    async fn deleted_is_terminal() {
        let mut t = tenant();
        t.handle_action(TenantAction::SoftDelete, &()).await.unwrap();
        let again = t.handle_action(TenantAction::Reactivate, &()).await.unwrap();
        assert_eq!(again.status, TenantStatus::Deleted);

        let err = claim(&mut t, Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err, TenantError::NotProvisioning(TenantStatus::Deleted));

        let err = t
            .on_update(
                TenantUpdate {
                    name: Some("New".into()),
                    settings: None,
                },
                &(),
            )
            .await
            .unwrap_err();
        assert_eq!(err, TenantError::TenantDeleted);
    }

    #[tokio::test]
    async fn settings_merge_and_null_removes() {
        let mut t = tenant();
        let mut patch = serde_json::Map::new();
        patch.insert("currency".into(), "EUR".into());
        patch.insert("theme".into(), "dark".into());
        t.on_update(
            TenantUpdate {
                name: None,
                settings: Some(patch),
            },
            &(),
        )
        .await
        .unwrap();

        let mut patch = serde_json::Map::new();
        patch.insert("theme".into(), Value::Null);
        t.on_update(
            TenantUpdate {
                name: None,
                settings: Some(patch),
            },
            &(),
        )
        .await
        .unwrap();

        assert_eq!(t.settings.get("currency"), Some(&Value::from("EUR")));
        assert!(!t.settings.contains_key("theme"));
    }
}
