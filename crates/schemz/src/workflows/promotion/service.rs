use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::domain::{PromotionForm, PromotionRequest, PromotionRequestId, PromotionStatus};
use crate::workflows::error::{write_error, EntityKind, WorkflowError};
use crate::workflows::identity::{Actor, Role, UserId};
use crate::workflows::repository::{
    PromotionFilter, PromotionRepository, RepositoryError, RoleGrant, UserDirectory,
};

static PROMOTION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_promotion_id() -> PromotionRequestId {
    let id = PROMOTION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    PromotionRequestId(format!("promo-{id:06}"))
}

/// Requests from citizens to become organizers, reviewed by admins.
pub struct PromotionService<S> {
    store: Arc<S>,
}

impl<S> PromotionService<S>
where
    S: PromotionRepository + UserDirectory + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn submit_promotion_request(
        &self,
        actor: &Actor,
        form: PromotionForm,
    ) -> Result<PromotionRequest, WorkflowError> {
        let role = self.current_role(&actor.id)?;
        if role != Role::User {
            return Err(WorkflowError::Unauthorized(format!(
                "only regular users can apply to become organizers (current role: {role})"
            )));
        }

        let pending = PromotionFilter {
            status: Some(PromotionStatus::Pending),
            user: Some(actor.id.clone()),
        };
        if !self.store.list_promotions(&pending)?.is_empty() {
            return Err(WorkflowError::Conflict(
                "you already have a pending organizer application".to_string(),
            ));
        }

        let request = PromotionRequest::open(next_promotion_id(), actor.id.clone(), form)?;
        let id = request.id.0.clone();
        let stored = self
            .store
            .insert_promotion(request)
            .map_err(|err| write_error(err, EntityKind::PromotionRequest, &id, "submit"))?;
        tracing::info!(request_id = %stored.id, user = %stored.user, "promotion requested");
        Ok(stored)
    }

    /// Approve and promote the requester to organizer in one atomic store write.
    pub fn approve_promotion_request(
        &self,
        actor: &Actor,
        id: &PromotionRequestId,
        remarks: Option<&str>,
    ) -> Result<PromotionRequest, WorkflowError> {
        actor.require_role(&[Role::Admin], "review promotion requests")?;
        let mut request = self.get_promotion_request(id)?;
        request.require_pending("approve")?;

        let role = self.current_role(&request.user)?;
        if role != Role::User {
            return Err(WorkflowError::PreconditionFailed(format!(
                "user '{}' is already {role}",
                request.user
            )));
        }

        request.approve(&actor.id, remarks)?;
        let grant = RoleGrant {
            user: request.user.clone(),
            from: Role::User,
            to: Role::Organizer,
        };
        let stored = self
            .store
            .commit_promotion_approval(request, PromotionStatus::Pending, grant)
            .map_err(|err| match err {
                RepositoryError::RoleMismatch { found } => WorkflowError::PreconditionFailed(
                    format!("user role changed to {found} before approval"),
                ),
                other => write_error(other, EntityKind::PromotionRequest, &id.0, "approve"),
            })?;

        tracing::info!(
            request_id = %stored.id,
            user = %stored.user,
            admin = %actor.id,
            "user promoted to organizer"
        );
        Ok(stored)
    }

    pub fn reject_promotion_request(
        &self,
        actor: &Actor,
        id: &PromotionRequestId,
        remarks: &str,
    ) -> Result<PromotionRequest, WorkflowError> {
        actor.require_role(&[Role::Admin], "review promotion requests")?;
        let mut request = self.get_promotion_request(id)?;
        request.reject(&actor.id, remarks)?;
        let stored = self
            .store
            .update_promotion(request, PromotionStatus::Pending)
            .map_err(|err| write_error(err, EntityKind::PromotionRequest, &id.0, "reject"))?;
        tracing::info!(request_id = %stored.id, admin = %actor.id, "promotion request rejected");
        Ok(stored)
    }

    pub fn get_promotion_request(
        &self,
        id: &PromotionRequestId,
    ) -> Result<PromotionRequest, WorkflowError> {
        self.store
            .fetch_promotion(id)?
            .ok_or_else(|| WorkflowError::not_found(EntityKind::PromotionRequest, id.0.clone()))
    }

    pub fn my_promotion_requests(
        &self,
        actor: &Actor,
    ) -> Result<Vec<PromotionRequest>, WorkflowError> {
        let filter = PromotionFilter {
            status: None,
            user: Some(actor.id.clone()),
        };
        Ok(self.store.list_promotions(&filter)?)
    }

    pub fn all_promotion_requests(
        &self,
        actor: &Actor,
        status: Option<PromotionStatus>,
    ) -> Result<Vec<PromotionRequest>, WorkflowError> {
        actor.require_role(&[Role::Admin], "list promotion requests")?;
        let filter = PromotionFilter { status, user: None };
        Ok(self.store.list_promotions(&filter)?)
    }

    pub fn pending_promotion_requests(
        &self,
        actor: &Actor,
    ) -> Result<Vec<PromotionRequest>, WorkflowError> {
        self.all_promotion_requests(actor, Some(PromotionStatus::Pending))
    }

    fn current_role(&self, user: &UserId) -> Result<Role, WorkflowError> {
        self.store
            .role(user)?
            .ok_or_else(|| WorkflowError::not_found(EntityKind::User, user.0.clone()))
    }
}
