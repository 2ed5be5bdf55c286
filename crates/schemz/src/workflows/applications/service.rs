use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::domain::{ApplicationId, ApplicationStatus, ApplicationSubmission, SchemeApplication};
use super::lifecycle::ensure_reviewer;
use crate::workflows::error::{write_error, EntityKind, WorkflowError};
use crate::workflows::identity::{Actor, Role};
use crate::workflows::repository::{ApplicationFilter, ApplicationRepository, SchemeRepository};
use crate::workflows::schemes::{Scheme, SchemeId};

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

const DUPLICATE_APPLICATION: &str = "you have already applied to this scheme";

/// Citizen applications to approved schemes and their review.
pub struct ApplicationService<S> {
    store: Arc<S>,
}

impl<S> ApplicationService<S>
where
    S: SchemeRepository + ApplicationRepository + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Submit a new application, returning the stored pending record.
    pub fn submit_application(
        &self,
        actor: &Actor,
        submission: ApplicationSubmission,
    ) -> Result<SchemeApplication, WorkflowError> {
        actor.require_role(&[Role::User], "apply to schemes")?;
        let scheme = self.scheme(&submission.scheme_id)?;

        if self
            .store
            .find_application(&actor.id, &scheme.id)?
            .is_some()
        {
            return Err(WorkflowError::Conflict(DUPLICATE_APPLICATION.to_string()));
        }

        let application =
            SchemeApplication::open(next_application_id(), actor.id.clone(), &scheme, submission)?;
        let id = application.id.0.clone();
        // The store re-checks uniqueness atomically; the lookup above only gives a fast answer.
        let stored = self
            .store
            .insert_application(application)
            .map_err(|err| write_error(err, EntityKind::Application, &id, "submit"))?;

        tracing::info!(
            application_id = %stored.id,
            scheme_id = %stored.scheme,
            user = %stored.user,
            "application submitted"
        );
        Ok(stored)
    }

    pub fn approve_application(
        &self,
        actor: &Actor,
        id: &ApplicationId,
    ) -> Result<SchemeApplication, WorkflowError> {
        let mut application = self.reviewable(actor, id)?;
        application.approve(&actor.id)?;
        self.persist(application, "approve")
    }

    pub fn reject_application(
        &self,
        actor: &Actor,
        id: &ApplicationId,
        reason: &str,
    ) -> Result<SchemeApplication, WorkflowError> {
        let mut application = self.reviewable(actor, id)?;
        application.reject(&actor.id, reason)?;
        self.persist(application, "reject")
    }

    pub fn get_application(&self, id: &ApplicationId) -> Result<SchemeApplication, WorkflowError> {
        self.store
            .fetch_application(id)?
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Application, id.0.clone()))
    }

    pub fn my_applications(&self, actor: &Actor) -> Result<Vec<SchemeApplication>, WorkflowError> {
        let filter = ApplicationFilter {
            user: Some(actor.id.clone()),
            ..ApplicationFilter::default()
        };
        Ok(self.store.list_applications(&filter)?)
    }

    /// The caller's application to `scheme`, if any.
    pub fn application_for(
        &self,
        actor: &Actor,
        scheme: &SchemeId,
    ) -> Result<Option<SchemeApplication>, WorkflowError> {
        Ok(self.store.find_application(&actor.id, scheme)?)
    }

    pub fn scheme_applications(
        &self,
        actor: &Actor,
        scheme: &SchemeId,
    ) -> Result<Vec<SchemeApplication>, WorkflowError> {
        let scheme = self.scheme(scheme)?;
        ensure_reviewer(actor, &scheme)?;
        let filter = ApplicationFilter {
            scheme: Some(scheme.id),
            ..ApplicationFilter::default()
        };
        Ok(self.store.list_applications(&filter)?)
    }

    pub fn all_applications(
        &self,
        actor: &Actor,
        status: Option<ApplicationStatus>,
        scheme: Option<SchemeId>,
    ) -> Result<Vec<SchemeApplication>, WorkflowError> {
        actor.require_role(&[Role::Admin], "list all applications")?;
        let filter = ApplicationFilter {
            status,
            scheme,
            user: None,
        };
        Ok(self.store.list_applications(&filter)?)
    }

    /// Load an application for review. A deactivated scheme's applications stay reviewable.
    fn reviewable(
        &self,
        actor: &Actor,
        id: &ApplicationId,
    ) -> Result<SchemeApplication, WorkflowError> {
        let application = self.get_application(id)?;
        let scheme = self.scheme(&application.scheme)?;
        ensure_reviewer(actor, &scheme)?;
        Ok(application)
    }

    fn scheme(&self, id: &SchemeId) -> Result<Scheme, WorkflowError> {
        self.store
            .fetch_scheme(id)?
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Scheme, id.0.clone()))
    }

    fn persist(
        &self,
        application: SchemeApplication,
        attempted: &'static str,
    ) -> Result<SchemeApplication, WorkflowError> {
        let id = application.id.0.clone();
        self.store
            .update_application(application, ApplicationStatus::Pending)
            .map_err(|err| write_error(err, EntityKind::Application, &id, attempted))
    }
}
