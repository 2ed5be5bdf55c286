use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::domain::{Scheme, SchemeDetails, SchemeId, SchemeStatus};
use crate::workflows::error::{write_error, EntityKind, WorkflowError};
use crate::workflows::identity::{Actor, Role};
use crate::workflows::repository::{SchemeFilter, SchemeRepository};

static SCHEME_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_scheme_id() -> SchemeId {
    let id = SCHEME_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SchemeId(format!("scheme-{id:06}"))
}

/// Organizer authoring and admin review of schemes.
pub struct SchemeService<S> {
    repository: Arc<S>,
}

impl<S> SchemeService<S>
where
    S: SchemeRepository + 'static,
{
    pub fn new(repository: Arc<S>) -> Self {
        Self { repository }
    }

    pub fn create_scheme(
        &self,
        actor: &Actor,
        details: SchemeDetails,
    ) -> Result<Scheme, WorkflowError> {
        actor.require_role(&[Role::Organizer], "create schemes")?;
        let scheme = Scheme::draft(next_scheme_id(), actor.id.clone(), details)?;
        let stored = self.repository.insert_scheme(scheme)?;
        tracing::info!(scheme_id = %stored.id, actor = %actor.id, "scheme drafted");
        Ok(stored)
    }

    pub fn update_scheme(
        &self,
        actor: &Actor,
        id: &SchemeId,
        details: SchemeDetails,
    ) -> Result<Scheme, WorkflowError> {
        let mut scheme = self.get_scheme(id)?;
        let revision = scheme.revision;
        scheme.revise(&actor.id, details)?;
        self.persist(scheme, revision, "update")
    }

    pub fn submit_scheme(&self, actor: &Actor, id: &SchemeId) -> Result<Scheme, WorkflowError> {
        let mut scheme = self.get_scheme(id)?;
        scheme.ensure_owner(&actor.id, "submit")?;
        let revision = scheme.revision;
        scheme.submit()?;
        self.persist(scheme, revision, "submit")
    }

    pub fn approve_scheme(
        &self,
        actor: &Actor,
        id: &SchemeId,
        remarks: Option<&str>,
    ) -> Result<Scheme, WorkflowError> {
        actor.require_role(&[Role::Admin], "approve schemes")?;
        let mut scheme = self.get_scheme(id)?;
        let revision = scheme.revision;
        scheme.approve(&actor.id, remarks)?;
        self.persist(scheme, revision, "approve")
    }

    pub fn reject_scheme(
        &self,
        actor: &Actor,
        id: &SchemeId,
        remarks: &str,
    ) -> Result<Scheme, WorkflowError> {
        actor.require_role(&[Role::Admin], "reject schemes")?;
        let mut scheme = self.get_scheme(id)?;
        let revision = scheme.revision;
        scheme.reject(remarks)?;
        self.persist(scheme, revision, "reject")
    }

    pub fn toggle_scheme_active(
        &self,
        actor: &Actor,
        id: &SchemeId,
    ) -> Result<Scheme, WorkflowError> {
        actor.require_role(&[Role::Admin], "activate or deactivate schemes")?;
        let mut scheme = self.get_scheme(id)?;
        let revision = scheme.revision;
        let active = scheme.toggle_active()?;
        tracing::info!(scheme_id = %scheme.id, active, "scheme visibility toggled");
        self.persist(scheme, revision, "toggle")
    }

    pub fn delete_scheme(&self, actor: &Actor, id: &SchemeId) -> Result<(), WorkflowError> {
        let scheme = self.get_scheme(id)?;
        scheme.ensure_owner(&actor.id, "delete")?;
        scheme.ensure_deletable()?;
        self.repository
            .delete_scheme(id, SchemeStatus::Draft)
            .map_err(|err| write_error(err, EntityKind::Scheme, &id.0, "delete"))?;
        tracing::info!(scheme_id = %id, actor = %actor.id, "draft scheme deleted");
        Ok(())
    }

    pub fn get_scheme(&self, id: &SchemeId) -> Result<Scheme, WorkflowError> {
        self.repository
            .fetch_scheme(id)?
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Scheme, id.0.clone()))
    }

    /// Approved, active schemes visible to citizens.
    pub fn catalog(&self) -> Result<Vec<Scheme>, WorkflowError> {
        Ok(self.repository.list_schemes(&SchemeFilter::catalog())?)
    }

    pub fn organizer_schemes(&self, actor: &Actor) -> Result<Vec<Scheme>, WorkflowError> {
        actor.require_role(&[Role::Organizer], "list organizer schemes")?;
        let filter = SchemeFilter {
            created_by: Some(actor.id.clone()),
            ..SchemeFilter::default()
        };
        Ok(self.repository.list_schemes(&filter)?)
    }

    pub fn admin_schemes(
        &self,
        actor: &Actor,
        status: Option<SchemeStatus>,
    ) -> Result<Vec<Scheme>, WorkflowError> {
        actor.require_role(&[Role::Admin], "list all schemes")?;
        let filter = SchemeFilter {
            status,
            ..SchemeFilter::default()
        };
        Ok(self.repository.list_schemes(&filter)?)
    }

    pub fn pending_schemes(&self, actor: &Actor) -> Result<Vec<Scheme>, WorkflowError> {
        self.admin_schemes(actor, Some(SchemeStatus::Pending))
    }

    fn persist(
        &self,
        scheme: Scheme,
        expected_revision: u64,
        attempted: &'static str,
    ) -> Result<Scheme, WorkflowError> {
        let id = scheme.id.0.clone();
        self.repository
            .update_scheme(scheme, expected_revision)
            .map_err(|err| write_error(err, EntityKind::Scheme, &id, attempted))
    }
}
