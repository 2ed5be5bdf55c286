use std::sync::Arc;

use super::matching::{MatchingService, SchemeMatch};
use crate::workflows::error::{EntityKind, WorkflowError};
use crate::workflows::identity::UserId;
use crate::workflows::repository::{ProfileStore, SchemeFilter, SchemeRepository};

/// Composes the profile store, the scheme catalog, and the matcher behind `find_matches`.
pub struct EligibilityService<S> {
    store: Arc<S>,
    matcher: MatchingService,
}

impl<S> EligibilityService<S>
where
    S: ProfileStore + SchemeRepository + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            matcher: MatchingService::new(),
        }
    }

    /// Rank every approved, active scheme for the user's current profile.
    pub fn find_matches(&self, user: &UserId) -> Result<Vec<SchemeMatch>, WorkflowError> {
        let profile = self
            .store
            .profile(user)?
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Profile, user.0.clone()))?;
        let catalog = self.store.list_schemes(&SchemeFilter::catalog())?;

        let matches = self.matcher.find_matches(&profile, &catalog)?;
        tracing::debug!(
            user = %user,
            schemes = catalog.len(),
            top = matches.first().map(|m| m.percentage),
            "ranked scheme catalog"
        );
        Ok(matches)
    }
}
