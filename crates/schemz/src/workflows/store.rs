//! In-process document store backing the service binary, the demo, and the tests.
//!
//! All collections sit behind one mutex, so uniqueness checks and conditional writes are
//! atomic with respect to each other, including the two-document promotion commit.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};

use super::applications::{ApplicationId, ApplicationStatus, SchemeApplication};
use super::eligibility::Profile;
use super::identity::{Role, UserId};
use super::promotion::{PromotionRequest, PromotionRequestId, PromotionStatus};
use super::repository::{
    ApplicationFilter, ApplicationRepository, ProfileStore, PromotionFilter, PromotionRepository,
    RepositoryError, RoleGrant, SchemeFilter, SchemeRepository, UserDirectory,
};
use super::schemes::{Scheme, SchemeId, SchemeStatus};

#[derive(Debug, Clone)]
struct UserRecord {
    role: Role,
    profile: Profile,
}

/// Documents keyed by id and listed in insertion order.
#[derive(Debug)]
struct Collection<K, V> {
    entries: HashMap<K, V>,
    order: Vec<K>,
}

impl<K, V> Default for Collection<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<K, V> Collection<K, V>
where
    K: Eq + Hash + Clone,
{
    fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    fn insert(&mut self, key: K, value: V) {
        if self.entries.insert(key.clone(), value).is_none() {
            self.order.push(key);
        }
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let removed = self.entries.remove(key)?;
        self.order.retain(|existing| existing != key);
        Some(removed)
    }

    fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.order.iter().filter_map(|key| self.entries.get(key))
    }
}

#[derive(Debug, Default)]
struct Collections {
    users: HashMap<UserId, UserRecord>,
    schemes: Collection<SchemeId, Scheme>,
    applications: Collection<ApplicationId, SchemeApplication>,
    promotions: Collection<PromotionRequestId, PromotionRequest>,
}

#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: Mutex<Collections>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a user with the given role and profile.
    pub fn register_user(
        &self,
        user: UserId,
        role: Role,
        profile: Profile,
    ) -> Result<(), RepositoryError> {
        self.lock()?
            .users
            .insert(user, UserRecord { role, profile });
        Ok(())
    }

    /// Replace the profile of an existing user (the profile store's edit path).
    pub fn update_profile(&self, user: &UserId, profile: Profile) -> Result<(), RepositoryError> {
        let mut collections = self.lock()?;
        let record = collections
            .users
            .get_mut(user)
            .ok_or(RepositoryError::NotFound)?;
        record.profile = profile;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, RepositoryError> {
        self.collections
            .lock()
            .map_err(|_| RepositoryError::Unavailable("document store mutex poisoned".to_string()))
    }
}

impl ProfileStore for InMemoryDocumentStore {
    fn profile(&self, user: &UserId) -> Result<Option<Profile>, RepositoryError> {
        Ok(self.lock()?.users.get(user).map(|record| record.profile.clone()))
    }
}

impl UserDirectory for InMemoryDocumentStore {
    fn role(&self, user: &UserId) -> Result<Option<Role>, RepositoryError> {
        Ok(self.lock()?.users.get(user).map(|record| record.role))
    }
}

impl SchemeRepository for InMemoryDocumentStore {
    fn insert_scheme(&self, scheme: Scheme) -> Result<Scheme, RepositoryError> {
        let mut collections = self.lock()?;
        if collections.schemes.contains_key(&scheme.id) {
            return Err(RepositoryError::Conflict(format!(
                "scheme '{}' already exists",
                scheme.id
            )));
        }
        collections.schemes.insert(scheme.id.clone(), scheme.clone());
        Ok(scheme)
    }

    fn fetch_scheme(&self, id: &SchemeId) -> Result<Option<Scheme>, RepositoryError> {
        Ok(self.lock()?.schemes.get(id).cloned())
    }

    fn update_scheme(
        &self,
        mut scheme: Scheme,
        expected_revision: u64,
    ) -> Result<Scheme, RepositoryError> {
        let mut collections = self.lock()?;
        let stored = collections
            .schemes
            .get_mut(&scheme.id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.revision != expected_revision {
            return Err(RepositoryError::StaleWrite {
                found: stored.status.label().to_string(),
            });
        }
        scheme.revision = expected_revision + 1;
        *stored = scheme.clone();
        Ok(scheme)
    }

    fn delete_scheme(
        &self,
        id: &SchemeId,
        expected_status: SchemeStatus,
    ) -> Result<(), RepositoryError> {
        let mut collections = self.lock()?;
        let stored = collections.schemes.get(id).ok_or(RepositoryError::NotFound)?;
        if stored.status != expected_status {
            return Err(RepositoryError::StaleWrite {
                found: stored.status.label().to_string(),
            });
        }
        collections.schemes.remove(id);
        Ok(())
    }

    fn list_schemes(&self, filter: &SchemeFilter) -> Result<Vec<Scheme>, RepositoryError> {
        Ok(self
            .lock()?
            .schemes
            .values()
            .filter(|scheme| filter.matches(scheme))
            .cloned()
            .collect())
    }
}

impl ApplicationRepository for InMemoryDocumentStore {
    fn insert_application(
        &self,
        application: SchemeApplication,
    ) -> Result<SchemeApplication, RepositoryError> {
        let mut collections = self.lock()?;
        let duplicate = collections.applications.values().any(|existing| {
            existing.user == application.user && existing.scheme == application.scheme
        });
        if duplicate || collections.applications.contains_key(&application.id) {
            return Err(RepositoryError::Conflict(
                "you have already applied to this scheme".to_string(),
            ));
        }
        collections
            .applications
            .insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<SchemeApplication>, RepositoryError> {
        Ok(self.lock()?.applications.get(id).cloned())
    }

    fn find_application(
        &self,
        user: &UserId,
        scheme: &SchemeId,
    ) -> Result<Option<SchemeApplication>, RepositoryError> {
        Ok(self
            .lock()?
            .applications
            .values()
            .find(|application| &application.user == user && &application.scheme == scheme)
            .cloned())
    }

    fn update_application(
        &self,
        application: SchemeApplication,
        expected_status: ApplicationStatus,
    ) -> Result<SchemeApplication, RepositoryError> {
        let mut collections = self.lock()?;
        let stored = collections
            .applications
            .get_mut(&application.id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.status != expected_status {
            return Err(RepositoryError::StaleWrite {
                found: stored.status.label().to_string(),
            });
        }
        *stored = application.clone();
        Ok(application)
    }

    fn list_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<SchemeApplication>, RepositoryError> {
        Ok(self
            .lock()?
            .applications
            .values()
            .filter(|application| filter.matches(application))
            .cloned()
            .collect())
    }
}

impl PromotionRepository for InMemoryDocumentStore {
    fn insert_promotion(
        &self,
        request: PromotionRequest,
    ) -> Result<PromotionRequest, RepositoryError> {
        let mut collections = self.lock()?;
        let pending = collections.promotions.values().any(|existing| {
            existing.user == request.user && existing.status == PromotionStatus::Pending
        });
        if pending || collections.promotions.contains_key(&request.id) {
            return Err(RepositoryError::Conflict(
                "you already have a pending organizer application".to_string(),
            ));
        }
        collections
            .promotions
            .insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn fetch_promotion(
        &self,
        id: &PromotionRequestId,
    ) -> Result<Option<PromotionRequest>, RepositoryError> {
        Ok(self.lock()?.promotions.get(id).cloned())
    }

    fn update_promotion(
        &self,
        request: PromotionRequest,
        expected_status: PromotionStatus,
    ) -> Result<PromotionRequest, RepositoryError> {
        let mut collections = self.lock()?;
        let stored = collections
            .promotions
            .get_mut(&request.id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.status != expected_status {
            return Err(RepositoryError::StaleWrite {
                found: stored.status.label().to_string(),
            });
        }
        *stored = request.clone();
        Ok(request)
    }

    fn commit_promotion_approval(
        &self,
        request: PromotionRequest,
        expected_status: PromotionStatus,
        grant: RoleGrant,
    ) -> Result<PromotionRequest, RepositoryError> {
        let mut collections = self.lock()?;

        let stored_status = collections
            .promotions
            .get(&request.id)
            .map(|stored| stored.status)
            .ok_or(RepositoryError::NotFound)?;
        if stored_status != expected_status {
            return Err(RepositoryError::StaleWrite {
                found: stored_status.label().to_string(),
            });
        }

        let user = collections
            .users
            .get_mut(&grant.user)
            .ok_or(RepositoryError::NotFound)?;
        if user.role != grant.from {
            return Err(RepositoryError::RoleMismatch { found: user.role });
        }
        user.role = grant.to;

        collections
            .promotions
            .insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn list_promotions(
        &self,
        filter: &PromotionFilter,
    ) -> Result<Vec<PromotionRequest>, RepositoryError> {
        Ok(self
            .lock()?
            .promotions
            .values()
            .filter(|request| filter.matches(request))
            .cloned()
            .collect())
    }
}
