//! Store abstractions so services can be exercised against any document store.
//!
//! Every status-changing write carries the state the caller read. Implementations must apply
//! the write only if the stored entity still has that state, so two concurrent reviews of
//! the same pending entity cannot both succeed.

use serde::{Deserialize, Serialize};

use super::applications::{ApplicationId, ApplicationStatus, SchemeApplication};
use super::eligibility::Profile;
use super::identity::{Role, UserId};
use super::promotion::{PromotionRequest, PromotionRequestId, PromotionStatus};
use super::schemes::{Scheme, SchemeId, SchemeStatus};

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{0}")]
    Conflict(String),
    #[error("record not found")]
    NotFound,
    #[error("record changed concurrently (now {found})")]
    StaleWrite { found: String },
    #[error("user role is now {found}")]
    RoleMismatch { found: Role },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Read access to citizen profiles owned by the user-profile store.
pub trait ProfileStore: Send + Sync {
    fn profile(&self, user: &UserId) -> Result<Option<Profile>, RepositoryError>;
}

/// Read access to the identity store's role assignments.
pub trait UserDirectory: Send + Sync {
    fn role(&self, user: &UserId) -> Result<Option<Role>, RepositoryError>;
}

/// Optional filters applied when listing schemes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeFilter {
    pub status: Option<SchemeStatus>,
    pub active: Option<bool>,
    pub created_by: Option<UserId>,
}

impl SchemeFilter {
    /// Schemes citizens can see and be matched against.
    pub fn catalog() -> Self {
        Self {
            status: Some(SchemeStatus::Approved),
            active: Some(true),
            created_by: None,
        }
    }

    pub fn matches(&self, scheme: &Scheme) -> bool {
        self.status.map_or(true, |status| scheme.status == status)
            && self.active.map_or(true, |active| scheme.active == active)
            && self
                .created_by
                .as_ref()
                .map_or(true, |owner| &scheme.created_by == owner)
    }
}

pub trait SchemeRepository: Send + Sync {
    fn insert_scheme(&self, scheme: Scheme) -> Result<Scheme, RepositoryError>;
    fn fetch_scheme(&self, id: &SchemeId) -> Result<Option<Scheme>, RepositoryError>;
    /// Replace the stored scheme if its revision still equals `expected_revision`.
    /// The stored copy gets `expected_revision + 1`.
    fn update_scheme(
        &self,
        scheme: Scheme,
        expected_revision: u64,
    ) -> Result<Scheme, RepositoryError>;
    fn delete_scheme(
        &self,
        id: &SchemeId,
        expected_status: SchemeStatus,
    ) -> Result<(), RepositoryError>;
    /// List schemes in creation order.
    fn list_schemes(&self, filter: &SchemeFilter) -> Result<Vec<Scheme>, RepositoryError>;
}

/// Optional filters applied when listing scheme applications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationFilter {
    pub status: Option<ApplicationStatus>,
    pub scheme: Option<SchemeId>,
    pub user: Option<UserId>,
}

impl ApplicationFilter {
    pub fn matches(&self, application: &SchemeApplication) -> bool {
        self.status
            .map_or(true, |status| application.status == status)
            && self
                .scheme
                .as_ref()
                .map_or(true, |scheme| &application.scheme == scheme)
            && self
                .user
                .as_ref()
                .map_or(true, |user| &application.user == user)
    }
}

pub trait ApplicationRepository: Send + Sync {
    /// Insert a new application; fails with `Conflict` if the user already applied to the scheme.
    fn insert_application(
        &self,
        application: SchemeApplication,
    ) -> Result<SchemeApplication, RepositoryError>;
    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<SchemeApplication>, RepositoryError>;
    fn find_application(
        &self,
        user: &UserId,
        scheme: &SchemeId,
    ) -> Result<Option<SchemeApplication>, RepositoryError>;
    fn update_application(
        &self,
        application: SchemeApplication,
        expected_status: ApplicationStatus,
    ) -> Result<SchemeApplication, RepositoryError>;
    fn list_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<SchemeApplication>, RepositoryError>;
}

/// Role change applied together with a promotion approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGrant {
    pub user: UserId,
    pub from: Role,
    pub to: Role,
}

/// Optional filters applied when listing promotion requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionFilter {
    pub status: Option<PromotionStatus>,
    pub user: Option<UserId>,
}

impl PromotionFilter {
    pub fn matches(&self, request: &PromotionRequest) -> bool {
        self.status.map_or(true, |status| request.status == status)
            && self.user.as_ref().map_or(true, |user| &request.user == user)
    }
}

pub trait PromotionRepository: Send + Sync {
    /// Insert a new request; fails with `Conflict` if the user already has a pending one.
    fn insert_promotion(
        &self,
        request: PromotionRequest,
    ) -> Result<PromotionRequest, RepositoryError>;
    fn fetch_promotion(
        &self,
        id: &PromotionRequestId,
    ) -> Result<Option<PromotionRequest>, RepositoryError>;
    fn update_promotion(
        &self,
        request: PromotionRequest,
        expected_status: PromotionStatus,
    ) -> Result<PromotionRequest, RepositoryError>;
    /// Persist the approved request and apply `grant` as one unit. Nothing is written when
    /// either the request status or the user's role no longer match.
    fn commit_promotion_approval(
        &self,
        request: PromotionRequest,
        expected_status: PromotionStatus,
        grant: RoleGrant,
    ) -> Result<PromotionRequest, RepositoryError>;
    fn list_promotions(
        &self,
        filter: &PromotionFilter,
    ) -> Result<Vec<PromotionRequest>, RepositoryError>;
}

/// Everything the workflow services need from one backing document store.
pub trait WorkflowStore:
    ProfileStore + UserDirectory + SchemeRepository + ApplicationRepository + PromotionRepository
{
}

impl<T> WorkflowStore for T where
    T: ProfileStore
        + UserDirectory
        + SchemeRepository
        + ApplicationRepository
        + PromotionRepository
{
}
