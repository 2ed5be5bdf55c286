use std::sync::Arc;

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;

use super::applications::{
    ApplicationId, ApplicationService, ApplicationStatus, ApplicationSubmission,
    SchemeApplication,
};
use super::eligibility::{EligibilityService, SchemeMatch};
use super::error::{ErrorCategory, WorkflowError};
use super::identity::{Actor, Role};
use super::promotion::{
    PromotionForm, PromotionRequest, PromotionRequestId, PromotionService, PromotionStatus,
};
use super::repository::WorkflowStore;
use super::schemes::{Scheme, SchemeDetails, SchemeId, SchemeService, SchemeStatus, SchemeSummary};

/// Header carrying the authenticated user id, set by the upstream session layer.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the authenticated user's role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The four workflow services sharing one document store.
pub struct WorkflowServices<S> {
    pub eligibility: EligibilityService<S>,
    pub schemes: SchemeService<S>,
    pub applications: ApplicationService<S>,
    pub promotions: PromotionService<S>,
}

impl<S> WorkflowServices<S>
where
    S: WorkflowStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            eligibility: EligibilityService::new(store.clone()),
            schemes: SchemeService::new(store.clone()),
            applications: ApplicationService::new(store.clone()),
            promotions: PromotionService::new(store),
        }
    }
}

type Services<S> = State<Arc<WorkflowServices<S>>>;

/// Router builder exposing every workflow operation over JSON.
pub fn workflow_router<S>(services: Arc<WorkflowServices<S>>) -> Router
where
    S: WorkflowStore + 'static,
{
    Router::new()
        .route("/api/v1/schemes", get(catalog_handler::<S>))
        .route("/api/v1/schemes/matches", get(matches_handler::<S>))
        .route("/api/v1/schemes/:scheme_id", get(scheme_handler::<S>))
        .route(
            "/api/v1/schemes/:scheme_id/applications",
            get(scheme_applications_handler::<S>),
        )
        .route(
            "/api/v1/schemes/:scheme_id/my-application",
            get(my_scheme_application_handler::<S>),
        )
        .route(
            "/api/v1/organizer/schemes",
            post(create_scheme_handler::<S>).get(organizer_schemes_handler::<S>),
        )
        .route(
            "/api/v1/organizer/schemes/:scheme_id",
            put(update_scheme_handler::<S>).delete(delete_scheme_handler::<S>),
        )
        .route(
            "/api/v1/organizer/schemes/:scheme_id/submit",
            post(submit_scheme_handler::<S>),
        )
        .route("/api/v1/admin/schemes", get(admin_schemes_handler::<S>))
        .route(
            "/api/v1/admin/schemes/:scheme_id/approve",
            post(approve_scheme_handler::<S>),
        )
        .route(
            "/api/v1/admin/schemes/:scheme_id/reject",
            post(reject_scheme_handler::<S>),
        )
        .route(
            "/api/v1/admin/schemes/:scheme_id/toggle",
            post(toggle_scheme_handler::<S>),
        )
        .route(
            "/api/v1/applications",
            post(submit_application_handler::<S>).get(all_applications_handler::<S>),
        )
        .route("/api/v1/applications/mine", get(my_applications_handler::<S>))
        .route(
            "/api/v1/applications/:application_id/approve",
            patch(approve_application_handler::<S>),
        )
        .route(
            "/api/v1/applications/:application_id/reject",
            patch(reject_application_handler::<S>),
        )
        .route("/api/v1/promotions", post(submit_promotion_handler::<S>))
        .route("/api/v1/promotions/mine", get(my_promotions_handler::<S>))
        .route("/api/v1/admin/promotions", get(admin_promotions_handler::<S>))
        .route(
            "/api/v1/admin/promotions/:request_id/approve",
            post(approve_promotion_handler::<S>),
        )
        .route(
            "/api/v1/admin/promotions/:request_id/reject",
            post(reject_promotion_handler::<S>),
        )
        .with_state(services)
}

impl IntoResponse for WorkflowError {
    fn into_response(self) -> Response {
        let category = self.category();
        let status = match category {
            ErrorCategory::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::Unauthorized => StatusCode::FORBIDDEN,
            ErrorCategory::InvalidTransition | ErrorCategory::Conflict => StatusCode::CONFLICT,
            ErrorCategory::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
            ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "workflow request failed");
        }
        let payload = json!({
            "error": self.to_string(),
            "category": category.label(),
        });
        (status, Json(payload)).into_response()
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = WorkflowError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header(parts, USER_ID_HEADER).ok_or_else(|| {
            WorkflowError::Unauthorized(format!("missing {USER_ID_HEADER} header"))
        })?;
        let role = header(parts, USER_ROLE_HEADER)
            .and_then(Role::parse)
            .ok_or_else(|| {
                WorkflowError::Unauthorized(format!("missing or unknown {USER_ROLE_HEADER} header"))
            })?;
        Ok(Actor::new(id, role))
    }
}

/// JSON body whose deserialization failures surface as validation errors.
pub(crate) struct WorkflowJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for WorkflowJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = WorkflowError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| WorkflowError::Validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Query string counterpart of [`WorkflowJson`].
pub(crate) struct WorkflowQuery<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for WorkflowQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = WorkflowError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| WorkflowError::Validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReviewRemarks {
    #[serde(default)]
    remarks: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RejectionReason {
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SchemeQuery {
    status: Option<SchemeStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApplicationQuery {
    status: Option<ApplicationStatus>,
    scheme_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PromotionQuery {
    status: Option<PromotionStatus>,
}

pub(crate) async fn catalog_handler<S: WorkflowStore + 'static>(
    State(services): Services<S>,
) -> Result<Json<Vec<SchemeSummary>>, WorkflowError> {
    let catalog = services.schemes.catalog()?;
    Ok(Json(catalog.iter().map(Scheme::summary).collect()))
}

pub(crate) async fn matches_handler<S: WorkflowStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
) -> Result<Json<Vec<SchemeMatch>>, WorkflowError> {
    Ok(Json(services.eligibility.find_matches(&actor.id)?))
}

pub(crate) async fn scheme_handler<S: WorkflowStore + 'static>(
    State(services): Services<S>,
    Path(scheme_id): Path<String>,
) -> Result<Json<Scheme>, WorkflowError> {
    Ok(Json(services.schemes.get_scheme(&SchemeId(scheme_id))?))
}

pub(crate) async fn scheme_applications_handler<S: WorkflowStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(scheme_id): Path<String>,
) -> Result<Json<Vec<SchemeApplication>>, WorkflowError> {
    let applications = services
        .applications
        .scheme_applications(&actor, &SchemeId(scheme_id))?;
    Ok(Json(applications))
}

pub(crate) async fn my_scheme_application_handler<S: WorkflowStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(scheme_id): Path<String>,
) -> Result<Json<serde_json::Value>, WorkflowError> {
    let application = services
        .applications
        .application_for(&actor, &SchemeId(scheme_id))?;
    Ok(Json(json!({
        "has_applied": application.is_some(),
        "application": application,
    })))
}

pub(crate) async fn create_scheme_handler<S: WorkflowStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    WorkflowJson(details): WorkflowJson<SchemeDetails>,
) -> Result<(StatusCode, Json<Scheme>), WorkflowError> {
    let scheme = services.schemes.create_scheme(&actor, details)?;
    Ok((StatusCode::CREATED, Json(scheme)))
}

pub(crate) async fn organizer_schemes_handler<S: WorkflowStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
) -> Result<Json<Vec<Scheme>>, WorkflowError> {
    Ok(Json(services.schemes.organizer_schemes(&actor)?))
}

pub(crate) async fn update_scheme_handler<S: WorkflowStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(scheme_id): Path<String>,
    WorkflowJson(details): WorkflowJson<SchemeDetails>,
) -> Result<Json<Scheme>, WorkflowError> {
    let scheme = services
        .schemes
        .update_scheme(&actor, &SchemeId(scheme_id), details)?;
    Ok(Json(scheme))
}

pub(crate) async fn delete_scheme_handler<S: WorkflowStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(scheme_id): Path<String>,
) -> Result<StatusCode, WorkflowError> {
    services.schemes.delete_scheme(&actor, &SchemeId(scheme_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn submit_scheme_handler<S: WorkflowStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(scheme_id): Path<String>,
) -> Result<Json<Scheme>, WorkflowError> {
    Ok(Json(
        services.schemes.submit_scheme(&actor, &SchemeId(scheme_id))?,
    ))
}

pub(crate) async fn admin_schemes_handler<S: WorkflowStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    WorkflowQuery(query): WorkflowQuery<SchemeQuery>,
) -> Result<Json<Vec<Scheme>>, WorkflowError> {
    Ok(Json(services.schemes.admin_schemes(&actor, query.status)?))
}

pub(crate) async fn approve_scheme_handler<S: WorkflowStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(scheme_id): Path<String>,
    body: Option<Json<ReviewRemarks>>,
) -> Result<Json<Scheme>, WorkflowError> {
    let remarks = body.and_then(|Json(body)| body.remarks);
    let scheme =
        services
            .schemes
            .approve_scheme(&actor, &SchemeId(scheme_id), remarks.as_deref())?;
    Ok(Json(scheme))
}

pub(crate) async fn reject_scheme_handler<S: WorkflowStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(scheme_id): Path<String>,
    body: Option<Json<ReviewRemarks>>,
) -> Result<Json<Scheme>, WorkflowError> {
    let remarks = body.and_then(|Json(body)| body.remarks).unwrap_or_default();
    let scheme = services
        .schemes
        .reject_scheme(&actor, &SchemeId(scheme_id), &remarks)?;
    Ok(Json(scheme))
}

pub(crate) async fn toggle_scheme_handler<S: WorkflowStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(scheme_id): Path<String>,
) -> Result<Json<Scheme>, WorkflowError> {
    Ok(Json(
        services
            .schemes
            .toggle_scheme_active(&actor, &SchemeId(scheme_id))?,
    ))
}

pub(crate) async fn submit_application_handler<S: WorkflowStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    WorkflowJson(submission): WorkflowJson<ApplicationSubmission>,
) -> Result<(StatusCode, Json<SchemeApplication>), WorkflowError> {
    let application = services.applications.submit_application(&actor, submission)?;
    Ok((StatusCode::CREATED, Json(application)))
}

pub(crate) async fn all_applications_handler<S: WorkflowStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    WorkflowQuery(query): WorkflowQuery<ApplicationQuery>,
) -> Result<Json<Vec<SchemeApplication>>, WorkflowError> {
    let applications = services.applications.all_applications(
        &actor,
        query.status,
        query.scheme_id.map(SchemeId),
    )?;
    Ok(Json(applications))
}

pub(crate) async fn my_applications_handler<S: WorkflowStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
) -> Result<Json<Vec<SchemeApplication>>, WorkflowError> {
    Ok(Json(services.applications.my_applications(&actor)?))
}

pub(crate) async fn approve_application_handler<S: WorkflowStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(application_id): Path<String>,
) -> Result<Json<SchemeApplication>, WorkflowError> {
    let application = services
        .applications
        .approve_application(&actor, &ApplicationId(application_id))?;
    Ok(Json(application))
}

pub(crate) async fn reject_application_handler<S: WorkflowStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(application_id): Path<String>,
    body: Option<Json<RejectionReason>>,
) -> Result<Json<SchemeApplication>, WorkflowError> {
    let reason = body.and_then(|Json(body)| body.reason).unwrap_or_default();
    let application = services.applications.reject_application(
        &actor,
        &ApplicationId(application_id),
        &reason,
    )?;
    Ok(Json(application))
}

pub(crate) async fn submit_promotion_handler<S: WorkflowStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    WorkflowJson(form): WorkflowJson<PromotionForm>,
) -> Result<(StatusCode, Json<PromotionRequest>), WorkflowError> {
    let request = services.promotions.submit_promotion_request(&actor, form)?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub(crate) async fn my_promotions_handler<S: WorkflowStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
) -> Result<Json<Vec<PromotionRequest>>, WorkflowError> {
    Ok(Json(services.promotions.my_promotion_requests(&actor)?))
}

pub(crate) async fn admin_promotions_handler<S: WorkflowStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    WorkflowQuery(query): WorkflowQuery<PromotionQuery>,
) -> Result<Json<Vec<PromotionRequest>>, WorkflowError> {
    Ok(Json(
        services
            .promotions
            .all_promotion_requests(&actor, query.status)?,
    ))
}

pub(crate) async fn approve_promotion_handler<S: WorkflowStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(request_id): Path<String>,
    body: Option<Json<ReviewRemarks>>,
) -> Result<Json<PromotionRequest>, WorkflowError> {
    let remarks = body.and_then(|Json(body)| body.remarks);
    let request = services.promotions.approve_promotion_request(
        &actor,
        &PromotionRequestId(request_id),
        remarks.as_deref(),
    )?;
    Ok(Json(request))
}

pub(crate) async fn reject_promotion_handler<S: WorkflowStore + 'static>(
    State(services): Services<S>,
    actor: Actor,
    Path(request_id): Path<String>,
    body: Option<Json<ReviewRemarks>>,
) -> Result<Json<PromotionRequest>, WorkflowError> {
    let remarks = body.and_then(|Json(body)| body.remarks).unwrap_or_default();
    let request = services.promotions.reject_promotion_request(
        &actor,
        &PromotionRequestId(request_id),
        &remarks,
    )?;
    Ok(Json(request))
}
