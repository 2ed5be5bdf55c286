use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::workflows::router::{USER_ID_HEADER, USER_ROLE_HEADER};
use crate::workflows::{workflow_router, InMemoryDocumentStore, WorkflowServices};

struct Harness {
    services: Arc<WorkflowServices<InMemoryDocumentStore>>,
}

impl Harness {
    fn new() -> Self {
        let (_store, services) = services();
        Self {
            services: Arc::new(services),
        }
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        caller: Option<(&str, &str)>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((id, role)) = caller {
            builder = builder
                .header(USER_ID_HEADER, id)
                .header(USER_ROLE_HEADER, role);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request builds");

        let response = workflow_router(self.services.clone())
            .oneshot(request)
            .await
            .expect("router responds");
        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return (status, Value::Null);
        }
        (status, read_json_body(response).await)
    }
}

fn scheme_body(rules: Value) -> Value {
    json!({
        "name": "Post-matric scholarship",
        "description": "Support for higher education",
        "benefits": "Tuition waiver",
        "ministry": "Ministry of Social Justice",
        "rules": rules,
    })
}

const ORGANIZER_CALLER: Option<(&str, &str)> = Some((ORGANIZER, "organizer"));
const ADMIN_CALLER: Option<(&str, &str)> = Some((ADMIN, "admin"));
const CITIZEN_CALLER: Option<(&str, &str)> = Some((CITIZEN, "user"));

#[tokio::test]
async fn scheme_review_and_matching_over_http() {
    let harness = Harness::new();

    let (status, created) = harness
        .send(
            "POST",
            "/api/v1/organizer/schemes",
            ORGANIZER_CALLER,
            Some(scheme_body(json!([
                { "field": "age", "operator": "<=", "value": 30, "weight": 40 },
                { "field": "category", "operator": "in", "value": ["SC", "ST"], "weight": 60 }
            ]))),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], json!("draft"));
    let id = created["id"].as_str().expect("scheme id").to_string();

    let (status, _) = harness
        .send(
            "POST",
            &format!("/api/v1/organizer/schemes/{id}/submit"),
            ORGANIZER_CALLER,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, approved) = harness
        .send(
            "POST",
            &format!("/api/v1/admin/schemes/{id}/approve"),
            ADMIN_CALLER,
            Some(json!({ "remarks": "ok" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["active"], json!(true));

    let (status, catalog) = harness.send("GET", "/api/v1/schemes", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(catalog.as_array().map(Vec::len), Some(1));

    let (status, matches) = harness
        .send("GET", "/api/v1/schemes/matches", CITIZEN_CALLER, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(matches[0]["percentage"], json!(100));
    assert_eq!(matches[0]["scheme"]["id"], json!(id));
}

#[tokio::test]
async fn workflow_errors_map_to_status_codes() {
    let harness = Harness::new();

    let (status, body) = harness
        .send(
            "POST",
            "/api/v1/organizer/schemes",
            ORGANIZER_CALLER,
            Some(scheme_body(json!([
                { "field": "category", "operator": ">", "value": "SC" }
            ]))),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["category"], json!("validation_error"));

    let (status, body) = harness
        .send("GET", "/api/v1/schemes/scheme-missing", None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["category"], json!("not_found"));

    let (status, body) = harness
        .send(
            "POST",
            "/api/v1/organizer/schemes",
            CITIZEN_CALLER,
            Some(scheme_body(json!([]))),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["category"], json!("unauthorized"));

    let (_, created) = harness
        .send(
            "POST",
            "/api/v1/organizer/schemes",
            ORGANIZER_CALLER,
            Some(scheme_body(json!([]))),
        )
        .await;
    let id = created["id"].as_str().expect("scheme id").to_string();
    let (status, body) = harness
        .send(
            "POST",
            &format!("/api/v1/admin/schemes/{id}/toggle"),
            ADMIN_CALLER,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["category"], json!("invalid_transition"));

    let (status, _) = harness
        .send(
            "DELETE",
            &format!("/api/v1/organizer/schemes/{id}"),
            ORGANIZER_CALLER,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn missing_identity_headers_are_unauthorized() {
    let harness = Harness::new();

    let (status, body) = harness
        .send("GET", "/api/v1/applications/mine", None, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["category"], json!("unauthorized"));

    let (status, _) = harness
        .send(
            "GET",
            "/api/v1/applications/mine",
            Some((CITIZEN, "superuser")),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn application_flow_over_http() {
    let harness = Harness::new();
    let scheme = approved_scheme(&harness.services, "Scholarship", youth_rules());
    let payload = serde_json::to_value(submission(&scheme.id)).expect("serializable");

    let (status, application) = harness
        .send(
            "POST",
            "/api/v1/applications",
            CITIZEN_CALLER,
            Some(payload.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(application["status"], json!("pending"));
    let application_id = application["id"].as_str().expect("id").to_string();

    let (status, body) = harness
        .send("POST", "/api/v1/applications", CITIZEN_CALLER, Some(payload))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["category"], json!("conflict"));

    let (status, lookup) = harness
        .send(
            "GET",
            &format!("/api/v1/schemes/{}/my-application", scheme.id),
            CITIZEN_CALLER,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lookup["has_applied"], json!(true));

    let (status, _) = harness
        .send(
            "PATCH",
            &format!("/api/v1/applications/{application_id}/reject"),
            ORGANIZER_CALLER,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, rejected) = harness
        .send(
            "PATCH",
            &format!("/api/v1/applications/{application_id}/reject"),
            ORGANIZER_CALLER,
            Some(json!({ "reason": "documents unclear" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["rejection_reason"], json!("documents unclear"));

    let (status, listed) = harness
        .send(
            "GET",
            "/api/v1/applications?status=rejected",
            ADMIN_CALLER,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn promotion_flow_over_http() {
    let harness = Harness::new();
    let form = serde_json::to_value(promotion_form()).expect("serializable");

    let (status, request) = harness
        .send("POST", "/api/v1/promotions", CITIZEN_CALLER, Some(form))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let request_id = request["id"].as_str().expect("id").to_string();

    let (status, queue) = harness
        .send(
            "GET",
            "/api/v1/admin/promotions?status=pending",
            ADMIN_CALLER,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(queue.as_array().map(Vec::len), Some(1));

    let (status, approved) = harness
        .send(
            "POST",
            &format!("/api/v1/admin/promotions/{request_id}/approve"),
            ADMIN_CALLER,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], json!("approved"));
    assert_eq!(approved["remarks"], json!("Application approved"));

    let (status, body) = harness
        .send(
            "POST",
            &format!("/api/v1/admin/promotions/{request_id}/reject"),
            ADMIN_CALLER,
            Some(json!({ "remarks": "changed my mind" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["category"], json!("invalid_transition"));
}

#[tokio::test]
async fn malformed_bodies_report_validation_errors() {
    let harness = Harness::new();

    for rules in [
        json!([{ "field": "age", "operator": "~=", "value": 30, "weight": 40 }]),
        json!([{ "field": "age", "operator": "<=", "value": 30, "weight": 500 }]),
    ] {
        let (status, body) = harness
            .send(
                "POST",
                "/api/v1/organizer/schemes",
                ORGANIZER_CALLER,
                Some(scheme_body(rules)),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["category"], json!("validation_error"));
    }

    let mut without_benefits = scheme_body(json!([]));
    without_benefits
        .as_object_mut()
        .expect("object body")
        .remove("benefits");
    let (status, body) = harness
        .send(
            "POST",
            "/api/v1/organizer/schemes",
            ORGANIZER_CALLER,
            Some(without_benefits),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["category"], json!("validation_error"));
    assert!(body["error"].as_str().expect("message").contains("benefits"));

    let (status, body) = harness
        .send("GET", "/api/v1/admin/schemes?status=bogus", ADMIN_CALLER, None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["category"], json!("validation_error"));
}

#[tokio::test]
async fn application_without_marksheet_is_rejected_by_validation() {
    let harness = Harness::new();
    let scheme = approved_scheme(&harness.services, "Scholarship", youth_rules());
    let mut payload = serde_json::to_value(submission(&scheme.id)).expect("serializable");
    payload["documents"]
        .as_object_mut()
        .expect("documents object")
        .remove("marksheet");

    let (status, body) = harness
        .send("POST", "/api/v1/applications", CITIZEN_CALLER, Some(payload))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["category"], json!("validation_error"));
    assert!(body["error"].as_str().expect("message").contains("marksheet"));

    let (_, mine) = harness
        .send("GET", "/api/v1/applications/mine", CITIZEN_CALLER, None)
        .await;
    assert_eq!(mine.as_array().map(Vec::len), Some(0));
}
