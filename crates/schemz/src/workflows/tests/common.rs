use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::workflows::applications::{
    ApplicantDetails, ApplicationData, ApplicationDocuments, ApplicationSubmission,
};
use crate::workflows::eligibility::{Profile, Rule, RuleField, RuleOperator, RuleValue};
use crate::workflows::identity::{Actor, Role, UserId};
use crate::workflows::promotion::PromotionForm;
use crate::workflows::schemes::{Scheme, SchemeDetails, SchemeId};
use crate::workflows::{InMemoryDocumentStore, WorkflowServices};

pub(super) const CITIZEN: &str = "citizen-1";
pub(super) const SECOND_CITIZEN: &str = "citizen-2";
pub(super) const ORGANIZER: &str = "organizer-1";
pub(super) const OTHER_ORGANIZER: &str = "organizer-2";
pub(super) const ADMIN: &str = "admin-1";

pub(super) fn citizen() -> Actor {
    Actor::new(CITIZEN, Role::User)
}

pub(super) fn second_citizen() -> Actor {
    Actor::new(SECOND_CITIZEN, Role::User)
}

pub(super) fn organizer() -> Actor {
    Actor::new(ORGANIZER, Role::Organizer)
}

pub(super) fn other_organizer() -> Actor {
    Actor::new(OTHER_ORGANIZER, Role::Organizer)
}

pub(super) fn admin() -> Actor {
    Actor::new(ADMIN, Role::Admin)
}

pub(super) fn student_profile() -> Profile {
    Profile {
        age: Some(25),
        income: Some(180_000.0),
        category: Some("SC".to_string()),
        education: Some("Graduate".to_string()),
        state: Some("Kerala".to_string()),
        gender: Some("Female".to_string()),
        marital_status: Some("Single".to_string()),
        disability: Some("None".to_string()),
        occupation: Some("Student".to_string()),
    }
}

pub(super) fn store() -> Arc<InMemoryDocumentStore> {
    let store = InMemoryDocumentStore::new();
    store
        .register_user(UserId(CITIZEN.to_string()), Role::User, student_profile())
        .expect("register citizen");
    store
        .register_user(
            UserId(SECOND_CITIZEN.to_string()),
            Role::User,
            Profile {
                age: Some(35),
                category: Some("General".to_string()),
                ..Profile::default()
            },
        )
        .expect("register second citizen");
    for (id, role) in [
        (ORGANIZER, Role::Organizer),
        (OTHER_ORGANIZER, Role::Organizer),
        (ADMIN, Role::Admin),
    ] {
        store
            .register_user(UserId(id.to_string()), role, Profile::default())
            .expect("register staff");
    }
    Arc::new(store)
}

pub(super) fn services() -> (Arc<InMemoryDocumentStore>, WorkflowServices<InMemoryDocumentStore>) {
    let store = store();
    let services = WorkflowServices::new(store.clone());
    (store, services)
}

pub(super) fn rule(field: RuleField, operator: RuleOperator, value: RuleValue, weight: u8) -> Rule {
    Rule::new(field, operator, value, weight).expect("valid rule")
}

/// Age at most 30 (weight 40) and category SC/ST (weight 60).
pub(super) fn youth_rules() -> Vec<Rule> {
    vec![
        rule(RuleField::Age, RuleOperator::Le, RuleValue::number(30.0), 40),
        rule(
            RuleField::Category,
            RuleOperator::In,
            RuleValue::texts(["SC", "ST"]),
            60,
        ),
    ]
}

pub(super) fn details(name: &str, rules: Vec<Rule>) -> SchemeDetails {
    SchemeDetails {
        name: name.to_string(),
        description: "Support for higher education".to_string(),
        benefits: "Annual scholarship of 50,000".to_string(),
        ministry: "Ministry of Education".to_string(),
        rules,
    }
}

pub(super) fn approved_scheme(
    services: &WorkflowServices<InMemoryDocumentStore>,
    name: &str,
    rules: Vec<Rule>,
) -> Scheme {
    let draft = services
        .schemes
        .create_scheme(&organizer(), details(name, rules))
        .expect("draft created");
    services
        .schemes
        .submit_scheme(&organizer(), &draft.id)
        .expect("submitted");
    services
        .schemes
        .approve_scheme(&admin(), &draft.id, None)
        .expect("approved")
}

pub(super) fn applicant_details() -> ApplicantDetails {
    ApplicantDetails {
        name: "Asha Nair".to_string(),
        email: "asha@example.in".to_string(),
        phone: "9800000001".to_string(),
        age: Some(25),
        gender: Some("Female".to_string()),
        category: Some("SC".to_string()),
        state: Some("Kerala".to_string()),
        education: Some("Graduate".to_string()),
        ..ApplicantDetails::default()
    }
}

pub(super) fn submission(scheme: &SchemeId) -> ApplicationSubmission {
    ApplicationSubmission {
        scheme_id: scheme.clone(),
        applicant_details: applicant_details(),
        application_data: ApplicationData {
            purpose: "Tuition for the final year".to_string(),
            ..ApplicationData::default()
        },
        documents: ApplicationDocuments {
            marksheet: "https://files.example.in/asha/marksheet.pdf".to_string(),
            ..ApplicationDocuments::default()
        },
    }
}

pub(super) fn promotion_form() -> PromotionForm {
    PromotionForm {
        organization: "District Welfare Office".to_string(),
        designation: "Program Officer".to_string(),
        reason: "I coordinate scholarship outreach across the district and want to publish schemes."
            .to_string(),
        contact_number: "9800000002".to_string(),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
