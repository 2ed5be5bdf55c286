use crate::infra::{
    seed_demo_users, DEMO_ADMIN, DEMO_CITIZEN, DEMO_GENERAL_CITIZEN, DEMO_OLDER_CITIZEN,
    DEMO_ORGANIZER,
};
use clap::Args;
use schemz::error::AppError;
use schemz::workflows::applications::{
    ApplicantDetails, ApplicationData, ApplicationDocuments, ApplicationSubmission,
};
use schemz::workflows::eligibility::{Rule, RuleField, RuleOperator, RuleValue};
use schemz::workflows::promotion::PromotionForm;
use schemz::workflows::repository::UserDirectory;
use schemz::workflows::schemes::{SchemeDetails, SchemeId};
use schemz::workflows::{Actor, InMemoryDocumentStore, Role, UserId, WorkflowError, WorkflowServices};
use serde::Serialize;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Pretty-print the JSON transcript.
    #[arg(long)]
    pub(crate) pretty: bool,
}

/// Result of one scripted call, successful or not.
#[derive(Debug, Serialize)]
pub(crate) struct DemoStep {
    pub(crate) step: &'static str,
    pub(crate) ok: bool,
    pub(crate) detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) category: Option<&'static str>,
}

impl DemoStep {
    fn record<T>(
        step: &'static str,
        result: Result<T, WorkflowError>,
        describe: impl FnOnce(&T) -> String,
    ) -> (Self, Option<T>) {
        match result {
            Ok(value) => (
                Self {
                    step,
                    ok: true,
                    detail: describe(&value),
                    category: None,
                },
                Some(value),
            ),
            Err(err) => (
                Self {
                    step,
                    ok: false,
                    detail: err.to_string(),
                    category: Some(err.category().label()),
                },
                None,
            ),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct MatchLine {
    pub(crate) user: &'static str,
    pub(crate) scheme: String,
    pub(crate) percentage: u8,
    pub(crate) matched_rules: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DemoTranscript {
    pub(crate) matching: Vec<MatchLine>,
    pub(crate) scheme_review: Vec<DemoStep>,
    pub(crate) application_review: Vec<DemoStep>,
    pub(crate) organizer_promotion: Vec<DemoStep>,
}

type Services = WorkflowServices<InMemoryDocumentStore>;

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let transcript = build_transcript()?;
    let rendered = if args.pretty {
        serde_json::to_string_pretty(&transcript)
    } else {
        serde_json::to_string(&transcript)
    }
    .map_err(std::io::Error::other)?;
    println!("{rendered}");
    Ok(())
}

pub(crate) fn build_transcript() -> Result<DemoTranscript, AppError> {
    let store = Arc::new(InMemoryDocumentStore::new());
    seed_demo_users(&store)?;
    let services = WorkflowServices::new(store.clone());

    let organizer = Actor::new(DEMO_ORGANIZER, Role::Organizer);
    let admin = Actor::new(DEMO_ADMIN, Role::Admin);

    let scheme_review = scheme_review(&services, &organizer, &admin);
    let scheme_id = scheme_review
        .1
        .ok_or_else(|| WorkflowError::Validation("demo scheme was not approved".to_string()))?;

    Ok(DemoTranscript {
        matching: matching(&services)?,
        scheme_review: scheme_review.0,
        application_review: application_review(&services, &scheme_id, &organizer),
        organizer_promotion: organizer_promotion(&services, &store, &admin)?,
    })
}

fn youth_rules() -> Result<Vec<Rule>, WorkflowError> {
    let rules = vec![
        Rule::new(RuleField::Age, RuleOperator::Le, RuleValue::number(30.0), 40),
        Rule::new(
            RuleField::Category,
            RuleOperator::In,
            RuleValue::texts(["SC", "ST"]),
            60,
        ),
    ];
    rules
        .into_iter()
        .map(|rule| rule.map_err(|err| WorkflowError::Validation(err.to_string())))
        .collect()
}

fn scheme_details(rules: Vec<Rule>) -> SchemeDetails {
    SchemeDetails {
        name: "Post-matric scholarship for SC/ST students".to_string(),
        description: "Financial assistance for students studying at post-matriculation level"
            .to_string(),
        benefits: "Tuition fee reimbursement and a monthly maintenance allowance".to_string(),
        ministry: "Ministry of Social Justice and Empowerment".to_string(),
        rules,
    }
}

/// Draft, fail submission without rules, add rules, reject, revise, and approve.
fn scheme_review(
    services: &Services,
    organizer: &Actor,
    admin: &Actor,
) -> (Vec<DemoStep>, Option<SchemeId>) {
    let schemes = &services.schemes;
    let mut steps = Vec::new();

    let (step, draft) = DemoStep::record(
        "organizer drafts a scheme",
        schemes.create_scheme(organizer, scheme_details(Vec::new())),
        |scheme| format!("{} is {}", scheme.id, scheme.status),
    );
    steps.push(step);
    let Some(draft) = draft else {
        return (steps, None);
    };
    let id = draft.id;

    let (step, _) = DemoStep::record(
        "organizer submits without rules",
        schemes.submit_scheme(organizer, &id),
        |scheme| scheme.status.to_string(),
    );
    steps.push(step);

    let rules = match youth_rules() {
        Ok(rules) => rules,
        Err(err) => {
            steps.push(DemoStep::record::<()>("build rules", Err(err), |_| String::new()).0);
            return (steps, None);
        }
    };
    let first_rule = rules[..1].to_vec();

    let scripted: Vec<(&'static str, Result<_, WorkflowError>)> = vec![
        (
            "organizer adds an age rule",
            schemes.update_scheme(organizer, &id, scheme_details(first_rule)),
        ),
        (
            "organizer submits for review",
            schemes.submit_scheme(organizer, &id),
        ),
        (
            "admin rejects with remarks",
            schemes.reject_scheme(admin, &id, "incomplete"),
        ),
        (
            "organizer adds a category rule",
            schemes.update_scheme(organizer, &id, scheme_details(rules)),
        ),
        (
            "organizer resubmits",
            schemes.submit_scheme(organizer, &id),
        ),
        (
            "admin approves",
            schemes.approve_scheme(admin, &id, Some("eligible for the FY catalog")),
        ),
    ];

    let mut approved = false;
    for (label, result) in scripted {
        let (step, scheme) = DemoStep::record(label, result, |scheme| {
            format!(
                "status {}, active {}, {} rule(s)",
                scheme.status,
                scheme.active,
                scheme.rules.len()
            )
        });
        approved = scheme.map_or(approved, |scheme| scheme.active);
        steps.push(step);
    }

    (steps, approved.then_some(id))
}

fn matching(services: &Services) -> Result<Vec<MatchLine>, WorkflowError> {
    let mut lines = Vec::new();
    for user in [DEMO_CITIZEN, DEMO_OLDER_CITIZEN, DEMO_GENERAL_CITIZEN] {
        for matched in services
            .eligibility
            .find_matches(&UserId(user.to_string()))?
        {
            lines.push(MatchLine {
                user,
                scheme: matched.scheme.name,
                percentage: matched.percentage,
                matched_rules: matched.matched_rules.iter().map(Rule::describe).collect(),
            });
        }
    }
    Ok(lines)
}

fn demo_submission(scheme: &SchemeId) -> ApplicationSubmission {
    ApplicationSubmission {
        scheme_id: scheme.clone(),
        applicant_details: ApplicantDetails {
            name: "Asha Kumari".to_string(),
            email: "asha.kumari@example.in".to_string(),
            phone: "9876500011".to_string(),
            age: Some(24),
            gender: Some("Female".to_string()),
            category: Some("SC".to_string()),
            state: Some("Kerala".to_string()),
            education: Some("Graduate".to_string()),
            ..ApplicantDetails::default()
        },
        application_data: ApplicationData {
            purpose: "Fees for the postgraduate programme".to_string(),
            ..ApplicationData::default()
        },
        documents: ApplicationDocuments {
            marksheet: "https://files.example.in/asha/degree-marksheet.pdf".to_string(),
            ..ApplicationDocuments::default()
        },
    }
}

/// Apply, apply again, reject without and with a reason, then try to approve.
fn application_review(
    services: &Services,
    scheme: &SchemeId,
    organizer: &Actor,
) -> Vec<DemoStep> {
    let applications = &services.applications;
    let citizen = Actor::new(DEMO_CITIZEN, Role::User);
    let mut steps = Vec::new();

    let (step, application) = DemoStep::record(
        "citizen applies",
        applications.submit_application(&citizen, demo_submission(scheme)),
        |application| format!("{} is {}", application.id, application.status),
    );
    steps.push(step);
    let Some(application) = application else {
        return steps;
    };

    let describe = |application: &schemz::workflows::applications::SchemeApplication| {
        application.status.to_string()
    };
    steps.push(
        DemoStep::record(
            "citizen applies again",
            applications.submit_application(&citizen, demo_submission(scheme)),
            describe,
        )
        .0,
    );
    steps.push(
        DemoStep::record(
            "organizer rejects without a reason",
            applications.reject_application(organizer, &application.id, ""),
            describe,
        )
        .0,
    );
    steps.push(
        DemoStep::record(
            "organizer rejects with a reason",
            applications.reject_application(organizer, &application.id, "documents unclear"),
            describe,
        )
        .0,
    );
    steps.push(
        DemoStep::record(
            "organizer tries to approve afterwards",
            applications.approve_application(organizer, &application.id),
            describe,
        )
        .0,
    );
    steps
}

/// A citizen asks to become an organizer and an admin approves.
fn organizer_promotion(
    services: &Services,
    store: &InMemoryDocumentStore,
    admin: &Actor,
) -> Result<Vec<DemoStep>, AppError> {
    let promotions = &services.promotions;
    let applicant = Actor::new(DEMO_GENERAL_CITIZEN, Role::User);
    let form = PromotionForm {
        organization: "Punjab Skill Development Mission".to_string(),
        designation: "District Coordinator".to_string(),
        reason: "I run skilling camps in three districts and want to publish vocational training schemes."
            .to_string(),
        contact_number: "9876500022".to_string(),
    };

    let mut steps = Vec::new();
    let (step, request) = DemoStep::record(
        "citizen requests organizer access",
        promotions.submit_promotion_request(&applicant, form),
        |request| format!("{} is {}", request.id, request.status),
    );
    steps.push(step);

    if let Some(request) = request {
        steps.push(
            DemoStep::record(
                "admin approves the request",
                promotions.approve_promotion_request(admin, &request.id, None),
                |request| {
                    format!(
                        "{} ({})",
                        request.status,
                        request.remarks.as_deref().unwrap_or_default()
                    )
                },
            )
            .0,
        );
    }

    let role = store
        .role(&applicant.id)?
        .map_or_else(|| "unknown".to_string(), |role| role.to_string());
    steps.push(DemoStep {
        step: "requester's role afterwards",
        ok: true,
        detail: role,
        category: None,
    });
    Ok(steps)
}
