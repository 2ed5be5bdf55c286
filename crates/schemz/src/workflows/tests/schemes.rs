use std::thread;

use super::common::*;
use crate::workflows::eligibility::{RuleField, RuleOperator, RuleValue};
use crate::workflows::identity::{Actor, Role, UserId};
use crate::workflows::repository::{RepositoryError, SchemeFilter, SchemeRepository};
use crate::workflows::schemes::{Scheme, SchemeId, SchemeStatus};
use crate::workflows::{ErrorCategory, InMemoryDocumentStore, WorkflowError, WorkflowServices};

fn assert_category<T: std::fmt::Debug>(result: Result<T, WorkflowError>, expected: ErrorCategory) {
    match result {
        Err(err) => assert_eq!(err.category(), expected, "unexpected error: {err}"),
        Ok(value) => panic!("expected {expected:?}, got {value:?}"),
    }
}

#[test]
fn review_cycle_from_draft_to_approved() {
    let (_store, services) = services();
    let schemes = &services.schemes;

    let draft = schemes
        .create_scheme(&organizer(), details("Merit scholarship", Vec::new()))
        .expect("draft created");
    assert_eq!(draft.status, SchemeStatus::Draft);
    assert!(!draft.active);

    assert_category(
        schemes.submit_scheme(&organizer(), &draft.id),
        ErrorCategory::ValidationError,
    );

    let revised = schemes
        .update_scheme(
            &organizer(),
            &draft.id,
            details(
                "Merit scholarship",
                vec![rule(RuleField::Age, RuleOperator::Le, RuleValue::number(30.0), 40)],
            ),
        )
        .expect("rules added");
    assert_eq!(revised.rules.len(), 1);

    let pending = schemes
        .submit_scheme(&organizer(), &draft.id)
        .expect("submitted");
    assert_eq!(pending.status, SchemeStatus::Pending);

    let rejected = schemes
        .reject_scheme(&admin(), &draft.id, "incomplete")
        .expect("rejected");
    assert_eq!(rejected.status, SchemeStatus::Rejected);
    assert_eq!(rejected.remarks, "incomplete");
    assert!(!rejected.active);

    schemes
        .update_scheme(
            &organizer(),
            &draft.id,
            details("Merit scholarship (revised)", youth_rules()),
        )
        .expect("rejected schemes are editable");
    let resubmitted = schemes
        .submit_scheme(&organizer(), &draft.id)
        .expect("resubmitted");
    assert_eq!(resubmitted.status, SchemeStatus::Pending);
    assert!(resubmitted.remarks.is_empty());

    let approved = schemes
        .approve_scheme(&admin(), &draft.id, Some("looks good"))
        .expect("approved");
    assert_eq!(approved.status, SchemeStatus::Approved);
    assert!(approved.active);
    assert_eq!(approved.approved_by, Some(admin().id));
    assert_eq!(approved.name, "Merit scholarship (revised)");
    assert_eq!(approved.revision, 6);
}

#[test]
fn illegal_transitions_are_rejected() {
    let (_store, services) = services();
    let schemes = &services.schemes;
    let approved = approved_scheme(&services, "Approved scheme", youth_rules());

    assert_category(
        schemes.submit_scheme(&organizer(), &approved.id),
        ErrorCategory::InvalidTransition,
    );
    assert_category(
        schemes.approve_scheme(&admin(), &approved.id, None),
        ErrorCategory::InvalidTransition,
    );
    assert_category(
        schemes.reject_scheme(&admin(), &approved.id, "too late"),
        ErrorCategory::InvalidTransition,
    );
    assert_category(
        schemes.update_scheme(&organizer(), &approved.id, details("Edit", youth_rules())),
        ErrorCategory::InvalidTransition,
    );
    assert_category(
        schemes.delete_scheme(&organizer(), &approved.id),
        ErrorCategory::InvalidTransition,
    );

    let draft = schemes
        .create_scheme(&organizer(), details("Draft", youth_rules()))
        .expect("draft");
    assert_category(
        schemes.toggle_scheme_active(&admin(), &draft.id),
        ErrorCategory::InvalidTransition,
    );
    assert_category(
        schemes.approve_scheme(&admin(), &draft.id, None),
        ErrorCategory::InvalidTransition,
    );
}

#[test]
fn rejection_requires_remarks() {
    let (_store, services) = services();
    let draft = services
        .schemes
        .create_scheme(&organizer(), details("Scheme", youth_rules()))
        .expect("draft");
    services
        .schemes
        .submit_scheme(&organizer(), &draft.id)
        .expect("submitted");

    assert_category(
        services.schemes.reject_scheme(&admin(), &draft.id, "   "),
        ErrorCategory::ValidationError,
    );
    let still_pending = services.schemes.get_scheme(&draft.id).expect("exists");
    assert_eq!(still_pending.status, SchemeStatus::Pending);
}

#[test]
fn toggle_flips_visibility_of_approved_schemes() {
    let (_store, services) = services();
    let approved = approved_scheme(&services, "Scheme", youth_rules());

    let hidden = services
        .schemes
        .toggle_scheme_active(&admin(), &approved.id)
        .expect("deactivated");
    assert!(!hidden.active);
    assert!(services.schemes.catalog().expect("catalog").is_empty());

    let shown = services
        .schemes
        .toggle_scheme_active(&admin(), &approved.id)
        .expect("reactivated");
    assert!(shown.active);
    assert_eq!(services.schemes.catalog().expect("catalog").len(), 1);
}

#[test]
fn only_the_owner_may_mutate_and_only_admins_review() {
    let (_store, services) = services();
    let schemes = &services.schemes;
    let draft = schemes
        .create_scheme(&organizer(), details("Scheme", youth_rules()))
        .expect("draft");

    assert_category(
        schemes.update_scheme(&other_organizer(), &draft.id, details("Hijack", youth_rules())),
        ErrorCategory::Unauthorized,
    );
    assert_category(
        schemes.submit_scheme(&other_organizer(), &draft.id),
        ErrorCategory::Unauthorized,
    );
    assert_category(
        schemes.delete_scheme(&other_organizer(), &draft.id),
        ErrorCategory::Unauthorized,
    );

    schemes
        .submit_scheme(&organizer(), &draft.id)
        .expect("submitted");
    assert_category(
        schemes.approve_scheme(&organizer(), &draft.id, None),
        ErrorCategory::Unauthorized,
    );
    assert_category(
        schemes.toggle_scheme_active(&citizen(), &draft.id),
        ErrorCategory::Unauthorized,
    );
    assert_category(
        schemes.create_scheme(&citizen(), details("Citizen scheme", Vec::new())),
        ErrorCategory::Unauthorized,
    );
}

#[test]
fn drafts_can_be_deleted() {
    let (_store, services) = services();
    let draft = services
        .schemes
        .create_scheme(&organizer(), details("Scheme", Vec::new()))
        .expect("draft");

    services
        .schemes
        .delete_scheme(&organizer(), &draft.id)
        .expect("deleted");
    assert_category(
        services.schemes.get_scheme(&draft.id),
        ErrorCategory::NotFound,
    );
}

#[test]
fn invalid_details_are_rejected_at_authoring_time() {
    let (_store, services) = services();

    let mut blank = details("   ", Vec::new());
    blank.ministry = String::new();
    assert_category(
        services.schemes.create_scheme(&organizer(), blank),
        ErrorCategory::ValidationError,
    );

    let mut bad_rule = youth_rules();
    bad_rule[0].weight = 0;
    assert_category(
        services
            .schemes
            .create_scheme(&organizer(), details("Scheme", bad_rule)),
        ErrorCategory::ValidationError,
    );

    let mut text_age = youth_rules();
    text_age[0].value = RuleValue::text("30");
    let created = services
        .schemes
        .create_scheme(&organizer(), details("Scheme", text_age))
        .expect("numeric text is accepted");
    assert_eq!(created.rules[0].value, RuleValue::number(30.0));
}

#[test]
fn listings_are_scoped_to_the_caller() {
    let (_store, services) = services();
    approved_scheme(&services, "Approved", youth_rules());
    let pending = services
        .schemes
        .create_scheme(&organizer(), details("Pending", youth_rules()))
        .expect("draft");
    services
        .schemes
        .submit_scheme(&organizer(), &pending.id)
        .expect("submitted");
    services
        .schemes
        .create_scheme(&other_organizer(), details("Someone else's", Vec::new()))
        .expect("draft");

    let mine = services
        .schemes
        .organizer_schemes(&organizer())
        .expect("listed");
    assert_eq!(mine.len(), 2);

    let queue = services
        .schemes
        .pending_schemes(&admin())
        .expect("pending queue");
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, pending.id);

    assert_eq!(
        services
            .schemes
            .admin_schemes(&admin(), None)
            .expect("all")
            .len(),
        3
    );
    assert_category(
        services.schemes.admin_schemes(&organizer(), None),
        ErrorCategory::Unauthorized,
    );
}

#[test]
fn unknown_scheme_is_not_found() {
    let (_store, services) = services();
    let missing = SchemeId("scheme-missing".to_string());
    assert_category(
        services
            .schemes
            .approve_scheme(&Actor::new(ADMIN, Role::Admin), &missing, None),
        ErrorCategory::NotFound,
    );
}

fn pending_scheme(services: &WorkflowServices<InMemoryDocumentStore>) -> Scheme {
    let draft = services
        .schemes
        .create_scheme(&organizer(), details("Hostel grant", youth_rules()))
        .expect("draft created");
    services
        .schemes
        .submit_scheme(&organizer(), &draft.id)
        .expect("submitted")
}

#[test]
fn concurrent_scheme_reviews_decide_once() {
    for _ in 0..16 {
        let (_store, services) = services();
        let pending = pending_scheme(&services);

        let (approve, reject) = thread::scope(|scope| {
            let approve = scope.spawn(|| {
                services
                    .schemes
                    .approve_scheme(&admin(), &pending.id, Some("looks good"))
            });
            let reject = scope.spawn(|| {
                services
                    .schemes
                    .reject_scheme(&admin(), &pending.id, "benefit amount unclear")
            });
            (
                approve.join().expect("approver completes"),
                reject.join().expect("rejecter completes"),
            )
        });

        assert!(approve.is_ok() ^ reject.is_ok(), "exactly one review wins");
        let winner = approve
            .as_ref()
            .or(reject.as_ref())
            .expect("one review won")
            .clone();
        let loser = approve.err().or(reject.err()).expect("one review lost");
        assert_eq!(loser.category(), ErrorCategory::InvalidTransition);

        let stored = services.schemes.get_scheme(&pending.id).expect("stored");
        assert_eq!(stored.status, winner.status);
        assert_eq!(stored.revision, pending.revision + 1);
    }
}

#[test]
fn stale_scheme_write_surfaces_as_invalid_transition() {
    let (store, services) = services();
    let pending = pending_scheme(&services);
    let stale_revision = pending.revision;

    services
        .schemes
        .approve_scheme(&admin(), &pending.id, None)
        .expect("approved");

    let mut late = pending.clone();
    late.reject("arrived after approval").expect("pending scheme rejects");
    match store.update_scheme(late, stale_revision) {
        Err(RepositoryError::StaleWrite { found }) => assert_eq!(found, "approved"),
        other => panic!("expected a stale write, got {other:?}"),
    }

    assert_category(
        services
            .schemes
            .reject_scheme(&admin(), &pending.id, "arrived after approval"),
        ErrorCategory::InvalidTransition,
    );
    let stored = services.schemes.get_scheme(&pending.id).expect("stored");
    assert_eq!(stored.status, SchemeStatus::Approved);
}

#[test]
fn listing_follows_creation_order_past_padded_ids() {
    let store = store();
    let owner = UserId(ORGANIZER.to_string());
    for id in ["scheme-1000000", "scheme-100001", "scheme-999999"] {
        let scheme = Scheme::draft(
            SchemeId(id.to_string()),
            owner.clone(),
            details(id, Vec::new()),
        )
        .expect("draft");
        store.insert_scheme(scheme).expect("inserted");
    }

    let listed: Vec<String> = store
        .list_schemes(&SchemeFilter::default())
        .expect("listed")
        .into_iter()
        .map(|scheme| scheme.id.0)
        .collect();
    assert_eq!(listed, ["scheme-1000000", "scheme-100001", "scheme-999999"]);
}
