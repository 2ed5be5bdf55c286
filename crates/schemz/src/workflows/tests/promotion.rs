use std::thread;

use super::common::*;
use crate::workflows::identity::{Actor, Role};
use crate::workflows::promotion::{PromotionStatus, DEFAULT_APPROVAL_REMARKS};
use crate::workflows::repository::UserDirectory;
use crate::workflows::ErrorCategory;

#[test]
fn approval_promotes_the_requester() {
    let (store, services) = services();
    let promotions = &services.promotions;

    let request = promotions
        .submit_promotion_request(&citizen(), promotion_form())
        .expect("submitted");
    assert_eq!(request.status, PromotionStatus::Pending);

    let approved = promotions
        .approve_promotion_request(&admin(), &request.id, None)
        .expect("approved");
    assert_eq!(approved.status, PromotionStatus::Approved);
    assert_eq!(approved.remarks.as_deref(), Some(DEFAULT_APPROVAL_REMARKS));
    assert_eq!(approved.reviewed_by, Some(admin().id));
    assert_eq!(
        store.role(&citizen().id).expect("role lookup"),
        Some(Role::Organizer)
    );

    let promoted = Actor::new(CITIZEN, Role::Organizer);
    services
        .schemes
        .create_scheme(&promoted, details("Newly organized", Vec::new()))
        .expect("new organizer can author schemes");
}

#[test]
fn rejection_keeps_the_role_and_allows_a_new_request() {
    let (store, services) = services();
    let promotions = &services.promotions;
    let request = promotions
        .submit_promotion_request(&citizen(), promotion_form())
        .expect("submitted");

    let err = promotions
        .reject_promotion_request(&admin(), &request.id, "")
        .expect_err("remarks required");
    assert_eq!(err.category(), ErrorCategory::ValidationError);

    let rejected = promotions
        .reject_promotion_request(&admin(), &request.id, "please attach an appointment letter")
        .expect("rejected");
    assert_eq!(rejected.status, PromotionStatus::Rejected);
    assert_eq!(
        store.role(&citizen().id).expect("role lookup"),
        Some(Role::User)
    );

    let err = promotions
        .approve_promotion_request(&admin(), &request.id, None)
        .expect_err("terminal");
    assert_eq!(err.category(), ErrorCategory::InvalidTransition);

    promotions
        .submit_promotion_request(&citizen(), promotion_form())
        .expect("a fresh request is allowed after rejection");
    assert_eq!(
        promotions
            .my_promotion_requests(&citizen())
            .expect("mine")
            .len(),
        2
    );
}

#[test]
fn submission_rules() {
    let (_store, services) = services();
    let promotions = &services.promotions;

    let mut short = promotion_form();
    short.reason = "I want to help.".to_string();
    let err = promotions
        .submit_promotion_request(&citizen(), short)
        .expect_err("reason too short");
    assert_eq!(err.category(), ErrorCategory::ValidationError);

    let mut blank = promotion_form();
    blank.designation = "  ".to_string();
    let err = promotions
        .submit_promotion_request(&citizen(), blank)
        .expect_err("designation required");
    assert_eq!(err.category(), ErrorCategory::ValidationError);

    let err = promotions
        .submit_promotion_request(&organizer(), promotion_form())
        .expect_err("already an organizer");
    assert_eq!(err.category(), ErrorCategory::Unauthorized);

    promotions
        .submit_promotion_request(&citizen(), promotion_form())
        .expect("first request");
    let err = promotions
        .submit_promotion_request(&citizen(), promotion_form())
        .expect_err("one pending request per user");
    assert_eq!(err.category(), ErrorCategory::Conflict);
}

#[test]
fn only_admins_review_and_list() {
    let (_store, services) = services();
    let promotions = &services.promotions;
    let request = promotions
        .submit_promotion_request(&citizen(), promotion_form())
        .expect("submitted");

    let err = promotions
        .approve_promotion_request(&organizer(), &request.id, None)
        .expect_err("organizers cannot review");
    assert_eq!(err.category(), ErrorCategory::Unauthorized);
    let err = promotions
        .pending_promotion_requests(&citizen())
        .expect_err("citizens cannot list");
    assert_eq!(err.category(), ErrorCategory::Unauthorized);

    promotions
        .submit_promotion_request(&second_citizen(), promotion_form())
        .expect("second request");
    assert_eq!(
        promotions
            .pending_promotion_requests(&admin())
            .expect("queue")
            .len(),
        2
    );
    assert_eq!(
        promotions
            .all_promotion_requests(&admin(), Some(PromotionStatus::Approved))
            .expect("approved")
            .len(),
        0
    );
}

#[test]
fn role_changed_elsewhere_fails_the_precondition() {
    let (store, services) = services();
    let request = services
        .promotions
        .submit_promotion_request(&citizen(), promotion_form())
        .expect("submitted");

    store
        .register_user(citizen().id, Role::Admin, student_profile())
        .expect("role changed out of band");

    let err = services
        .promotions
        .approve_promotion_request(&admin(), &request.id, Some("welcome"))
        .expect_err("role no longer user");
    assert_eq!(err.category(), ErrorCategory::PreconditionFailed);
    let stored = services
        .promotions
        .get_promotion_request(&request.id)
        .expect("stored");
    assert_eq!(stored.status, PromotionStatus::Pending);
}

#[test]
fn concurrent_approvals_apply_the_grant_once() {
    let (store, services) = services();
    let request = services
        .promotions
        .submit_promotion_request(&citizen(), promotion_form())
        .expect("submitted");

    let outcomes: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    services
                        .promotions
                        .approve_promotion_request(&admin(), &request.id, None)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("approver completes"))
            .collect()
    });

    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    for err in outcomes.iter().filter_map(|outcome| outcome.as_ref().err()) {
        assert!(
            matches!(
                err.category(),
                ErrorCategory::InvalidTransition | ErrorCategory::PreconditionFailed
            ),
            "unexpected error: {err}"
        );
    }
    assert_eq!(
        store.role(&citizen().id).expect("role lookup"),
        Some(Role::Organizer)
    );
}
