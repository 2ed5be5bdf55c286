use metrics_exporter_prometheus::PrometheusHandle;
use schemz::workflows::eligibility::Profile;
use schemz::workflows::repository::RepositoryError;
use schemz::workflows::{InMemoryDocumentStore, Role, UserId};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) const DEMO_CITIZEN: &str = "citizen-asha";
pub(crate) const DEMO_OLDER_CITIZEN: &str = "citizen-vikram";
pub(crate) const DEMO_GENERAL_CITIZEN: &str = "citizen-meera";
pub(crate) const DEMO_ORGANIZER: &str = "organizer-ravi";
pub(crate) const DEMO_ADMIN: &str = "admin-lakshmi";

fn citizen_profile(age: u32, category: &str, state: &str) -> Profile {
    Profile {
        age: Some(age),
        income: Some(240_000.0),
        category: Some(category.to_string()),
        education: Some("Graduate".to_string()),
        state: Some(state.to_string()),
        gender: Some("Female".to_string()),
        marital_status: Some("Single".to_string()),
        disability: Some("None".to_string()),
        occupation: Some("Student".to_string()),
    }
}

/// Register the demo citizens, organizer, and admin. Returns how many users were written.
pub(crate) fn seed_demo_users(store: &InMemoryDocumentStore) -> Result<usize, RepositoryError> {
    let users = [
        (DEMO_CITIZEN, Role::User, citizen_profile(24, "SC", "Kerala")),
        (
            DEMO_OLDER_CITIZEN,
            Role::User,
            citizen_profile(35, "SC", "Bihar"),
        ),
        (
            DEMO_GENERAL_CITIZEN,
            Role::User,
            citizen_profile(35, "General", "Punjab"),
        ),
        (DEMO_ORGANIZER, Role::Organizer, Profile::default()),
        (DEMO_ADMIN, Role::Admin, Profile::default()),
    ];

    let count = users.len();
    for (id, role, profile) in users {
        store.register_user(UserId(id.to_string()), role, profile)?;
    }
    Ok(count)
}
