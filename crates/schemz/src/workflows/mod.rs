//! Scheme authoring, citizen applications, organizer promotion, and eligibility matching.
//!
//! Each area follows the same shape: a `domain` module with the entity and its identifiers,
//! a `lifecycle` module holding the pure state machine, and a `service` that authorizes the
//! caller, drives the lifecycle, and persists through the store traits in [`repository`]
//! with a compare-and-swap on the prior state.

pub mod applications;
pub mod eligibility;
mod error;
pub mod identity;
pub mod promotion;
pub mod repository;
pub mod router;
pub mod schemes;
pub mod store;

#[cfg(test)]
mod tests;

pub use error::{EntityKind, ErrorCategory, WorkflowError};
pub use identity::{Actor, Role, UserId};
pub use router::{workflow_router, WorkflowServices};
pub use store::InMemoryDocumentStore;
