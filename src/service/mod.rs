//! Engine plus the verification and relation passes it runs around each statement.

mod engine;
mod relation;
mod validation;
pub use engine::Engine;
pub use relation::{RelationBinding, RelationResolver};
pub use validation::ConstraintVerifier;
