//! A conflict-driven clause-learning solver for boolean satisfiability.
//!
//! The entry point is [`engine::SatisfactionSolver`]: create variables, add
//! clauses, and call solve with a termination condition from
//! [`engine::termination`] and an optional list of assumption literals.

pub mod asserts;
pub mod basic_types;
pub mod engine;
pub(crate) mod propagators;
