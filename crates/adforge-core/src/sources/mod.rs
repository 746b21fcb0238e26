//! Reference implementations of the external stage collaborators.
//!
//! These stand in for real data access, analytics and scoring so the
//! pipeline can run end to end without live systems.

pub mod evaluator;
pub mod fixture;
pub mod insights;

pub use evaluator::HeuristicEvaluator;
pub use fixture::FixtureDataSource;
pub use insights::PrecomputedInsightSource;
