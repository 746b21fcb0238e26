//! Insight-driven marketing creative pipeline.
//!
//! A [`pipeline::Pipeline`] classifies a task, optionally gathers data and
//! insights, generates creative variants with the
//! [`creative::CreativeEngine`] and scores them.

pub mod creative;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod planner;
pub mod sources;
pub mod stage;
