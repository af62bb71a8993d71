//! Job application tracking core.
//!
//! Users apply to job postings and each application moves through a fixed lifecycle
//! (applied, interviewing, offer, then accepted or rejected). The [`workflows::applications`]
//! module owns the lifecycle rules and the concurrent store; [`workflows::directory`] provides
//! in-memory job and user lookups for embedding and tests.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
