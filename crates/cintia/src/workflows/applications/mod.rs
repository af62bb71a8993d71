//! Application lifecycle: the status state machine, the service enforcing creation and
//! update rules, and the storage contract with its in-memory implementation.

pub mod clock;
pub mod context;
pub mod domain;
pub mod lookup;
pub mod memory;
pub mod repository;
pub mod service;
pub mod status;

#[cfg(test)]
mod tests;

pub use clock::{Clock, FixedClock, SystemClock};
pub use context::{AbortReason, RequestContext};
pub use domain::{
    Application, ApplicationId, ApplicationSummary, ApplicationUpdate, CreateApplicationInput,
    FieldUpdate, JobId, UserId,
};
pub use lookup::{JobLookup, JobSnapshot, LookupError, UserLookup, UserProfile};
pub use memory::InMemoryApplicationRepository;
pub use repository::{ApplicationRepository, RepositoryError};
pub use service::{ApplicationService, ApplicationServiceError, ErrorKind};
pub use status::{ApplicationStatus, ParseStatusError};
