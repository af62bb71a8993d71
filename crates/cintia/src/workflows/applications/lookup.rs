use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::context::{AbortReason, RequestContext};
use super::domain::{JobId, UserId};

/// The slice of a job posting the lifecycle needs to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: JobId,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Aborted(#[from] AbortReason),
    #[error("lookup unavailable: {0}")]
    Unavailable(String),
}

/// Read access to the job catalog.
#[async_trait]
pub trait JobLookup: Send + Sync {
    async fn get_job(&self, ctx: &RequestContext, job_id: JobId)
        -> Result<JobSnapshot, LookupError>;
}

/// Read access to the user directory.
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn get_profile(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
    ) -> Result<UserProfile, LookupError>;
}
