use async_trait::async_trait;

use super::context::{AbortReason, RequestContext};
use super::domain::{Application, ApplicationId, ApplicationUpdate, JobId, UserId};
use super::status::ApplicationStatus;

/// Storage contract for application records.
///
/// Implementations must make every call atomic on its own and must re-check status
/// legality against the record they hold, not against anything the caller read earlier.
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Persist a new record, assigning an id when the given one is nil.
    async fn create(
        &self,
        ctx: &RequestContext,
        application: Application,
    ) -> Result<Application, RepositoryError>;

    async fn get_by_id(
        &self,
        ctx: &RequestContext,
        id: ApplicationId,
    ) -> Result<Application, RepositoryError>;

    async fn get_user_applications(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
    ) -> Result<Vec<Application>, RepositoryError>;

    async fn get_user_job_application(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
        job_id: JobId,
    ) -> Result<Application, RepositoryError>;

    async fn get_job_applications(
        &self,
        ctx: &RequestContext,
        job_id: JobId,
    ) -> Result<Vec<Application>, RepositoryError>;

    /// Replace the mutable attributes of an existing record.
    async fn update(
        &self,
        ctx: &RequestContext,
        application: Application,
    ) -> Result<(), RepositoryError>;

    /// Apply a partial update to the record as currently stored. Status is left alone.
    async fn update_fields(
        &self,
        ctx: &RequestContext,
        id: ApplicationId,
        updates: &ApplicationUpdate,
    ) -> Result<Application, RepositoryError>;

    async fn update_status(
        &self,
        ctx: &RequestContext,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<(), RepositoryError>;

    async fn delete(&self, ctx: &RequestContext, id: ApplicationId)
        -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("record already exists")]
    AlreadyExists,
    #[error("user {user_id} already has an application for job {job_id}")]
    DuplicateApplication { user_id: UserId, job_id: JobId },
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
    #[error(transparent)]
    Aborted(#[from] AbortReason),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
