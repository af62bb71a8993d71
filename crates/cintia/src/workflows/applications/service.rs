use std::sync::Arc;

use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::context::{AbortReason, RequestContext};
use super::domain::{
    Application, ApplicationId, ApplicationUpdate, CreateApplicationInput, JobId, UserId,
};
use super::lookup::{JobLookup, JobSnapshot, LookupError, UserLookup};
use super::repository::{ApplicationRepository, RepositoryError};
use super::status::{ApplicationStatus, ParseStatusError};

/// Business rules for the application lifecycle.
///
/// Holds only collaborator handles. Every call re-reads the store, so one instance can be
/// shared behind an `Arc` by any number of request handlers.
pub struct ApplicationService<R, J, U> {
    repository: Arc<R>,
    jobs: Arc<J>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<R, J, U> ApplicationService<R, J, U>
where
    R: ApplicationRepository + 'static,
    J: JobLookup + 'static,
    U: UserLookup + 'static,
{
    pub fn new(repository: Arc<R>, jobs: Arc<J>, users: Arc<U>) -> Self {
        Self::with_clock(repository, jobs, users, Arc::new(SystemClock))
    }

    pub fn with_clock(
        repository: Arc<R>,
        jobs: Arc<J>,
        users: Arc<U>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            jobs,
            users,
            clock,
        }
    }

    /// Submit a new application for `user_id`, returning the stored record.
    pub async fn create_application(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
        input: CreateApplicationInput,
    ) -> Result<Application, ApplicationServiceError> {
        let CreateApplicationInput { job_id, notes } = input;
        if job_id.is_nil() {
            return Err(ApplicationServiceError::MissingJobId);
        }

        match self
            .repository
            .get_user_job_application(ctx, user_id, job_id)
            .await
        {
            Ok(existing) => {
                warn!(%user_id, %job_id, application_id = %existing.id, "duplicate application rejected");
                return Err(ApplicationServiceError::AlreadyApplied { user_id, job_id });
            }
            Err(RepositoryError::NotFound) => {}
            Err(other) => return Err(other.into()),
        }

        let job = self.require_job(ctx, job_id).await?;
        if !job.is_active {
            warn!(%user_id, %job_id, "application against inactive job rejected");
            return Err(ApplicationServiceError::JobInactive(job_id));
        }

        let draft = Application::new(user_id, job_id, notes, self.clock.now());
        let stored = self
            .repository
            .create(ctx, draft)
            .await
            .map_err(|err| match err {
                RepositoryError::DuplicateApplication { user_id, job_id } => {
                    warn!(%user_id, %job_id, "concurrent duplicate application rejected");
                    ApplicationServiceError::AlreadyApplied { user_id, job_id }
                }
                other => other.into(),
            })?;

        info!(application_id = %stored.id, %user_id, %job_id, "application created");
        Ok(stored)
    }

    pub async fn get_application_by_id(
        &self,
        ctx: &RequestContext,
        id: ApplicationId,
    ) -> Result<Application, ApplicationServiceError> {
        debug!(application_id = %id, "fetching application");
        self.repository
            .get_by_id(ctx, id)
            .await
            .map_err(|err| not_found_as(err, ApplicationServiceError::ApplicationNotFound(id)))
    }

    /// List a user's applications. Fails for unknown users instead of returning an empty list.
    pub async fn get_user_applications(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
    ) -> Result<Vec<Application>, ApplicationServiceError> {
        ctx.ensure_active()?;
        self.users
            .get_profile(ctx, user_id)
            .await
            .map_err(|err| lookup_failure(err, ApplicationServiceError::UserNotFound(user_id)))?;

        let applications = self.repository.get_user_applications(ctx, user_id).await?;
        debug!(%user_id, count = applications.len(), "listed user applications");
        Ok(applications)
    }

    pub async fn get_job_applications(
        &self,
        ctx: &RequestContext,
        job_id: JobId,
    ) -> Result<Vec<Application>, ApplicationServiceError> {
        self.require_job(ctx, job_id).await?;

        let applications = self.repository.get_job_applications(ctx, job_id).await?;
        debug!(%job_id, count = applications.len(), "listed job applications");
        Ok(applications)
    }

    /// Apply the provided attributes. An update that names no attribute is rejected so
    /// `updated_at` only moves when something changed.
    ///
    /// The patch is applied to the record as stored at write time, so a status change
    /// landing between the read and the write is kept rather than reported as a transition.
    pub async fn update_application(
        &self,
        ctx: &RequestContext,
        id: ApplicationId,
        updates: ApplicationUpdate,
    ) -> Result<(), ApplicationServiceError> {
        self.get_application_by_id(ctx, id).await?;

        if updates.is_empty() {
            return Err(ApplicationServiceError::NoFieldsToUpdate);
        }

        self.repository
            .update_fields(ctx, id, &updates)
            .await
            .map_err(|err| not_found_as(err, ApplicationServiceError::ApplicationNotFound(id)))?;

        debug!(application_id = %id, "application fields updated");
        Ok(())
    }

    /// Move an application to `status` if the lifecycle allows it.
    pub async fn update_application_status(
        &self,
        ctx: &RequestContext,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<(), ApplicationServiceError> {
        let application = self.get_application_by_id(ctx, id).await?;
        let from = application.status;

        if !application.can_transition_to(status) {
            warn!(application_id = %id, %from, to = %status, "status transition rejected");
            return Err(ApplicationServiceError::InvalidTransition { from, to: status });
        }

        self.repository
            .update_status(ctx, id, status)
            .await
            .map_err(|err| match err {
                RepositoryError::InvalidTransition { from, to } => {
                    warn!(application_id = %id, %from, %to, "status changed concurrently");
                    ApplicationServiceError::InvalidTransition { from, to }
                }
                other => not_found_as(other, ApplicationServiceError::ApplicationNotFound(id)),
            })?;

        info!(application_id = %id, %from, to = %status, "application status updated");
        Ok(())
    }

    /// Same as [`Self::update_application_status`] for a status label supplied from outside.
    pub async fn update_application_status_label(
        &self,
        ctx: &RequestContext,
        id: ApplicationId,
        label: &str,
    ) -> Result<(), ApplicationServiceError> {
        let status: ApplicationStatus = label.parse()?;
        self.update_application_status(ctx, id, status).await
    }

    pub async fn delete(
        &self,
        ctx: &RequestContext,
        id: ApplicationId,
    ) -> Result<(), ApplicationServiceError> {
        self.get_application_by_id(ctx, id).await?;

        self.repository
            .delete(ctx, id)
            .await
            .map_err(|err| not_found_as(err, ApplicationServiceError::ApplicationNotFound(id)))?;

        info!(application_id = %id, "application deleted");
        Ok(())
    }

    async fn require_job(
        &self,
        ctx: &RequestContext,
        job_id: JobId,
    ) -> Result<JobSnapshot, ApplicationServiceError> {
        ctx.ensure_active()?;
        self.jobs
            .get_job(ctx, job_id)
            .await
            .map_err(|err| lookup_failure(err, ApplicationServiceError::JobNotFound(job_id)))
    }
}

fn not_found_as(err: RepositoryError, not_found: ApplicationServiceError) -> ApplicationServiceError {
    match err {
        RepositoryError::NotFound => not_found,
        other => other.into(),
    }
}

fn lookup_failure(err: LookupError, not_found: ApplicationServiceError) -> ApplicationServiceError {
    match err {
        LookupError::NotFound => not_found,
        LookupError::Aborted(reason) => ApplicationServiceError::Aborted(reason),
        other => ApplicationServiceError::Lookup(other),
    }
}

/// Error raised by the application service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error("job_id is required")]
    MissingJobId,
    #[error("user {user_id} already applied to job {job_id}")]
    AlreadyApplied { user_id: UserId, job_id: JobId },
    #[error("job {0} not found")]
    JobNotFound(JobId),
    #[error("job {0} is inactive")]
    JobInactive(JobId),
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("application {0} not found")]
    ApplicationNotFound(ApplicationId),
    #[error("nothing to update")]
    NoFieldsToUpdate,
    #[error("invalid status '{0}'")]
    InvalidStatus(String),
    #[error("cannot transition from {from} to {to}")]
    InvalidTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
    #[error(transparent)]
    Aborted(AbortReason),
    #[error(transparent)]
    Repository(RepositoryError),
    #[error(transparent)]
    Lookup(LookupError),
}

/// Coarse classification callers use to pick a response and a retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    BusinessRule,
    Aborted,
    Infrastructure,
}

impl ErrorKind {
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Aborted | Self::Infrastructure)
    }
}

impl ApplicationServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingJobId | Self::NoFieldsToUpdate | Self::InvalidStatus(_) => {
                ErrorKind::Validation
            }
            Self::AlreadyApplied { .. } => ErrorKind::Conflict,
            Self::JobNotFound(_) | Self::UserNotFound(_) | Self::ApplicationNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::JobInactive(_) | Self::InvalidTransition { .. } => ErrorKind::BusinessRule,
            Self::Aborted(_) => ErrorKind::Aborted,
            Self::Repository(err) => match err {
                RepositoryError::NotFound => ErrorKind::NotFound,
                RepositoryError::AlreadyExists | RepositoryError::DuplicateApplication { .. } => {
                    ErrorKind::Conflict
                }
                RepositoryError::InvalidTransition { .. } => ErrorKind::BusinessRule,
                RepositoryError::Aborted(_) => ErrorKind::Aborted,
                RepositoryError::Unavailable(_) => ErrorKind::Infrastructure,
            },
            Self::Lookup(err) => match err {
                LookupError::NotFound => ErrorKind::NotFound,
                LookupError::Aborted(_) => ErrorKind::Aborted,
                LookupError::Unavailable(_) => ErrorKind::Infrastructure,
            },
        }
    }
}

impl From<AbortReason> for ApplicationServiceError {
    fn from(reason: AbortReason) -> Self {
        warn!(%reason, "operation aborted");
        Self::Aborted(reason)
    }
}

impl From<RepositoryError> for ApplicationServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Aborted(reason) => reason.into(),
            RepositoryError::InvalidTransition { from, to } => Self::InvalidTransition { from, to },
            other => Self::Repository(other),
        }
    }
}

impl From<ParseStatusError> for ApplicationServiceError {
    fn from(err: ParseStatusError) -> Self {
        Self::InvalidStatus(err.0)
    }
}
