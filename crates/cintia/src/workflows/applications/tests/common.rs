use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::workflows::applications::{
    Application, ApplicationId, ApplicationRepository, ApplicationService, ApplicationUpdate,
    CreateApplicationInput,
    FixedClock, InMemoryApplicationRepository, JobId, JobLookup, JobSnapshot, LookupError,
    RepositoryError, RequestContext, UserId,
};
use crate::workflows::applications::status::ApplicationStatus;
use crate::workflows::directory::{InMemoryJobCatalog, InMemoryUserDirectory};

pub(super) type MemoryService =
    ApplicationService<InMemoryApplicationRepository, InMemoryJobCatalog, InMemoryUserDirectory>;

pub(super) fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn ctx() -> RequestContext {
    RequestContext::background()
}

pub(super) struct Harness {
    pub(super) service: Arc<MemoryService>,
    pub(super) repository: Arc<InMemoryApplicationRepository>,
    pub(super) jobs: Arc<InMemoryJobCatalog>,
    pub(super) users: Arc<InMemoryUserDirectory>,
    pub(super) clock: Arc<FixedClock>,
    pub(super) user_id: UserId,
    pub(super) job_id: JobId,
}

impl Harness {
    pub(super) async fn apply(&self) -> Application {
        self.service
            .create_application(&ctx(), self.user_id, CreateApplicationInput::new(self.job_id))
            .await
            .expect("application created")
    }

    pub(super) async fn stored(&self, id: ApplicationId) -> Application {
        self.repository
            .get_by_id(&ctx(), id)
            .await
            .expect("record present")
    }
}

/// Service over in-memory collaborators with one registered user and one active job.
pub(super) fn harness() -> Harness {
    let clock = Arc::new(FixedClock::new(epoch()));
    let repository = Arc::new(InMemoryApplicationRepository::with_clock(clock.clone()));
    let jobs = Arc::new(InMemoryJobCatalog::default());
    let users = Arc::new(InMemoryUserDirectory::default());
    let user_id = users.register_new().expect("register user");
    let job_id = jobs.register_active().expect("register job");
    let service = Arc::new(ApplicationService::with_clock(
        repository.clone(),
        jobs.clone(),
        users.clone(),
        clock.clone(),
    ));

    Harness {
        service,
        repository,
        jobs,
        users,
        clock,
        user_id,
        job_id,
    }
}

pub(super) fn draft(user_id: UserId, job_id: JobId) -> Application {
    Application::new(user_id, job_id, Some("referral".to_string()), epoch())
}

/// Job lookup that cancels the caller's context while answering, simulating a caller
/// giving up between the lookup and the store write.
pub(super) struct CancellingJobLookup;

#[async_trait]
impl JobLookup for CancellingJobLookup {
    async fn get_job(
        &self,
        ctx: &RequestContext,
        job_id: JobId,
    ) -> Result<JobSnapshot, LookupError> {
        ctx.cancel();
        Ok(JobSnapshot {
            id: job_id,
            is_active: true,
        })
    }
}

pub(super) struct UnavailableJobLookup;

#[async_trait]
impl JobLookup for UnavailableJobLookup {
    async fn get_job(
        &self,
        _ctx: &RequestContext,
        _job_id: JobId,
    ) -> Result<JobSnapshot, LookupError> {
        Err(LookupError::Unavailable("catalog offline".to_string()))
    }
}

/// Repository that serves reads from an inner store but reports every write target as
/// already moved on, as if another writer won the race.
pub(super) struct RacingRepository {
    pub(super) inner: InMemoryApplicationRepository,
    pub(super) status_writes: AtomicUsize,
}

impl RacingRepository {
    pub(super) fn new(inner: InMemoryApplicationRepository) -> Self {
        Self {
            inner,
            status_writes: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ApplicationRepository for RacingRepository {
    async fn create(
        &self,
        ctx: &RequestContext,
        application: Application,
    ) -> Result<Application, RepositoryError> {
        self.inner.create(ctx, application).await
    }

    async fn get_by_id(
        &self,
        ctx: &RequestContext,
        id: ApplicationId,
    ) -> Result<Application, RepositoryError> {
        self.inner.get_by_id(ctx, id).await
    }

    async fn get_user_applications(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
    ) -> Result<Vec<Application>, RepositoryError> {
        self.inner.get_user_applications(ctx, user_id).await
    }

    async fn get_user_job_application(
        &self,
        _ctx: &RequestContext,
        _user_id: UserId,
        _job_id: JobId,
    ) -> Result<Application, RepositoryError> {
        // Pretend the pre-check saw nothing so only the store can catch duplicates.
        Err(RepositoryError::NotFound)
    }

    async fn get_job_applications(
        &self,
        ctx: &RequestContext,
        job_id: JobId,
    ) -> Result<Vec<Application>, RepositoryError> {
        self.inner.get_job_applications(ctx, job_id).await
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        application: Application,
    ) -> Result<(), RepositoryError> {
        self.inner.update(ctx, application).await
    }

    async fn update_fields(
        &self,
        ctx: &RequestContext,
        id: ApplicationId,
        updates: &ApplicationUpdate,
    ) -> Result<Application, RepositoryError> {
        self.inner.update_fields(ctx, id, updates).await
    }

    async fn update_status(
        &self,
        _ctx: &RequestContext,
        _id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<(), RepositoryError> {
        self.status_writes.fetch_add(1, Ordering::SeqCst);
        Err(RepositoryError::InvalidTransition {
            from: ApplicationStatus::Rejected,
            to: status,
        })
    }

    async fn delete(&self, ctx: &RequestContext, id: ApplicationId) -> Result<(), RepositoryError> {
        self.inner.delete(ctx, id).await
    }
}

/// Repository that lets another writer move a record to `interviewing` right after the
/// first `get_by_id` hands out its snapshot.
pub(super) struct ShiftingRepository {
    pub(super) inner: InMemoryApplicationRepository,
    shifted: AtomicBool,
}

impl ShiftingRepository {
    pub(super) fn new(inner: InMemoryApplicationRepository) -> Self {
        Self {
            inner,
            shifted: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ApplicationRepository for ShiftingRepository {
    async fn create(
        &self,
        ctx: &RequestContext,
        application: Application,
    ) -> Result<Application, RepositoryError> {
        self.inner.create(ctx, application).await
    }

    async fn get_by_id(
        &self,
        ctx: &RequestContext,
        id: ApplicationId,
    ) -> Result<Application, RepositoryError> {
        let snapshot = self.inner.get_by_id(ctx, id).await?;
        if !self.shifted.swap(true, Ordering::SeqCst) {
            self.inner
                .update_status(ctx, id, ApplicationStatus::Interviewing)
                .await?;
        }
        Ok(snapshot)
    }

    async fn get_user_applications(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
    ) -> Result<Vec<Application>, RepositoryError> {
        self.inner.get_user_applications(ctx, user_id).await
    }

    async fn get_user_job_application(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
        job_id: JobId,
    ) -> Result<Application, RepositoryError> {
        self.inner.get_user_job_application(ctx, user_id, job_id).await
    }

    async fn get_job_applications(
        &self,
        ctx: &RequestContext,
        job_id: JobId,
    ) -> Result<Vec<Application>, RepositoryError> {
        self.inner.get_job_applications(ctx, job_id).await
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        application: Application,
    ) -> Result<(), RepositoryError> {
        self.inner.update(ctx, application).await
    }

    async fn update_fields(
        &self,
        ctx: &RequestContext,
        id: ApplicationId,
        updates: &ApplicationUpdate,
    ) -> Result<Application, RepositoryError> {
        self.inner.update_fields(ctx, id, updates).await
    }

    async fn update_status(
        &self,
        ctx: &RequestContext,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<(), RepositoryError> {
        self.inner.update_status(ctx, id, status).await
    }

    async fn delete(&self, ctx: &RequestContext, id: ApplicationId) -> Result<(), RepositoryError> {
        self.inner.delete(ctx, id).await
    }
}
