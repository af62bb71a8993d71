//! In-memory application store.
//!
//! One `RwLock` guards both the primary map and the (user, job) index so the two can never
//! disagree. The lock is a `std::sync` lock: it is never held across an `.await`, and every
//! critical section is a single map read or write.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::clock::{Clock, SystemClock};
use super::context::RequestContext;
use super::domain::{Application, ApplicationId, ApplicationUpdate, JobId, UserId};
use super::repository::{ApplicationRepository, RepositoryError};
use super::status::ApplicationStatus;

#[derive(Default)]
struct ApplicationIndex {
    records: HashMap<ApplicationId, Application>,
    by_pair: HashMap<(UserId, JobId), ApplicationId>,
}

impl ApplicationIndex {
    fn collect<F>(&self, predicate: F) -> Vec<Application>
    where
        F: Fn(&Application) -> bool,
    {
        let mut matches: Vec<Application> = self
            .records
            .values()
            .filter(|application| predicate(application))
            .cloned()
            .collect();
        matches.sort_by_key(|application| (application.applied_at, application.id));
        matches
    }
}

/// Reference store keeping every application in process memory.
#[derive(Clone)]
pub struct InMemoryApplicationRepository {
    state: Arc<RwLock<ApplicationIndex>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryApplicationRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryApplicationRepository {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::default(),
            clock,
        }
    }

    pub fn len(&self) -> Result<usize, RepositoryError> {
        Ok(self.read()?.records.len())
    }

    pub fn is_empty(&self) -> Result<bool, RepositoryError> {
        Ok(self.read()?.records.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, ApplicationIndex>, RepositoryError> {
        self.state
            .read()
            .map_err(|_| RepositoryError::Unavailable("application store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, ApplicationIndex>, RepositoryError> {
        self.state
            .write()
            .map_err(|_| RepositoryError::Unavailable("application store lock poisoned".into()))
    }
}

fn check_transition(
    current: ApplicationStatus,
    requested: ApplicationStatus,
) -> Result<(), RepositoryError> {
    if current.can_transition_to(requested) {
        Ok(())
    } else {
        Err(RepositoryError::InvalidTransition {
            from: current,
            to: requested,
        })
    }
}

#[async_trait]
impl ApplicationRepository for InMemoryApplicationRepository {
    async fn create(
        &self,
        ctx: &RequestContext,
        mut application: Application,
    ) -> Result<Application, RepositoryError> {
        ctx.ensure_active()?;
        let mut state = self.write()?;

        if application.id.is_nil() {
            application.id = ApplicationId::generate();
        }
        if state.records.contains_key(&application.id) {
            return Err(RepositoryError::AlreadyExists);
        }

        let pair = (application.user_id, application.job_id);
        if state.by_pair.contains_key(&pair) {
            return Err(RepositoryError::DuplicateApplication {
                user_id: application.user_id,
                job_id: application.job_id,
            });
        }

        application.updated_at = self.clock.now().max(application.applied_at);
        state.by_pair.insert(pair, application.id);
        state.records.insert(application.id, application.clone());
        Ok(application)
    }

    async fn get_by_id(
        &self,
        ctx: &RequestContext,
        id: ApplicationId,
    ) -> Result<Application, RepositoryError> {
        ctx.ensure_active()?;
        self.read()?
            .records
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_user_applications(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
    ) -> Result<Vec<Application>, RepositoryError> {
        ctx.ensure_active()?;
        Ok(self
            .read()?
            .collect(|application| application.user_id == user_id))
    }

    async fn get_user_job_application(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
        job_id: JobId,
    ) -> Result<Application, RepositoryError> {
        ctx.ensure_active()?;
        let state = self.read()?;
        state
            .by_pair
            .get(&(user_id, job_id))
            .and_then(|id| state.records.get(id))
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_job_applications(
        &self,
        ctx: &RequestContext,
        job_id: JobId,
    ) -> Result<Vec<Application>, RepositoryError> {
        ctx.ensure_active()?;
        Ok(self
            .read()?
            .collect(|application| application.job_id == job_id))
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        application: Application,
    ) -> Result<(), RepositoryError> {
        ctx.ensure_active()?;
        let now = self.clock.now();
        let mut state = self.write()?;
        let stored = state
            .records
            .get_mut(&application.id)
            .ok_or(RepositoryError::NotFound)?;

        if application.status != stored.status {
            check_transition(stored.status, application.status)?;
        }

        // id, owner, job and applied_at stay as stored.
        stored.status = application.status;
        stored.interview_date = application.interview_date;
        stored.offer_date = application.offer_date;
        stored.follow_up_date = application.follow_up_date;
        stored.notes = application.notes;
        stored.salary_offer = application.salary_offer;
        stored.reminder_sent = application.reminder_sent;
        stored.updated_at = now.max(stored.applied_at);
        Ok(())
    }

    async fn update_fields(
        &self,
        ctx: &RequestContext,
        id: ApplicationId,
        updates: &ApplicationUpdate,
    ) -> Result<Application, RepositoryError> {
        ctx.ensure_active()?;
        let now = self.clock.now();
        let mut state = self.write()?;
        let stored = state
            .records
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;

        updates.apply_to(stored);
        stored.updated_at = now.max(stored.applied_at);
        Ok(stored.clone())
    }

    async fn update_status(
        &self,
        ctx: &RequestContext,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<(), RepositoryError> {
        ctx.ensure_active()?;
        let now = self.clock.now();
        let mut state = self.write()?;
        let stored = state
            .records
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;

        check_transition(stored.status, status)?;
        stored.status = status;
        stored.updated_at = now.max(stored.applied_at);
        Ok(())
    }

    async fn delete(&self, ctx: &RequestContext, id: ApplicationId) -> Result<(), RepositoryError> {
        ctx.ensure_active()?;
        let mut state = self.write()?;
        let removed = state.records.remove(&id).ok_or(RepositoryError::NotFound)?;
        state.by_pair.remove(&(removed.user_id, removed.job_id));
        Ok(())
    }
}
