//! In-memory job catalog and user directory backing the lifecycle lookups.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::debug;

use super::applications::{
    JobId, JobLookup, JobSnapshot, LookupError, RequestContext, UserId, UserLookup, UserProfile,
};

fn poisoned(name: &str) -> LookupError {
    LookupError::Unavailable(format!("{name} lock poisoned"))
}

/// Job postings known to the process, keyed by id with their active flag.
#[derive(Debug, Default, Clone)]
pub struct InMemoryJobCatalog {
    jobs: Arc<RwLock<HashMap<JobId, bool>>>,
}

impl InMemoryJobCatalog {
    /// Register (or re-register) a job with the given active flag.
    pub fn register(&self, job_id: JobId, is_active: bool) -> Result<(), LookupError> {
        self.jobs
            .write()
            .map_err(|_| poisoned("job catalog"))?
            .insert(job_id, is_active);
        debug!(%job_id, is_active, "job registered");
        Ok(())
    }

    pub fn register_active(&self) -> Result<JobId, LookupError> {
        let job_id = JobId::generate();
        self.register(job_id, true)?;
        Ok(job_id)
    }

    pub fn mark_inactive(&self, job_id: JobId) -> Result<(), LookupError> {
        let mut jobs = self.jobs.write().map_err(|_| poisoned("job catalog"))?;
        let active = jobs.get_mut(&job_id).ok_or(LookupError::NotFound)?;
        *active = false;
        debug!(%job_id, "job marked inactive");
        Ok(())
    }
}

#[async_trait]
impl JobLookup for InMemoryJobCatalog {
    async fn get_job(
        &self,
        ctx: &RequestContext,
        job_id: JobId,
    ) -> Result<JobSnapshot, LookupError> {
        ctx.ensure_active()?;
        let jobs = self.jobs.read().map_err(|_| poisoned("job catalog"))?;
        jobs.get(&job_id)
            .map(|is_active| JobSnapshot {
                id: job_id,
                is_active: *is_active,
            })
            .ok_or(LookupError::NotFound)
    }
}

/// Registered users.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashSet<UserId>>>,
}

impl InMemoryUserDirectory {
    pub fn register(&self, user_id: UserId) -> Result<(), LookupError> {
        self.users
            .write()
            .map_err(|_| poisoned("user directory"))?
            .insert(user_id);
        Ok(())
    }

    pub fn register_new(&self) -> Result<UserId, LookupError> {
        let user_id = UserId::generate();
        self.register(user_id)?;
        Ok(user_id)
    }
}

#[async_trait]
impl UserLookup for InMemoryUserDirectory {
    async fn get_profile(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
    ) -> Result<UserProfile, LookupError> {
        ctx.ensure_active()?;
        let users = self.users.read().map_err(|_| poisoned("user directory"))?;
        if users.contains(&user_id) {
            Ok(UserProfile { id: user_id })
        } else {
            Err(LookupError::NotFound)
        }
    }
}
