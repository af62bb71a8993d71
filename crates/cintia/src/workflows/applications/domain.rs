use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::ApplicationStatus;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// The nil identifier stands for "not provided".
            pub const fn nil() -> Self {
                Self(Uuid::nil())
            }

            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(raw.trim()).map(Self)
            }
        }
    };
}

uuid_identifier!(
    /// Identifier of a stored application. Assigned once, never reused.
    ApplicationId
);
uuid_identifier!(
    /// Identifier of a registered user, owned by the user directory.
    UserId
);
uuid_identifier!(
    /// Identifier of a job posting, owned by the job catalog.
    JobId
);

/// One user's application to one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub user_id: UserId,
    pub job_id: JobId,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interview_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_offer: Option<String>,
    #[serde(default)]
    pub reminder_sent: bool,
}

impl Application {
    /// Draft a fresh `applied` record. The id stays nil until the store assigns one.
    pub fn new(
        user_id: UserId,
        job_id: JobId,
        notes: Option<String>,
        applied_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ApplicationId::nil(),
            user_id,
            job_id,
            status: ApplicationStatus::Applied,
            applied_at,
            updated_at: applied_at,
            interview_date: None,
            offer_date: None,
            follow_up_date: None,
            notes: normalize_text(notes),
            salary_offer: None,
            reminder_sent: false,
        }
    }

    pub fn can_transition_to(&self, requested: ApplicationStatus) -> bool {
        self.status.can_transition_to(requested)
    }

    pub fn summary(&self) -> ApplicationSummary {
        ApplicationSummary {
            id: self.id,
            job_id: self.job_id,
            status: self.status.label(),
            notes: self.notes.clone(),
            applied_at: self.applied_at,
            updated_at: self.updated_at,
            interview_date: self.interview_date,
            offer_date: self.offer_date,
            follow_up_date: self.follow_up_date,
        }
    }
}

/// Compact list view of an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationSummary {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub interview_date: Option<DateTime<Utc>>,
    pub offer_date: Option<DateTime<Utc>>,
    pub follow_up_date: Option<DateTime<Utc>>,
}

/// Caller intent for a new application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateApplicationInput {
    pub job_id: JobId,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateApplicationInput {
    pub fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Presence-aware update for a single attribute.
///
/// `Clear` resets an optional attribute to absent; on `reminder_sent` it resets the flag
/// to `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    Unchanged,
    Set(T),
    Clear,
}

impl<T> Default for FieldUpdate<T> {
    fn default() -> Self {
        Self::Unchanged
    }
}

impl<T> FieldUpdate<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}

impl<T: Clone> FieldUpdate<T> {
    fn apply(&self, slot: &mut Option<T>) {
        match self {
            Self::Unchanged => {}
            Self::Set(value) => *slot = Some(value.clone()),
            Self::Clear => *slot = None,
        }
    }
}

/// Partial update of the non-status attributes of an application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationUpdate {
    pub interview_date: FieldUpdate<DateTime<Utc>>,
    pub offer_date: FieldUpdate<DateTime<Utc>>,
    pub follow_up_date: FieldUpdate<DateTime<Utc>>,
    pub notes: FieldUpdate<String>,
    pub salary_offer: FieldUpdate<String>,
    pub reminder_sent: FieldUpdate<bool>,
}

impl ApplicationUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interview_date(mut self, value: DateTime<Utc>) -> Self {
        self.interview_date = FieldUpdate::Set(value);
        self
    }

    pub fn offer_date(mut self, value: DateTime<Utc>) -> Self {
        self.offer_date = FieldUpdate::Set(value);
        self
    }

    pub fn follow_up_date(mut self, value: DateTime<Utc>) -> Self {
        self.follow_up_date = FieldUpdate::Set(value);
        self
    }

    pub fn notes(mut self, value: impl Into<String>) -> Self {
        self.notes = FieldUpdate::Set(value.into());
        self
    }

    pub fn salary_offer(mut self, value: impl Into<String>) -> Self {
        self.salary_offer = FieldUpdate::Set(value.into());
        self
    }

    pub fn reminder_sent(mut self, value: bool) -> Self {
        self.reminder_sent = FieldUpdate::Set(value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.interview_date.is_unchanged()
            && self.offer_date.is_unchanged()
            && self.follow_up_date.is_unchanged()
            && self.notes.is_unchanged()
            && self.salary_offer.is_unchanged()
            && self.reminder_sent.is_unchanged()
    }

    /// Write every provided attribute into `application`. Status and timestamps are untouched.
    pub fn apply_to(&self, application: &mut Application) {
        self.interview_date.apply(&mut application.interview_date);
        self.offer_date.apply(&mut application.offer_date);
        self.follow_up_date.apply(&mut application.follow_up_date);
        self.notes.apply(&mut application.notes);
        self.salary_offer.apply(&mut application.salary_offer);
        match self.reminder_sent {
            FieldUpdate::Unchanged => {}
            FieldUpdate::Set(value) => application.reminder_sent = value,
            FieldUpdate::Clear => application.reminder_sent = false,
        }
    }
}

fn normalize_text(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}
