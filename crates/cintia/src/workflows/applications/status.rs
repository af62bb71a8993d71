use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of an application.
///
/// ```text
/// applied ──► interviewing ──► offer ──► accepted
///    │             │             │
///    └─────────────┴─────────────┴─────► rejected
/// ```
///
/// `accepted` and `rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Applied,
    Interviewing,
    Offer,
    Rejected,
    Accepted,
}

impl ApplicationStatus {
    pub const ALL: [Self; 5] = [
        Self::Applied,
        Self::Interviewing,
        Self::Offer,
        Self::Rejected,
        Self::Accepted,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Interviewing => "interviewing",
            Self::Offer => "offer",
            Self::Rejected => "rejected",
            Self::Accepted => "accepted",
        }
    }

    /// Statuses reachable in one step. A status never lists itself.
    pub const fn allowed_next(self) -> &'static [ApplicationStatus] {
        match self {
            Self::Applied => &[Self::Interviewing, Self::Rejected],
            Self::Interviewing => &[Self::Offer, Self::Rejected],
            Self::Offer => &[Self::Accepted, Self::Rejected],
            Self::Accepted | Self::Rejected => &[],
        }
    }

    pub fn can_transition_to(self, requested: ApplicationStatus) -> bool {
        self.allowed_next().contains(&requested)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raised when an externally supplied label does not name a known status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized application status '{0}'")]
pub struct ParseStatusError(pub String);

impl FromStr for ApplicationStatus {
    type Err = ParseStatusError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.label() == normalized)
            .ok_or_else(|| ParseStatusError(raw.to_string()))
    }
}
