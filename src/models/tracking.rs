//! Subscribers and their tracked applications.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{JobKey, JobRecord};

/// Opaque identity of an end user on the chat side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriberId(String);

impl SubscriberId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SubscriberId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<u64> for SubscriberId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stage of an application.
///
/// The declaration order is the nominal pipeline and only drives display
/// order; any status may move to any other.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Applied,
    PhoneScreen,
    TechnicalInterview,
    OnsiteOrFinal,
    OfferReceived,
    Rejected,
    /// No update yet. Not a terminal state.
    Waiting,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 7] = [
        ApplicationStatus::Applied,
        ApplicationStatus::PhoneScreen,
        ApplicationStatus::TechnicalInterview,
        ApplicationStatus::OnsiteOrFinal,
        ApplicationStatus::OfferReceived,
        ApplicationStatus::Rejected,
        ApplicationStatus::Waiting,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::PhoneScreen => "Phone Screen",
            ApplicationStatus::TechnicalInterview => "Technical Interview",
            ApplicationStatus::OnsiteOrFinal => "Onsite/Final",
            ApplicationStatus::OfferReceived => "Offer Received",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Waiting => "Waiting",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ApplicationStatus {
    type Err = AppError;

    /// Accepts the label in any case, with spaces, dashes, underscores or
    /// slashes as separators ("phone-screen", "Onsite/Final", "offer_received").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalize = |text: &str| -> String {
            text.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        };
        let wanted = normalize(s);
        Self::ALL
            .into_iter()
            .find(|status| normalize(status.label()) == wanted)
            .ok_or_else(|| AppError::validation(format!("Unknown application status '{s}'")))
    }
}

/// A job record a subscriber has flagged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackedRecord {
    pub record: JobRecord,
    pub status: ApplicationStatus,
    pub tracked_at: DateTime<Utc>,
}

impl TrackedRecord {
    pub fn new(record: JobRecord) -> Self {
        Self {
            record,
            status: ApplicationStatus::default(),
            tracked_at: Utc::now(),
        }
    }

    pub fn key(&self) -> JobKey {
        self.record.key()
    }

    /// Compare against `key` without allocating.
    pub fn matches(&self, key: &JobKey) -> bool {
        self.record.company == key.company && self.record.role == key.role
    }
}
