//! Task lifecycle status and the pure status resolver.

use super::ParseTaskStatusError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Derived lifecycle status of an assignment task.
///
/// The status is a cache: it is always recomputable from the collection
/// deadline, the per-center collection states, and the role completion
/// flags. [`TaskStatus::resolve`] is the single source of that rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Before the collection deadline, with centers still to submit.
    CollectingData,
    /// Past the collection deadline with at least one center missing.
    CollectionIncomplete,
    /// Requirements are in; allocation runs are outstanding.
    Assigning,
    /// All six role allocations have committed.
    AssignmentComplete,
}

impl TaskStatus {
    /// Computes the status from task facts at a given instant.
    ///
    /// Before the collection deadline the task is either still
    /// [`TaskStatus::CollectingData`] or, once every center has submitted,
    /// [`TaskStatus::Assigning`]. From the deadline onward a missing
    /// submission pins the task at [`TaskStatus::CollectionIncomplete`];
    /// otherwise the role flags decide between [`TaskStatus::Assigning`]
    /// and [`TaskStatus::AssignmentComplete`].
    #[must_use]
    pub fn resolve(
        collection_deadline: DateTime<Utc>,
        all_collected: bool,
        all_roles_complete: bool,
        now: DateTime<Utc>,
    ) -> Self {
        if now < collection_deadline {
            if all_collected {
                Self::Assigning
            } else {
                Self::CollectingData
            }
        } else if !all_collected {
            Self::CollectionIncomplete
        } else if all_roles_complete {
            Self::AssignmentComplete
        } else {
            Self::Assigning
        }
    }

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CollectingData => "collecting_data",
            Self::CollectionIncomplete => "collection_incomplete",
            Self::Assigning => "assigning",
            Self::AssignmentComplete => "assignment_complete",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "collecting_data" => Ok(Self::CollectingData),
            "collection_incomplete" => Ok(Self::CollectionIncomplete),
            "assigning" => Ok(Self::Assigning),
            "assignment_complete" => Ok(Self::AssignmentComplete),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}
