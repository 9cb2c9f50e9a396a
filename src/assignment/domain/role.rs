//! The six supervisory roles and per-task role completion flags.

use super::ParseRoleError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supervisory duty an invigilator can be assigned to.
///
/// Every exam center states an independent headcount and eligibility pool
/// for each role, and each role is allocated in its own run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Leads invigilation at a center.
    ChiefInvigilator,
    /// Deputises for the chief invigilator.
    ViceChiefInvigilator,
    /// Supervises candidates in an exam room.
    Invigilator,
    /// Oversees exam-hall surroundings.
    EnvironmentalSupervisor,
    /// Keeps and accounts for exam materials per room.
    RoomKeeper,
    /// Stands by to cover absences.
    ReservedInvigilator,
}

impl Role {
    /// All six roles in allocation order.
    pub const ALL: [Self; 6] = [
        Self::ChiefInvigilator,
        Self::ViceChiefInvigilator,
        Self::Invigilator,
        Self::EnvironmentalSupervisor,
        Self::RoomKeeper,
        Self::ReservedInvigilator,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ChiefInvigilator => "chief_invigilator",
            Self::ViceChiefInvigilator => "vice_chief_invigilator",
            Self::Invigilator => "invigilator",
            Self::EnvironmentalSupervisor => "environmental_supervisor",
            Self::RoomKeeper => "room_keeper",
            Self::ReservedInvigilator => "reserved_invigilator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Role {
    type Error = ParseRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "chief_invigilator" => Ok(Self::ChiefInvigilator),
            "vice_chief_invigilator" => Ok(Self::ViceChiefInvigilator),
            "invigilator" => Ok(Self::Invigilator),
            "environmental_supervisor" => Ok(Self::EnvironmentalSupervisor),
            "room_keeper" => Ok(Self::RoomKeeper),
            "reserved_invigilator" => Ok(Self::ReservedInvigilator),
            _ => Err(ParseRoleError(value.to_owned())),
        }
    }
}

/// Completion flags for the six allocation runs of one task.
///
/// A flag turns true when the role's result set commits and falls back to
/// false whenever a cascade reset destroys the task's result sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCompletion {
    chief_invigilator: bool,
    vice_chief_invigilator: bool,
    invigilator: bool,
    environmental_supervisor: bool,
    room_keeper: bool,
    reserved_invigilator: bool,
}

impl RoleCompletion {
    /// Creates a completion record with all six flags false.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            chief_invigilator: false,
            vice_chief_invigilator: false,
            invigilator: false,
            environmental_supervisor: false,
            room_keeper: false,
            reserved_invigilator: false,
        }
    }

    /// Returns whether the given role's allocation has completed.
    #[must_use]
    pub const fn is_complete(&self, role: Role) -> bool {
        match role {
            Role::ChiefInvigilator => self.chief_invigilator,
            Role::ViceChiefInvigilator => self.vice_chief_invigilator,
            Role::Invigilator => self.invigilator,
            Role::EnvironmentalSupervisor => self.environmental_supervisor,
            Role::RoomKeeper => self.room_keeper,
            Role::ReservedInvigilator => self.reserved_invigilator,
        }
    }

    /// Returns whether all six roles have completed allocation.
    #[must_use]
    pub const fn all_complete(&self) -> bool {
        self.chief_invigilator
            && self.vice_chief_invigilator
            && self.invigilator
            && self.environmental_supervisor
            && self.room_keeper
            && self.reserved_invigilator
    }

    /// Sets the completion flag for one role.
    pub const fn set_complete(&mut self, role: Role, complete: bool) {
        match role {
            Role::ChiefInvigilator => self.chief_invigilator = complete,
            Role::ViceChiefInvigilator => self.vice_chief_invigilator = complete,
            Role::Invigilator => self.invigilator = complete,
            Role::EnvironmentalSupervisor => self.environmental_supervisor = complete,
            Role::RoomKeeper => self.room_keeper = complete,
            Role::ReservedInvigilator => self.reserved_invigilator = complete,
        }
    }

    /// Clears all six flags.
    pub const fn reset(&mut self) {
        *self = Self::new();
    }
}
