//! Per-center requirement records submitted during collection.

use super::{AssignmentDomainError, ExamCenterId, InvigilatorId, RequirementId, Role, TaskId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One role's staffing demand at one center: required headcount plus the
/// ordered pool of eligible invigilators the center submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRequirement {
    required: u32,
    pool: Vec<InvigilatorId>,
}

impl RoleRequirement {
    /// Creates a role requirement.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentDomainError::DuplicatePoolEntry`] when the same
    /// invigilator appears twice in the pool.
    pub fn new(
        required: u32,
        pool: Vec<InvigilatorId>,
    ) -> Result<Self, AssignmentDomainError> {
        let mut seen = HashSet::new();
        for invigilator in &pool {
            if !seen.insert(*invigilator) {
                return Err(AssignmentDomainError::DuplicatePoolEntry(*invigilator));
            }
        }
        Ok(Self { required, pool })
    }

    /// A requirement with no demand and no pool.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            required: 0,
            pool: Vec::new(),
        }
    }

    /// Returns the required headcount.
    #[must_use]
    pub const fn required(&self) -> u32 {
        self.required
    }

    /// Returns the eligible invigilator pool in submission order.
    #[must_use]
    pub fn pool(&self) -> &[InvigilatorId] {
        &self.pool
    }
}

/// Requirement entries for all six roles at one center.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRequirements {
    chief_invigilator: RoleRequirement,
    vice_chief_invigilator: RoleRequirement,
    invigilator: RoleRequirement,
    environmental_supervisor: RoleRequirement,
    room_keeper: RoleRequirement,
    reserved_invigilator: RoleRequirement,
}

impl RoleRequirements {
    /// Creates an empty table with zero demand for every role.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            chief_invigilator: RoleRequirement::empty(),
            vice_chief_invigilator: RoleRequirement::empty(),
            invigilator: RoleRequirement::empty(),
            environmental_supervisor: RoleRequirement::empty(),
            room_keeper: RoleRequirement::empty(),
            reserved_invigilator: RoleRequirement::empty(),
        }
    }

    /// Replaces the entry for one role.
    #[must_use]
    pub fn with_role(mut self, role: Role, requirement: RoleRequirement) -> Self {
        match role {
            Role::ChiefInvigilator => self.chief_invigilator = requirement,
            Role::ViceChiefInvigilator => self.vice_chief_invigilator = requirement,
            Role::Invigilator => self.invigilator = requirement,
            Role::EnvironmentalSupervisor => self.environmental_supervisor = requirement,
            Role::RoomKeeper => self.room_keeper = requirement,
            Role::ReservedInvigilator => self.reserved_invigilator = requirement,
        }
        self
    }

    /// Returns the entry for one role.
    #[must_use]
    pub const fn for_role(&self, role: Role) -> &RoleRequirement {
        match role {
            Role::ChiefInvigilator => &self.chief_invigilator,
            Role::ViceChiefInvigilator => &self.vice_chief_invigilator,
            Role::Invigilator => &self.invigilator,
            Role::EnvironmentalSupervisor => &self.environmental_supervisor,
            Role::RoomKeeper => &self.room_keeper,
            Role::ReservedInvigilator => &self.reserved_invigilator,
        }
    }
}

/// Venue and candidate figures from a center's collection submission.
///
/// Carried for reporting; the allocator only consumes headcounts and pools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueAvailability {
    /// Standard exam rooms available.
    pub rooms: u32,
    /// Special-needs rooms available.
    pub special_rooms: u32,
    /// Exam halls available.
    pub halls: u32,
    /// Candidates seated in standard rooms.
    pub room_candidates: u32,
    /// Candidates seated in special-needs rooms.
    pub special_room_candidates: u32,
    /// Candidates seated in halls.
    pub hall_candidates: u32,
}

/// A center's complete requirement submission for one task.
///
/// Created once per (task, center) when the center submits its collection
/// data; immutable afterwards except through the task edit cascade, which
/// deletes records for removed centers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementRecord {
    id: RequirementId,
    task: TaskId,
    exam_center: ExamCenterId,
    roles: RoleRequirements,
    venues: VenueAvailability,
}

impl RequirementRecord {
    /// Creates a requirement record for one center's submission.
    #[must_use]
    pub fn new(
        task: TaskId,
        exam_center: ExamCenterId,
        roles: RoleRequirements,
        venues: VenueAvailability,
    ) -> Self {
        Self {
            id: RequirementId::new(),
            task,
            exam_center,
            roles,
            venues,
        }
    }

    /// Returns the record identifier.
    #[must_use]
    pub const fn id(&self) -> RequirementId {
        self.id
    }

    /// Returns the owning task.
    #[must_use]
    pub const fn task(&self) -> TaskId {
        self.task
    }

    /// Returns the submitting exam center.
    #[must_use]
    pub const fn exam_center(&self) -> ExamCenterId {
        self.exam_center
    }

    /// Returns the per-role requirement table.
    #[must_use]
    pub const fn roles(&self) -> &RoleRequirements {
        &self.roles
    }

    /// Returns the venue figures from the submission.
    #[must_use]
    pub const fn venues(&self) -> &VenueAvailability {
        &self.venues
    }

    /// Returns the required headcount for one role.
    #[must_use]
    pub const fn required(&self, role: Role) -> u32 {
        self.roles.for_role(role).required()
    }

    /// Returns the eligible pool for one role.
    #[must_use]
    pub fn pool(&self, role: Role) -> &[InvigilatorId] {
        self.roles.for_role(role).pool()
    }
}
