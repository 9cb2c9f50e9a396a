//! Domain model for invigilator assignment.
//!
//! Pure business logic: identifiers, the six-role model, registry entities,
//! the task aggregate with its derived status, requirement records, result
//! sets, the experience ledger, and the allocation planner. Storage and
//! randomness stay outside this boundary; the planner receives its random
//! generator and the status resolver its instant from the caller.

mod allocation;
mod error;
mod ids;
mod invigilator;
mod ledger;
mod registry;
mod requirement;
mod result_set;
mod role;
mod status;
mod task;

pub use allocation::{AllocationPlan, SchoolLookup, plan_allocation, validate_result_entries};
pub use error::{
    AllocationError, AssignmentDomainError, ParseCollectionStateError, ParseRoleError,
    ParseTaskStatusError,
};
pub use ids::{
    District, ExamCenterId, InvigilatorId, LedgerEntryId, RequirementId, ResultSetId, SchoolId,
    TaskId,
};
pub use invigilator::InvigilatorProfile;
pub use ledger::ExperienceEntry;
pub use registry::{CenterCode, ExamCenter, School, SchoolCode};
pub use requirement::{RequirementRecord, RoleRequirement, RoleRequirements, VenueAvailability};
pub use result_set::{CenterAllocation, ResultSet};
pub use role::{Role, RoleCompletion};
pub use status::TaskStatus;
pub use task::{
    AssignmentTask, CenterEditOutcome, CollectionEntry, CollectionState, ExamType,
    MIN_CENTERS_AT_CREATION, MIN_CENTERS_AT_EDIT, PersistedTaskData, TaskDraft, TaskTitle,
};
