//! Error types for assignment domain validation, parsing, and allocation.

use super::{ExamCenterId, InvigilatorId, Role};
use thiserror::Error;

/// Errors returned while constructing or mutating domain assignment values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssignmentDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The exam type is empty after trimming.
    #[error("exam type must not be empty")]
    EmptyExamType,

    /// The district name is empty after trimming.
    #[error("district must not be empty")]
    EmptyDistrict,

    /// The school name is empty after trimming.
    #[error("school name must not be empty")]
    EmptySchoolName,

    /// A registry code (school or exam center) is empty after trimming.
    #[error("registry code must not be empty")]
    EmptyCode,

    /// The invigilator name is empty after trimming.
    #[error("invigilator name must not be empty")]
    EmptyInvigilatorName,

    /// The task references fewer exam centers than the operation allows.
    #[error("expected at least {minimum} exam centers, got {actual}")]
    TooFewExamCenters {
        /// Smallest accepted number of centers for the operation.
        minimum: usize,
        /// Number of centers actually supplied.
        actual: usize,
    },

    /// The same exam center appears more than once in a task specification.
    #[error("exam center listed more than once: {0}")]
    DuplicateExamCenter(ExamCenterId),

    /// The same invigilator appears more than once in an eligibility pool.
    #[error("invigilator listed more than once in pool: {0}")]
    DuplicatePoolEntry(InvigilatorId),

    /// The exam center does not participate in the task.
    #[error("exam center does not participate in this task: {0}")]
    CenterNotParticipating(ExamCenterId),

    /// The exam center has already submitted its requirement record.
    #[error("requirement record already submitted for exam center: {0}")]
    RequirementAlreadySubmitted(ExamCenterId),

    /// A registry entity belongs to a different district than expected.
    #[error("district mismatch: expected '{expected}', got '{actual}'")]
    DistrictMismatch {
        /// District the operation is scoped to.
        expected: String,
        /// District the referenced entity belongs to.
        actual: String,
    },
}

/// Errors raised while planning or validating an allocation run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AllocationError {
    /// The role already has a committed result set and the service policy
    /// rejects re-allocation.
    #[error("role already allocated: {0}")]
    RoleAlreadyAllocated(Role),

    /// No result set has been committed for the role yet.
    #[error("no result set committed for role: {0}")]
    ResultSetMissing(Role),

    /// An exam center has not submitted its requirement record, so no
    /// headcount or pool exists for it.
    #[error("requirement record missing for exam center: {0}")]
    RequirementMissing(ExamCenterId),

    /// The eligible pool ran out before a center's required count was met.
    #[error(
        "eligible pool exhausted for exam center {exam_center}, role {role}: \
         required {required}, only {available} available"
    )]
    InsufficientPool {
        /// Center whose demand could not be met.
        exam_center: ExamCenterId,
        /// Role being allocated.
        role: Role,
        /// Headcount the center requires.
        required: u32,
        /// Eligible invigilators remaining when the pool ran dry.
        available: u32,
    },

    /// A result entry places an invigilator at their own home school.
    #[error("invigilator {invigilator} cannot serve at own-school center {exam_center}")]
    HomeSchoolConflict {
        /// Invigilator whose home school matches the center's school.
        invigilator: InvigilatorId,
        /// Center the entry would assign them to.
        exam_center: ExamCenterId,
    },

    /// A result entry's headcount does not match the center's requirement.
    #[error(
        "headcount mismatch for exam center {exam_center}: expected {expected}, got {actual}"
    )]
    HeadcountMismatch {
        /// Center whose entry is being validated.
        exam_center: ExamCenterId,
        /// Required headcount from the requirement record.
        expected: u32,
        /// Number of invigilators in the entry.
        actual: u32,
    },

    /// The same invigilator appears in more than one entry of a result set.
    #[error("invigilator assigned to more than one center: {0}")]
    DuplicateAssignment(InvigilatorId),

    /// A result entry references a center outside the task's center set.
    #[error("result entry references non-participating exam center: {0}")]
    UnknownCenter(ExamCenterId),

    /// Two result entries reference the same exam center.
    #[error("result set lists exam center more than once: {0}")]
    DuplicateCenterEntry(ExamCenterId),

    /// A pool or result entry references an unregistered invigilator.
    #[error("unknown invigilator: {0}")]
    UnknownInvigilator(InvigilatorId),
}

/// Error returned while parsing roles from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing collection states from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown collection state: {0}")]
pub struct ParseCollectionStateError(pub String);
