//! Graph-store port for the assignment engine.
//!
//! The engine never relies on implicit cascade behaviour from a storage
//! layer: services read a consistent snapshot through the query methods,
//! compute a complete write set, and hand it to [`AssignmentStore::commit`]
//! as one [`WriteBatch`]. A batch applies entirely or not at all, and an
//! optional [`VersionGuard`] turns a concurrent write against the same
//! task into a clean [`StoreError::TransactionConflict`] instead of a
//! partially consistent graph.

use crate::assignment::domain::{
    AssignmentTask, District, ExamCenter, ExamCenterId, ExperienceEntry, InvigilatorId,
    InvigilatorProfile, LedgerEntryId, RequirementId, RequirementRecord, ResultSet, ResultSetId,
    Role, School, SchoolId, TaskId,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Optimistic concurrency guard carried by a write batch.
///
/// The guard pins the task version observed when the batch's snapshot was
/// read; commit fails when the stored version has moved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionGuard {
    task: TaskId,
    expected_version: u64,
}

impl VersionGuard {
    /// Creates a guard for the given task at the observed version.
    #[must_use]
    pub const fn new(task: TaskId, expected_version: u64) -> Self {
        Self {
            task,
            expected_version,
        }
    }

    /// Returns the guarded task.
    #[must_use]
    pub const fn task(&self) -> TaskId {
        self.task
    }

    /// Returns the version the snapshot was read at.
    #[must_use]
    pub const fn expected_version(&self) -> u64 {
        self.expected_version
    }
}

/// One write within an atomic batch.
///
/// `Put` variants upsert; delete variants are idempotent so a cascade can
/// be replayed against an already partially absent graph without error.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Upserts a school record.
    PutSchool(School),
    /// Upserts an exam center record.
    PutExamCenter(ExamCenter),
    /// Upserts an invigilator profile.
    PutInvigilator(InvigilatorProfile),
    /// Upserts an assignment task.
    PutTask(AssignmentTask),
    /// Removes an assignment task record.
    DeleteTask(TaskId),
    /// Upserts a requirement record.
    PutRequirement(RequirementRecord),
    /// Removes a requirement record.
    DeleteRequirement(RequirementId),
    /// Upserts a result set.
    PutResultSet(ResultSet),
    /// Removes a result set.
    DeleteResultSet(ResultSetId),
    /// Appends an experience ledger entry.
    PutLedgerEntry(ExperienceEntry),
    /// Removes an experience ledger entry.
    DeleteLedgerEntry(LedgerEntryId),
}

/// An atomic, optionally version-guarded write set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    guard: Option<VersionGuard>,
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Creates an empty batch.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            guard: None,
            ops: Vec::new(),
        }
    }

    /// Attaches a version guard to the batch.
    #[must_use]
    pub const fn with_guard(mut self, guard: VersionGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Appends one write.
    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    /// Appends several writes in order.
    pub fn extend(&mut self, ops: impl IntoIterator<Item = WriteOp>) {
        self.ops.extend(ops);
    }

    /// Returns the guard, if any.
    #[must_use]
    pub const fn guard(&self) -> Option<&VersionGuard> {
        self.guard.as_ref()
    }

    /// Returns the writes in application order.
    #[must_use]
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Returns whether the batch carries no writes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Assignment graph persistence contract.
///
/// Query methods read committed state; every mutation goes through
/// [`AssignmentStore::commit`].
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Finds a school by identifier.
    async fn find_school(&self, id: SchoolId) -> StoreResult<Option<School>>;

    /// Finds an exam center by identifier.
    async fn find_exam_center(&self, id: ExamCenterId) -> StoreResult<Option<ExamCenter>>;

    /// Finds an invigilator profile by identifier.
    async fn find_invigilator(&self, id: InvigilatorId)
    -> StoreResult<Option<InvigilatorProfile>>;

    /// Finds a task by identifier.
    async fn find_task(&self, id: TaskId) -> StoreResult<Option<AssignmentTask>>;

    /// Returns all tasks owned by a district, in creation order.
    async fn list_tasks_in_district(
        &self,
        district: &District,
    ) -> StoreResult<Vec<AssignmentTask>>;

    /// Returns all requirement records submitted for a task.
    async fn requirements_for_task(&self, task: TaskId) -> StoreResult<Vec<RequirementRecord>>;

    /// Finds one center's requirement record for a task.
    async fn find_requirement(
        &self,
        task: TaskId,
        exam_center: ExamCenterId,
    ) -> StoreResult<Option<RequirementRecord>>;

    /// Finds the committed result set for a task and role.
    async fn find_result_set(&self, task: TaskId, role: Role)
    -> StoreResult<Option<ResultSet>>;

    /// Returns all committed result sets for a task.
    async fn result_sets_for_task(&self, task: TaskId) -> StoreResult<Vec<ResultSet>>;

    /// Returns all ledger entries owned by a task.
    async fn ledger_for_task(&self, task: TaskId) -> StoreResult<Vec<ExperienceEntry>>;

    /// Finds a ledger entry by identifier.
    async fn find_ledger_entry(
        &self,
        id: LedgerEntryId,
    ) -> StoreResult<Option<ExperienceEntry>>;

    /// Applies a write batch atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TransactionConflict`] when the batch's guard no
    /// longer matches the stored task version, a uniqueness or reference
    /// error when an individual write is inadmissible, or
    /// [`StoreError::Persistence`] for backend failures. On any error the
    /// store is left exactly as before the call.
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()>;
}

/// Errors returned by assignment store implementations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The batch guard did not match the stored task version.
    #[error(
        "conflicting write on task {task}: expected version {expected}, found {found}"
    )]
    TransactionConflict {
        /// Guarded task.
        task: TaskId,
        /// Version the snapshot was read at.
        expected: u64,
        /// Version found at commit time.
        found: u64,
    },

    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The referenced school does not exist.
    #[error("school not found: {0}")]
    SchoolNotFound(SchoolId),

    /// The referenced exam center does not exist.
    #[error("exam center not found: {0}")]
    ExamCenterNotFound(ExamCenterId),

    /// The referenced invigilator does not exist.
    #[error("invigilator not found: {0}")]
    InvigilatorNotFound(InvigilatorId),

    /// A school with the same registry code already exists.
    #[error("duplicate school code: {0}")]
    DuplicateSchoolCode(String),

    /// An exam center with the same registry code already exists.
    #[error("duplicate exam center code: {0}")]
    DuplicateCenterCode(String),

    /// A requirement record for the (task, center) pair already exists.
    #[error("requirement already recorded for task {task}, exam center {exam_center}")]
    DuplicateRequirement {
        /// Owning task.
        task: TaskId,
        /// Submitting center.
        exam_center: ExamCenterId,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
