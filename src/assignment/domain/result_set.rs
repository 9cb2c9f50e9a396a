//! Committed allocation outcomes: one result set per task and role.

use super::{ExamCenterId, InvigilatorId, ResultSetId, Role, TaskId};
use serde::{Deserialize, Serialize};

/// The invigilators allocated to one exam center within a result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CenterAllocation {
    exam_center: ExamCenterId,
    invigilators: Vec<InvigilatorId>,
}

impl CenterAllocation {
    /// Creates a center allocation entry.
    #[must_use]
    pub const fn new(exam_center: ExamCenterId, invigilators: Vec<InvigilatorId>) -> Self {
        Self {
            exam_center,
            invigilators,
        }
    }

    /// Returns the exam center.
    #[must_use]
    pub const fn exam_center(&self) -> ExamCenterId {
        self.exam_center
    }

    /// Returns the allocated invigilators in draw order.
    #[must_use]
    pub fn invigilators(&self) -> &[InvigilatorId] {
        &self.invigilators
    }
}

/// The committed outcome of one allocation run for one role.
///
/// A result set is never partially written: the allocator plans every
/// center's entry in memory and commits the whole set in one batch, or
/// commits nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    id: ResultSetId,
    task: TaskId,
    role: Role,
    entries: Vec<CenterAllocation>,
}

impl ResultSet {
    /// Creates a result set from planned entries.
    #[must_use]
    pub fn new(task: TaskId, role: Role, entries: Vec<CenterAllocation>) -> Self {
        Self {
            id: ResultSetId::new(),
            task,
            role,
            entries,
        }
    }

    /// Returns the result set identifier.
    #[must_use]
    pub const fn id(&self) -> ResultSetId {
        self.id
    }

    /// Returns the owning task.
    #[must_use]
    pub const fn task(&self) -> TaskId {
        self.task
    }

    /// Returns the allocated role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Returns the per-center entries in the task's center order.
    #[must_use]
    pub fn entries(&self) -> &[CenterAllocation] {
        &self.entries
    }

    /// Replaces every entry, keeping identity; used by manual result edits.
    pub fn replace_entries(&mut self, entries: Vec<CenterAllocation>) {
        self.entries = entries;
    }

    /// Returns all assigned invigilators across entries, in entry order.
    #[must_use]
    pub fn assigned_invigilators(&self) -> Vec<InvigilatorId> {
        self.entries
            .iter()
            .flat_map(|entry| entry.invigilators().iter().copied())
            .collect()
    }
}
