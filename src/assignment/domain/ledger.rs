//! The experience ledger: one entry per past role assignment.

use super::{ExamCenterId, InvigilatorId, LedgerEntryId, Role, TaskId};
use serde::{Deserialize, Serialize};

/// One invigilator's assignment to one center for one role of one task.
///
/// Entries are append-only during allocation and removed en masse by the
/// cascade coordinator when their owning task is edited or deleted. The
/// invigilator profile holds back-references to its entries but does not
/// own their lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    id: LedgerEntryId,
    role: Role,
    assignment_task: TaskId,
    assigned_to: ExamCenterId,
    invigilator: InvigilatorId,
}

impl ExperienceEntry {
    /// Creates a ledger entry for one draw.
    #[must_use]
    pub fn new(
        role: Role,
        assignment_task: TaskId,
        assigned_to: ExamCenterId,
        invigilator: InvigilatorId,
    ) -> Self {
        Self {
            id: LedgerEntryId::new(),
            role,
            assignment_task,
            assigned_to,
            invigilator,
        }
    }

    /// Returns the entry identifier.
    #[must_use]
    pub const fn id(&self) -> LedgerEntryId {
        self.id
    }

    /// Returns the assigned role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Returns the owning assignment task.
    #[must_use]
    pub const fn assignment_task(&self) -> TaskId {
        self.assignment_task
    }

    /// Returns the exam center the invigilator was assigned to.
    #[must_use]
    pub const fn assigned_to(&self) -> ExamCenterId {
        self.assigned_to
    }

    /// Returns the assigned invigilator.
    #[must_use]
    pub const fn invigilator(&self) -> InvigilatorId {
        self.invigilator
    }
}
