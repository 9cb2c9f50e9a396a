//! Registry entities: schools and the exam centers they host.
//!
//! The registry supplies the exam-center to home-school mapping the
//! allocator's exclusion constraint depends on, and each center carries the
//! list of assignment tasks it participates in. The engine attaches and
//! detaches those task references during create, edit, and delete cascades.

use super::{AssignmentDomainError, District, ExamCenterId, SchoolId, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validated school registry code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchoolCode(String);

impl SchoolCode {
    /// Creates a validated school code.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentDomainError::EmptyCode`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, AssignmentDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(AssignmentDomainError::EmptyCode);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the code as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchoolCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated exam center registry code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CenterCode(String);

impl CenterCode {
    /// Creates a validated exam center code.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentDomainError::EmptyCode`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, AssignmentDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(AssignmentDomainError::EmptyCode);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the code as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CenterCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A school registered with the district office.
///
/// Schools are the home side of the exclusion constraint: an invigilator
/// whose home school hosts an exam center never serves at that center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    id: SchoolId,
    name: String,
    code: SchoolCode,
    district: District,
    address: String,
    exam_centers: Vec<ExamCenterId>,
}

impl School {
    /// Creates a new school record.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentDomainError::EmptySchoolName`] when the name is
    /// empty after trimming.
    pub fn new(
        name: impl Into<String>,
        code: SchoolCode,
        district: District,
        address: impl Into<String>,
    ) -> Result<Self, AssignmentDomainError> {
        let raw = name.into();
        if raw.trim().is_empty() {
            return Err(AssignmentDomainError::EmptySchoolName);
        }
        Ok(Self {
            id: SchoolId::new(),
            name: raw,
            code,
            district,
            address: address.into(),
            exam_centers: Vec::new(),
        })
    }

    /// Returns the school identifier.
    #[must_use]
    pub const fn id(&self) -> SchoolId {
        self.id
    }

    /// Returns the school name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the school registry code.
    #[must_use]
    pub const fn code(&self) -> &SchoolCode {
        &self.code
    }

    /// Returns the district the school belongs to.
    #[must_use]
    pub const fn district(&self) -> &District {
        &self.district
    }

    /// Returns the school address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the exam centers hosted by this school.
    #[must_use]
    pub fn exam_centers(&self) -> &[ExamCenterId] {
        &self.exam_centers
    }

    /// Records a newly registered exam center hosted by this school.
    pub fn attach_exam_center(&mut self, center: ExamCenterId) {
        if !self.exam_centers.contains(&center) {
            self.exam_centers.push(center);
        }
    }
}

/// An exam center hosted by a school.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamCenter {
    id: ExamCenterId,
    code: CenterCode,
    safe_room_no: String,
    district: District,
    school: SchoolId,
    assignment_tasks: Vec<TaskId>,
}

impl ExamCenter {
    /// Creates a new exam center record.
    #[must_use]
    pub fn new(
        code: CenterCode,
        safe_room_no: impl Into<String>,
        district: District,
        school: SchoolId,
    ) -> Self {
        Self {
            id: ExamCenterId::new(),
            code,
            safe_room_no: safe_room_no.into(),
            district,
            school,
            assignment_tasks: Vec::new(),
        }
    }

    /// Returns the exam center identifier.
    #[must_use]
    pub const fn id(&self) -> ExamCenterId {
        self.id
    }

    /// Returns the exam center registry code.
    #[must_use]
    pub const fn code(&self) -> &CenterCode {
        &self.code
    }

    /// Returns the safe room number.
    #[must_use]
    pub fn safe_room_no(&self) -> &str {
        &self.safe_room_no
    }

    /// Returns the district the center belongs to.
    #[must_use]
    pub const fn district(&self) -> &District {
        &self.district
    }

    /// Returns the home school hosting this center.
    #[must_use]
    pub const fn school(&self) -> SchoolId {
        self.school
    }

    /// Returns the assignment tasks this center participates in.
    #[must_use]
    pub fn assignment_tasks(&self) -> &[TaskId] {
        &self.assignment_tasks
    }

    /// Records participation in an assignment task.
    pub fn attach_task(&mut self, task: TaskId) {
        if !self.assignment_tasks.contains(&task) {
            self.assignment_tasks.push(task);
        }
    }

    /// Removes a task reference after an edit-removal or task deletion.
    pub fn detach_task(&mut self, task: TaskId) {
        self.assignment_tasks.retain(|t| *t != task);
    }
}
