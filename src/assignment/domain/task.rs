//! Assignment task aggregate root and collection tracking.

use super::{
    AssignmentDomainError, District, ExamCenterId, ParseCollectionStateError, ResultSetId, Role,
    RoleCompletion, TaskId, TaskStatus,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Fewest exam centers accepted when creating a task.
///
/// A one-center task could never be staffed: every eligible invigilator
/// would be excluded by the own-school constraint.
pub const MIN_CENTERS_AT_CREATION: usize = 2;

/// Fewest exam centers accepted when editing a task.
pub const MIN_CENTERS_AT_EDIT: usize = 1;

/// Validated assignment task title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskTitle(String);

impl TaskTitle {
    /// Creates a validated title.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentDomainError::EmptyTitle`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, AssignmentDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(AssignmentDomainError::EmptyTitle);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the title as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated exam type label, e.g. a national exam series name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExamType(String);

impl ExamType {
    /// Creates a validated exam type.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentDomainError::EmptyExamType`] when the value is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, AssignmentDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(AssignmentDomainError::EmptyExamType);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the exam type as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Whether an exam center has submitted its requirement record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionState {
    /// The center has not submitted yet.
    Incomplete,
    /// The center's requirement record is in.
    Complete,
}

impl CollectionState {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Incomplete => "incomplete",
            Self::Complete => "complete",
        }
    }
}

impl TryFrom<&str> for CollectionState {
    type Error = ParseCollectionStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "incomplete" => Ok(Self::Incomplete),
            "complete" => Ok(Self::Complete),
            _ => Err(ParseCollectionStateError(value.to_owned())),
        }
    }
}

/// One center's collection status within a task.
///
/// Stored as an explicit ordered record rather than a keyed map so that
/// iteration order is stable and serialization stays schema-friendly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionEntry {
    exam_center: ExamCenterId,
    state: CollectionState,
}

impl CollectionEntry {
    /// Creates a collection entry.
    #[must_use]
    pub const fn new(exam_center: ExamCenterId, state: CollectionState) -> Self {
        Self { exam_center, state }
    }

    /// Returns the exam center.
    #[must_use]
    pub const fn exam_center(&self) -> ExamCenterId {
        self.exam_center
    }

    /// Returns the submission state.
    #[must_use]
    pub const fn state(&self) -> CollectionState {
        self.state
    }
}

/// Fields required to create a new assignment task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    /// District owning the task.
    pub district: District,
    /// Task title.
    pub title: TaskTitle,
    /// Exam series the task staffs.
    pub exam_type: ExamType,
    /// Deadline for centers to submit requirement records.
    pub collection_deadline: DateTime<Utc>,
    /// Scheduled assignment day.
    pub assignment_date: DateTime<Utc>,
    /// Participating exam centers, in processing order.
    pub exam_centers: Vec<ExamCenterId>,
}

/// Summary of a center-set edit, consumed by the cascade coordinator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CenterEditOutcome {
    /// Centers newly added to the task.
    pub added: Vec<ExamCenterId>,
    /// Centers removed from the task.
    pub removed: Vec<ExamCenterId>,
}

impl CenterEditOutcome {
    /// Returns whether the center set changed at all.
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted owning district.
    pub district: District,
    /// Persisted title.
    pub title: TaskTitle,
    /// Persisted exam type.
    pub exam_type: ExamType,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted collection deadline.
    pub collection_deadline: DateTime<Utc>,
    /// Persisted assignment day.
    pub assignment_date: DateTime<Utc>,
    /// Persisted center list.
    pub exam_centers: Vec<ExamCenterId>,
    /// Persisted collection entries.
    pub collection: Vec<CollectionEntry>,
    /// Persisted role completion flags.
    pub roles_complete: RoleCompletion,
    /// Persisted cached status.
    pub status: TaskStatus,
    /// Persisted result set references.
    pub result_sets: Vec<ResultSetId>,
    /// Persisted concurrency version.
    pub version: u64,
}

/// Assignment task aggregate root.
///
/// The cached `status` field is a derived value: it is recomputable at any
/// time from the collection deadline, the collection entries, and the role
/// completion flags. Mutating operations refresh it; readers may trust it
/// only as of the task's version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentTask {
    id: TaskId,
    district: District,
    title: TaskTitle,
    exam_type: ExamType,
    created_at: DateTime<Utc>,
    collection_deadline: DateTime<Utc>,
    assignment_date: DateTime<Utc>,
    exam_centers: Vec<ExamCenterId>,
    collection: Vec<CollectionEntry>,
    roles_complete: RoleCompletion,
    status: TaskStatus,
    result_sets: Vec<ResultSetId>,
    version: u64,
}

/// Rejects duplicate or too-few center lists.
fn validate_centers(
    centers: &[ExamCenterId],
    minimum: usize,
) -> Result<(), AssignmentDomainError> {
    if centers.len() < minimum {
        return Err(AssignmentDomainError::TooFewExamCenters {
            minimum,
            actual: centers.len(),
        });
    }
    let mut seen = HashSet::new();
    for center in centers {
        if !seen.insert(*center) {
            return Err(AssignmentDomainError::DuplicateExamCenter(*center));
        }
    }
    Ok(())
}

impl AssignmentTask {
    /// Creates a new task from a validated draft.
    ///
    /// Every participating center starts with an `Incomplete` collection
    /// entry, and the initial status resolves from the clock's present.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentDomainError::TooFewExamCenters`] when fewer than
    /// [`MIN_CENTERS_AT_CREATION`] centers are given, or
    /// [`AssignmentDomainError::DuplicateExamCenter`] when a center repeats.
    pub fn create(draft: TaskDraft, clock: &impl Clock) -> Result<Self, AssignmentDomainError> {
        validate_centers(&draft.exam_centers, MIN_CENTERS_AT_CREATION)?;

        let now = clock.utc();
        let collection = draft
            .exam_centers
            .iter()
            .map(|center| CollectionEntry::new(*center, CollectionState::Incomplete))
            .collect();
        let status = TaskStatus::resolve(draft.collection_deadline, false, false, now);

        Ok(Self {
            id: TaskId::new(),
            district: draft.district,
            title: draft.title,
            exam_type: draft.exam_type,
            created_at: now,
            collection_deadline: draft.collection_deadline,
            assignment_date: draft.assignment_date,
            exam_centers: draft.exam_centers,
            collection,
            roles_complete: RoleCompletion::new(),
            status,
            result_sets: Vec::new(),
            version: 0,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            district: data.district,
            title: data.title,
            exam_type: data.exam_type,
            created_at: data.created_at,
            collection_deadline: data.collection_deadline,
            assignment_date: data.assignment_date,
            exam_centers: data.exam_centers,
            collection: data.collection,
            roles_complete: data.roles_complete,
            status: data.status,
            result_sets: data.result_sets,
            version: data.version,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning district.
    #[must_use]
    pub const fn district(&self) -> &District {
        &self.district
    }

    /// Returns the task title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the exam type.
    #[must_use]
    pub const fn exam_type(&self) -> &ExamType {
        &self.exam_type
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the collection deadline.
    #[must_use]
    pub const fn collection_deadline(&self) -> DateTime<Utc> {
        self.collection_deadline
    }

    /// Returns the scheduled assignment day.
    #[must_use]
    pub const fn assignment_date(&self) -> DateTime<Utc> {
        self.assignment_date
    }

    /// Returns the participating centers in processing order.
    #[must_use]
    pub fn exam_centers(&self) -> &[ExamCenterId] {
        &self.exam_centers
    }

    /// Returns the per-center collection entries.
    #[must_use]
    pub fn collection(&self) -> &[CollectionEntry] {
        &self.collection
    }

    /// Returns the role completion flags.
    #[must_use]
    pub const fn roles_complete(&self) -> &RoleCompletion {
        &self.roles_complete
    }

    /// Returns the cached status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the committed result set references.
    #[must_use]
    pub fn result_sets(&self) -> &[ResultSetId] {
        &self.result_sets
    }

    /// Returns the optimistic concurrency version.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Returns a center's collection state, if it participates.
    #[must_use]
    pub fn collection_state_for(&self, center: ExamCenterId) -> Option<CollectionState> {
        self.collection
            .iter()
            .find(|entry| entry.exam_center() == center)
            .map(CollectionEntry::state)
    }

    /// Returns whether every center has submitted its requirement record.
    #[must_use]
    pub fn all_collected(&self) -> bool {
        self.collection
            .iter()
            .all(|entry| entry.state() == CollectionState::Complete)
    }

    /// Marks a center's requirement record as submitted.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentDomainError::CenterNotParticipating`] when the
    /// center is not part of the task, or
    /// [`AssignmentDomainError::RequirementAlreadySubmitted`] when its entry
    /// is already complete.
    pub fn mark_collected(&mut self, center: ExamCenterId) -> Result<(), AssignmentDomainError> {
        let entry = self
            .collection
            .iter_mut()
            .find(|candidate| candidate.exam_center == center)
            .ok_or(AssignmentDomainError::CenterNotParticipating(center))?;
        if entry.state == CollectionState::Complete {
            return Err(AssignmentDomainError::RequirementAlreadySubmitted(center));
        }
        entry.state = CollectionState::Complete;
        Ok(())
    }

    /// Computes the status from current facts at `now`.
    ///
    /// Pure: no fields change and repeated calls with the same instant
    /// return the same value.
    #[must_use]
    pub fn resolve_status(&self, now: DateTime<Utc>) -> TaskStatus {
        TaskStatus::resolve(
            self.collection_deadline,
            self.all_collected(),
            self.roles_complete.all_complete(),
            now,
        )
    }

    /// Recomputes the cached status; returns whether it changed.
    ///
    /// Callers skip the persistence write when this returns false, a
    /// write-avoidance optimization rather than a correctness requirement.
    pub fn refresh_status(&mut self, now: DateTime<Utc>) -> bool {
        let resolved = self.resolve_status(now);
        if resolved == self.status {
            return false;
        }
        self.status = resolved;
        true
    }

    /// Records a committed result set and flags the role complete.
    pub fn record_result_set(&mut self, result_set: ResultSetId, role: Role) {
        if !self.result_sets.contains(&result_set) {
            self.result_sets.push(result_set);
        }
        self.roles_complete.set_complete(role, true);
    }

    /// Drops a result set reference; used when a run is superseded.
    pub fn remove_result_set(&mut self, result_set: ResultSetId) {
        self.result_sets.retain(|id| *id != result_set);
    }

    /// Updates the editable detail fields.
    pub fn update_details(
        &mut self,
        title: TaskTitle,
        exam_type: ExamType,
        collection_deadline: DateTime<Utc>,
        assignment_date: DateTime<Utc>,
    ) {
        self.title = title;
        self.exam_type = exam_type;
        self.collection_deadline = collection_deadline;
        self.assignment_date = assignment_date;
    }

    /// Applies an edited center list, resetting allocations when it changed.
    ///
    /// Kept centers preserve their collection state and (elsewhere) their
    /// requirement records; added centers start `Incomplete`. Any set change
    /// invalidates all prior allocations, so the result set references and
    /// role flags are cleared here and the coordinator deletes the backing
    /// records.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentDomainError::TooFewExamCenters`] when fewer than
    /// [`MIN_CENTERS_AT_EDIT`] centers remain, or
    /// [`AssignmentDomainError::DuplicateExamCenter`] when a center repeats.
    pub fn apply_center_edit(
        &mut self,
        new_centers: Vec<ExamCenterId>,
    ) -> Result<CenterEditOutcome, AssignmentDomainError> {
        validate_centers(&new_centers, MIN_CENTERS_AT_EDIT)?;

        let previous: HashSet<ExamCenterId> = self.exam_centers.iter().copied().collect();
        let next: HashSet<ExamCenterId> = new_centers.iter().copied().collect();
        let added: Vec<ExamCenterId> = new_centers
            .iter()
            .copied()
            .filter(|center| !previous.contains(center))
            .collect();
        let removed: Vec<ExamCenterId> = self
            .exam_centers
            .iter()
            .copied()
            .filter(|center| !next.contains(center))
            .collect();
        let outcome = CenterEditOutcome { added, removed };

        self.collection = new_centers
            .iter()
            .map(|center| {
                let state = self
                    .collection_state_for(*center)
                    .unwrap_or(CollectionState::Incomplete);
                CollectionEntry::new(*center, state)
            })
            .collect();
        self.exam_centers = new_centers;

        if outcome.changed() {
            self.result_sets.clear();
            self.roles_complete.reset();
        }

        Ok(outcome)
    }

    /// Advances the optimistic concurrency version before a guarded commit.
    pub const fn advance_version(&mut self) {
        self.version = self.version.saturating_add(1);
    }
}
