//! Service layer for assignment task lifecycle and cascade coordination.
//!
//! Creating, editing, and deleting a task touches up to five record types.
//! Each operation here reads one consistent snapshot, computes the full
//! write set, and commits it as a single guarded batch; no second read
//! happens after write computation begins.

use crate::assignment::{
    domain::{
        AssignmentDomainError, AssignmentTask, District, ExamCenter, ExamCenterId, ExamType,
        InvigilatorId, RequirementRecord, Role, RoleRequirement, RoleRequirements, TaskDraft,
        TaskId, TaskStatus, TaskTitle, VenueAvailability,
    },
    ports::{AssignmentStore, StoreError, VersionGuard, WriteBatch, WriteOp},
    services::cascade,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

/// Request payload for creating an assignment task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    district: String,
    title: String,
    exam_type: String,
    collection_deadline: DateTime<Utc>,
    assignment_date: DateTime<Utc>,
    exam_centers: Vec<ExamCenterId>,
}

impl CreateTaskRequest {
    /// Creates a request with all required task fields.
    #[must_use]
    pub fn new(
        district: impl Into<String>,
        title: impl Into<String>,
        exam_type: impl Into<String>,
        collection_deadline: DateTime<Utc>,
        assignment_date: DateTime<Utc>,
        exam_centers: Vec<ExamCenterId>,
    ) -> Self {
        Self {
            district: district.into(),
            title: title.into(),
            exam_type: exam_type.into(),
            collection_deadline,
            assignment_date,
            exam_centers,
        }
    }
}

/// One role's demand within a requirement submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDemand {
    role: Role,
    required: u32,
    pool: Vec<InvigilatorId>,
}

impl RoleDemand {
    /// Creates a demand entry for one role.
    #[must_use]
    pub const fn new(role: Role, required: u32, pool: Vec<InvigilatorId>) -> Self {
        Self {
            role,
            required,
            pool,
        }
    }
}

/// Request payload for one center's requirement submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequirementsRequest {
    task: TaskId,
    exam_center: ExamCenterId,
    demands: Vec<RoleDemand>,
    venues: VenueAvailability,
}

impl SubmitRequirementsRequest {
    /// Creates a submission for one center with no demand yet.
    #[must_use]
    pub fn new(task: TaskId, exam_center: ExamCenterId) -> Self {
        Self {
            task,
            exam_center,
            demands: Vec::new(),
            venues: VenueAvailability::default(),
        }
    }

    /// Adds one role's headcount and eligibility pool.
    #[must_use]
    pub fn with_demand(mut self, role: Role, required: u32, pool: Vec<InvigilatorId>) -> Self {
        self.demands.push(RoleDemand::new(role, required, pool));
        self
    }

    /// Sets the venue and candidate figures.
    #[must_use]
    pub const fn with_venues(mut self, venues: VenueAvailability) -> Self {
        self.venues = venues;
        self
    }
}

/// Request payload for editing an assignment task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditTaskRequest {
    task: TaskId,
    title: String,
    exam_type: String,
    collection_deadline: DateTime<Utc>,
    assignment_date: DateTime<Utc>,
    exam_centers: Vec<ExamCenterId>,
}

impl EditTaskRequest {
    /// Creates a request with the full edited field set.
    #[must_use]
    pub fn new(
        task: TaskId,
        title: impl Into<String>,
        exam_type: impl Into<String>,
        collection_deadline: DateTime<Utc>,
        assignment_date: DateTime<Utc>,
        exam_centers: Vec<ExamCenterId>,
    ) -> Self {
        Self {
            task,
            title: title.into(),
            exam_type: exam_type.into(),
            collection_deadline,
            assignment_date,
            exam_centers,
        }
    }
}

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] AssignmentDomainError),
    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for task service operations.
pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

/// Task lifecycle orchestration and cascade coordination service.
#[derive(Clone)]
pub struct AssignmentTaskService<S, C>
where
    S: AssignmentStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> AssignmentTaskService<S, C>
where
    S: AssignmentStore,
    C: Clock + Send + Sync,
{
    /// Creates a new task service.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Creates a new assignment task over a set of registered exam centers.
    ///
    /// Every referenced center must exist in the task's district; each one
    /// gets the task attached to its participation list in the same commit.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError`] when validation fails, a center is
    /// unknown, or a center belongs to another district.
    pub async fn create_task(
        &self,
        request: CreateTaskRequest,
    ) -> TaskServiceResult<AssignmentTask> {
        let draft = TaskDraft {
            district: District::new(request.district)?,
            title: TaskTitle::new(request.title)?,
            exam_type: ExamType::new(request.exam_type)?,
            collection_deadline: request.collection_deadline,
            assignment_date: request.assignment_date,
            exam_centers: request.exam_centers,
        };
        let task = AssignmentTask::create(draft, &*self.clock)?;

        let mut batch = WriteBatch::new();
        for center_id in task.exam_centers() {
            let center = self.attachable_center(*center_id, &task).await?;
            batch.push(WriteOp::PutExamCenter(center));
        }
        batch.push(WriteOp::PutTask(task.clone()));
        self.store.commit(batch).await?;
        Ok(task)
    }

    /// Ingests one center's requirement submission.
    ///
    /// Marks the center's collection entry complete and refreshes the task
    /// status in the same commit. A second submission for the same center
    /// is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError`] when a pool is malformed, the task is
    /// unknown, the center does not participate, or the center has already
    /// submitted.
    pub async fn submit_requirements(
        &self,
        request: SubmitRequirementsRequest,
    ) -> TaskServiceResult<AssignmentTask> {
        let mut roles = RoleRequirements::new();
        for demand in request.demands {
            let requirement = RoleRequirement::new(demand.required, demand.pool)?;
            roles = roles.with_role(demand.role, requirement);
        }

        let mut task = self.find_task_or_error(request.task).await?;
        let guard = VersionGuard::new(task.id(), task.version());
        task.mark_collected(request.exam_center)?;
        task.refresh_status(self.clock.utc());
        task.advance_version();

        let record =
            RequirementRecord::new(task.id(), request.exam_center, roles, request.venues);
        let mut batch = WriteBatch::new().with_guard(guard);
        batch.push(WriteOp::PutRequirement(record));
        batch.push(WriteOp::PutTask(task.clone()));
        self.store.commit(batch).await?;
        Ok(task)
    }

    /// Edits a task's details and center set, cascading when centers change.
    ///
    /// Any center-set change invalidates every prior allocation: all result
    /// sets and ledger entries are deleted (profiles pruned), role flags
    /// reset, removed centers lose their requirement records and task
    /// reference, and added centers start collection from scratch. Centers
    /// that stay keep their submitted requirement records.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError`] when validation fails, the task or an
    /// added center is unknown, an added center belongs to another
    /// district, or a concurrent write invalidated the snapshot.
    pub async fn edit_task(&self, request: EditTaskRequest) -> TaskServiceResult<AssignmentTask> {
        let title = TaskTitle::new(request.title)?;
        let exam_type = ExamType::new(request.exam_type)?;

        let mut task = self.find_task_or_error(request.task).await?;
        let guard = VersionGuard::new(task.id(), task.version());
        let outcome = task.apply_center_edit(request.exam_centers)?;
        task.update_details(
            title,
            exam_type,
            request.collection_deadline,
            request.assignment_date,
        );

        let mut batch = WriteBatch::new().with_guard(guard);
        if outcome.changed() {
            for center_id in &outcome.added {
                let center = self.attachable_center(*center_id, &task).await?;
                batch.push(WriteOp::PutExamCenter(center));
            }
            for center_id in &outcome.removed {
                if let Some(mut center) = self.store.find_exam_center(*center_id).await? {
                    center.detach_task(task.id());
                    batch.push(WriteOp::PutExamCenter(center));
                }
                if let Some(record) =
                    self.store.find_requirement(task.id(), *center_id).await?
                {
                    batch.push(WriteOp::DeleteRequirement(record.id()));
                }
            }
            self.teardown_allocations(&mut batch, task.id()).await?;
        }
        task.refresh_status(self.clock.utc());
        task.advance_version();
        batch.push(WriteOp::PutTask(task.clone()));
        self.store.commit(batch).await?;
        Ok(task)
    }

    /// Deletes a task and every record that exists because of it.
    ///
    /// Performs the same teardown as an edit reset, then removes the task's
    /// requirement records, detaches it from every participating center,
    /// and deletes the task record itself.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError`] when the task is unknown or a
    /// concurrent write invalidated the snapshot.
    pub async fn delete_task(&self, task_id: TaskId) -> TaskServiceResult<()> {
        let task = self.find_task_or_error(task_id).await?;
        let guard = VersionGuard::new(task.id(), task.version());

        let mut batch = WriteBatch::new().with_guard(guard);
        self.teardown_allocations(&mut batch, task.id()).await?;
        for record in self.store.requirements_for_task(task.id()).await? {
            batch.push(WriteOp::DeleteRequirement(record.id()));
        }
        for center_id in task.exam_centers() {
            if let Some(mut center) = self.store.find_exam_center(*center_id).await? {
                center.detach_task(task.id());
                batch.push(WriteOp::PutExamCenter(center));
            }
        }
        batch.push(WriteOp::DeleteTask(task.id()));
        self.store.commit(batch).await?;
        Ok(())
    }

    /// Resolves a task's current status, persisting it when it moved.
    ///
    /// The write is skipped while the cached value still matches; the
    /// returned value is always the resolved one.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError`] when the task is unknown or persisting
    /// the refreshed cache fails.
    pub async fn get_status(&self, task_id: TaskId) -> TaskServiceResult<TaskStatus> {
        let mut task = self.find_task_or_error(task_id).await?;
        let guard = VersionGuard::new(task.id(), task.version());
        if task.refresh_status(self.clock.utc()) {
            task.advance_version();
            let mut batch = WriteBatch::new().with_guard(guard);
            batch.push(WriteOp::PutTask(task.clone()));
            self.store.commit(batch).await?;
        }
        Ok(task.status())
    }

    /// Finds a task by identifier, with its status freshly resolved.
    ///
    /// The returned copy carries the resolved status; the stored cache is
    /// left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Store`] when the lookup fails.
    pub async fn find_task(&self, task_id: TaskId) -> TaskServiceResult<Option<AssignmentTask>> {
        let task = self.store.find_task(task_id).await?.map(|mut found| {
            found.refresh_status(self.clock.utc());
            found
        });
        Ok(task)
    }

    /// Lists a district's tasks with freshly resolved statuses.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError`] when the district is malformed or the
    /// lookup fails.
    pub async fn list_tasks(
        &self,
        district: impl Into<String> + Send,
    ) -> TaskServiceResult<Vec<AssignmentTask>> {
        let scope = District::new(district)?;
        let now = self.clock.utc();
        let mut tasks = self.store.list_tasks_in_district(&scope).await?;
        for task in &mut tasks {
            task.refresh_status(now);
        }
        Ok(tasks)
    }

    /// Reads a center and attaches the task, verifying district ownership.
    async fn attachable_center(
        &self,
        center_id: ExamCenterId,
        task: &AssignmentTask,
    ) -> TaskServiceResult<ExamCenter> {
        let mut center = self
            .store
            .find_exam_center(center_id)
            .await?
            .ok_or(StoreError::ExamCenterNotFound(center_id))?;
        if center.district() != task.district() {
            return Err(AssignmentDomainError::DistrictMismatch {
                expected: task.district().as_str().to_owned(),
                actual: center.district().as_str().to_owned(),
            }
            .into());
        }
        center.attach_task(task.id());
        Ok(center)
    }

    /// Appends the full allocation teardown for a task to a batch.
    ///
    /// Deletes every result set and ledger entry the task owns and prunes
    /// the entry references from every affected invigilator profile.
    async fn teardown_allocations(
        &self,
        batch: &mut WriteBatch,
        task_id: TaskId,
    ) -> TaskServiceResult<()> {
        for result_set in self.store.result_sets_for_task(task_id).await? {
            batch.push(WriteOp::DeleteResultSet(result_set.id()));
        }

        let entries = self.store.ledger_for_task(task_id).await?;
        let mut profiles = HashMap::new();
        cascade::load_referenced_profiles(&*self.store, &entries, &mut profiles).await?;
        let mut touched = HashSet::new();
        batch.extend(cascade::prune_ledger_ops(&entries, &mut profiles, &mut touched));
        for invigilator in touched {
            if let Some(profile) = profiles.get(&invigilator) {
                batch.push(WriteOp::PutInvigilator(profile.clone()));
            }
        }
        Ok(())
    }

    async fn find_task_or_error(&self, task_id: TaskId) -> TaskServiceResult<AssignmentTask> {
        self.store
            .find_task(task_id)
            .await?
            .ok_or_else(|| StoreError::TaskNotFound(task_id).into())
    }
}
