//! Service layer for allocation runs and result-set access.
//!
//! Wraps the pure allocation planner with snapshot reads and a single
//! atomic commit, owns the re-allocation policy, and serves the result-set
//! views consumed by officers and the letter subsystem.

use crate::assignment::{
    domain::{
        AllocationError, AssignmentTask, CenterAllocation, ExamCenterId, ExperienceEntry,
        InvigilatorId, InvigilatorProfile, RequirementRecord, ResultSet, Role, SchoolId,
        SchoolLookup, TaskId, plan_allocation, validate_result_entries,
    },
    ports::{AssignmentStore, StoreError, VersionGuard, WriteBatch, WriteOp},
    services::cascade,
};
use mockable::Clock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// What `allocate` does when the role already has a committed result set.
///
/// The default is [`ReallocationPolicy::Reject`]: a committed run stays
/// authoritative until an edit cascade resets it. [`Supersede`] instead
/// tears the prior run down (result set, ledger entries, profile
/// references) and commits the new run in the same batch.
///
/// [`Supersede`]: ReallocationPolicy::Supersede
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReallocationPolicy {
    /// Fail with [`AllocationError::RoleAlreadyAllocated`].
    #[default]
    Reject,
    /// Replace the prior result set and its ledger entries.
    Supersede,
}

/// Request payload for manually overriding a committed result set.
#[derive(Debug, Clone, PartialEq)]
pub struct EditResultSetRequest {
    task: TaskId,
    role: Role,
    entries: Vec<CenterAllocation>,
}

impl EditResultSetRequest {
    /// Creates a request replacing the full entry list for one role.
    #[must_use]
    pub const fn new(task: TaskId, role: Role, entries: Vec<CenterAllocation>) -> Self {
        Self {
            task,
            role,
            entries,
        }
    }
}

/// An allocated invigilator with registry fields resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInvigilator {
    /// Invigilator identifier.
    pub invigilator: InvigilatorId,
    /// Display name.
    pub name: String,
    /// Home school name.
    pub home_school: String,
}

/// One center's allocation with registry fields resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCenterAllocation {
    /// Exam center identifier.
    pub exam_center: ExamCenterId,
    /// Exam center registry code.
    pub center_code: String,
    /// Name of the school hosting the center.
    pub school_name: String,
    /// Allocated invigilators in draw order.
    pub invigilators: Vec<ResolvedInvigilator>,
}

/// A result set with names and codes resolved for notification rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedResultSet {
    /// Owning task.
    pub task: TaskId,
    /// Allocated role.
    pub role: Role,
    /// Per-center entries in the task's center order.
    pub entries: Vec<ResolvedCenterAllocation>,
}

/// Service-level errors for allocation operations.
#[derive(Debug, Error)]
pub enum AllocationServiceError {
    /// The allocation planner or result validation rejected the run.
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for allocation service operations.
pub type AllocationServiceResult<T> = Result<T, AllocationServiceError>;

/// Allocation orchestration service.
///
/// The random generator is injected so tests can substitute a seeded
/// [`StdRng`] without changing the algorithm's external contract.
pub struct AllocationService<S, C, G = StdRng>
where
    S: AssignmentStore,
    C: Clock + Send + Sync,
    G: Rng + Send,
{
    store: Arc<S>,
    clock: Arc<C>,
    rng: Mutex<G>,
    policy: ReallocationPolicy,
}

impl<S, C> AllocationService<S, C>
where
    S: AssignmentStore,
    C: Clock + Send + Sync,
{
    /// Creates a service drawing from entropy, rejecting re-allocation.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self::with_rng(store, clock, StdRng::from_entropy())
    }
}

impl<S, C, G> AllocationService<S, C, G>
where
    S: AssignmentStore,
    C: Clock + Send + Sync,
    G: Rng + Send,
{
    /// Creates a service with an explicit random generator.
    #[must_use]
    pub fn with_rng(store: Arc<S>, clock: Arc<C>, rng: G) -> Self {
        Self {
            store,
            clock,
            rng: Mutex::new(rng),
            policy: ReallocationPolicy::default(),
        }
    }

    /// Sets the re-allocation policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: ReallocationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Runs the constrained random allocation for one role of one task.
    ///
    /// Plans the whole run in memory, then commits the result set, the
    /// ledger entries, the profile back-references, the role-complete
    /// flag, and the refreshed status as one guarded batch. A failure at
    /// any point leaves the graph untouched.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::RoleAlreadyAllocated`] under the
    /// [`ReallocationPolicy::Reject`] policy when the role has a committed
    /// result set, [`AllocationError::RequirementMissing`] when a center
    /// has not submitted, [`AllocationError::InsufficientPool`] when a
    /// center's eligible subset runs short, or a store error for unknown
    /// references and commit conflicts.
    pub async fn allocate(
        &self,
        task_id: TaskId,
        role: Role,
    ) -> AllocationServiceResult<ResultSet> {
        let mut task = self.find_task_or_error(task_id).await?;
        let guard = VersionGuard::new(task.id(), task.version());
        let mut batch = WriteBatch::new().with_guard(guard);

        let superseded = match self.store.find_result_set(task_id, role).await? {
            None => None,
            Some(prior) => match self.policy {
                ReallocationPolicy::Reject => {
                    return Err(AllocationError::RoleAlreadyAllocated(role).into());
                }
                ReallocationPolicy::Supersede => Some(prior),
            },
        };

        let requirements = self.store.requirements_for_task(task_id).await?;
        let center_schools = self.read_center_schools(&task).await?;
        let mut profiles = self.read_pool_profiles(&requirements, role).await?;

        let mut touched = HashSet::new();
        if let Some(prior) = &superseded {
            let stale: Vec<ExperienceEntry> = self
                .store
                .ledger_for_task(task_id)
                .await?
                .into_iter()
                .filter(|entry| entry.role() == role)
                .collect();
            cascade::load_referenced_profiles(&*self.store, &stale, &mut profiles).await?;
            batch.extend(cascade::prune_ledger_ops(&stale, &mut profiles, &mut touched));
            batch.push(WriteOp::DeleteResultSet(prior.id()));
            task.remove_result_set(prior.id());
        }

        let lookup = SchoolLookup::new(center_schools, home_schools(&profiles));
        let plan = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|err| StoreError::persistence(std::io::Error::other(err.to_string())))?;
            plan_allocation(&task, role, &requirements, &lookup, &mut *rng)?
        };
        let (result_set, ledger_entries) = plan.into_parts();

        for entry in &ledger_entries {
            if let Some(profile) = profiles.get_mut(&entry.invigilator()) {
                profile.record_experience(entry.id());
                touched.insert(entry.invigilator());
            }
            batch.push(WriteOp::PutLedgerEntry(entry.clone()));
        }
        push_touched_profiles(&mut batch, &profiles, &touched);

        task.record_result_set(result_set.id(), role);
        task.refresh_status(self.clock.utc());
        task.advance_version();
        batch.push(WriteOp::PutResultSet(result_set.clone()));
        batch.push(WriteOp::PutTask(task.clone()));
        self.store.commit(batch).await?;
        Ok(result_set)
    }

    /// Manually overrides a committed result set.
    ///
    /// The replacement entries must satisfy every allocation invariant:
    /// full headcounts, no double-booking, and the own-school exclusion.
    /// The role's ledger entries are rebuilt to match in the same commit.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::ResultSetMissing`] when the role has no
    /// committed run, a validation error when the entries break an
    /// invariant, or a store error for unknown references and commit
    /// conflicts.
    pub async fn edit_result_set(
        &self,
        request: EditResultSetRequest,
    ) -> AllocationServiceResult<ResultSet> {
        let mut task = self.find_task_or_error(request.task).await?;
        let guard = VersionGuard::new(task.id(), task.version());
        let mut result_set = self
            .store
            .find_result_set(request.task, request.role)
            .await?
            .ok_or(AllocationError::ResultSetMissing(request.role))?;

        let requirements = self.store.requirements_for_task(request.task).await?;
        let center_schools = self.read_center_schools(&task).await?;
        let mut profiles = self.read_entry_profiles(&request.entries).await?;
        let lookup = SchoolLookup::new(center_schools, home_schools(&profiles));
        validate_result_entries(
            &task,
            request.role,
            &request.entries,
            &requirements,
            &lookup,
        )?;

        let stale: Vec<ExperienceEntry> = self
            .store
            .ledger_for_task(request.task)
            .await?
            .into_iter()
            .filter(|entry| entry.role() == request.role)
            .collect();
        cascade::load_referenced_profiles(&*self.store, &stale, &mut profiles).await?;

        let mut touched = HashSet::new();
        let mut batch = WriteBatch::new().with_guard(guard);
        batch.extend(cascade::prune_ledger_ops(&stale, &mut profiles, &mut touched));
        for entry in &request.entries {
            for invigilator in entry.invigilators() {
                let ledger_entry = ExperienceEntry::new(
                    request.role,
                    task.id(),
                    entry.exam_center(),
                    *invigilator,
                );
                if let Some(profile) = profiles.get_mut(invigilator) {
                    profile.record_experience(ledger_entry.id());
                    touched.insert(*invigilator);
                }
                batch.push(WriteOp::PutLedgerEntry(ledger_entry));
            }
        }
        push_touched_profiles(&mut batch, &profiles, &touched);

        result_set.replace_entries(request.entries);
        task.advance_version();
        batch.push(WriteOp::PutResultSet(result_set.clone()));
        batch.push(WriteOp::PutTask(task.clone()));
        self.store.commit(batch).await?;
        Ok(result_set)
    }

    /// Returns the committed result set for a task and role, if any.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationServiceError::Store`] when the lookup fails.
    pub async fn result_set(
        &self,
        task_id: TaskId,
        role: Role,
    ) -> AllocationServiceResult<Option<ResultSet>> {
        Ok(self.store.find_result_set(task_id, role).await?)
    }

    /// Returns a result set with names and codes resolved for rendering.
    ///
    /// The letter subsystem consumes this view read-only; the engine takes
    /// no dependency in the other direction.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationServiceError::Store`] when a referenced center,
    /// school, or profile is missing or a lookup fails.
    pub async fn resolved_result_set(
        &self,
        task_id: TaskId,
        role: Role,
    ) -> AllocationServiceResult<Option<ResolvedResultSet>> {
        let Some(result_set) = self.store.find_result_set(task_id, role).await? else {
            return Ok(None);
        };

        let mut entries = Vec::with_capacity(result_set.entries().len());
        for entry in result_set.entries() {
            entries.push(self.resolve_entry(entry).await?);
        }
        Ok(Some(ResolvedResultSet {
            task: result_set.task(),
            role: result_set.role(),
            entries,
        }))
    }

    /// Returns an invigilator's experience history in recording order.
    ///
    /// Driven off the profile's ledger back-references, so entries removed
    /// by a cascade never reappear here.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationServiceError::Store`] when the profile is
    /// unknown or a lookup fails.
    pub async fn assignments_for_invigilator(
        &self,
        invigilator: InvigilatorId,
    ) -> AllocationServiceResult<Vec<ExperienceEntry>> {
        let profile = self
            .store
            .find_invigilator(invigilator)
            .await?
            .ok_or(StoreError::InvigilatorNotFound(invigilator))?;

        let mut entries = Vec::with_capacity(profile.experience().len());
        for entry_id in profile.experience() {
            if let Some(entry) = self.store.find_ledger_entry(*entry_id).await? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    async fn resolve_entry(
        &self,
        entry: &CenterAllocation,
    ) -> AllocationServiceResult<ResolvedCenterAllocation> {
        let center = self
            .store
            .find_exam_center(entry.exam_center())
            .await?
            .ok_or(StoreError::ExamCenterNotFound(entry.exam_center()))?;
        let school = self
            .store
            .find_school(center.school())
            .await?
            .ok_or(StoreError::SchoolNotFound(center.school()))?;

        let mut invigilators = Vec::with_capacity(entry.invigilators().len());
        for invigilator_id in entry.invigilators() {
            let profile = self
                .store
                .find_invigilator(*invigilator_id)
                .await?
                .ok_or(StoreError::InvigilatorNotFound(*invigilator_id))?;
            let home = self
                .store
                .find_school(profile.home_school())
                .await?
                .ok_or(StoreError::SchoolNotFound(profile.home_school()))?;
            invigilators.push(ResolvedInvigilator {
                invigilator: profile.id(),
                name: profile.name().to_owned(),
                home_school: home.name().to_owned(),
            });
        }
        Ok(ResolvedCenterAllocation {
            exam_center: center.id(),
            center_code: center.code().as_str().to_owned(),
            school_name: school.name().to_owned(),
            invigilators,
        })
    }

    /// Maps each participating center to its home school.
    async fn read_center_schools(
        &self,
        task: &AssignmentTask,
    ) -> AllocationServiceResult<HashMap<ExamCenterId, SchoolId>> {
        let mut center_schools = HashMap::new();
        for center_id in task.exam_centers() {
            let center = self
                .store
                .find_exam_center(*center_id)
                .await?
                .ok_or(StoreError::ExamCenterNotFound(*center_id))?;
            center_schools.insert(*center_id, center.school());
        }
        Ok(center_schools)
    }

    /// Loads every profile appearing in the role's eligibility pools.
    async fn read_pool_profiles(
        &self,
        requirements: &[RequirementRecord],
        role: Role,
    ) -> AllocationServiceResult<HashMap<InvigilatorId, InvigilatorProfile>> {
        let mut profiles = HashMap::new();
        for record in requirements {
            for invigilator in record.pool(role) {
                if profiles.contains_key(invigilator) {
                    continue;
                }
                let profile = self
                    .store
                    .find_invigilator(*invigilator)
                    .await?
                    .ok_or(StoreError::InvigilatorNotFound(*invigilator))?;
                profiles.insert(*invigilator, profile);
            }
        }
        Ok(profiles)
    }

    /// Loads every profile referenced by manually edited entries.
    async fn read_entry_profiles(
        &self,
        entries: &[CenterAllocation],
    ) -> AllocationServiceResult<HashMap<InvigilatorId, InvigilatorProfile>> {
        let mut profiles = HashMap::new();
        for entry in entries {
            for invigilator in entry.invigilators() {
                if profiles.contains_key(invigilator) {
                    continue;
                }
                let profile = self
                    .store
                    .find_invigilator(*invigilator)
                    .await?
                    .ok_or(StoreError::InvigilatorNotFound(*invigilator))?;
                profiles.insert(*invigilator, profile);
            }
        }
        Ok(profiles)
    }

    async fn find_task_or_error(
        &self,
        task_id: TaskId,
    ) -> AllocationServiceResult<AssignmentTask> {
        self.store
            .find_task(task_id)
            .await?
            .ok_or_else(|| StoreError::TaskNotFound(task_id).into())
    }
}

/// Projects loaded profiles onto their home schools.
fn home_schools(
    profiles: &HashMap<InvigilatorId, InvigilatorProfile>,
) -> HashMap<InvigilatorId, SchoolId> {
    profiles
        .iter()
        .map(|(id, profile)| (*id, profile.home_school()))
        .collect()
}

/// Emits one `PutInvigilator` per profile whose references changed.
fn push_touched_profiles(
    batch: &mut WriteBatch,
    profiles: &HashMap<InvigilatorId, InvigilatorProfile>,
    touched: &HashSet<InvigilatorId>,
) {
    for invigilator in touched {
        if let Some(profile) = profiles.get(invigilator) {
            batch.push(WriteOp::PutInvigilator(profile.clone()));
        }
    }
}
