//! Thread-safe in-memory assignment store.
//!
//! Reference implementation of the store port, also used as the test
//! backend. Commit takes the single writer lock, validates the version
//! guard, applies the batch to a copy of the graph, and swaps the copy in
//! only when every write was admissible, so a failed batch leaves the
//! published state untouched.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::assignment::domain::{
    AssignmentTask, District, ExamCenter, ExamCenterId, ExperienceEntry, InvigilatorId,
    InvigilatorProfile, LedgerEntryId, RequirementId, RequirementRecord, ResultSet, ResultSetId,
    Role, School, SchoolId, TaskId,
};
use crate::assignment::ports::{
    AssignmentStore, StoreError, StoreResult, WriteBatch, WriteOp,
};

/// Thread-safe in-memory assignment graph store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAssignmentStore {
    state: Arc<RwLock<GraphState>>,
}

#[derive(Debug, Clone, Default)]
struct GraphState {
    schools: HashMap<SchoolId, School>,
    school_codes: HashMap<String, SchoolId>,
    centers: HashMap<ExamCenterId, ExamCenter>,
    center_codes: HashMap<String, ExamCenterId>,
    invigilators: HashMap<InvigilatorId, InvigilatorProfile>,
    tasks: HashMap<TaskId, AssignmentTask>,
    requirements: HashMap<RequirementId, RequirementRecord>,
    requirement_index: HashMap<(TaskId, ExamCenterId), RequirementId>,
    result_sets: HashMap<ResultSetId, ResultSet>,
    result_index: HashMap<(TaskId, Role), ResultSetId>,
    ledger: HashMap<LedgerEntryId, ExperienceEntry>,
    ledger_by_task: HashMap<TaskId, Vec<LedgerEntryId>>,
}

impl InMemoryAssignmentStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read_state(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, GraphState>> {
        self.state
            .read()
            .map_err(|err| StoreError::persistence(std::io::Error::other(err.to_string())))
    }
}

/// Re-keys a code index after an upsert may have changed the code.
fn reindex_code<I: Copy + PartialEq>(
    index: &mut HashMap<String, I>,
    id: I,
    old_code: Option<String>,
    new_code: &str,
) {
    if let Some(code) = old_code {
        if code != new_code {
            index.remove(&code);
        }
    }
    index.insert(new_code.to_owned(), id);
}

fn apply_put_school(state: &mut GraphState, school: School) -> StoreResult<()> {
    let code = school.code().as_str().to_owned();
    if state
        .school_codes
        .get(&code)
        .is_some_and(|existing| *existing != school.id())
    {
        return Err(StoreError::DuplicateSchoolCode(code));
    }
    let old_code = state
        .schools
        .get(&school.id())
        .map(|prior| prior.code().as_str().to_owned());
    reindex_code(&mut state.school_codes, school.id(), old_code, &code);
    state.schools.insert(school.id(), school);
    Ok(())
}

fn apply_put_center(state: &mut GraphState, center: ExamCenter) -> StoreResult<()> {
    let code = center.code().as_str().to_owned();
    if state
        .center_codes
        .get(&code)
        .is_some_and(|existing| *existing != center.id())
    {
        return Err(StoreError::DuplicateCenterCode(code));
    }
    let old_code = state
        .centers
        .get(&center.id())
        .map(|prior| prior.code().as_str().to_owned());
    reindex_code(&mut state.center_codes, center.id(), old_code, &code);
    state.centers.insert(center.id(), center);
    Ok(())
}

fn apply_put_requirement(state: &mut GraphState, record: RequirementRecord) -> StoreResult<()> {
    let key = (record.task(), record.exam_center());
    if state
        .requirement_index
        .get(&key)
        .is_some_and(|existing| *existing != record.id())
    {
        return Err(StoreError::DuplicateRequirement {
            task: record.task(),
            exam_center: record.exam_center(),
        });
    }
    state.requirement_index.insert(key, record.id());
    state.requirements.insert(record.id(), record);
    Ok(())
}

fn apply_put_result_set(state: &mut GraphState, result_set: ResultSet) -> StoreResult<()> {
    let key = (result_set.task(), result_set.role());
    if state
        .result_index
        .get(&key)
        .is_some_and(|existing| *existing != result_set.id())
    {
        return Err(StoreError::persistence(std::io::Error::other(format!(
            "result set already committed for task {}, role {}",
            result_set.task(),
            result_set.role()
        ))));
    }
    state.result_index.insert(key, result_set.id());
    state.result_sets.insert(result_set.id(), result_set);
    Ok(())
}

fn apply_delete_result_set(state: &mut GraphState, id: ResultSetId) {
    if let Some(result_set) = state.result_sets.remove(&id) {
        state
            .result_index
            .remove(&(result_set.task(), result_set.role()));
    }
}

fn apply_put_ledger_entry(state: &mut GraphState, entry: ExperienceEntry) {
    let owner = state
        .ledger_by_task
        .entry(entry.assignment_task())
        .or_default();
    if !owner.contains(&entry.id()) {
        owner.push(entry.id());
    }
    state.ledger.insert(entry.id(), entry);
}

fn apply_delete_ledger_entry(state: &mut GraphState, id: LedgerEntryId) {
    if let Some(entry) = state.ledger.remove(&id) {
        if let Some(owner) = state.ledger_by_task.get_mut(&entry.assignment_task()) {
            owner.retain(|candidate| *candidate != id);
            if owner.is_empty() {
                state.ledger_by_task.remove(&entry.assignment_task());
            }
        }
    }
}

fn apply_delete_requirement(state: &mut GraphState, id: RequirementId) {
    if let Some(record) = state.requirements.remove(&id) {
        state
            .requirement_index
            .remove(&(record.task(), record.exam_center()));
    }
}

fn apply(state: &mut GraphState, op: WriteOp) -> StoreResult<()> {
    match op {
        WriteOp::PutSchool(school) => apply_put_school(state, school),
        WriteOp::PutExamCenter(center) => apply_put_center(state, center),
        WriteOp::PutInvigilator(profile) => {
            state.invigilators.insert(profile.id(), profile);
            Ok(())
        }
        WriteOp::PutTask(task) => {
            state.tasks.insert(task.id(), task);
            Ok(())
        }
        WriteOp::DeleteTask(id) => {
            state.tasks.remove(&id);
            Ok(())
        }
        WriteOp::PutRequirement(record) => apply_put_requirement(state, record),
        WriteOp::DeleteRequirement(id) => {
            apply_delete_requirement(state, id);
            Ok(())
        }
        WriteOp::PutResultSet(result_set) => apply_put_result_set(state, result_set),
        WriteOp::DeleteResultSet(id) => {
            apply_delete_result_set(state, id);
            Ok(())
        }
        WriteOp::PutLedgerEntry(entry) => {
            apply_put_ledger_entry(state, entry);
            Ok(())
        }
        WriteOp::DeleteLedgerEntry(id) => {
            apply_delete_ledger_entry(state, id);
            Ok(())
        }
    }
}

#[async_trait]
impl AssignmentStore for InMemoryAssignmentStore {
    async fn find_school(&self, id: SchoolId) -> StoreResult<Option<School>> {
        Ok(self.read_state()?.schools.get(&id).cloned())
    }

    async fn find_exam_center(&self, id: ExamCenterId) -> StoreResult<Option<ExamCenter>> {
        Ok(self.read_state()?.centers.get(&id).cloned())
    }

    async fn find_invigilator(
        &self,
        id: InvigilatorId,
    ) -> StoreResult<Option<InvigilatorProfile>> {
        Ok(self.read_state()?.invigilators.get(&id).cloned())
    }

    async fn find_task(&self, id: TaskId) -> StoreResult<Option<AssignmentTask>> {
        Ok(self.read_state()?.tasks.get(&id).cloned())
    }

    async fn list_tasks_in_district(
        &self,
        district: &District,
    ) -> StoreResult<Vec<AssignmentTask>> {
        let state = self.read_state()?;
        let mut tasks: Vec<AssignmentTask> = state
            .tasks
            .values()
            .filter(|task| task.district() == district)
            .cloned()
            .collect();
        tasks.sort_by_key(AssignmentTask::created_at);
        Ok(tasks)
    }

    async fn requirements_for_task(&self, task: TaskId) -> StoreResult<Vec<RequirementRecord>> {
        let state = self.read_state()?;
        let mut records: Vec<RequirementRecord> = state
            .requirements
            .values()
            .filter(|record| record.task() == task)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.id().into_inner());
        Ok(records)
    }

    async fn find_requirement(
        &self,
        task: TaskId,
        exam_center: ExamCenterId,
    ) -> StoreResult<Option<RequirementRecord>> {
        let state = self.read_state()?;
        let record = state
            .requirement_index
            .get(&(task, exam_center))
            .and_then(|id| state.requirements.get(id))
            .cloned();
        Ok(record)
    }

    async fn find_result_set(
        &self,
        task: TaskId,
        role: Role,
    ) -> StoreResult<Option<ResultSet>> {
        let state = self.read_state()?;
        let result_set = state
            .result_index
            .get(&(task, role))
            .and_then(|id| state.result_sets.get(id))
            .cloned();
        Ok(result_set)
    }

    async fn result_sets_for_task(&self, task: TaskId) -> StoreResult<Vec<ResultSet>> {
        let state = self.read_state()?;
        Ok(state
            .result_sets
            .values()
            .filter(|result_set| result_set.task() == task)
            .cloned()
            .collect())
    }

    async fn ledger_for_task(&self, task: TaskId) -> StoreResult<Vec<ExperienceEntry>> {
        let state = self.read_state()?;
        let entries = state
            .ledger_by_task
            .get(&task)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.ledger.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(entries)
    }

    async fn find_ledger_entry(
        &self,
        id: LedgerEntryId,
    ) -> StoreResult<Option<ExperienceEntry>> {
        Ok(self.read_state()?.ledger.get(&id).cloned())
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| StoreError::persistence(std::io::Error::other(err.to_string())))?;

        if let Some(guard) = batch.guard() {
            let found = state
                .tasks
                .get(&guard.task())
                .ok_or(StoreError::TaskNotFound(guard.task()))?
                .version();
            if found != guard.expected_version() {
                return Err(StoreError::TransactionConflict {
                    task: guard.task(),
                    expected: guard.expected_version(),
                    found,
                });
            }
        }

        let mut next = state.clone();
        for op in batch.ops() {
            apply(&mut next, op.clone())?;
        }
        *state = next;
        Ok(())
    }
}
