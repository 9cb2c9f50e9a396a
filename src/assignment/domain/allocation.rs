//! The constrained random allocation planner.
//!
//! Planning is pure: the service reads a consistent snapshot, hands it in
//! together with a random generator, and receives either a complete plan
//! (result set plus ledger entries) or an error before anything is written.
//! Committing the plan atomically is the caller's job, so a mid-run pool
//! exhaustion can never leave partial results behind.

use super::{
    AllocationError, AssignmentTask, CenterAllocation, ExamCenterId, ExperienceEntry,
    InvigilatorId, RequirementRecord, ResultSet, Role, SchoolId,
};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::{HashMap, HashSet};

/// A fully planned allocation run, ready to commit as one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationPlan {
    result_set: ResultSet,
    ledger_entries: Vec<ExperienceEntry>,
}

impl AllocationPlan {
    /// Returns the planned result set.
    #[must_use]
    pub const fn result_set(&self) -> &ResultSet {
        &self.result_set
    }

    /// Returns the planned ledger entries, one per draw.
    #[must_use]
    pub fn ledger_entries(&self) -> &[ExperienceEntry] {
        &self.ledger_entries
    }

    /// Decomposes the plan for batch assembly.
    #[must_use]
    pub fn into_parts(self) -> (ResultSet, Vec<ExperienceEntry>) {
        (self.result_set, self.ledger_entries)
    }
}

/// Snapshot of the registry facts the planner needs.
///
/// Both maps must cover every center of the task and every invigilator in
/// the pools; the service builds them from the same read as the rest of
/// the graph so the run sees one consistent world.
#[derive(Debug, Clone, Default)]
pub struct SchoolLookup {
    center_schools: HashMap<ExamCenterId, SchoolId>,
    invigilator_schools: HashMap<InvigilatorId, SchoolId>,
}

impl SchoolLookup {
    /// Creates a lookup from center and invigilator home-school pairs.
    #[must_use]
    pub fn new(
        center_schools: impl IntoIterator<Item = (ExamCenterId, SchoolId)>,
        invigilator_schools: impl IntoIterator<Item = (InvigilatorId, SchoolId)>,
    ) -> Self {
        Self {
            center_schools: center_schools.into_iter().collect(),
            invigilator_schools: invigilator_schools.into_iter().collect(),
        }
    }

    fn center_school(&self, center: ExamCenterId) -> Result<SchoolId, AllocationError> {
        self.center_schools
            .get(&center)
            .copied()
            .ok_or(AllocationError::UnknownCenter(center))
    }

    fn invigilator_school(
        &self,
        invigilator: InvigilatorId,
    ) -> Result<SchoolId, AllocationError> {
        self.invigilator_schools
            .get(&invigilator)
            .copied()
            .ok_or(AllocationError::UnknownInvigilator(invigilator))
    }
}

/// Indexes requirement records by center, for one task.
fn requirement_index(
    requirements: &[RequirementRecord],
) -> HashMap<ExamCenterId, &RequirementRecord> {
    requirements
        .iter()
        .map(|record| (record.exam_center(), record))
        .collect()
}

/// Collects the role's combined pool across centers, first occurrence kept.
fn combined_pool(
    task: &AssignmentTask,
    role: Role,
    records: &HashMap<ExamCenterId, &RequirementRecord>,
) -> Result<Vec<InvigilatorId>, AllocationError> {
    let mut pool = Vec::new();
    let mut seen = HashSet::new();
    for center in task.exam_centers() {
        let record = records
            .get(center)
            .ok_or(AllocationError::RequirementMissing(*center))?;
        for invigilator in record.pool(role) {
            if seen.insert(*invigilator) {
                pool.push(*invigilator);
            }
        }
    }
    Ok(pool)
}

/// Indexes of pool members allowed to serve at a center.
fn eligible_indexes(
    pool: &[InvigilatorId],
    center_school: SchoolId,
    lookup: &SchoolLookup,
) -> Result<Vec<usize>, AllocationError> {
    let mut indexes = Vec::with_capacity(pool.len());
    for (index, invigilator) in pool.iter().enumerate() {
        if lookup.invigilator_school(*invigilator)? != center_school {
            indexes.push(index);
        }
    }
    Ok(indexes)
}

/// Plans one allocation run for one role.
///
/// The combined pool is shuffled once, uniformly; centers are then served
/// greedily in the task's stored center order, each draw removing the
/// selection from the shared pool so nobody is double-booked within the
/// run. Earlier centers are therefore favoured when the pool runs tight;
/// this is a deliberate ordering choice, not round-robin fairness.
///
/// # Errors
///
/// Returns [`AllocationError::RequirementMissing`] when a participating
/// center has not submitted, [`AllocationError::InsufficientPool`] when a
/// center's eligible subset is smaller than its required headcount, or a
/// lookup error when the school maps do not cover the graph.
pub fn plan_allocation(
    task: &AssignmentTask,
    role: Role,
    requirements: &[RequirementRecord],
    lookup: &SchoolLookup,
    rng: &mut impl Rng,
) -> Result<AllocationPlan, AllocationError> {
    let records = requirement_index(requirements);
    let mut pool = combined_pool(task, role, &records)?;
    pool.shuffle(rng);

    let mut entries = Vec::with_capacity(task.exam_centers().len());
    let mut ledger_entries = Vec::new();
    for center in task.exam_centers() {
        let record = records
            .get(center)
            .ok_or(AllocationError::RequirementMissing(*center))?;
        let required = record.required(role);
        let center_school = lookup.center_school(*center)?;

        let available =
            u32::try_from(eligible_indexes(&pool, center_school, lookup)?.len()).unwrap_or(u32::MAX);
        if available < required {
            return Err(AllocationError::InsufficientPool {
                exam_center: *center,
                role,
                required,
                available,
            });
        }

        let mut drawn = Vec::new();
        for _ in 0..required {
            let eligible = eligible_indexes(&pool, center_school, lookup)?;
            let pool_index = eligible.as_slice().choose(rng).copied().ok_or(
                AllocationError::InsufficientPool {
                    exam_center: *center,
                    role,
                    required,
                    available: u32::try_from(drawn.len()).unwrap_or(u32::MAX),
                },
            )?;
            let invigilator = pool.swap_remove(pool_index);
            ledger_entries.push(ExperienceEntry::new(role, task.id(), *center, invigilator));
            drawn.push(invigilator);
        }
        entries.push(CenterAllocation::new(*center, drawn));
    }

    Ok(AllocationPlan {
        result_set: ResultSet::new(task.id(), role, entries),
        ledger_entries,
    })
}

/// Validates manually edited result entries against the task's facts.
///
/// Every participating center with demand must appear exactly once with a
/// matching headcount, no invigilator may serve twice across entries, and
/// the own-school exclusion holds for every placement.
///
/// # Errors
///
/// Returns the first violated rule as an [`AllocationError`]; the caller
/// commits nothing on failure.
pub fn validate_result_entries(
    task: &AssignmentTask,
    role: Role,
    entries: &[CenterAllocation],
    requirements: &[RequirementRecord],
    lookup: &SchoolLookup,
) -> Result<(), AllocationError> {
    let records = requirement_index(requirements);
    let participating: HashSet<ExamCenterId> = task.exam_centers().iter().copied().collect();

    let mut entry_centers = HashSet::new();
    let mut assigned = HashSet::new();
    for entry in entries {
        let center = entry.exam_center();
        if !participating.contains(&center) {
            return Err(AllocationError::UnknownCenter(center));
        }
        if !entry_centers.insert(center) {
            return Err(AllocationError::DuplicateCenterEntry(center));
        }
        let record = records
            .get(&center)
            .ok_or(AllocationError::RequirementMissing(center))?;
        let required = record.required(role);
        let actual = u32::try_from(entry.invigilators().len()).unwrap_or(u32::MAX);
        if actual != required {
            return Err(AllocationError::HeadcountMismatch {
                exam_center: center,
                expected: required,
                actual,
            });
        }

        let center_school = lookup.center_school(center)?;
        for invigilator in entry.invigilators() {
            if !assigned.insert(*invigilator) {
                return Err(AllocationError::DuplicateAssignment(*invigilator));
            }
            if lookup.invigilator_school(*invigilator)? == center_school {
                return Err(AllocationError::HomeSchoolConflict {
                    invigilator: *invigilator,
                    exam_center: center,
                });
            }
        }
    }

    for center in task.exam_centers() {
        if entry_centers.contains(center) {
            continue;
        }
        let required = records
            .get(center)
            .map_or(0, |record| record.required(role));
        if required > 0 {
            return Err(AllocationError::HeadcountMismatch {
                exam_center: *center,
                expected: required,
                actual: 0,
            });
        }
    }

    Ok(())
}
