//! Shared ledger-teardown helpers for cascade operations.
//!
//! Edit resets, deletions, superseded allocation runs, and manual result
//! edits all need the same move: remove a set of ledger entries and prune
//! the references from every affected invigilator profile, without writing
//! anything until the whole batch commits.

use std::collections::{HashMap, HashSet};

use crate::assignment::domain::{ExperienceEntry, InvigilatorId, InvigilatorProfile};
use crate::assignment::ports::{AssignmentStore, StoreResult, WriteOp};

/// Loads the profiles referenced by the given ledger entries.
///
/// Profiles already present in `profiles` are kept as-is; a profile that no
/// longer exists is skipped, since pruning a missing profile is a no-op.
pub(super) async fn load_referenced_profiles<S: AssignmentStore + ?Sized>(
    store: &S,
    entries: &[ExperienceEntry],
    profiles: &mut HashMap<InvigilatorId, InvigilatorProfile>,
) -> StoreResult<()> {
    for entry in entries {
        let invigilator = entry.invigilator();
        if profiles.contains_key(&invigilator) {
            continue;
        }
        if let Some(profile) = store.find_invigilator(invigilator).await? {
            profiles.insert(invigilator, profile);
        }
    }
    Ok(())
}

/// Prunes entry references from loaded profiles and returns delete ops.
///
/// Every profile that lost a reference is recorded in `touched` so the
/// caller emits exactly one `PutInvigilator` per profile after all pruning
/// and appending has settled.
pub(super) fn prune_ledger_ops(
    entries: &[ExperienceEntry],
    profiles: &mut HashMap<InvigilatorId, InvigilatorProfile>,
    touched: &mut HashSet<InvigilatorId>,
) -> Vec<WriteOp> {
    let deleted: Vec<_> = entries.iter().map(ExperienceEntry::id).collect();
    let mut ops = Vec::with_capacity(entries.len());
    for entry in entries {
        if let Some(profile) = profiles.get_mut(&entry.invigilator()) {
            profile.prune_experience(&deleted);
            touched.insert(entry.invigilator());
        }
        ops.push(WriteOp::DeleteLedgerEntry(entry.id()));
    }
    ops
}
