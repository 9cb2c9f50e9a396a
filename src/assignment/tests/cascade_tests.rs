//! Allocation runs and edit/delete cascade consistency tests.

use crate::assignment::{
    domain::{
        AllocationError, AssignmentTask, CenterAllocation, InvigilatorId, Role, TaskStatus,
    },
    ports::AssignmentStore,
    services::{
        AllocationServiceError, EditResultSetRequest, EditTaskRequest, ReallocationPolicy,
        SubmitRequirementsRequest,
    },
    tests::harness::{
        World, build_world, create_task, create_task_with_deadline, future_deadline,
        past_deadline, submit_single_role,
    },
};
use chrono::Duration;
use rstest::rstest;
use std::collections::HashSet;

const ROLE: Role = Role::Invigilator;

/// Creates a two-center task with submitted single-role requirements.
///
/// Center 0 needs two invigilators (pool: school 2's bench), center 1 needs
/// one (pool: school 3's bench), so every pool member is neutral for both
/// centers.
async fn submitted_task(world: &World) -> AssignmentTask {
    let task = create_task(world, &[0, 1]).await;
    submit_single_role(world, task.id(), 0, ROLE, 2, world.pool_from_schools(&[2])).await;
    submit_single_role(world, task.id(), 1, ROLE, 1, world.pool_from_schools(&[3])).await;
    world
        .tasks()
        .find_task(task.id())
        .await
        .expect("lookup should succeed")
        .expect("task should exist")
}

async fn profile_experience(world: &World, invigilator: InvigilatorId) -> Vec<InvigilatorId> {
    // Returns the invigilators recorded in the profile's ledger entries,
    // resolving each back-reference through the store.
    let profile = world
        .registry()
        .find_invigilator(invigilator)
        .await
        .expect("lookup should succeed")
        .expect("profile should exist");
    let mut owners = Vec::new();
    for entry_id in profile.experience() {
        let entry = world
            .store
            .find_ledger_entry(*entry_id)
            .await
            .expect("lookup should succeed")
            .expect("referenced ledger entry should exist");
        owners.push(entry.invigilator());
    }
    owners
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn allocation_commits_results_ledger_and_flags_together() {
    let world = build_world(4, 3).await;
    let task = submitted_task(&world).await;

    let result_set = world
        .allocator(42)
        .allocate(task.id(), ROLE)
        .await
        .expect("allocation should succeed");

    assert_eq!(result_set.entries().len(), 2);
    assert_eq!(result_set.entries()[0].exam_center(), world.center_id(0));
    assert_eq!(result_set.entries()[0].invigilators().len(), 2);
    assert_eq!(result_set.entries()[1].exam_center(), world.center_id(1));
    assert_eq!(result_set.entries()[1].invigilators().len(), 1);

    let assigned: HashSet<InvigilatorId> =
        result_set.assigned_invigilators().into_iter().collect();
    assert_eq!(assigned.len(), 3, "no double-booking within the run");

    let stored_task = world
        .tasks()
        .find_task(task.id())
        .await
        .expect("lookup should succeed")
        .expect("task should exist");
    assert!(stored_task.roles_complete().is_complete(ROLE));
    assert_eq!(stored_task.result_sets(), [result_set.id()].as_slice());

    let ledger = world
        .store
        .ledger_for_task(task.id())
        .await
        .expect("ledger read should succeed");
    assert_eq!(ledger.len(), 3);
    for invigilator in &assigned {
        assert_eq!(
            profile_experience(&world, *invigilator).await,
            vec![*invigilator]
        );
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reject_policy_keeps_the_committed_run() {
    let world = build_world(4, 3).await;
    let task = submitted_task(&world).await;
    let allocator = world.allocator(42);

    let first = allocator
        .allocate(task.id(), ROLE)
        .await
        .expect("first run should succeed");
    let second = allocator.allocate(task.id(), ROLE).await;

    assert!(matches!(
        second,
        Err(AllocationServiceError::Allocation(
            AllocationError::RoleAlreadyAllocated(role)
        )) if role == ROLE
    ));
    let stored = world
        .store
        .find_result_set(task.id(), ROLE)
        .await
        .expect("lookup should succeed")
        .expect("result set should remain");
    assert_eq!(stored.id(), first.id());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn supersede_policy_replaces_run_and_ledger() {
    let world = build_world(4, 3).await;
    let task = submitted_task(&world).await;
    let allocator = world.allocator(42).with_policy(ReallocationPolicy::Supersede);

    let first = allocator
        .allocate(task.id(), ROLE)
        .await
        .expect("first run should succeed");
    let first_ledger: HashSet<_> = world
        .store
        .ledger_for_task(task.id())
        .await
        .expect("ledger read should succeed")
        .iter()
        .map(crate::assignment::domain::ExperienceEntry::id)
        .collect();

    let second = allocator
        .allocate(task.id(), ROLE)
        .await
        .expect("superseding run should succeed");
    assert_ne!(second.id(), first.id());

    let stored_task = world
        .tasks()
        .find_task(task.id())
        .await
        .expect("lookup should succeed")
        .expect("task should exist");
    assert_eq!(stored_task.result_sets(), [second.id()].as_slice());
    assert!(stored_task.roles_complete().is_complete(ROLE));

    let ledger = world
        .store
        .ledger_for_task(task.id())
        .await
        .expect("ledger read should succeed");
    assert_eq!(ledger.len(), 3);
    assert!(
        ledger.iter().all(|entry| !first_ledger.contains(&entry.id())),
        "the superseded run's ledger entries must be gone"
    );

    // Profiles reference only the new entries.
    for invigilator in second.assigned_invigilators() {
        assert_eq!(
            profile_experience(&world, invigilator).await,
            vec![invigilator]
        );
    }
    for invigilator in first.assigned_invigilators() {
        if !second.assigned_invigilators().contains(&invigilator) {
            assert!(profile_experience(&world, invigilator).await.is_empty());
        }
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_failed_run_commits_nothing() {
    let world = build_world(4, 3).await;
    let task = create_task(&world, &[0, 1]).await;
    // Demand five against a three-member pool.
    submit_single_role(&world, task.id(), 0, ROLE, 5, world.pool_from_schools(&[2])).await;
    submit_single_role(&world, task.id(), 1, ROLE, 0, Vec::new()).await;
    let before = world
        .tasks()
        .find_task(task.id())
        .await
        .expect("lookup should succeed")
        .expect("task should exist");

    let result = world.allocator(42).allocate(task.id(), ROLE).await;
    assert!(matches!(
        result,
        Err(AllocationServiceError::Allocation(
            AllocationError::InsufficientPool { required: 5, available: 3, .. }
        ))
    ));

    let after = world
        .tasks()
        .find_task(task.id())
        .await
        .expect("lookup should succeed")
        .expect("task should exist");
    assert_eq!(after.version(), before.version());
    assert!(!after.roles_complete().is_complete(ROLE));
    assert!(after.result_sets().is_empty());
    assert!(
        world
            .store
            .ledger_for_task(task.id())
            .await
            .expect("ledger read should succeed")
            .is_empty()
    );
    for invigilator in world.pool_from_schools(&[2]) {
        assert!(profile_experience(&world, invigilator).await.is_empty());
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completing_all_six_roles_finishes_the_task() {
    let world = build_world(4, 3).await;
    let task = create_task_with_deadline(&world, &[0, 1], past_deadline()).await;
    let pool_a = world.pool_from_schools(&[2]);
    let pool_b = world.pool_from_schools(&[3]);

    let mut submission_a = SubmitRequirementsRequest::new(task.id(), world.center_id(0));
    let mut submission_b = SubmitRequirementsRequest::new(task.id(), world.center_id(1));
    for role in Role::ALL {
        submission_a = submission_a.with_demand(role, 1, pool_a.clone());
        submission_b = submission_b.with_demand(role, 1, pool_b.clone());
    }
    world
        .tasks()
        .submit_requirements(submission_a)
        .await
        .expect("first submission should succeed");
    world
        .tasks()
        .submit_requirements(submission_b)
        .await
        .expect("second submission should succeed");

    let allocator = world.allocator(7);
    let (last, rest) = Role::ALL.split_last().expect("six roles");
    for role in rest {
        allocator
            .allocate(task.id(), *role)
            .await
            .expect("role run should succeed");
    }
    assert_eq!(
        world
            .tasks()
            .get_status(task.id())
            .await
            .expect("status query should succeed"),
        TaskStatus::Assigning
    );

    allocator
        .allocate(task.id(), *last)
        .await
        .expect("final role run should succeed");
    assert_eq!(
        world
            .tasks()
            .get_status(task.id())
            .await
            .expect("status query should succeed"),
        TaskStatus::AssignmentComplete
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn editing_the_center_set_resets_every_allocation() {
    let world = build_world(4, 3).await;
    let task = submitted_task(&world).await;
    let result_set = world
        .allocator(42)
        .allocate(task.id(), ROLE)
        .await
        .expect("allocation should succeed");

    let edited = world
        .tasks()
        .edit_task(EditTaskRequest::new(
            task.id(),
            "SPM staffing, round two",
            "SPM",
            future_deadline(),
            future_deadline() + Duration::days(14),
            vec![world.center_id(0), world.center_id(2)],
        ))
        .await
        .expect("edit should succeed");

    assert_eq!(edited.title().as_str(), "SPM staffing, round two");
    assert!(edited.result_sets().is_empty());
    assert!(Role::ALL.iter().all(|role| !edited.roles_complete().is_complete(*role)));
    assert_eq!(edited.status(), TaskStatus::CollectingData);

    // Allocation artifacts are gone.
    assert!(
        world
            .store
            .find_result_set(task.id(), ROLE)
            .await
            .expect("lookup should succeed")
            .is_none()
    );
    assert!(
        world
            .store
            .ledger_for_task(task.id())
            .await
            .expect("ledger read should succeed")
            .is_empty()
    );
    for invigilator in result_set.assigned_invigilators() {
        assert!(profile_experience(&world, invigilator).await.is_empty());
    }

    // The removed center lost its requirement record and task reference;
    // the kept center's record survived.
    assert!(
        world
            .store
            .find_requirement(task.id(), world.center_id(1))
            .await
            .expect("lookup should succeed")
            .is_none()
    );
    assert!(
        world
            .store
            .find_requirement(task.id(), world.center_id(0))
            .await
            .expect("lookup should succeed")
            .is_some()
    );
    let removed_center = world
        .registry()
        .find_exam_center(world.center_id(1))
        .await
        .expect("lookup should succeed")
        .expect("center should exist");
    assert!(removed_center.assignment_tasks().is_empty());
    let added_center = world
        .registry()
        .find_exam_center(world.center_id(2))
        .await
        .expect("lookup should succeed")
        .expect("center should exist");
    assert_eq!(added_center.assignment_tasks(), [task.id()].as_slice());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn editing_details_alone_preserves_allocations() {
    let world = build_world(4, 3).await;
    let task = submitted_task(&world).await;
    let result_set = world
        .allocator(42)
        .allocate(task.id(), ROLE)
        .await
        .expect("allocation should succeed");

    let edited = world
        .tasks()
        .edit_task(EditTaskRequest::new(
            task.id(),
            "Renamed staffing round",
            "SPM",
            task.collection_deadline(),
            task.assignment_date(),
            vec![world.center_id(0), world.center_id(1)],
        ))
        .await
        .expect("edit should succeed");

    assert_eq!(edited.title().as_str(), "Renamed staffing round");
    assert_eq!(edited.result_sets(), [result_set.id()].as_slice());
    assert!(edited.roles_complete().is_complete(ROLE));
    assert!(
        world
            .store
            .find_result_set(task.id(), ROLE)
            .await
            .expect("lookup should succeed")
            .is_some()
    );
    assert!(
        world
            .store
            .find_requirement(task.id(), world.center_id(0))
            .await
            .expect("lookup should succeed")
            .is_some()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_task_leaves_no_trace_in_the_graph() {
    let world = build_world(4, 3).await;
    let task = submitted_task(&world).await;
    let result_set = world
        .allocator(42)
        .allocate(task.id(), ROLE)
        .await
        .expect("allocation should succeed");

    world
        .tasks()
        .delete_task(task.id())
        .await
        .expect("delete should succeed");

    assert!(
        world
            .store
            .find_task(task.id())
            .await
            .expect("lookup should succeed")
            .is_none()
    );
    for index in [0, 1] {
        assert!(
            world
                .store
                .find_requirement(task.id(), world.center_id(index))
                .await
                .expect("lookup should succeed")
                .is_none()
        );
        let center = world
            .registry()
            .find_exam_center(world.center_id(index))
            .await
            .expect("lookup should succeed")
            .expect("center should exist");
        assert!(center.assignment_tasks().is_empty());
    }
    assert!(
        world
            .store
            .result_sets_for_task(task.id())
            .await
            .expect("lookup should succeed")
            .is_empty()
    );
    assert!(
        world
            .store
            .ledger_for_task(task.id())
            .await
            .expect("ledger read should succeed")
            .is_empty()
    );
    for invigilator in result_set.assigned_invigilators() {
        assert!(profile_experience(&world, invigilator).await.is_empty());
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_manual_result_edit_rebuilds_the_role_ledger() {
    let world = build_world(4, 2).await;
    let task = create_task(&world, &[0, 1]).await;
    let pool = world.pool_from_schools(&[2]);
    submit_single_role(&world, task.id(), 0, ROLE, 1, pool.clone()).await;
    submit_single_role(&world, task.id(), 1, ROLE, 1, Vec::new()).await;

    let allocator = world.allocator(42);
    let original = allocator
        .allocate(task.id(), ROLE)
        .await
        .expect("allocation should succeed");
    let at_first = original.entries()[0].invigilators()[0];
    let at_second = original.entries()[1].invigilators()[0];

    // Swap the two placements by hand.
    let swapped = vec![
        CenterAllocation::new(world.center_id(0), vec![at_second]),
        CenterAllocation::new(world.center_id(1), vec![at_first]),
    ];
    let edited = allocator
        .edit_result_set(EditResultSetRequest::new(task.id(), ROLE, swapped.clone()))
        .await
        .expect("manual edit should succeed");
    assert_eq!(edited.id(), original.id());
    assert_eq!(edited.entries(), swapped.as_slice());

    let ledger = world
        .store
        .ledger_for_task(task.id())
        .await
        .expect("ledger read should succeed");
    assert_eq!(ledger.len(), 2);
    for entry in &ledger {
        let expected_center = if entry.invigilator() == at_second {
            world.center_id(0)
        } else {
            world.center_id(1)
        };
        assert_eq!(entry.assigned_to(), expected_center);
    }
    for invigilator in [at_first, at_second] {
        assert_eq!(
            profile_experience(&world, invigilator).await,
            vec![invigilator]
        );
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_manual_edit_placing_someone_at_home_is_rejected() {
    let world = build_world(4, 2).await;
    let task = create_task(&world, &[0, 1]).await;
    // Pools mix school 0's own bench with neutral school 2.
    let own_bench = world.pool_from_schools(&[0]);
    let mut pool = own_bench.clone();
    pool.extend(world.pool_from_schools(&[2]));
    submit_single_role(&world, task.id(), 0, ROLE, 1, pool).await;
    submit_single_role(&world, task.id(), 1, ROLE, 1, Vec::new()).await;

    let allocator = world.allocator(42);
    let original = allocator
        .allocate(task.id(), ROLE)
        .await
        .expect("allocation should succeed");

    // Force a school-0 teacher onto the school-0 center.
    let tampered = vec![
        CenterAllocation::new(world.center_id(0), vec![own_bench[0]]),
        CenterAllocation::new(world.center_id(1), vec![world.pool_from_schools(&[2])[0]]),
    ];
    let result = allocator
        .edit_result_set(EditResultSetRequest::new(task.id(), ROLE, tampered))
        .await;
    assert!(matches!(
        result,
        Err(AllocationServiceError::Allocation(
            AllocationError::HomeSchoolConflict { invigilator, exam_center }
        )) if invigilator == own_bench[0] && exam_center == world.center_id(0)
    ));

    let stored = world
        .store
        .find_result_set(task.id(), ROLE)
        .await
        .expect("lookup should succeed")
        .expect("result set should remain");
    assert_eq!(stored.entries(), original.entries());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invigilator_history_and_resolved_view_line_up() {
    let world = build_world(4, 3).await;
    let task = submitted_task(&world).await;
    let allocator = world.allocator(42);
    let result_set = allocator
        .allocate(task.id(), ROLE)
        .await
        .expect("allocation should succeed");

    let someone = result_set.entries()[1].invigilators()[0];
    let history = allocator
        .assignments_for_invigilator(someone)
        .await
        .expect("history query should succeed");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role(), ROLE);
    assert_eq!(history[0].assignment_task(), task.id());
    assert_eq!(history[0].assigned_to(), world.center_id(1));

    let resolved = allocator
        .resolved_result_set(task.id(), ROLE)
        .await
        .expect("resolution should succeed")
        .expect("result set should exist");
    assert_eq!(resolved.task, task.id());
    assert_eq!(resolved.role, ROLE);
    assert_eq!(resolved.entries.len(), 2);
    assert_eq!(resolved.entries[0].center_code, "EC-000");
    assert_eq!(resolved.entries[0].school_name, "SK Taman 0");
    assert_eq!(resolved.entries[0].invigilators.len(), 2);
    assert!(
        resolved.entries[0]
            .invigilators
            .iter()
            .all(|resolved_invigilator| resolved_invigilator.name.starts_with("Teacher"))
    );
}
