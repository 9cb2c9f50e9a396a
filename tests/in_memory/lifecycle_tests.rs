//! End-to-end lifecycle tests over the in-memory store.

use super::helpers::{DISTRICT, district};
use chrono::{Duration, Utc};
use invigilo::assignment::{
    domain::{ResultSet, Role, TaskStatus},
    ports::AssignmentStore,
    services::{CreateTaskRequest, EditTaskRequest, SubmitRequirementsRequest},
};
use rstest::rstest;
use std::collections::HashSet;

/// Asserts a result set fills every center without double-booking anyone.
///
/// # Errors
///
/// Returns an error when an entry count is off or an invigilator appears
/// in more than one entry.
fn assert_filled_without_double_booking(
    result_set: &ResultSet,
    expected_counts: &[usize],
) -> Result<(), eyre::Report> {
    eyre::ensure!(
        result_set.entries().len() == expected_counts.len(),
        "expected {} entries, found {}",
        expected_counts.len(),
        result_set.entries().len()
    );
    for (entry, expected) in result_set.entries().iter().zip(expected_counts) {
        eyre::ensure!(
            entry.invigilators().len() == *expected,
            "center {} expected {} invigilators, found {}",
            entry.exam_center(),
            expected,
            entry.invigilators().len()
        );
    }
    let assigned: HashSet<_> = result_set.assigned_invigilators().into_iter().collect();
    eyre::ensure!(
        assigned.len() == result_set.assigned_invigilators().len(),
        "an invigilator was assigned to more than one center"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_task_runs_from_collection_to_completed_assignment() -> Result<(), eyre::Report> {
    let fixture = district(4, 3).await;
    let deadline = Utc::now() - Duration::days(1);
    let task = fixture
        .tasks()
        .create_task(CreateTaskRequest::new(
            DISTRICT,
            "SPM invigilation 2026",
            "SPM",
            deadline,
            deadline + Duration::days(21),
            vec![fixture.center_id(0), fixture.center_id(1)],
        ))
        .await
        .expect("task creation should succeed");
    assert_eq!(task.status(), TaskStatus::CollectionIncomplete);

    // Both centers submit demand for every role, drawing on the two
    // schools that host no participating center.
    let pool_a = fixture.pool_from_schools(&[2]);
    let pool_b = fixture.pool_from_schools(&[3]);
    let mut submission_a = SubmitRequirementsRequest::new(task.id(), fixture.center_id(0));
    let mut submission_b = SubmitRequirementsRequest::new(task.id(), fixture.center_id(1));
    for role in Role::ALL {
        submission_a = submission_a.with_demand(role, 1, pool_a.clone());
        submission_b = submission_b.with_demand(role, 1, pool_b.clone());
    }
    fixture
        .tasks()
        .submit_requirements(submission_a)
        .await
        .expect("first submission should succeed");
    let collected = fixture
        .tasks()
        .submit_requirements(submission_b)
        .await
        .expect("second submission should succeed");
    assert_eq!(collected.status(), TaskStatus::Assigning);

    // Run all six roles and watch the task finish.
    let allocator = fixture.allocator(2026);
    for role in Role::ALL {
        let result_set = allocator
            .allocate(task.id(), role)
            .await
            .expect("role run should succeed");
        assert_filled_without_double_booking(&result_set, &[1, 1])?;
    }
    assert_eq!(
        fixture
            .tasks()
            .get_status(task.id())
            .await
            .expect("status query should succeed"),
        TaskStatus::AssignmentComplete
    );

    // The notification view resolves registry fields for rendering.
    let resolved = allocator
        .resolved_result_set(task.id(), Role::ChiefInvigilator)
        .await
        .expect("resolution should succeed")
        .expect("result set should exist");
    assert_eq!(resolved.entries.len(), 2);
    assert_eq!(resolved.entries[0].center_code, "EC-000");
    assert_eq!(resolved.entries[1].center_code, "EC-001");
    assert!(
        resolved.entries[0].invigilators[0]
            .home_school
            .starts_with("SK Taman")
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn growing_the_center_set_restarts_collection() {
    let fixture = district(4, 3).await;
    let deadline = Utc::now() + Duration::days(7);
    let task = fixture
        .tasks()
        .create_task(CreateTaskRequest::new(
            DISTRICT,
            "SPM invigilation 2026",
            "SPM",
            deadline,
            deadline + Duration::days(21),
            vec![fixture.center_id(0), fixture.center_id(1)],
        ))
        .await
        .expect("task creation should succeed");

    let pool = fixture.pool_from_schools(&[3]);
    for center_index in [0, 1] {
        fixture
            .tasks()
            .submit_requirements(
                SubmitRequirementsRequest::new(task.id(), fixture.center_id(center_index))
                    .with_demand(Role::RoomKeeper, 1, pool.clone()),
            )
            .await
            .expect("submission should succeed");
    }
    let allocator = fixture.allocator(7);
    allocator
        .allocate(task.id(), Role::RoomKeeper)
        .await
        .expect("allocation should succeed");

    let edited = fixture
        .tasks()
        .edit_task(EditTaskRequest::new(
            task.id(),
            "SPM invigilation 2026",
            "SPM",
            deadline,
            deadline + Duration::days(21),
            vec![
                fixture.center_id(0),
                fixture.center_id(1),
                fixture.center_id(2),
            ],
        ))
        .await
        .expect("edit should succeed");

    // The widened task collects again; the finished run is gone and every
    // invigilator's history with it.
    assert_eq!(edited.status(), TaskStatus::CollectingData);
    assert!(edited.result_sets().is_empty());
    assert!(
        fixture
            .store
            .ledger_for_task(task.id())
            .await
            .expect("ledger read should succeed")
            .is_empty()
    );
    for invigilator in pool {
        let profile = fixture
            .registry()
            .find_invigilator(invigilator)
            .await
            .expect("lookup should succeed")
            .expect("profile should exist");
        assert!(profile.experience().is_empty());
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deletion_detaches_the_task_from_the_registry() {
    let fixture = district(3, 2).await;
    let deadline = Utc::now() + Duration::days(7);
    let task = fixture
        .tasks()
        .create_task(CreateTaskRequest::new(
            DISTRICT,
            "Trial exam staffing",
            "Trial",
            deadline,
            deadline + Duration::days(10),
            vec![fixture.center_id(0), fixture.center_id(1)],
        ))
        .await
        .expect("task creation should succeed");

    fixture
        .tasks()
        .delete_task(task.id())
        .await
        .expect("delete should succeed");

    assert!(
        fixture
            .tasks()
            .find_task(task.id())
            .await
            .expect("lookup should succeed")
            .is_none()
    );
    for center_index in [0, 1] {
        let center = fixture
            .registry()
            .find_exam_center(fixture.center_id(center_index))
            .await
            .expect("lookup should succeed")
            .expect("center should exist");
        assert!(center.assignment_tasks().is_empty());
    }
}
