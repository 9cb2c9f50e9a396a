//! Serialization stability tests for wire-facing domain types.

use invigilo::assignment::domain::{
    CenterAllocation, CollectionState, ExamCenterId, InvigilatorId, ResultSet, Role, TaskId,
    TaskStatus,
};
use rstest::rstest;
use serde_json::json;

#[rstest]
fn role_and_status_serialize_as_snake_case() {
    assert_eq!(
        serde_json::to_value(Role::ViceChiefInvigilator).expect("role serializes"),
        json!("vice_chief_invigilator")
    );
    assert_eq!(
        serde_json::to_value(TaskStatus::CollectionIncomplete).expect("status serializes"),
        json!("collection_incomplete")
    );
    assert_eq!(
        serde_json::to_value(CollectionState::Complete).expect("state serializes"),
        json!("complete")
    );
}

#[rstest]
fn identifiers_serialize_transparently() {
    let id = TaskId::new();
    let value = serde_json::to_value(id).expect("id serializes");
    assert_eq!(value, json!(id.into_inner().to_string()));

    let parsed: TaskId = serde_json::from_value(value).expect("id parses");
    assert_eq!(parsed, id);
}

#[rstest]
fn result_sets_round_trip_through_json() {
    let center = ExamCenterId::new();
    let invigilators = vec![InvigilatorId::new(), InvigilatorId::new()];
    let result_set = ResultSet::new(
        TaskId::new(),
        Role::RoomKeeper,
        vec![CenterAllocation::new(center, invigilators.clone())],
    );

    let encoded = serde_json::to_string(&result_set).expect("result set serializes");
    let decoded: ResultSet = serde_json::from_str(&encoded).expect("result set parses");
    assert_eq!(decoded, result_set);
    assert_eq!(decoded.entries()[0].exam_center(), center);
    assert_eq!(decoded.entries()[0].invigilators(), invigilators.as_slice());
}
