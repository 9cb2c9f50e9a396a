//! Port contracts for the assignment engine.

mod store;

pub use store::{AssignmentStore, StoreError, StoreResult, VersionGuard, WriteBatch, WriteOp};
