//! Invigilator assignment for district exam tasks.
//!
//! This module implements the assignment engine: creating assignment tasks
//! over a set of exam centers, ingesting per-center staffing requirements,
//! running the constrained random allocation per role, and keeping the five
//! related record types (task, requirement records, result sets, experience
//! ledger entries, and invigilator profiles) mutually consistent across
//! edit and delete cascades. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
