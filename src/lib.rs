//! Invigilo: invigilator assignment engine for a district exam office.
//!
//! This crate implements the assignment and consistency engine behind a
//! school district's exam staffing workflow: exam centers submit staffing
//! requirements for an assignment task, the engine randomly allocates
//! eligible invigilators per role per center (never to their own school),
//! records each invigilator's experience history, and derives a lifecycle
//! status for every task from its collection and assignment progress.
//!
//! # Architecture
//!
//! Invigilo follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (storage backends)
//!
//! # Modules
//!
//! - [`assignment`]: Task lifecycle, constrained random allocation, and the
//!   multi-entity cascade logic that keeps tasks, requirement records,
//!   result sets, the experience ledger, and invigilator profiles
//!   mutually consistent

pub mod assignment;
