//! Adapter implementations of the assignment ports.

pub mod memory;
