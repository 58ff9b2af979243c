//! Domain model for contest problems and their display order.
//!
//! # Invariants
//! - Every problem is identified by a stable `ProblemId`.
//! - Display order is an explicit `OrderIndex` value, never ambient state.

pub mod order;
pub mod problem;
