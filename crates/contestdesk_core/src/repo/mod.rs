//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Writes that touch both `problems` and the order index run in one
//!   transaction.
//! - Repository APIs return semantic errors (`NotFound`, `Consistency`) in
//!   addition to DB transport errors.

pub mod problem_repo;
