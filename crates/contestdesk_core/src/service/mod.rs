//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Publish change notifications after successful mutations.

pub mod problem_service;
