//! Presentation state for the problem list and download panel.
//!
//! # Responsibility
//! - Project store state into display-ready entries.
//! - Keep observers current through change-feed subscriptions.

pub mod download;
pub mod label;
pub mod list_view;
