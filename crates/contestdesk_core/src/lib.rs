//! Core domain logic for contestdesk.
//! This crate owns the problem store, its order index, and the list and
//! download views built on top of them.

pub mod config;
pub mod db;
pub mod export;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;
pub mod view;

pub use config::{AppConfig, ConfigError, ConfigOverrides};
pub use export::{
    BackupImporter, ExportArtifact, ExportError, ExportFormat, PendingFormat, ProblemExporter,
};
pub use logging::{default_log_level, flush_logging, init_logging, logging_status};
pub use model::order::{ConsistencyError, OrderIndex};
pub use model::problem::{Problem, ProblemId, ProblemValidationError};
pub use notify::{ChangeEvent, ChangeFeed, Subscription};
pub use repo::problem_repo::{
    OrderRepair, ProblemRepository, SqliteProblemRepository, StorageError, StorageResult,
};
pub use service::problem_service::{ProblemError, ProblemResult, ProblemService};
pub use view::download::{DownloadEntry, DownloadPanel};
pub use view::label::{parse_position_label, position_label};
pub use view::list_view::{ListEntry, ListView, Notice};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
