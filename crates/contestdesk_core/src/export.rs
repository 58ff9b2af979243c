//! Export and backup entry points.
//!
//! # Responsibility
//! - Declare the collaborator contracts for problem packages and backups.
//! - Provide the placeholder implementation used until a format is defined.
//!
//! # Invariants
//! - The placeholder never produces bytes; it reports `FormatUndefined`.

use crate::model::problem::Problem;
use crate::service::problem_service::ProblemError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// File formats the download panel offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Whole-store backup for later editing on another machine.
    JsonBackup,
    /// Contest-ready BOCA problem package.
    BocaZip,
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::JsonBackup => f.write_str("json-backup"),
            Self::BocaZip => f.write_str("boca-zip"),
        }
    }
}

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
pub enum ExportError {
    /// No byte layout is defined for this format yet.
    FormatUndefined(ExportFormat),
    /// Problem set could not be loaded.
    Problem(ProblemError),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FormatUndefined(format) => {
                write!(f, "export format `{format}` is not defined yet")
            }
            Self::Problem(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::FormatUndefined(_) => None,
            Self::Problem(err) => Some(err),
        }
    }
}

impl From<ProblemError> for ExportError {
    fn from(value: ProblemError) -> Self {
        Self::Problem(value)
    }
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Turns an ordered problem selection into one file.
pub trait ProblemExporter {
    fn format(&self) -> ExportFormat;
    fn export(&self, problems: &[Problem]) -> ExportResult<ExportArtifact>;
}

/// Reads a backup file back into problem records, in stored order.
pub trait BackupImporter {
    fn import(&self, bytes: &[u8]) -> ExportResult<Vec<Problem>>;
}

/// Placeholder collaborator for a format whose layout is still undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingFormat {
    format: ExportFormat,
}

impl PendingFormat {
    pub fn new(format: ExportFormat) -> Self {
        Self { format }
    }
}

impl ProblemExporter for PendingFormat {
    fn format(&self) -> ExportFormat {
        self.format
    }

    fn export(&self, problems: &[Problem]) -> ExportResult<ExportArtifact> {
        let ids = problems
            .iter()
            .map(|problem| problem.id.as_str())
            .collect::<Vec<_>>()
            .join(",");
        info!(
            "event=export_request module=export status=unsupported format={} count={} ids={}",
            self.format,
            problems.len(),
            ids
        );
        Err(ExportError::FormatUndefined(self.format))
    }
}

impl BackupImporter for PendingFormat {
    fn import(&self, bytes: &[u8]) -> ExportResult<Vec<Problem>> {
        info!(
            "event=import_request module=export status=unsupported format={} bytes={}",
            self.format,
            bytes.len()
        );
        Err(ExportError::FormatUndefined(self.format))
    }
}
