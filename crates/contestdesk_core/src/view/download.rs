//! Download panel state.
//!
//! Lists problems in display order by full name and routes download and
//! backup requests to the configured exporters.

use crate::export::{
    BackupImporter, ExportArtifact, ExportError, ExportFormat, ExportResult, PendingFormat,
    ProblemExporter,
};
use crate::model::order::ConsistencyError;
use crate::model::problem::{Problem, ProblemId};
use crate::repo::problem_repo::ProblemRepository;
use crate::service::problem_service::{ProblemError, ProblemResult, ProblemService};

/// One downloadable problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadEntry {
    pub id: ProblemId,
    pub full_name: String,
}

pub struct DownloadPanel {
    package: Box<dyn ProblemExporter>,
    backup: Box<dyn ProblemExporter>,
    restore: Box<dyn BackupImporter>,
}

impl Default for DownloadPanel {
    fn default() -> Self {
        Self::new(
            Box::new(PendingFormat::new(ExportFormat::BocaZip)),
            Box::new(PendingFormat::new(ExportFormat::JsonBackup)),
            Box::new(PendingFormat::new(ExportFormat::JsonBackup)),
        )
    }
}

impl DownloadPanel {
    pub fn new(
        package: Box<dyn ProblemExporter>,
        backup: Box<dyn ProblemExporter>,
        restore: Box<dyn BackupImporter>,
    ) -> Self {
        Self {
            package,
            backup,
            restore,
        }
    }

    /// Problems in display order, by full name.
    pub fn entries<R: ProblemRepository>(
        &self,
        service: &ProblemService<R>,
    ) -> ProblemResult<Vec<DownloadEntry>> {
        Ok(service
            .ordered_problems()?
            .into_iter()
            .map(|problem| DownloadEntry {
                id: problem.id,
                full_name: problem.full_name,
            })
            .collect())
    }

    /// Packages every problem in display order.
    pub fn download_all<R: ProblemRepository>(
        &self,
        service: &ProblemService<R>,
    ) -> ExportResult<ExportArtifact> {
        let problems = service.ordered_problems()?;
        self.package.export(&problems)
    }

    /// Packages one listed problem.
    ///
    /// A stored problem missing from the order index is not offered by the
    /// panel and is refused as unlisted.
    pub fn download_problem<R: ProblemRepository>(
        &self,
        service: &ProblemService<R>,
        id: &ProblemId,
    ) -> ExportResult<ExportArtifact> {
        let problem = service
            .get_problem(id)?
            .ok_or_else(|| ExportError::Problem(ProblemError::NotFound(id.clone())))?;
        if !service.order_index()?.contains(id) {
            return Err(ProblemError::from(ConsistencyError::UnlistedProblem(id.clone())).into());
        }
        self.package.export(std::slice::from_ref(&problem))
    }

    /// Writes a whole-store backup in display order.
    pub fn download_backup<R: ProblemRepository>(
        &self,
        service: &ProblemService<R>,
    ) -> ExportResult<ExportArtifact> {
        let problems = service.ordered_problems()?;
        self.backup.export(&problems)
    }

    /// Restores problems from a backup file, appending them in file order.
    ///
    /// The restore is all-or-nothing: if any record is rejected, none is
    /// stored. Returns the created records.
    pub fn upload_backup<R: ProblemRepository>(
        &self,
        service: &ProblemService<R>,
        bytes: &[u8],
    ) -> ExportResult<Vec<Problem>> {
        let imported = self.restore.import(bytes)?;
        Ok(service.create_problems(&imported)?)
    }
}
