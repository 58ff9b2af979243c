//! Subcommand execution against the core services.

use crate::args::{
    AddArgs, BackupCommand, Cli, Command, ContentArgs, EditArgs, OptionalTargetArgs, TargetArgs,
};
use contestdesk_core::db::{open_db, DbError};
use contestdesk_core::{
    core_version, init_logging, parse_position_label, position_label, AppConfig, ConfigError,
    ConfigOverrides, DownloadPanel, ExportArtifact, ExportError, ListView, Problem, ProblemError,
    ProblemId, ProblemRepository, ProblemService, ProblemValidationError, SqliteProblemRepository,
    StorageError,
};
use log::info;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum CliError {
    Config(ConfigError),
    Logging(String),
    Db(DbError),
    Storage(StorageError),
    Problem(ProblemError),
    Export(ExportError),
    /// Position argument is neither a label nor a number.
    InvalidPosition(String),
    /// Command needs a target that was not given.
    MissingTarget(&'static str),
    Io { path: PathBuf, source: std::io::Error },
    Output(std::io::Error),
    Json(serde_json::Error),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Logging(message) => write!(f, "{message}"),
            Self::Db(err) => write!(f, "cannot open database: {err}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Problem(err) => write!(f, "{err}"),
            Self::Export(err) => write!(f, "{err}"),
            Self::InvalidPosition(value) => write!(
                f,
                "invalid position `{value}`; use a list label (A, B, ...) or a zero-based number"
            ),
            Self::MissingTarget(hint) => write!(f, "{hint}"),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Output(err) => write!(f, "cannot write output: {err}"),
            Self::Json(err) => write!(f, "cannot encode JSON: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::Problem(err) => Some(err),
            Self::Export(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Output(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Logging(_) | Self::InvalidPosition(_) | Self::MissingTarget(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<StorageError> for CliError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<ProblemError> for CliError {
    fn from(value: ProblemError) -> Self {
        Self::Problem(value)
    }
}

impl From<ProblemValidationError> for CliError {
    fn from(value: ProblemValidationError) -> Self {
        Self::Problem(ProblemError::Validation(value))
    }
}

impl From<contestdesk_core::ConsistencyError> for CliError {
    fn from(value: contestdesk_core::ConsistencyError) -> Self {
        Self::Problem(ProblemError::Consistency(value))
    }
}

impl From<ExportError> for CliError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Output(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

pub type CliResult<T> = Result<T, CliError>;

/// JSON row for `list --json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListRow<'a> {
    label: String,
    id: &'a str,
    name: &'a str,
    full_name: &'a str,
}

/// Resolves configuration, opens the store and runs one command.
pub fn run(cli: Cli, out: &mut dyn Write) -> CliResult<()> {
    if let Command::Version = cli.command {
        writeln!(out, "contestdesk {}", core_version())?;
        return Ok(());
    }

    let config = AppConfig::resolve(ConfigOverrides {
        db_path: cli.db,
        log_level: cli.log_level,
        log_dir: cli.log_dir,
    })?;
    config.ensure_dirs()?;
    init_logging(config.log_level, &config.log_dir).map_err(CliError::Logging)?;
    info!(
        "event=cli_start module=cli status=ok db_path={}",
        config.db_path.display()
    );

    let conn = open_db(&config.db_path)?;
    let service = ProblemService::new(SqliteProblemRepository::try_new(&conn)?);
    execute(cli.command, &service, out)
}

fn execute<R: ProblemRepository>(
    command: Command,
    service: &ProblemService<R>,
    out: &mut dyn Write,
) -> CliResult<()> {
    match command {
        Command::Add(args) => add(args, service, out),
        Command::Edit(args) => edit(args, service, out),
        Command::Show { target, json } => show(&target, json, service, out),
        Command::List { json } => list(json, service, out),
        Command::Move { from, to } => {
            let from = parse_position(&from)?;
            let to = parse_position(&to)?;
            let mut view = ListView::open(service)?;
            view.reorder(service, from, to)?;
            print_entries(&view, out)
        }
        Command::Delete { target } => {
            let position = resolve_position(&target, service)?;
            let mut view = ListView::open(service)?;
            let removed = view.delete(service, position)?;
            writeln!(out, "deleted {removed}")?;
            Ok(())
        }
        Command::Check => check(service, out),
        Command::Repair => {
            let repair = service.repair_order()?;
            if repair.is_noop() {
                writeln!(out, "problem list already consistent")?;
                return Ok(());
            }
            for id in &repair.removed {
                writeln!(out, "removed entry {id}")?;
            }
            for id in &repair.appended {
                writeln!(out, "appended {id}")?;
            }
            Ok(())
        }
        Command::Export {
            all,
            target,
            out: path,
        } => {
            let panel = DownloadPanel::default();
            let artifact = if all {
                panel.download_all(service)?
            } else {
                let id = resolve_optional_id(&target, service)?;
                panel.download_problem(service, &id)?
            };
            write_artifact(artifact, path.as_deref(), out)
        }
        Command::Backup(BackupCommand::Download { out: path }) => {
            let artifact = DownloadPanel::default().download_backup(service)?;
            write_artifact(artifact, path.as_deref(), out)
        }
        Command::Backup(BackupCommand::Upload { path }) => {
            let bytes = read_file(&path)?;
            let created = DownloadPanel::default().upload_backup(service, &bytes)?;
            writeln!(out, "restored {} problems", created.len())?;
            Ok(())
        }
        Command::Version => {
            writeln!(out, "contestdesk {}", core_version())?;
            Ok(())
        }
    }
}

fn add<R: ProblemRepository>(
    args: AddArgs,
    service: &ProblemService<R>,
    out: &mut dyn Write,
) -> CliResult<()> {
    let id = match args.id {
        Some(raw) => ProblemId::parse(raw)?,
        None => ProblemId::generate(),
    };
    let full_name = args.full_name.unwrap_or_else(|| args.name.clone());
    let mut problem = Problem::with_id(id, args.name, full_name);
    if let Some(content) = read_content(&args.content)? {
        problem.content = content;
    }

    let created = service.create_problem(&problem)?;
    let position = service.order_index()?.position_of(&created.id);
    match position {
        Some(position) => writeln!(out, "{} {}", position_label(position), created.id)?,
        None => writeln!(out, "{}", created.id)?,
    }
    Ok(())
}

fn edit<R: ProblemRepository>(
    args: EditArgs,
    service: &ProblemService<R>,
    out: &mut dyn Write,
) -> CliResult<()> {
    let id = resolve_id(&args.target, service)?;
    let mut problem = service
        .get_problem(&id)?
        .ok_or_else(|| ProblemError::NotFound(id.clone()))?;
    if let Some(name) = args.name {
        problem.name = name;
    }
    if let Some(full_name) = args.full_name {
        problem.full_name = full_name;
    }
    if let Some(content) = read_content(&args.content)? {
        problem.content = content;
    }

    let updated = service.update_problem(&problem)?;
    writeln!(out, "updated {}", updated.id)?;
    Ok(())
}

fn show<R: ProblemRepository>(
    target: &TargetArgs,
    json: bool,
    service: &ProblemService<R>,
    out: &mut dyn Write,
) -> CliResult<()> {
    let id = resolve_id(target, service)?;
    let problem = service
        .get_problem(&id)?
        .ok_or_else(|| ProblemError::NotFound(id.clone()))?;

    if json {
        serde_json::to_writer_pretty(&mut *out, &problem)?;
        writeln!(out)?;
        return Ok(());
    }
    writeln!(out, "id:        {}", problem.id)?;
    writeln!(out, "name:      {}", problem.name)?;
    writeln!(out, "full name: {}", problem.full_name)?;
    if !problem.content.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", problem.content)?;
    }
    Ok(())
}

fn list<R: ProblemRepository>(
    json: bool,
    service: &ProblemService<R>,
    out: &mut dyn Write,
) -> CliResult<()> {
    let view = ListView::open(service)?;
    if !json {
        return print_entries(&view, out);
    }

    let problems = view.ordered_problems()?;
    let rows = problems
        .iter()
        .enumerate()
        .map(|(position, problem)| ListRow {
            label: position_label(position),
            id: problem.id.as_str(),
            name: &problem.name,
            full_name: &problem.full_name,
        })
        .collect::<Vec<_>>();
    serde_json::to_writer_pretty(&mut *out, &rows)?;
    writeln!(out)?;
    Ok(())
}

fn check<R: ProblemRepository>(service: &ProblemService<R>, out: &mut dyn Write) -> CliResult<()> {
    let findings = service.check_consistency()?;
    if findings.is_empty() {
        writeln!(out, "problem list is consistent")?;
        return Ok(());
    }
    for finding in &findings {
        writeln!(out, "{finding}")?;
    }
    writeln!(
        out,
        "{} issue(s) found; run `contestdesk repair`",
        findings.len()
    )?;
    Ok(())
}

fn print_entries(view: &ListView, out: &mut dyn Write) -> CliResult<()> {
    let entries = view.entries()?;
    if entries.is_empty() {
        writeln!(out, "No problems yet.")?;
        return Ok(());
    }
    for entry in entries {
        writeln!(out, "{} - {}  ({})", entry.label, entry.short_name, entry.id)?;
    }
    Ok(())
}

fn parse_position(value: &str) -> CliResult<usize> {
    let trimmed = value.trim();
    if let Ok(position) = trimmed.parse::<usize>() {
        return Ok(position);
    }
    parse_position_label(trimmed).ok_or_else(|| CliError::InvalidPosition(value.to_string()))
}

fn resolve_position<R: ProblemRepository>(
    target: &TargetArgs,
    service: &ProblemService<R>,
) -> CliResult<usize> {
    if let Some(position) = &target.position {
        return parse_position(position);
    }
    let id = resolve_id(target, service)?;
    service
        .order_index()?
        .position_of(&id)
        .ok_or_else(|| match service.get_problem(&id) {
            Ok(Some(_)) => contestdesk_core::ConsistencyError::UnlistedProblem(id.clone()).into(),
            Ok(None) => ProblemError::NotFound(id.clone()).into(),
            Err(err) => err.into(),
        })
}

fn resolve_id<R: ProblemRepository>(
    target: &TargetArgs,
    service: &ProblemService<R>,
) -> CliResult<ProblemId> {
    id_for(target.position.as_deref(), target.id.as_deref(), service)?
        .ok_or(CliError::MissingTarget("pass a list position or --id"))
}

fn resolve_optional_id<R: ProblemRepository>(
    target: &OptionalTargetArgs,
    service: &ProblemService<R>,
) -> CliResult<ProblemId> {
    id_for(target.position.as_deref(), target.id.as_deref(), service)?
        .ok_or(CliError::MissingTarget("pass --all, a list position, or --id"))
}

fn id_for<R: ProblemRepository>(
    position: Option<&str>,
    id: Option<&str>,
    service: &ProblemService<R>,
) -> CliResult<Option<ProblemId>> {
    if let Some(raw) = id {
        return Ok(Some(ProblemId::parse(raw)?));
    }
    let Some(raw) = position else {
        return Ok(None);
    };
    let position = parse_position(raw)?;
    let order = service.order_index()?;
    let id = order
        .get(position)
        .cloned()
        .ok_or(contestdesk_core::ConsistencyError::PositionOutOfRange {
            position,
            len: order.len(),
        })?;
    Ok(Some(id))
}

fn read_content(args: &ContentArgs) -> CliResult<Option<String>> {
    if let Some(content) = &args.content {
        return Ok(Some(content.clone()));
    }
    match &args.content_file {
        Some(path) => {
            let bytes = read_file(path)?;
            Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
        }
        None => Ok(None),
    }
}

fn read_file(path: &Path) -> CliResult<Vec<u8>> {
    std::fs::read(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_artifact(
    artifact: ExportArtifact,
    path: Option<&Path>,
    out: &mut dyn Write,
) -> CliResult<()> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&artifact.file_name));
    std::fs::write(&path, &artifact.bytes).map_err(|source| CliError::Io {
        path: path.clone(),
        source,
    })?;
    writeln!(out, "wrote {}", path.display())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{parse_position, CliError};

    #[test]
    fn positions_accept_labels_and_numbers() {
        assert_eq!(parse_position("A").unwrap(), 0);
        assert_eq!(parse_position("c").unwrap(), 2);
        assert_eq!(parse_position("AA").unwrap(), 26);
        assert_eq!(parse_position(" 4 ").unwrap(), 4);
    }

    #[test]
    fn positions_reject_other_text() {
        let err = parse_position("p-1").unwrap_err();
        assert!(matches!(err, CliError::InvalidPosition(value) if value == "p-1"));
    }
}
