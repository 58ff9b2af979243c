//! Problem repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist problem records and the `problemsOrder` index record.
//! - Keep every write that spans both tables atomic.
//!
//! # Invariants
//! - `problemsOrder` is stored in `miscellaneous.value` as a JSON array of ids.
//! - A missing `problemsOrder` row reads as an empty index.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::{latest_version, schema_version};
use crate::db::DbError;
use crate::model::order::{ConsistencyError, OrderIndex};
use crate::model::problem::{Problem, ProblemId, ProblemValidationError};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const ORDER_RECORD_NAME: &str = "problemsOrder";

const PROBLEM_SELECT_SQL: &str = "SELECT
    id,
    name,
    full_name,
    content,
    created_at,
    updated_at
FROM problems";

pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence failure from problem repository operations.
#[derive(Debug)]
pub enum StorageError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Record failed validation before write.
    Validation(ProblemValidationError),
    /// Target problem does not exist.
    NotFound(ProblemId),
    /// A problem with the same id already exists.
    DuplicateId(ProblemId),
    /// Write was blocked because it would break index/record consistency.
    Consistency(ConsistencyError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "problem not found: {id}"),
            Self::DuplicateId(id) => write!(f, "problem already exists: {id}"),
            Self::Consistency(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "problem repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "problem repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted problem data: {message}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Consistency(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ProblemValidationError> for StorageError {
    fn from(value: ProblemValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ConsistencyError> for StorageError {
    fn from(value: ConsistencyError) -> Self {
        Self::Consistency(value)
    }
}

/// Outcome of rewriting the order index against stored problems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRepair {
    /// Index after repair.
    pub order: OrderIndex,
    /// Dangling or duplicate entries dropped.
    pub removed: Vec<ProblemId>,
    /// Unlisted problems appended.
    pub appended: Vec<ProblemId>,
}

impl OrderRepair {
    pub fn is_noop(&self) -> bool {
        self.removed.is_empty() && self.appended.is_empty()
    }
}

/// Repository interface for problem records and their order index.
pub trait ProblemRepository {
    /// Lists all problems by `created_at ASC, id ASC`.
    fn list_problems(&self) -> StorageResult<Vec<Problem>>;
    /// Loads one problem by id.
    fn get_problem(&self, id: &ProblemId) -> StorageResult<Option<Problem>>;
    /// Inserts one problem and appends it to the order index.
    fn create_problem(&self, problem: &Problem) -> StorageResult<Problem>;
    /// Inserts several problems and appends them in slice order, all in one
    /// transaction.
    fn create_problems(&self, problems: &[Problem]) -> StorageResult<Vec<Problem>>;
    /// Replaces names and content of an existing problem.
    fn update_problem(&self, problem: &Problem) -> StorageResult<Problem>;
    /// Loads the order index.
    fn load_order(&self) -> StorageResult<OrderIndex>;
    /// Moves one order entry and returns the new index.
    fn move_order_entry(&self, from: usize, to: usize) -> StorageResult<OrderIndex>;
    /// Removes the entry at `position` (which must still be `expected`) and
    /// deletes its problem record.
    fn delete_at(&self, position: usize, expected: &ProblemId) -> StorageResult<OrderIndex>;
    /// Rewrites the order index so it lists every stored problem exactly once.
    fn repair_order(&self) -> StorageResult<OrderRepair>;
}

/// SQLite-backed problem repository.
pub struct SqliteProblemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProblemRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StorageResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ProblemRepository for SqliteProblemRepository<'_> {
    fn list_problems(&self) -> StorageResult<Vec<Problem>> {
        list_problems_in(self.conn)
    }

    fn get_problem(&self, id: &ProblemId) -> StorageResult<Option<Problem>> {
        load_problem(self.conn, id)
    }

    fn create_problem(&self, problem: &Problem) -> StorageResult<Problem> {
        self.create_problems(std::slice::from_ref(problem))?
            .pop()
            .ok_or_else(|| StorageError::NotFound(problem.id.clone()))
    }

    fn create_problems(&self, problems: &[Problem]) -> StorageResult<Vec<Problem>> {
        for problem in problems {
            problem.validate()?;
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut order = read_order(&tx)?;
        let mut created = Vec::with_capacity(problems.len());
        for problem in problems {
            if problem_exists(&tx, &problem.id)? {
                return Err(StorageError::DuplicateId(problem.id.clone()));
            }
            order.push(problem.id.clone())?;
            insert_problem(&tx, problem)?;
            created.push(
                load_problem(&tx, &problem.id)?
                    .ok_or_else(|| StorageError::NotFound(problem.id.clone()))?,
            );
        }
        write_order(&tx, &order)?;

        tx.commit()?;
        Ok(created)
    }

    fn update_problem(&self, problem: &Problem) -> StorageResult<Problem> {
        problem.validate()?;

        let changed = self.conn.execute(
            "UPDATE problems
             SET name = ?2,
                 full_name = ?3,
                 content = ?4,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                problem.id.as_str(),
                problem.name.trim(),
                problem.full_name.trim(),
                problem.content.as_str(),
            ],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(problem.id.clone()));
        }

        load_problem(self.conn, &problem.id)?
            .ok_or_else(|| StorageError::NotFound(problem.id.clone()))
    }

    fn load_order(&self) -> StorageResult<OrderIndex> {
        read_order(self.conn)
    }

    fn move_order_entry(&self, from: usize, to: usize) -> StorageResult<OrderIndex> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut order = read_order(&tx)?;
        order.move_entry(from, to)?;
        write_order(&tx, &order)?;
        tx.commit()?;
        Ok(order)
    }

    fn delete_at(&self, position: usize, expected: &ProblemId) -> StorageResult<OrderIndex> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut order = read_order(&tx)?;

        match order.get(position) {
            Some(found) if found == expected => {}
            Some(found) => {
                return Err(StorageError::Consistency(ConsistencyError::StaleEntry {
                    position,
                    expected: expected.clone(),
                    found: Some(found.clone()),
                }));
            }
            None => {
                return Err(StorageError::Consistency(
                    ConsistencyError::PositionOutOfRange {
                        position,
                        len: order.len(),
                    },
                ));
            }
        }
        if !problem_exists(&tx, expected)? {
            return Err(StorageError::Consistency(ConsistencyError::DanglingEntry(
                expected.clone(),
            )));
        }

        order.remove_at(position)?;
        write_order(&tx, &order)?;
        tx.execute("DELETE FROM problems WHERE id = ?1;", [expected.as_str()])?;

        tx.commit()?;
        Ok(order)
    }

    fn repair_order(&self) -> StorageResult<OrderRepair> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let current = read_order(&tx)?;
        let stored = list_problems_in(&tx)?;
        let stored_ids = stored.iter().map(|problem| &problem.id).collect::<HashSet<_>>();

        let mut kept = Vec::with_capacity(current.len());
        let mut seen = HashSet::new();
        let mut removed = Vec::new();
        for id in current.ids() {
            if stored_ids.contains(id) && seen.insert(id.clone()) {
                kept.push(id.clone());
            } else {
                removed.push(id.clone());
            }
        }

        let mut appended = Vec::new();
        for problem in &stored {
            if !seen.contains(&problem.id) {
                kept.push(problem.id.clone());
                appended.push(problem.id.clone());
            }
        }

        let order = OrderIndex::new(kept);
        if !removed.is_empty() || !appended.is_empty() {
            write_order(&tx, &order)?;
        }
        tx.commit()?;

        Ok(OrderRepair {
            order,
            removed,
            appended,
        })
    }
}

fn list_problems_in(conn: &Connection) -> StorageResult<Vec<Problem>> {
    let mut stmt = conn.prepare(&format!(
        "{PROBLEM_SELECT_SQL}
         ORDER BY created_at ASC, id ASC;"
    ))?;
    let mut rows = stmt.query([])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse_problem_row(row)?);
    }
    Ok(items)
}

fn load_problem(conn: &Connection, id: &ProblemId) -> StorageResult<Option<Problem>> {
    let mut stmt = conn.prepare(&format!(
        "{PROBLEM_SELECT_SQL}
         WHERE id = ?1;"
    ))?;
    let mut rows = stmt.query([id.as_str()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_problem_row(row)?));
    }
    Ok(None)
}

fn insert_problem(conn: &Connection, problem: &Problem) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO problems (id, name, full_name, content)
         VALUES (?1, ?2, ?3, ?4);",
        params![
            problem.id.as_str(),
            problem.name.trim(),
            problem.full_name.trim(),
            problem.content.as_str(),
        ],
    )?;
    Ok(())
}

fn problem_exists(conn: &Connection, id: &ProblemId) -> StorageResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM problems WHERE id = ?1);",
        [id.as_str()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn read_order(conn: &Connection) -> StorageResult<OrderIndex> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM miscellaneous WHERE name = ?1;",
            [ORDER_RECORD_NAME],
            |row| row.get(0),
        )
        .optional()?;

    let Some(value) = value else {
        return Ok(OrderIndex::default());
    };

    let raw_ids: Vec<String> = serde_json::from_str(&value).map_err(|err| {
        StorageError::InvalidData(format!(
            "miscellaneous.{ORDER_RECORD_NAME} is not a JSON string array: {err}"
        ))
    })?;
    raw_ids
        .into_iter()
        .map(|raw| {
            ProblemId::parse(raw).map_err(|err| {
                StorageError::InvalidData(format!("miscellaneous.{ORDER_RECORD_NAME}: {err}"))
            })
        })
        .collect::<StorageResult<Vec<_>>>()
        .map(OrderIndex::new)
}

fn write_order(conn: &Connection, order: &OrderIndex) -> StorageResult<()> {
    let value = serde_json::to_string(order).map_err(|err| {
        StorageError::InvalidData(format!("cannot encode {ORDER_RECORD_NAME}: {err}"))
    })?;
    conn.execute(
        "INSERT INTO miscellaneous (name, value)
         VALUES (?1, ?2)
         ON CONFLICT(name) DO UPDATE SET value = excluded.value;",
        params![ORDER_RECORD_NAME, value],
    )?;
    Ok(())
}

fn parse_problem_row(row: &Row<'_>) -> StorageResult<Problem> {
    let id_text: String = row.get("id")?;
    let id = ProblemId::parse(id_text)
        .map_err(|err| StorageError::InvalidData(format!("problems.id: {err}")))?;

    Ok(Problem {
        id,
        name: row.get("name")?,
        full_name: row.get("full_name")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn ensure_connection_ready(conn: &Connection) -> StorageResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(StorageError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["problems", "miscellaneous"] {
        if !table_exists(conn, table)? {
            return Err(StorageError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> StorageResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
