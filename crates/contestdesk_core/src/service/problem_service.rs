//! Problem list use-case service.
//!
//! # Responsibility
//! - Provide create, edit, reorder and delete flows over the problem store.
//! - Check and repair order index consistency.
//! - Notify subscribers after every committed mutation.
//!
//! # Invariants
//! - Consistency failures block the operation before anything is written.
//! - Events are published only after the repository commit succeeded.

use crate::model::order::{ConsistencyError, OrderIndex};
use crate::model::problem::{Problem, ProblemId, ProblemValidationError};
use crate::notify::{ChangeEvent, ChangeFeed, Subscription};
use crate::repo::problem_repo::{OrderRepair, ProblemRepository, StorageError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from problem service operations.
#[derive(Debug)]
pub enum ProblemError {
    /// Input record is invalid.
    Validation(ProblemValidationError),
    /// Target problem does not exist.
    NotFound(ProblemId),
    /// A problem with the same id already exists.
    DuplicateId(ProblemId),
    /// Index and records disagree, or a position is invalid.
    Consistency(ConsistencyError),
    /// Persistence failure.
    Storage(StorageError),
}

impl ProblemError {
    /// Whether this failure came from the persistence layer rather than from
    /// caller input or store consistency.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

impl Display for ProblemError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "problem not found: {id}"),
            Self::DuplicateId(id) => write!(f, "problem already exists: {id}"),
            Self::Consistency(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl Error for ProblemError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Consistency(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::NotFound(_) | Self::DuplicateId(_) => None,
        }
    }
}

impl From<StorageError> for ProblemError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::Validation(err) => Self::Validation(err),
            StorageError::NotFound(id) => Self::NotFound(id),
            StorageError::DuplicateId(id) => Self::DuplicateId(id),
            StorageError::Consistency(err) => Self::Consistency(err),
            other => Self::Storage(other),
        }
    }
}

impl From<ConsistencyError> for ProblemError {
    fn from(value: ConsistencyError) -> Self {
        Self::Consistency(value)
    }
}

impl From<ProblemValidationError> for ProblemError {
    fn from(value: ProblemValidationError) -> Self {
        Self::Validation(value)
    }
}

pub type ProblemResult<T> = Result<T, ProblemError>;

/// Problem list service facade.
pub struct ProblemService<R: ProblemRepository> {
    repo: R,
    feed: ChangeFeed,
}

impl<R: ProblemRepository> ProblemService<R> {
    /// Creates service with a private change feed.
    pub fn new(repo: R) -> Self {
        Self::with_feed(repo, ChangeFeed::new())
    }

    /// Creates service publishing into an existing change feed.
    pub fn with_feed(repo: R, feed: ChangeFeed) -> Self {
        Self { repo, feed }
    }

    /// Registers an observer for store changes.
    pub fn subscribe(&self) -> Subscription {
        self.feed.subscribe()
    }

    /// Stores a new problem at the end of the order index.
    pub fn create_problem(&self, problem: &Problem) -> ProblemResult<Problem> {
        let created = self.repo.create_problem(problem).inspect_err(|err| {
            warn!(
                "event=problem_create module=service status=error id={} error={}",
                problem.id, err
            );
        })?;
        info!(
            "event=problem_create module=service status=ok id={}",
            created.id
        );
        self.feed
            .publish(&[ChangeEvent::ProblemsChanged, ChangeEvent::OrderChanged]);
        Ok(created)
    }

    /// Stores several problems in one transaction, appended in slice order.
    ///
    /// Either every record is created or none is.
    pub fn create_problems(&self, problems: &[Problem]) -> ProblemResult<Vec<Problem>> {
        if problems.is_empty() {
            return Ok(Vec::new());
        }
        let created = self.repo.create_problems(problems).inspect_err(|err| {
            warn!(
                "event=problem_create_batch module=service status=error count={} error={}",
                problems.len(),
                err
            );
        })?;
        info!(
            "event=problem_create_batch module=service status=ok count={}",
            created.len()
        );
        self.feed
            .publish(&[ChangeEvent::ProblemsChanged, ChangeEvent::OrderChanged]);
        Ok(created)
    }

    /// Replaces names and content of an existing problem. Order is untouched.
    pub fn update_problem(&self, problem: &Problem) -> ProblemResult<Problem> {
        let updated = self.repo.update_problem(problem)?;
        info!(
            "event=problem_update module=service status=ok id={}",
            updated.id
        );
        self.feed.publish(&[ChangeEvent::ProblemsChanged]);
        Ok(updated)
    }

    pub fn get_problem(&self, id: &ProblemId) -> ProblemResult<Option<Problem>> {
        self.repo.get_problem(id).map_err(Into::into)
    }

    /// Lists stored problems in creation order.
    pub fn list_problems(&self) -> ProblemResult<Vec<Problem>> {
        self.repo.list_problems().map_err(Into::into)
    }

    pub fn order_index(&self) -> ProblemResult<OrderIndex> {
        self.repo.load_order().map_err(Into::into)
    }

    /// Loads both sources and joins them in index order.
    pub fn ordered_problems(&self) -> ProblemResult<Vec<Problem>> {
        let order = self.repo.load_order()?;
        let problems = self.repo.list_problems()?;
        let projected = order.project(&problems)?;
        Ok(projected.into_iter().cloned().collect())
    }

    /// Moves the entry at `from` to `to`.
    pub fn reorder(&self, from: usize, to: usize) -> ProblemResult<OrderIndex> {
        let order = self.repo.move_order_entry(from, to).inspect_err(|err| {
            warn!(
                "event=order_move module=service status=error from={} to={} error={}",
                from, to, err
            );
        })?;
        info!(
            "event=order_move module=service status=ok from={} to={} len={}",
            from,
            to,
            order.len()
        );
        self.feed.publish(&[ChangeEvent::OrderChanged]);
        Ok(order)
    }

    /// Deletes the problem listed at `position`, index entry and record
    /// together.
    ///
    /// `expected` is the id the caller saw at `position`; if the index has
    /// moved on since, nothing is written and the entry is reported stale.
    pub fn delete_at(&self, position: usize, expected: &ProblemId) -> ProblemResult<()> {
        self.repo.delete_at(position, expected).inspect_err(|err| {
            warn!(
                "event=problem_delete module=service status=error id={} position={} error={}",
                expected, position, err
            );
        })?;
        info!(
            "event=problem_delete module=service status=ok id={} position={}",
            expected, position
        );
        self.feed
            .publish(&[ChangeEvent::OrderChanged, ChangeEvent::ProblemsChanged]);
        Ok(())
    }

    /// Deletes one problem by id.
    ///
    /// A stored problem missing from the index is reported as unlisted and
    /// left in place; run [`Self::repair_order`] first.
    pub fn delete_problem(&self, id: &ProblemId) -> ProblemResult<()> {
        let order = self.repo.load_order()?;
        match order.position_of(id) {
            Some(position) => self.delete_at(position, id),
            None if self.repo.get_problem(id)?.is_some() => {
                Err(ConsistencyError::UnlistedProblem(id.clone()).into())
            }
            None => Err(ProblemError::NotFound(id.clone())),
        }
    }

    /// Reports every mismatch between the order index and stored problems.
    pub fn check_consistency(&self) -> ProblemResult<Vec<ConsistencyError>> {
        let order = self.repo.load_order()?;
        let problems = self.repo.list_problems()?;
        Ok(order.violations(problems.iter().map(|problem| &problem.id)))
    }

    /// Rewrites the order index so every stored problem is listed once.
    pub fn repair_order(&self) -> ProblemResult<OrderRepair> {
        let repair = self.repo.repair_order()?;
        if repair.is_noop() {
            return Ok(repair);
        }
        info!(
            "event=order_repair module=service status=ok removed={} appended={}",
            repair.removed.len(),
            repair.appended.len()
        );
        self.feed.publish(&[ChangeEvent::OrderChanged]);
        Ok(repair)
    }
}
