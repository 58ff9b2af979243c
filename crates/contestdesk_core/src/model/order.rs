//! Order index model.
//!
//! # Responsibility
//! - Hold the ordered sequence of problem identifiers that defines display and
//!   export order.
//! - Provide permutation-only edits (`move_entry`) and positional removal.
//!
//! # Invariants
//! - `move_entry` never duplicates or drops an identifier.
//! - Rejected edits leave the sequence untouched.
//! - A fresh index is empty.

use crate::model::problem::{Problem, ProblemId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Mismatch between the order index and the problem table, or an edit that
/// would produce one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyError {
    /// Index entry references a problem that does not exist.
    DanglingEntry(ProblemId),
    /// Identifier appears more than once in the index.
    DuplicateEntry(ProblemId),
    /// Problem exists but is not listed in the index.
    UnlistedProblem(ProblemId),
    /// Requested position is outside the index.
    PositionOutOfRange { position: usize, len: usize },
    /// Index changed between the caller's read and the write.
    StaleEntry {
        position: usize,
        expected: ProblemId,
        found: Option<ProblemId>,
    },
}

impl Display for ConsistencyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DanglingEntry(id) => write!(f, "order index references missing problem `{id}`"),
            Self::DuplicateEntry(id) => write!(f, "order index lists problem `{id}` more than once"),
            Self::UnlistedProblem(id) => write!(f, "problem `{id}` is missing from the order index"),
            Self::PositionOutOfRange { position, len } => write!(
                f,
                "position {position} is out of range for order index of length {len}"
            ),
            Self::StaleEntry {
                position,
                expected,
                found: Some(found),
            } => write!(
                f,
                "order index changed: expected `{expected}` at position {position}, found `{found}`"
            ),
            Self::StaleEntry {
                position,
                expected,
                found: None,
            } => write!(
                f,
                "order index changed: expected `{expected}` at position {position}, found nothing"
            ),
        }
    }
}

impl Error for ConsistencyError {}

/// Ordered sequence of problem identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderIndex {
    ids: Vec<ProblemId>,
}

impl OrderIndex {
    pub fn new(ids: Vec<ProblemId>) -> Self {
        Self { ids }
    }

    pub fn ids(&self) -> &[ProblemId] {
        &self.ids
    }

    pub fn into_ids(self) -> Vec<ProblemId> {
        self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&ProblemId> {
        self.ids.get(position)
    }

    pub fn position_of(&self, id: &ProblemId) -> Option<usize> {
        self.ids.iter().position(|current| current == id)
    }

    pub fn contains(&self, id: &ProblemId) -> bool {
        self.position_of(id).is_some()
    }

    /// Appends one identifier to the end.
    pub fn push(&mut self, id: ProblemId) -> Result<(), ConsistencyError> {
        if self.contains(&id) {
            return Err(ConsistencyError::DuplicateEntry(id));
        }
        self.ids.push(id);
        Ok(())
    }

    /// Moves the entry at `from` so it ends up at `to`.
    ///
    /// Array-move semantics: the entry is removed first, then inserted at `to`
    /// in the shortened sequence.
    pub fn move_entry(&mut self, from: usize, to: usize) -> Result<(), ConsistencyError> {
        self.ensure_position(from)?;
        self.ensure_position(to)?;
        if from == to {
            return Ok(());
        }
        let id = self.ids.remove(from);
        self.ids.insert(to, id);
        Ok(())
    }

    /// Removes and returns the entry at `position`.
    pub fn remove_at(&mut self, position: usize) -> Result<ProblemId, ConsistencyError> {
        self.ensure_position(position)?;
        Ok(self.ids.remove(position))
    }

    /// Lists every invariant violation against the given set of stored ids.
    ///
    /// Findings are ordered: index problems in index order, then unlisted
    /// records in the order they were supplied.
    pub fn violations<'a>(
        &self,
        stored: impl IntoIterator<Item = &'a ProblemId>,
    ) -> Vec<ConsistencyError> {
        let stored = stored.into_iter().collect::<Vec<_>>();
        let stored_set = stored.iter().copied().collect::<HashSet<_>>();
        let mut seen = HashSet::new();
        let mut findings = Vec::new();

        for id in &self.ids {
            if !seen.insert(id) {
                findings.push(ConsistencyError::DuplicateEntry(id.clone()));
            } else if !stored_set.contains(id) {
                findings.push(ConsistencyError::DanglingEntry(id.clone()));
            }
        }
        for id in stored {
            if !seen.contains(id) {
                findings.push(ConsistencyError::UnlistedProblem(id.clone()));
            }
        }
        findings
    }

    /// Joins the index with loaded problem records, in index order.
    ///
    /// Returns an empty projection while `problems` is empty: the record set
    /// loads slower than the index, and an empty set means "not loaded yet".
    /// Any entry without a matching record fails the whole projection.
    pub fn project<'a>(
        &self,
        problems: &'a [Problem],
    ) -> Result<Vec<&'a Problem>, ConsistencyError> {
        if problems.is_empty() {
            return Ok(Vec::new());
        }
        self.ids
            .iter()
            .map(|id| {
                problems
                    .iter()
                    .find(|problem| &problem.id == id)
                    .ok_or_else(|| ConsistencyError::DanglingEntry(id.clone()))
            })
            .collect()
    }

    fn ensure_position(&self, position: usize) -> Result<(), ConsistencyError> {
        if position >= self.ids.len() {
            return Err(ConsistencyError::PositionOutOfRange {
                position,
                len: self.ids.len(),
            });
        }
        Ok(())
    }
}

impl FromIterator<ProblemId> for OrderIndex {
    fn from_iter<T: IntoIterator<Item = ProblemId>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
