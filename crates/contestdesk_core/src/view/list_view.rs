//! Problem list view state.
//!
//! # Responsibility
//! - Track the problem set and the order index as two independently loaded
//!   sources, refreshed from change notifications.
//! - Produce labeled entries and forward reorder/delete requests.
//! - Record storage failures as non-fatal notices.
//!
//! # Invariants
//! - Entries are empty while the problem set is unloaded or empty.
//! - A missing order index reads as empty.
//! - Consistency failures are returned to the caller, never recorded as notices.
//! - A source named by a change event stays pending until it reloads.
//! - Deletes name the id this view shows at the position.

use crate::model::order::{ConsistencyError, OrderIndex};
use crate::model::problem::{Problem, ProblemId};
use crate::notify::{ChangeEvent, Subscription};
use crate::repo::problem_repo::ProblemRepository;
use crate::service::problem_service::{ProblemError, ProblemResult, ProblemService};
use crate::view::label::position_label;
use log::warn;

/// One rendered list row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    /// Zero-based position in the order index.
    pub position: usize,
    /// Letter label derived from `position`.
    pub label: String,
    pub id: ProblemId,
    /// Name cut for list display.
    pub short_name: String,
    /// Untruncated name, shown on hover.
    pub title: String,
}

/// Non-fatal failure shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub operation: &'static str,
    pub message: String,
}

/// Observer-backed list of problems in display order.
pub struct ListView {
    subscription: Subscription,
    problems: Option<Vec<Problem>>,
    order: Option<OrderIndex>,
    order_pending: bool,
    problems_pending: bool,
    notices: Vec<Notice>,
}

impl ListView {
    /// Subscribes to `service` without loading anything yet.
    pub fn attach<R: ProblemRepository>(service: &ProblemService<R>) -> Self {
        Self {
            subscription: service.subscribe(),
            problems: None,
            order: None,
            order_pending: false,
            problems_pending: false,
            notices: Vec::new(),
        }
    }

    /// Loads both sources immediately.
    pub fn open<R: ProblemRepository>(service: &ProblemService<R>) -> ProblemResult<Self> {
        let mut view = Self::attach(service);
        view.load_order(service)?;
        view.load_problems(service)?;
        Ok(view)
    }

    /// Reloads the order index source.
    pub fn load_order<R: ProblemRepository>(
        &mut self,
        service: &ProblemService<R>,
    ) -> ProblemResult<()> {
        let order = self.track("load_order", service.order_index())?;
        self.order = Some(order);
        self.order_pending = false;
        Ok(())
    }

    /// Reloads the problem set source.
    pub fn load_problems<R: ProblemRepository>(
        &mut self,
        service: &ProblemService<R>,
    ) -> ProblemResult<()> {
        let problems = self.track("load_problems", service.list_problems())?;
        self.problems = Some(problems);
        self.problems_pending = false;
        Ok(())
    }

    /// Drains pending change events and reloads each source they name.
    ///
    /// Both sources are attempted even when one fails; a failed source stays
    /// pending for the next call and the first error is returned. Returns
    /// whether any source was reloaded.
    pub fn sync<R: ProblemRepository>(
        &mut self,
        service: &ProblemService<R>,
    ) -> ProblemResult<bool> {
        for event in self.subscription.try_iter() {
            match event {
                ChangeEvent::OrderChanged => self.order_pending = true,
                ChangeEvent::ProblemsChanged => self.problems_pending = true,
            }
        }

        let mut reloaded = false;
        let mut first_err = None;
        if self.order_pending {
            match self.load_order(service) {
                Ok(()) => reloaded = true,
                Err(err) => first_err = Some(err),
            }
        }
        if self.problems_pending {
            match self.load_problems(service) {
                Ok(()) => reloaded = true,
                Err(err) => first_err = first_err.or(Some(err)),
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(reloaded),
        }
    }

    /// Whether a change event named a source that has not reloaded yet.
    pub fn is_stale(&self) -> bool {
        self.order_pending || self.problems_pending || !self.subscription.is_empty()
    }

    /// Problems in display order.
    pub fn ordered_problems(&self) -> Result<Vec<&Problem>, ConsistencyError> {
        let Some(problems) = self.problems.as_deref() else {
            return Ok(Vec::new());
        };
        match &self.order {
            Some(order) => order.project(problems),
            None => Ok(Vec::new()),
        }
    }

    /// Labeled rows in display order.
    pub fn entries(&self) -> Result<Vec<ListEntry>, ConsistencyError> {
        let entries = self
            .ordered_problems()?
            .into_iter()
            .enumerate()
            .map(|(position, problem)| ListEntry {
                position,
                label: position_label(position),
                id: problem.id.clone(),
                short_name: problem.short_name(),
                title: problem.name.clone(),
            })
            .collect();
        Ok(entries)
    }

    /// Moves the row at `from` to `to` and refreshes.
    pub fn reorder<R: ProblemRepository>(
        &mut self,
        service: &ProblemService<R>,
        from: usize,
        to: usize,
    ) -> ProblemResult<()> {
        self.track("reorder", service.reorder(from, to))?;
        self.sync(service)?;
        Ok(())
    }

    /// Deletes the row this view shows at `position` and refreshes.
    ///
    /// If the stored index no longer holds that row's problem at `position`,
    /// the delete is refused with [`ConsistencyError::StaleEntry`].
    pub fn delete<R: ProblemRepository>(
        &mut self,
        service: &ProblemService<R>,
        position: usize,
    ) -> ProblemResult<ProblemId> {
        let shown = self.ordered_problems()?;
        let id = shown
            .get(position)
            .map(|problem| problem.id.clone())
            .ok_or(ConsistencyError::PositionOutOfRange {
                position,
                len: shown.len(),
            })?;

        self.track("delete", service.delete_at(position, &id))?;
        self.sync(service)?;
        Ok(id)
    }

    /// Returns and clears recorded notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn track<T>(
        &mut self,
        operation: &'static str,
        result: ProblemResult<T>,
    ) -> ProblemResult<T> {
        if let Err(err @ ProblemError::Storage(_)) = &result {
            warn!(
                "event=list_view module=view status=error operation={} error={}",
                operation, err
            );
            self.notices.push(Notice {
                operation,
                message: err.to_string(),
            });
        }
        result
    }
}
