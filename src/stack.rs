//! Resumable LIFO execution stack.
//!
//! A battle action is a stack of steps. Executing a step may push further
//! steps, which run before anything below them. The step being executed is
//! remembered as `current`; if it fails, or the stack is persisted while it
//! runs, it is put back on top before execution resumes so nothing is
//! skipped.

use serde::{Deserialize, Serialize};

use crate::error::CombatError;

/// A unit of deferred work run by an `ExecutionStack`.
///
/// A step that pushes further steps must not fail after pushing them: a
/// failed step is re-run from the top, and would push them twice.
pub trait Executable<C: ?Sized>: Sized {
    fn execute(self, stack: &mut ExecutionStack<Self>, cx: &mut C) -> Result<(), CombatError>;
}

/// Ordered stack of steps, top at the end of `steps`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStack<S> {
    steps: Vec<S>,
    current: Option<S>,
}

impl<S> Default for ExecutionStack<S> {
    fn default() -> Self {
        ExecutionStack {
            steps: Vec::new(),
            current: None,
        }
    }
}

impl<S: Clone> ExecutionStack<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: S) {
        self.steps.push(step);
    }

    /// Pushes `steps` so that they execute in the order given.
    pub fn push_all(&mut self, steps: Vec<S>) {
        self.steps.extend(steps.into_iter().rev());
    }

    /// True when nothing is queued and no step was interrupted.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty() && self.current.is_none()
    }

    pub fn len(&self) -> usize {
        self.steps.len() + usize::from(self.current.is_some())
    }

    /// Removes the top step.
    pub fn pop(&mut self) -> Result<S, CombatError> {
        self.steps.pop().ok_or(CombatError::EmptyStack)
    }

    /// Queued steps in execution order (next step first).
    pub fn pending(&self) -> impl Iterator<Item = &S> {
        self.current.iter().chain(self.steps.iter().rev())
    }

    /// Puts an interrupted step back on top.
    fn restore_current(&mut self) {
        if let Some(step) = self.current.take() {
            self.steps.push(step);
        }
    }

    /// Runs steps until the stack is empty.
    pub fn execute<C: ?Sized>(&mut self, cx: &mut C) -> Result<(), CombatError>
    where
        S: Executable<C>,
    {
        self.execute_steps(cx, usize::MAX).map(|_| ())
    }

    /// Runs at most `limit` steps. Returns the number executed.
    ///
    /// On error the failing step stays recorded as current and runs again on
    /// the next call.
    pub fn execute_steps<C: ?Sized>(&mut self, cx: &mut C, limit: usize) -> Result<usize, CombatError>
    where
        S: Executable<C>,
    {
        self.restore_current();
        let mut executed = 0;
        while executed < limit && !self.steps.is_empty() {
            let step = self.pop()?;
            self.current = Some(step.clone());
            step.execute(self, cx)?;
            // Steps pushed during execution sit above the finished one; only
            // the bookkeeping slot is cleared.
            self.current = None;
            executed += 1;
        }
        Ok(executed)
    }
}
