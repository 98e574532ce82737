//! Composite steps: resumable, undoable sequences of steps.
//!
//! A [`Composite`] runs its children in order starting at its cursor and
//! stops at the first child that halts. The cursor survives the halt, so the
//! next [`execute`](Composite::execute) retries exactly that child. Executed
//! children are recorded in a history that drives [`undo`](Composite::undo)
//! in reverse execution order. Since a composite is itself a [`Step`], trees
//! of composites resume and undo recursively, and their cursors can be
//! captured with [`state`](Composite::state) and put back with
//! [`restore`](Composite::restore).

use std::fmt;

use crate::context::Context;
use crate::progress::{ProgressReader, ProgressVector, RestoreError, Resumable};
use crate::step::{Step, StepOutcome};

/// Error returned when appending to a composite that already made progress.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendError {
    /// The composite has executed or restored steps; its child set is fixed.
    #[error("cannot append a step after execution began (cursor {cursor})")]
    Started {
        /// Cursor of the composite at the time of the append.
        cursor: usize,
    },
}

/// Ordered children of a composite.
///
/// Implemented for `Vec<Box<dyn Step>>` and for the structs generated by
/// [`composite!`](crate::composite). `step` and `step_mut` must return
/// `Some` for every index below `len`.
pub trait StepList {
    /// Number of steps.
    fn len(&self) -> usize;

    /// Returns `true` if there are no steps.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Step at `index`, in execution order.
    fn step(&self, index: usize) -> Option<&dyn Step>;

    /// Mutable step at `index`, in execution order.
    fn step_mut(&mut self, index: usize) -> Option<&mut dyn Step>;
}

impl StepList for Vec<Box<dyn Step>> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn step(&self, index: usize) -> Option<&dyn Step> {
        self.as_slice().get(index).map(|step| &**step as &dyn Step)
    }

    fn step_mut(&mut self, index: usize) -> Option<&mut dyn Step> {
        self.as_mut_slice()
            .get_mut(index)
            .map(|step| &mut **step as &mut dyn Step)
    }
}

/// A step made of an ordered sequence of child steps.
pub struct Composite<L = Vec<Box<dyn Step>>> {
    steps: L,
    /// Index of the next child to attempt.
    cursor: usize,
    /// Indices of executed children, oldest first.
    history: Vec<usize>,
}

impl Composite {
    /// Create an empty dynamic sequence.
    pub fn sequence() -> Self {
        Self::new(Vec::new())
    }

    /// Append a step at the end of the sequence.
    ///
    /// Only allowed while the composite has no progress.
    pub fn push<S: Step + 'static>(&mut self, step: S) -> Result<(), AppendError> {
        self.push_boxed(Box::new(step))
    }

    /// Append an already boxed step at the end of the sequence.
    pub fn push_boxed(&mut self, step: Box<dyn Step>) -> Result<(), AppendError> {
        if self.cursor > 0 {
            return Err(AppendError::Started {
                cursor: self.cursor,
            });
        }
        self.steps.push(step);
        Ok(())
    }
}

impl Default for Composite {
    fn default() -> Self {
        Self::sequence()
    }
}

impl FromIterator<Box<dyn Step>> for Composite {
    fn from_iter<I: IntoIterator<Item = Box<dyn Step>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<L: StepList> Composite<L> {
    /// Create a composite over `steps` with no progress.
    pub fn new(steps: L) -> Self {
        Self {
            steps,
            cursor: 0,
            history: Vec::new(),
        }
    }

    /// Index of the next child to attempt.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if there are no children.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns `true` once every child has executed.
    pub fn is_complete(&self) -> bool {
        self.cursor == self.steps.len()
    }

    /// Indices of executed children, most recently executed first.
    pub fn history(&self) -> impl Iterator<Item = usize> + '_ {
        self.history.iter().rev().copied()
    }

    /// The children.
    pub fn steps(&self) -> &L {
        &self.steps
    }

    /// Mutable access to the children, e.g. to hand a halted step its input.
    ///
    /// Adding, removing or reordering children through this reference breaks
    /// the cursor and history of the composite.
    pub fn steps_mut(&mut self) -> &mut L {
        &mut self.steps
    }

    /// Consume the composite and return its children.
    pub fn into_steps(self) -> L {
        self.steps
    }

    /// Run the children from the cursor until one halts or all have executed.
    ///
    /// A halting child is not recorded: the cursor stays on it and the next
    /// call retries it from scratch. Children before the cursor are never
    /// executed again. Executing a complete composite is a no-op that
    /// returns [`StepOutcome::Continue`].
    pub fn execute(&mut self, ctx: &mut Context) -> StepOutcome {
        while self.cursor < self.steps.len() {
            let index = self.cursor;
            let Some(step) = self.steps.step_mut(index) else {
                break;
            };

            #[cfg(feature = "tracing")]
            tracing::debug!(step = index, "step.start");

            match step.execute(ctx) {
                StepOutcome::Continue => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(step = index, outcome = "continue", "step.end");

                    self.history.push(index);
                    self.cursor += 1;
                }
                StepOutcome::Halt => {
                    #[cfg(feature = "tracing")]
                    tracing::info!(step = index, outcome = "halt", "step.end");

                    return StepOutcome::Halt;
                }
            }
        }
        StepOutcome::Continue
    }

    /// Undo every executed child, most recently executed first, then reset.
    ///
    /// Composite children undo their own history in the same way. Undoing a
    /// composite without progress does nothing.
    pub fn undo(&mut self) {
        while let Some(index) = self.history.pop() {
            if let Some(step) = self.steps.step_mut(index) {
                #[cfg(feature = "tracing")]
                tracing::debug!(step = index, "undo.start");

                step.undo();

                #[cfg(feature = "tracing")]
                tracing::debug!(step = index, "undo.end");
            }
        }
        self.cursor = 0;
    }

    /// Capture the cursors of this composite and every nested composite.
    ///
    /// The walk covers the whole static tree, executed or not.
    pub fn state(&self) -> ProgressVector {
        let mut cursors = Vec::with_capacity(self.progress_len());
        self.write_progress(&mut cursors);
        ProgressVector::from(cursors)
    }

    /// Put back cursors captured by [`state`](Composite::state) on a tree of
    /// the same shape.
    ///
    /// Each composite's history is rebuilt from its cursor, replacing any
    /// previous progress, so a later [`undo`](Composite::undo) behaves as if
    /// the steps had been executed in this process. The whole vector is
    /// validated against the tree before anything is applied; on error the
    /// tree is left untouched.
    pub fn restore(&mut self, cursors: &[usize]) -> Result<(), RestoreError> {
        let mut reader = ProgressReader::new(cursors);
        self.check_progress(&mut reader)?;
        reader.finish()?;

        self.apply_progress(&mut ProgressReader::new(cursors))?;

        #[cfg(feature = "tracing")]
        tracing::info!(cursors = ?cursors, "progress.restore");

        Ok(())
    }

    fn nested(&self) -> impl Iterator<Item = &dyn Resumable> + '_ {
        (0..self.steps.len())
            .filter_map(|index| self.steps.step(index))
            .filter_map(|step| step.progress())
    }
}

impl<L: StepList> Resumable for Composite<L> {
    fn progress_len(&self) -> usize {
        1 + self
            .nested()
            .map(|child| child.progress_len())
            .sum::<usize>()
    }

    fn write_progress(&self, out: &mut Vec<usize>) {
        out.push(self.cursor);
        for child in self.nested() {
            child.write_progress(out);
        }
    }

    fn check_progress(&self, reader: &mut ProgressReader<'_>) -> Result<(), RestoreError> {
        let position = reader.position();
        let cursor = reader.next_cursor()?;
        let len = self.steps.len();
        if cursor > len {
            return Err(RestoreError::CursorOutOfRange {
                position,
                cursor,
                len,
            });
        }
        for child in self.nested() {
            child.check_progress(reader)?;
        }
        Ok(())
    }

    fn apply_progress(&mut self, reader: &mut ProgressReader<'_>) -> Result<(), RestoreError> {
        let position = reader.position();
        let cursor = reader.next_cursor()?;
        let len = self.steps.len();
        if cursor > len {
            return Err(RestoreError::CursorOutOfRange {
                position,
                cursor,
                len,
            });
        }

        self.cursor = cursor;
        self.history.clear();
        self.history.extend(0..cursor);

        for index in 0..len {
            if let Some(child) = self
                .steps
                .step_mut(index)
                .and_then(|step| step.progress_mut())
            {
                child.apply_progress(reader)?;
            }
        }
        Ok(())
    }
}

impl<L: StepList> Step for Composite<L> {
    fn execute(&mut self, ctx: &mut Context) -> StepOutcome {
        Composite::<L>::execute(self, ctx)
    }

    fn undo(&mut self) {
        Composite::<L>::undo(self)
    }

    fn progress(&self) -> Option<&dyn Resumable> {
        Some(self)
    }

    fn progress_mut(&mut self) -> Option<&mut dyn Resumable> {
        Some(self)
    }
}

impl<L: StepList> fmt::Debug for Composite<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composite")
            .field("len", &self.steps.len())
            .field("cursor", &self.cursor)
            .field("history", &self.history().collect::<Vec<_>>())
            .finish()
    }
}
