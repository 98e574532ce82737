//! Step trait and related types.
//!
//! A `Step` is an atomic unit of work with execute and undo actions.
//! Steps are composed into sequences by [`Composite`](crate::Composite), which
//! is itself a `Step` and can therefore be nested.

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::progress::Resumable;

/// Outcome of a step execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    /// The work was applied; continue to the next step.
    Continue,
    /// The step cannot complete yet and applied nothing. Retry it later.
    Halt,
}

impl StepOutcome {
    /// Returns `true` if the step completed.
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue)
    }

    /// Returns `true` if the step halted.
    pub fn is_halt(&self) -> bool {
        matches!(self, Self::Halt)
    }
}

impl From<bool> for StepOutcome {
    fn from(done: bool) -> Self {
        if done {
            Self::Continue
        } else {
            Self::Halt
        }
    }
}

impl From<StepOutcome> for bool {
    fn from(outcome: StepOutcome) -> Self {
        outcome.is_continue()
    }
}

/// A unit of work that can be executed and undone.
///
/// Leaf steps only implement [`execute`](Step::execute) and
/// [`undo`](Step::undo). Composite steps additionally expose their progress
/// through [`progress`](Step::progress) so that it can be captured and
/// restored; leaves keep the default `None` and are invisible to the
/// progress vector.
pub trait Step {
    /// Attempt the unit of work.
    ///
    /// Returns [`StepOutcome::Halt`] when required input is still missing.
    /// A halting step must not leave any partial effect behind: it will be
    /// executed again from scratch on the next attempt. Diagnostics may be
    /// reported to `ctx` whatever the outcome.
    fn execute(&mut self, ctx: &mut Context) -> StepOutcome;

    /// Reverse the effect of a previous successful [`execute`](Step::execute).
    ///
    /// Only called on steps that returned [`StepOutcome::Continue`]. Undo has
    /// no failure channel; a step that cannot fully reverse its effect must
    /// deal with the residue itself.
    fn undo(&mut self);

    /// Progress view of a composite step. `None` for leaves.
    fn progress(&self) -> Option<&dyn Resumable> {
        None
    }

    /// Mutable progress view of a composite step. `None` for leaves.
    fn progress_mut(&mut self) -> Option<&mut dyn Resumable> {
        None
    }
}

impl<S: Step + ?Sized> Step for Box<S> {
    fn execute(&mut self, ctx: &mut Context) -> StepOutcome {
        (**self).execute(ctx)
    }

    fn undo(&mut self) {
        (**self).undo()
    }

    fn progress(&self) -> Option<&dyn Resumable> {
        (**self).progress()
    }

    fn progress_mut(&mut self) -> Option<&mut dyn Resumable> {
        (**self).progress_mut()
    }
}
