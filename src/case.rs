//! Case driver with typestate pattern.
//!
//! A [`Case`] is one logical unit of work driven by a single root composite.
//! Its state parameter tracks whether the case has yet to run (`New`), waiting
//! for external input (`Halted`) or done (`Completed`), so that operations
//! only make sense where they compile: a completed case cannot be resumed,
//! and only a halted case is suspended into a [`Store`].

use std::fmt;
use std::marker::PhantomData;

use crate::composite::{Composite, StepList};
use crate::context::Context;
use crate::progress::{ProgressVector, RestoreError};
use crate::step::StepOutcome;
use crate::store::{CaseId, Store, StoreError, SuspendedRecord};

// ============================================================================
// Typestate Markers
// ============================================================================

/// Marker: the case has not run yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct New;

/// Marker: a step halted; the case can be resumed or suspended.
#[derive(Debug, Clone, Copy)]
pub struct Halted;

/// Marker: every step executed.
#[derive(Debug, Clone, Copy)]
pub struct Completed;

/// Errors raised while suspending, loading or releasing a case.
#[derive(thiserror::Error, Debug)]
pub enum CaseError {
    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The stored progress does not fit the tree it was loaded into.
    #[error(transparent)]
    Restore(#[from] RestoreError),
}

// ============================================================================
// Case Result
// ============================================================================

/// Result of starting or resuming a case.
pub enum CaseResult<L: StepList> {
    /// A step halted; resume once its input is available.
    Halted(Case<L, Halted>),
    /// Every step executed.
    Completed(Case<L, Completed>),
}

impl<L: StepList> CaseResult<L> {
    /// Returns `true` if the case halted.
    pub fn is_halted(&self) -> bool {
        matches!(self, Self::Halted(_))
    }

    /// Returns `true` if the case completed.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Diagnostics reported during the run.
    pub fn diagnostics(&self) -> &Context {
        match self {
            Self::Halted(case) => case.diagnostics(),
            Self::Completed(case) => case.diagnostics(),
        }
    }
}

// ============================================================================
// Case (Typestate)
// ============================================================================

/// A unit of work with compile-time state tracking.
///
/// - `Case<L, New>`: can call `start()`
/// - `Case<L, Halted>`: can call `resume()`, `suspend()` or `undo()`
/// - `Case<L, Completed>`: can call `undo()` or `release()`
pub struct Case<L: StepList, State = New> {
    id: CaseId,
    root: Composite<L>,
    context: Context,
    _marker: PhantomData<State>,
}

impl<L: StepList> Case<L, New> {
    /// Create a new case with a random ID.
    ///
    /// `root` is normally freshly built. A root that already made progress
    /// keeps it: the case starts from the root's cursor and undo reverses
    /// the steps executed before the case existed as well.
    pub fn new(root: Composite<L>) -> Self {
        Self::with_id(CaseId::new(), root)
    }

    /// Create a new case with the given ID. See [`Case::new`] for `root`.
    pub fn with_id(id: CaseId, root: Composite<L>) -> Self {
        Self {
            id,
            root,
            context: Context::new(),
            _marker: PhantomData,
        }
    }

    /// Run the root from its cursor until a step halts or all have executed.
    pub fn start(self) -> CaseResult<L> {
        self.run()
    }
}

impl<L: StepList> Case<L, Halted> {
    /// Run the root again from the step that halted.
    pub fn resume(self) -> CaseResult<L> {
        self.run()
    }

    /// Progress vector of the root.
    pub fn progress(&self) -> ProgressVector {
        self.root.state()
    }

    /// Undo every executed step and return to `New`.
    pub fn undo(mut self) -> Case<L, New> {
        self.root.undo();
        self.transition()
    }

    /// Park the progress vector of the root in `store`.
    ///
    /// Suspending again replaces the parked progress.
    pub async fn suspend<S: Store + ?Sized>(
        &self,
        store: &S,
    ) -> Result<SuspendedRecord, CaseError> {
        let record = store.save(self.id, &self.root.state()).await?;

        #[cfg(feature = "tracing")]
        tracing::info!(
            case = %self.id,
            progress = %record.progress,
            suspensions = record.suspensions,
            "case.suspend"
        );

        Ok(record)
    }

    /// Rebuild a halted case from stored progress.
    ///
    /// `root` must be freshly built with the same shape as the suspended
    /// tree. A case whose stored progress is complete still loads as
    /// `Halted`; resuming it completes without executing anything.
    pub async fn load<S: Store + ?Sized>(
        store: &S,
        id: CaseId,
        mut root: Composite<L>,
    ) -> Result<Self, CaseError> {
        let record = store.fetch(id).await?;
        root.restore(&record.progress)?;

        #[cfg(feature = "tracing")]
        tracing::info!(case = %id, progress = %record.progress, "case.load");

        Ok(Self {
            id,
            root,
            context: Context::new(),
            _marker: PhantomData,
        })
    }
}

impl<L: StepList> Case<L, Completed> {
    /// Undo every executed step and return to `New`.
    pub fn undo(mut self) -> Case<L, New> {
        self.root.undo();
        self.transition()
    }

    /// Drop any progress still parked for this case.
    ///
    /// Returns `true` if something was parked.
    pub async fn release<S: Store + ?Sized>(&self, store: &S) -> Result<bool, CaseError> {
        Ok(store.remove(self.id).await?)
    }

    /// Consume the case and return the root.
    pub fn into_root(self) -> Composite<L> {
        self.root
    }
}

impl<L: StepList, State> Case<L, State> {
    /// The case ID.
    pub fn id(&self) -> CaseId {
        self.id
    }

    /// The root composite.
    pub fn root(&self) -> &Composite<L> {
        &self.root
    }

    /// Mutable access to the root, e.g. to hand a halted step its input.
    pub fn root_mut(&mut self) -> &mut Composite<L> {
        &mut self.root
    }

    /// Diagnostics reported during the last run.
    pub fn diagnostics(&self) -> &Context {
        &self.context
    }

    fn transition<T>(self) -> Case<L, T> {
        Case {
            id: self.id,
            root: self.root,
            context: self.context,
            _marker: PhantomData,
        }
    }

    // Every run gets a fresh context
    fn run(mut self) -> CaseResult<L> {
        let mut ctx = Context::new();
        let outcome = self.root.execute(&mut ctx);
        self.context = ctx;

        #[cfg(feature = "tracing")]
        tracing::info!(
            case = %self.id,
            cursor = self.root.cursor(),
            diagnostics = self.context.len(),
            complete = outcome.is_continue(),
            "case.run"
        );

        match outcome {
            StepOutcome::Continue => CaseResult::Completed(self.transition()),
            StepOutcome::Halt => CaseResult::Halted(self.transition()),
        }
    }
}

impl<L: StepList, State> fmt::Debug for Case<L, State> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Case")
            .field("id", &self.id)
            .field("root", &self.root)
            .field("context", &self.context)
            .finish()
    }
}
