#![deny(missing_docs)]

//! Rewind — resumable, undoable composite steps.
//!
//! # Design Goals
//!
//! - **Halt, don't fail**: a step that lacks input halts the whole sequence
//!   without side effects, and the next run retries exactly that step
//! - **Strict undo order**: executed steps are undone most recent first,
//!   through any depth of nesting
//! - **Portable progress**: the cursors of a whole tree flatten into a
//!   vector of integers that can be stored anywhere and restored into a
//!   freshly built tree of the same shape
//!
//! # Core Concepts
//!
//! - [`Step`]: A single operation with `execute` and `undo`
//! - [`Composite`]: An ordered sequence of steps that is itself a step
//! - [`Context`]: Per-run channel for non-fatal diagnostics
//! - [`ProgressVector`]: Pre-order cursors of a composite tree
//! - [`Case`]: Typestate driver for one root composite (`New`, `Halted`, `Completed`)
//!
// Re-export paste for macros
pub use paste;

// Modules
pub mod case;
pub mod composite;
pub mod context;
mod macros;
pub mod progress;
pub mod step;
pub mod store;

// Re-exports for convenience
pub use case::{Case, CaseError, CaseResult, Completed, Halted, New};
pub use composite::{AppendError, Composite, StepList};
pub use context::Context;
pub use progress::{ProgressReader, ProgressVector, RestoreError, Resumable};
pub use step::{Step, StepOutcome};
pub use store::{CaseId, InMemoryStore, Store, StoreError, SuspendedRecord};

#[cfg(test)]
mod tests;
