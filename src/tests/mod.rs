//! Scenario tests for composites and cases.
//!
//! ## Test Organization
//!
//! - `common`: Shared journal, gates, probe steps and the payment-need domain
//! - `basic`: Straight-through execution and diagnostics
//! - `halt`: Halting and resuming at the exact step
//! - `undo`: Reverse-order undo
//! - `nested`: Composites inside composites
//! - `restore`: Restoring progress vectors, including the round-trip law
//! - `named`: Composites declared with `composite!`
//! - `case`: Typestate driver and store round-trips
//!
//! ## Test Steps
//!
//! Most tests use `Probe` steps that record every `execute` attempt and
//! every `undo` in a shared `Journal`. A probe guarded by a closed `Gate`
//! halts until the gate is opened.

mod common;

mod undo;
