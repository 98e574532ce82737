//! Undo tests.
//!
//! Tests that verify reverse-order undo and the reset that follows.

use crate::Context;

use super::common::{seq, Boxed, Gate, Journal};

/// Test that executed steps are undone in reverse order of execution.
///
/// Verifies:
/// - Every executed step is undone exactly once
/// - The most recently executed step is undone first
/// - The composite is reset afterwards
#[test]
fn undo_in_reverse_order() {
    let journal = Journal::new();
    let mut composite = seq([
        journal.probe("A").boxed(),
        journal.probe("B").boxed(),
        journal.probe("C").boxed(),
    ]);

    composite.execute(&mut Context::new());
    composite.undo();

    assert_eq!(journal.undone(), ["C", "B", "A"]);
    assert_eq!(composite.cursor(), 0);
    assert_eq!(composite.history().count(), 0);
    assert_eq!(composite.state(), [0]);
}

/// Test that only executed steps are undone after a halt.
#[test]
fn undo_after_halt_skips_pending_steps() {
    let journal = Journal::new();
    let gate = Gate::closed();
    let mut composite = seq([
        journal.probe("A").boxed(),
        journal.probe("B").boxed(),
        journal.probe("C").gated(&gate).boxed(),
    ]);

    assert!(composite.execute(&mut Context::new()).is_halt());
    composite.undo();

    assert_eq!(journal.undone(), ["B", "A"]);
}

/// Test that undo before any execution does nothing.
#[test]
fn undo_without_progress_is_noop() {
    let journal = Journal::new();
    let mut composite = seq([journal.probe("A").boxed()]);

    composite.undo();
    assert!(journal.entries().is_empty());
    assert_eq!(composite.cursor(), 0);
}

/// Test that a second undo does nothing.
#[test]
fn undo_twice_undoes_once() {
    let journal = Journal::new();
    let mut composite = seq([journal.probe("A").boxed(), journal.probe("B").boxed()]);

    composite.execute(&mut Context::new());
    composite.undo();
    composite.undo();

    assert_eq!(journal.undone(), ["B", "A"]);
}

/// Test that execution after undo starts over from the first step.
#[test]
fn execute_after_undo_reruns_everything() {
    let journal = Journal::new();
    let mut composite = seq([journal.probe("A").boxed(), journal.probe("B").boxed()]);

    composite.execute(&mut Context::new());
    composite.undo();
    assert!(composite.execute(&mut Context::new()).is_continue());

    assert_eq!(journal.executed(), ["A", "B", "A", "B"]);
    assert_eq!(composite.state(), [2]);
}

/// Test undo order across nested composites.
///
/// Verifies:
/// - A composite child undoes its own history when its turn comes
/// - The overall order is the exact reverse of execution
#[test]
fn nested_undo_reverses_execution() {
    let journal = Journal::new();
    let first = seq([journal.probe("A1").boxed(), journal.probe("B1").boxed()]);
    let second = seq([journal.probe("A2").boxed()]);
    let mut root = seq([
        journal.probe("X").boxed(),
        first.boxed(),
        second.boxed(),
    ]);

    root.execute(&mut Context::new());
    assert_eq!(journal.executed(), ["X", "A1", "B1", "A2"]);

    root.undo();
    assert_eq!(journal.undone(), ["A2", "B1", "A1", "X"]);
    assert_eq!(root.state(), [0, 0, 0]);
}

/// Test that a partially executed child composite is not undone by its parent.
///
/// The halted child never completed, so it is not part of the parent's
/// history; its own progress is kept.
#[test]
fn halted_child_is_not_undone_by_parent() {
    let journal = Journal::new();
    let gate = Gate::closed();
    let child = seq([
        journal.probe("A").boxed(),
        journal.probe("B").gated(&gate).boxed(),
    ]);
    let mut root = seq([journal.probe("X").boxed(), child.boxed()]);

    assert!(root.execute(&mut Context::new()).is_halt());
    root.undo();

    assert_eq!(journal.undone(), ["X"]);
    assert_eq!(root.state(), [0, 1]);
}
