//! Progress vectors: the persisted form of a composite tree's cursors.
//!
//! A progress vector is the pre-order sequence of cursors across a tree of
//! composite steps: the root cursor, then each composite child's subtree in
//! child order. Leaf steps contribute nothing, so the length and shape of the
//! vector depend only on how composites are nested.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// Errors raised when a progress vector does not fit the tree it is restored into.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RestoreError {
    /// The vector ran out before every composite received a cursor.
    #[error("progress vector too short: no cursor at position {position}")]
    Underflow {
        /// Position of the missing element.
        position: usize,
    },

    /// The vector has elements left after the whole tree was walked.
    #[error("progress vector too long: tree consumes {expected} cursors, vector has {found}")]
    Overflow {
        /// Number of cursors the tree consumes.
        expected: usize,
        /// Number of cursors in the vector.
        found: usize,
    },

    /// A cursor is larger than the number of children of its composite.
    #[error("cursor {cursor} at position {position} exceeds step count {len}")]
    CursorOutOfRange {
        /// Position of the offending element.
        position: usize,
        /// The cursor value found.
        cursor: usize,
        /// Number of children of the composite at that position.
        len: usize,
    },
}

/// Flat, pre-order sequence of composite cursors.
///
/// Serializes as a plain array of integers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressVector(Vec<usize>);

impl ProgressVector {
    /// Create an empty vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cursors as a slice.
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Consume the vector and return the cursors.
    pub fn into_inner(self) -> Vec<usize> {
        self.0
    }
}

impl Deref for ProgressVector {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.0
    }
}

impl From<Vec<usize>> for ProgressVector {
    fn from(cursors: Vec<usize>) -> Self {
        Self(cursors)
    }
}

impl From<&[usize]> for ProgressVector {
    fn from(cursors: &[usize]) -> Self {
        Self(cursors.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for ProgressVector {
    fn from(cursors: [usize; N]) -> Self {
        Self(cursors.to_vec())
    }
}

impl From<ProgressVector> for Vec<usize> {
    fn from(progress: ProgressVector) -> Self {
        progress.0
    }
}

impl FromIterator<usize> for ProgressVector {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl PartialEq<Vec<usize>> for ProgressVector {
    fn eq(&self, other: &Vec<usize>) -> bool {
        &self.0 == other
    }
}

impl<const N: usize> PartialEq<[usize; N]> for ProgressVector {
    fn eq(&self, other: &[usize; N]) -> bool {
        self.0.as_slice() == other.as_slice()
    }
}

impl fmt::Display for ProgressVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Front-to-back cursor reader used while restoring a tree.
#[derive(Debug)]
pub struct ProgressReader<'a> {
    cursors: &'a [usize],
    position: usize,
}

impl<'a> ProgressReader<'a> {
    /// Start reading at the front of `cursors`.
    pub fn new(cursors: &'a [usize]) -> Self {
        Self {
            cursors,
            position: 0,
        }
    }

    /// Position of the next cursor to be read.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Take the next cursor.
    pub fn next_cursor(&mut self) -> Result<usize, RestoreError> {
        let cursor = self
            .cursors
            .get(self.position)
            .copied()
            .ok_or(RestoreError::Underflow {
                position: self.position,
            })?;
        self.position += 1;
        Ok(cursor)
    }

    /// Check that every cursor was consumed.
    pub fn finish(self) -> Result<(), RestoreError> {
        if self.position == self.cursors.len() {
            Ok(())
        } else {
            Err(RestoreError::Overflow {
                expected: self.position,
                found: self.cursors.len(),
            })
        }
    }
}

/// Progress capture and restore for a composite subtree.
///
/// Implemented by [`Composite`](crate::Composite) and reached through
/// [`Step::progress`](crate::Step::progress), which is how the pre-order walk
/// tells composite children apart from leaves.
pub trait Resumable {
    /// Number of cursors this subtree writes and consumes.
    fn progress_len(&self) -> usize;

    /// Append this subtree's cursors in pre-order.
    fn write_progress(&self, out: &mut Vec<usize>);

    /// Consume this subtree's cursors and validate them without mutating anything.
    fn check_progress(&self, reader: &mut ProgressReader<'_>) -> Result<(), RestoreError>;

    /// Consume this subtree's cursors and apply them.
    fn apply_progress(&mut self, reader: &mut ProgressReader<'_>) -> Result<(), RestoreError>;
}
