//! Parking place for the progress of suspended cases.
//!
//! The engine never touches a store. A halted [`Case`](crate::Case) parks
//! its progress vector here on [`suspend`](crate::Case::suspend) and takes it
//! back on [`load`](crate::Case::load). How the vector is encoded is up to
//! the backend; [`InMemoryStore`] keeps the JSON array a database column
//! would hold.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::progress::ProgressVector;

/// Identifier of a case, stable across suspend and load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(pub Uuid);

impl CaseId {
    /// A fresh random ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CaseId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for CaseId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for CaseId {
    type Err = uuid::Error;

    /// Parse the hyphenated form carried by bus messages.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Errors raised by a [`Store`].
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Nothing is parked for the case.
    #[error("no suspended progress for case {0}")]
    NotFound(CaseId),

    /// Parked progress could not be encoded or decoded.
    #[error("progress of case {id} is unreadable: {source}")]
    Codec {
        /// The case whose progress failed.
        id: CaseId,
        /// Underlying codec error.
        #[source]
        source: serde_json::Error,
    },

    /// The backend failed.
    #[error("store backend failed: {0}")]
    Backend(String),
}

/// Progress parked for a suspended case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspendedRecord {
    /// The case.
    pub id: CaseId,

    /// Pre-order cursors of the case's root at suspension.
    pub progress: ProgressVector,

    /// How many times the case has been suspended, this time included.
    pub suspensions: u32,

    /// When the progress was last parked (Unix millis).
    pub suspended_at: u64,
}

/// Storage backend for suspended progress.
///
/// Backends are shared between tasks, hence `Send + Sync`.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Park the progress of a case, replacing whatever was parked before.
    ///
    /// Returns the record as stored.
    async fn save(
        &self,
        id: CaseId,
        progress: &ProgressVector,
    ) -> Result<SuspendedRecord, StoreError>;

    /// The progress parked for a case.
    async fn fetch(&self, id: CaseId) -> Result<SuspendedRecord, StoreError>;

    /// Drop the progress parked for a case.
    ///
    /// Returns `false` if nothing was parked.
    async fn remove(&self, id: CaseId) -> Result<bool, StoreError>;
}

// ============================================================================
// In-Memory Store
// ============================================================================

/// Row as a persistent backend would keep it: progress as a JSON array.
#[derive(Debug, Clone)]
struct Row {
    progress: String,
    suspensions: u32,
    suspended_at: u64,
}

impl Row {
    fn decode(&self, id: CaseId) -> Result<SuspendedRecord, StoreError> {
        let progress = serde_json::from_str(&self.progress)
            .map_err(|source| StoreError::Codec { id, source })?;
        Ok(SuspendedRecord {
            id,
            progress,
            suspensions: self.suspensions,
            suspended_at: self.suspended_at,
        })
    }
}

fn unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as u64)
}

/// In-process store for tests and single-node deployments.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    rows: RwLock<HashMap<CaseId, Row>>,
}

impl InMemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of parked cases.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Returns `true` if no case is parked.
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// Encoded progress of a case, exactly as stored.
    pub fn encoded(&self, id: CaseId) -> Option<String> {
        self.rows.read().get(&id).map(|row| row.progress.clone())
    }
}

#[async_trait::async_trait]
impl Store for InMemoryStore {
    async fn save(
        &self,
        id: CaseId,
        progress: &ProgressVector,
    ) -> Result<SuspendedRecord, StoreError> {
        let encoded =
            serde_json::to_string(progress).map_err(|source| StoreError::Codec { id, source })?;

        let mut rows = self.rows.write();
        let suspensions = rows.get(&id).map_or(1, |row| row.suspensions + 1);
        let row = Row {
            progress: encoded,
            suspensions,
            suspended_at: unix_millis(),
        };
        let record = SuspendedRecord {
            id,
            progress: progress.clone(),
            suspensions,
            suspended_at: row.suspended_at,
        };
        rows.insert(id, row);
        Ok(record)
    }

    async fn fetch(&self, id: CaseId) -> Result<SuspendedRecord, StoreError> {
        match self.rows.read().get(&id) {
            Some(row) => row.decode(id),
            None => Err(StoreError::NotFound(id)),
        }
    }

    async fn remove(&self, id: CaseId) -> Result<bool, StoreError> {
        Ok(self.rows.write().remove(&id).is_some())
    }
}
