//! Traits describing snapshot sources and shared helper types.

use std::io::Error as IoError;

use async_trait::async_trait;
use reqwest::Error as ReqwestError;

use crate::model::FleetSnapshot;

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while loading a snapshot.
pub enum PortError {
    /// Network layer failed or the backend answered with an error status.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// Reading a local snapshot failed.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),
    /// The payload could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
    /// Internal provider error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Description of where a snapshot comes from.
pub struct SourceMeta {
    /// Short identifier, e.g. `rest` or `fixture`.
    pub id: String,
    /// Human-friendly description shown in the status bar.
    pub name: String,
}

#[async_trait]
/// Source of bin and route snapshots.
pub trait FleetPort: Send + Sync {
    /// Metadata describing this source.
    fn source(&self) -> &SourceMeta;

    /// Fetch the current bins and routes.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the source cannot be read or decoded.
    async fn snapshot(&self) -> Result<FleetSnapshot, PortError>;
}

/// Port serving a fixed snapshot from memory.
pub struct StaticFleetPort {
    meta: SourceMeta,
    snapshot: FleetSnapshot,
}

impl StaticFleetPort {
    /// Port that always returns `snapshot`.
    #[must_use]
    pub fn new(snapshot: FleetSnapshot) -> Self {
        Self {
            meta: SourceMeta {
                id: "static".to_owned(),
                name: "in-memory snapshot".to_owned(),
            },
            snapshot,
        }
    }
}

#[async_trait]
impl FleetPort for StaticFleetPort {
    fn source(&self) -> &SourceMeta {
        &self.meta
    }

    async fn snapshot(&self) -> Result<FleetSnapshot, PortError> {
        Ok(self.snapshot.clone())
    }
}
