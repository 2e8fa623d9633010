//! Provider implementation reading snapshots from a JSON file on disk.
//!
//! The file holds `{ "bins": [...], "routes": [...] }` in the same shape the
//! REST backend serves. It is re-read on every request so edits show up on
//! the next reload.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use wastemap_core::{
    model::FleetSnapshot,
    ports::{FleetPort, PortError, SourceMeta},
};

/// Snapshot source backed by a JSON file.
pub struct FixtureFleetPort {
    path: PathBuf,
    meta: SourceMeta,
}

impl FixtureFleetPort {
    /// Create a new port reading from `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let meta = SourceMeta {
            id: "fixture".to_owned(),
            name: format!("fixture {}", path.display()),
        };
        Self { path, meta }
    }

    /// File this port reads.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FleetPort for FixtureFleetPort {
    fn source(&self) -> &SourceMeta {
        &self.meta
    }

    async fn snapshot(&self) -> Result<FleetSnapshot, PortError> {
        let raw = tokio::fs::read(&self.path).await?;
        let snapshot = parse_snapshot(&raw)?;
        tracing::debug!(
            path = %self.path.display(),
            bins = snapshot.bins.len(),
            routes = snapshot.routes.len(),
            "read fixture"
        );
        Ok(snapshot)
    }
}

/// Build a shared port for the fixture at `path`.
#[must_use]
pub fn port(path: impl Into<PathBuf>) -> Arc<dyn FleetPort> {
    Arc::new(FixtureFleetPort::new(path))
}

fn parse_snapshot(raw: &[u8]) -> Result<FleetSnapshot, PortError> {
    serde_json::from_slice(raw).map_err(|err| PortError::Decode(err.to_string()))
}
