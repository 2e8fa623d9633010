//! High-level service facade over a snapshot source.

use std::sync::Arc;

use crate::model::FleetSnapshot;
use crate::ports::{FleetPort, PortError, SourceMeta};

/// Public entry point for loading the data the map draws.
pub struct FleetService {
    port: Arc<dyn FleetPort>,
}

impl FleetService {
    /// Create a new service bound to the provided source.
    #[must_use]
    pub fn new(port: Arc<dyn FleetPort>) -> Self {
        Self { port }
    }

    /// Metadata of the underlying source.
    #[must_use]
    pub fn source(&self) -> &SourceMeta {
        self.port.source()
    }

    /// Load a fresh snapshot, shared read-only with the map.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] if the source cannot be read or decoded.
    pub async fn load(&self) -> Result<Arc<FleetSnapshot>, PortError> {
        let source = &self.port.source().id;
        match self.port.snapshot().await {
            Ok(snapshot) => {
                tracing::info!(
                    source = %source,
                    bins = snapshot.bins.len(),
                    routes = snapshot.routes.len(),
                    "snapshot loaded"
                );
                Ok(Arc::new(snapshot))
            }
            Err(err) => {
                tracing::warn!(source = %source, error = %err, "snapshot load failed");
                Err(err)
            }
        }
    }
}
