//! Provider implementation for the waste-operations REST backend.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use wastemap_core::{
    model::{Bin, FleetSnapshot, Route},
    ports::{FleetPort, PortError, SourceMeta},
};

const BINS_PATH: &str = "bins";
const ROUTES_PATH: &str = "routes";

/// List responses come either bare or wrapped as `{ "data": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListBody<T> {
    Bare(Vec<T>),
    Envelope {
        data: Vec<T>,
    },
}

impl<T> ListBody<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            ListBody::Bare(items) | ListBody::Envelope { data: items } => items,
        }
    }
}

/// Snapshot source backed by `GET {base}/bins` and `GET {base}/routes`.
pub struct RestFleetPort {
    client: Client,
    base_url: String,
    meta: SourceMeta,
}

impl RestFleetPort {
    /// Create a new port bound to the given HTTP client and API base URL.
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        let meta = SourceMeta {
            id: "rest".to_owned(),
            name: format!("REST backend at {base_url}"),
        };
        Self {
            client,
            base_url,
            meta,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

#[async_trait]
impl FleetPort for RestFleetPort {
    fn source(&self) -> &SourceMeta {
        &self.meta
    }

    async fn snapshot(&self) -> Result<FleetSnapshot, PortError> {
        let bins = fetch_list::<Bin>(self.client.get(self.url(BINS_PATH))).await?;
        let routes = fetch_list::<Route>(self.client.get(self.url(ROUTES_PATH))).await?;

        let snapshot = FleetSnapshot { bins, routes };
        tracing::debug!(
            bins = snapshot.bins.len(),
            routes = snapshot.routes.len(),
            "fetched snapshot from backend"
        );
        Ok(snapshot)
    }
}

/// Build a shared port for the backend at `base_url`.
#[must_use]
pub fn port(client: Client, base_url: impl Into<String>) -> Arc<dyn FleetPort> {
    Arc::new(RestFleetPort::new(client, base_url))
}

// Small helper to fetch and decode a list with status handling.
async fn fetch_list<T: DeserializeOwned>(req: RequestBuilder) -> Result<Vec<T>, PortError> {
    let body = req
        .send()
        .await
        .map_err(PortError::from)?
        .error_for_status()
        .map_err(PortError::from)?
        .json::<ListBody<T>>()
        .await
        .map_err(PortError::from)?;
    Ok(body.into_items())
}
