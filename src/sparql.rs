use reqwest::header::ACCEPT;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::results::ResultSet;

pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// A failed query round-trip. Every variant renders as
/// `query execution failed: <cause>`.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("query execution failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("query execution failed: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Dispatches SPARQL queries to a single endpoint.
pub struct SparqlClient {
    client: Client,
    endpoint: String,
}

impl SparqlClient {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run `query` and decode the SPARQL JSON results.
    pub async fn query(&self, query: &str) -> Result<ResultSet, QueryError> {
        info!("Querying {}", self.endpoint);
        // Form encoding: spaces go out as `+`, which SPARQL endpoints decode
        // the same as `%20`.
        let body = self
            .client
            .get(&self.endpoint)
            .query(&[("query", query)])
            .header(ACCEPT, SPARQL_RESULTS_JSON)
            .send()
            .await
            .map_err(QueryError::Transport)?
            .error_for_status()
            .map_err(QueryError::Transport)?
            .bytes()
            .await
            .map_err(QueryError::Transport)?;
        debug!(bytes = body.len(), "query response received");

        let parsed: Option<ResultSet> = serde_json::from_slice(&body).map_err(QueryError::Decode)?;
        let results = parsed.unwrap_or_default();
        match results.bindings() {
            Some(b) => info!(rows = b.len(), "Query returned"),
            None => warn!("Query response has no results.bindings"),
        }
        Ok(results)
    }
}
