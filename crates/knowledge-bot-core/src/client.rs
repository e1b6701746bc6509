use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::conversation::Source;
use crate::error::QueryError;

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

/// Body of a successful `/query` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<Source>,
}

/// Client for the knowledge service's `/query` endpoint.
///
/// One call is one POST: no timeout, no retry.
#[derive(Clone)]
pub struct QueryClient {
    client: Client,
    base_url: Option<String>,
}

impl QueryClient {
    pub fn new(base_url: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
        }
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub async fn query(&self, text: &str) -> Result<QueryResponse, QueryError> {
        let base_url = self.base_url.as_deref().ok_or(QueryError::MissingBaseUrl)?;
        let url = format!("{}/query", base_url);

        tracing::debug!(%url, chars = text.chars().count(), "Sending query");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&QueryRequest { query: text })
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let status = status.as_u16();
            let body = serde_json::from_slice(&body)
                .map_err(|source| QueryError::MalformedErrorBody { status, source })?;
            return Err(QueryError::Remote { status, body });
        }

        let answer: QueryResponse = serde_json::from_slice(&body)?;
        tracing::debug!(sources = answer.sources.len(), "Query answered");
        Ok(answer)
    }
}
