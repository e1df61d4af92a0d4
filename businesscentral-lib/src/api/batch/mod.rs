//! JSON batch requests
//!
//! Bundles several read queries into one `POST {apiVersion}/$batch` call.
//! Sub-requests get 1-based ids in the order they were added.
//!
//! # Example
//!
//! ```ignore
//! let response = client
//!     .batch()
//!     .add(&Query::<Customer>::new().top(5))
//!     .add(&Query::<Vendor>::new().filter(Vendor::BLOCKED.eq(true))?)
//!     .send()
//!     .await?;
//!
//! let customers: Option<Vec<Customer>> = response.get("1").and_then(|r| r.records());
//! let vendors: Option<Vec<Vendor>> = response.get("2").and_then(|r| r.records());
//! ```

mod response;

pub use response::BatchResponse;
pub use response::SubResponse;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::BusinessCentralClient;
use crate::api::query::Query;
use crate::error::Error;
use crate::model::Entity;
use crate::transport::HttpRequest;

// =============================================================================
// Batch Request
// =============================================================================

/// One sub-request of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchRequestItem {
    /// 1-based position in the batch.
    pub id: String,
    /// Always `GET`.
    pub method: String,
    /// Request path as rendered by the client's URI builder.
    pub url: String,
    pub headers: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct BatchEnvelope<'a> {
    requests: &'a [BatchRequestItem],
}

/// Builder for a batch of read queries.
#[derive(Debug, Clone)]
pub struct Batch<'a> {
    client: &'a BusinessCentralClient,
    requests: Vec<BatchRequestItem>,
}

impl<'a> Batch<'a> {
    pub(crate) fn new(client: &'a BusinessCentralClient) -> Self {
        Self {
            client,
            requests: Vec::new(),
        }
    }

    /// Appends a query; its id is its 1-based position.
    pub fn add<E: Entity>(mut self, query: &Query<E>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Accept".to_string(), "application/json".to_string());

        self.requests.push(BatchRequestItem {
            id: (self.requests.len() + 1).to_string(),
            method: "GET".to_string(),
            url: self.client.query_path(query),
            headers,
        });
        self
    }

    /// Returns the sub-requests added so far.
    pub fn requests(&self) -> &[BatchRequestItem] {
        &self.requests
    }

    /// Returns the number of sub-requests.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Returns `true` if no sub-request was added.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Serializes the request envelope.
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(&BatchEnvelope {
            requests: &self.requests,
        })?)
    }

    /// Sends the batch.
    pub async fn send(self) -> Result<BatchResponse, Error> {
        self.client.send_batch(&self).await
    }
}

impl BusinessCentralClient {
    /// Starts a batch of read queries.
    pub fn batch(&self) -> Batch<'_> {
        Batch::new(self)
    }

    /// Sends a batch in one request.
    ///
    /// Fails as a whole only if the batch call itself fails. Individual
    /// sub-responses carry their own status and are decoded on demand.
    pub async fn send_batch(&self, batch: &Batch<'_>) -> Result<BatchResponse, Error> {
        let body = batch.to_json()?;
        let request = HttpRequest::post_json(self.batch_url(), body);
        let envelope = self.execute(request).await?;
        Ok(BatchResponse::new(envelope.status, envelope.responses))
    }
}
