//! Batch response parsing.

use std::collections::HashMap;

use log::warn;
use serde::Deserialize;
use serde::Deserializer;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::error::ApiErrorDetail;

// =============================================================================
// Sub-Response
// =============================================================================

/// Result of a single sub-request in a batch.
///
/// The body is kept as raw JSON and decoded on demand, so one malformed
/// entry does not affect the others.
#[derive(Debug, Clone, Deserialize)]
pub struct SubResponse {
    /// Id of the sub-request this answers.
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    /// HTTP status code of the sub-request.
    pub status: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: serde_json::Value,
}

impl SubResponse {
    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes the whole body into `T`.
    ///
    /// Returns `None` (and logs) if the body does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Option<T> {
        match serde_json::from_value(self.body.clone()) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Batch sub-response {} could not be decoded: {}", self.id, e);
                None
            }
        }
    }

    /// Decodes the `value` array of the body into records.
    ///
    /// Returns `None` (and logs) if the body has no `value` array or its
    /// items do not match `T`.
    pub fn records<T: DeserializeOwned>(&self) -> Option<Vec<T>> {
        #[derive(Deserialize)]
        #[serde(bound = "T: DeserializeOwned")]
        struct Records<T> {
            value: Vec<T>,
        }

        self.decode::<Records<T>>().map(|r| r.value)
    }

    /// Returns the error of a failed sub-response.
    ///
    /// `None` for successful sub-responses.
    pub fn error(&self) -> Option<ApiError> {
        if self.is_success() {
            return None;
        }

        #[derive(Deserialize)]
        struct WireError {
            error: ApiErrorDetail,
        }

        let body = self.body.to_string();
        Some(match serde_json::from_value::<WireError>(self.body.clone()) {
            Ok(wire) => ApiError::with_detail(self.status, wire.error, body),
            Err(_) => ApiError::new(self.status, body),
        })
    }

    /// Returns a header value, matching the name case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Accepts ids sent as either strings or numbers.
fn id_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

// =============================================================================
// Batch Response
// =============================================================================

/// Result of a batch call.
#[derive(Debug, Clone)]
pub struct BatchResponse {
    status: u16,
    responses: Vec<SubResponse>,
}

impl BatchResponse {
    pub(crate) fn new(status: u16, responses: Vec<SubResponse>) -> Self {
        Self { status, responses }
    }

    /// HTTP status of the batch call itself.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns the sub-response for a request id.
    pub fn get(&self, id: &str) -> Option<&SubResponse> {
        self.responses.iter().find(|r| r.id == id)
    }

    /// Decodes the `value` records of the sub-response with the given id.
    pub fn records<T: DeserializeOwned>(&self, id: &str) -> Option<Vec<T>> {
        self.get(id).and_then(SubResponse::records)
    }

    /// Returns the number of sub-responses.
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// Returns true if there are no sub-responses.
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// Checks if all sub-requests succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.responses.iter().all(SubResponse::is_success)
    }

    /// Iterator over sub-responses, in the order the server returned them.
    pub fn iter(&self) -> impl Iterator<Item = &SubResponse> {
        self.responses.iter()
    }

    /// Consumes the response, returning its sub-responses.
    pub fn into_responses(self) -> Vec<SubResponse> {
        self.responses
    }
}
