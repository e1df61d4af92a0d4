//! Response envelopes and decoding.
//!
//! A [`ResponseDecoder`] turns a raw [`HttpResponse`] into an untyped
//! [`Envelope`]; the client then decodes the `value` items into the caller's
//! record type. Swap the decoder on the client builder to handle custom
//! envelope shapes.

use log::debug;
use log::warn;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::api::SubResponse;
use crate::error::ApiError;
use crate::error::ApiErrorDetail;
use crate::error::Error;
use crate::transport::HttpResponse;

/// A decoded success response.
///
/// # Example
///
/// ```ignore
/// let page = client.get(Query::<Customer>::new().count(true)).await?;
///
/// println!("{} of {:?}", page.value.len(), page.count);
/// if let Some(next) = &page.next_link {
///     println!("more at {}", next);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Envelope<T> {
    /// Records of this page; empty when the body carried none.
    pub value: Vec<T>,
    /// Continuation link to the next page, absent on the last page.
    pub next_link: Option<String>,
    /// Server-side total count, present when `$count=true` was requested.
    pub count: Option<u64>,
    /// Sub-responses of a batch call.
    pub responses: Vec<SubResponse>,
    /// HTTP status code of the exchange.
    pub status: u16,
}

impl<T> Envelope<T> {
    /// Creates an envelope with no content.
    pub fn empty(status: u16) -> Self {
        Self {
            value: Vec::new(),
            next_link: None,
            count: None,
            responses: Vec::new(),
            status,
        }
    }

    /// Returns `true` if another page is available.
    pub fn has_next(&self) -> bool {
        self.next_link.is_some()
    }

    /// Consumes the envelope, returning its records.
    pub fn into_value(self) -> Vec<T> {
        self.value
    }
}

impl Envelope<serde_json::Value> {
    /// Decodes the records into `T`.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<Envelope<T>, Error> {
        let value = self
            .value
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value(item).map_err(|e| Error::Decode {
                    message: format!("record {}: {}", index, e),
                    body: None,
                })
            })
            .collect::<Result<Vec<T>, Error>>()?;

        Ok(Envelope {
            value,
            next_link: self.next_link,
            count: self.count,
            responses: self.responses,
            status: self.status,
        })
    }
}

/// Wire shape of a success envelope.
#[derive(Deserialize)]
struct WireEnvelope {
    #[serde(default)]
    value: Option<Vec<serde_json::Value>>,
    #[serde(rename = "@odata.nextLink", default)]
    next_link: Option<String>,
    #[serde(rename = "@odata.count", default)]
    count: Option<u64>,
    #[serde(default)]
    responses: Option<Vec<SubResponse>>,
}

/// Wire shape of an error envelope.
#[derive(Deserialize)]
struct WireError {
    error: ApiErrorDetail,
}

/// Interprets raw HTTP responses.
pub trait ResponseDecoder: Send + Sync {
    /// Decodes a success response into an envelope, or a failure response
    /// into an error.
    fn decode(&self, response: HttpResponse) -> Result<Envelope<serde_json::Value>, Error>;
}

/// Decoder for the JSON envelope format.
///
/// - 2xx with an empty or `null` body, or a body that is not an object:
///   empty envelope carrying the status
/// - 2xx with an object body: `value`, `@odata.nextLink`, `@odata.count`
///   and `responses` are read
/// - non-2xx: [`Error::Api`], with structured detail when the body is an
///   error envelope
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResponseDecoder;

impl ResponseDecoder for JsonResponseDecoder {
    fn decode(&self, response: HttpResponse) -> Result<Envelope<serde_json::Value>, Error> {
        if !response.is_success() {
            return Err(decode_error(response).into());
        }

        let status = response.status;
        if response.body.trim().is_empty() {
            return Ok(Envelope::empty(status));
        }

        let json: serde_json::Value = serde_json::from_str(&response.body)
            .map_err(|e| Error::decode(e.to_string(), response.body.clone()))?;

        if !json.is_object() {
            debug!("Response body is not an envelope object, returning empty envelope");
            return Ok(Envelope::empty(status));
        }

        let wire: WireEnvelope = serde_json::from_value(json)
            .map_err(|e| Error::decode(e.to_string(), response.body.clone()))?;

        Ok(Envelope {
            value: wire.value.unwrap_or_default(),
            next_link: wire.next_link,
            count: wire.count,
            responses: wire.responses.unwrap_or_default(),
            status,
        })
    }
}

/// Builds an [`ApiError`] from a failure response.
///
/// An unparsable body still yields an error carrying the status; the parse
/// failure itself is only logged.
pub fn decode_error(response: HttpResponse) -> ApiError {
    match serde_json::from_str::<WireError>(&response.body) {
        Ok(wire) => ApiError::with_detail(response.status, wire.error, response.body),
        Err(e) => {
            if !response.body.trim().is_empty() {
                warn!(
                    "Could not parse error body for HTTP {}: {}",
                    response.status, e
                );
            }
            ApiError::new(response.status, response.body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_page() {
        let body = r#"{
            "@odata.context": "ctx",
            "@odata.count": 42,
            "value": [{"id": 1}, {"id": 2}],
            "@odata.nextLink": "https://host/api/v2.0/companies(x)/customers?$skiptoken=2"
        }"#;
        let envelope = JsonResponseDecoder
            .decode(HttpResponse::new(200, body))
            .unwrap();

        assert_eq!(envelope.status, 200);
        assert_eq!(envelope.value.len(), 2);
        assert_eq!(envelope.count, Some(42));
        assert_eq!(
            envelope.next_link.as_deref(),
            Some("https://host/api/v2.0/companies(x)/customers?$skiptoken=2")
        );
    }

    #[test]
    fn test_empty_and_null_bodies_yield_empty_envelope() {
        for body in ["", "  ", "null"] {
            let envelope = JsonResponseDecoder
                .decode(HttpResponse::new(204, body))
                .unwrap();
            assert_eq!(envelope.status, 204);
            assert!(envelope.value.is_empty());
            assert!(envelope.next_link.is_none());
        }
    }

    #[test]
    fn test_malformed_success_body_is_decode_error() {
        let err = JsonResponseDecoder
            .decode(HttpResponse::new(200, "{not json"))
            .unwrap_err();
        assert!(matches!(err, Error::Decode { body: Some(_), .. }));
    }

    #[test]
    fn test_structured_error() {
        let body = r#"{"error":{"code":"BadRequest_NotFound","message":"No customer"}}"#;
        let err = JsonResponseDecoder
            .decode(HttpResponse::new(404, body))
            .unwrap_err();

        match err {
            Error::Api(api) => {
                assert_eq!(api.status, 404);
                assert_eq!(api.error_code(), Some("BadRequest_NotFound"));
                assert_eq!(api.message(), Some("No customer"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unparsable_error_keeps_status() {
        let err = JsonResponseDecoder
            .decode(HttpResponse::new(502, "<html>Bad Gateway</html>"))
            .unwrap_err();

        assert_eq!(err.status_code(), Some(502));
        match err {
            Error::Api(api) => {
                assert!(api.detail.is_none());
                assert_eq!(api.body, "<html>Bad Gateway</html>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_into_typed() {
        #[derive(Debug, Deserialize)]
        struct Row {
            id: i32,
        }

        let envelope = JsonResponseDecoder
            .decode(HttpResponse::new(200, r#"{"value":[{"id":7}]}"#))
            .unwrap()
            .into_typed::<Row>()
            .unwrap();
        assert_eq!(envelope.value[0].id, 7);

        let err = JsonResponseDecoder
            .decode(HttpResponse::new(200, r#"{"value":[{"id":"x"}]}"#))
            .unwrap()
            .into_typed::<Row>()
            .unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }
}
