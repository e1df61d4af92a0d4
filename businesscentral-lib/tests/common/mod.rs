//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use businesscentral_lib::BusinessCentralClient;
use businesscentral_lib::BusinessCentralClientBuilder;
use businesscentral_lib::Set;
use businesscentral_lib::error::TransportError;
use businesscentral_lib::model::Entity;
use businesscentral_lib::model::Field;
use businesscentral_lib::transport::HttpBackend;
use businesscentral_lib::transport::HttpRequest;
use businesscentral_lib::transport::HttpResponse;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

pub const BASE_URL: &str = "https://bc.example/v2.0/tenant/Production/api";
pub const COMPANY: &str = "c1";

// =============================================================================
// Scripted backend
// =============================================================================

/// Backend that replays scripted outcomes and records every request.
///
/// Once the script is exhausted it answers `200 {"value":[]}`.
#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
    cancel_on_request: Mutex<Option<(usize, CancellationToken)>>,
}

impl ScriptedBackend {
    pub fn new(script: impl IntoIterator<Item = Result<HttpResponse, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Default::default()
        })
    }

    /// Backend that always answers with the given status.
    pub fn always(status: u16, body: &str, times: usize) -> Arc<Self> {
        Self::new((0..times).map(|_| Ok(HttpResponse::new(status, body))))
    }

    /// Cancels `token` while serving the `n`th request (1-based).
    pub fn cancel_on(&self, n: usize, token: CancellationToken) {
        *self.cancel_on_request.lock().unwrap() = Some((n, token));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

#[async_trait]
impl HttpBackend for ScriptedBackend {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let count = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };

        if let Some((n, token)) = &*self.cancel_on_request.lock().unwrap()
            && *n == count
        {
            token.cancel();
        }

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse::new(200, r#"{"value":[]}"#)))
    }
}

pub fn builder(backend: Arc<ScriptedBackend>) -> BusinessCentralClientBuilder<Set<String>, Set<String>> {
    BusinessCentralClient::builder()
        .url(BASE_URL)
        .company(COMPANY)
        .backend_arc(backend)
}

pub fn client(backend: Arc<ScriptedBackend>) -> BusinessCentralClient {
    builder(backend).build().unwrap()
}

pub fn ok(body: impl Into<String>) -> Result<HttpResponse, TransportError> {
    Ok(HttpResponse::new(200, body))
}

// =============================================================================
// Entities
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub number: String,
    pub display_name: String,
    #[serde(default)]
    pub balance: f64,
}

impl Entity for Customer {
    const NAME: &'static str = "Customer";
}

impl Customer {
    pub const NUMBER: Field<Customer, String> = Field::new("number");
    pub const NAME: Field<Customer, String> = Field::renamed("name", "displayName");
    pub const BALANCE: Field<Customer, f64> = Field::new("balance");
    pub const COUNTRY: Field<Customer, String> = Field::renamed("country", "countryRegionCode");
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub number: String,
    pub display_name: String,
}

impl Entity for Vendor {
    const NAME: &'static str = "Vendor";
}

pub fn customer_json(number: &str) -> String {
    format!(r#"{{"number":"{0}","displayName":"Customer {0}","balance":0}}"#, number)
}

/// A page envelope with the given customer numbers and optional next link.
pub fn customer_page(numbers: &[&str], next_link: Option<&str>) -> String {
    let value = numbers
        .iter()
        .map(|n| customer_json(n))
        .collect::<Vec<_>>()
        .join(",");
    match next_link {
        Some(link) => format!(r#"{{"value":[{}],"@odata.nextLink":"{}"}}"#, value, link),
        None => format!(r#"{{"value":[{}]}}"#, value),
    }
}
