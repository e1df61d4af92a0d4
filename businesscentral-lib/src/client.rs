//! Main BusinessCentralClient

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use reqwest::Client;

use crate::api::DefaultUriBuilder;
use crate::api::UriBuilder;
use crate::api::query::Query;
use crate::api::uri::query_path;
use crate::auth::NoDecoration;
use crate::auth::RequestDecorator;
use crate::error::Error;
use crate::error::TransportError;
use crate::model::Entity;
use crate::response::Envelope;
use crate::response::JsonResponseDecoder;
use crate::response::ResponseDecoder;
use crate::transport::CircuitBreakerConfig;
use crate::transport::CircuitState;
use crate::transport::HttpBackend;
use crate::transport::HttpRequest;
use crate::transport::ReqwestBackend;
use crate::transport::ResilientTransport;
use crate::transport::RetryConfig;

/// Client for the Business Central API.
///
/// This client is cheap to clone (uses `Arc` internally) and can be shared
/// across tasks. Clones share one circuit breaker.
///
/// # Example
///
/// ```ignore
/// use businesscentral_lib::BusinessCentralClient;
/// use businesscentral_lib::auth::{BearerAuth, StaticTokenProvider};
///
/// let client = BusinessCentralClient::builder()
///     .url("https://api.businesscentral.dynamics.com/v2.0/<tenant>/Production/api")
///     .company("5d115c9c-44e3-ea11-bb43-000d3a2feca1")
///     .decorator(BearerAuth::new(StaticTokenProvider::new("my-token"), "https://api.businesscentral.dynamics.com"))
///     .build()?;
///
/// let page = client.get(&Query::<Customer>::new().top(10)).await?;
/// ```
#[derive(Clone)]
pub struct BusinessCentralClient {
    inner: Arc<BusinessCentralClientInner>,
}

struct BusinessCentralClientInner {
    base_url: String,
    company: String,
    api_version: String,
    transport: ResilientTransport,
    decorator: Arc<dyn RequestDecorator>,
    uri_builder: Arc<dyn UriBuilder>,
    decoder: Arc<dyn ResponseDecoder>,
}

impl std::fmt::Debug for BusinessCentralClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusinessCentralClient")
            .field("base_url", &self.inner.base_url)
            .field("company", &self.inner.company)
            .field("api_version", &self.inner.api_version)
            .finish_non_exhaustive()
    }
}

impl BusinessCentralClient {
    /// Creates a new builder for constructing a client.
    pub fn builder() -> BusinessCentralClientBuilder<Missing, Missing> {
        BusinessCentralClientBuilder::new()
    }

    /// Returns the service root URL.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Returns the company identifier requests are scoped to.
    pub fn company(&self) -> &str {
        &self.inner.company
    }

    /// Returns the API version being used.
    pub fn api_version(&self) -> &str {
        &self.inner.api_version
    }

    /// Returns the current circuit breaker state.
    pub async fn circuit_state(&self) -> CircuitState {
        self.inner.transport.circuit_state().await
    }

    /// Fetches a single page of results.
    ///
    /// `$top`/`$skip` are sent as given. Use [`get_all_pages`](Self::get_all_pages)
    /// to follow continuation links.
    pub async fn get<E: Entity>(&self, query: &Query<E>) -> Result<Envelope<E>, Error> {
        let url = self.query_url(query);
        self.execute(HttpRequest::get(url)).await?.into_typed()
    }

    /// Returns the path of `query` relative to the service root.
    pub fn query_path<E: Entity>(&self, query: &Query<E>) -> String {
        query_path(
            self.inner.uri_builder.as_ref(),
            &self.inner.api_version,
            &self.inner.company,
            query,
        )
    }

    pub(crate) fn query_url<E: Entity>(&self, query: &Query<E>) -> String {
        self.url_for(&self.query_path(query))
    }

    pub(crate) fn batch_url(&self) -> String {
        self.url_for(&self.inner.uri_builder.batch_path(&self.inner.api_version))
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.inner.base_url.trim_end_matches('/'), path)
    }

    /// Resolves a continuation link against the service root.
    ///
    /// Absolute links are used verbatim.
    pub(crate) fn resolve_link(&self, link: &str) -> Result<String, Error> {
        match url::Url::parse(link) {
            Ok(_) => Ok(link.to_string()),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = format!("{}/", self.inner.base_url.trim_end_matches('/'));
                let base = url::Url::parse(&base).map_err(|e| Error::InvalidUrl(e.to_string()))?;
                base.join(link)
                    .map(String::from)
                    .map_err(|e| Error::InvalidUrl(e.to_string()))
            }
            Err(e) => Err(Error::InvalidUrl(e.to_string())),
        }
    }

    /// Decorates, sends and decodes one logical request.
    pub(crate) async fn execute(
        &self,
        mut request: HttpRequest,
    ) -> Result<Envelope<serde_json::Value>, Error> {
        self.inner.decorator.decorate(&mut request).await?;
        let response = self.inner.transport.send(request).await?;
        debug!("HTTP {} ({} bytes)", response.status, response.body.len());
        self.inner.decoder.decode(response)
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for constructing a [`BusinessCentralClient`].
///
/// Uses the typestate pattern to ensure required fields are set at compile time.
///
/// # Required Fields
///
/// - `url` - The service root, up to and including `/api`
/// - `company` - The company id requests are scoped to
///
/// # Example
///
/// ```ignore
/// let client = BusinessCentralClient::builder()
///     .url("https://api.businesscentral.dynamics.com/v2.0/<tenant>/Production/api")
///     .company(company_id)
///     .api_version("v2.0")
///     .timeout(Duration::from_secs(30))
///     .retry_config(RetryConfig::default().max_retries(5))
///     .build()?;
/// ```
pub struct BusinessCentralClientBuilder<Url, Company> {
    url: Url,
    company: Company,
    api_version: String,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    http_client: Option<Client>,
    backend: Option<Arc<dyn HttpBackend>>,
    decorator: Arc<dyn RequestDecorator>,
    uri_builder: Arc<dyn UriBuilder>,
    decoder: Arc<dyn ResponseDecoder>,
    retry_config: RetryConfig,
    circuit_breaker: CircuitBreakerConfig,
}

impl BusinessCentralClientBuilder<Missing, Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: Missing,
            company: Missing,
            api_version: "v2.0".to_string(),
            timeout: None,
            connect_timeout: None,
            http_client: None,
            backend: None,
            decorator: Arc::new(NoDecoration),
            uri_builder: Arc::new(DefaultUriBuilder),
            decoder: Arc::new(JsonResponseDecoder),
            retry_config: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl Default for BusinessCentralClientBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U, C> BusinessCentralClientBuilder<U, C> {
    fn with_required<U2, C2>(
        self,
        set: impl FnOnce(U, C) -> (U2, C2),
    ) -> BusinessCentralClientBuilder<U2, C2> {
        let (url, company) = set(self.url, self.company);
        BusinessCentralClientBuilder {
            url,
            company,
            api_version: self.api_version,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            http_client: self.http_client,
            backend: self.backend,
            decorator: self.decorator,
            uri_builder: self.uri_builder,
            decoder: self.decoder,
            retry_config: self.retry_config,
            circuit_breaker: self.circuit_breaker,
        }
    }
}

impl<C> BusinessCentralClientBuilder<Missing, C> {
    /// Sets the service root URL.
    ///
    /// # Example
    ///
    /// ```ignore
    /// .url("https://api.businesscentral.dynamics.com/v2.0/<tenant>/Production/api")
    /// ```
    pub fn url(self, url: impl Into<String>) -> BusinessCentralClientBuilder<Set<String>, C> {
        self.with_required(|_, company| (Set(url.into()), company))
    }
}

impl<U> BusinessCentralClientBuilder<U, Missing> {
    /// Sets the company id requests are scoped to.
    pub fn company(self, company: impl Into<String>) -> BusinessCentralClientBuilder<U, Set<String>> {
        self.with_required(|url, _| (url, Set(company.into())))
    }
}

impl<U, C> BusinessCentralClientBuilder<U, C> {
    /// Sets the API version path segment.
    ///
    /// Defaults to `v2.0`.
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    ///
    /// This is applied when building the HTTP client.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets a custom HTTP client.
    ///
    /// If not set, a default client will be created.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets a custom backend, replacing the HTTP client entirely.
    pub fn backend(mut self, backend: impl HttpBackend + 'static) -> Self {
        self.backend = Some(Arc::new(backend));
        self
    }

    /// Sets a shared custom backend.
    pub fn backend_arc(mut self, backend: Arc<dyn HttpBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Sets the request decorator, e.g. [`BearerAuth`](crate::auth::BearerAuth).
    pub fn decorator(mut self, decorator: impl RequestDecorator + 'static) -> Self {
        self.decorator = Arc::new(decorator);
        self
    }

    /// Sets the URI building strategy.
    pub fn uri_builder(mut self, builder: impl UriBuilder + 'static) -> Self {
        self.uri_builder = Arc::new(builder);
        self
    }

    /// Sets the response decoding strategy.
    pub fn response_decoder(mut self, decoder: impl ResponseDecoder + 'static) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    /// Sets the retry policy.
    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Sets the circuit breaker policy.
    pub fn circuit_breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.circuit_breaker = config;
        self
    }
}

impl BusinessCentralClientBuilder<Set<String>, Set<String>> {
    /// Builds the [`BusinessCentralClient`].
    ///
    /// This method is only available when both `url` and `company` have been set.
    pub fn build(self) -> Result<BusinessCentralClient, Error> {
        url::Url::parse(&self.url.0).map_err(|e| Error::InvalidUrl(format!("{}: {}", self.url.0, e)))?;

        let backend = match self.backend {
            Some(backend) => backend,
            None => {
                let http_client = match self.http_client {
                    Some(client) => client,
                    None => {
                        let mut builder = Client::builder();
                        if let Some(timeout) = self.connect_timeout {
                            builder = builder.connect_timeout(timeout);
                        }
                        builder.build().map_err(TransportError::from)?
                    }
                };
                Arc::new(ReqwestBackend::new(http_client).with_timeout(self.timeout))
                    as Arc<dyn HttpBackend>
            }
        };

        Ok(BusinessCentralClient {
            inner: Arc::new(BusinessCentralClientInner {
                base_url: self.url.0,
                company: self.company.0,
                api_version: self.api_version,
                transport: ResilientTransport::new(
                    backend,
                    self.retry_config,
                    self.circuit_breaker,
                ),
                decorator: self.decorator,
                uri_builder: self.uri_builder,
                decoder: self.decoder,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::transport::HttpResponse;

    struct Unreachable;

    #[async_trait]
    impl HttpBackend for Unreachable {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            Err(TransportError::Connect("unreachable".into()))
        }
    }

    fn client(base: &str) -> BusinessCentralClient {
        BusinessCentralClient::builder()
            .url(base)
            .company("c1")
            .backend(Unreachable)
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let client = client("https://bc.example/api/");
        assert_eq!(client.api_version(), "v2.0");
        assert_eq!(client.company(), "c1");
        assert_eq!(client.batch_url(), "https://bc.example/api/v2.0/$batch");
    }

    #[test]
    fn test_builder_order_is_free() {
        let client = BusinessCentralClient::builder()
            .api_version("beta")
            .company("c2")
            .url("https://bc.example/api")
            .backend(Unreachable)
            .build()
            .unwrap();
        assert_eq!(client.api_version(), "beta");
        assert_eq!(client.company(), "c2");
    }

    #[test]
    fn test_builder_rejects_invalid_url() {
        let err = BusinessCentralClient::builder()
            .url("not a url")
            .company("c")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn test_resolve_link() {
        let client = client("https://bc.example/api");
        assert_eq!(
            client.resolve_link("https://other.example/next?$skiptoken=1").unwrap(),
            "https://other.example/next?$skiptoken=1"
        );
        assert_eq!(
            client.resolve_link("v2.0/companies(c1)/items?$skiptoken=2").unwrap(),
            "https://bc.example/api/v2.0/companies(c1)/items?$skiptoken=2"
        );
    }
}
