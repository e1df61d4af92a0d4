//! Server-driven pagination.

use futures::Stream;
use log::debug;
use tokio_util::sync::CancellationToken;

use crate::BusinessCentralClient;
use crate::api::query::Query;
use crate::error::Error;
use crate::model::Entity;
use crate::response::Envelope;
use crate::transport::HttpRequest;

/// Async iterator that yields pages of query results.
///
/// Pages are fetched strictly in order; each request follows the
/// continuation link of the previous response verbatim. Client-side
/// `$top`/`$skip` are dropped from the query.
///
/// # Example
///
/// ```ignore
/// let mut pages = client.pages(Query::<Customer>::new().filter(Customer::BLOCKED.eq(false))?);
///
/// while let Some(page) = pages.next().await {
///     let page = page?;
///     for customer in page.value {
///         println!("{}", customer.display_name);
///     }
/// }
/// ```
pub struct Pages<'a, E> {
    client: &'a BusinessCentralClient,
    /// URL of the next request; `None` once exhausted.
    next_url: Option<String>,
    pages_fetched: usize,
    _entity: std::marker::PhantomData<fn() -> E>,
}

impl<'a, E: Entity> Pages<'a, E> {
    pub(crate) fn new(client: &'a BusinessCentralClient, mut query: Query<E>) -> Self {
        query.clear_paging();
        Self {
            client,
            next_url: Some(client.query_url(&query)),
            pages_fetched: 0,
            _entity: std::marker::PhantomData,
        }
    }

    /// Number of pages fetched so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Fetches the next page of results.
    ///
    /// Returns `None` when all pages have been consumed. After an error the
    /// iterator is exhausted.
    pub async fn next(&mut self) -> Option<Result<Envelope<E>, Error>> {
        let url = self.next_url.take()?;
        debug!("Fetching page {}: {}", self.pages_fetched + 1, url);

        let envelope = match self.fetch(url).await {
            Ok(envelope) => envelope,
            Err(e) => return Some(Err(e)),
        };
        self.pages_fetched += 1;

        if let Some(link) = &envelope.next_link {
            match self.client.resolve_link(link) {
                Ok(next) => self.next_url = Some(next),
                Err(e) => return Some(Err(e)),
            }
        }

        Some(Ok(envelope))
    }

    /// Converts the iterator into a [`Stream`] of pages.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use futures::TryStreamExt;
    ///
    /// let sizes: Vec<usize> = client
    ///     .pages(Query::<Item>::new())
    ///     .into_stream()
    ///     .map_ok(|page| page.value.len())
    ///     .try_collect()
    ///     .await?;
    /// ```
    pub fn into_stream(self) -> impl Stream<Item = Result<Envelope<E>, Error>> + 'a {
        futures::stream::unfold(self, |mut pages| async move {
            let page = pages.next().await?;
            Some((page, pages))
        })
    }

    async fn fetch(&self, url: String) -> Result<Envelope<E>, Error> {
        self.client.execute(HttpRequest::get(url)).await?.into_typed()
    }
}

impl BusinessCentralClient {
    /// Iterates over all pages of a query.
    pub fn pages<E: Entity>(&self, query: Query<E>) -> Pages<'_, E> {
        Pages::new(self, query)
    }

    /// Fetches every page of a query and returns all records in page order.
    ///
    /// Stops at the first failed page and returns its error.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let customers = client
    ///     .get_all_pages(Query::<Customer>::new().order_by(Customer::NUMBER))
    ///     .await?;
    /// ```
    pub async fn get_all_pages<E: Entity>(&self, query: Query<E>) -> Result<Vec<E>, Error> {
        self.get_all_pages_with_cancel(query, &CancellationToken::new())
            .await
    }

    /// Like [`get_all_pages`](Self::get_all_pages), but stops early when
    /// `cancel` is triggered.
    ///
    /// Cancellation is checked between pages, never during a request. A
    /// cancelled run returns the records accumulated so far.
    pub async fn get_all_pages_with_cancel<E: Entity>(
        &self,
        query: Query<E>,
        cancel: &CancellationToken,
    ) -> Result<Vec<E>, Error> {
        let mut pages = self.pages(query);
        let mut items = Vec::new();

        loop {
            if cancel.is_cancelled() {
                debug!(
                    "Pagination cancelled after {} pages ({} records)",
                    pages.pages_fetched(),
                    items.len()
                );
                break;
            }

            match pages.next().await {
                Some(page) => items.extend(page?.value),
                None => break,
            }
        }

        Ok(items)
    }
}
