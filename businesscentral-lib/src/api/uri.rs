//! Request URI construction.

use crate::api::query::Query;
use crate::model::Entity;

/// Everything a [`UriBuilder`] needs to address an entity set.
#[derive(Debug, Clone, Copy)]
pub struct UriContext<'a> {
    /// API version path segment, e.g. `v2.0`.
    pub api_version: &'a str,
    /// Company (tenant scope) identifier.
    pub company: &'a str,
    /// Entity set name.
    pub entity_set: &'a str,
    /// Encoded query string, without a leading `?`; may be empty.
    pub query_string: &'a str,
}

/// Renders request paths relative to the service root.
///
/// Replace the default on the client builder to inject extra query
/// parameters or address a different path layout.
pub trait UriBuilder: Send + Sync {
    /// Path of an entity set request, including its query string.
    fn entity_set_path(&self, context: &UriContext<'_>) -> String;

    /// Path of the batch endpoint.
    fn batch_path(&self, api_version: &str) -> String {
        format!("{}/$batch", api_version)
    }
}

/// `{apiVersion}/companies({company})/{entitySet}?{queryString}`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultUriBuilder;

impl UriBuilder for DefaultUriBuilder {
    fn entity_set_path(&self, context: &UriContext<'_>) -> String {
        let mut path = format!(
            "{}/companies({})/{}",
            context.api_version, context.company, context.entity_set
        );
        if !context.query_string.is_empty() {
            path.push('?');
            path.push_str(context.query_string);
        }
        path
    }
}

/// Renders the relative path of `query` with `builder`.
pub(crate) fn query_path<E: Entity>(
    builder: &dyn UriBuilder,
    api_version: &str,
    company: &str,
    query: &Query<E>,
) -> String {
    let entity_set = query.resolved_entity_set();
    let query_string = query.to_query_string();
    builder.entity_set_path(&UriContext {
        api_version,
        company,
        entity_set: &entity_set,
        query_string: &query_string,
    })
}
