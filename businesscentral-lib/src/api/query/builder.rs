//! Query builder.

use std::marker::PhantomData;

use crate::api::aggregate::Aggregation;
use crate::error::QueryError;
use crate::model::Entity;
use crate::model::Field;
use crate::model::FieldName;

use super::expr::Expr;
use super::expr::Predicate;
use super::options;
use super::options::QueryOptions;
use super::order::Direction;
use super::projection::Projection;
use super::translate::TranslationCache;
use super::translate::translate;

/// Accumulated query options for one entity type.
///
/// Built fluently; every operation consumes and returns the query. Operations
/// that can reject their input (`select`, `filter`, `then_by`, nested
/// `expand_with`, `apply`) return `Result` and fail before any request is
/// made.
///
/// # Example
///
/// ```ignore
/// let query = Query::<Customer>::new()
///     .select(Projection::pick([Customer::NUMBER, Customer::NAME]))?
///     .filter(Customer::BALANCE.gt(0).and(Customer::COUNTRY.eq("US")))?
///     .order_by(Customer::NAME)
///     .then_by_descending(Customer::BALANCE)?
///     .top(50);
///
/// let customers = client.get_all_pages(query).await?;
/// ```
pub struct Query<E> {
    options: QueryOptions,
    expands: Vec<String>,
    entity_set: Option<String>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Query<E> {
    fn clone(&self) -> Self {
        Self {
            options: self.options.clone(),
            expands: self.expands.clone(),
            entity_set: self.entity_set.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> std::fmt::Debug for Query<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("options", &self.options)
            .field("expands", &self.expands)
            .field("entity_set", &self.entity_set)
            .finish()
    }
}

impl<E> Default for Query<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Query<E> {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self {
            options: QueryOptions::default(),
            expands: Vec::new(),
            entity_set: None,
            _entity: PhantomData,
        }
    }

    /// Overrides the entity set name derived from the entity type.
    pub fn entity_set(mut self, name: impl Into<String>) -> Self {
        self.entity_set = Some(name.into());
        self
    }

    /// Restricts the returned fields.
    ///
    /// Only a [`Projection::Pick`] of plain fields is accepted.
    pub fn select(mut self, projection: impl Into<Projection>) -> Result<Self, QueryError> {
        let fields = projection.into().field_names()?;
        self.options.set(options::SELECT, fields.join(","));
        Ok(self)
    }

    /// Sets the filter, replacing any previous one.
    ///
    /// Translations are cached by predicate identity, so a predicate reused
    /// across queries (by cloning it) is translated once.
    pub fn filter(mut self, predicate: Predicate<E>) -> Result<Self, QueryError> {
        let filter = TranslationCache::shared().get_or_translate(predicate.shared())?;
        self.options.set(options::FILTER, filter);
        Ok(self)
    }

    /// Sets the filter from a raw expression tree, bypassing the cache.
    pub fn filter_expr(mut self, expr: &Expr) -> Result<Self, QueryError> {
        let filter = translate(expr)?;
        self.options.set(options::FILTER, filter);
        Ok(self)
    }

    /// Expands a navigation field without nested options.
    pub fn expand<T>(mut self, navigation: Field<E, T>) -> Self {
        self.expands.push(navigation.name().wire_name().to_string());
        self
    }

    /// Expands a single-valued navigation field with nested options.
    ///
    /// # Example
    ///
    /// ```ignore
    /// Query::<SalesOrder>::new()
    ///     .expand_with(SalesOrder::CUSTOMER, |c| {
    ///         c.select(Projection::pick([Customer::NAME]))
    ///     })?;
    /// // $expand=customer($select=displayName)
    /// ```
    pub fn expand_with<R, F>(self, navigation: Field<E, R>, configure: F) -> Result<Self, QueryError>
    where
        F: FnOnce(Query<R>) -> Result<Query<R>, QueryError>,
    {
        self.push_nested_expand(navigation.name(), configure)
    }

    /// Expands a collection-valued navigation field with nested options.
    pub fn expand_many_with<R, F>(
        self,
        navigation: Field<E, Vec<R>>,
        configure: F,
    ) -> Result<Self, QueryError>
    where
        F: FnOnce(Query<R>) -> Result<Query<R>, QueryError>,
    {
        self.push_nested_expand(navigation.name(), configure)
    }

    fn push_nested_expand<R, F>(mut self, navigation: FieldName, configure: F) -> Result<Self, QueryError>
    where
        F: FnOnce(Query<R>) -> Result<Query<R>, QueryError>,
    {
        let nested = configure(Query::new())?.render_nested();
        let clause = if nested.is_empty() {
            navigation.wire_name().to_string()
        } else {
            format!("{}({})", navigation.wire_name(), nested)
        };
        self.expands.push(clause);
        Ok(self)
    }

    /// Sets the primary ascending ordering, replacing any previous ordering.
    pub fn order_by<T>(self, field: Field<E, T>) -> Self {
        self.set_order(field.name(), Direction::Asc)
    }

    /// Sets the primary descending ordering, replacing any previous ordering.
    pub fn order_by_descending<T>(self, field: Field<E, T>) -> Self {
        self.set_order(field.name(), Direction::Desc)
    }

    /// Appends an ascending ordering.
    ///
    /// Fails if no primary ordering has been set.
    pub fn then_by<T>(self, field: Field<E, T>) -> Result<Self, QueryError> {
        self.append_order(field.name(), Direction::Asc)
    }

    /// Appends a descending ordering.
    ///
    /// Fails if no primary ordering has been set.
    pub fn then_by_descending<T>(self, field: Field<E, T>) -> Result<Self, QueryError> {
        self.append_order(field.name(), Direction::Desc)
    }

    fn set_order(mut self, field: FieldName, direction: Direction) -> Self {
        self.options
            .set(options::ORDER_BY, direction.term(field.wire_name()));
        self
    }

    fn append_order(mut self, field: FieldName, direction: Direction) -> Result<Self, QueryError> {
        let existing = self.options.get(options::ORDER_BY).ok_or_else(|| {
            QueryError::MissingPrimaryOrder {
                field: field.wire_name().to_string(),
            }
        })?;
        let combined = format!("{},{}", existing, direction.term(field.wire_name()));
        self.options.set(options::ORDER_BY, combined);
        Ok(self)
    }

    /// Limits the number of records returned.
    ///
    /// Zero or negative clears the option.
    pub fn top(mut self, n: i64) -> Self {
        if n > 0 {
            self.options.set(options::TOP, n.to_string());
        } else {
            self.options.remove(options::TOP);
        }
        self
    }

    /// Skips leading records.
    ///
    /// Zero or negative clears the option.
    pub fn skip(mut self, n: i64) -> Self {
        if n > 0 {
            self.options.set(options::SKIP, n.to_string());
        } else {
            self.options.remove(options::SKIP);
        }
        self
    }

    /// Requests (or stops requesting) the total count of matching records.
    pub fn count(mut self, enabled: bool) -> Self {
        if enabled {
            self.options.set(options::COUNT, "true");
        } else {
            self.options.remove(options::COUNT);
        }
        self
    }

    /// Sets the `$apply` transformation built by `configure`.
    ///
    /// An aggregation with neither group-by fields nor aggregates clears
    /// the option.
    ///
    /// # Example
    ///
    /// ```ignore
    /// Query::<SalesLine>::new().apply(|a| {
    ///     a.group_by([SalesLine::ITEM])?
    ///         .aggregate(SalesLine::AMOUNT, AggregateOp::Sum, "total")
    /// })?;
    /// // $apply=groupby((itemId),aggregate(amount with sum as total))
    /// ```
    pub fn apply<F>(mut self, configure: F) -> Result<Self, QueryError>
    where
        F: FnOnce(Aggregation<E>) -> Result<Aggregation<E>, QueryError>,
    {
        let rendered = configure(Aggregation::new())?.render();
        if rendered.is_empty() {
            self.options.remove(options::APPLY);
        } else {
            self.options.set(options::APPLY, rendered);
        }
        Ok(self)
    }

    /// Returns the raw (unencoded) value of an option.
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name)
    }

    /// Returns the expand clauses in the order they were added.
    pub fn expands(&self) -> &[String] {
        &self.expands
    }

    /// Drops client-side paging options.
    pub(crate) fn clear_paging(&mut self) {
        self.options.remove(options::TOP);
        self.options.remove(options::SKIP);
    }

    /// Iterates options with the expand list merged in last.
    fn merged_options(&self) -> impl Iterator<Item = (&'static str, String)> + '_ {
        let expand = (!self.expands.is_empty()).then(|| (options::EXPAND, self.expands.join(",")));
        self.options
            .iter()
            .map(|(name, value)| (name, value.to_string()))
            .chain(expand)
    }

    /// Renders the percent-encoded query string, without a leading `?`.
    pub fn to_query_string(&self) -> String {
        self.merged_options()
            .map(|(name, value)| format!("{}={}", name, urlencoding::encode(&value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Renders options for embedding inside an `$expand` clause.
    ///
    /// Values are left unencoded and separated by `;`; the enclosing
    /// `$expand` value is encoded once as a whole.
    fn render_nested(&self) -> String {
        self.merged_options()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(";")
    }
}

impl<E: Entity> Query<E> {
    /// Returns the entity set this query targets.
    pub fn resolved_entity_set(&self) -> String {
        self.entity_set
            .clone()
            .unwrap_or_else(E::entity_set_name)
    }
}
