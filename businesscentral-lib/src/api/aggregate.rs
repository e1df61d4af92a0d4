//! `$apply` aggregation builder.
//!
//! Composes group-by and aggregate transformations into a single `$apply`
//! value. Used through [`Query::apply`](crate::api::query::Query::apply).
//!
//! # Example
//!
//! ```ignore
//! let query = Query::<SalesLine>::new().apply(|a| {
//!     a.group_by([SalesLine::ITEM_NO])?
//!         .aggregate(SalesLine::AMOUNT, AggregateOp::Sum, "total")?
//!         .count("lines")
//! })?;
//! // $apply=groupby((itemNo),aggregate(amount with sum as total,$count as lines))
//! ```

use std::marker::PhantomData;

use crate::api::query::Expr;
use crate::error::QueryError;
use crate::model::Field;

/// The aggregation operator applied to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    /// Sum of numeric values.
    Sum,
    /// Average of numeric values.
    Average,
    /// Minimum value.
    Min,
    /// Maximum value.
    Max,
    /// Count of distinct values.
    CountDistinct,
}

impl AggregateOp {
    fn keyword(self) -> &'static str {
        match self {
            AggregateOp::Sum => "sum",
            AggregateOp::Average => "average",
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
            AggregateOp::CountDistinct => "countdistinct",
        }
    }
}

/// Group-by fields and aggregate terms for one entity type.
pub struct Aggregation<E> {
    group_by: Vec<String>,
    aggregates: Vec<String>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> std::fmt::Debug for Aggregation<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregation")
            .field("group_by", &self.group_by)
            .field("aggregates", &self.aggregates)
            .finish()
    }
}

impl<E> Default for Aggregation<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Aggregation<E> {
    /// Creates an empty aggregation.
    pub fn new() -> Self {
        Self {
            group_by: Vec::new(),
            aggregates: Vec::new(),
            _entity: PhantomData,
        }
    }

    /// Adds group-by fields.
    ///
    /// Accepts fields or member expressions; coercion wrappers are looked
    /// through. Duplicates are ignored and first-seen order is kept.
    pub fn group_by<I>(mut self, fields: I) -> Result<Self, QueryError>
    where
        I: IntoIterator,
        I::Item: Into<Expr>,
    {
        for field in fields {
            let name = field_path(&field.into())?;
            if !self.group_by.contains(&name) {
                self.group_by.push(name);
            }
        }
        Ok(self)
    }

    /// Appends `field with op as alias`.
    pub fn aggregate<T>(
        mut self,
        field: Field<E, T>,
        op: AggregateOp,
        alias: &str,
    ) -> Result<Self, QueryError> {
        let alias = validate_alias(alias)?;
        self.aggregates.push(format!(
            "{} with {} as {}",
            field.name().wire_name(),
            op.keyword(),
            alias
        ));
        Ok(self)
    }

    /// Appends `$count as alias`.
    pub fn count(mut self, alias: &str) -> Result<Self, QueryError> {
        let alias = validate_alias(alias)?;
        self.aggregates.push(format!("$count as {}", alias));
        Ok(self)
    }

    /// Renders the `$apply` value; empty when nothing was added.
    pub(crate) fn render(&self) -> String {
        let aggregate = format!("aggregate({})", self.aggregates.join(","));
        match (self.group_by.is_empty(), self.aggregates.is_empty()) {
            (false, false) => format!("groupby(({}),{})", self.group_by.join(","), aggregate),
            (false, true) => format!("groupby(({}))", self.group_by.join(",")),
            (true, false) => aggregate,
            (true, true) => String::new(),
        }
    }
}

fn field_path(expr: &Expr) -> Result<String, QueryError> {
    match expr.unwrap_convert() {
        Expr::Member(path) => Ok(path.wire_path()),
        other => Err(QueryError::InvalidAggregationField(other.describe())),
    }
}

fn validate_alias(alias: &str) -> Result<&str, QueryError> {
    let valid = alias
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && alias.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(alias)
    } else {
        Err(QueryError::InvalidAggregationField(format!(
            "alias '{}' is not an identifier",
            alias
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Line;

    impl Line {
        const ITEM: Field<Line, String> = Field::renamed("item", "itemNo");
        const REGION: Field<Line, String> = Field::new("region");
        const QUANTITY: Field<Line, i32> = Field::new("quantity");
        const AMOUNT: Field<Line, f64> = Field::new("amount");
    }

    #[test]
    fn test_group_by_with_aggregates() {
        let agg = Aggregation::<Line>::new()
            .group_by([Line::ITEM, Line::REGION])
            .unwrap()
            .aggregate(Line::AMOUNT, AggregateOp::Sum, "total")
            .unwrap()
            .aggregate(Line::QUANTITY, AggregateOp::Max, "peak")
            .unwrap();
        assert_eq!(
            agg.render(),
            "groupby((itemNo,region),aggregate(amount with sum as total,quantity with max as peak))"
        );
    }

    #[test]
    fn test_aggregates_only() {
        let agg = Aggregation::<Line>::new()
            .aggregate(Line::AMOUNT, AggregateOp::Average, "avg")
            .unwrap()
            .count("n")
            .unwrap();
        assert_eq!(agg.render(), "aggregate(amount with average as avg,$count as n)");
    }

    #[test]
    fn test_group_by_only() {
        let agg = Aggregation::<Line>::new().group_by([Line::REGION]).unwrap();
        assert_eq!(agg.render(), "groupby((region))");
    }

    #[test]
    fn test_empty_renders_nothing() {
        assert_eq!(Aggregation::<Line>::new().render(), "");
    }

    #[test]
    fn test_group_by_deduplicates_and_unwraps_convert() {
        let agg = Aggregation::<Line>::new()
            .group_by([
                Line::REGION.member(),
                Line::QUANTITY.member().convert(),
                Line::REGION.member(),
            ])
            .unwrap();
        assert_eq!(agg.render(), "groupby((region,quantity))");
    }

    #[test]
    fn test_group_by_rejects_non_member() {
        let err = Aggregation::<Line>::new()
            .group_by([Expr::literal("region")])
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidAggregationField(_)));
    }

    #[test]
    fn test_alias_must_be_identifier() {
        let err = Aggregation::<Line>::new()
            .aggregate(Line::AMOUNT, AggregateOp::Sum, "grand total")
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidAggregationField(_)));

        assert!(Aggregation::<Line>::new().count("").is_err());
    }
}
