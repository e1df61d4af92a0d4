//! `$select` projections.

use crate::error::QueryError;
use crate::model::FieldName;

use super::expr::Expr;

/// The shape handed to [`Query::select`](super::Query::select).
///
/// Only [`Projection::Pick`] of plain member accesses is a valid `$select`.
/// Any other shape is rejected at build time.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// A structural pick of named fields, `{ a, b, c }`.
    Pick(Vec<Expr>),
    /// A single expression.
    Single(Expr),
}

impl Projection {
    /// Picks the given fields.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let query = Query::<Customer>::new()
    ///     .select(Projection::pick([Customer::NUMBER, Customer::NAME]))?;
    /// ```
    pub fn pick<F: Into<FieldName>>(fields: impl IntoIterator<Item = F>) -> Self {
        Projection::Pick(
            fields
                .into_iter()
                .map(|f| Expr::member(f.into()))
                .collect(),
        )
    }

    /// Resolves the projection to wire field names.
    pub(crate) fn field_names(&self) -> Result<Vec<String>, QueryError> {
        let items = match self {
            Projection::Pick(items) => items,
            Projection::Single(expr) => {
                return Err(QueryError::InvalidProjection(format!(
                    "expected a pick of named fields, found {}",
                    expr.describe()
                )));
            }
        };

        if items.is_empty() {
            return Err(QueryError::InvalidProjection(
                "pick contains no fields".to_string(),
            ));
        }

        items
            .iter()
            .map(|item| match item {
                Expr::Member(path) if path.segments().len() == 1 => Ok(path.wire_path()),
                other => Err(QueryError::InvalidProjection(format!(
                    "pick members must be plain fields, found {}",
                    other.describe()
                ))),
            })
            .collect()
    }
}

impl From<Expr> for Projection {
    fn from(expr: Expr) -> Self {
        Projection::Single(expr)
    }
}
