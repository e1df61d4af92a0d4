//! Query construction errors

/// A malformed query or predicate shape.
///
/// Raised synchronously while building a query, before any network call.
/// Never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// `select` was given something other than a pick of named fields.
    #[error("Invalid projection: {0}")]
    InvalidProjection(String),

    /// A secondary ordering was added before any primary ordering.
    #[error("Cannot add secondary ordering on '{field}' without a prior order_by")]
    MissingPrimaryOrder { field: String },

    /// The left side of a comparison is not a field or function call.
    #[error("Unsupported comparison operand: {0}")]
    UnsupportedOperand(String),

    /// A method call other than the supported string functions.
    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    /// A literal whose type has no filter representation.
    #[error("Unsupported literal value: {0}")]
    UnsupportedLiteral(String),

    /// A membership test whose set is not a literal collection.
    #[error("Invalid membership set: {0}")]
    InvalidMembershipSet(String),

    /// A node that cannot appear where it was found.
    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),

    /// A group-by or aggregate reference that is not a field.
    #[error("Invalid aggregation field: {0}")]
    InvalidAggregationField(String),
}
