//! Typed query construction.
//!
//! - [`Query`] - accumulates `$filter`, `$select`, `$orderby`, `$expand`,
//!   `$apply`, `$top`, `$skip` and `$count` for one entity type
//! - [`Predicate`] / [`Expr`] - predicate expression trees
//! - [`translate`] - renders a predicate tree to the filter grammar
//! - [`Projection`] - `$select` shapes

mod builder;
mod expr;
mod options;
mod order;
mod projection;
mod translate;

pub use builder::Query;
pub use expr::ComparisonOp;
pub use expr::Expr;
pub use expr::LogicalOp;
pub use expr::Predicate;
pub use expr::StringFunction;
pub use options::QueryOptions;
pub use order::Direction;
pub use projection::Projection;
pub use translate::TranslationCache;
pub use translate::escape_string;
pub use translate::literal;
pub use translate::translate;
