//! API operations

mod aggregate;
mod batch;
mod pages;
pub mod query;
pub(crate) mod uri;

pub use aggregate::AggregateOp;
pub use aggregate::Aggregation;
pub use batch::Batch;
pub use batch::BatchRequestItem;
pub use batch::BatchResponse;
pub use batch::SubResponse;
pub use pages::Pages;
pub use uri::DefaultUriBuilder;
pub use uri::UriBuilder;
pub use uri::UriContext;
