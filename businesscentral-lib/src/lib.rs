//! Business Central API client library
//!
//! A typed, async query client for the Business Central OData API: build
//! queries from typed fields and predicates, then execute them with retry,
//! circuit breaking, pagination and JSON batching.

pub mod api;
pub mod auth;
pub mod error;
pub mod model;
pub mod response;
pub mod transport;

mod client;

pub use client::*;
pub use response::Envelope;
