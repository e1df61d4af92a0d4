//! Authentication hook.
//!
//! Token acquisition is out of scope; the client only needs something that
//! can decorate a request. [`BearerAuth`] covers the common case of a
//! bearer token from a [`TokenProvider`].

mod decorator;
mod token;

pub use decorator::BearerAuth;
pub use decorator::NoDecoration;
pub use decorator::RequestDecorator;
pub use token::AccessToken;
pub use token::StaticTokenProvider;
pub use token::TokenProvider;
