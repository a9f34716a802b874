//! Request data extraction.
//!
//! `FromRequest` is implemented by types that need the full request, including the
//! body. The GraphQL parameter resolver in [`crate::params`] is built on it.
//!
//! # Examples
//!
//! ```rust
//! use graphiql_handler::extractors::FromRequest;
//! use graphiql_handler::params::RequestParams;
//! use graphiql_handler::types::Request;
//!
//! async fn handle(mut req: Request) {
//!     let params = RequestParams::from_request(&mut req).await;
//! }
//! ```

/// Trait for extracting data from complete HTTP requests.
pub trait FromRequest<'a>: Sized {
  /// Error type returned when extraction fails.
  ///
  /// The error must implement `Responder` so a failed extraction can be answered
  /// directly.
  type Error: crate::responder::Responder;

  /// Extracts the type from the HTTP request.
  fn from_request(
    req: &'a mut crate::types::Request,
  ) -> impl core::future::Future<Output = core::result::Result<Self, Self::Error>> + Send + 'a;
}
