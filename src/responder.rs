//! Conversion of handler outputs into HTTP responses.
//!
//! Every value returned to the host server goes through `Responder`: rendered pages,
//! JSON execution results and the plain-text error bodies of failed requests.
//!
//! # Examples
//!
//! ```rust
//! use graphiql_handler::responder::Responder;
//! use http::StatusCode;
//!
//! let response = "Hello, World!".into_response();
//! let response = (StatusCode::INTERNAL_SERVER_ERROR, "template error").into_response();
//! ```

use std::fmt::Display;

use hyper::{StatusCode, header, header::HeaderValue};

use crate::{body::GraphiQLBody, types::Response};

/// Trait for converting types into HTTP responses.
pub trait Responder {
  /// Converts the implementing type into an HTTP response.
  fn into_response(self) -> Response;
}

impl Responder for &'static str {
  fn into_response(self) -> Response {
    Response::new(GraphiQLBody::from(self))
  }
}

impl Responder for String {
  fn into_response(self) -> Response {
    Response::new(GraphiQLBody::from(self))
  }
}

/// A status code with a plain-text body.
impl<R> Responder for (StatusCode, R)
where
  R: Display,
{
  fn into_response(self) -> Response {
    let (status, body) = self;
    let mut res = Response::new(GraphiQLBody::from(body.to_string()));
    *res.status_mut() = status;
    res.headers_mut().insert(
      header::CONTENT_TYPE,
      HeaderValue::from_static(mime::TEXT_PLAIN_UTF_8.as_ref()),
    );
    res
  }
}
