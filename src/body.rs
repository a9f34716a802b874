//! This module provides the `GraphiQLBody` struct, a wrapper around a boxed HTTP body.
//! It is used for both incoming requests and outgoing responses, so the resolver and
//! the renderer can be driven by hyper in production and by plain strings in tests.
use std::{
  pin::Pin,
  task::{Context, Poll},
};

use bytes::Bytes;
use futures_util::Stream;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::{Body, Frame, SizeHint};

use crate::types::{BoxBody, BoxError};

/// Boxed HTTP body shared by requests and responses.
///
/// # Example
///
/// ```rust
/// use graphiql_handler::body::GraphiQLBody;
///
/// let empty_body = GraphiQLBody::empty();
/// let string_body = GraphiQLBody::from("Hello, world!".to_string());
/// ```
pub struct GraphiQLBody(BoxBody);

impl GraphiQLBody {
  /// Creates a new `GraphiQLBody` from any body producing `Bytes`.
  pub fn new<B>(body: B) -> Self
  where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
  {
    Self(body.map_err(|e| e.into()).boxed_unsync())
  }

  /// Creates an empty `GraphiQLBody`.
  pub fn empty() -> Self {
    Self::new(Empty::new())
  }

  /// Creates a body that yields frames as the stream produces them.
  ///
  /// An `Err` item terminates the body with an error, which makes hyper abort
  /// the connection instead of finishing the response cleanly.
  pub fn from_stream<S>(stream: S) -> Self
  where
    S: Stream<Item = Result<Frame<Bytes>, BoxError>> + Send + 'static,
  {
    Self::new(StreamBody::new(stream))
  }
}

macro_rules! body_from_impl {
  ($ty:ty) => {
    impl From<$ty> for GraphiQLBody {
      fn from(buf: $ty) -> Self {
        Self::new(Full::from(buf))
      }
    }
  };
}

body_from_impl!(String);
body_from_impl!(&'static str);
body_from_impl!(Vec<u8>);

impl Body for GraphiQLBody {
  type Data = Bytes;
  type Error = BoxError;

  #[inline]
  fn poll_frame(
    mut self: Pin<&mut Self>,
    cx: &mut Context<'_>,
  ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
    Pin::new(&mut self.0).poll_frame(cx)
  }

  #[inline]
  fn size_hint(&self) -> SizeHint {
    self.0.size_hint()
  }

  #[inline]
  fn is_end_stream(&self) -> bool {
    self.0.is_end_stream()
  }
}
