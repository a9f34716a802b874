//! Response sinks the renderer writes into.
//!
//! A sink behaves like an HTTP response writer: headers can be set until the head is
//! committed, and the first body write commits `200 OK` implicitly. Once committed,
//! the status can no longer change, which is why an emission error that happens
//! halfway through a page cannot turn into a clean 500.

use std::io;

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use hyper::body::Frame;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::{
  body::GraphiQLBody,
  responder::Responder,
  types::{BoxError, Response},
};

/// Destination of a rendered response.
pub trait ResponseSink: io::Write + Send {
  /// Headers sent with the head. Changes after commit are ignored.
  fn headers_mut(&mut self) -> &mut HeaderMap;

  /// Commits the head with `status`. Later calls are ignored.
  fn write_head(&mut self, status: StatusCode);

  /// Whether the head has been committed.
  fn is_committed(&self) -> bool;
}

/// Collects the whole response in memory.
#[derive(Debug, Default)]
pub struct BufferedSink {
  status: Option<StatusCode>,
  headers: HeaderMap,
  body: Vec<u8>,
}

impl BufferedSink {
  pub fn new() -> Self {
    Self::default()
  }

  /// Committed status, `200 OK` if nothing was written yet.
  pub fn status(&self) -> StatusCode {
    self.status.unwrap_or(StatusCode::OK)
  }

  pub fn headers(&self) -> &HeaderMap {
    &self.headers
  }

  pub fn body(&self) -> &[u8] {
    &self.body
  }

  pub fn into_response(self) -> Response {
    let mut res = Response::new(GraphiQLBody::from(self.body));
    *res.status_mut() = self.status.unwrap_or(StatusCode::OK);
    *res.headers_mut() = self.headers;
    res
  }
}

impl ResponseSink for BufferedSink {
  fn headers_mut(&mut self) -> &mut HeaderMap {
    &mut self.headers
  }

  fn write_head(&mut self, status: StatusCode) {
    if self.status.is_some() {
      tracing::debug!(%status, "ignoring write_head on committed response");
      return;
    }
    self.status = Some(status);
  }

  fn is_committed(&self) -> bool {
    self.status.is_some()
  }
}

impl io::Write for BufferedSink {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    if self.status.is_none() {
      self.status = Some(StatusCode::OK);
    }
    self.body.extend_from_slice(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

type Head = (StatusCode, HeaderMap);
type BodyFrame = Result<Frame<Bytes>, BoxError>;

/// Forwards every write to a streaming response body as it happens.
///
/// Created with [`StreamingSink::channel`]; the paired [`PendingResponse`] resolves
/// to the response as soon as the head is committed.
pub struct StreamingSink {
  head: Option<oneshot::Sender<Head>>,
  headers: HeaderMap,
  frames: mpsc::UnboundedSender<BodyFrame>,
}

/// The receiving half of a [`StreamingSink`].
pub struct PendingResponse {
  head: oneshot::Receiver<Head>,
  frames: mpsc::UnboundedReceiver<BodyFrame>,
}

impl StreamingSink {
  pub fn channel() -> (StreamingSink, PendingResponse) {
    let (head_tx, head_rx) = oneshot::channel();
    let (frames_tx, frames_rx) = mpsc::unbounded_channel();
    (
      StreamingSink {
        head: Some(head_tx),
        headers: HeaderMap::new(),
        frames: frames_tx,
      },
      PendingResponse {
        head: head_rx,
        frames: frames_rx,
      },
    )
  }

  /// Terminates the body with an error. The client sees a truncated response.
  pub fn abort(&mut self, err: impl Into<BoxError>) {
    self.write_head(StatusCode::OK);
    let _ = self.frames.send(Err(err.into()));
  }
}

impl ResponseSink for StreamingSink {
  fn headers_mut(&mut self) -> &mut HeaderMap {
    &mut self.headers
  }

  fn write_head(&mut self, status: StatusCode) {
    match self.head.take() {
      Some(head) => {
        let _ = head.send((status, std::mem::take(&mut self.headers)));
      }
      None => tracing::debug!(%status, "ignoring write_head on committed response"),
    }
  }

  fn is_committed(&self) -> bool {
    self.head.is_none()
  }
}

impl io::Write for StreamingSink {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    if !self.is_committed() {
      self.write_head(StatusCode::OK);
    }
    if buf.is_empty() {
      return Ok(0);
    }
    self
      .frames
      .send(Ok(Frame::data(Bytes::copy_from_slice(buf))))
      .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "response body receiver dropped"))?;
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

impl PendingResponse {
  /// Waits for the head and returns a response streaming the remaining body.
  ///
  /// A sink dropped without committing, e.g. because the render task panicked,
  /// yields a plain-text `500`.
  pub async fn into_response(self) -> Response {
    let Ok((status, headers)) = self.head.await else {
      tracing::error!("GraphiQL render task ended without a response");
      return (StatusCode::INTERNAL_SERVER_ERROR, "GraphiQL render task failed").into_response();
    };

    let body = GraphiQLBody::from_stream(UnboundedReceiverStream::new(self.frames));
    let mut res = Response::new(body);
    *res.status_mut() = status;
    *res.headers_mut() = headers;
    res
  }
}
