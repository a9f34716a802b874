//! Minimal HTTP/1.1 host for a [`GraphQLHandler`].
//!
//! Every path is served by the handler; routing is left to real host applications.
//!
//! # Examples
//!
//! ```rust,no_run
//! use graphiql_handler::{executor::GraphQLResponse, handler::GraphQLHandler, params::RequestParams, serve};
//! use serde_json::json;
//! use tokio::net::TcpListener;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let listener = TcpListener::bind("127.0.0.1:8080").await?;
//! let handler = GraphQLHandler::new(|_: RequestParams| async {
//!     GraphQLResponse::data(json!({ "__typename": "Query" }))
//! });
//! serve(listener, handler).await?;
//! # Ok(())
//! # }
//! ```

use std::convert::Infallible;

use hyper::{Request, body::Incoming, server::conn::http1, service::service_fn};
use tokio::net::TcpListener;

use crate::{body::GraphiQLBody, executor::Executor, handler::GraphQLHandler, types::BoxError};

/// Accepts connections forever, serving each one on its own task.
pub async fn serve<E>(listener: TcpListener, handler: GraphQLHandler<E>) -> Result<(), BoxError>
where
  E: Executor,
{
  tracing::info!("GraphQL listening on {}", listener.local_addr()?);

  loop {
    let (stream, addr) = listener.accept().await?;
    let io = hyper_util::rt::TokioIo::new(stream);
    let handler = handler.clone();

    tokio::spawn(async move {
      let svc = service_fn(move |req: Request<Incoming>| {
        let handler = handler.clone();
        async move { Ok::<_, Infallible>(handler.handle(req.map(GraphiQLBody::new)).await) }
      });

      let mut http = http1::Builder::new();
      http.keep_alive(true);

      if let Err(err) = http.serve_connection(io, svc).await {
        tracing::debug!(%addr, error = %err, "error serving connection");
      }
    });
  }
}
