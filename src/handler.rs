//! Content-negotiating GraphQL endpoint.
//!
//! Browsers asking for `text/html` get the GraphiQL page, pre-populated with the
//! result of the request in the URL. Everyone else gets the JSON result. Adding
//! `raw` to the query string forces JSON.

use std::sync::Arc;

use http::{HeaderValue, StatusCode, header};
use serde::Deserialize;

use crate::{
  body::GraphiQLBody,
  executor::Executor,
  extractors::FromRequest,
  graphiql::{render_page, write_error},
  params::RequestParams,
  responder::Responder,
  sink::{ResponseSink, StreamingSink},
  template::PageTemplate,
  types::{Request, Response},
};

/// Handler settings.
///
/// ```rust
/// use graphiql_handler::handler::HandlerConfig;
///
/// let config = HandlerConfig::default().graphiql(false).pretty(true);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandlerConfig {
  /// Serve GraphiQL to clients that accept HTML. Enabled by default.
  #[serde(default = "default_graphiql")]
  pub graphiql: bool,
  /// Pretty-print JSON responses.
  #[serde(default)]
  pub pretty: bool,
}

fn default_graphiql() -> bool {
  true
}

impl Default for HandlerConfig {
  fn default() -> Self {
    Self {
      graphiql: default_graphiql(),
      pretty: false,
    }
  }
}

impl HandlerConfig {
  pub fn graphiql(mut self, enabled: bool) -> Self {
    self.graphiql = enabled;
    self
  }

  pub fn pretty(mut self, enabled: bool) -> Self {
    self.pretty = enabled;
    self
  }
}

/// A GraphQL endpoint around an [`Executor`].
pub struct GraphQLHandler<E> {
  executor: Arc<E>,
  config: HandlerConfig,
  /// Page template; `None` uses [`PageTemplate::builtin`].
  template: Option<Arc<PageTemplate>>,
}

impl<E> Clone for GraphQLHandler<E> {
  fn clone(&self) -> Self {
    Self {
      executor: self.executor.clone(),
      config: self.config.clone(),
      template: self.template.clone(),
    }
  }
}

impl<E> GraphQLHandler<E>
where
  E: Executor,
{
  pub fn new(executor: E) -> Self {
    Self::with_config(executor, HandlerConfig::default())
  }

  pub fn with_config(executor: E, config: HandlerConfig) -> Self {
    Self {
      executor: Arc::new(executor),
      config,
      template: None,
    }
  }

  /// Renders GraphiQL pages with `template` instead of the built-in one.
  pub fn template(mut self, template: PageTemplate) -> Self {
    self.template = Some(Arc::new(template));
    self
  }

  pub async fn handle(&self, mut req: Request) -> Response {
    let params = match RequestParams::from_request(&mut req).await {
      Ok(params) => params,
      Err(err) => return err.into_response(),
    };

    if self.config.graphiql && wants_graphiql(&req) {
      return self.graphiql(params).await;
    }

    let result = self.executor.execute(&params).await;
    let encoded = if self.config.pretty {
      serde_json::to_vec_pretty(&result)
    } else {
      serde_json::to_vec(&result)
    };

    match encoded {
      Ok(buf) => {
        let mut res = Response::new(GraphiQLBody::from(buf));
        res.headers_mut().insert(
          header::CONTENT_TYPE,
          HeaderValue::from_static(mime::APPLICATION_JSON.as_ref()),
        );
        res
      }
      Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
  }

  /// Streams the GraphiQL page while it renders.
  async fn graphiql(&self, params: RequestParams) -> Response {
    let (mut sink, pending) = StreamingSink::channel();
    let executor = self.executor.clone();
    let template = self.template.clone();

    tokio::spawn(async move {
      let template = template.as_deref().unwrap_or_else(|| PageTemplate::builtin());
      if let Err(err) = render_page(&mut sink, &params, &*executor, template).await {
        if sink.is_committed() {
          tracing::warn!(error = %err, "GraphiQL page failed mid-stream");
          sink.abort(err);
        } else {
          write_error(&mut sink, &err);
        }
      }
    });

    pending.into_response().await
  }
}

/// Whether the client asked for HTML and did not opt out with `raw`.
fn wants_graphiql(req: &Request) -> bool {
  let raw = req
    .uri()
    .query()
    .map(|qs| url::form_urlencoded::parse(qs.as_bytes()).any(|(key, _)| key == "raw"))
    .unwrap_or(false);
  if raw {
    return false;
  }

  let accept = req
    .headers()
    .get_all(header::ACCEPT)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .collect::<Vec<_>>()
    .join(",");

  !accept.contains(mime::APPLICATION_JSON.as_ref()) && accept.contains(mime::TEXT_HTML.as_ref())
}
