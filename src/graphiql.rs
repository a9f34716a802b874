//! GraphiQL page rendering.
//!
//! Rendering a page runs these steps in order, stopping at the first failure:
//! 1. fetch the parsed page template
//! 2. pretty-print the variables
//! 3. execute the request, unless the request string is empty
//! 4. assemble the [`PageData`]
//! 5. stream the template output into the response sink
//!
//! Any failure is answered with a `500` whose body is the error text. A failure in
//! step 5 can happen after the head was committed; the status then stays `200` and
//! the error is only reported to the caller.

use std::{
  fmt::{self, Display},
  sync::Arc,
};

use http::{HeaderValue, StatusCode, header};
use serde::Serialize;

use crate::{
  executor::Executor,
  params::RequestParams,
  responder::Responder,
  sink::{BufferedSink, ResponseSink},
  template::{GRAPHIQL_VERSION, PageTemplate, TEMPLATE_NAME},
  types::Response,
};

/// Values substituted into the page template.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
  pub ui_version: &'static str,
  pub query_text: String,
  /// Pretty-printed variables, or empty when there are none.
  pub variables_text: String,
  /// Pretty-printed execution result, or empty when nothing was executed.
  pub result_text: String,
  pub operation_name: String,
}

/// Failures while rendering the GraphiQL page.
#[derive(Debug)]
pub enum GraphiQLError {
  /// The page template did not parse.
  Template(Arc<handlebars::TemplateError>),
  /// The variables could not be serialized.
  Variables(serde_json::Error),
  /// The execution result could not be serialized.
  Result(serde_json::Error),
  /// Writing the page to the response failed.
  Emit(handlebars::RenderError),
}

impl Display for GraphiQLError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GraphiQLError::Template(e) => Display::fmt(e, f),
      GraphiQLError::Variables(e) => Display::fmt(e, f),
      GraphiQLError::Result(e) => Display::fmt(e, f),
      GraphiQLError::Emit(e) => Display::fmt(e, f),
    }
  }
}

impl std::error::Error for GraphiQLError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      GraphiQLError::Template(e) => Some(&**e),
      GraphiQLError::Variables(e) | GraphiQLError::Result(e) => Some(e),
      GraphiQLError::Emit(e) => Some(e),
    }
  }
}

impl Responder for GraphiQLError {
  fn into_response(self) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, self).into_response()
  }
}

/// Builds the page data for `params`, executing the request when there is one.
pub async fn page_data<E>(params: &RequestParams, executor: &E) -> Result<PageData, GraphiQLError>
where
  E: Executor + ?Sized,
{
  let variables_text = variables_text(params)?;

  let result_text = if params.request_string.is_empty() {
    tracing::debug!("empty request string, rendering a blank editor");
    String::new()
  } else {
    let result = executor.execute(params).await;
    serde_json::to_string_pretty(&result).map_err(GraphiQLError::Result)?
  };

  Ok(PageData {
    ui_version: GRAPHIQL_VERSION,
    query_text: params.request_string.clone(),
    variables_text,
    result_text,
    operation_name: params.operation_name.clone().unwrap_or_default(),
  })
}

/// Absent and empty variables both display as an empty string.
fn variables_text(params: &RequestParams) -> Result<String, GraphiQLError> {
  let shown = params.variable_values.as_ref().filter(|v| !v.is_empty());
  let text = serde_json::to_string_pretty(&shown).map_err(GraphiQLError::Variables)?;
  Ok(if text == "null" { String::new() } else { text })
}

/// Renders the GraphiQL page for `params` into `sink` using the built-in template.
///
/// The error, if any, has already been written to the sink when this returns.
pub async fn render_graphiql<S, E>(
  sink: &mut S,
  params: &RequestParams,
  executor: &E,
) -> Result<(), GraphiQLError>
where
  S: ResponseSink,
  E: Executor + ?Sized,
{
  render_graphiql_with(sink, params, executor, PageTemplate::builtin()).await
}

/// Like [`render_graphiql`], with a caller-provided template.
pub async fn render_graphiql_with<S, E>(
  sink: &mut S,
  params: &RequestParams,
  executor: &E,
  template: &PageTemplate,
) -> Result<(), GraphiQLError>
where
  S: ResponseSink,
  E: Executor + ?Sized,
{
  let rendered = render_page(sink, params, executor, template).await;
  if let Err(err) = &rendered {
    write_error(sink, err);
  }
  rendered
}

pub(crate) async fn render_page<S, E>(
  sink: &mut S,
  params: &RequestParams,
  executor: &E,
  template: &PageTemplate,
) -> Result<(), GraphiQLError>
where
  S: ResponseSink,
  E: Executor + ?Sized,
{
  let registry = template.registry()?;
  let data = page_data(params, executor).await?;

  sink.headers_mut().insert(
    header::CONTENT_TYPE,
    HeaderValue::from_static(mime::TEXT_HTML_UTF_8.as_ref()),
  );
  registry
    .render_to_write(TEMPLATE_NAME, &data, &mut *sink)
    .map_err(GraphiQLError::Emit)
}

/// Answers `err` with a plain-text 500, unless the head is already out.
pub(crate) fn write_error<S: ResponseSink>(sink: &mut S, err: &GraphiQLError) {
  if sink.is_committed() {
    tracing::warn!(error = %err, "GraphiQL page failed after the response was committed");
    return;
  }

  let headers = sink.headers_mut();
  headers.insert(
    header::CONTENT_TYPE,
    HeaderValue::from_static(mime::TEXT_PLAIN_UTF_8.as_ref()),
  );
  headers.insert(
    header::X_CONTENT_TYPE_OPTIONS,
    HeaderValue::from_static("nosniff"),
  );
  sink.write_head(StatusCode::INTERNAL_SERVER_ERROR);
  if let Err(io_err) = sink.write_all(err.to_string().as_bytes()) {
    tracing::warn!(error = %io_err, "failed to write GraphiQL error response");
  }
}

/// A fully rendered GraphiQL page (or its error response).
pub struct GraphiQL(BufferedSink);

impl GraphiQL {
  /// Renders the page into memory.
  pub async fn render<E>(params: &RequestParams, executor: &E) -> Self
  where
    E: Executor + ?Sized,
  {
    let mut sink = BufferedSink::new();
    // The error response is already in the sink.
    let _ = render_graphiql(&mut sink, params, executor).await;
    GraphiQL(sink)
  }

  pub fn status(&self) -> StatusCode {
    self.0.status()
  }

  pub fn body(&self) -> &[u8] {
    self.0.body()
  }
}

impl Responder for GraphiQL {
  fn into_response(self) -> Response {
    self.0.into_response()
  }
}
