use std::{
  io::Write,
  sync::{Arc, Mutex},
};

use graphiql_handler::{
  body::GraphiQLBody,
  executor::{Executor, GraphQLResponse},
  graphiql::{GraphiQL, GraphiQLError, page_data, render_graphiql},
  handler::{GraphQLHandler, HandlerConfig},
  params::RequestParams,
  sink::{BufferedSink, ResponseSink},
  template::{GRAPHIQL_VERSION, PageTemplate},
  types::Request,
};
use http::{StatusCode, header};
use http_body_util::BodyExt;
use serde::Serialize;
use serde_json::{Value, json};

/// Records every request it executes and answers `{ __typename }`.
#[derive(Default, Clone)]
struct Recorder {
  seen: Arc<Mutex<Vec<RequestParams>>>,
}

impl Recorder {
  fn calls(&self) -> Vec<RequestParams> {
    self.seen.lock().unwrap().clone()
  }
}

#[async_trait::async_trait]
impl Executor for Recorder {
  type Output = GraphQLResponse;

  async fn execute(&self, params: &RequestParams) -> GraphQLResponse {
    self.seen.lock().unwrap().push(params.clone());
    GraphQLResponse::data(json!({ "__typename": "Query" }))
  }
}

fn html(sink: &BufferedSink) -> String {
  String::from_utf8(sink.body().to_vec()).unwrap()
}

async fn body_string(res: http::Response<GraphiQLBody>) -> String {
  let bytes = res.into_body().collect().await.unwrap().to_bytes();
  String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str, accept: &str) -> Request {
  hyper::Request::builder()
    .uri(uri)
    .header(header::ACCEPT, accept)
    .body(GraphiQLBody::empty())
    .unwrap()
}

#[tokio::test]
async fn blank_editor_for_empty_request() {
  let executor = Recorder::default();
  let params = RequestParams::new("")
    .variables(serde_json::Map::new())
    .operation_name("");

  let data = page_data(&params, &executor).await.unwrap();
  assert_eq!(data.result_text, "");
  assert_eq!(data.variables_text, "");

  let mut sink = BufferedSink::new();
  render_graphiql(&mut sink, &params, &executor).await.unwrap();

  assert_eq!(sink.status(), StatusCode::OK);
  assert_eq!(sink.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");
  assert!(executor.calls().is_empty());

  let page = html(&sink);
  assert!(page.contains("<div id=\"graphiql\">Loading...</div>"));
  assert!(!page.contains("id=\"graphiql-result\""));
  assert!(!page.contains("id=\"graphiql-variables\""));
  assert!(!page.contains("null"));
}

#[tokio::test]
async fn executes_exactly_once_with_the_given_params() {
  let executor = Recorder::default();
  let variables = json!({ "id": "1", "first": 10 }).as_object().cloned().unwrap();
  let params = RequestParams::new("query Q($id: ID) { node(id: $id) { id } }")
    .variables(variables)
    .operation_name("Q");

  let mut sink = BufferedSink::new();
  render_graphiql(&mut sink, &params, &executor).await.unwrap();

  assert_eq!(executor.calls(), vec![params]);
}

#[tokio::test]
async fn result_is_two_space_pretty_json() {
  let executor = |_: RequestParams| async { json!({ "data": { "__typename": "Query" } }) };
  let data = page_data(&RequestParams::new("{ __typename }"), &executor)
    .await
    .unwrap();

  let expected =
    serde_json::to_string_pretty(&json!({ "data": { "__typename": "Query" } })).unwrap();
  assert_eq!(data.result_text, expected);
  assert!(data.result_text.starts_with("{\n  \"data\": {\n    \""));
}

#[tokio::test]
async fn variables_text_round_trips() {
  let variables = json!({ "a": 1, "b": "x" }).as_object().cloned().unwrap();
  let params = RequestParams::new("{ a }").variables(variables.clone());
  let data = page_data(&params, &Recorder::default()).await.unwrap();

  let parsed: Value = serde_json::from_str(&data.variables_text).unwrap();
  assert_eq!(parsed, Value::Object(variables));
}

#[tokio::test]
async fn echoed_request_text_is_escaped() {
  let payload = "</script><script>alert(1)</script>";
  let params = RequestParams::new(payload).operation_name(payload);

  let mut sink = BufferedSink::new();
  render_graphiql(&mut sink, &params, &Recorder::default())
    .await
    .unwrap();

  let page = html(&sink);
  assert!(!page.contains(payload));
  assert!(page.contains("&lt;/script&gt;&lt;script&gt;alert(1)&lt;/script&gt;"));
}

#[tokio::test]
async fn page_loads_the_versioned_bundle() {
  let mut sink = BufferedSink::new();
  render_graphiql(&mut sink, &RequestParams::default(), &Recorder::default())
    .await
    .unwrap();

  let page = html(&sink);
  assert!(page.contains(&format!(
    "https://unpkg.com/graphiql@{GRAPHIQL_VERSION}/graphiql.min.js"
  )));
  assert!(page.contains("GraphiQL.createFetcher"));
  assert!(page.contains("window.location.origin + window.location.pathname"));
}

#[tokio::test]
async fn graphql_errors_render_as_data() {
  let executor = |_: RequestParams| async { GraphQLResponse::error("Cannot query field \"nope\"") };
  let page = GraphiQL::render(&RequestParams::new("{ nope }"), &executor).await;

  assert_eq!(page.status(), StatusCode::OK);
  let page = String::from_utf8(page.body().to_vec()).unwrap();
  assert!(page.contains("id=\"graphiql-result\""));
  assert!(page.contains("Cannot query field"));
}

struct NotJson;

impl Serialize for NotJson {
  fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
    Err(serde::ser::Error::custom("unsupported value in result"))
  }
}

#[tokio::test]
async fn unserializable_result_is_500_without_html() {
  let executor = |_: RequestParams| async { NotJson };
  let mut sink = BufferedSink::new();
  let err = render_graphiql(&mut sink, &RequestParams::new("{ a }"), &executor)
    .await
    .unwrap_err();

  assert!(matches!(err, GraphiQLError::Result(_)));
  assert_eq!(sink.status(), StatusCode::INTERNAL_SERVER_ERROR);
  let body = html(&sink);
  assert_eq!(body, "unsupported value in result");
  assert!(!body.contains("<html"));
}

/// Fails every write after the first `limit` bytes, like a connection reset.
struct ResetAfter {
  inner: BufferedSink,
  limit: usize,
}

impl std::io::Write for ResetAfter {
  fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
    let room = self.limit.saturating_sub(self.inner.body().len());
    if room == 0 {
      return Err(std::io::ErrorKind::ConnectionReset.into());
    }
    self.inner.write(&buf[..room.min(buf.len())])
  }

  fn flush(&mut self) -> std::io::Result<()> {
    Ok(())
  }
}

impl ResponseSink for ResetAfter {
  fn headers_mut(&mut self) -> &mut http::HeaderMap {
    self.inner.headers_mut()
  }

  fn write_head(&mut self, status: StatusCode) {
    self.inner.write_head(status)
  }

  fn is_committed(&self) -> bool {
    self.inner.is_committed()
  }
}

// Once the page has started streaming, its 200 head is gone; the failure only
// surfaces through the returned error, not as a 500.
#[tokio::test]
async fn emission_failure_mid_stream_is_reported_to_the_caller() {
  let mut sink = ResetAfter {
    inner: BufferedSink::new(),
    limit: 256,
  };
  let err = render_graphiql(&mut sink, &RequestParams::new("{ a }"), &Recorder::default())
    .await
    .unwrap_err();

  assert!(matches!(err, GraphiQLError::Emit(_)));
  assert_eq!(sink.inner.status(), StatusCode::OK);
  assert_eq!(sink.inner.body().len(), 256);
}

#[tokio::test]
async fn handler_serves_graphiql_to_browsers() {
  let executor = Recorder::default();
  let handler = GraphQLHandler::new(executor.clone());

  let res = handler
    .handle(get("/graphql?query=%7B%20__typename%20%7D", "text/html"))
    .await;
  assert_eq!(res.status(), StatusCode::OK);
  assert_eq!(res.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");

  let page = body_string(res).await;
  assert!(page.contains("<pre id=\"graphiql-query\">{ __typename }</pre>"));
  assert!(page.contains("&quot;__typename&quot;: &quot;Query&quot;"));
  assert_eq!(executor.calls().len(), 1);
}

#[tokio::test]
async fn handler_serves_json_to_api_clients() {
  let handler = GraphQLHandler::new(Recorder::default());

  let res = handler
    .handle(get("/graphql?query=%7B%20__typename%20%7D", "application/json"))
    .await;
  assert_eq!(res.status(), StatusCode::OK);
  assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");

  let body: Value = serde_json::from_str(&body_string(res).await).unwrap();
  assert_eq!(body, json!({ "data": { "__typename": "Query" } }));
}

#[tokio::test]
async fn raw_forces_json_and_pretty_is_honoured() {
  let handler = GraphQLHandler::with_config(
    Recorder::default(),
    HandlerConfig::default().pretty(true),
  );

  let res = handler
    .handle(get("/graphql?query=%7Ba%7D&raw", "text/html"))
    .await;
  assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");
  assert!(body_string(res).await.contains("\n  \"data\""));
}

#[tokio::test]
async fn disabled_graphiql_always_answers_json() {
  let handler = GraphQLHandler::with_config(
    Recorder::default(),
    HandlerConfig::default().graphiql(false),
  );

  let res = handler.handle(get("/graphql", "text/html")).await;
  assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");
}

#[tokio::test]
async fn handler_rejects_malformed_variables() {
  let executor = Recorder::default();
  let handler = GraphQLHandler::new(executor.clone());

  let res = handler
    .handle(get("/graphql?query=%7Ba%7D&variables=%5B1%5D", "text/html"))
    .await;
  assert_eq!(res.status(), StatusCode::BAD_REQUEST);
  assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn handler_streams_server_errors_before_commit() {
  let handler = GraphQLHandler::new(|_: RequestParams| async { NotJson });

  let res = handler.handle(get("/graphql?query=%7Ba%7D", "text/html")).await;
  assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(res.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");
  assert_eq!(body_string(res).await, "unsupported value in result");
}

#[tokio::test]
async fn handler_aborts_the_body_when_the_page_fails_mid_stream() {
  let handler = GraphQLHandler::new(Recorder::default())
    .template(PageTemplate::from_source("<html>{{queryText}}{{notAField}}</html>"));

  let res = handler.handle(get("/graphql?query=%7Ba%7D", "text/html")).await;
  assert_eq!(res.status(), StatusCode::OK);
  assert_eq!(res.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");
  assert!(res.into_body().collect().await.is_err());
}

struct Explodes;

#[async_trait::async_trait]
impl Executor for Explodes {
  type Output = GraphQLResponse;

  async fn execute(&self, _params: &RequestParams) -> GraphQLResponse {
    panic!("executor exploded");
  }
}

#[tokio::test]
async fn executor_panic_is_a_server_error() {
  let handler = GraphQLHandler::new(Explodes);

  let res = handler.handle(get("/graphql?query=%7Ba%7D", "text/html")).await;
  assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(res.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");
  assert_eq!(body_string(res).await, "GraphiQL render task failed");
}
