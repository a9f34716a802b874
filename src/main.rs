use anyhow::Result;
use graphiql_handler::{
  executor::GraphQLResponse,
  handler::{GraphQLHandler, HandlerConfig},
  params::RequestParams,
};
use serde_json::json;
use tokio::net::TcpListener;

/// Answers `{ __typename }` and `{ hello }`; anything else is an error.
async fn execute(params: RequestParams) -> GraphQLResponse {
  let query = params.request_string.as_str();
  let mut data = serde_json::Map::new();

  if query.contains("__typename") {
    data.insert("__typename".into(), json!("Query"));
  }
  if query.contains("hello") {
    let name = params
      .variable_values
      .as_ref()
      .and_then(|vars| vars.get("name"))
      .and_then(|name| name.as_str())
      .unwrap_or("GraphQL");
    data.insert("hello".into(), json!(format!("Hello, {name}!")));
  }

  if data.is_empty() {
    GraphQLResponse::error("Cannot query this field on type \"Query\".")
  } else {
    GraphQLResponse::data(data.into())
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  #[cfg(feature = "tracing-init")]
  graphiql_handler::tracing::init_tracing(graphiql_handler::tracing::LevelFilter::DEBUG);

  let listener = TcpListener::bind("127.0.0.1:8080").await?;
  let handler = GraphQLHandler::with_config(execute, HandlerConfig::default().pretty(true));

  println!("GraphiQL: http://127.0.0.1:8080/graphql?query=%7B%20hello%20%7D");

  graphiql_handler::serve(listener, handler)
    .await
    .map_err(|e| anyhow::anyhow!(e))?;
  Ok(())
}
