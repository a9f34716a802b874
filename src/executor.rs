//! The GraphQL execution engine seam.
//!
//! The renderer never looks inside the engine: it hands over the full
//! [`RequestParams`] and serializes whatever comes back. GraphQL-level errors are
//! part of that output and render like any other result.

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::params::RequestParams;

/// Runs a GraphQL request and produces a serializable response.
///
/// Implemented for async closures taking the parameters by value:
///
/// ```rust
/// use graphiql_handler::executor::GraphQLResponse;
/// use graphiql_handler::params::RequestParams;
/// use serde_json::json;
///
/// let executor = |_params: RequestParams| async move {
///     GraphQLResponse::data(json!({ "__typename": "Query" }))
/// };
/// ```
#[async_trait::async_trait]
pub trait Executor: Send + Sync + 'static {
  /// The engine's response shape, typically `{ "data": ..., "errors": [...] }`.
  type Output: Serialize + Send;

  async fn execute(&self, params: &RequestParams) -> Self::Output;
}

#[async_trait::async_trait]
impl<F, Fut, R> Executor for F
where
  F: Fn(RequestParams) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = R> + Send + 'static,
  R: Serialize + Send + 'static,
{
  type Output = R;

  async fn execute(&self, params: &RequestParams) -> R {
    (self)(params.clone()).await
  }
}

/// Location of an error in the request document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorLocation {
  pub line: usize,
  pub column: usize,
}

/// A single GraphQL execution error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLErrorEntry {
  pub message: String,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub locations: Vec<ErrorLocation>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub path: Vec<Value>,
}

impl GraphQLErrorEntry {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      locations: Vec::new(),
      path: Vec::new(),
    }
  }
}

/// Standard GraphQL response envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQLResponse {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data: Option<Value>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub errors: Vec<GraphQLErrorEntry>,
}

impl GraphQLResponse {
  pub fn data(data: Value) -> Self {
    Self {
      data: Some(data),
      errors: Vec::new(),
    }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self {
      data: None,
      errors: vec![GraphQLErrorEntry::new(message)],
    }
  }
}

#[cfg(feature = "async-graphql")]
pub use self::async_graphql_support::AsyncGraphQL;

#[cfg(feature = "async-graphql")]
mod async_graphql_support {
  use async_graphql::{Request as GqlRequest, Response as GqlResponse, Variables};
  use serde_json::Value;

  use super::Executor;
  use crate::params::RequestParams;

  /// Adapts an `async_graphql` schema (or any of its executors) to [`Executor`].
  ///
  /// ```rust,ignore
  /// let schema = Schema::build(QueryRoot, EmptyMutation, EmptySubscription).finish();
  /// let handler = GraphQLHandler::new(AsyncGraphQL(schema));
  /// ```
  #[derive(Clone)]
  pub struct AsyncGraphQL<E>(pub E);

  #[async_trait::async_trait]
  impl<E> Executor for AsyncGraphQL<E>
  where
    E: async_graphql::Executor,
  {
    type Output = GqlResponse;

    async fn execute(&self, params: &RequestParams) -> GqlResponse {
      let mut request = GqlRequest::new(params.request_string.clone());
      if let Some(variables) = &params.variable_values {
        request = request.variables(Variables::from_json(Value::Object(variables.clone())));
      }
      if let Some(name) = params.operation_name.as_deref().filter(|n| !n.is_empty()) {
        request = request.operation_name(name);
      }
      self.0.execute(request).await
    }
  }
}
