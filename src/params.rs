//! GraphQL request parameters and their resolution from HTTP requests.
//!
//! Parameters are taken from the query string when it carries a `query`, otherwise
//! from the body of a POST request according to its content type:
//! - `application/graphql`: the body is the request string
//! - `application/x-www-form-urlencoded`: `query`, `variables`, `operationName` fields
//! - anything else: a JSON object `{ "query", "variables", "operationName" }`

use http::{Method, StatusCode, header};
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::{
  extractors::FromRequest,
  responder::Responder,
  types::{Request, Response},
};

/// A GraphQL request: text, variables and the operation to run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestParams {
  /// The query, mutation or subscription text. May be empty.
  #[serde(rename = "query", default)]
  pub request_string: String,
  /// Variable values keyed by name, in the order they were supplied.
  #[serde(rename = "variables", default)]
  pub variable_values: Option<Map<String, Value>>,
  /// Selects the operation to run when the document has several.
  #[serde(default)]
  pub operation_name: Option<String>,
}

impl RequestParams {
  pub fn new(request_string: impl Into<String>) -> Self {
    Self {
      request_string: request_string.into(),
      ..Default::default()
    }
  }

  pub fn variables(mut self, variables: Map<String, Value>) -> Self {
    self.variable_values = Some(variables);
    self
  }

  pub fn operation_name(mut self, name: impl Into<String>) -> Self {
    self.operation_name = Some(name.into());
    self
  }
}

/// Errors that can occur while resolving GraphQL parameters from a request.
#[derive(Debug)]
pub enum ParamsError {
  /// The request body could not be read.
  BodyRead(String),
  /// An `application/graphql` body is not UTF-8.
  InvalidBody(String),
  InvalidJson(String),
  InvalidVariables(String),
}

impl std::fmt::Display for ParamsError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ParamsError::BodyRead(e) => write!(f, "Failed to read body: {e}"),
      ParamsError::InvalidBody(e) => write!(f, "Invalid body: {e}"),
      ParamsError::InvalidJson(e) => write!(f, "Invalid JSON: {e}"),
      ParamsError::InvalidVariables(e) => write!(f, "Invalid variables: {e}"),
    }
  }
}

impl std::error::Error for ParamsError {}

impl Responder for ParamsError {
  fn into_response(self) -> Response {
    (StatusCode::BAD_REQUEST, self).into_response()
  }
}

/// Wire shape of a JSON request body.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct JsonParams {
  #[serde(default)]
  query: Option<String>,
  #[serde(default)]
  variables: Option<Value>,
  #[serde(default)]
  operation_name: Option<String>,
}

impl<'a> FromRequest<'a> for RequestParams {
  type Error = ParamsError;

  fn from_request(
    req: &'a mut Request,
  ) -> impl core::future::Future<Output = core::result::Result<Self, Self::Error>> + Send + 'a {
    async move {
      // Query-string variables are only decoded once the query string is chosen.
      let from_query = req
        .uri()
        .query()
        .map(|qs| FormFields::parse(qs.as_bytes()))
        .filter(|fields| fields.query.as_deref().is_some_and(|q| !q.is_empty()));
      if let Some(fields) = from_query {
        return fields.into_params();
      }

      if req.method() != Method::POST {
        return Ok(RequestParams::default());
      }

      let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(media_type)
        .unwrap_or_default();

      let body = req
        .body_mut()
        .collect()
        .await
        .map_err(|e| ParamsError::BodyRead(e.to_string()))?
        .to_bytes();

      match content_type.as_str() {
        "application/graphql" => {
          let query =
            String::from_utf8(body.to_vec()).map_err(|e| ParamsError::InvalidBody(e.to_string()))?;
          Ok(RequestParams::new(query))
        }
        "application/x-www-form-urlencoded" => FormFields::parse(&body).into_params(),
        _ => from_json(&body),
      }
    }
  }
}

/// Lowercased media type without parameters, e.g. `application/json`.
fn media_type(content_type: &str) -> String {
  content_type
    .split(';')
    .next()
    .unwrap_or_default()
    .trim()
    .to_ascii_lowercase()
}

/// Raw `application/x-www-form-urlencoded` fields, before variables are decoded.
///
/// The first occurrence of a key wins.
#[derive(Default)]
struct FormFields {
  query: Option<String>,
  variables: Option<String>,
  operation_name: Option<String>,
}

impl FormFields {
  fn parse(input: &[u8]) -> Self {
    let mut fields = Self::default();
    for (key, value) in form_urlencoded::parse(input) {
      let slot = match key.as_ref() {
        "query" => &mut fields.query,
        "variables" => &mut fields.variables,
        "operationName" => &mut fields.operation_name,
        _ => continue,
      };
      if slot.is_none() {
        *slot = Some(value.into_owned());
      }
    }
    fields
  }

  fn into_params(self) -> Result<RequestParams, ParamsError> {
    Ok(RequestParams {
      request_string: self.query.unwrap_or_default(),
      variable_values: decode_variables(self.variables.map(Value::String))?,
      operation_name: self.operation_name,
    })
  }
}

fn from_json(body: &[u8]) -> Result<RequestParams, ParamsError> {
  if body.iter().all(u8::is_ascii_whitespace) {
    return Ok(RequestParams::default());
  }

  let raw: JsonParams =
    serde_json::from_slice(body).map_err(|e| ParamsError::InvalidJson(e.to_string()))?;

  Ok(RequestParams {
    request_string: raw.query.unwrap_or_default(),
    variable_values: decode_variables(raw.variables)?,
    operation_name: raw.operation_name,
  })
}

/// Normalizes the `variables` field.
///
/// Accepts an object or a JSON-encoded object. `null` and blank strings mean no
/// variables.
fn decode_variables(value: Option<Value>) -> Result<Option<Map<String, Value>>, ParamsError> {
  match value {
    None | Some(Value::Null) => Ok(None),
    Some(Value::Object(map)) => Ok(Some(map)),
    Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
    Some(Value::String(text)) => {
      match serde_json::from_str(&text).map_err(|e| ParamsError::InvalidVariables(e.to_string()))? {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        other => Err(not_an_object(&other)),
      }
    }
    Some(other) => Err(not_an_object(&other)),
  }
}

fn not_an_object(value: &Value) -> ParamsError {
  let kind = match value {
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Null | Value::Object(_) => "not an object",
  };
  ParamsError::InvalidVariables(format!("expected a JSON object, found {kind}"))
}
