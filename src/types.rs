use bytes::Bytes;
use http_body_util::combinators::UnsyncBoxBody;

use crate::body::GraphiQLBody;

pub type BoxBody = UnsyncBoxBody<Bytes, BoxError>;
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Request = hyper::Request<GraphiQLBody>;
pub type Response = hyper::Response<GraphiQLBody>;
