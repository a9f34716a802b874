//! GraphiQL page rendering for GraphQL endpoints.
//!
//! [`graphiql::render_graphiql`] turns a GraphQL request into the GraphiQL page,
//! pre-populated with the request's result. [`handler::GraphQLHandler`] puts it behind
//! content negotiation, answering JSON clients with the plain result.

pub mod body;
pub mod executor;
pub mod extractors;
pub mod graphiql;
pub mod handler;
pub mod params;
pub mod responder;
pub mod server;
pub mod sink;
pub mod template;
pub mod types;

#[cfg(feature = "tracing-init")]
pub mod tracing;

pub use server::serve;
