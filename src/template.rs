//! The GraphiQL page shell.
//!
//! The page is a handlebars template compiled into the binary and parsed once per
//! process. Every `{{field}}` substitution is HTML-escaped, so request text echoed into
//! the page can never close a tag or open a script.

use std::sync::Arc;

use handlebars::{Handlebars, TemplateError};
use once_cell::sync::Lazy;

use crate::graphiql::GraphiQLError;

/// Version of the GraphiQL bundle loaded by the page.
pub const GRAPHIQL_VERSION: &str = "3.2.0";

/// Source of the built-in page template.
pub const GRAPHIQL_TEMPLATE: &str = include_str!("../templates/graphiql.hbs");

pub(crate) const TEMPLATE_NAME: &str = "index";

static BUILTIN: Lazy<PageTemplate> = Lazy::new(|| PageTemplate::from_source(GRAPHIQL_TEMPLATE));

/// A parsed page template, or the error that parsing it produced.
///
/// A template that fails to parse is kept around so that every request rendering
/// it reports the failure, instead of the process refusing to start.
pub struct PageTemplate {
  registry: Result<Handlebars<'static>, Arc<TemplateError>>,
}

impl PageTemplate {
  /// The template shipped with this crate.
  pub fn builtin() -> &'static PageTemplate {
    &BUILTIN
  }

  /// Parses `source` as the page template.
  ///
  /// Rendering runs in strict mode: referring to a field the page data does not
  /// have is an error rather than an empty string.
  pub fn from_source(source: &str) -> Self {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    let registry = registry
      .register_template_string(TEMPLATE_NAME, source)
      .map(|()| registry)
      .map_err(Arc::new);
    Self { registry }
  }

  pub fn is_valid(&self) -> bool {
    self.registry.is_ok()
  }

  pub(crate) fn registry(&self) -> Result<&Handlebars<'static>, GraphiQLError> {
    self
      .registry
      .as_ref()
      .map_err(|err| GraphiQLError::Template(err.clone()))
  }
}

impl std::fmt::Debug for PageTemplate {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PageTemplate")
      .field("valid", &self.is_valid())
      .finish()
  }
}
