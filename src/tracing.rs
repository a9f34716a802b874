//! Tracing subscriber setup for binaries embedding the handler.

use tracing_subscriber::{
  Layer, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
};

pub use tracing::level_filters::LevelFilter;

/// Installs a global `fmt` subscriber printing events at `level` and above.
pub fn init_tracing(level: LevelFilter) {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::fmt::layer()
        .with_span_events(FmtSpan::CLOSE)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .with_filter(level),
    )
    .init();
}
