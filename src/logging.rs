//! Tracing subscriber setup.

use crate::config::{LogFormat, Settings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn default_filter(settings: &Settings) -> EnvFilter {
    let directives = if settings.env.is_dev() {
        "quotation_backend=debug,tower_http=debug,info"
    } else {
        "quotation_backend=info,tower_http=info,warn"
    };
    EnvFilter::new(directives)
}

pub fn init_logging(settings: &Settings) {
    // RUST_LOG wins over the environment defaults
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(settings));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(settings.env.is_dev())
        .with_line_number(settings.env.is_dev());

    let registry = tracing_subscriber::registry().with(filter);
    match settings.log_format {
        LogFormat::Json => registry.with(fmt_layer.json()).init(),
        LogFormat::Compact => registry.with(fmt_layer.compact()).init(),
        LogFormat::Pretty => registry.with(fmt_layer.pretty()).init(),
    }

    tracing::info!(env = ?settings.env, format = ?settings.log_format, "Logging initialized");
}
