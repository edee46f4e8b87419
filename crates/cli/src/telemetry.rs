//! Observability wiring.
//!
//! All `tracing` spans and events from every crate in the workspace go
//! through the subscriber installed here: an `EnvFilter` (`RUST_LOG`, default
//! `info`), a formatting layer on stderr, and, when
//! `OTEL_EXPORTER_OTLP_ENDPOINT` is set, an OpenTelemetry OTLP exporter.

use anyhow::Context;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::TracerProvider;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogFormat;

const SERVICE_NAME: &str = "git-lfs-locks";

/// Keeps the exporter alive until [`Telemetry::shutdown`].
pub struct Telemetry {
    provider: Option<TracerProvider>,
}

impl Telemetry {
    /// Flushes buffered spans.
    pub fn shutdown(self) {
        if let Some(provider) = self.provider {
            if let Err(err) = provider.shutdown() {
                eprintln!("failed to flush traces: {err}");
            }
        }
    }
}

fn otlp_provider() -> anyhow::Result<TracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()
        .context("cannot build OTLP span exporter")?;
    Ok(TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .build())
}

/// Installs the global subscriber.
pub fn init(format: LogFormat) -> anyhow::Result<Telemetry> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let provider = match std::env::var_os("OTEL_EXPORTER_OTLP_ENDPOINT") {
        Some(_) => Some(otlp_provider()?),
        None => None,
    };
    let otel = provider
        .as_ref()
        .map(|provider| tracing_opentelemetry::layer().with_tracer(provider.tracer(SERVICE_NAME)));

    let registry = tracing_subscriber::registry().with(filter).with(otel);
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init(),
    }
    .context("cannot install tracing subscriber")?;

    Ok(Telemetry { provider })
}
