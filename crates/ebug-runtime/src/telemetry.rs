//! Log and span output for the firmware.
//!
//! [`init_tracing`] installs one global subscriber: an `EnvFilter`, a console
//! formatter and, when a collector is configured, an OTLP span exporter.
//!
//! | Variable | Effect |
//! |---|---|
//! | `RUST_LOG` | Filter directives, `info` when unset. |
//! | `EBUG_LOG_FORMAT` | `json` or `compact`; wins over the configured [`LogFormat`]. |
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | Collector base URL. Spans are exported over OTLP/HTTP when set. |
//!
//! ```rust,no_run
//! use ebug_runtime::telemetry::{LogFormat, init_tracing};
//!
//! let _tracing = init_tracing("ebug", LogFormat::Compact);
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Console log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    /// The format named by `EBUG_LOG_FORMAT`, or `self` when it is unset or
    /// unrecognised.
    pub fn with_env_override(self) -> Self {
        match std::env::var("EBUG_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => self,
        }
    }

    fn console_layer(self) -> Box<dyn Layer<Registry> + Send + Sync> {
        match self {
            LogFormat::Compact => tracing_subscriber::fmt::layer().compact().boxed(),
            LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        }
    }
}

/// Install the global subscriber. Only the first call in a process takes
/// effect; later calls return a guard with nothing to flush.
///
/// Keep the returned guard alive until exit so buffered spans reach the
/// collector.
pub fn init_tracing(service_name: &str, format: LogFormat) -> TracingGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let provider = otlp_provider(service_name);
    let otel = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer("ebug")));

    let installed = tracing_subscriber::registry()
        .with(format.with_env_override().console_layer())
        .with(otel)
        .with(filter)
        .try_init();

    match installed {
        Ok(()) => TracingGuard { provider },
        Err(_) => {
            tracing::debug!(service = service_name, "tracing already initialised");
            if let Some(unused) = provider {
                let _ = unused.shutdown();
            }
            TracingGuard { provider: None }
        }
    }
}

/// Shuts the span exporter down on drop.
pub struct TracingGuard {
    provider: Option<SdkTracerProvider>,
}

impl TracingGuard {
    /// `true` when spans are being exported.
    pub fn is_exporting(&self) -> bool {
        self.provider.is_some()
    }
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        let Some(provider) = self.provider.take() else {
            return;
        };
        if let Err(e) = provider.shutdown() {
            eprintln!("[ebug] span exporter shutdown failed: {e}");
        }
    }
}

/// `None` unless `OTEL_EXPORTER_OTLP_ENDPOINT` is set and the exporter builds.
fn otlp_provider(service_name: &str) -> Option<SdkTracerProvider> {
    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok()?;
    let exporter = match opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
    {
        Ok(exporter) => exporter,
        Err(e) => {
            eprintln!("[ebug] OTLP exporter unavailable: {e}");
            return None;
        }
    };
    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();
    // Control loops run on plain threads, so spans are exported inline.
    Some(
        SdkTracerProvider::builder()
            .with_resource(resource)
            .with_simple_exporter(exporter)
            .build(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_endpoint_means_no_exporter() {
        // SAFETY: no test sets this variable.
        unsafe { std::env::remove_var("OTEL_EXPORTER_OTLP_ENDPOINT") };
        assert!(otlp_provider("ebug-test").is_none());
    }

    #[test]
    fn repeated_init_is_harmless() {
        let first = init_tracing("ebug-test", LogFormat::Compact);
        let second = init_tracing("ebug-test", LogFormat::Json);
        assert!(!second.is_exporting());
        drop(first);
    }

    #[test]
    fn idle_guard_drops_quietly() {
        let guard = TracingGuard { provider: None };
        assert!(!guard.is_exporting());
        drop(guard);
    }
}
