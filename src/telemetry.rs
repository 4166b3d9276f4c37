use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::ObservabilityConfig;

/// Initialize structured logging on stderr.
///
/// `RUST_LOG` takes precedence over the configured level. Stdout stays free
/// for the human-readable progress output of the commands.
pub fn init_telemetry(observability: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&observability.log_level))?;

    if observability.json_logs {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .try_init()?;
    }

    tracing::debug!("stepf-deploy telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking the log lines of one deployment
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create a span with the attributes of one deployment
pub fn create_deployment_span(
    statemachine: &str,
    stage: Option<&str>,
    region: Option<&str>,
    correlation_id: &str,
) -> tracing::Span {
    tracing::info_span!(
        "deployment",
        statemachine = statemachine,
        stage = stage,
        region = region,
        correlation.id = correlation_id,
    )
}
