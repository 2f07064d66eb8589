use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Logs go to stderr so that `--json` output on stdout stays machine readable.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| InfraError::Telemetry(err.to_string()))
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "narrative_collection_load_total",
            Unit::Count,
            "Total number of post collection loads started, labelled by scope."
        );
        describe_counter!(
            "narrative_collection_superseded_total",
            Unit::Count,
            "Total number of collection responses discarded because a newer load was issued."
        );
        describe_counter!(
            "narrative_collection_failed_total",
            Unit::Count,
            "Total number of collection loads that failed at the backend."
        );
        describe_counter!(
            "narrative_store_write_total",
            Unit::Count,
            "Total number of story store documents persisted to disk."
        );
        describe_counter!(
            "narrative_upload_total",
            Unit::Count,
            "Total number of images written to upload storage."
        );
    });
}
