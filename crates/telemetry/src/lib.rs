//! Logging and tracing bootstrap.

use catalog_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` overrides the configured filter.
///
/// Returns `false` when a subscriber was already installed, which is not an error.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<bool> {
    let filter = build_filter(settings)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match settings.log_format {
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init(),
    }
    .is_ok();

    if installed {
        tracing::info!(
            target: "catalog-telemetry",
            format = ?settings.log_format,
            "telemetry initialized"
        );
    }
    Ok(installed)
}

fn build_filter(settings: &TelemetrySettings) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&settings.filter)
            .map_err(|e| anyhow::anyhow!("invalid log filter '{}': {}", settings.filter, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_harmless() {
        let settings = TelemetrySettings::default();
        init(&settings).unwrap();
        assert!(!init(&settings).unwrap());
    }

    #[test]
    fn bad_filter_is_reported() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let settings = TelemetrySettings {
            filter: "catalog=loudest".to_string(),
            ..TelemetrySettings::default()
        };
        assert!(build_filter(&settings).is_err());
    }
}
