use anyhow::Result;
use prometheus::Registry;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;
use crate::metrics;

const DEFAULT_FILTER: &str = "api=debug,pipeline=debug,tower_http=debug";

pub struct Observability {
    pub registry: Registry,
}

impl Observability {
    pub fn init(format: LogFormat) -> Result<Self> {
        let registry = metrics_registry()?;

        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
        let subscriber = tracing_subscriber::registry().with(env_filter);

        match format {
            LogFormat::Json => subscriber.with(tracing_subscriber::fmt::layer().json()).init(),
            LogFormat::Pretty => subscriber.with(tracing_subscriber::fmt::layer()).init(),
        }

        tracing::info!(?format, "Observability stack initialized (Prometheus + tracing)");
        Ok(Self { registry })
    }
}

/// A prefixed registry holding every metric family of the server
pub fn metrics_registry() -> prometheus::Result<Registry> {
    let registry = Registry::new_custom(Some("dispatch".into()), None)?;
    metrics::register_all(&registry)?;
    Ok(registry)
}
