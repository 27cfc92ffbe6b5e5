//! Tracing Subscriber Initialization
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and either a
//! plain or a JSON fmt layer. Hosts call `init_tracing` once at startup;
//! later calls are no-ops.

use ice_ipc::{ApiError, ApiResult};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "ice_api=debug,info";

static INITIALIZED: OnceCell<()> = OnceCell::new();

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    /// Filter directives used when `RUST_LOG` is absent
    pub default_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            json: false,
            default_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Read `ICE_LOG_FORMAT` (`json` or anything else for plain).
    pub fn from_env() -> Self {
        let json = std::env::var("ICE_LOG_FORMAT")
            .map(|s| s.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        Self {
            json,
            ..Self::default()
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Idempotent: once a subscriber has been installed by this function,
/// further calls return `Ok(())` without touching it.
pub fn init_tracing(config: &TelemetryConfig) -> ApiResult<()> {
    INITIALIZED.get_or_try_init(|| install(config)).map(|_| ())
}

fn install(config: &TelemetryConfig) -> ApiResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let json_layer = config.json.then(|| fmt::layer().json());
    let plain_layer = (!config.json).then(fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(plain_layer)
        .try_init()
        .map_err(|e| ApiError::internal(format!("Failed to init subscriber: {}", e)))?;

    tracing::info!(json = config.json, "Telemetry initialized");
    Ok(())
}
