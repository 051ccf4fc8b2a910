use crate::Environment;
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Default filter when `RUST_LOG` is not set.
fn default_filter(environment: &Environment) -> EnvFilter {
    if environment.is_production() {
        EnvFilter::new("info,tower_http=warn,mongodb=warn")
    } else {
        EnvFilter::new("debug,hyper=info,mongodb=info,reqwest=info")
    }
}

/// Install color-eyre with the project configuration.
///
/// Call this first in `main()` so that startup failures are rendered with
/// their location. Safe to call multiple times.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Initialize the global subscriber.
///
/// - **Production** (`APP_ENV=production`): flattened JSON lines without
///   module targets.
/// - **Development** (default): pretty, human readable output.
///
/// Both include `tracing_error::ErrorLayer` so eyre reports carry span traces.
/// `RUST_LOG` overrides the default filter. Calling this more than once is a
/// no-op, which keeps tests that share a process quiet.
pub fn init_tracing(environment: &Environment) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(environment));

    let result = if environment.is_production() {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .flatten_event(true),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false)
                    .pretty(),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    };

    match result {
        Ok(_) => info!(?environment, "Tracing initialized"),
        Err(_) => debug!("Tracing already initialized, skipping re-initialization"),
    }
}
