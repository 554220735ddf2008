//! Utils to enable [::tracing].

use std::panic::Location;

use nameth::NamedEnumValues as _;
use nameth::nameth;
use tracing::debug;
use tracing::level_filters::LevelFilter;
use tracing::subscriber::SetGlobalDefaultError;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "debug,tower=info,h2=info,hyper=info,hyper_util=info,\
    aws_config=info,aws_smithy_runtime=info,aws_smithy_runtime_api=info,rustls=info";

/// Enables tracing and registers a [panic hook](std::panic::set_hook).
///
/// The `RUST_LOG` environment variable overrides the default filter.
pub fn enable_tracing() -> Result<(), EnableTracingError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_file(cfg!(debug_assertions))
        .with_line_number(cfg!(debug_assertions))
        .with_target(false)
        .with_max_level(LevelFilter::DEBUG)
        .with_env_filter(env_filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    debug!("Tracing enabled");

    std::panic::set_hook(Box::new(|panic_info| {
        let panic_payload: Option<&str> =
            if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
                Some(s)
            } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
                Some(s.as_str())
            } else {
                None
            };
        let location = panic_info
            .location()
            .map(Location::to_string)
            .unwrap_or_else(|| "???".into());
        match panic_payload {
            Some(panic_payload) => warn!("Panic: {panic_payload} at {location}"),
            None => warn!("Panic at {location}"),
        }
    }));
    Ok(())
}

/// Errors thrown by [enable_tracing] when trying to enable tracing multiple times.
#[nameth]
#[derive(thiserror::Error, Debug)]
pub enum EnableTracingError {
    #[error("[{n}] {0}", n = self.name())]
    SetGlobalDefault(#[from] SetGlobalDefaultError),
}

#[cfg(debug_assertions)]
pub mod test_utils {
    use std::sync::Once;

    pub fn enable_tracing_for_tests() {
        static ONCE: Once = Once::new();
        ONCE.call_once(|| {
            if let Err(error) = super::enable_tracing() {
                println!("Tracing not enabled: {error}");
            }
        });
    }
}
