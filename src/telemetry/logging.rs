use tracing_subscriber::{fmt, EnvFilter};

/// Initialize tracing with an optional level override; `RUST_LOG` still wins
/// when set.
pub fn init_tracing(level: Option<&str>) {
    let env = level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env));
    fmt().with_env_filter(filter).with_target(false).init();
}
