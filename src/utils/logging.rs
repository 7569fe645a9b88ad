use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Diagnostics go to stderr so stdout stays clean for JSON/CSV.
///
/// `RUST_LOG` wins over `--debug` when set.
pub(crate) fn init_logging(debug: bool) {
    let default_level = if debug { LevelFilter::DEBUG } else { LevelFilter::WARN };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    // try_init: a second call (tests) must not panic
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
