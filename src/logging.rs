use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::VerbosityLevel;

/// Filter used when `RUST_LOG` is not set
pub fn default_directive(verbosity: VerbosityLevel) -> &'static str {
    match verbosity {
        VerbosityLevel::Quiet => "webspace_config=warn",
        VerbosityLevel::Normal => "webspace_config=info",
        VerbosityLevel::Verbose => "webspace_config=debug,info",
    }
}

/// Install the global subscriber, writing compact lines to stderr.
///
/// Calling it again after a subscriber is installed does nothing.
pub fn init_cli_logger(verbosity: VerbosityLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}
