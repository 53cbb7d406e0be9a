use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber.
///
/// `SIGNOFF_LOG` takes `EnvFilter` syntax (e.g. `signoff=debug`). Without
/// it only warnings are shown, or debug output for `--verbose`.
pub fn init(verbose: bool) {
    let fallback = if verbose { "signoff=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("SIGNOFF_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
