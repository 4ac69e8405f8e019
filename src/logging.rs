use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "CERTSTAMP_LOG";
const DEFAULT_DIRECTIVE: &str = "info";

/// Installs the fmt subscriber. Filter directives come from `CERTSTAMP_LOG`; calling this again
/// once a subscriber exists is a no-op.
pub fn init() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_does_not_panic() {
        init();
        init();
        tracing::info!("logging initialised");
    }
}
