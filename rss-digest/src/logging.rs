use tracing::Level;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Default level: warnings only, unless debugging was asked for.
fn default_level(debug: bool) -> Level {
    if debug {
        Level::DEBUG
    } else {
        Level::WARN
    }
}

/// `RUST_LOG` directives when set, the default level otherwise. `--debug`
/// still raises the global level over whatever `RUST_LOG` names.
fn env_filter(debug: bool, rust_log: Option<&str>) -> EnvFilter {
    let configured = rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok());

    match configured {
        Some(filter) if debug => filter.add_directive(Level::DEBUG.into()),
        Some(filter) => filter,
        None => EnvFilter::default().add_directive(default_level(debug).into()),
    }
}

/// Logging setup for the command-line tool. Logs go to stderr so output
/// written to stdout or files stays clean.
pub fn init(debug: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(debug),
        )
        .with(env_filter(debug, rust_log.as_deref()))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_default_level() {
        assert_eq!(default_level(true), Level::DEBUG);
        assert_eq!(default_level(false), Level::WARN);
    }

    #[test]
    fn test_rust_log_is_honoured() {
        assert_eq!(env_filter(false, Some("debug")).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(
            env_filter(false, Some("rss_digest=trace")).max_level_hint(),
            Some(LevelFilter::TRACE)
        );
    }

    #[test]
    fn test_unset_rust_log_uses_default() {
        assert_eq!(env_filter(false, None).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(env_filter(false, Some("  ")).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(env_filter(true, None).max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_debug_raises_rust_log_level() {
        assert_eq!(env_filter(true, Some("error")).max_level_hint(), Some(LevelFilter::DEBUG));
    }
}
