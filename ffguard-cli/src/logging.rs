// ============================================================================
// ffguard-cli/src/logging.rs
// ============================================================================
//
// LOGGING: env_logger Setup for the CLI
//
// The core library logs through the `log` facade; this module installs
// `env_logger` as the backend. Records go to stderr with a local timestamp
// and a colored level tag, leaving stdout for command results.
//
// USAGE:
// - default: info and above
// - --verbose: debug and above (every ffmpeg/ffprobe command is logged)
// - RUST_LOG: overrides both, e.g. RUST_LOG=ffguard_core=trace

// ---- External crate imports ----
use console::style;
use log::LevelFilter;

// ---- Standard library imports ----
use std::io::Write;

/// Level used when RUST_LOG is not set.
pub fn default_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

fn styled_level(level: log::Level) -> console::StyledObject<&'static str> {
    let styled = match level {
        log::Level::Error => style("ERROR").red().bold(),
        log::Level::Warn => style("WARN").yellow(),
        log::Level::Info => style("INFO").cyan(),
        log::Level::Debug => style("DEBUG").magenta(),
        log::Level::Trace => style("TRACE").blue(),
    };
    styled.for_stderr()
}

/// Installs the global logger. Calling it twice keeps the first logger.
pub fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(default_level(verbose))
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:>5} {}",
                style(chrono::Local::now().format("%H:%M:%S")).for_stderr().dim(),
                styled_level(record.level()),
                record.args()
            )
        });

    if builder.try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level() {
        assert_eq!(default_level(false), LevelFilter::Info);
        assert_eq!(default_level(true), LevelFilter::Debug);
    }
}
