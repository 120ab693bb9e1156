//! Stderr logging for the CLI.
//!
//! Log lines never share stdout with command output, so `--format json`
//! stays machine-parseable under a pipe. The `--log-level` flag scopes the
//! battlink crates; everything else stays at warn. A non-empty `RUST_LOG`
//! overrides the flag entirely.

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Filter directives applied when `RUST_LOG` is unset: the chosen level
/// for the battlink crates, warn for third-party targets.
fn default_directives(level: LogLevel) -> String {
    let level = level.directive();
    format!(
        "warn,battlink={level},battlink_client={level},battlink_emulator={level},\
         battlink_frame={level},battlink_transport={level}"
    )
}

fn build_filter(level: LogLevel) -> EnvFilter {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(raw) if !raw.trim().is_empty() => EnvFilter::new(raw),
        _ => EnvFilter::new(default_directives(level)),
    }
}

pub fn init_logging(format: LogFormat, level: LogLevel) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(build_filter(level))
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_scope_battlink_crates() {
        let directives = default_directives(LogLevel::Debug);
        assert!(directives.starts_with("warn,"));
        assert!(directives.contains("battlink=debug"));
        assert!(directives.contains("battlink_frame=debug"));
        assert!(directives.contains("battlink_transport=debug"));
    }

    #[test]
    fn each_level_maps_to_its_directive() {
        assert_eq!(LogLevel::Error.directive(), "error");
        assert_eq!(LogLevel::Trace.directive(), "trace");
        assert!(default_directives(LogLevel::Warn).contains("battlink=warn"));
    }
}
