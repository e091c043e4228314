use tracing_subscriber::EnvFilter;

use crate::error::{BblError, Result};

pub const DEFAULT_LOG_FILTER: &str = "info";

/// Resolves the log filter: an explicit level wins over `RUST_LOG`, which
/// wins over [`DEFAULT_LOG_FILTER`].
pub fn filter(log_level: Option<&str>) -> Result<EnvFilter> {
    match log_level {
        Some(level) => {
            EnvFilter::try_new(level).map_err(|err| BblError::Telemetry(err.to_string()))
        }
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))),
    }
}

/// Installs the global subscriber. Logs go to stderr so generated documents
/// printed on stdout stay clean.
pub fn init(log_level: Option<&str>) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter(log_level)?)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| BblError::Telemetry(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_level_is_used_verbatim() {
        let filter = filter(Some("bosh_bootloader=debug")).unwrap();
        assert_eq!(filter.to_string(), "bosh_bootloader=debug");
    }

    #[test]
    fn malformed_level_is_a_telemetry_error() {
        let err = filter(Some("bosh_bootloader=loud")).unwrap_err();
        assert!(matches!(err, BblError::Telemetry(_)));
    }
}
