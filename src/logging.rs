//! Diagnostics go to stderr; stdout carries only the report.

use anyhow::{Result, anyhow};
use std::io::IsTerminal;
use tracing::Level;
use tracing_subscriber::fmt;

/// `None` keeps the pipeline silent.
pub fn max_level(verbose: bool) -> Option<Level> {
    verbose.then_some(Level::DEBUG)
}

pub fn init(verbose: bool) -> Result<()> {
    let Some(level) = max_level(verbose) else {
        return Ok(());
    };
    fmt()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow!("failed to install log subscriber: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_runs_install_nothing() {
        assert_eq!(max_level(false), None);
        assert!(init(false).is_ok());
    }

    #[test]
    fn verbose_runs_install_one_stderr_subscriber() {
        assert_eq!(max_level(true), Some(Level::DEBUG));
        init(true).expect("first install");
        let err = init(true).unwrap_err();
        assert!(err.to_string().contains("failed to install log subscriber"));
    }
}
