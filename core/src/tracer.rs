use std::io::stderr;

use tracing_subscriber::{
    filter::ParseError,
    fmt::layer,
    layer::SubscriberExt,
    registry,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

// Consts

pub const DEFAULT_LOG_FILTER: &str = "hashkit=info,hashkit_core=info,warn";

// Types

pub type Result<T = ()> = std::result::Result<T, Error>;

// Error

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid log filter: {0}")]
    Filter(
        #[from]
        #[source]
        ParseError,
    ),
    #[error("failed to install tracing subscriber: {0}")]
    Init(
        #[from]
        #[source]
        TryInitError,
    ),
}

// Functions

/// Installs a stderr fmt subscriber filtered by `log_filter` (`EnvFilter` directives).
///
/// Logs go to stderr so that encoded hashes printed on stdout stay pipeable.
pub fn init_tracer<FILTER: AsRef<str>>(log_filter: FILTER) -> Result {
    let filter = EnvFilter::builder().parse(log_filter.as_ref())?;
    let fmt = layer().with_target(true).with_writer(stderr);
    registry().with(filter).with(fmt).try_init()?;
    Ok(())
}

// Tests
