//! Process-level plumbing shared by the binaries: layered configuration,
//! home directory resolution and the logging bootstrap.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{AppConfig, CliArgs, LoggingConfig, Section, ServerConfig};
pub use logging::init_logging_from_config;
