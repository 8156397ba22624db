//! # pr2md-core
//!
//! Shared pieces for the pr2md workspace:
//!
//! - `config`: the `.pr2md.toml` / `config.toml` model and layered loading
//! - `logging`: tracing subscriber setup for the binary

pub mod config;
pub mod logging;

pub use config::{
    get_config_home, Config, ConfigError, ReportConfig, CONFIG_FILE_NAME,
    CURRENT_CONFIG_VERSION, DEFAULT_BASE_CANDIDATES, DEFAULT_CONTEXT_LINES,
    DEFAULT_EXCLUDE_PATTERNS, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_UNCHANGED_LINES,
    DEFAULT_OUTPUT, REPO_CONFIG_FILE_NAME, SUPPORTED_CONFIG_VERSIONS,
};
pub use logging::init_logging;
