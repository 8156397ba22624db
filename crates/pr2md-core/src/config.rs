//! Configuration management for pr2md
//!
//! Settings live in a `[report]` section. Files are layered with the
//! following priority (later wins, field by field):
//!
//! 1. Built-in defaults
//! 2. Global config (`$XDG_CONFIG_HOME/pr2md/config.toml`)
//! 3. Repo config (`.pr2md.toml` in the repository root)
//! 4. An explicit `--config <path>`
//!
//! CLI flags are applied on top by the binary.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: &str = "1";

/// Supported configuration versions
pub const SUPPORTED_CONFIG_VERSIONS: &[&str] = &["1"];

/// Global config file name inside the `pr2md` config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Repository-local config file name
pub const REPO_CONFIG_FILE_NAME: &str = ".pr2md.toml";

pub const DEFAULT_OUTPUT: &str = "pr_changes.md";
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100_000;
pub const DEFAULT_CONTEXT_LINES: u32 = 3;
pub const DEFAULT_MAX_UNCHANGED_LINES: usize = 10;

/// Branches probed, in order, when no base is given
pub const DEFAULT_BASE_CANDIDATES: &[&str] = &["main", "master", "develop"];

/// Generated, vendored, secret and binary-format files that rarely belong in a review
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    "__pycache__",
    "*.pyc",
    "*.pyo",
    ".git/",
    "node_modules",
    "*.min.js",
    "*.min.css",
    "*.bundle.js",
    "*.map",
    ".env",
    ".env.*",
    "*.lock",
    "package-lock.json",
    "pnpm-lock.yaml",
    "go.sum",
    // binary formats git can still report as text
    "*.jpg",
    "*.jpeg",
    "*.png",
    "*.gif",
    "*.ico",
    "*.svg",
    "*.bmp",
    "*.woff",
    "*.woff2",
    "*.ttf",
    "*.eot",
    "*.otf",
    "*.pdf",
    "*.zip",
    "*.tar",
    "*.gz",
    "*.rar",
    "*.7z",
    "*.exe",
    "*.dll",
    "*.so",
    "*.dylib",
    "*.a",
    "*.lib",
    "*.mp3",
    "*.mp4",
    "*.avi",
    "*.mov",
    "*.wav",
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config from {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Configuration version for tracking schema changes
    #[serde(default = "default_config_version")]
    pub version: String,

    /// Report generation settings
    #[serde(default)]
    pub report: ReportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_config_version(),
            report: ReportConfig::default(),
        }
    }
}

/// `[report]` section. Every field is optional so that layers only
/// override what they set; the accessors supply the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Output markdown file
    pub output: Option<String>,

    /// Largest new file (bytes) inlined in full; 0 disables the limit
    pub max_file_size: Option<u64>,

    /// Context lines around each diff hunk
    pub context_lines: Option<u32>,

    /// Unchanged lines kept in a row before the rest of the run is collapsed
    pub max_unchanged_lines: Option<usize>,

    /// Extension allow-list; empty means every extension
    pub include_extensions: Option<Vec<String>>,

    /// Extra exclude patterns, added to the defaults
    pub exclude_patterns: Option<Vec<String>>,

    /// Whether the built-in exclude patterns apply
    pub default_excludes: Option<bool>,

    /// Branches probed for a merge base when no base is given
    pub base_candidates: Option<Vec<String>>,

    /// List the commits of the range in the summary
    pub include_commits: Option<bool>,

    /// Stamp the report with the generation time
    pub timestamp: Option<bool>,
}

impl ReportConfig {
    /// Merge another layer into this one (other takes precedence per field)
    pub fn merge(self, other: ReportConfig) -> Self {
        Self {
            output: other.output.or(self.output),
            max_file_size: other.max_file_size.or(self.max_file_size),
            context_lines: other.context_lines.or(self.context_lines),
            max_unchanged_lines: other.max_unchanged_lines.or(self.max_unchanged_lines),
            include_extensions: other.include_extensions.or(self.include_extensions),
            exclude_patterns: other.exclude_patterns.or(self.exclude_patterns),
            default_excludes: other.default_excludes.or(self.default_excludes),
            base_candidates: other.base_candidates.or(self.base_candidates),
            include_commits: other.include_commits.or(self.include_commits),
            timestamp: other.timestamp.or(self.timestamp),
        }
    }

    pub fn output(&self) -> &str {
        self.output.as_deref().unwrap_or(DEFAULT_OUTPUT)
    }

    /// Effective size limit; `None` when disabled with 0
    pub fn max_file_size(&self) -> Option<u64> {
        match self.max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE) {
            0 => None,
            limit => Some(limit),
        }
    }

    pub fn context_lines(&self) -> u32 {
        self.context_lines.unwrap_or(DEFAULT_CONTEXT_LINES)
    }

    pub fn max_unchanged_lines(&self) -> usize {
        self.max_unchanged_lines
            .unwrap_or(DEFAULT_MAX_UNCHANGED_LINES)
    }

    pub fn include_extensions(&self) -> &[String] {
        self.include_extensions.as_deref().unwrap_or(&[])
    }

    /// Built-in patterns (unless disabled) followed by the configured ones
    pub fn exclude_patterns(&self) -> Vec<String> {
        let mut patterns: Vec<String> = if self.default_excludes.unwrap_or(true) {
            DEFAULT_EXCLUDE_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect()
        } else {
            Vec::new()
        };

        for pattern in self.exclude_patterns.iter().flatten() {
            if !patterns.contains(pattern) {
                patterns.push(pattern.clone());
            }
        }

        patterns
    }

    pub fn base_candidates(&self) -> Vec<String> {
        match &self.base_candidates {
            Some(candidates) => candidates.clone(),
            None => DEFAULT_BASE_CANDIDATES
                .iter()
                .map(|b| b.to_string())
                .collect(),
        }
    }

    pub fn include_commits(&self) -> bool {
        self.include_commits.unwrap_or(true)
    }

    pub fn timestamp(&self) -> bool {
        self.timestamp.unwrap_or(false)
    }
}

fn default_config_version() -> String {
    CURRENT_CONFIG_VERSION.to_string()
}

/// Config home, respecting `XDG_CONFIG_HOME`
pub fn get_config_home() -> Option<PathBuf> {
    match std::env::var_os("XDG_CONFIG_HOME") {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::home_dir().map(|h| h.join(".config")),
    }
}

impl Config {
    /// Check if the configuration version is supported
    pub fn is_version_supported(&self) -> bool {
        SUPPORTED_CONFIG_VERSIONS.contains(&self.version.as_str())
    }

    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if !config.is_version_supported() {
            warn!(
                version = %config.version,
                supported = %SUPPORTED_CONFIG_VERSIONS.join(", "),
                path = %path.display(),
                "Unsupported configuration version, using defaults where needed"
            );
        }

        debug!(path = %path.display(), "Loaded config layer");
        Ok(config)
    }

    /// Get the default config directory path
    pub fn get_config_dir() -> Option<PathBuf> {
        get_config_home().map(|h| h.join("pr2md"))
    }

    /// Load the global, repo and explicit layers on top of the defaults.
    /// Missing global/repo files are skipped; a missing explicit file is an error.
    pub fn load(repo_dir: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_layered(Self::get_config_dir(), repo_dir, explicit)
    }

    fn load_layered(
        config_dir: Option<PathBuf>,
        repo_dir: &Path,
        explicit: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(global) = config_dir.map(|dir| dir.join(CONFIG_FILE_NAME)) {
            if global.exists() {
                config = config.merge(Self::load_from_file(&global)?);
            }
        }

        let repo_config = repo_dir.join(REPO_CONFIG_FILE_NAME);
        if repo_config.exists() {
            config = config.merge(Self::load_from_file(&repo_config)?);
        }

        if let Some(path) = explicit {
            config = config.merge(Self::load_from_file(path)?);
        }

        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(self, other: Config) -> Self {
        Self {
            version: other.version,
            report: self.report.merge(other.report),
        }
    }
}
