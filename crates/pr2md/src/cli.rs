use clap::Parser;
use pr2md_core::ReportConfig;
use pr2md_report::RefRequest;
use std::path::PathBuf;

/// Generate a markdown report of the changes between two git revisions
#[derive(Debug, Parser)]
#[command(name = "pr2md", version, about, long_about = None)]
pub struct Cli {
    /// Base branch; compared from its merge base with the current ref
    /// (default: first of main, master, develop that exists)
    #[arg(long, visible_alias = "base-branch")]
    pub base: Option<String>,

    /// Exact base commit, compared directly (takes precedence over --base)
    #[arg(long)]
    pub base_commit: Option<String>,

    /// Current branch or commit (default: HEAD)
    #[arg(long, visible_aliases = ["current-branch", "current-commit"])]
    pub current: Option<String>,

    /// Output markdown file [default: pr_changes.md]
    #[arg(short, long)]
    pub output: Option<String>,

    /// Largest new file in bytes shown in full; 0 disables the limit
    #[arg(long, value_name = "BYTES")]
    pub max_file_size: Option<u64>,

    /// Context lines around each diff hunk
    #[arg(long, value_name = "N")]
    pub context_lines: Option<u32>,

    /// Only show files with these extensions (comma separated)
    #[arg(long, value_delimiter = ',', value_name = "EXT")]
    pub include_extensions: Vec<String>,

    /// Extra exclude patterns (comma separated)
    #[arg(long, value_delimiter = ',', value_name = "PATTERN")]
    pub exclude_patterns: Vec<String>,

    /// Don't apply the built-in exclude patterns
    #[arg(long)]
    pub no_default_excludes: bool,

    /// Leave the commit list out of the summary
    #[arg(long)]
    pub no_commits: bool,

    /// Stamp the report with the generation time
    #[arg(long)]
    pub timestamp: bool,

    /// Repository to inspect
    #[arg(short = 'C', long, value_name = "DIR", default_value = ".")]
    pub repo: PathBuf,

    /// Specify configuration file path
    #[arg(long, env = "PR2MD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "PR2MD_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn ref_request(&self) -> RefRequest {
        RefRequest {
            base: self.base.clone(),
            base_commit: self.base_commit.clone(),
            current: self.current.clone(),
        }
    }

    /// Layer the flags over the loaded settings. Flags replace single
    /// values; extra exclude patterns are added to the configured ones.
    pub fn apply(&self, settings: ReportConfig) -> ReportConfig {
        let exclude_patterns = if self.exclude_patterns.is_empty() {
            None
        } else {
            let mut patterns = settings.exclude_patterns.clone().unwrap_or_default();
            patterns.extend(self.exclude_patterns.iter().cloned());
            Some(patterns)
        };

        settings.merge(ReportConfig {
            output: self.output.clone(),
            max_file_size: self.max_file_size,
            context_lines: self.context_lines,
            max_unchanged_lines: None,
            include_extensions: (!self.include_extensions.is_empty())
                .then(|| self.include_extensions.clone()),
            exclude_patterns,
            default_excludes: self.no_default_excludes.then_some(false),
            base_candidates: None,
            include_commits: self.no_commits.then_some(false),
            timestamp: self.timestamp.then_some(true),
        })
    }
}
