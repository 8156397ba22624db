//! File classification: which changed paths are inlined, diffed, listed or excluded

use crate::error::{ReportError, ReportResult};
use crate::types::{ChangeEntry, ChangeStatus, Classification, Exclusion};
use globset::{GlobBuilder, GlobMatcher};
use std::collections::BTreeSet;
use std::path::Path;

/// Bytes inspected for a NUL byte, the same window git uses for its own check
pub const PROBE_WINDOW: usize = 8000;

/// Size and binary sniff of a blob at the current commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentProbe {
    pub size: u64,
    pub has_nul: bool,
}

impl ContentProbe {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let window = &bytes[..bytes.len().min(PROBE_WINDOW)];
        Self {
            size: bytes.len() as u64,
            has_nul: window.contains(&0),
        }
    }
}

/// Filters supplied once at startup
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    /// Extension allow-list; empty means every extension
    pub include_extensions: Vec<String>,
    pub exclude_patterns: Vec<String>,
    /// Largest new file inlined in full
    pub max_file_size: Option<u64>,
}

enum PatternKind {
    Glob(GlobMatcher),
    Substring,
}

struct CompiledPattern {
    source: String,
    kind: PatternKind,
}

/// Exclude patterns compiled once.
///
/// Patterns with glob metacharacters match the whole path or the file
/// name (`*.lock` catches `web/yarn.lock`); anything else is a plain
/// substring of the path (`node_modules`, `dist/`).
pub struct PathMatcher {
    patterns: Vec<CompiledPattern>,
}

impl PathMatcher {
    pub fn new(patterns: &[String]) -> ReportResult<Self> {
        let patterns = patterns
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(|pattern| {
                let kind = if pattern.contains(['*', '?', '[', '{']) {
                    let glob = GlobBuilder::new(pattern)
                        .literal_separator(false)
                        .build()
                        .map_err(|source| ReportError::Pattern {
                            pattern: pattern.to_string(),
                            source,
                        })?;
                    PatternKind::Glob(glob.compile_matcher())
                } else {
                    PatternKind::Substring
                };
                Ok(CompiledPattern {
                    source: pattern.to_string(),
                    kind,
                })
            })
            .collect::<ReportResult<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// First pattern matching `path`
    pub fn matching(&self, path: &str) -> Option<&str> {
        let file_name = path.rsplit('/').next().unwrap_or(path);

        self.patterns
            .iter()
            .find(|pattern| match &pattern.kind {
                PatternKind::Glob(glob) => glob.is_match(path) || glob.is_match(file_name),
                PatternKind::Substring => path.contains(pattern.source.as_str()),
            })
            .map(|pattern| pattern.source.as_str())
    }
}

pub struct FileClassifier {
    matcher: PathMatcher,
    include_extensions: BTreeSet<String>,
    max_file_size: Option<u64>,
}

impl FileClassifier {
    pub fn new(config: &FilterConfig) -> ReportResult<Self> {
        let include_extensions = config
            .include_extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();

        Ok(Self {
            matcher: PathMatcher::new(&config.exclude_patterns)?,
            include_extensions,
            max_file_size: config.max_file_size,
        })
    }

    /// Whether [`FileClassifier::classify`] wants a content probe for this entry.
    /// Deletions and renames are never inspected, and git already flagged
    /// its own binaries.
    pub fn needs_probe(entry: &ChangeEntry) -> bool {
        matches!(entry.status, ChangeStatus::Added | ChangeStatus::Modified) && !entry.is_binary
    }

    /// Rules run in a fixed order (binary, pattern, extension, size) and
    /// the first that matches decides.
    pub fn classify(&self, entry: &ChangeEntry, probe: Option<&ContentProbe>) -> Classification {
        let has_content = matches!(entry.status, ChangeStatus::Added | ChangeStatus::Modified);

        if has_content && (entry.is_binary || probe.is_some_and(|p| p.has_nul)) {
            return Classification::Excluded(Exclusion::Binary);
        }

        if let Some(pattern) = self.matcher.matching(&entry.path) {
            return Classification::Excluded(Exclusion::Pattern(pattern.to_string()));
        }

        if !self.extension_allowed(&entry.path) {
            return Classification::Excluded(Exclusion::Extension);
        }

        if entry.status == ChangeStatus::Added {
            if let (Some(limit), Some(probe)) = (self.max_file_size, probe) {
                if probe.size > limit {
                    return Classification::Excluded(Exclusion::Size {
                        size: probe.size,
                        limit,
                    });
                }
            }
        }

        match entry.status {
            ChangeStatus::Added => Classification::Full,
            ChangeStatus::Modified => Classification::Diff,
            ChangeStatus::Deleted | ChangeStatus::Renamed => Classification::Listed,
        }
    }

    fn extension_allowed(&self, path: &str) -> bool {
        if self.include_extensions.is_empty() {
            return true;
        }
        Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.include_extensions.contains(&ext.to_lowercase()))
    }
}
