//! Report pipeline: resolve, list, classify, render, assemble

use crate::assemble::ReportAssembler;
use crate::changes::ChangeLister;
use crate::classify::{ContentProbe, FileClassifier, FilterConfig};
use crate::error::{ReportError, ReportResult};
use crate::git::{CommandRunner, Git};
use crate::refs::{RefRequest, RefResolver};
use crate::render::{ContentRenderer, RenderOptions};
use crate::types::{
    ChangeEntry, Classification, ClassifiedChanges, CommitInfo, ExcludedFile, ReportSummary,
    ResolvedRefs,
};
use chrono::Local;
use pr2md_core::{ReportConfig, DEFAULT_BASE_CANDIDATES};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::Builder;
use tracing::{debug, info, warn};

/// Everything a single run needs, fixed at startup
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub refs: RefRequest,
    /// Branches tried in order when no base is given
    pub base_candidates: Vec<String>,
    pub filters: FilterConfig,
    pub render: RenderOptions,
    pub include_commits: bool,
    pub timestamp: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            refs: RefRequest::default(),
            base_candidates: DEFAULT_BASE_CANDIDATES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            filters: FilterConfig::default(),
            render: RenderOptions::default(),
            include_commits: true,
            timestamp: false,
        }
    }
}

impl ReportOptions {
    /// Options from merged settings plus the refs asked for on the command line
    pub fn from_config(config: &ReportConfig, refs: RefRequest) -> Self {
        Self {
            refs,
            base_candidates: config.base_candidates(),
            filters: FilterConfig {
                include_extensions: config.include_extensions().to_vec(),
                exclude_patterns: config.exclude_patterns(),
                max_file_size: config.max_file_size(),
            },
            render: RenderOptions {
                context_lines: config.context_lines(),
                max_unchanged_lines: config.max_unchanged_lines(),
            },
            include_commits: config.include_commits(),
            timestamp: config.timestamp(),
        }
    }
}

/// A finished report
#[derive(Debug, Clone)]
pub struct Report {
    pub refs: ResolvedRefs,
    pub summary: ReportSummary,
    pub markdown: String,
}

pub struct ReportGenerator {
    resolver: RefResolver,
    classifier: FileClassifier,
    renderer: ContentRenderer,
    options: ReportOptions,
}

impl ReportGenerator {
    /// Fails only on an invalid exclude pattern
    pub fn new(options: ReportOptions) -> ReportResult<Self> {
        Ok(Self {
            resolver: RefResolver::new(options.base_candidates.clone()),
            classifier: FileClassifier::new(&options.filters)?,
            renderer: ContentRenderer::new(options.render),
            options,
        })
    }

    pub fn generate<R: CommandRunner>(&self, git: &Git<R>) -> ReportResult<Report> {
        let refs = self.resolver.resolve(git, &self.options.refs)?;
        let entries = ChangeLister::list(git, &refs)?;

        let mut changes = ClassifiedChanges::default();
        for entry in entries {
            self.place(git, &refs, entry, &mut changes);
        }
        changes.sort();

        let commits = if self.options.include_commits && !changes.is_empty() {
            self.commits(git, &refs)
        } else {
            Vec::new()
        };

        let mut assembler = ReportAssembler::new();
        if self.options.timestamp {
            assembler = assembler.with_timestamp(Local::now());
        }
        let markdown = assembler.assemble(&refs, &changes, &commits);
        let summary = ReportSummary::from_changes(&changes, &refs);

        info!(
            files = summary.total_files,
            new = summary.added,
            modified = summary.modified,
            excluded = summary.excluded,
            "Report generated"
        );

        Ok(Report {
            refs,
            summary,
            markdown,
        })
    }

    /// Classify one entry and move it into its bucket; content failures
    /// become placeholders rather than aborting the run
    fn place<R: CommandRunner>(
        &self,
        git: &Git<R>,
        refs: &ResolvedRefs,
        entry: ChangeEntry,
        changes: &mut ClassifiedChanges,
    ) {
        let blob = FileClassifier::needs_probe(&entry).then(|| fetch_blob(git, refs, &entry.path));
        let probe = match &blob {
            Some(Ok(bytes)) => Some(ContentProbe::from_bytes(bytes)),
            Some(Err(e)) => {
                warn!(path = %entry.path, error = %e, "Could not inspect file content");
                None
            }
            None => None,
        };

        let classification = self.classifier.classify(&entry, probe.as_ref());
        debug!(path = %entry.path, ?classification, "Classified");

        match classification {
            Classification::Full => {
                let blob = blob.unwrap_or_else(|| fetch_blob(git, refs, &entry.path));
                changes.new_files.push(self.renderer.render_full(entry, blob));
            }
            Classification::Diff => {
                changes
                    .modified_files
                    .push(self.renderer.render_diff(git, refs, entry));
            }
            Classification::Listed => changes.other.push(entry),
            Classification::Excluded(reason) => {
                changes.excluded.push(ExcludedFile { entry, reason });
            }
        }
    }

    fn commits<R: CommandRunner>(&self, git: &Git<R>, refs: &ResolvedRefs) -> Vec<CommitInfo> {
        match ChangeLister::commits(git, refs) {
            Ok(commits) => commits,
            Err(e) => {
                warn!(error = %e, "Could not list commits");
                Vec::new()
            }
        }
    }
}

/// Content of `path` at the current commit
fn fetch_blob<R: CommandRunner>(
    git: &Git<R>,
    refs: &ResolvedRefs,
    path: &str,
) -> ReportResult<Vec<u8>> {
    let object = format!("{}:{}", refs.current_commit, path);
    git.bytes(&["cat-file", "blob", object.as_str()])
}

/// Write the report atomically: a temp file in the target directory is
/// renamed over `path`, so a failed run never leaves a partial report.
/// A replaced report keeps its permissions.
pub fn write_report(path: &Path, markdown: &str) -> ReportResult<()> {
    let output_error = |source: std::io::Error| ReportError::Output {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(output_error)?;

    let mut builder = Builder::new();
    builder.prefix(".pr2md");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // same mode fs::write would give, still subject to the umask
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let mut file = builder.tempfile_in(parent).map_err(output_error)?;
    #[cfg(unix)]
    if let Ok(existing) = fs::metadata(path) {
        file.as_file()
            .set_permissions(existing.permissions())
            .map_err(output_error)?;
    }
    file.write_all(markdown.as_bytes()).map_err(output_error)?;
    file.persist(path).map_err(|e| output_error(e.error))?;

    info!(path = %path.display(), bytes = markdown.len(), "Report written");
    Ok(())
}
