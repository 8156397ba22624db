//! Markdown change reports for pull-request review
//!
//! Compares two revisions of a git repository and renders every changed
//! file into one markdown document: new files in full, modified files as
//! diffs, deletions and renames as a list, and excluded files with the
//! reason they were left out.
//!
//! The pipeline runs the host `git` binary through a [`CommandRunner`], so
//! every stage can be driven by a scripted runner in tests.

mod assemble;
mod changes;
mod classify;
mod error;
mod git;
mod refs;
mod render;
mod report;
mod types;

pub use assemble::ReportAssembler;
pub use changes::{parse_log, parse_name_status, parse_numstat, ChangeLister, NumstatRow};
pub use classify::{ContentProbe, FileClassifier, FilterConfig, PathMatcher, PROBE_WINDOW};
pub use error::{ReportError, ReportResult};
pub use git::{CommandRunner, Git, GitCli, GitOutput};
pub use refs::{RefRequest, RefResolver};
pub use render::{format_diff, language_for, ContentRenderer, RenderOptions};
pub use report::{write_report, Report, ReportGenerator, ReportOptions};
pub use types::{
    ChangeEntry, ChangeStatus, Classification, ClassifiedChanges, CommitInfo, ExcludedFile,
    Exclusion, LineStats, RenderedBody, RenderedFile, ReportSummary, ResolvedRefs,
};

#[cfg(test)]
mod testing;
