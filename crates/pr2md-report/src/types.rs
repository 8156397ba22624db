//! Type definitions shared by the report pipeline

use std::fmt;

/// Kind of change git reports for a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChangeStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl ChangeStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ChangeStatus::Added => "added",
            ChangeStatus::Modified => "modified",
            ChangeStatus::Deleted => "deleted",
            ChangeStatus::Renamed => "renamed",
        }
    }
}

/// Inserted/removed line counts from `git diff --numstat`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineStats {
    pub insertions: u64,
    pub deletions: u64,
}

/// One changed path between the base and current commits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEntry {
    pub path: String,
    /// Source path of a rename
    pub old_path: Option<String>,
    pub status: ChangeStatus,
    /// Git reported the file as binary (numstat `-\t-`)
    pub is_binary: bool,
    /// Rename similarity percentage
    pub similarity: Option<u8>,
    /// `None` for binary files
    pub lines: Option<LineStats>,
}

impl ChangeEntry {
    pub fn new(path: impl Into<String>, status: ChangeStatus) -> Self {
        Self {
            path: path.into(),
            old_path: None,
            status,
            is_binary: false,
            similarity: None,
            lines: None,
        }
    }

    /// Directory of the path, `Root` for top-level files
    pub fn directory(&self) -> &str {
        match self.path.rsplit_once('/') {
            Some((dir, _)) => dir,
            None => "Root",
        }
    }
}

/// Why a path was kept out of the report body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    Binary,
    Pattern(String),
    Extension,
    Size { size: u64, limit: u64 },
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exclusion::Binary => write!(f, "binary file"),
            Exclusion::Pattern(pattern) => write!(f, "matches exclude pattern `{}`", pattern),
            Exclusion::Extension => write!(f, "extension not in include list"),
            Exclusion::Size { size, limit } => {
                write!(f, "file too large: {} bytes exceeds limit of {} bytes", size, limit)
            }
        }
    }
}

/// Outcome of classifying one [`ChangeEntry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// New file, inlined in full
    Full,
    /// Modified file, rendered as a unified diff
    Diff,
    /// Deleted or renamed file, listed under Other Changes
    Listed,
    Excluded(Exclusion),
}

/// Body of a file section in the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedBody {
    Content { language: &'static str, text: String },
    Diff(String),
    /// Git produced no hunks (mode-only or metadata change)
    NoDiff,
    /// Placeholder note for a file whose content could not be produced
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub entry: ChangeEntry,
    pub body: RenderedBody,
    /// Part of the body was collapsed
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedFile {
    pub entry: ChangeEntry,
    pub reason: Exclusion,
}

/// Base and current revisions being compared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRefs {
    /// Name the base was given as (branch, tag or commit)
    pub base_ref: String,
    /// Full id of the comparison point (the merge base for branches)
    pub base_commit: String,
    pub current_ref: String,
    pub current_commit: String,
}

impl ResolvedRefs {
    pub fn range(&self) -> String {
        format!("{}..{}", self.base_commit, self.current_commit)
    }

    pub fn base_short(&self) -> &str {
        short_id(&self.base_commit)
    }

    pub fn current_short(&self) -> &str {
        short_id(&self.current_commit)
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// One commit of the compared range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub short_id: String,
    pub subject: String,
}

/// Every change entry sorted into exactly one bucket
#[derive(Debug, Clone, Default)]
pub struct ClassifiedChanges {
    pub new_files: Vec<RenderedFile>,
    pub modified_files: Vec<RenderedFile>,
    /// Deletions and renames
    pub other: Vec<ChangeEntry>,
    pub excluded: Vec<ExcludedFile>,
}

impl ClassifiedChanges {
    pub fn len(&self) -> usize {
        self.new_files.len() + self.modified_files.len() + self.other.len() + self.excluded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries, in bucket order
    pub fn entries(&self) -> impl Iterator<Item = &ChangeEntry> {
        self.new_files
            .iter()
            .map(|f| &f.entry)
            .chain(self.modified_files.iter().map(|f| &f.entry))
            .chain(self.other.iter())
            .chain(self.excluded.iter().map(|f| &f.entry))
    }

    /// Sort every bucket by path
    pub fn sort(&mut self) {
        self.new_files.sort_by(|a, b| a.entry.path.cmp(&b.entry.path));
        self.modified_files
            .sort_by(|a, b| a.entry.path.cmp(&b.entry.path));
        self.other.sort_by(|a, b| a.path.cmp(&b.path));
        self.excluded.sort_by(|a, b| a.entry.path.cmp(&b.entry.path));
    }
}

/// Statistics shown in the Summary section, computed from the buckets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub total_files: usize,
    pub added: usize,
    pub modified: usize,
    pub deleted: usize,
    pub renamed: usize,
    pub excluded: usize,
    /// Files whose content could not be rendered
    pub unavailable: usize,
    pub insertions: u64,
    pub deletions: u64,
    pub base_ref: String,
    pub base_commit: String,
    pub current_ref: String,
    pub current_commit: String,
}

impl ReportSummary {
    pub fn from_changes(changes: &ClassifiedChanges, refs: &ResolvedRefs) -> Self {
        let count_status = |status: ChangeStatus| {
            changes
                .other
                .iter()
                .filter(|entry| entry.status == status)
                .count()
        };
        let unavailable = changes
            .new_files
            .iter()
            .chain(changes.modified_files.iter())
            .filter(|f| matches!(f.body, RenderedBody::Unavailable(_)))
            .count();

        let (insertions, deletions) = changes
            .new_files
            .iter()
            .map(|f| &f.entry)
            .chain(changes.modified_files.iter().map(|f| &f.entry))
            .chain(changes.other.iter())
            .filter_map(|entry| entry.lines)
            .fold((0, 0), |(ins, del), lines| {
                (ins + lines.insertions, del + lines.deletions)
            });

        Self {
            total_files: changes.len(),
            added: changes.new_files.len(),
            modified: changes.modified_files.len(),
            deleted: count_status(ChangeStatus::Deleted),
            renamed: count_status(ChangeStatus::Renamed),
            excluded: changes.excluded.len(),
            unavailable,
            insertions,
            deletions,
            base_ref: refs.base_ref.clone(),
            base_commit: refs.base_commit.clone(),
            current_ref: refs.current_ref.clone(),
            current_commit: refs.current_commit.clone(),
        }
    }
}
