//! Markdown assembly with a fixed section order:
//! Summary, New Files, Modified Files, Other Changes (deleted, renamed, excluded)

use crate::types::{
    ChangeEntry, ChangeStatus, ClassifiedChanges, CommitInfo, RenderedBody, RenderedFile,
    ReportSummary, ResolvedRefs,
};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct ReportAssembler {
    generated_at: Option<DateTime<Local>>,
}

impl ReportAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp the report; leave unset for byte-identical reruns
    pub fn with_timestamp(mut self, generated_at: DateTime<Local>) -> Self {
        self.generated_at = Some(generated_at);
        self
    }

    pub fn assemble(
        &self,
        refs: &ResolvedRefs,
        changes: &ClassifiedChanges,
        commits: &[CommitInfo],
    ) -> String {
        if changes.is_empty() {
            return format!(
                "# No Changes Found\n\nNo differences detected between `{}` and `{}`.\n",
                refs.base_ref, refs.current_ref
            );
        }

        let summary = ReportSummary::from_changes(changes, refs);
        let mut out = String::new();

        self.write_header(&mut out, refs);
        write_summary(&mut out, refs, &summary, changes, commits);
        write_new_files(&mut out, &changes.new_files);
        write_modified_files(&mut out, &changes.modified_files);
        write_other_changes(&mut out, changes);

        out
    }

    fn write_header(&self, out: &mut String, refs: &ResolvedRefs) {
        out.push_str(&format!("# PR Changes: {}\n\n", refs.current_ref));
        out.push_str(&format!("**Base**: `{}` ({})  \n", refs.base_ref, refs.base_short()));
        out.push_str(&format!(
            "**Head**: `{}` ({})  \n",
            refs.current_ref,
            refs.current_short()
        ));
        if let Some(at) = &self.generated_at {
            out.push_str(&format!("**Generated**: {}  \n", at.format("%Y-%m-%d %H:%M:%S")));
        }
        out.push('\n');
    }
}

fn plural(count: usize) -> String {
    if count == 1 {
        "1 file".to_string()
    } else {
        format!("{} files", count)
    }
}

fn write_summary(
    out: &mut String,
    refs: &ResolvedRefs,
    summary: &ReportSummary,
    changes: &ClassifiedChanges,
    commits: &[CommitInfo],
) {
    out.push_str("## Summary\n\n");
    out.push_str(&format!("- **Files Changed**: {}\n", summary.total_files));
    out.push_str(&format!("- **New Files**: {}\n", summary.added));
    out.push_str(&format!("- **Modified Files**: {}\n", summary.modified));
    out.push_str(&format!("- **Deleted Files**: {}\n", summary.deleted));
    out.push_str(&format!("- **Renamed Files**: {}\n", summary.renamed));
    out.push_str(&format!("- **Excluded Files**: {}\n", summary.excluded));
    if summary.unavailable > 0 {
        out.push_str(&format!("- **Files Without Content**: {}\n", summary.unavailable));
    }
    out.push_str(&format!("- **Lines Added**: +{}\n", summary.insertions));
    out.push_str(&format!("- **Lines Removed**: -{}\n", summary.deletions));
    out.push_str(&format!(
        "- **Commit Range**: {}...{}\n\n",
        refs.base_short(),
        refs.current_short()
    ));

    let new_paths: Vec<&ChangeEntry> = changes.new_files.iter().map(|f| &f.entry).collect();
    let modified_paths: Vec<&ChangeEntry> =
        changes.modified_files.iter().map(|f| &f.entry).collect();
    let deleted: Vec<&ChangeEntry> = changes
        .other
        .iter()
        .filter(|e| e.status == ChangeStatus::Deleted)
        .collect();
    let renamed: Vec<&ChangeEntry> = changes
        .other
        .iter()
        .filter(|e| e.status == ChangeStatus::Renamed)
        .collect();

    write_path_list(out, "New Files Created", &new_paths);
    write_path_list(out, "Modified Files", &modified_paths);
    write_path_list(out, "Deleted Files", &deleted);
    if !renamed.is_empty() {
        out.push_str(&format!("### Renamed Files ({}):\n\n", plural(renamed.len())));
        for entry in &renamed {
            out.push_str(&format!("- {}\n", rename_arrow(entry)));
        }
        out.push('\n');
    }

    write_directories(out, changes);

    if !commits.is_empty() {
        out.push_str(&format!("### Commits ({}):\n\n", commits.len()));
        for commit in commits {
            out.push_str(&format!("- `{}` {}\n", commit.short_id, commit.subject));
        }
        out.push('\n');
    }

    out.push_str("---\n\n");
}

fn write_path_list(out: &mut String, title: &str, entries: &[&ChangeEntry]) {
    if entries.is_empty() {
        return;
    }
    out.push_str(&format!("### {} ({}):\n\n", title, plural(entries.len())));
    for entry in entries {
        out.push_str(&format!("- **{}**\n", entry.path));
    }
    out.push('\n');
}

/// Directory breakdown, only worth showing when more than one is touched
fn write_directories(out: &mut String, changes: &ClassifiedChanges) {
    let mut directories: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in changes.entries() {
        *directories.entry(entry.directory()).or_default() += 1;
    }
    if directories.len() <= 1 {
        return;
    }

    out.push_str("### Changes by Directory\n\n");
    out.push_str("| Directory | Files |\n");
    out.push_str("|-----------|-------|\n");
    for (directory, count) in &directories {
        if *directory == "Root" {
            out.push_str(&format!("| Root | {} |\n", count));
        } else {
            out.push_str(&format!("| `{}/` | {} |\n", directory, count));
        }
    }
    out.push('\n');
}

fn rename_arrow(entry: &ChangeEntry) -> String {
    format!(
        "**{}** → **{}**",
        entry.old_path.as_deref().unwrap_or("?"),
        entry.path
    )
}

/// A backtick fence longer than any backtick run inside `text`
fn fence_for(text: &str) -> String {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}

fn write_fenced(out: &mut String, language: &str, text: &str) {
    let fence = fence_for(text);
    let text = text.strip_suffix('\n').unwrap_or(text);
    out.push_str(&format!("{}{}\n", fence, language));
    if !text.is_empty() {
        out.push_str(text);
        out.push('\n');
    }
    out.push_str(&format!("{}\n\n", fence));
}

fn write_body(out: &mut String, file: &RenderedFile) {
    match &file.body {
        RenderedBody::Content { language, text } => write_fenced(out, language, text),
        RenderedBody::Diff(text) => write_fenced(out, "diff", text),
        RenderedBody::NoDiff => out.push_str("*No diff available*\n\n"),
        RenderedBody::Unavailable(note) => {
            out.push_str(&format!("*{}*\n\n", note));
        }
    }
    if file.truncated {
        out.push_str("*Long unchanged sections were collapsed.*\n\n");
    }
}

fn write_new_files(out: &mut String, files: &[RenderedFile]) {
    if files.is_empty() {
        return;
    }
    out.push_str("## New Files\n\n");
    for file in files {
        out.push_str(&format!("### {}\n\n", file.entry.path));
        write_body(out, file);
    }
}

fn write_modified_files(out: &mut String, files: &[RenderedFile]) {
    if files.is_empty() {
        return;
    }
    out.push_str("## Modified Files\n\n");
    for file in files {
        out.push_str(&format!("### {}\n\n", file.entry.path));
        write_body(out, file);
    }
}

fn write_other_changes(out: &mut String, changes: &ClassifiedChanges) {
    if changes.other.is_empty() && changes.excluded.is_empty() {
        return;
    }
    out.push_str("## Other Changes\n\n");

    let deleted: Vec<&ChangeEntry> = changes
        .other
        .iter()
        .filter(|e| e.status == ChangeStatus::Deleted)
        .collect();
    if !deleted.is_empty() {
        out.push_str("### Deleted Files\n\n");
        for entry in deleted {
            out.push_str(&format!("- **{}** - File removed\n", entry.path));
        }
        out.push('\n');
    }

    let renamed: Vec<&ChangeEntry> = changes
        .other
        .iter()
        .filter(|e| e.status == ChangeStatus::Renamed)
        .collect();
    if !renamed.is_empty() {
        out.push_str("### Renamed Files\n\n");
        for entry in renamed {
            let detail = match entry.similarity {
                Some(100) => "renamed only".to_string(),
                Some(score) => format!("with modifications, {}% similar", score),
                None => "with modifications".to_string(),
            };
            out.push_str(&format!("- {} ({})\n", rename_arrow(entry), detail));
        }
        out.push('\n');
    }

    if !changes.excluded.is_empty() {
        out.push_str("### Excluded Files\n\n");
        for excluded in &changes.excluded {
            out.push_str(&format!(
                "- **{}** ({}) - {}\n",
                excluded.entry.path,
                excluded.entry.status.as_str(),
                excluded.reason
            ));
        }
        out.push('\n');
    }
}
