//! Listing of changed paths between the resolved commits

use crate::error::ReportResult;
use crate::git::{CommandRunner, Git};
use crate::types::{ChangeEntry, ChangeStatus, CommitInfo, LineStats, ResolvedRefs};
use std::collections::HashMap;
use tracing::{info, warn};

/// Per-path numbers from `git diff --numstat`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumstatRow {
    pub lines: Option<LineStats>,
    pub is_binary: bool,
}

pub struct ChangeLister;

impl ChangeLister {
    /// Changed paths between base and current, sorted by path
    pub fn list<R: CommandRunner>(
        git: &Git<R>,
        refs: &ResolvedRefs,
    ) -> ReportResult<Vec<ChangeEntry>> {
        let range = refs.range();
        let name_status = git.bytes(&[
            "diff",
            "--no-color",
            "--name-status",
            "-z",
            "-M",
            range.as_str(),
        ])?;
        let numstat = git.bytes(&[
            "diff",
            "--no-color",
            "--numstat",
            "-z",
            "-M",
            range.as_str(),
        ])?;

        let stats = parse_numstat(&String::from_utf8_lossy(&numstat));
        let mut entries = parse_name_status(&String::from_utf8_lossy(&name_status));

        for entry in &mut entries {
            if let Some(row) = stats.get(&entry.path) {
                entry.lines = row.lines;
                entry.is_binary = row.is_binary;
            }
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        info!(files = entries.len(), "Found changed files");
        Ok(entries)
    }

    /// Commits reachable from current but not from base, newest first
    pub fn commits<R: CommandRunner>(
        git: &Git<R>,
        refs: &ResolvedRefs,
    ) -> ReportResult<Vec<CommitInfo>> {
        let range = refs.range();
        let log = git.text(&["log", "--no-color", "--format=%h%x09%s", range.as_str()])?;
        Ok(parse_log(&log))
    }
}

/// Parse NUL-separated `git diff --name-status -z` output
pub fn parse_name_status(output: &str) -> Vec<ChangeEntry> {
    let mut entries = Vec::new();
    let mut tokens = output.split('\0').filter(|t| !t.is_empty());

    while let Some(code) = tokens.next() {
        let letter = code.chars().next().unwrap_or('?');
        let score = code[letter.len_utf8()..].parse::<u8>().ok();

        match letter {
            'R' | 'C' => {
                let (Some(old_path), Some(new_path)) = (tokens.next(), tokens.next()) else {
                    warn!(status = code, "Truncated rename/copy record in name-status output");
                    break;
                };
                let mut entry = if letter == 'R' {
                    ChangeEntry::new(new_path, ChangeStatus::Renamed)
                } else {
                    // a copy is a new file as far as the review is concerned
                    ChangeEntry::new(new_path, ChangeStatus::Added)
                };
                entry.old_path = Some(old_path.to_string());
                entry.similarity = score;
                entries.push(entry);
            }
            _ => {
                let Some(path) = tokens.next() else {
                    warn!(status = code, "Missing path in name-status output");
                    break;
                };
                let status = match letter {
                    'A' => ChangeStatus::Added,
                    'D' => ChangeStatus::Deleted,
                    'M' | 'T' => ChangeStatus::Modified,
                    _ => {
                        warn!(status = code, path, "Unknown change status, treating as modified");
                        ChangeStatus::Modified
                    }
                };
                entries.push(ChangeEntry::new(path, status));
            }
        }
    }

    entries
}

/// Parse NUL-separated `git diff --numstat -z` output, keyed by the new path
pub fn parse_numstat(output: &str) -> HashMap<String, NumstatRow> {
    let mut rows = HashMap::new();
    let mut tokens = output.split('\0');

    while let Some(record) = tokens.next() {
        let record = record.trim_start_matches('\n');
        if record.is_empty() {
            continue;
        }

        let mut fields = record.splitn(3, '\t');
        let (Some(added), Some(deleted), Some(path)) = (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };

        let path = if path.is_empty() {
            // renames: "<added>\t<deleted>\t\0<old>\0<new>\0"
            let _old = tokens.next();
            match tokens.next() {
                Some(new_path) => new_path,
                None => break,
            }
        } else {
            path
        };

        let row = match (added.parse::<u64>(), deleted.parse::<u64>()) {
            (Ok(insertions), Ok(deletions)) => NumstatRow {
                lines: Some(LineStats {
                    insertions,
                    deletions,
                }),
                is_binary: false,
            },
            _ => NumstatRow {
                lines: None,
                is_binary: added == "-" && deleted == "-",
            },
        };
        rows.insert(path.to_string(), row);
    }

    rows
}

/// Parse `git log --format=%h%x09%s` output
pub fn parse_log(output: &str) -> Vec<CommitInfo> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| match line.split_once('\t') {
            Some((id, subject)) => CommitInfo {
                short_id: id.to_string(),
                subject: subject.to_string(),
            },
            None => CommitInfo {
                short_id: line.to_string(),
                subject: String::new(),
            },
        })
        .collect()
}
