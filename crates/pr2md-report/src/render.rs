//! Content rendering: full text for new files, unified diffs for modified ones

use crate::error::ReportResult;
use crate::git::{CommandRunner, Git};
use crate::types::{ChangeEntry, RenderedBody, RenderedFile, ResolvedRefs};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::warn;

static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -\d+(?:,\d+)? \+\d+(?:,\d+)? @@").expect("hunk header regex is valid")
});

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub context_lines: u32,
    /// Unchanged lines kept in a row before the middle of the run is
    /// collapsed; 0 keeps everything
    pub max_unchanged_lines: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            context_lines: 3,
            max_unchanged_lines: 10,
        }
    }
}

pub struct ContentRenderer {
    options: RenderOptions,
}

impl ContentRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Full content of a new file from the blob fetched at the current commit
    pub fn render_full(&self, entry: ChangeEntry, blob: ReportResult<Vec<u8>>) -> RenderedFile {
        let body = match blob {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) => RenderedBody::Content {
                    language: language_for(&entry.path),
                    text,
                },
                Err(_) => {
                    warn!(path = %entry.path, "File content is not valid UTF-8");
                    RenderedBody::Unavailable(
                        "Could not read file content: not valid UTF-8".to_string(),
                    )
                }
            },
            Err(e) => {
                warn!(path = %entry.path, error = %e, "Failed to fetch file content");
                RenderedBody::Unavailable("Could not read file content".to_string())
            }
        };

        RenderedFile {
            entry,
            body,
            truncated: false,
        }
    }

    /// Unified diff of a modified file between base and current
    pub fn render_diff<R: CommandRunner>(
        &self,
        git: &Git<R>,
        refs: &ResolvedRefs,
        entry: ChangeEntry,
    ) -> RenderedFile {
        let unified = format!("--unified={}", self.options.context_lines);
        let range = refs.range();
        let result = git.bytes(&[
            "diff",
            "--no-color",
            "--no-ext-diff",
            unified.as_str(),
            range.as_str(),
            "--",
            entry.path.as_str(),
        ]);

        let (body, truncated) = match result {
            Ok(bytes) => {
                let diff = String::from_utf8_lossy(&bytes);
                match format_diff(&diff, self.options.max_unchanged_lines) {
                    Some((text, truncated)) => (RenderedBody::Diff(text), truncated),
                    None => (RenderedBody::NoDiff, false),
                }
            }
            Err(e) => {
                warn!(path = %entry.path, error = %e, "Failed to generate diff");
                (
                    RenderedBody::Unavailable("Could not generate diff".to_string()),
                    false,
                )
            }
        };

        RenderedFile {
            entry,
            body,
            truncated,
        }
    }
}

/// Strip the diff preamble and collapse long unchanged runs.
///
/// Returns `None` when there is no hunk (binary or mode-only changes),
/// otherwise the hunks and whether anything was collapsed.
pub fn format_diff(diff: &str, max_unchanged_lines: usize) -> Option<(String, bool)> {
    let lines: Vec<&str> = diff.lines().collect();
    let start = lines.iter().position(|line| HUNK_HEADER.is_match(line))?;

    let mut result = Vec::new();
    let mut unchanged: Vec<&str> = Vec::new();
    let mut truncated = false;

    for &line in &lines[start..] {
        if line.starts_with(' ') || line.is_empty() {
            unchanged.push(line);
            continue;
        }
        truncated |= flush_unchanged(&mut result, &mut unchanged, max_unchanged_lines);
        result.push(line.to_string());
    }
    truncated |= flush_unchanged(&mut result, &mut unchanged, max_unchanged_lines);

    Some((result.join("\n"), truncated))
}

/// Move a run of context lines into `result`, keeping its head and tail
/// when it is longer than `max`
fn flush_unchanged(result: &mut Vec<String>, run: &mut Vec<&str>, max: usize) -> bool {
    let collapse = max > 0 && run.len() > max;

    if collapse {
        let head = max.div_ceil(2);
        let tail = max / 2;
        let hidden = run.len() - head - tail;

        result.extend(run[..head].iter().map(|l| l.to_string()));
        result.push(format!("... ({} lines unchanged) ...", hidden));
        result.extend(run[run.len() - tail..].iter().map(|l| l.to_string()));
    } else {
        result.extend(run.iter().map(|l| l.to_string()));
    }

    run.clear();
    collapse
}

/// Fence language for syntax highlighting, empty when unknown
pub fn language_for(path: &str) -> &'static str {
    let path = Path::new(path);
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    if file_name == "Dockerfile" {
        return "dockerfile";
    }
    if file_name == "Makefile" {
        return "makefile";
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "py" => "python",
        "js" | "mjs" | "cjs" => "javascript",
        "ts" => "typescript",
        "tsx" => "tsx",
        "jsx" => "jsx",
        "java" => "java",
        "cpp" | "cc" | "hpp" => "cpp",
        "c" | "h" => "c",
        "rs" => "rust",
        "go" => "go",
        "rb" => "ruby",
        "php" => "php",
        "sql" => "sql",
        "html" => "html",
        "css" => "css",
        "scss" => "scss",
        "json" => "json",
        "xml" => "xml",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "md" => "markdown",
        "sh" | "bash" => "bash",
        "tf" => "hcl",
        "dockerfile" => "dockerfile",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use crate::testing::ScriptedRunner;
    use crate::types::ChangeStatus;

    fn refs() -> ResolvedRefs {
        ResolvedRefs {
            base_ref: "main".to_string(),
            base_commit: "base".to_string(),
            current_ref: "topic".to_string(),
            current_commit: "head".to_string(),
        }
    }

    const MODIFIED_DIFF: &str = r#"diff --git a/modified.txt b/modified.txt
index 1234567..abcdef0 100644
--- a/modified.txt
+++ b/modified.txt
@@ -1,3 +1,4 @@
 Existing line 1
-Old line 2
+Modified line 2
 Existing line 3
+Added line 4"#;

    #[test]
    fn test_language_for() {
        assert_eq!(language_for("src/main.rs"), "rust");
        assert_eq!(language_for("app/View.TSX"), "tsx");
        assert_eq!(language_for("infra/main.tf"), "hcl");
        assert_eq!(language_for("docker/Dockerfile"), "dockerfile");
        assert_eq!(language_for("config.yml"), "yaml");
        assert_eq!(language_for("LICENSE"), "");
    }

    #[test]
    fn test_format_diff_strips_preamble() {
        let (text, truncated) = format_diff(MODIFIED_DIFF, 10).unwrap();
        assert!(text.starts_with("@@ -1,3 +1,4 @@"));
        assert!(!text.contains("index 1234567"));
        assert!(!text.contains("+++ b/modified.txt"));
        assert!(text.contains("-Old line 2"));
        assert!(text.contains("+Added line 4"));
        assert!(!truncated);
    }

    #[test]
    fn test_format_diff_without_hunks() {
        let diff = "diff --git a/logo.png b/logo.png\nindex 1..2 100644\nBinary files a/logo.png and b/logo.png differ";
        assert!(format_diff(diff, 10).is_none());
        assert!(format_diff("", 10).is_none());
    }

    #[test]
    fn test_format_diff_collapses_long_unchanged_runs() {
        let mut diff = String::from("@@ -1,30 +1,30 @@\n-old\n+new\n");
        for i in 1..=20 {
            diff.push_str(&format!(" context {}\n", i));
        }
        diff.push_str("+tail\n");

        let (text, truncated) = format_diff(&diff, 4).unwrap();
        assert!(truncated);
        assert!(text.contains(" context 1\n context 2\n... (16 lines unchanged) ...\n context 19\n context 20\n+tail"));
        assert!(!text.contains(" context 10"));
    }

    #[test]
    fn test_format_diff_zero_keeps_everything() {
        let mut diff = String::from("@@ -1,30 +1,30 @@\n+x\n");
        for i in 1..=30 {
            diff.push_str(&format!(" line {}\n", i));
        }
        let (text, truncated) = format_diff(&diff, 0).unwrap();
        assert!(!truncated);
        assert!(text.contains(" line 15"));
    }

    #[test]
    fn test_render_full_utf8_and_binary_fallback() {
        let renderer = ContentRenderer::new(RenderOptions::default());

        let file = renderer.render_full(
            ChangeEntry::new("a.py", ChangeStatus::Added),
            Ok(b"print('hi')\n".to_vec()),
        );
        assert_eq!(
            file.body,
            RenderedBody::Content {
                language: "python",
                text: "print('hi')\n".to_string()
            }
        );

        let file = renderer.render_full(
            ChangeEntry::new("latin1.txt", ChangeStatus::Added),
            Ok(vec![0x63, 0x61, 0x66, 0xe9]),
        );
        assert!(matches!(file.body, RenderedBody::Unavailable(note) if note.contains("UTF-8")));

        let file = renderer.render_full(
            ChangeEntry::new("gone.txt", ChangeStatus::Added),
            Err(ReportError::Git {
                command: "cat-file blob head:gone.txt".to_string(),
                stderr: "fatal: path 'gone.txt' does not exist".to_string(),
            }),
        );
        assert_eq!(
            file.body,
            RenderedBody::Unavailable("Could not read file content".to_string())
        );
    }

    #[test]
    fn test_render_diff_uses_context_lines() {
        let runner = ScriptedRunner::new().ok(
            "diff --no-color --no-ext-diff --unified=5 base..head -- modified.txt",
            MODIFIED_DIFF,
        );
        let renderer = ContentRenderer::new(RenderOptions {
            context_lines: 5,
            max_unchanged_lines: 10,
        });

        let file = renderer.render_diff(
            &Git::new(runner),
            &refs(),
            ChangeEntry::new("modified.txt", ChangeStatus::Modified),
        );
        assert!(matches!(&file.body, RenderedBody::Diff(text) if text.contains("+Modified line 2")));
    }

    #[test]
    fn test_render_diff_without_hunks() {
        let runner = ScriptedRunner::new().ok(
            "diff --no-color --no-ext-diff --unified=3 base..head -- run.sh",
            "diff --git a/run.sh b/run.sh\nold mode 100644\nnew mode 100755\n",
        );
        let renderer = ContentRenderer::new(RenderOptions::default());
        let file = renderer.render_diff(
            &Git::new(runner),
            &refs(),
            ChangeEntry::new("run.sh", ChangeStatus::Modified),
        );
        assert_eq!(file.body, RenderedBody::NoDiff);
        assert!(!file.truncated);
    }

    #[test]
    fn test_render_diff_failure_is_a_placeholder() {
        let renderer = ContentRenderer::new(RenderOptions::default());
        let file = renderer.render_diff(
            &Git::new(ScriptedRunner::new()),
            &refs(),
            ChangeEntry::new("racy.txt", ChangeStatus::Modified),
        );
        assert_eq!(
            file.body,
            RenderedBody::Unavailable("Could not generate diff".to_string())
        );
    }
}
