//! Blocking access to the host `git` binary

use crate::error::{ReportError, ReportResult};
use std::io;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// Raw result of one git invocation
#[derive(Debug, Clone, Default)]
pub struct GitOutput {
    pub success: bool,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

/// Executes git with the given arguments and hands back its raw output.
pub trait CommandRunner {
    fn run(&self, args: &[&str]) -> io::Result<GitOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, args: &[&str]) -> io::Result<GitOutput> {
        (**self).run(args)
    }
}

/// Runs the `git` found on PATH inside a working directory
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }
}

impl CommandRunner for GitCli {
    fn run(&self, args: &[&str]) -> io::Result<GitOutput> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()?;

        Ok(GitOutput {
            success: output.status.success(),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Convenience layer over a [`CommandRunner`]
pub struct Git<R> {
    runner: R,
}

impl<R: CommandRunner> Git<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    fn exec(&self, args: &[&str]) -> ReportResult<GitOutput> {
        debug!(command = %args.join(" "), "git");
        self.runner.run(args).map_err(ReportError::Spawn)
    }

    /// Stdout bytes, or an error carrying stderr on a non-zero exit
    pub fn bytes(&self, args: &[&str]) -> ReportResult<Vec<u8>> {
        let output = self.exec(args)?;
        if output.success {
            Ok(output.stdout)
        } else {
            Err(ReportError::Git {
                command: args.join(" "),
                stderr: output.stderr,
            })
        }
    }

    /// Trimmed stdout text
    pub fn text(&self, args: &[&str]) -> ReportResult<String> {
        let stdout = self.bytes(args)?;
        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }

    /// Like [`Git::text`] but a failing command is `None` instead of an error
    pub fn probe(&self, args: &[&str]) -> ReportResult<Option<String>> {
        let output = self.exec(args)?;
        if !output.success {
            return Ok(None);
        }
        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(if text.is_empty() { None } else { Some(text) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRunner;

    #[test]
    fn test_text_trims_stdout() {
        let runner = ScriptedRunner::new().ok("rev-parse HEAD", "abc123\n");
        let git = Git::new(runner);
        assert_eq!(git.text(&["rev-parse", "HEAD"]).unwrap(), "abc123");
    }

    #[test]
    fn test_failure_carries_command_and_stderr() {
        let runner = ScriptedRunner::new().fail("show HEAD:gone.txt", "fatal: path not found");
        let git = Git::new(runner);

        let err = git.text(&["show", "HEAD:gone.txt"]).unwrap_err();
        match err {
            ReportError::Git { command, stderr } => {
                assert_eq!(command, "show HEAD:gone.txt");
                assert!(stderr.contains("path not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_probe_maps_failure_and_empty_to_none() {
        let runner = ScriptedRunner::new()
            .fail("merge-base HEAD main", "")
            .ok("merge-base HEAD master", "")
            .ok("merge-base HEAD develop", "deadbeef\n");
        let git = Git::new(runner);

        assert_eq!(git.probe(&["merge-base", "HEAD", "main"]).unwrap(), None);
        assert_eq!(git.probe(&["merge-base", "HEAD", "master"]).unwrap(), None);
        assert_eq!(
            git.probe(&["merge-base", "HEAD", "develop"]).unwrap(),
            Some("deadbeef".to_string())
        );
    }

    #[test]
    fn test_git_cli_reports_spawn_failure_for_missing_dir() {
        let git = Git::new(GitCli::new("/definitely/not/a/dir/pr2md"));
        let err = git.text(&["status"]).unwrap_err();
        assert!(matches!(err, ReportError::Spawn(_)));
    }
}
