//! Base/current revision resolution

use crate::error::{ReportError, ReportResult};
use crate::git::{CommandRunner, Git};
use crate::types::ResolvedRefs;
use tracing::{debug, info};

/// What the user asked to compare
#[derive(Debug, Clone, Default)]
pub struct RefRequest {
    /// Branch or ref; the comparison starts at its merge base with current
    pub base: Option<String>,
    /// Exact commit to compare against
    pub base_commit: Option<String>,
    /// Defaults to `HEAD`
    pub current: Option<String>,
}

pub struct RefResolver {
    candidates: Vec<String>,
}

impl RefResolver {
    /// `candidates` are the branches probed, in order, when no base is given
    pub fn new(candidates: Vec<String>) -> Self {
        Self { candidates }
    }

    pub fn resolve<R: CommandRunner>(
        &self,
        git: &Git<R>,
        request: &RefRequest,
    ) -> ReportResult<ResolvedRefs> {
        ensure_repository(git)?;

        let current_spec = request.current.as_deref().unwrap_or("HEAD");
        let current_commit = verify_commit(git, current_spec)?;
        let current_ref = match &request.current {
            Some(name) => name.clone(),
            None => current_label(git)?,
        };

        let (base_ref, base_commit) = if let Some(commit) = &request.base_commit {
            (commit.clone(), verify_commit(git, commit)?)
        } else if let Some(base) = &request.base {
            verify_commit(git, base)?;
            let merge_base = git
                .probe(&["merge-base", base.as_str(), current_commit.as_str()])?
                .ok_or_else(|| ReportError::InvalidRef {
                    reference: base.clone(),
                    reason: format!("no merge base with {}", current_ref),
                })?;
            (base.clone(), merge_base)
        } else {
            self.detect_base(git, &current_commit)?
        };

        info!(
            base = %base_ref,
            base_commit = %base_commit,
            current = %current_ref,
            current_commit = %current_commit,
            "Resolved comparison range"
        );

        Ok(ResolvedRefs {
            base_ref,
            base_commit,
            current_ref,
            current_commit,
        })
    }

    fn detect_base<R: CommandRunner>(
        &self,
        git: &Git<R>,
        current_commit: &str,
    ) -> ReportResult<(String, String)> {
        for candidate in &self.candidates {
            let merge_base = git.probe(&["merge-base", candidate.as_str(), current_commit])?;
            if let Some(merge_base) = merge_base {
                info!(branch = %candidate, "Auto-detected base branch");
                return Ok((candidate.clone(), merge_base));
            }
            debug!(branch = %candidate, "No merge base with candidate branch");
        }
        Err(ReportError::NoBaseBranch(self.candidates.clone()))
    }
}

fn ensure_repository<R: CommandRunner>(git: &Git<R>) -> ReportResult<()> {
    match git.text(&["rev-parse", "--git-dir"]) {
        Ok(_) => Ok(()),
        Err(ReportError::Git { stderr, .. }) => Err(ReportError::NotARepository(stderr)),
        Err(e) => Err(e),
    }
}

/// Full commit id for `reference`
fn verify_commit<R: CommandRunner>(git: &Git<R>, reference: &str) -> ReportResult<String> {
    let spec = format!("{}^{{commit}}", reference);
    git.probe(&["rev-parse", "--verify", "--quiet", spec.as_str()])?
        .ok_or_else(|| ReportError::InvalidRef {
            reference: reference.to_string(),
            reason: "not a commit in this repository".to_string(),
        })
}

/// Active branch name; `tag:<name>` or `commit:<sha>` on a detached HEAD
fn current_label<R: CommandRunner>(git: &Git<R>) -> ReportResult<String> {
    if let Some(branch) = git.probe(&["rev-parse", "--abbrev-ref", "HEAD"])? {
        if branch != "HEAD" {
            return Ok(branch);
        }
    }

    if let Some(tag) = git.probe(&["describe", "--tags", "--exact-match", "HEAD"])? {
        return Ok(format!("tag:{}", tag));
    }

    Ok(match git.probe(&["rev-parse", "--short", "HEAD"])? {
        Some(sha) => format!("commit:{}", sha),
        None => "unknown".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRunner;

    const HEAD: &str = "1111111111111111111111111111111111111111";
    const MAIN_BASE: &str = "2222222222222222222222222222222222222222";

    fn repo() -> ScriptedRunner {
        ScriptedRunner::new()
            .ok("rev-parse --git-dir", ".git\n")
            .ok("rev-parse --verify --quiet HEAD^{commit}", &format!("{HEAD}\n"))
            .ok("rev-parse --abbrev-ref HEAD", "feature/login\n")
    }

    fn resolver() -> RefResolver {
        RefResolver::new(vec![
            "main".to_string(),
            "master".to_string(),
            "develop".to_string(),
        ])
    }

    #[test]
    fn test_not_a_repository() {
        let runner = ScriptedRunner::new().fail(
            "rev-parse --git-dir",
            "fatal: not a git repository (or any of the parent directories): .git",
        );
        let err = resolver()
            .resolve(&Git::new(runner), &RefRequest::default())
            .unwrap_err();
        assert!(matches!(err, ReportError::NotARepository(msg) if msg.contains("not a git repository")));
    }

    #[test]
    fn test_auto_detects_first_candidate_with_merge_base() {
        let runner = repo()
            .fail(&format!("merge-base main {HEAD}"), "fatal: Not a valid object name main")
            .ok(&format!("merge-base master {HEAD}"), &format!("{MAIN_BASE}\n"));

        let refs = resolver()
            .resolve(&Git::new(&runner), &RefRequest::default())
            .unwrap();

        assert_eq!(refs.base_ref, "master");
        assert_eq!(refs.base_commit, MAIN_BASE);
        assert_eq!(refs.current_ref, "feature/login");
        assert_eq!(refs.current_commit, HEAD);
        assert!(!runner.calls().iter().any(|c| c.contains("develop")));
    }

    #[test]
    fn test_no_candidate_is_fatal() {
        let err = resolver()
            .resolve(&Git::new(repo()), &RefRequest::default())
            .unwrap_err();
        match err {
            ReportError::NoBaseBranch(tried) => assert_eq!(tried, vec!["main", "master", "develop"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_explicit_base_uses_merge_base() {
        let runner = repo()
            .ok("rev-parse --verify --quiet develop^{commit}", "3333\n")
            .ok(&format!("merge-base develop {HEAD}"), &format!("{MAIN_BASE}\n"));
        let request = RefRequest {
            base: Some("develop".to_string()),
            ..Default::default()
        };

        let refs = resolver().resolve(&Git::new(runner), &request).unwrap();
        assert_eq!(refs.base_ref, "develop");
        assert_eq!(refs.base_commit, MAIN_BASE);
    }

    #[test]
    fn test_unknown_base_is_invalid_ref() {
        let request = RefRequest {
            base: Some("nope".to_string()),
            ..Default::default()
        };
        let err = resolver().resolve(&Git::new(repo()), &request).unwrap_err();
        assert!(matches!(err, ReportError::InvalidRef { reference, .. } if reference == "nope"));
    }

    #[test]
    fn test_base_commit_is_compared_directly() {
        let runner = repo().ok("rev-parse --verify --quiet abc123^{commit}", "abc123ffff\n");
        let request = RefRequest {
            base_commit: Some("abc123".to_string()),
            base: Some("ignored".to_string()),
            ..Default::default()
        };

        let refs = resolver().resolve(&Git::new(&runner), &request).unwrap();
        assert_eq!(refs.base_ref, "abc123");
        assert_eq!(refs.base_commit, "abc123ffff");
        assert!(!runner.calls().iter().any(|c| c.starts_with("merge-base")));
    }

    #[test]
    fn test_explicit_current_keeps_its_name() {
        let runner = repo()
            .ok("rev-parse --verify --quiet v1.1.0^{commit}", "4444\n")
            .ok("rev-parse --verify --quiet v1.0.0^{commit}", "5555\n");
        let request = RefRequest {
            base_commit: Some("v1.0.0".to_string()),
            current: Some("v1.1.0".to_string()),
            ..Default::default()
        };

        let refs = resolver().resolve(&Git::new(runner), &request).unwrap();
        assert_eq!(refs.current_ref, "v1.1.0");
        assert_eq!(refs.current_commit, "4444");
    }

    #[test]
    fn test_detached_head_labels() {
        let runner = ScriptedRunner::new()
            .ok("rev-parse --abbrev-ref HEAD", "HEAD\n")
            .ok("describe --tags --exact-match HEAD", "v2.0\n");
        assert_eq!(current_label(&Git::new(runner)).unwrap(), "tag:v2.0");

        let runner = ScriptedRunner::new()
            .ok("rev-parse --abbrev-ref HEAD", "HEAD\n")
            .ok("rev-parse --short HEAD", "1a2b3c4\n");
        assert_eq!(current_label(&Git::new(runner)).unwrap(), "commit:1a2b3c4");
    }
}
