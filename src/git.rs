//! Thin wrappers over the `git` binary.

use crate::error::{Error, Result};
use std::path::Path;
use std::process::Output;
use tracing::{debug, warn};

async fn output(repo: Option<&Path>, args: &[&str]) -> std::io::Result<Output> {
    let mut cmd = tokio::process::Command::new("git");
    if let Some(repo) = repo {
        cmd.current_dir(repo);
    }
    cmd.args(args).output().await
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

/// Run `git` in the current directory and return non-empty stdout lines,
/// or `None` when the command could not run or exited non-zero.
pub async fn lines(args: &[&str]) -> Option<Vec<String>> {
    let output = output(None, args).await.ok()?;
    if !output.status.success() {
        warn!(
            args = %args.join(" "),
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "git command failed"
        );
        return None;
    }
    Some(stdout_lines(&output))
}

/// Run `git` inside `repo`; a non-zero exit is an [`Error::Git`] carrying stderr.
pub async fn run(repo: &Path, args: &[&str]) -> Result<String> {
    debug!(repo = %repo.display(), args = %args.join(" "), "running git");
    let output = output(Some(repo), args)
        .await
        .map_err(|e| Error::git(format!("failed to spawn git: {e}")))?;
    if !output.status.success() {
        return Err(Error::git(format!(
            "`git {}` exited with {}: {}",
            args.join(" "),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// `git config user.name`, if set.
pub async fn user_name() -> Option<String> {
    lines(&["config", "user.name"]).await?.into_iter().next()
}

/// Current branch, or `None` on a detached HEAD.
pub async fn current_branch() -> Option<String> {
    lines(&["branch", "--show-current"]).await?.into_iter().next()
}
