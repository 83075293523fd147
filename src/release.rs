//! Bump, commit and push a release from CI, safe to re-run.
//!
//! A re-run after a partially failed job finds the remote branch already
//! ahead with the same manifest version and reports `already_released`
//! instead of bumping twice.

use crate::error::{Error, Result};
use crate::git;
use crate::version::{self, BumpKind};
use std::path::{Path, PathBuf};
use tracing::info;

pub const BOT_NAME: &str = "github-actions[bot]";
pub const BOT_EMAIL: &str = "github-actions[bot]@users.noreply.github.com";

#[derive(Debug, Clone)]
pub struct ReleaseOptions {
    /// Repository root; `manifest` and `changelog` are relative to it.
    pub repo: PathBuf,
    pub manifest: PathBuf,
    pub changelog: PathBuf,
    pub kind: BumpKind,
    pub description: Option<String>,
    pub remote: String,
    pub branch: String,
    /// Set the bot identity in the repo's git config before committing.
    pub bot_identity: bool,
    /// Also create and push a `v<version>` tag.
    pub tag: bool,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOutcome {
    pub version_committed: bool,
    pub already_released: bool,
    pub new_version: String,
}

impl ReleaseOutcome {
    pub fn outputs(&self) -> [(&'static str, String); 3] {
        [
            ("version_committed", self.version_committed.to_string()),
            ("already_released", self.already_released.to_string()),
            ("new_version", self.new_version.clone()),
        ]
    }
}

/// Where the remote branch stands relative to the local checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RemoteState {
    InSync,
    /// Remote moved on but carries the local version: an earlier run finished.
    AlreadyReleased(String),
    /// Remote moved on with other work; rebased onto it.
    Rebased,
}

fn manifest_spec(manifest: &Path) -> String {
    manifest.to_string_lossy().replace('\\', "/")
}

async fn remote_state(opts: &ReleaseOptions) -> Result<RemoteState> {
    let repo = opts.repo.as_path();
    let upstream = format!("{}/{}", opts.remote, opts.branch);

    git::run(repo, &["fetch", &opts.remote, &opts.branch]).await?;
    let local_head = git::run(repo, &["rev-parse", "HEAD"]).await?;
    let remote_head = git::run(repo, &["rev-parse", &upstream]).await?;
    if local_head == remote_head {
        return Ok(RemoteState::InSync);
    }
    info!(%local_head, %remote_head, "remote branch has advanced");

    let object = format!("{upstream}:{}", manifest_spec(&opts.manifest));
    let remote_manifest = git::run(repo, &["show", &object]).await?;
    let remote_version = version::current_version(&remote_manifest)?;
    let local_version =
        version::current_version(&std::fs::read_to_string(repo.join(&opts.manifest))?)?;

    if local_version == remote_version {
        info!(version = %remote_version, "versions match, previous run completed");
        Ok(RemoteState::AlreadyReleased(remote_version))
    } else {
        info!(local = %local_version, remote = %remote_version, "rebasing onto remote");
        git::run(repo, &["rebase", &upstream]).await?;
        Ok(RemoteState::Rebased)
    }
}

/// Run the release flow against `opts.repo`.
pub async fn release(opts: &ReleaseOptions) -> Result<ReleaseOutcome> {
    let repo = opts.repo.as_path();
    let manifest_path = repo.join(&opts.manifest);
    if !manifest_path.exists() {
        return Err(Error::not_found(manifest_path));
    }

    if opts.bot_identity {
        git::run(repo, &["config", "user.name", BOT_NAME]).await?;
        git::run(repo, &["config", "user.email", BOT_EMAIL]).await?;
    }

    match remote_state(opts).await? {
        RemoteState::AlreadyReleased(version) => {
            return Ok(ReleaseOutcome {
                version_committed: false,
                already_released: true,
                new_version: version,
            });
        }
        RemoteState::InSync | RemoteState::Rebased => {}
    }

    let bumped = version::bump_files(
        &manifest_path,
        &repo.join(&opts.changelog),
        opts.kind,
        opts.description.as_deref(),
        &opts.date,
    )?;

    let status = git::run(repo, &["status", "--porcelain"]).await?;
    if status.is_empty() {
        info!("no changes to commit");
        return Ok(ReleaseOutcome {
            version_committed: false,
            already_released: false,
            new_version: bumped.new,
        });
    }

    git::run(repo, &["add", "-A"]).await?;
    git::run(repo, &["commit", "-m", &bumped.new]).await?;
    git::run(repo, &["push", &opts.remote, &opts.branch]).await?;
    if opts.tag {
        let tag = format!("v{}", bumped.new);
        git::run(repo, &["tag", &tag]).await?;
        git::run(repo, &["push", &opts.remote, &tag]).await?;
    }
    info!(old = %bumped.old, new = %bumped.new, "release committed and pushed");

    Ok(ReleaseOutcome {
        version_committed: true,
        already_released: false,
        new_version: bumped.new,
    })
}
