//! Semver bumps for the package manifest and the matching CHANGELOG entry.

use crate::error::{Error, Result};
use fancy_regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{info, warn};

static VERSION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^(version\s*=\s*["'])([^"']+)(["'])"#).expect("version regex is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BumpKind {
    Major,
    Minor,
    Patch,
}

impl std::fmt::Display for BumpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Major => write!(f, "major"),
            Self::Minor => write!(f, "minor"),
            Self::Patch => write!(f, "patch"),
        }
    }
}

impl BumpKind {
    /// Title-cased name used in changelog headings.
    pub fn title(self) -> &'static str {
        match self {
            Self::Major => "Major",
            Self::Minor => "Minor",
            Self::Patch => "Patch",
        }
    }

    /// Bump a plain `MAJOR.MINOR.PATCH` version.
    pub fn apply(self, current: &str) -> Result<String> {
        let parts: Vec<&str> = current.trim().split('.').collect();
        let [major, minor, patch] = parts.as_slice() else {
            return Err(Error::parse(format!("Invalid version format: {current}")));
        };
        let num = |s: &str| {
            s.parse::<u64>()
                .map_err(|_| Error::parse(format!("Invalid version format: {current}")))
        };
        let (major, minor, patch) = (num(*major)?, num(*minor)?, num(*patch)?);
        let next = |n: u64| {
            n.checked_add(1)
                .ok_or_else(|| Error::parse(format!("Invalid version format: {current}")))
        };

        Ok(match self {
            Self::Major => format!("{}.0.0", next(major)?),
            Self::Minor => format!("{major}.{}.0", next(minor)?),
            Self::Patch => format!("{major}.{minor}.{}", next(patch)?),
        })
    }
}

/// Result of [`bump_files`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bumped {
    pub old: String,
    pub new: String,
    pub changelog_updated: bool,
}

/// Bump the version in `manifest_path` and record it in `changelog_path`.
///
/// A missing changelog is skipped with a warning; a missing manifest is
/// `NotFound`. An empty description becomes `Manual <kind> release`.
pub fn bump_files(
    manifest_path: &Path,
    changelog_path: &Path,
    kind: BumpKind,
    description: Option<&str>,
    date: &str,
) -> Result<Bumped> {
    if !manifest_path.exists() {
        return Err(Error::not_found(manifest_path));
    }
    let manifest = std::fs::read_to_string(manifest_path)?;
    let old = current_version(&manifest)?;
    let new = kind.apply(&old)?;
    std::fs::write(manifest_path, set_version(&manifest, &old, &new)?)?;
    info!(manifest = %manifest_path.display(), %old, %new, "version bumped");

    let changelog_updated = if changelog_path.exists() {
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from)
            .unwrap_or_else(|| format!("Manual {kind} release"));
        let content = std::fs::read_to_string(changelog_path)?;
        std::fs::write(
            changelog_path,
            changelog_entry(&content, &new, kind, &description, date),
        )?;
        true
    } else {
        warn!(path = %changelog_path.display(), "changelog not found, skipping");
        false
    };

    Ok(Bumped {
        old,
        new,
        changelog_updated,
    })
}

/// First top-level `version = "..."` line in a manifest.
pub fn current_version(manifest: &str) -> Result<String> {
    VERSION_LINE
        .captures(manifest)
        .map_err(|e| Error::parse(e.to_string()))?
        .and_then(|c| c.get(2))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::parse("Could not find version in manifest"))
}

/// Rewrite the version line from `old` to `new`.
pub fn set_version(manifest: &str, old: &str, new: &str) -> Result<String> {
    let caps = VERSION_LINE
        .captures(manifest)
        .map_err(|e| Error::parse(e.to_string()))?;
    let Some(caps) = caps.filter(|c| c.get(2).is_some_and(|m| m.as_str() == old)) else {
        return Err(Error::parse(format!(
            "Failed to update version from {old} to {new}"
        )));
    };
    let Some(value) = caps.get(2) else {
        return Err(Error::parse("Could not find version in manifest"));
    };
    Ok(format!(
        "{}{new}{}",
        &manifest[..value.start()],
        &manifest[value.end()..]
    ))
}

/// Insert a release section for `version` into CHANGELOG content.
///
/// Goes before the newest `## ` section, else after the `# ` title, else at
/// the top.
pub fn changelog_entry(
    content: &str,
    version: &str,
    kind: BumpKind,
    description: &str,
    date: &str,
) -> String {
    let entry = format!(
        "## {version} - {date}\n\n### {} Changes\n\n- {description}\n\n",
        kind.title()
    );

    if let Some(pos) = line_start_of(content, |line| line.starts_with("## ")) {
        return format!("{}{entry}{}", &content[..pos], &content[pos..]);
    }
    if let Some(pos) = line_start_of(content, |line| line.starts_with("# ")) {
        let end = content[pos..]
            .find('\n')
            .map_or(content.len(), |off| pos + off);
        return format!("{}\n\n{entry}{}", &content[..end], &content[end..]);
    }
    format!("{entry}\n{content}")
}

fn line_start_of(content: &str, pred: impl Fn(&str) -> bool) -> Option<usize> {
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        if pred(line) {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}
