//! Changelog fragments: one pending entry per change, merged at release time.

use crate::error::{Error, Result};
use crate::git;
use crate::version::BumpKind;
use chrono::NaiveDateTime;
use fancy_regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{info, warn};

const CATEGORIES: &[&str] = &["Added", "Changed", "Deprecated", "Fixed", "Removed", "Security"];

static CATEGORY_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^###\s*(Added|Changed|Deprecated|Fixed|Removed|Security)")
        .expect("category regex is valid")
});

static HTML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment regex is valid"));

const TEMPLATE: &str = "<!--
Uncomment the relevant sections below and describe your changes.
Delete any sections you don't need.
-->

### Added

- New feature description

### Changed

- Change to existing functionality

### Fixed

- Bug fix description

<!--
### Removed

- Removed feature

### Deprecated

- Deprecated feature

### Security

- Security fix
-->
";

/// Why a fragment was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentProblem {
    Empty,
    MissingCategory,
    NoContent,
}

impl std::fmt::Display for FragmentProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "fragment is empty"),
            Self::MissingCategory => write!(
                f,
                "missing category heading, expected one of: {}",
                CATEGORIES
                    .iter()
                    .map(|c| format!("### {c}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::NoContent => write!(f, "no description under any category"),
        }
    }
}

#[derive(Debug)]
pub struct FragmentOutcome {
    pub path: PathBuf,
    pub problem: Option<FragmentProblem>,
}

#[derive(Debug, Default)]
pub struct FragmentReport {
    pub outcomes: Vec<FragmentOutcome>,
}

impl FragmentReport {
    pub fn fragment_count(&self) -> usize {
        self.outcomes.len()
    }

    /// An empty report passes; missing fragments are only worth a warning.
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.problem.is_none())
    }
}

/// Fragment files directly under `dir`, sorted by name. A missing `dir`
/// yields no fragments.
pub fn fragment_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if path.is_file() && name.ends_with(".md") && name != "README.md" {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub fn validate_fragment(content: &str) -> std::result::Result<(), FragmentProblem> {
    let content = content.trim();
    if content.is_empty() {
        return Err(FragmentProblem::Empty);
    }
    if !CATEGORY_HEADING.is_match(content).unwrap_or(false) {
        return Err(FragmentProblem::MissingCategory);
    }

    let uncommented = HTML_COMMENT.replace_all(content, "");
    let has_body = uncommented
        .lines()
        .map(str::trim)
        .any(|line| !line.is_empty() && !line.starts_with('#'));
    if !has_body {
        return Err(FragmentProblem::NoContent);
    }
    Ok(())
}

/// Validate every fragment in `dir`.
pub fn validate_dir(dir: &Path) -> Result<FragmentReport> {
    let files = fragment_files(dir)?;
    info!(dir = %dir.display(), count = files.len(), "validating changelog fragments");
    if files.is_empty() {
        warn!("no changelog fragment found");
    } else if files.len() > 1 {
        warn!(count = files.len(), "more than one fragment; PRs usually carry one");
    }

    let mut report = FragmentReport::default();
    for path in files {
        let content = std::fs::read_to_string(&path)?;
        let problem = validate_fragment(&content).err();
        report.outcomes.push(FragmentOutcome { path, problem });
    }
    Ok(report)
}

/// Changelog category implied by a release kind.
pub fn category_for(kind: BumpKind) -> &'static str {
    match kind {
        BumpKind::Major => "Changed",
        BumpKind::Minor => "Added",
        BumpKind::Patch => "Fixed",
    }
}

/// Replace anything outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub fn fragment_file_name(now: NaiveDateTime, author: &str, branch: &str) -> String {
    format!(
        "{}_{}_{}.md",
        now.format("%Y%m%d_%H%M%S"),
        sanitize(author).to_lowercase(),
        sanitize(branch)
    )
}

pub fn fragment_body(kind: BumpKind, description: Option<&str>) -> String {
    match description.map(str::trim).filter(|d| !d.is_empty()) {
        Some(desc) => format!("### {}\n\n- {desc}\n", category_for(kind)),
        None => TEMPLATE.to_string(),
    }
}

/// Fragment author: git `user.name`, then `$USER`/`$USERNAME`, then `user`.
pub async fn detect_author() -> String {
    if let Some(name) = git::user_name().await {
        return name;
    }
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "user".into())
}

pub async fn detect_branch() -> String {
    git::current_branch()
        .await
        .unwrap_or_else(|| "manual".into())
}

/// Write a new fragment into `dir`, creating it if needed.
pub fn new_fragment(
    dir: &Path,
    kind: BumpKind,
    description: Option<&str>,
    author: &str,
    branch: &str,
    now: NaiveDateTime,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(fragment_file_name(now, author, branch));
    if path.exists() {
        return Err(Error::invalid_argument(format!(
            "fragment {} already exists",
            path.display()
        )));
    }
    std::fs::write(&path, fragment_body(kind, description))?;
    info!(path = %path.display(), %kind, "created changelog fragment");
    Ok(path)
}
