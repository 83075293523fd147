//! Classify files changed between two commits into CI gating flags.

use crate::ci;
use crate::error::Result;
use crate::git;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Paths that never count as code changes.
const EXCLUDED_PREFIXES: &[&str] = &["changelog.d/", "docs/", "experiments/", "examples/"];

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ChangeSummary {
    pub files: Vec<String>,
    pub code_files: Vec<String>,
    pub rs_changed: bool,
    pub tests_changed: bool,
    pub package_changed: bool,
    pub docs_changed: bool,
    pub workflow_changed: bool,
    pub any_code_changed: bool,
}

pub fn is_excluded_from_code_changes(path: &str) -> bool {
    path.ends_with(".md") || EXCLUDED_PREFIXES.iter().any(|p| path.starts_with(p))
}

fn is_code_file(path: &str) -> bool {
    const CODE_EXTENSIONS: &[&str] = &[".rs", ".toml", ".yml", ".yaml"];
    CODE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) || path.contains(".github/workflows/")
}

impl ChangeSummary {
    pub fn classify<S: AsRef<str>>(files: &[S]) -> Self {
        let files: Vec<String> = files.iter().map(|f| f.as_ref().to_string()).collect();
        let code_files: Vec<String> = files
            .iter()
            .filter(|f| !is_excluded_from_code_changes(f))
            .cloned()
            .collect();

        Self {
            rs_changed: files.iter().any(|f| f.ends_with(".rs")),
            tests_changed: files.iter().any(|f| f.starts_with("tests/")),
            package_changed: files.iter().any(|f| f == "Cargo.toml"),
            docs_changed: files.iter().any(|f| f.ends_with(".md")),
            workflow_changed: files.iter().any(|f| f.starts_with(".github/workflows/")),
            any_code_changed: code_files.iter().any(|f| is_code_file(f)),
            files,
            code_files,
        }
    }

    /// `(name, value)` pairs in the form CI workflows consume.
    pub fn outputs(&self) -> [(&'static str, bool); 6] {
        [
            ("rs-changed", self.rs_changed),
            ("tests-changed", self.tests_changed),
            ("package-changed", self.package_changed),
            ("docs-changed", self.docs_changed),
            ("workflow-changed", self.workflow_changed),
            ("any-code-changed", self.any_code_changed),
        ]
    }

    /// Print outputs and append them to `output_file` when given.
    pub fn emit(&self, output_file: Option<&Path>) -> Result<()> {
        ci::set_outputs(&self.outputs(), output_file)
    }
}

/// Files changed in this PR or push, per the GitHub Actions environment.
pub async fn changed_files() -> Vec<String> {
    let event = std::env::var("GITHUB_EVENT_NAME").unwrap_or_else(|_| "local".into());

    if event == "pull_request" {
        let base = std::env::var("GITHUB_BASE_SHA").ok();
        let head = std::env::var("GITHUB_HEAD_SHA").ok();
        if let (Some(base), Some(head)) = (base, head) {
            info!(%base, %head, "comparing PR");
            if git::lines(&["cat-file", "-e", &base]).await.is_none() {
                info!("base commit not available locally, fetching");
                let _ = git::lines(&["fetch", "origin", &base]).await;
            }
            let files = git::lines(&["diff", "--name-only", &base, &head])
                .await
                .unwrap_or_default();
            if !files.is_empty() {
                return files;
            }
        }
    }

    info!("comparing HEAD^ to HEAD");
    let files = git::lines(&["diff", "--name-only", "HEAD^", "HEAD"])
        .await
        .unwrap_or_default();
    if !files.is_empty() {
        return files;
    }

    info!("HEAD^ not available, listing all files in HEAD");
    git::lines(&["ls-tree", "--name-only", "-r", "HEAD"])
        .await
        .unwrap_or_default()
}
