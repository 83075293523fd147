use anyhow::Result;
use clap::Parser;
use my_package::config::{Config, SizeCheckConfig};
use my_package::release::{self, ReleaseOptions};
use my_package::version::BumpKind;
use my_package::{changes, changeset, ci, size_check, version};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "my-package",
    version,
    about = "Package template: example functions plus source-size, changelog and release helpers"
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, default_value = "my-package.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the basic usage example: arithmetic, then a cancellable delay
    Demo {
        /// Seconds to wait in the delay example
        #[arg(long, default_value_t = 1.0)]
        seconds: f64,
    },

    /// Fail if any source file is longer than the line limit
    CheckSize {
        /// Directory to scan (default: size_check.root from config)
        root: Option<PathBuf>,

        /// Maximum allowed lines per file
        #[arg(long)]
        max_lines: Option<usize>,

        /// Extension to include, repeatable (default: size_check.extensions)
        #[arg(long = "ext")]
        extensions: Vec<String>,

        /// Print the report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Validate pending changelog fragments
    ValidateChangeset {
        /// Fragment directory (default: changelog.dir from config)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Create a changelog fragment
    NewFragment {
        kind: BumpKind,

        /// One-line description; omit to write an editable template
        #[arg(short, long)]
        description: Option<String>,

        /// Fragment directory (default: changelog.dir from config)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Bump the manifest version and add a CHANGELOG entry
    Bump {
        kind: BumpKind,

        /// Description for the CHANGELOG entry
        #[arg(short, long)]
        description: Option<String>,

        /// Manifest holding the version (default: package.manifest from config)
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Changelog file (default: changelog.file from config)
        #[arg(long)]
        changelog: Option<PathBuf>,
    },

    /// Bump, commit and push a release; safe to re-run after a partial failure
    Release {
        kind: BumpKind,

        /// Description for the CHANGELOG entry
        #[arg(short, long)]
        description: Option<String>,

        /// Repository root
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Remote to fetch from and push to
        #[arg(long, default_value = "origin")]
        remote: String,

        /// Branch releases are committed to
        #[arg(long, default_value = "main")]
        branch: String,

        /// Commit as github-actions[bot]
        #[arg(long)]
        bot_identity: bool,

        /// Also create and push a v<version> tag
        #[arg(long)]
        tag: bool,
    },

    /// Classify files changed by this push or PR into CI outputs
    DetectChanges {
        /// Print the summary as JSON instead of name=value lines
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("my_package=info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = Config::load_or_default(&cli.config)?;
    cfg.validate()?;

    match cli.command {
        Command::Demo { seconds } => run_demo(seconds).await,
        Command::CheckSize {
            root,
            max_lines,
            extensions,
            json,
        } => {
            let mut size_cfg = cfg.size_check;
            if let Some(max) = max_lines {
                size_cfg.max_lines = max;
            }
            if !extensions.is_empty() {
                size_cfg.extensions = extensions;
            }
            size_cfg.validate()?;
            let root = root.unwrap_or_else(|| size_cfg.root.clone());
            check_size(&root, &size_cfg, json)
        }
        Command::ValidateChangeset { dir } => {
            let dir = dir.unwrap_or(cfg.changelog.dir);
            validate_changeset(&dir)
        }
        Command::NewFragment {
            kind,
            description,
            dir,
        } => {
            let dir = dir.unwrap_or(cfg.changelog.dir);
            let author = changeset::detect_author().await;
            let branch = changeset::detect_branch().await;
            let now = chrono::Local::now().naive_local();
            let path = changeset::new_fragment(
                &dir,
                kind,
                description.as_deref(),
                &author,
                &branch,
                now,
            )?;
            println!("Created changelog fragment: {}", path.display());
            if description.is_none() {
                println!("Edit the fragment to document your changes.");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Bump {
            kind,
            description,
            manifest,
            changelog,
        } => {
            let manifest = manifest.unwrap_or(cfg.package.manifest);
            let changelog = changelog.unwrap_or(cfg.changelog.file);
            bump(kind, description.as_deref(), &manifest, &changelog)
        }
        Command::Release {
            kind,
            description,
            repo,
            remote,
            branch,
            bot_identity,
            tag,
        } => {
            let opts = ReleaseOptions {
                repo,
                manifest: cfg.package.manifest,
                changelog: cfg.changelog.file,
                kind,
                description,
                remote,
                branch,
                bot_identity,
                tag,
                date: today(),
            };
            let outcome = release::release(&opts).await?;
            if outcome.already_released {
                println!("Version bump already completed in a previous run");
            }
            ci::set_outputs(&outcome.outputs(), ci::output_file_from_env().as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Command::DetectChanges { json } => {
            let files = changes::changed_files().await;
            let summary = changes::ChangeSummary::classify(&files);
            info!(
                files = summary.files.len(),
                code_files = summary.code_files.len(),
                "change detection complete"
            );
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                summary.emit(ci::output_file_from_env().as_deref())?;
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_demo(seconds: f64) -> Result<ExitCode> {
    println!("Example 1: Basic arithmetic");
    println!("2 + 3 = {}", my_package::add(2, 3));
    println!("2 * 3 = {}", my_package::multiply(2, 3));
    println!();

    println!("Example 2: Working with floats");
    println!("2.5 + 3.5 = {}", my_package::add(2.5, 3.5));
    println!("2.5 * 2 = {}", my_package::multiply(2.5, 2.0));
    println!();

    println!("Example 3: Async delay");
    println!("Waiting for {seconds} second(s)... (Ctrl-C to cancel)");
    let token = CancellationToken::new();
    let handle = my_package::delay::spawn_delay_with_token(seconds, token.child_token());
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    match handle.wait().await {
        Ok(()) => {
            println!("Done!");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_cancelled() => {
            println!("Cancelled.");
            Ok(ExitCode::from(130))
        }
        Err(e) => Err(e.into()),
    }
}

fn check_size(root: &Path, cfg: &SizeCheckConfig, json: bool) -> Result<ExitCode> {
    let report = size_check::check_file_sizes(root, cfg)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    if report.passed() {
        return Ok(ExitCode::SUCCESS);
    }

    eprintln!(
        "{} file(s) over {} lines or unreadable:",
        report.oversized.len() + report.failures.len(),
        report.max_lines
    );
    for line in report.diagnostics() {
        eprintln!("  {line}");
    }
    Ok(ExitCode::FAILURE)
}

fn validate_changeset(dir: &Path) -> Result<ExitCode> {
    let report = changeset::validate_dir(dir)?;
    println!("Found {} changelog fragment(s)", report.fragment_count());

    if report.fragment_count() == 0 {
        println!();
        println!("WARNING: No changelog fragment found!");
        println!("Create one with: my-package new-fragment patch --description 'Your changes'");
        return Ok(ExitCode::SUCCESS);
    }

    for outcome in &report.outcomes {
        let name = outcome
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match &outcome.problem {
            None => println!("  [OK] {name}"),
            Some(problem) => println!("  [FAIL] {name}: {problem}"),
        }
    }
    println!();

    if report.passed() {
        println!("Changelog validation passed!");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("Changelog validation FAILED!");
        println!();
        println!("Expected fragment format:");
        println!();
        println!("  ### Added");
        println!("  - Description of new feature");
        println!();
        println!("  ### Fixed");
        println!("  - Description of bug fix");
        Ok(ExitCode::FAILURE)
    }
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

fn bump(
    kind: BumpKind,
    description: Option<&str>,
    manifest_path: &Path,
    changelog_path: &Path,
) -> Result<ExitCode> {
    let bumped = version::bump_files(manifest_path, changelog_path, kind, description, &today())?;
    let (old, new) = (&bumped.old, &bumped.new);
    println!("Current version: {old}");
    println!("New version: {new}");
    println!("Updated {}: {old} -> {new}", manifest_path.display());
    if bumped.changelog_updated {
        println!("Updated {}", changelog_path.display());
    }

    println!();
    println!("Version bump complete: {old} -> {new}");
    println!("Next steps:");
    println!("  1. Review changes: git diff");
    println!("  2. Commit: git commit -am 'chore: bump version to {new}'");
    println!("  3. Tag: git tag v{new}");
    println!("  4. Push: git push && git push --tags");
    Ok(ExitCode::SUCCESS)
}
