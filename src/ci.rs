//! `name=value` step outputs for GitHub Actions.

use crate::error::Result;
use std::io::Write;
use std::path::Path;

/// Print each output and append it to `output_file` (usually `$GITHUB_OUTPUT`).
pub fn set_outputs<V: std::fmt::Display>(
    outputs: &[(&str, V)],
    output_file: Option<&Path>,
) -> Result<()> {
    let mut sink = match output_file {
        Some(path) => Some(
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?,
        ),
        None => None,
    };
    for (name, value) in outputs {
        println!("{name}={value}");
        if let Some(f) = sink.as_mut() {
            writeln!(f, "{name}={value}")?;
        }
    }
    Ok(())
}

/// Path from `$GITHUB_OUTPUT`, when running under Actions.
pub fn output_file_from_env() -> Option<std::path::PathBuf> {
    std::env::var_os("GITHUB_OUTPUT").map(std::path::PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outputs_are_appended_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out");
        std::fs::write(&path, "earlier=1\n").unwrap();
        set_outputs(&[("a", true), ("b", false)], Some(&path)).unwrap();
        set_outputs(&[("new_version", "0.2.0")], Some(&path)).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "earlier=1\na=true\nb=false\nnew_version=0.2.0\n"
        );
    }
}
