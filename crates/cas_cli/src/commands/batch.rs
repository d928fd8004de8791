//! batch subcommand handler.
//!
//! Runs every case of a manifest and reports PASSED/FAILED per case:
//!
//! ```toml
//! [[case]]
//! a = "tank_1.tex"
//! b = "tank_2.tex"
//! expected = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::Args;
use serde::Deserialize;
use tracing::warn;

use crate::commands::compare::compare_files;
use crate::config::DaeEquivConfig;

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Manifest listing the cases to run
    pub manifest: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default, rename = "case")]
    pub cases: Vec<Case>,
}

#[derive(Debug, Deserialize)]
pub struct Case {
    pub a: PathBuf,
    pub b: PathBuf,
    pub expected: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
}

impl Summary {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("invalid manifest {}", path.display()))
    }
}

/// Runs the cases with paths resolved against `base`. A case whose files
/// cannot be read or parsed counts as failed.
pub fn run_cases(manifest: &Manifest, base: &Path, config: &DaeEquivConfig) -> Summary {
    let mut summary = Summary::default();
    for (i, case) in manifest.cases.iter().enumerate() {
        let n = i + 1;
        let result = compare_files(
            &base.join(&case.a),
            &base.join(&case.b),
            config.format,
            config.equiv_options(),
        );
        let passed = match result {
            Ok(verdict) => verdict.equivalent == case.expected,
            Err(e) => {
                warn!(case = n, error = %format!("{e:#}"), "case could not be compared");
                false
            }
        };
        let status = if passed { "PASSED" } else { "FAILED" };
        println!("Case {n} {status}. {}, {}", case.a.display(), case.b.display());
        if passed {
            summary.passed += 1;
        } else {
            summary.failed += 1;
        }
    }
    summary
}

pub fn run(args: BatchArgs, config: &DaeEquivConfig) -> Result<Summary> {
    let manifest = Manifest::load(&args.manifest)?;
    let base = args
        .manifest
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let summary = run_cases(&manifest, &base, config);
    println!(
        "{} passed, {} failed, {} total",
        summary.passed,
        summary.failed,
        manifest.cases.len()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_lists_cases() {
        let manifest: Manifest = toml::from_str(
            r#"
            [[case]]
            a = "simple_1.tex"
            b = "simple_2.tex"
            expected = true

            [[case]]
            a = "simple_1.tex"
            b = "other.tex"
            expected = false
            "#,
        )
        .unwrap();
        assert_eq!(manifest.cases.len(), 2);
        assert!(manifest.cases[0].expected);
        assert_eq!(manifest.cases[1].b, PathBuf::from("other.tex"));
    }

    #[test]
    fn case_without_expectation_is_invalid() {
        let parsed: Result<Manifest, _> = toml::from_str("[[case]]\na = \"x\"\nb = \"y\"\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn unreadable_case_counts_as_failure() {
        let manifest = Manifest {
            cases: vec![Case {
                a: PathBuf::from("missing_a.txt"),
                b: PathBuf::from("missing_b.txt"),
                expected: false,
            }],
        };
        let summary = run_cases(
            &manifest,
            Path::new("/nonexistent"),
            &DaeEquivConfig::default(),
        );
        assert_eq!(summary, Summary { passed: 0, failed: 1 });
        assert!(!summary.all_passed());
    }
}
