//! compare subcommand handler.

use std::path::{Path, PathBuf};

use anyhow::Result;
use cas_ast::Context;
use cas_equiv::{EquivOptions, Judge, MatcherKind, TieBreak, Verdict};
use clap::Args;
use serde::Serialize;

use crate::config::{DaeEquivConfig, InputFormat};
use crate::input::load_group;

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// First equation group file
    pub a: PathBuf,

    /// Second equation group file
    pub b: PathBuf,

    /// Input format: auto, latex, text
    #[arg(long, value_enum)]
    pub format: Option<InputFormat>,

    /// Equation matcher: greedy, exact
    #[arg(long)]
    pub matcher: Option<MatcherKind>,

    /// Elimination source choice: first, fewest-nodes
    #[arg(long)]
    pub tie_break: Option<TieBreak>,

    /// Wall-clock limit for the comparison
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Print the verdict as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl CompareArgs {
    pub fn options(&self, config: &DaeEquivConfig) -> EquivOptions {
        let mut options = config.equiv_options();
        if let Some(matcher) = self.matcher {
            options.matcher = matcher;
        }
        if let Some(tie_break) = self.tie_break {
            options.tie_break = tie_break;
        }
        if self.timeout_ms.is_some() {
            options.timeout_ms = self.timeout_ms;
        }
        options
    }
}

#[derive(Serialize)]
struct CompareJson<'a> {
    a: String,
    b: String,
    matcher: MatcherKind,
    tie_break: TieBreak,
    #[serde(flatten)]
    verdict: &'a Verdict,
}

/// Loads both files and judges them with a fresh context.
pub fn compare_files(
    a: &Path,
    b: &Path,
    format: InputFormat,
    options: EquivOptions,
) -> Result<Verdict> {
    let mut ctx = Context::new();
    let group_a = load_group(&mut ctx, a, format)?;
    let group_b = load_group(&mut ctx, b, format)?;
    Ok(Judge::new(options).check(&mut ctx, &group_a, &group_b))
}

pub fn run(args: CompareArgs, config: &DaeEquivConfig) -> Result<()> {
    let options = args.options(config);
    let format = args.format.unwrap_or(config.format);
    let (matcher, tie_break) = (options.matcher, options.tie_break);
    let verdict = compare_files(&args.a, &args.b, format, options)?;

    if args.json {
        let out = CompareJson {
            a: args.a.display().to_string(),
            b: args.b.display().to_string(),
            matcher,
            tie_break,
            verdict: &verdict,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if verdict.equivalent {
        println!("equivalent");
    } else {
        println!("not equivalent");
    }
    Ok(())
}
