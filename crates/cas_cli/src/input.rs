//! Reading equation files into equation groups.

use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};
use cas_ast::Context;
use cas_equiv::EquationGroup;
use cas_parser::{equation_lines, parse_equation, parse_latex_equation};
use tracing::debug;

use crate::config::InputFormat;

/// Resolves `Auto` against the file name and its equation lines.
pub fn detect_format(requested: InputFormat, path: &Path, lines: &[String]) -> InputFormat {
    match requested {
        InputFormat::Auto => {
            let tex = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("tex"));
            if tex || lines.iter().any(|l| l.contains('\\')) {
                InputFormat::Latex
            } else {
                InputFormat::Text
            }
        }
        fixed => fixed,
    }
}

pub fn parse_group(
    ctx: &mut Context,
    text: &str,
    path: &Path,
    format: InputFormat,
) -> Result<EquationGroup> {
    let lines = equation_lines(text);
    let format = detect_format(format, path, &lines);
    debug!(path = %path.display(), ?format, equations = lines.len(), "reading equation group");

    let mut equations = Vec::with_capacity(lines.len());
    for (n, line) in lines.iter().enumerate() {
        let eq = match format {
            InputFormat::Latex => parse_latex_equation(ctx, line),
            _ => parse_equation(line, ctx),
        }
        .with_context(|| format!("{}: equation {}: `{}`", path.display(), n + 1, line))?;
        equations.push(eq);
    }
    EquationGroup::new(ctx, equations).with_context(|| format!("{}", path.display()))
}

pub fn load_group(ctx: &mut Context, path: &Path, format: InputFormat) -> Result<EquationGroup> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_group(ctx, &text, path, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tex_extension_selects_latex() {
        let lines = vec!["h = V / A".to_string()];
        assert_eq!(
            detect_format(InputFormat::Auto, Path::new("tank.tex"), &lines),
            InputFormat::Latex
        );
        assert_eq!(
            detect_format(InputFormat::Auto, Path::new("tank.txt"), &lines),
            InputFormat::Text
        );
    }

    #[test]
    fn backslash_selects_latex() {
        let lines = vec!["h = \\frac{V}{A}".to_string()];
        assert_eq!(
            detect_format(InputFormat::Auto, Path::new("tank.eq"), &lines),
            InputFormat::Latex
        );
    }

    #[test]
    fn explicit_format_wins() {
        let lines = vec!["h = \\frac{V}{A}".to_string()];
        assert_eq!(
            detect_format(InputFormat::Text, Path::new("tank.tex"), &lines),
            InputFormat::Text
        );
    }

    #[test]
    fn text_group_skips_lines_without_equations() {
        let mut ctx = Context::new();
        let text = "# tank\nV = A * h\n\nq_out = k * sqrt(h)\n";
        let group = parse_group(&mut ctx, text, Path::new("tank.txt"), InputFormat::Auto).unwrap();
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn errors_name_the_file_and_equation() {
        let mut ctx = Context::new();
        let err = parse_group(&mut ctx, "x = (y", Path::new("bad.txt"), InputFormat::Text)
            .unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("bad.txt"), "{msg}");
        assert!(msg.contains("equation 1"), "{msg}");
    }

    #[test]
    fn file_without_equations_is_an_error() {
        let mut ctx = Context::new();
        let parsed = parse_group(
            &mut ctx,
            "% nothing here",
            Path::new("e.tex"),
            InputFormat::Auto,
        );
        assert!(parsed.is_err());
    }
}
