//! Splitting free-form equation text into one equation per line.
//!
//! Input files mix plain equations, LaTeX display blocks and comments. A line
//! survives when it still contains an `=` after comments, math delimiters and
//! trailing punctuation have been stripped.

/// Candidate equation lines of `text`, in order.
pub fn equation_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(clean_line)
        .filter(|line| line.contains('='))
        .collect()
}

fn clean_line(raw: &str) -> Option<String> {
    let line = strip_comment(raw);
    let mut line = line.trim();

    // Math delimiters, row separators and sentence punctuation can be
    // interleaved ("$x = 1$,"), so strip until nothing changes.
    loop {
        let before = line.len();
        for delim in ["$$", "$", "\\[", "\\]"] {
            line = line.trim_start_matches(delim).trim_start();
            line = line.trim_end_matches(delim).trim_end();
        }
        line = line.trim_end_matches("\\\\").trim_end();
        line = line.trim_end_matches([',', '.', ';']).trim_end();
        if line.len() == before {
            break;
        }
    }

    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

/// Everything before an unescaped `%` (LaTeX) or a leading `#`.
fn strip_comment(line: &str) -> &str {
    if line.trim_start().starts_with('#') {
        return "";
    }
    let mut prev = None;
    for (i, c) in line.char_indices() {
        if c == '%' && prev != Some('\\') {
            return &line[..i];
        }
        prev = Some(c);
    }
    line
}
