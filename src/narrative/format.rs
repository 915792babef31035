//! Whitespace cleanup for model output.

fn is_header(line: &str) -> bool {
    line.starts_with("##") || (line.starts_with("**") && line.ends_with("**:"))
}

/// Trim every line, drop leading and trailing blank lines, collapse runs of
/// blank lines, and put one blank line before standalone section headers.
pub fn clean_text_formatting(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let start = lines.iter().position(|l| !l.is_empty());
    let end = lines.iter().rposition(|l| !l.is_empty());
    let (Some(start), Some(end)) = (start, end) else {
        return String::new();
    };

    let mut out: Vec<&str> = Vec::with_capacity(end - start + 1);
    for &line in &lines[start..=end] {
        let prev_blank = out.last().map_or(true, |l| l.is_empty());
        if line.is_empty() {
            if !prev_blank {
                out.push("");
            }
            continue;
        }
        if is_header(line) && !prev_blank {
            out.push("");
        }
        out.push(line);
    }
    out.join("\n")
}
