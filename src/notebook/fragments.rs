//! Conversion between cell text and the line-fragment list stored in notebooks.
//!
//! In the stored form every fragment except the last ends with `\n` and the
//! last one does not; an empty cell is an empty list.

pub fn join_fragments(fragments: &[String]) -> String {
    fragments.concat()
}

/// Split cleaned cell text back into fragments.
///
/// One trailing newline is dropped first, since formatters always end their
/// output with one and notebooks never store it. Text that is empty after that
/// becomes `[]`. A cell that really ends in a blank line keeps it as a final
/// empty fragment: `"a\n\n"` becomes `["a\n", ""]`.
pub fn split_fragments(text: &str) -> Vec<String> {
    let body = text.strip_suffix('\n').unwrap_or(text);
    if body.is_empty() {
        return Vec::new();
    }

    let mut fragments: Vec<String> = body.split('\n').map(|line| format!("{line}\n")).collect();
    if let Some(last) = fragments.last_mut() {
        last.pop();
    }
    fragments
}
