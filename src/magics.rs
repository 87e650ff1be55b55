//! Hiding IPython syntax from Python formatters.
//!
//! Notebook cells may contain line magics (`%matplotlib inline`), shell
//! escapes (`!pip install x`) and help queries (`?len`). None of these parse as
//! Python, so they are swapped for placeholder comments before formatting and
//! swapped back afterwards.

use std::sync::LazyLock;
use thiserror::Error;

const PLACEHOLDER_PREFIX: &str = "# clean-py-magic-";

static PLACEHOLDER: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^(\s*)# clean-py-magic-(\d+)\s*$").expect("valid placeholder regex"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MagicError {
    #[error("magic placeholder {0} was lost during formatting")]
    Lost(usize),
    #[error("magic placeholder {0} appears more than once after formatting")]
    Duplicated(usize),
}

/// Source with its magic lines replaced by placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedSource {
    pub text: String,
    /// Original magic lines without their indentation, indexed by placeholder number.
    magics: Vec<String>,
}

impl MaskedSource {
    pub fn has_magics(&self) -> bool {
        !self.magics.is_empty()
    }

    /// Put the original magic lines back into `formatted`.
    ///
    /// Each magic takes the indentation its placeholder ended up with. Every
    /// placeholder must appear exactly once.
    pub fn restore(&self, formatted: &str) -> Result<String, MagicError> {
        if self.magics.is_empty() {
            return Ok(formatted.to_string());
        }

        let mut seen = vec![false; self.magics.len()];
        let mut out = String::with_capacity(formatted.len());

        for line in formatted.split_inclusive('\n') {
            let (body, newline) = match line.strip_suffix('\n') {
                Some(body) => (body, "\n"),
                None => (line, ""),
            };

            let restored = PLACEHOLDER.captures(body).and_then(|caps| {
                let index: usize = caps[2].parse().ok()?;
                let magic = self.magics.get(index)?;
                Some((index, format!("{}{}", &caps[1], magic)))
            });

            match restored {
                Some((index, magic_line)) => {
                    if std::mem::replace(&mut seen[index], true) {
                        return Err(MagicError::Duplicated(index));
                    }
                    out.push_str(&magic_line);
                }
                None => out.push_str(body),
            }
            out.push_str(newline);
        }

        match seen.iter().position(|found| !found) {
            Some(index) => Err(MagicError::Lost(index)),
            None => Ok(out),
        }
    }
}

/// Whether a line is IPython-only syntax.
pub fn is_magic_line(line: &str) -> bool {
    matches!(line.trim_start().chars().next(), Some('%' | '!' | '?'))
}

/// Whether the source is a whole-cell magic (`%%bash`, `%%timeit`, ...).
///
/// The body of such a cell is not Python at all.
pub fn is_cell_magic(source: &str) -> bool {
    source
        .lines()
        .find(|line| !line.trim().is_empty())
        .is_some_and(|line| line.trim_start().starts_with("%%"))
}

/// Replace every magic line with a numbered placeholder comment.
pub fn mask(source: &str) -> MaskedSource {
    let mut magics = Vec::new();
    let mut text = String::with_capacity(source.len());

    for line in source.split_inclusive('\n') {
        let (body, newline) = match line.strip_suffix('\n') {
            Some(body) => (body, "\n"),
            None => (line, ""),
        };

        if is_magic_line(body) {
            let trimmed = body.trim_start();
            let indent = &body[..body.len() - trimmed.len()];
            text.push_str(indent);
            text.push_str(PLACEHOLDER_PREFIX);
            text.push_str(&magics.len().to_string());
            magics.push(trimmed.to_string());
        } else {
            text.push_str(body);
        }
        text.push_str(newline);
    }

    MaskedSource { text, magics }
}
