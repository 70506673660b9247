//! Call-stack parsing and column-wrapped rendering.
//!
//! Backends ship call stacks as a JSON string holding `{"frame": [...]}`.
//! Anything that does not parse into that shape is kept verbatim and printed
//! as-is; a malformed stack is display data, not an error.

use std::io::{self, Write};

use unicode_width::UnicodeWidthStr;

/// Soft wrap limit in display columns. A single frame wider than this still
/// renders on one line.
const WRAP_COLUMNS: usize = 76;

/// Continuation indent after each wrap.
const INDENT: &str = "    ";

/// Separator between frames.
const SEPARATOR: &str = " \u{2190} ";

/// Outcome of parsing a raw call-stack value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Callstack {
    /// A JSON object with a `frame` array of strings.
    Parsed(Vec<String>),
    /// Anything else; rendered verbatim.
    Unparsed(String),
}

impl Callstack {
    /// Parse a raw wire value. Never fails: unparseable input becomes
    /// [`Callstack::Unparsed`].
    pub fn parse(raw: &str) -> Self {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) else {
            return Self::Unparsed(raw.to_string());
        };

        match value.get("frame").and_then(|f| f.as_array()) {
            Some(frames) => Self::Parsed(
                frames
                    .iter()
                    .map(|f| match f.as_str() {
                        Some(s) => s.to_string(),
                        None => f.to_string(),
                    })
                    .collect(),
            ),
            None => Self::Unparsed(raw.to_string()),
        }
    }

    /// Write the call stack to `out`.
    ///
    /// Parsed frames are joined with an arrow separator and word-wrapped at
    /// [`WRAP_COLUMNS`] display columns with a four-space re-indent; the final
    /// frame carries no trailing separator. Unparsed input is printed on one
    /// line.
    pub fn write(&self, out: &mut dyn Write) -> io::Result<()> {
        match self {
            Self::Unparsed(raw) => writeln!(out, " {raw}"),
            Self::Parsed(frames) => write_frames(out, frames),
        }
    }
}

fn write_frames(out: &mut dyn Write, frames: &[String]) -> io::Result<()> {
    write!(out, "\n{INDENT}")?;

    // Each frame accounts for its own width plus the separator and indent
    // slack; a frame that would push past the limit starts a fresh line.
    let mut used = INDENT.len();
    for (i, frame) in frames.iter().enumerate() {
        let width = UnicodeWidthStr::width(frame.as_str());
        used += width + 4;

        if i != 0 && used >= WRAP_COLUMNS {
            write!(out, "\n{INDENT}")?;
            used = width + 4;
        }

        if i == frames.len() - 1 {
            write!(out, "{frame}")?;
            break;
        }
        write!(out, "{frame}{SEPARATOR}")?;
    }

    writeln!(out)
}
