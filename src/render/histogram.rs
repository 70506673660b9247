//! Terminal histogram rendering.
//!
//! One line per bucket: right-aligned label, a scaled run of bar glyphs, and
//! the raw count. Two call sites use this with different options: category
//! breakdowns (`histogram` folds) sort by count and use a wide bar, while
//! chronological bins (`bin` folds) keep input order and use a narrow bar.

use std::fmt::Write as _;

use unicode_width::UnicodeWidthStr;

/// Bar glyph shared by both histogram variants.
pub const BAR_GLYPH: char = '\u{2586}';

/// Rendering options for [`render`].
#[derive(Clone, Copy, Debug)]
pub struct HistogramOptions {
    /// Sort buckets by count, descending. Ties keep input order.
    pub sort: bool,
    /// Maximum bar length in glyphs; the largest count always reaches it.
    pub width: usize,
    /// Glyph repeated to draw a bar.
    pub bar: char,
}

/// Render `entries` as a multi-line histogram string (no trailing newline).
///
/// Entries with a zero count must be filtered out by the caller; a non-empty
/// input always yields exactly one bar line per entry.
pub fn render(entries: &[(String, u64)], opts: &HistogramOptions) -> String {
    let mut rows: Vec<&(String, u64)> = entries.iter().collect();
    if opts.sort {
        rows.sort_by(|a, b| b.1.cmp(&a.1));
    }

    let label_width = rows
        .iter()
        .map(|(label, _)| UnicodeWidthStr::width(label.as_str()))
        .max()
        .unwrap_or(0);
    let max_count = rows.iter().map(|&&(_, count)| count).max().unwrap_or(1);

    let mut out = String::new();
    for (i, (label, count)) in rows.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let pad = label_width.saturating_sub(UnicodeWidthStr::width(label.as_str()));
        let bar = bar_cells(*count, max_count, opts.width, opts.bar);
        let _ = write!(
            out,
            "{:pad$}{label} | {bar:<width$} | {count}",
            "",
            pad = pad,
            width = opts.width
        );
    }
    out
}

/// Scale `count` against `max` into a bar of at most `width` glyphs.
/// Any non-zero count draws at least one glyph.
fn bar_cells(count: u64, max: u64, width: usize, glyph: char) -> String {
    if count == 0 || max == 0 {
        return String::new();
    }
    let cells = ((count as f64 / max as f64) * width as f64).ceil() as usize;
    std::iter::repeat_n(glyph, cells.clamp(1, width)).collect()
}
