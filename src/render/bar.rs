//! Horizontal time-axis bar for `bin(timestamp)` aggregates.
//!
//! Compresses a group's timestamp bins into a single fixed-width strip:
//! each cell covers an equal slice of the `[start, stop]` window and is drawn
//! with a block glyph whose height reflects the bucket counts that fall into
//! that slice. The strip gives an at-a-glance activity profile per group
//! without taking a full histogram's vertical space.

use std::fmt::Write as _;

use crate::query::TimeWindow;
use crate::response::BinBucket;

/// Number of cells in the strip.
pub const BAR_WIDTH: usize = 62;

/// Glyphs from lowest to highest intensity.
const LEVELS: &[char] = &[
    '\u{2581}', '\u{2582}', '\u{2583}', '\u{2584}', '\u{2585}', '\u{2586}', '\u{2587}', '\u{2588}',
];

/// Render the bins as a bracketed strip across `window`.
///
/// When no window was recorded the bucket extents themselves bound the axis.
/// Buckets outside the window are clamped to the nearest edge cell.
pub fn render(bins: &[BinBucket], window: Option<TimeWindow>) -> String {
    let (start, stop) = match window {
        Some(w) => (w.start, w.stop),
        None => extent(bins),
    };

    let mut cells = vec![0u64; BAR_WIDTH];
    let span = (stop - start).max(1.0);
    for bucket in bins {
        if bucket.count == 0 {
            continue;
        }
        let pos = ((bucket.start as f64 - start) / span * BAR_WIDTH as f64) as isize;
        let idx = pos.clamp(0, BAR_WIDTH as isize - 1) as usize;
        cells[idx] += bucket.count;
    }

    let max = cells.iter().copied().max().unwrap_or(0);
    let mut out = String::with_capacity(BAR_WIDTH + 2);
    out.push('[');
    for &cell in &cells {
        if cell == 0 || max == 0 {
            out.push(' ');
        } else {
            let level = (cell as f64 / max as f64 * (LEVELS.len() - 1) as f64).round() as usize;
            let _ = write!(out, "{}", LEVELS[level.min(LEVELS.len() - 1)]);
        }
    }
    out.push(']');
    out
}

fn extent(bins: &[BinBucket]) -> (f64, f64) {
    let start = bins.iter().map(|b| b.start).min().unwrap_or(0) as f64;
    let stop = bins.iter().map(|b| b.end).max().unwrap_or(1) as f64;
    (start, stop)
}
