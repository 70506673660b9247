//! Rendering: typed aggregate values into terminal output.
//!
//! Dispatch is table-driven: the query builder records one [`ColumnSpec`] per
//! fold request, and each group renders by looking its labels up in the
//! unpacked data. Labels absent from a group are skipped; aggregates that
//! turn out empty degrade to the literal `none` and processing continues.

pub mod bar;
pub mod callstack;
pub mod histogram;
pub mod timeago;

use std::io::{self, Write};

use chrono::{Local, TimeZone};
use colored::Colorize;

use crate::query::{AggregateKind, ColumnSpec, TimeWindow};
use crate::response::{AggregateValue, GroupData, ResultSet};
use crate::sort::{self, SortDirection};

use callstack::Callstack;
use histogram::{BAR_GLYPH, HistogramOptions};

/// Invocation-scoped rendering configuration.
#[derive(Clone, Debug)]
pub struct RenderContext<'a> {
    /// Output columns registered by the query builder, in request order.
    pub columns: &'a [ColumnSpec],
    /// Age-derived time window, when one was recorded.
    pub window: Option<TimeWindow>,
    /// Sort direction shared by every comparator.
    pub direction: SortDirection,
    /// Reference epoch second for relative-time phrases.
    pub now: i64,
}

/// Render the full result set.
///
/// With a sort field, all groups are materialized, ordered by the selected
/// comparator, truncated to `limit`, and rendered with a blank line between
/// consecutive groups. Without one, groups render in map order and the limit
/// counter stops the iteration mid-stream; the trailing blank line then
/// lands only after non-final groups. The two paths' blank-line shapes
/// differ on the last group and golden output depends on both.
pub fn print_results(
    out: &mut dyn Write,
    results: &ResultSet,
    sort_field: Option<&str>,
    limit: Option<usize>,
    ctx: &RenderContext<'_>,
) -> io::Result<()> {
    match sort_field {
        Some(field) => {
            let mut pairs: Vec<(String, GroupData)> = results
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            if pairs.is_empty() {
                writeln!(out, "No results.")?;
                return Ok(());
            }

            let key = sort::select_key(&pairs[0].1, field);
            pairs.sort_by(|a, b| sort::compare(a, b, &key, ctx.direction));

            let shown = match limit {
                Some(limit) if limit < pairs.len() => limit,
                _ => pairs.len(),
            };
            for (i, (group, data)) in pairs[..shown].iter().enumerate() {
                if i > 0 {
                    writeln!(out)?;
                }
                print_group(out, group, data, ctx)?;
            }
        }
        None => {
            let mut remaining = limit;
            for (group, data) in results {
                print_group(out, group, data, ctx)?;
                if let Some(left) = remaining.as_mut() {
                    *left -= 1;
                    if *left == 0 {
                        break;
                    }
                }
                writeln!(out)?;
            }
        }
    }
    Ok(())
}

/// Render one group: the factor label, the timestamp specials, the count,
/// then every registered column present in the data.
pub fn print_group(
    out: &mut dyn Write,
    group: &str,
    data: &GroupData,
    ctx: &RenderContext<'_>,
) -> io::Result<()> {
    write!(out, "{} ", factor_label(group).bold())?;

    let columns = match data {
        GroupData::Objects(records) => {
            // No aggregation happened; the group carries raw records.
            if ctx.columns.is_empty() {
                writeln!(out)?;
                for record in records {
                    print_record(out, record, ctx)?;
                }
            }
            return Ok(());
        }
        GroupData::Aggregates(columns) => columns,
    };

    if let Some(AggregateValue::Bin(buckets)) = columns.get("bin(timestamp)") {
        write!(out, "{} ", bar::render(buckets, ctx.window))?;
    }

    if let Some(AggregateValue::Range(start, stop)) = columns.get("range(timestamp)") {
        let phrase = timeago::ago(ctx.now, *stop as i64);
        writeln!(out, "{}", phrase.blue().bold())?;
        writeln!(out, "{}{}", "Date: ".yellow().bold(), fmt_date(*start as i64))?;
        if start != stop {
            writeln!(out, "      {}", fmt_date(*stop as i64))?;
        }
    }

    if let Some(AggregateValue::Count(count)) = columns.get("count") {
        writeln!(out, "{}{count}", "count: ".yellow().bold())?;
    }

    for column in ctx.columns {
        let Some(value) = columns.get(&column.label) else {
            continue;
        };

        if column.label.contains("callstack") {
            write!(out, "{}", "callstack:".yellow().bold())?;
            Callstack::parse(&scalar_text(value)).write(out)?;
            continue;
        }

        write!(out, "{}{}", column.label.yellow().bold(), ": ".yellow().bold())?;
        if !render_aggregate(out, column.kind, value)? {
            writeln!(out, "none")?;
        }
    }

    Ok(())
}

/// The fixed dispatch table: one arm per requested aggregate kind. Returns
/// `false` when there was no data to draw, in which case the caller prints
/// `none`. A value whose shape does not match the requested kind also draws
/// nothing.
fn render_aggregate(
    out: &mut dyn Write,
    kind: AggregateKind,
    value: &AggregateValue,
) -> io::Result<bool> {
    match (kind, value) {
        (AggregateKind::Head, AggregateValue::Head(v))
        | (AggregateKind::Unique, AggregateValue::Unique(v)) => {
            writeln!(out, "{}", fmt_scalar(v))?;
        }
        (AggregateKind::Range, AggregateValue::Range(min, max)) => {
            writeln!(
                out,
                "{} - {} ({})",
                fmt_num(*min),
                fmt_num(*max),
                fmt_num(max - min)
            )?;
        }
        (AggregateKind::Bin, AggregateValue::Bin(buckets)) => {
            let entries: Vec<(String, u64)> = buckets
                .iter()
                .filter(|b| b.count > 0)
                .map(|b| (format!("{:12} {:12}", b.start, b.end), b.count))
                .collect();
            if entries.is_empty() {
                return Ok(false);
            }
            writeln!(out)?;
            let opts = HistogramOptions {
                sort: false,
                width: 10,
                bar: BAR_GLYPH,
            };
            writeln!(out, "{}", histogram::render(&entries, &opts))?;
        }
        (AggregateKind::Histogram, AggregateValue::Histogram(raw)) => {
            let entries: Vec<(String, u64)> = raw
                .iter()
                .filter(|(_, count)| *count > 0)
                .cloned()
                .collect();
            if entries.is_empty() {
                return Ok(false);
            }
            writeln!(out)?;
            let opts = HistogramOptions {
                sort: true,
                width: 40,
                bar: BAR_GLYPH,
            };
            writeln!(out, "{}", histogram::render(&entries, &opts))?;
        }
        _ => return Ok(false),
    }
    Ok(true)
}

/// Render one ungrouped object record.
fn print_record(
    out: &mut dyn Write,
    record: &serde_json::Map<String, serde_json::Value>,
    ctx: &RenderContext<'_>,
) -> io::Result<()> {
    let id = record.get("object").and_then(serde_json::Value::as_u64);
    if let Some(id) = id {
        write!(out, "{} ", format!("#{id:07x}").green().bold())?;
    }

    if let Some(ts) = record.get("timestamp").and_then(serde_json::Value::as_i64) {
        writeln!(
            out,
            "{}     {}",
            fmt_date(ts),
            timeago::ago(ctx.now, ts).bold()
        )?;
    } else if id.is_some() {
        writeln!(out)?;
    }

    for (field, value) in record {
        if field == "object" || field == "timestamp" || field == "callstack" {
            continue;
        }
        writeln!(out, "  {}: {}", field.yellow().bold(), fmt_scalar(value))?;
    }

    if let Some(raw) = record.get("callstack") {
        write!(out, "  {}", "callstack:".yellow().bold())?;
        Callstack::parse(&fmt_scalar(raw)).write(out)?;
    }

    Ok(())
}

/// Group-key column: truncate past 28 characters with an ellipsis, otherwise
/// left-pad to a fixed 31-character field.
fn factor_label(group: &str) -> String {
    if group.chars().count() > 28 {
        let head: String = group.chars().take(28).collect();
        format!("{head}...")
    } else {
        format!("{group:<31}")
    }
}

/// Display form of a scalar column value; strings render unquoted.
fn fmt_scalar(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Raw text of a value that should hold a call-stack JSON string.
fn scalar_text(value: &AggregateValue) -> String {
    match value {
        AggregateValue::Head(v) | AggregateValue::Unique(v) => fmt_scalar(v),
        other => format!("{other:?}"),
    }
}

/// Range bounds arrive as floats even for integral timestamps; print whole
/// numbers without a decimal point.
fn fmt_num(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Local-time date line used by range rendering and object listings.
fn fmt_date(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%a %b %e %Y %H:%M:%S").to_string(),
        None => format!("@{ts}"),
    }
}
