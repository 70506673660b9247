//! Query building: user intent into the wire-level query description.
//!
//! A query carries filter predicates, an optional grouping factor, an
//! optional explicit column selection, and fold (aggregation) requests. Each
//! requested `(field, operation)` pair produces exactly one output label of
//! the form `operation(field)`; the builder records those labels as a column
//! table the renderer later dispatches on.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

/// User-input errors caught before any request is issued.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("filter must be of form <column>,<operation>,<value>")]
    MalformedFilter(String),
    #[error("invalid age expression '{0}': expected <integer><unit> with unit one of y M w d h m s")]
    MalformedAge(String),
}

/// A `[start, stop]` window in epoch seconds, recorded when an `--age`
/// expression derives the query's time filter. The time-axis renderer uses
/// it to scale `bin(timestamp)` strips.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeWindow {
    pub start: f64,
    pub stop: f64,
}

/// Aggregation operations a fold can request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregateKind {
    Head,
    Histogram,
    Unique,
    Bin,
    Range,
}

impl AggregateKind {
    /// Wire-level fold tag; also the prefix of the output label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Head => "head",
            Self::Histogram => "histogram",
            Self::Unique => "unique",
            Self::Bin => "bin",
            Self::Range => "range",
        }
    }
}

/// One renderable output column: the label the backend will report the
/// aggregate under, and how to render it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnSpec {
    pub label: String,
    pub kind: AggregateKind,
}

/// Conjunctive predicates per field; each entry is an `[operator, value]`
/// pair on the wire.
pub type Filter = BTreeMap<String, Vec<(String, Value)>>;

/// Fold requests per field; each entry is a one-element operation tag.
pub type FoldRequest = BTreeMap<String, Vec<Vec<String>>>;

/// The wire-level query description.
#[derive(Clone, Debug, Serialize)]
pub struct Query {
    pub filter: Vec<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fold: Option<FoldRequest>,
}

/// CLI-agnostic query intent. Command code converts its arg struct into this.
#[derive(Clone, Debug, Default)]
pub struct QueryRequest {
    /// Raw `field,operator,value` triples.
    pub filters: Vec<String>,
    pub select: Vec<String>,
    pub factor: Option<String>,
    pub age: Option<String>,
    pub head: Vec<String>,
    pub histogram: Vec<String>,
    pub unique: Vec<String>,
    pub quantize: Vec<String>,
    pub bin: Vec<String>,
    pub range: Vec<String>,
}

/// A fully assembled query plus everything print time needs.
#[derive(Clone, Debug)]
pub struct BuiltQuery {
    pub query: Query,
    pub columns: Vec<ColumnSpec>,
    pub window: Option<TimeWindow>,
}

/// Assemble the wire query from user intent.
///
/// `now` is the reference epoch second for `--age` arithmetic, threaded in
/// rather than read ambiently so tests can pin it.
pub fn build(request: &QueryRequest, now: i64) -> Result<BuiltQuery, QueryError> {
    let mut filter = Filter::new();
    for raw in &request.filters {
        let mut parts = raw.splitn(3, ',');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(field), Some(op), Some(value)) if !field.is_empty() => {
                filter
                    .entry(field.to_string())
                    .or_default()
                    .push((op.to_string(), Value::String(value.to_string())));
            }
            _ => return Err(QueryError::MalformedFilter(raw.clone())),
        }
    }

    // Every query is time-bounded: "timestamp > 0" is appended alongside any
    // caller-supplied timestamp predicates; only an age window replaces it.
    filter
        .entry("timestamp".to_string())
        .or_default()
        .push(("greater-than".to_string(), json!(0)));

    let mut query = Query {
        filter: vec![filter],
        group: request.factor.clone().map(|factor| vec![factor]),
        select: None,
        fold: None,
    };

    if request.select.is_empty() {
        let mut fold = FoldRequest::new();
        fold.insert(
            "timestamp".to_string(),
            vec![vec!["range".to_string()], vec!["bin".to_string()]],
        );
        query.fold = Some(fold);
    } else {
        query.select = Some(request.select.clone());
    }

    let mut window = None;
    if let Some(age) = &request.age {
        let (target, w) = parse_age(age, now)?;
        query.filter[0].insert(
            "timestamp".to_string(),
            vec![("at-least".to_string(), json!(target))],
        );
        window = Some(w);
    }

    let mut columns = Vec::new();
    add_fold(&mut query, &mut columns, &request.head, AggregateKind::Head);
    add_fold(
        &mut query,
        &mut columns,
        &request.histogram,
        AggregateKind::Histogram,
    );
    add_fold(
        &mut query,
        &mut columns,
        &request.unique,
        AggregateKind::Unique,
    );
    add_fold(
        &mut query,
        &mut columns,
        &request.quantize,
        AggregateKind::Bin,
    );
    add_fold(&mut query, &mut columns, &request.range, AggregateKind::Range);
    add_fold(&mut query, &mut columns, &request.bin, AggregateKind::Bin);

    Ok(BuiltQuery {
        query,
        columns,
        window,
    })
}

/// Append one fold request per field and register its output column.
/// Repeated fields accumulate in list order.
fn add_fold(
    query: &mut Query,
    columns: &mut Vec<ColumnSpec>,
    fields: &[String],
    kind: AggregateKind,
) {
    for field in fields {
        let fold = query.fold.get_or_insert_with(FoldRequest::new);
        fold.entry(field.clone())
            .or_default()
            .push(vec![kind.label().to_string()]);
        columns.push(ColumnSpec {
            label: format!("{}({field})", kind.label()),
            kind,
        });
    }
}

/// Parse an age expression like `30m` or `2w` into the window start and the
/// recorded `[start, now]` window. Annual means 365 days, monthly 30 days.
fn parse_age(expr: &str, now: i64) -> Result<(i64, TimeWindow), QueryError> {
    let digits = expr.len() - expr.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return Err(QueryError::MalformedAge(expr.to_string()));
    }
    let amount: i64 = expr[..digits]
        .parse()
        .map_err(|_| QueryError::MalformedAge(expr.to_string()))?;

    let unit = match &expr[digits..] {
        "y" => 3_600 * 24 * 365,
        "M" => 3_600 * 24 * 30,
        "w" => 3_600 * 24 * 7,
        "d" => 3_600 * 24,
        "h" => 3_600,
        "m" => 60,
        "s" => 1,
        _ => return Err(QueryError::MalformedAge(expr.to_string())),
    };

    let target = now - amount * unit;
    Ok((
        target,
        TimeWindow {
            start: target as f64,
            stop: now as f64,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn default_fold_is_timestamp_range_and_bin() {
        let built = build(&QueryRequest::default(), NOW).unwrap();
        let fold = built.query.fold.expect("default fold");
        assert_eq!(
            fold["timestamp"],
            vec![vec!["range".to_string()], vec!["bin".to_string()]]
        );
        assert!(built.columns.is_empty());
    }

    #[test]
    fn select_suppresses_default_fold() {
        let request = QueryRequest {
            select: vec!["signal".to_string()],
            ..Default::default()
        };
        let built = build(&request, NOW).unwrap();
        assert!(built.query.fold.is_none());
        assert_eq!(built.query.select, Some(vec!["signal".to_string()]));
    }

    #[test]
    fn implicit_timestamp_filter_is_added() {
        let built = build(&QueryRequest::default(), NOW).unwrap();
        assert_eq!(
            built.query.filter[0]["timestamp"],
            vec![("greater-than".to_string(), json!(0))]
        );
    }

    #[test]
    fn explicit_timestamp_filter_keeps_the_implicit_bound() {
        let request = QueryRequest {
            filters: vec!["timestamp,at-least,100".to_string()],
            ..Default::default()
        };
        let built = build(&request, NOW).unwrap();
        assert_eq!(
            built.query.filter[0]["timestamp"],
            vec![
                ("at-least".to_string(), json!("100")),
                ("greater-than".to_string(), json!(0)),
            ]
        );
    }

    #[test]
    fn filter_triples_accumulate_per_field() {
        let request = QueryRequest {
            filters: vec![
                "hostname,equal,web-1".to_string(),
                "hostname,not-equal,web-2".to_string(),
            ],
            ..Default::default()
        };
        let built = build(&request, NOW).unwrap();
        assert_eq!(
            built.query.filter[0]["hostname"],
            vec![
                ("equal".to_string(), json!("web-1")),
                ("not-equal".to_string(), json!("web-2")),
            ]
        );
    }

    #[test]
    fn short_filter_triple_is_rejected() {
        let request = QueryRequest {
            filters: vec!["hostname,equal".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            build(&request, NOW),
            Err(QueryError::MalformedFilter(_))
        ));
    }

    #[test]
    fn age_overrides_timestamp_filter_and_records_window() {
        let request = QueryRequest {
            age: Some("1d".to_string()),
            ..Default::default()
        };
        let built = build(&request, NOW).unwrap();
        assert_eq!(
            built.query.filter[0]["timestamp"],
            vec![("at-least".to_string(), json!(NOW - 86_400))]
        );
        let window = built.window.expect("window recorded");
        assert_eq!(window.start, (NOW - 86_400) as f64);
        assert_eq!(window.stop, NOW as f64);
    }

    #[test]
    fn two_week_age_window() {
        let request = QueryRequest {
            age: Some("2w".to_string()),
            ..Default::default()
        };
        let built = build(&request, NOW).unwrap();
        assert_eq!(
            built.query.filter[0]["timestamp"],
            vec![("at-least".to_string(), json!(NOW - 1_209_600))]
        );
    }

    #[test]
    fn bad_age_unit_fails() {
        for expr in ["5q", "5", "w", "-3d", "1dd"] {
            let request = QueryRequest {
                age: Some(expr.to_string()),
                ..Default::default()
            };
            assert!(
                matches!(build(&request, NOW), Err(QueryError::MalformedAge(_))),
                "expected failure for {expr:?}"
            );
        }
    }

    #[test]
    fn folds_register_columns_with_labels() {
        let request = QueryRequest {
            histogram: vec!["signal".to_string()],
            unique: vec!["hostname".to_string()],
            quantize: vec!["duration".to_string()],
            ..Default::default()
        };
        let built = build(&request, NOW).unwrap();
        let labels: Vec<&str> = built.columns.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["histogram(signal)", "unique(hostname)", "bin(duration)"]
        );
        let fold = built.query.fold.unwrap();
        assert_eq!(fold["signal"], vec![vec!["histogram".to_string()]]);
        assert_eq!(fold["duration"], vec![vec!["bin".to_string()]]);
    }

    #[test]
    fn wire_shape_matches_protocol() {
        let request = QueryRequest {
            factor: Some("fingerprint".to_string()),
            histogram: vec!["signal".to_string()],
            ..Default::default()
        };
        let built = build(&request, NOW).unwrap();
        let wire = serde_json::to_value(&built.query).unwrap();
        assert_eq!(wire["group"], json!(["fingerprint"]));
        assert_eq!(wire["filter"][0]["timestamp"], json!([["greater-than", 0]]));
        assert_eq!(wire["fold"]["signal"], json!([["histogram"]]));
        assert!(wire.get("select").is_none());
    }
}
