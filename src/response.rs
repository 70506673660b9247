//! Response unpacking: raw backend JSON into typed aggregate values.
//!
//! The query endpoint returns a compact grouped payload. Unpacking turns it
//! into a `group key -> {output label -> AggregateValue}` mapping so the
//! renderer never touches raw JSON shapes. Output labels always have the form
//! `operation(field)` except for the literal key `count`.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

/// Unpacking failure. Fatal when structured rendering was requested;
/// `--raw` mode never unpacks.
#[derive(Debug, Error)]
pub enum UnpackError {
    #[error("response is not a grouped object")]
    NotGrouped,
    #[error("group '{group}': {detail}")]
    BadGroup { group: String, detail: String },
    #[error("group '{group}', column '{label}': {detail}")]
    BadColumn {
        group: String,
        label: String,
        detail: String,
    },
}

/// One `(start, end, count)` bucket of a `bin` aggregate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BinBucket {
    pub start: i64,
    pub end: i64,
    pub count: u64,
}

/// A typed aggregate value for one output label within one group.
#[derive(Clone, Debug, PartialEq)]
pub enum AggregateValue {
    /// First observed value of a field.
    Head(Value),
    /// Single representative value of a field.
    Unique(Value),
    /// `(min, max)` over the group.
    Range(f64, f64),
    /// Bucketed numeric aggregation; empty wire entries are dropped here.
    Bin(Vec<BinBucket>),
    /// `(category, count)` breakdown; empty wire entries are dropped here.
    Histogram(Vec<(String, u64)>),
    /// Object count for the group.
    Count(u64),
}

/// Everything known about one group.
#[derive(Clone, Debug, PartialEq)]
pub enum GroupData {
    /// Aggregated columns keyed by output label.
    Aggregates(BTreeMap<String, AggregateValue>),
    /// Ungrouped object records, present when no aggregation was requested.
    Objects(Vec<serde_json::Map<String, Value>>),
}

impl GroupData {
    pub fn aggregate(&self, label: &str) -> Option<&AggregateValue> {
        match self {
            Self::Aggregates(map) => map.get(label),
            Self::Objects(_) => None,
        }
    }
}

/// Unpacked result: group key to group data. Traversal order is decided by
/// the print orchestrator, not by this map.
pub type ResultSet = BTreeMap<String, GroupData>;

/// Unpack a raw query response.
///
/// Accepts either the grouped object directly or a response envelope with a
/// `values` member holding it.
pub fn unpack(raw: &Value) -> Result<ResultSet, UnpackError> {
    let root = match raw.get("values") {
        Some(Value::Object(inner)) => inner,
        _ => raw.as_object().ok_or(UnpackError::NotGrouped)?,
    };

    let mut results = ResultSet::new();
    for (group, data) in root {
        results.insert(group.clone(), unpack_group(group, data)?);
    }
    Ok(results)
}

fn unpack_group(group: &str, data: &Value) -> Result<GroupData, UnpackError> {
    match data {
        Value::Array(records) => {
            let mut objects = Vec::with_capacity(records.len());
            for record in records {
                let obj = record.as_object().ok_or_else(|| UnpackError::BadGroup {
                    group: group.to_string(),
                    detail: "object record is not a JSON object".to_string(),
                })?;
                objects.push(obj.clone());
            }
            Ok(GroupData::Objects(objects))
        }
        Value::Object(columns) => {
            let mut aggregates = BTreeMap::new();
            for (label, value) in columns {
                aggregates.insert(label.clone(), unpack_column(group, label, value)?);
            }
            Ok(GroupData::Aggregates(aggregates))
        }
        _ => Err(UnpackError::BadGroup {
            group: group.to_string(),
            detail: "expected an object of columns or an array of records".to_string(),
        }),
    }
}

fn unpack_column(group: &str, label: &str, value: &Value) -> Result<AggregateValue, UnpackError> {
    let bad = |detail: &str| UnpackError::BadColumn {
        group: group.to_string(),
        label: label.to_string(),
        detail: detail.to_string(),
    };

    if label == "count" {
        return value
            .as_u64()
            .map(AggregateValue::Count)
            .ok_or_else(|| bad("count is not an integer"));
    }

    let operation = label.split('(').next().unwrap_or("");
    match operation {
        "head" => Ok(AggregateValue::Head(first_scalar(value))),
        "unique" => Ok(AggregateValue::Unique(first_scalar(value))),
        "range" => {
            let tuple = value.as_array().ok_or_else(|| bad("range is not a pair"))?;
            match (
                tuple.first().and_then(Value::as_f64),
                tuple.get(1).and_then(Value::as_f64),
            ) {
                (Some(min), Some(max)) => Ok(AggregateValue::Range(min, max)),
                _ => Err(bad("range bounds are not numbers")),
            }
        }
        "bin" => {
            let entries = value.as_array().ok_or_else(|| bad("bin is not a list"))?;
            let mut buckets = Vec::new();
            for entry in entries {
                let tuple = entry.as_array().ok_or_else(|| bad("bin entry is not a tuple"))?;
                if tuple.is_empty() {
                    continue;
                }
                match (
                    tuple.first().and_then(Value::as_i64),
                    tuple.get(1).and_then(Value::as_i64),
                    tuple.get(2).and_then(Value::as_u64),
                ) {
                    (Some(start), Some(end), Some(count)) => {
                        buckets.push(BinBucket { start, end, count });
                    }
                    _ => return Err(bad("bin entry is not [start, end, count]")),
                }
            }
            Ok(AggregateValue::Bin(buckets))
        }
        "histogram" => {
            let entries = value
                .as_array()
                .ok_or_else(|| bad("histogram is not a list"))?;
            let mut buckets = Vec::new();
            for entry in entries {
                let tuple = entry
                    .as_array()
                    .ok_or_else(|| bad("histogram entry is not a tuple"))?;
                if tuple.is_empty() {
                    continue;
                }
                let category = match tuple.first() {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => continue,
                };
                let count = tuple
                    .get(1)
                    .and_then(Value::as_u64)
                    .ok_or_else(|| bad("histogram count is not an integer"))?;
                buckets.push((category, count));
            }
            Ok(AggregateValue::Histogram(buckets))
        }
        _ => Err(bad("unknown aggregation label")),
    }
}

/// `head`/`unique` values arrive either as a one-element tuple or a bare
/// scalar depending on backend version.
fn first_scalar(value: &Value) -> Value {
    match value {
        Value::Array(items) => items.first().cloned().unwrap_or(Value::Null),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unpacks_grouped_aggregates() {
        let raw = json!({
            "app.fault": {
                "range(timestamp)": [100, 900],
                "unique(host)": ["web-1"],
                "count": 12,
            }
        });
        let results = unpack(&raw).unwrap();
        let group = &results["app.fault"];
        assert_eq!(
            group.aggregate("range(timestamp)"),
            Some(&AggregateValue::Range(100.0, 900.0))
        );
        assert_eq!(
            group.aggregate("unique(host)"),
            Some(&AggregateValue::Unique(json!("web-1")))
        );
        assert_eq!(group.aggregate("count"), Some(&AggregateValue::Count(12)));
    }

    #[test]
    fn unpacks_values_envelope() {
        let raw = json!({"values": {"g": {"count": 1}}});
        let results = unpack(&raw).unwrap();
        assert!(results.contains_key("g"));
    }

    #[test]
    fn empty_bin_entries_are_dropped() {
        let raw = json!({"g": {"bin(duration)": [[], [0, 10, 3], []]}});
        let results = unpack(&raw).unwrap();
        match results["g"].aggregate("bin(duration)") {
            Some(AggregateValue::Bin(buckets)) => {
                assert_eq!(
                    buckets,
                    &vec![BinBucket {
                        start: 0,
                        end: 10,
                        count: 3
                    }]
                );
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn object_records_unpack_without_aggregation() {
        let raw = json!({"*": [{"object": 31, "signal": "SIGSEGV"}]});
        let results = unpack(&raw).unwrap();
        match &results["*"] {
            GroupData::Objects(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0]["signal"], json!("SIGSEGV"));
            }
            GroupData::Aggregates(_) => panic!("expected object records"),
        }
    }

    #[test]
    fn unknown_label_is_a_shape_error() {
        let raw = json!({"g": {"median(latency)": [5]}});
        let err = unpack(&raw).unwrap_err();
        assert!(err.to_string().contains("median(latency)"));
    }

    #[test]
    fn scalar_root_is_rejected() {
        assert!(unpack(&json!(42)).is_err());
        assert!(unpack(&json!({"g": "oops"})).is_err());
    }

    #[test]
    fn head_accepts_bare_scalars() {
        let raw = json!({"g": {"head(version)": "2.1.0"}});
        let results = unpack(&raw).unwrap();
        assert_eq!(
            results["g"].aggregate("head(version)"),
            Some(&AggregateValue::Head(json!("2.1.0")))
        );
    }
}
