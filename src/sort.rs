//! Group ordering for the print pipeline.
//!
//! A sort field selects one of three comparators by inspecting an arbitrary
//! sampled group, in priority order: the upper bound of `range(field)`, the
//! scalar of `unique(field)`, else the opaque group key. All comparators
//! order descending by default ("newest first" for ranges) and share one
//! direction toggle so `--reverse` inverts every ordering uniformly.

use std::cmp::Ordering;

use serde_json::Value;

use crate::response::{AggregateValue, GroupData};

/// Explicit sort direction, threaded through the pipeline as configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    /// Descending by the sort key (the default ordering).
    #[default]
    Forward,
    /// Inverted; set by `--reverse`.
    Reverse,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Forward => ordering,
            Self::Reverse => ordering.reverse(),
        }
    }
}

/// The comparator chosen for a sort request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SortKey {
    /// Compare by the upper bound of this `range(field)` label.
    RangeUpper(String),
    /// Compare by the scalar of this `unique(field)` label.
    UniqueValue(String),
    /// Compare group keys as opaque strings.
    GroupKey,
}

/// Select a comparator by first match against a sampled group's columns.
pub fn select_key(sample: &GroupData, sort_field: &str) -> SortKey {
    let range_label = format!("range({sort_field})");
    if sample.aggregate(&range_label).is_some() {
        return SortKey::RangeUpper(range_label);
    }
    let unique_label = format!("unique({sort_field})");
    if sample.aggregate(&unique_label).is_some() {
        return SortKey::UniqueValue(unique_label);
    }
    SortKey::GroupKey
}

/// Compare two `(group key, data)` pairs under `key` and `direction`.
/// Groups missing the sort label compare equal, so the stable sort keeps
/// their relative order.
pub fn compare(
    a: &(String, GroupData),
    b: &(String, GroupData),
    key: &SortKey,
    direction: SortDirection,
) -> Ordering {
    let ordering = match key {
        SortKey::RangeUpper(label) => {
            let upper = |data: &GroupData| match data.aggregate(label) {
                Some(AggregateValue::Range(_, max)) => Some(*max),
                _ => None,
            };
            match (upper(&a.1), upper(&b.1)) {
                (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            }
        }
        SortKey::UniqueValue(label) => {
            let scalar = |data: &GroupData| match data.aggregate(label) {
                Some(AggregateValue::Unique(v)) => Some(v.clone()),
                _ => None,
            };
            match (scalar(&a.1), scalar(&b.1)) {
                (Some(x), Some(y)) => value_cmp(&y, &x),
                _ => Ordering::Equal,
            }
        }
        SortKey::GroupKey => b.0.cmp(&a.0),
    };

    direction.apply(ordering)
}

/// Total order over scalar JSON values: numbers numerically, strings
/// lexically, mixed kinds by their serialized form.
fn value_cmp(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => match (a.as_str(), b.as_str()) {
            (Some(x), Some(y)) => x.cmp(y),
            _ => a.to_string().cmp(&b.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn range_group(key: &str, min: f64, max: f64) -> (String, GroupData) {
        let mut map = BTreeMap::new();
        map.insert(
            "range(latency)".to_string(),
            AggregateValue::Range(min, max),
        );
        (key.to_string(), GroupData::Aggregates(map))
    }

    fn unique_group(key: &str, value: Value) -> (String, GroupData) {
        let mut map = BTreeMap::new();
        map.insert("unique(host)".to_string(), AggregateValue::Unique(value));
        (key.to_string(), GroupData::Aggregates(map))
    }

    #[test]
    fn selects_range_before_unique() {
        let mut map = BTreeMap::new();
        map.insert("range(x)".to_string(), AggregateValue::Range(0.0, 1.0));
        map.insert("unique(x)".to_string(), AggregateValue::Unique(json!(1)));
        let sample = GroupData::Aggregates(map);
        assert_eq!(
            select_key(&sample, "x"),
            SortKey::RangeUpper("range(x)".to_string())
        );
    }

    #[test]
    fn falls_back_to_group_key() {
        let sample = GroupData::Aggregates(BTreeMap::new());
        assert_eq!(select_key(&sample, "x"), SortKey::GroupKey);
    }

    #[test]
    fn range_orders_by_upper_bound_descending() {
        let a = range_group("a", 0.0, 5.0);
        let b = range_group("b", 0.0, 9.0);
        let key = SortKey::RangeUpper("range(latency)".to_string());
        assert_eq!(
            compare(&a, &b, &key, SortDirection::Forward),
            Ordering::Greater
        );
        assert_eq!(
            compare(&b, &a, &key, SortDirection::Forward),
            Ordering::Less
        );
    }

    #[test]
    fn reverse_inverts_every_comparator() {
        let a = range_group("a", 0.0, 5.0);
        let b = range_group("b", 0.0, 9.0);
        let key = SortKey::RangeUpper("range(latency)".to_string());
        let forward = compare(&a, &b, &key, SortDirection::Forward);
        let reverse = compare(&a, &b, &key, SortDirection::Reverse);
        assert_eq!(forward, reverse.reverse());

        let u = unique_group("u", json!("alpha"));
        let v = unique_group("v", json!("beta"));
        let key = SortKey::UniqueValue("unique(host)".to_string());
        let forward = compare(&u, &v, &key, SortDirection::Forward);
        let reverse = compare(&u, &v, &key, SortDirection::Reverse);
        assert_eq!(forward, reverse.reverse());
    }

    #[test]
    fn unique_compares_numbers_numerically() {
        let a = unique_group("a", json!(9));
        let b = unique_group("b", json!(100));
        let key = SortKey::UniqueValue("unique(host)".to_string());
        // 100 > 9, so b sorts first under the default descending order.
        assert_eq!(
            compare(&a, &b, &key, SortDirection::Forward),
            Ordering::Greater
        );
    }

    #[test]
    fn group_key_comparator_is_descending_by_default() {
        let a = ("alpha".to_string(), GroupData::Aggregates(BTreeMap::new()));
        let b = ("beta".to_string(), GroupData::Aggregates(BTreeMap::new()));
        assert_eq!(
            compare(&a, &b, &SortKey::GroupKey, SortDirection::Forward),
            Ordering::Greater
        );
        assert_eq!(
            compare(&a, &b, &SortKey::GroupKey, SortDirection::Reverse),
            Ordering::Less
        );
    }

    #[test]
    fn missing_sort_label_compares_equal() {
        let a = range_group("a", 0.0, 5.0);
        let b = ("b".to_string(), GroupData::Aggregates(BTreeMap::new()));
        let key = SortKey::RangeUpper("range(latency)".to_string());
        assert_eq!(
            compare(&a, &b, &key, SortDirection::Forward),
            Ordering::Equal
        );
    }
}
