// SPDX-License-Identifier: MIT

//! The record aggregator: filter a flat record collection with a
//! declarative predicate spec, then produce ordered count/percentage
//! breakdowns. Purely functional, no I/O, and defensive against the
//! loosely-typed records it operates on.

use indexmap::IndexMap;

use crate::datetime::{self, bucket_key, ChronoDateTime, DateBucket};
use crate::prelude::*;
use crate::queryparser::{QueryElement, QueryStringParseError, QueryValue};
use crate::record::{CaseRecord, UNKNOWN};

/// A declarative filter: field equality predicates, an optional
/// inclusive date range, and free-text terms. Filtering is
/// conjunctive; a record matches only if it satisfies every
/// predicate.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    /// field -> accepted value. An empty value means "don't filter on
    /// this field".
    pub fields: Vec<(String, String)>,
    /// field -> rejected value.
    pub negated_fields: Vec<(String, String)>,
    /// Case-insensitive substring terms over all stringifiable
    /// fields. All must match.
    pub terms: Vec<String>,
    /// Substring terms that must not match.
    pub negated_terms: Vec<String>,
    pub from: Option<ChronoDateTime>,
    pub to: Option<ChronoDateTime>,
}

impl FilterSpec {
    /// Parse a user query string into a filter spec.
    pub fn parse(input: &str, tz_offset: Option<&str>) -> Result<Self, QueryStringParseError> {
        let elements = crate::queryparser::parse(input, tz_offset)?;
        Ok(Self::from_elements(elements))
    }

    pub fn from_elements(elements: Vec<QueryElement>) -> Self {
        let mut spec = Self::default();
        for element in elements {
            match element.value {
                QueryValue::String(term) => {
                    if element.negated {
                        spec.negated_terms.push(term.to_lowercase());
                    } else {
                        spec.terms.push(term.to_lowercase());
                    }
                }
                QueryValue::KeyValue(key, value) => {
                    if element.negated {
                        spec.negated_fields.push((key, value));
                    } else {
                        spec.fields.push((key, value));
                    }
                }
                QueryValue::From(ts) => spec.from = Some(ts),
                QueryValue::To(ts) => spec.to = Some(ts),
            }
        }
        spec
    }

    /// Set the lower range bound from a possibly malformed user
    /// supplied string. A bound that doesn't parse is clamped to "no
    /// bound" with a diagnostic rather than failing the filter.
    pub fn set_from_lenient(&mut self, input: &str, tz_offset: Option<&str>) {
        match datetime::parse(input, tz_offset) {
            Ok(ts) => self.from = Some(ts),
            Err(err) => {
                warn!("Ignoring invalid from bound {:?}: {}", input, err);
                self.from = None;
            }
        }
    }

    /// Like `set_from_lenient` for the upper bound.
    pub fn set_to_lenient(&mut self, input: &str, tz_offset: Option<&str>) {
        match datetime::parse(input, tz_offset) {
            Ok(ts) => self.to = Some(ts),
            Err(err) => {
                warn!("Ignoring invalid to bound {:?}: {}", input, err);
                self.to = None;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
            && self.negated_fields.is_empty()
            && self.terms.is_empty()
            && self.negated_terms.is_empty()
            && self.from.is_none()
            && self.to.is_none()
    }

    pub fn matches(&self, record: &CaseRecord) -> bool {
        for (field, accepted) in &self.fields {
            // Empty and wildcard values accept everything.
            if accepted.is_empty() || accepted == "*" {
                continue;
            }
            match record.field(field) {
                Some(value) if value.as_ref() == accepted => {}
                _ => return false,
            }
        }

        for (field, rejected) in &self.negated_fields {
            if rejected.is_empty() || rejected == "*" {
                continue;
            }
            if let Some(value) = record.field(field) {
                if value.as_ref() == rejected {
                    return false;
                }
            }
        }

        if self.from.is_some() || self.to.is_some() {
            // A date range can only be satisfied by a record with a
            // parseable date. Both bounds are inclusive.
            let date = match &record.date {
                Some(date) => date,
                None => return false,
            };
            if let Some(from) = &self.from {
                if date < from {
                    return false;
                }
            }
            if let Some(to) = &self.to {
                if date > to {
                    return false;
                }
            }
        }

        if !self.terms.is_empty() || !self.negated_terms.is_empty() {
            let text = record.searchable_text();
            for term in &self.terms {
                if !text.contains(term.as_str()) {
                    return false;
                }
            }
            for term in &self.negated_terms {
                if text.contains(term.as_str()) {
                    return false;
                }
            }
        }

        true
    }
}

/// What to partition records by: a named field, or the found-on date
/// truncated to a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupKey {
    Field(String),
    Date(DateBucket),
}

impl GroupKey {
    /// Bucket names parse as date buckets, anything else is a field
    /// name.
    pub fn parse(s: &str) -> Self {
        match DateBucket::parse(s) {
            Some(bucket) => GroupKey::Date(bucket),
            None => GroupKey::Field(s.to_string()),
        }
    }

    pub fn is_time_series(&self) -> bool {
        matches!(self, GroupKey::Date(_))
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            GroupKey::Field(name) => write!(f, "{}", name),
            GroupKey::Date(bucket) => write!(f, "{}", bucket),
        }
    }
}

/// An ordered (key, count) breakdown. `total` is the size of the
/// input collection, which always equals the sum of the counts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupedCounts {
    pub rows: Vec<(String, u64)>,
    pub total: u64,
}

/// Filter a record collection. Returns a new collection; the source is
/// never mutated.
pub fn filter(records: &[CaseRecord], spec: &FilterSpec) -> Vec<CaseRecord> {
    records
        .iter()
        .filter(|r| spec.matches(r))
        .cloned()
        .collect()
}

/// Tally records per distinct group key. Categorical breakdowns are
/// sorted count-descending with ties broken by first-encounter order;
/// date-bucketed breakdowns are sorted chronologically. Records
/// missing the grouping field count under `"Unknown"` so the counts
/// always sum to the input size.
pub fn group_and_count(records: &[CaseRecord], key: &GroupKey) -> GroupedCounts {
    let mut tally: IndexMap<String, u64> = IndexMap::new();
    for record in records {
        let group = match key {
            GroupKey::Field(name) => record
                .field(name)
                .map(|v| v.into_owned())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            GroupKey::Date(bucket) => record
                .date
                .as_ref()
                .map(|dt| bucket_key(dt, *bucket))
                .unwrap_or_else(|| UNKNOWN.to_string()),
        };
        *tally.entry(group).or_insert(0) += 1;
    }

    let mut rows: Vec<(String, u64)> = tally.into_iter().collect();
    if key.is_time_series() {
        // Bucket keys are built to sort chronologically. "Unknown"
        // sorts after any year and lands at the end.
        rows.sort_by(|a, b| a.0.cmp(&b.0));
    } else {
        // Stable sort: equal counts keep first-encounter order.
        rows.sort_by(|a, b| b.1.cmp(&a.1));
    }

    let total = rows.iter().map(|(_, count)| *count).sum();
    GroupedCounts { rows, total }
}

/// Percentage of `count` over `total`, rounded to one decimal place.
/// Zero when the total is zero so no NaN reaches rendered output.
pub fn percentage_of(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = count as f64 * 100.0 / total as f64;
    (pct * 10.0).round() / 10.0
}

/// Cap a breakdown to its `n` largest entries, folding the remainder
/// into a trailing "Other" bucket. At most `n + 1` rows are returned
/// and the total is preserved.
pub fn top_n(counts: GroupedCounts, n: usize) -> GroupedCounts {
    if counts.rows.len() <= n {
        return counts;
    }
    let total = counts.total;
    let mut rows: Vec<(String, u64)> = counts.rows;
    let folded: u64 = rows.drain(n..).map(|(_, count)| count).sum();
    if folded > 0 {
        rows.push(("Other".to_string(), folded));
    }
    GroupedCounts { rows, total }
}

#[cfg(test)]
mod test {
    use super::*;

    fn records() -> Vec<CaseRecord> {
        crate::record::from_value(json!([
            {"id": "C-1", "foundOn": "2024-05-16", "attackMethod": "Phishing", "region": "US"},
            {"id": "C-2", "foundOn": "2024-05-17", "attackMethod": "Phishing", "region": "DE"},
            {"id": "C-3", "foundOn": "2024-06-01", "attackMethod": "Malware", "region": "US"},
            {"id": "C-4", "foundOn": "bogus", "attackMethod": "Malware", "region": "US"},
            {"id": "C-5", "region": "FR"},
        ]))
        .unwrap()
    }

    #[test]
    fn test_filter_conjunction() {
        let records = records();
        let spec = FilterSpec {
            fields: vec![("attack_method".to_string(), "Phishing".to_string())],
            ..Default::default()
        };
        let out = filter(&records, &spec);
        assert_eq!(out.len(), 2);

        let spec = FilterSpec {
            fields: vec![
                ("attack_method".to_string(), "Phishing".to_string()),
                ("region".to_string(), "US".to_string()),
            ],
            ..Default::default()
        };
        let out = filter(&records, &spec);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id.as_deref(), Some("C-1"));

        // The source collection is untouched.
        assert_eq!(records.len(), 5);
    }

    #[test]
    fn test_filter_empty_value_accepts_all() {
        let records = records();
        let spec = FilterSpec {
            fields: vec![
                ("attack_method".to_string(), "".to_string()),
                ("region".to_string(), "*".to_string()),
            ],
            ..Default::default()
        };
        assert_eq!(filter(&records, &spec).len(), 5);
    }

    #[test]
    fn test_filter_date_range_inclusive() {
        let records = records();
        let mut spec = FilterSpec::default();
        spec.set_from_lenient("2024-05-17", None);
        spec.set_to_lenient("2024-06-01", None);
        let out = filter(&records, &spec);
        // Both bounds inclusive; records without a parseable date are
        // excluded from date-filtered results.
        let ids: Vec<_> = out.iter().map(|r| r.id.as_deref().unwrap()).collect();
        assert_eq!(ids, vec!["C-2", "C-3"]);
    }

    #[test]
    fn test_filter_malformed_bound_clamps() {
        let records = records();
        let mut spec = FilterSpec::default();
        spec.set_from_lenient("not-a-date", None);
        assert!(spec.from.is_none());
        // No bound ends up set, so nothing is filtered out.
        assert_eq!(filter(&records, &spec).len(), 5);
    }

    #[test]
    fn test_filter_free_text() {
        let records = records();
        let spec = FilterSpec::parse("phishing", None).unwrap();
        assert_eq!(filter(&records, &spec).len(), 2);

        let spec = FilterSpec::parse("phishing -region:DE", None).unwrap();
        let out = filter(&records, &spec);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id.as_deref(), Some("C-1"));

        let spec = FilterSpec::parse("-malware", None).unwrap();
        assert_eq!(filter(&records, &spec).len(), 3);
    }

    #[test]
    fn test_count_conservation() {
        let records = records();
        for key in ["attack_method", "region", "server", "day", "month"] {
            let counts = group_and_count(&records, &GroupKey::parse(key));
            let sum: u64 = counts.rows.iter().map(|(_, c)| *c).sum();
            assert_eq!(sum, records.len() as u64, "group key {}", key);
            assert_eq!(counts.total, records.len() as u64);
        }
    }

    #[test]
    fn test_unknown_bucketing() {
        let records = records();
        let counts = group_and_count(&records, &GroupKey::parse("attack_method"));
        let unknown = counts.rows.iter().find(|(k, _)| k == UNKNOWN).unwrap();
        assert_eq!(unknown.1, 1);

        // Every record missing the field lands in Unknown, none are
        // dropped.
        let counts = group_and_count(&records, &GroupKey::parse("server"));
        assert_eq!(counts.rows, vec![(UNKNOWN.to_string(), 5)]);
    }

    #[test]
    fn test_categorical_order() {
        let records = records();
        let counts = group_and_count(&records, &GroupKey::parse("attack_method"));
        // Phishing and Malware tie at 2; Phishing was seen first.
        assert_eq!(
            counts.rows,
            vec![
                ("Phishing".to_string(), 2),
                ("Malware".to_string(), 2),
                (UNKNOWN.to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_time_series_order() {
        let records = records();
        let counts = group_and_count(&records, &GroupKey::parse("month"));
        assert_eq!(
            counts.rows,
            vec![
                ("2024-05".to_string(), 2),
                ("2024-06".to_string(), 1),
                (UNKNOWN.to_string(), 2),
            ]
        );
    }

    #[test]
    fn test_percentage_of() {
        assert_eq!(percentage_of(0, 0), 0.0);
        assert_eq!(percentage_of(5, 0), 0.0);
        assert_eq!(percentage_of(1, 3), 33.3);
        assert_eq!(percentage_of(2, 3), 66.7);
        assert_eq!(percentage_of(3, 3), 100.0);
    }

    #[test]
    fn test_top_n() {
        let counts = GroupedCounts {
            rows: vec![
                ("a".to_string(), 10),
                ("b".to_string(), 5),
                ("c".to_string(), 3),
                ("d".to_string(), 2),
                ("e".to_string(), 1),
            ],
            total: 21,
        };

        let top = top_n(counts.clone(), 2);
        assert_eq!(top.rows.len(), 3);
        assert_eq!(top.rows[2], ("Other".to_string(), 6));
        assert_eq!(top.total, 21);
        let sum: u64 = top.rows.iter().map(|(_, c)| *c).sum();
        assert_eq!(sum, 21);

        // No folding needed, no Other row.
        let top = top_n(counts.clone(), 5);
        assert_eq!(top.rows.len(), 5);

        let top = top_n(counts, 10);
        assert_eq!(top.rows.len(), 5);
    }
}
