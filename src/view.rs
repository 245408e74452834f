// SPDX-License-Identifier: MIT

//! Explicit view state. One immutable snapshot holds the loaded
//! records, the active filter and the filtered subset; every change
//! produces a new snapshot. The caller owns the single mutable
//! binding, so there is no hidden cross-handler coupling.

use crate::aggregate::{self, FilterSpec};
use crate::datetime::ChronoDateTime;
use crate::record::CaseRecord;

#[derive(Debug, Clone, Default)]
pub struct DatasetView {
    name: String,
    records: Vec<CaseRecord>,
    filter: FilterSpec,
    filtered: Vec<CaseRecord>,
    loaded_at: Option<ChronoDateTime>,
    last_error: Option<String>,
}

impl DatasetView {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All loaded records.
    pub fn records(&self) -> &[CaseRecord] {
        &self.records
    }

    /// The records passing the active filter.
    pub fn filtered(&self) -> &[CaseRecord] {
        &self.filtered
    }

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn loaded_at(&self) -> Option<&ChronoDateTime> {
        self.loaded_at.as_ref()
    }

    /// The error from the most recent failed refresh, cleared by the
    /// next successful load.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded_at.is_some()
    }

    /// Install a fresh load, keeping the active filter.
    pub fn with_records(self, records: Vec<CaseRecord>) -> Self {
        let filtered = aggregate::filter(&records, &self.filter);
        Self {
            records,
            filtered,
            loaded_at: Some(chrono::Utc::now().fixed_offset()),
            last_error: None,
            ..self
        }
    }

    /// Apply a new filter, recomputing the filtered subset.
    pub fn with_filter(self, filter: FilterSpec) -> Self {
        let filtered = aggregate::filter(&self.records, &filter);
        Self {
            filter,
            filtered,
            ..self
        }
    }

    /// Record a failed refresh. The previously loaded records remain
    /// visible.
    pub fn with_error(self, error: String) -> Self {
        Self {
            last_error: Some(error),
            ..self
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn records() -> Vec<CaseRecord> {
        crate::record::from_value(json!([
            {"id": "C-1", "attackMethod": "Phishing"},
            {"id": "C-2", "attackMethod": "Malware"},
        ]))
        .unwrap()
    }

    #[test]
    fn test_filter_transitions() {
        let view = DatasetView::new("cases").with_records(records());
        assert_eq!(view.records().len(), 2);
        assert_eq!(view.filtered().len(), 2);

        let spec = FilterSpec::parse("attack_method:Phishing", None).unwrap();
        let view = view.with_filter(spec);
        assert_eq!(view.filtered().len(), 1);
        assert_eq!(view.records().len(), 2);

        // Dropping the filter restores the full set.
        let view = view.with_filter(FilterSpec::default());
        assert_eq!(view.filtered().len(), 2);
    }

    #[test]
    fn test_failed_refresh_keeps_records() {
        let view = DatasetView::new("cases").with_records(records());
        let view = view.with_error("fetch failed".to_string());
        assert_eq!(view.records().len(), 2);
        assert_eq!(view.last_error(), Some("fetch failed"));

        // A later successful load clears the error.
        let view = view.with_records(records());
        assert!(view.last_error().is_none());
    }

    #[test]
    fn test_reload_reapplies_filter() {
        let spec = FilterSpec::parse("attack_method:Malware", None).unwrap();
        let view = DatasetView::new("cases").with_filter(spec);
        assert_eq!(view.filtered().len(), 0);

        let view = view.with_records(records());
        assert_eq!(view.filtered().len(), 1);
    }
}
