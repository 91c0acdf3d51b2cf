use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use serde_json::Value;

use crate::domain::ErrorRecord;
use crate::envelope::scalar_to_string;

pub const DISEASE_CODE: &str = "disease-code";
pub const DISEASE_NAME: &str = "disease-name";
pub const BENEFIT_CODE: &str = "benefit-code";

/// One ICD-10 disease row attributed to a benefit. Besides the benefit code
/// stamped by the pipeline, columns are whatever the API returned for the
/// row (disease code, disease name, and per-year numeric measures).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiseaseRow {
    #[serde(rename = "benefit-code")]
    pub benefit_code: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl DiseaseRow {
    pub fn from_value(benefit_code: &str, row: &Value) -> Self {
        let fields = row
            .as_object()
            .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        Self {
            benefit_code: benefit_code.to_string(),
            fields,
        }
    }

    pub fn disease_code(&self) -> Option<String> {
        self.fields.get(DISEASE_CODE).and_then(scalar_to_string)
    }

    pub fn disease_name(&self) -> Option<String> {
        self.fields.get(DISEASE_NAME).and_then(scalar_to_string)
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.fields.get(name).and_then(Value::as_f64)
    }

    fn dedup_key(&self) -> String {
        // BTreeMap keeps column order stable, so equal rows serialize equally.
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

/// The flat disease table produced by one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DiseaseTable {
    pub rows: Vec<DiseaseRow>,
}

impl DiseaseTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn extend_from_values(&mut self, benefit_code: &str, rows: &[Value]) {
        self.rows
            .extend(rows.iter().map(|row| DiseaseRow::from_value(benefit_code, row)));
    }

    /// Drops exactly-identical rows, keeping the first occurrence.
    pub fn dedup(&mut self) {
        let mut seen = HashSet::new();
        self.rows.retain(|row| seen.insert(row.dedup_key()));
    }

    /// Sorts ascending by `disease-code` when the column exists at all; rows
    /// without the column keep relative order at the end.
    pub fn sort_by_disease_code(&mut self) {
        if self.rows.iter().any(|row| row.disease_code().is_some()) {
            self.rows
                .sort_by_key(|row| match row.disease_code() {
                    Some(code) => (false, code),
                    None => (true, String::new()),
                });
        }
    }

    /// Case-insensitive substring filter on `disease-code`. An empty needle
    /// is the identity filter.
    pub fn filter_code_contains(&self, needle: &str) -> DiseaseTable {
        self.filter_contains(DISEASE_CODE, needle)
    }

    /// Case-insensitive substring filter on `disease-name`.
    pub fn filter_name_contains(&self, needle: &str) -> DiseaseTable {
        self.filter_contains(DISEASE_NAME, needle)
    }

    fn filter_contains(&self, column: &str, needle: &str) -> DiseaseTable {
        if needle.is_empty() {
            return self.clone();
        }
        let needle = needle.to_lowercase();
        DiseaseTable {
            rows: self
                .rows
                .iter()
                .filter(|row| {
                    row.fields
                        .get(column)
                        .and_then(scalar_to_string)
                        .map(|cell| cell.to_lowercase().contains(&needle))
                        .unwrap_or(false)
                })
                .cloned()
                .collect(),
        }
    }

    /// Sorted union of columns holding JSON numbers, the candidate chart
    /// metrics.
    pub fn numeric_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = self
            .rows
            .iter()
            .flat_map(|row| {
                row.fields
                    .iter()
                    .filter(|(_, value)| value.is_number())
                    .map(|(key, _)| key.clone())
            })
            .collect();
        columns.sort();
        columns.dedup();
        columns
    }

    /// Groupby-sum of `metric` keyed by `disease-code`, ascending by sum,
    /// last 20 kept (the chart series).
    pub fn sum_by_disease_code(&self, metric: &str) -> Vec<(String, f64)> {
        self.sum_by(metric, |row| row.disease_code())
    }

    /// Groupby-sum of `metric` keyed by `benefit-code`.
    pub fn sum_by_benefit_code(&self, metric: &str) -> Vec<(String, f64)> {
        self.sum_by(metric, |row| Some(row.benefit_code.clone()))
    }

    fn sum_by<F>(&self, metric: &str, key_of: F) -> Vec<(String, f64)>
    where
        F: Fn(&DiseaseRow) -> Option<String>,
    {
        let mut sums = HashMap::<String, f64>::new();
        for row in &self.rows {
            let Some(key) = key_of(row) else { continue };
            *sums.entry(key).or_insert(0.0) += row.metric(metric).unwrap_or(0.0);
        }
        let mut series: Vec<(String, f64)> = sums.into_iter().collect();
        series.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        let skip = series.len().saturating_sub(20);
        series.split_off(skip)
    }

    /// Stable export header: `benefit-code` first, then the sorted union of
    /// the rows' own columns.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = self
            .rows
            .iter()
            .flat_map(|row| row.fields.keys().cloned())
            .collect();
        columns.sort();
        columns.dedup();
        columns.insert(0, BENEFIT_CODE.to_string());
        columns
    }
}

/// Accumulated per-stage failures. Always carries the three columns, even
/// when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorTable {
    pub records: Vec<ErrorRecord>,
}

impl ErrorTable {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn push(&mut self, record: ErrorRecord) {
        self.records.push(record);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn table(rows: &[Value]) -> DiseaseTable {
        let mut out = DiseaseTable::default();
        for row in rows {
            let benefit = row
                .get(BENEFIT_CODE)
                .and_then(Value::as_str)
                .unwrap_or("B1")
                .to_string();
            let mut row = row.clone();
            if let Some(map) = row.as_object_mut() {
                map.remove(BENEFIT_CODE);
            }
            out.extend_from_values(&benefit, &[row]);
        }
        out
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let mut t = table(&[
            json!({"disease-code": "O80", "n": 1}),
            json!({"disease-code": "A01", "n": 2}),
            json!({"disease-code": "O80", "n": 1}),
        ]);
        t.dedup();
        assert_eq!(t.len(), 2);
        assert_eq!(t.rows[0].disease_code().as_deref(), Some("O80"));
    }

    #[test]
    fn sort_is_ascending_with_missing_codes_last() {
        let mut t = table(&[
            json!({"disease-code": "O80"}),
            json!({"other": 1}),
            json!({"disease-code": "A01"}),
        ]);
        t.sort_by_disease_code();
        assert_eq!(t.rows[0].disease_code().as_deref(), Some("A01"));
        assert_eq!(t.rows[1].disease_code().as_deref(), Some("O80"));
        assert_eq!(t.rows[2].disease_code(), None);
    }

    #[test]
    fn sort_skipped_when_column_absent() {
        let mut t = table(&[json!({"b": 2}), json!({"a": 1})]);
        let before = t.clone();
        t.sort_by_disease_code();
        assert_eq!(t, before);
    }

    #[test]
    fn code_filter_is_case_insensitive_contains() {
        let t = table(&[
            json!({"disease-code": "O80.1"}),
            json!({"disease-code": "C18"}),
        ]);
        let filtered = t.filter_code_contains("o80");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.rows[0].disease_code().as_deref(), Some("O80.1"));
    }

    #[test]
    fn filter_excludes_rows_without_the_column() {
        let t = table(&[
            json!({"disease-code": "O80"}),
            json!({"other": 1}),
        ]);
        assert_eq!(t.filter_code_contains("o8").len(), 1);

        // a non-empty needle against a table with no such column matches
        // nothing, it does not fall back to the identity filter
        let no_column = table(&[json!({"other": 1}), json!({"other": 2})]);
        assert!(no_column.filter_code_contains("o8").is_empty());
        assert!(no_column.filter_name_contains("x").is_empty());
    }

    #[test]
    fn empty_filter_is_identity() {
        let t = table(&[json!({"disease-code": "O80"}), json!({"x": 1})]);
        assert_eq!(t.filter_code_contains(""), t);
        assert_eq!(t.filter_name_contains(""), t);
    }

    #[test]
    fn numeric_columns_are_the_sorted_union() {
        let t = table(&[
            json!({"disease-code": "O80", "patients": 10}),
            json!({"disease-code": "C18", "hospitalizations": 2.5}),
        ]);
        assert_eq!(t.numeric_columns(), vec!["hospitalizations", "patients"]);
    }

    #[test]
    fn sum_by_groups_and_sorts_ascending() {
        let t = table(&[
            json!({"disease-code": "O80", "n": 3}),
            json!({"disease-code": "O80", "n": 4}),
            json!({"disease-code": "A01", "n": 2}),
        ]);
        assert_eq!(
            t.sum_by_disease_code("n"),
            vec![("A01".to_string(), 2.0), ("O80".to_string(), 7.0)]
        );
    }

    #[test]
    fn sum_by_benefit_uses_stamped_code() {
        let t = table(&[
            json!({"benefit-code": "B1", "n": 1}),
            json!({"benefit-code": "B2", "n": 5}),
            json!({"benefit-code": "B1", "n": 2}),
        ]);
        assert_eq!(
            t.sum_by_benefit_code("n"),
            vec![("B1".to_string(), 3.0), ("B2".to_string(), 5.0)]
        );
    }

    #[test]
    fn columns_start_with_benefit_code() {
        let t = table(&[json!({"disease-code": "O80", "n": 1})]);
        assert_eq!(t.columns(), vec!["benefit-code", "disease-code", "n"]);
    }
}
