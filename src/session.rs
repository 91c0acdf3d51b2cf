use std::time::Duration;

use crate::pipeline::FetchOutcome;
use crate::table::DiseaseTable;

/// How filter edits take effect. Both interaction modes of the dashboard are
/// kept: `Immediate` applies on every keystroke, `Deferred` waits for an
/// explicit apply action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    #[default]
    Immediate,
    Deferred,
}

impl FilterMode {
    pub fn toggled(self) -> Self {
        match self {
            FilterMode::Immediate => FilterMode::Deferred,
            FilterMode::Deferred => FilterMode::Immediate,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterMode::Immediate => "immediate",
            FilterMode::Deferred => "deferred",
        }
    }
}

/// Per-session mutable state of the presentation layer. The pipeline stays a
/// pure function of its three scalar inputs; everything the UI remembers
/// between interactions lives here.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub filter_mode: FilterMode,
    pub code_input: String,
    pub name_input: String,
    code_applied: String,
    name_applied: String,
    pub chart_metric: Option<String>,
    pub outcome: Option<FetchOutcome>,
    pub last_runtime: Option<Duration>,
}

impl SessionState {
    pub fn new(filter_mode: FilterMode) -> Self {
        Self {
            filter_mode,
            ..Self::default()
        }
    }

    /// Stores the tables of a finished run and reconciles the chart metric
    /// with the columns actually present.
    pub fn set_outcome(&mut self, outcome: FetchOutcome, runtime: Duration) {
        let numeric = outcome.diseases.numeric_columns();
        let keep = self
            .chart_metric
            .as_ref()
            .is_some_and(|metric| numeric.contains(metric));
        if !keep {
            self.chart_metric = numeric.first().cloned();
        }
        self.outcome = Some(outcome);
        self.last_runtime = Some(runtime);
    }

    pub fn edit_code_input(&mut self, value: String) {
        self.code_input = value;
        if self.filter_mode == FilterMode::Immediate {
            self.code_applied = self.code_input.clone();
        }
    }

    pub fn edit_name_input(&mut self, value: String) {
        self.name_input = value;
        if self.filter_mode == FilterMode::Immediate {
            self.name_applied = self.name_input.clone();
        }
    }

    /// Copies the current inputs into the applied values (the "apply
    /// filters" button of deferred mode).
    pub fn apply_filters(&mut self) {
        self.code_applied = self.code_input.clone();
        self.name_applied = self.name_input.clone();
    }

    /// Clears both the input fields and the applied values.
    pub fn clear_filters(&mut self) {
        self.code_input.clear();
        self.name_input.clear();
        self.code_applied.clear();
        self.name_applied.clear();
    }

    pub fn applied_code_filter(&self) -> &str {
        &self.code_applied
    }

    pub fn applied_name_filter(&self) -> &str {
        &self.name_applied
    }

    pub fn has_active_filters(&self) -> bool {
        !self.code_applied.is_empty() || !self.name_applied.is_empty()
    }

    /// The filtered view of the last run's disease table.
    pub fn visible(&self) -> DiseaseTable {
        match &self.outcome {
            Some(outcome) => outcome
                .diseases
                .filter_code_contains(&self.code_applied)
                .filter_name_contains(&self.name_applied),
            None => DiseaseTable::default(),
        }
    }

    pub fn numeric_columns(&self) -> Vec<String> {
        self.outcome
            .as_ref()
            .map(|outcome| outcome.diseases.numeric_columns())
            .unwrap_or_default()
    }

    /// Moves the chart metric selection forward or backward through the
    /// available numeric columns.
    pub fn cycle_metric(&mut self, forward: bool) {
        let numeric = self.numeric_columns();
        if numeric.is_empty() {
            self.chart_metric = None;
            return;
        }
        let current = self
            .chart_metric
            .as_ref()
            .and_then(|metric| numeric.iter().position(|c| c == metric))
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % numeric.len()
        } else {
            (current + numeric.len() - 1) % numeric.len()
        };
        self.chart_metric = Some(numeric[next].clone());
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::table::ErrorTable;

    use super::*;

    fn outcome_with_rows() -> FetchOutcome {
        let mut diseases = DiseaseTable::default();
        diseases.extend_from_values(
            "B1",
            &[
                json!({"disease-code": "O80", "disease-name": "delivery", "patients": 10}),
                json!({"disease-code": "C18", "disease-name": "colon", "patients": 3}),
            ],
        );
        FetchOutcome {
            diseases,
            errors: ErrorTable::default(),
            fetched_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn immediate_mode_applies_on_edit() {
        let mut session = SessionState::new(FilterMode::Immediate);
        session.set_outcome(outcome_with_rows(), Duration::from_secs(1));
        session.edit_code_input("o80".to_string());
        assert_eq!(session.visible().len(), 1);
    }

    #[test]
    fn deferred_mode_waits_for_apply() {
        let mut session = SessionState::new(FilterMode::Deferred);
        session.set_outcome(outcome_with_rows(), Duration::from_secs(1));
        session.edit_code_input("o80".to_string());
        assert_eq!(session.visible().len(), 2);
        session.apply_filters();
        assert_eq!(session.visible().len(), 1);
    }

    #[test]
    fn clear_resets_inputs_and_applied_values() {
        let mut session = SessionState::new(FilterMode::Deferred);
        session.set_outcome(outcome_with_rows(), Duration::from_secs(1));
        session.edit_name_input("colon".to_string());
        session.apply_filters();
        session.clear_filters();
        assert!(session.code_input.is_empty());
        assert!(session.name_input.is_empty());
        assert!(!session.has_active_filters());
        assert_eq!(session.visible().len(), 2);
    }

    #[test]
    fn metric_defaults_to_first_numeric_column() {
        let mut session = SessionState::default();
        session.set_outcome(outcome_with_rows(), Duration::from_secs(1));
        assert_eq!(session.chart_metric.as_deref(), Some("patients"));
    }

    #[test]
    fn metric_kept_across_runs_when_still_present() {
        let mut session = SessionState::default();
        session.chart_metric = Some("patients".to_string());
        session.set_outcome(outcome_with_rows(), Duration::from_secs(1));
        assert_eq!(session.chart_metric.as_deref(), Some("patients"));
    }
}
