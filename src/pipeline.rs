//! The three-stage fetch-and-merge pipeline.
//!
//! Stage 1 (benefits) is all-or-nothing; stages 2 and 3 are best-effort per
//! item. No failure is ever raised to the caller: the run always returns a
//! disease table and an error table, either of which may be empty.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::domain::{ErrorRecord, QueryParams, Stage};
use crate::envelope::{self, EnvelopeError, scalar_to_string};
use crate::nfz::NfzClient;
use crate::table::{DiseaseTable, ErrorTable};

const ICD10_LINK_TYPE: &str = "icd-10-diseases";

/// Fractional progress with a text label, reported during stages 2 and 3.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub fraction: Option<f64>,
}

/// Injected progress capability; the pipeline itself has no UI dependency.
pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// The two output tables of one run, stamped with the fetch time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchOutcome {
    pub diseases: DiseaseTable,
    pub errors: ErrorTable,
    pub fetched_at: String,
}

impl FetchOutcome {
    fn aborted(record: ErrorRecord) -> Self {
        let mut errors = ErrorTable::default();
        errors.push(record);
        Self::partial(DiseaseTable::default(), errors)
    }

    fn partial(diseases: DiseaseTable, errors: ErrorTable) -> Self {
        Self {
            diseases,
            errors,
            fetched_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// One stage-2 link row, stamped with its originating benefit code.
#[derive(Debug, Clone)]
struct TableLink {
    benefit_code: String,
    fields: BTreeMap<String, Value>,
}

impl TableLink {
    fn from_value(benefit_code: &str, row: &Value) -> Self {
        let fields = row
            .as_object()
            .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        Self {
            benefit_code: benefit_code.to_string(),
            fields,
        }
    }

    fn has_type_column(&self) -> bool {
        self.fields.contains_key("type")
    }

    fn link_type(&self) -> Option<String> {
        self.fields.get("type").and_then(scalar_to_string)
    }

    fn id(&self) -> Option<String> {
        self.fields.get("id").and_then(scalar_to_string)
    }
}

/// Runs benefits → index-of-tables → icd10-diseases for one parameter triple
/// and merges the fragments into the two flat tables.
pub fn run_pipeline(
    client: &dyn NfzClient,
    params: &QueryParams,
    sink: &dyn ProgressSink,
) -> FetchOutcome {
    tracing::info!(term = %params.term, year = %params.year, limit = %params.limit, "pipeline.start");

    // Stage 1: benefit lookup, fail-fast.
    sink.event(ProgressEvent {
        message: "Fetching benefit list...".to_string(),
        fraction: None,
    });
    let body = match client.benefits(&params.term, params.limit) {
        Ok(body) => body,
        Err(err) => {
            return FetchOutcome::aborted(ErrorRecord::new(Stage::Benefits, None, err.to_string()));
        }
    };
    let codes = match envelope::decode_benefits(&body) {
        Ok(codes) => codes,
        Err(EnvelopeError::EmptyData) => {
            return FetchOutcome::aborted(ErrorRecord::new(
                Stage::Benefits,
                None,
                format!("no results for benefit='{}'.", params.term),
            ));
        }
        Err(err) => {
            return FetchOutcome::aborted(ErrorRecord::new(Stage::Benefits, None, err.to_string()));
        }
    };

    // Stage 2: table index per benefit code, resilient per item.
    let mut errors = ErrorTable::default();
    let mut links: Vec<TableLink> = Vec::new();
    let total = codes.len();
    for (i, code) in codes.iter().enumerate() {
        match client.table_index(code, params.year) {
            Ok(body) => match envelope::decode_table_index(&body) {
                Ok(rows) => {
                    links.extend(rows.iter().map(|row| TableLink::from_value(code, row)));
                }
                Err(err) => errors.push(ErrorRecord::new(
                    Stage::IndexOfTables,
                    Some(code.clone()),
                    err.to_string(),
                )),
            },
            Err(err) => errors.push(ErrorRecord::new(
                Stage::IndexOfTables,
                Some(code.clone()),
                err.to_string(),
            )),
        }
        sink.event(ProgressEvent {
            message: format!("Fetching index-of-tables... ({}/{total})", i + 1),
            fraction: Some((i + 1) as f64 / total as f64),
        });
    }

    if links.is_empty() {
        tracing::warn!(errors = errors.len(), "pipeline.no_table_links");
        return FetchOutcome::partial(DiseaseTable::default(), errors);
    }

    // Stage 3: disease lookup per ICD-10 table link, resilient per item.
    if !links.iter().any(TableLink::has_type_column) {
        let mut columns: Vec<String> = links
            .iter()
            .flat_map(|link| link.fields.keys().cloned())
            .collect();
        columns.sort();
        columns.dedup();
        errors.push(ErrorRecord::new(
            Stage::IndexOfTables,
            None,
            format!("missing 'type' column in table index; available columns: {columns:?}"),
        ));
        return FetchOutcome::partial(DiseaseTable::default(), errors);
    }

    let icd_links: Vec<&TableLink> = links
        .iter()
        .filter(|link| link.link_type().as_deref() == Some(ICD10_LINK_TYPE))
        .collect();

    let mut diseases = DiseaseTable::default();
    let total_icd = icd_links.len();
    for (j, link) in icd_links.iter().enumerate() {
        match link.id() {
            Some(id) => match client.diseases(&id) {
                Ok(body) => match envelope::decode_diseases(&body) {
                    Ok(rows) => diseases.extend_from_values(&link.benefit_code, &rows),
                    Err(err) => errors.push(ErrorRecord::new(
                        Stage::Icd10Diseases,
                        Some(id),
                        err.to_string(),
                    )),
                },
                Err(err) => errors.push(ErrorRecord::new(
                    Stage::Icd10Diseases,
                    Some(id),
                    err.to_string(),
                )),
            },
            None => errors.push(ErrorRecord::new(
                Stage::Icd10Diseases,
                None,
                "missing 'id' in table link".to_string(),
            )),
        }
        if total_icd > 0 {
            sink.event(ProgressEvent {
                message: format!("Fetching ICD-10 diseases... ({}/{total_icd})", j + 1),
                fraction: Some((j + 1) as f64 / total_icd as f64),
            });
        }
    }

    diseases.dedup();
    diseases.sort_by_disease_code();
    tracing::info!(rows = diseases.len(), errors = errors.len(), "pipeline.done");
    FetchOutcome::partial(diseases, errors)
}
