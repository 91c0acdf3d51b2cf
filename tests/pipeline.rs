use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use nfz_icd10_explorer::cache::CachedPipeline;
use nfz_icd10_explorer::domain::{Limit, QueryParams, SearchTerm, Stage, Year};
use nfz_icd10_explorer::error::ExplorerError;
use nfz_icd10_explorer::nfz::NfzClient;
use nfz_icd10_explorer::pipeline::{ProgressEvent, ProgressSink, run_pipeline};

#[derive(Default)]
struct CallCounts {
    benefits: usize,
    tables: usize,
    diseases: usize,
}

/// Canned three-endpoint client. A missing entry in a map means that call
/// fails with an HTTP-level error. The counters are behind a shared handle
/// so they stay readable after the client moves into a pipeline.
struct MockNfz {
    benefits_body: Option<Value>,
    table_bodies: HashMap<String, Value>,
    disease_bodies: HashMap<String, Value>,
    calls: Arc<Mutex<CallCounts>>,
}

impl MockNfz {
    fn new(benefits_body: Option<Value>) -> Self {
        Self {
            benefits_body,
            table_bodies: HashMap::new(),
            disease_bodies: HashMap::new(),
            calls: Arc::new(Mutex::new(CallCounts::default())),
        }
    }

    fn counts(&self) -> (usize, usize, usize) {
        snapshot(&self.calls)
    }
}

fn snapshot(calls: &Arc<Mutex<CallCounts>>) -> (usize, usize, usize) {
    let calls = calls.lock().unwrap();
    (calls.benefits, calls.tables, calls.diseases)
}

impl NfzClient for MockNfz {
    fn benefits(&self, _term: &SearchTerm, _limit: Limit) -> Result<Value, ExplorerError> {
        self.calls.lock().unwrap().benefits += 1;
        self.benefits_body
            .clone()
            .ok_or_else(|| ExplorerError::NfzHttp("connection refused".to_string()))
    }

    fn table_index(&self, code: &str, _year: Year) -> Result<Value, ExplorerError> {
        self.calls.lock().unwrap().tables += 1;
        self.table_bodies
            .get(code)
            .cloned()
            .ok_or_else(|| ExplorerError::NfzStatus {
                status: 500,
                message: format!("server error for {code}"),
            })
    }

    fn diseases(&self, table_id: &str) -> Result<Value, ExplorerError> {
        self.calls.lock().unwrap().diseases += 1;
        self.disease_bodies
            .get(table_id)
            .cloned()
            .ok_or_else(|| ExplorerError::NfzHttp(format!("timeout for table {table_id}")))
    }
}

struct NullSink;

impl ProgressSink for NullSink {
    fn event(&self, _event: ProgressEvent) {}
}

struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl ProgressSink for RecordingSink {
    fn event(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn params(term: &str) -> QueryParams {
    QueryParams {
        term: term.parse().unwrap(),
        year: Year::new(2019).unwrap(),
        limit: Limit::new(25).unwrap(),
    }
}

fn benefits_body(codes: &[&str]) -> Value {
    let items: Vec<Value> = codes.iter().map(|code| json!({"code": code})).collect();
    json!({"data": items})
}

fn table_index_body(links: &[(&str, u64)]) -> Value {
    let tables: Vec<Value> = links
        .iter()
        .map(|(link_type, id)| json!({"type": link_type, "id": id}))
        .collect();
    json!({"data": {"attributes": {"years": [{"tables": tables}]}}})
}

fn diseases_body(rows: Vec<Value>) -> Value {
    json!({"data": {"attributes": {"data": rows}}})
}

#[test]
fn benefits_failure_aborts_with_single_error() {
    let client = MockNfz::new(None);
    let outcome = run_pipeline(&client, &params("rozrodcz"), &NullSink);

    assert!(outcome.diseases.is_empty());
    assert_eq!(outcome.errors.len(), 1);
    let record = &outcome.errors.records[0];
    assert_eq!(record.stage, Stage::Benefits);
    assert_eq!(record.item_id, None);
    assert!(record.message.contains("connection refused"));
    assert_eq!(client.counts(), (1, 0, 0));
}

#[test]
fn empty_benefit_list_reports_no_results() {
    let client = MockNfz::new(Some(json!({"data": []})));
    let outcome = run_pipeline(&client, &params("zzz"), &NullSink);

    assert!(outcome.diseases.is_empty());
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors.records[0].message, "no results for benefit='zzz'.");
}

#[test]
fn missing_data_key_aborts_with_shape_error() {
    let client = MockNfz::new(Some(json!({"meta": {}})));
    let outcome = run_pipeline(&client, &params("rozrodcz"), &NullSink);

    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors.records[0].stage, Stage::Benefits);
    assert!(outcome.errors.records[0].message.contains("'data'"));
    assert_eq!(client.counts(), (1, 0, 0));
}

#[test]
fn happy_path_merges_dedups_and_sorts() {
    let mut client = MockNfz::new(Some(benefits_body(&["B1", "B2"])));
    client.table_bodies.insert(
        "B1".to_string(),
        table_index_body(&[("icd-10-diseases", 10), ("general-data", 99)]),
    );
    client
        .table_bodies
        .insert("B2".to_string(), table_index_body(&[("icd-10-diseases", 20)]));
    client.disease_bodies.insert(
        "10".to_string(),
        diseases_body(vec![
            json!({"disease-code": "O80", "disease-name": "delivery", "patients": 5, "table-id": 10}),
            json!({"disease-code": "C18", "disease-name": "colon", "patients": 2, "table-id": 10}),
        ]),
    );
    client.disease_bodies.insert(
        "20".to_string(),
        diseases_body(vec![
            json!({"disease-code": "Z38", "disease-name": "newborn", "patients": 7}),
            json!({"disease-code": "Z38", "disease-name": "newborn", "patients": 7}),
        ]),
    );

    let outcome = run_pipeline(&client, &params("rozrodcz"), &NullSink);

    assert!(outcome.errors.is_empty());
    // the duplicate Z38 row collapses, the non-ICD link is never fetched
    assert_eq!(outcome.diseases.len(), 3);
    assert_eq!(client.counts(), (1, 2, 2));

    let codes: Vec<Option<String>> = outcome
        .diseases
        .rows
        .iter()
        .map(|row| row.disease_code())
        .collect();
    assert_eq!(
        codes,
        vec![
            Some("C18".to_string()),
            Some("O80".to_string()),
            Some("Z38".to_string())
        ]
    );

    let o80 = &outcome.diseases.rows[1];
    assert_eq!(o80.benefit_code, "B1");
    assert!(o80.fields.get("table-id").is_none());
}

#[test]
fn table_index_failures_are_collected_per_code() {
    let mut client = MockNfz::new(Some(benefits_body(&["B1", "B2", "B3"])));
    client
        .table_bodies
        .insert("B2".to_string(), table_index_body(&[("icd-10-diseases", 20)]));
    client.disease_bodies.insert(
        "20".to_string(),
        diseases_body(vec![json!({"disease-code": "A00", "patients": 1})]),
    );

    let outcome = run_pipeline(&client, &params("rozrodcz"), &NullSink);

    assert_eq!(outcome.diseases.len(), 1);
    assert_eq!(outcome.errors.len(), 2);
    let failed: Vec<Option<String>> = outcome
        .errors
        .records
        .iter()
        .map(|record| record.item_id.clone())
        .collect();
    assert_eq!(failed, vec![Some("B1".to_string()), Some("B3".to_string())]);
    for record in &outcome.errors.records {
        assert_eq!(record.stage, Stage::IndexOfTables);
    }
}

#[test]
fn all_table_indexes_failing_yields_empty_table_and_errors() {
    let client = MockNfz::new(Some(benefits_body(&["B1", "B2"])));
    let outcome = run_pipeline(&client, &params("rozrodcz"), &NullSink);

    assert!(outcome.diseases.is_empty());
    assert_eq!(outcome.errors.len(), 2);
    assert_eq!(client.counts(), (1, 2, 0));
}

#[test]
fn missing_type_column_is_one_tagged_error() {
    let mut client = MockNfz::new(Some(benefits_body(&["B1"])));
    client.table_bodies.insert(
        "B1".to_string(),
        json!({"data": {"attributes": {"years": [{"tables": [
            {"kind": "icd-10-diseases", "id": 10}
        ]}]}}}),
    );

    let outcome = run_pipeline(&client, &params("rozrodcz"), &NullSink);

    assert!(outcome.diseases.is_empty());
    assert_eq!(outcome.errors.len(), 1);
    let record = &outcome.errors.records[0];
    assert_eq!(record.stage, Stage::IndexOfTables);
    assert_eq!(record.item_id, None);
    assert!(record.message.contains("'type'"));
    assert!(record.message.contains("id"));
    assert!(record.message.contains("kind"));
    // no disease lookups once the index shape is unusable
    assert_eq!(client.counts(), (1, 1, 0));
}

#[test]
fn disease_failures_keep_successful_rows() {
    let mut client = MockNfz::new(Some(benefits_body(&["B1"])));
    client.table_bodies.insert(
        "B1".to_string(),
        table_index_body(&[("icd-10-diseases", 10), ("icd-10-diseases", 11)]),
    );
    client.disease_bodies.insert(
        "10".to_string(),
        diseases_body(vec![json!({"disease-code": "K35", "patients": 4})]),
    );

    let outcome = run_pipeline(&client, &params("rozrodcz"), &NullSink);

    assert_eq!(outcome.diseases.len(), 1);
    assert_eq!(outcome.errors.len(), 1);
    let record = &outcome.errors.records[0];
    assert_eq!(record.stage, Stage::Icd10Diseases);
    assert_eq!(record.item_id.as_deref(), Some("11"));
}

#[test]
fn memoized_fetch_issues_no_extra_remote_calls() {
    let mut client = MockNfz::new(Some(benefits_body(&["B1"])));
    client
        .table_bodies
        .insert("B1".to_string(), table_index_body(&[("icd-10-diseases", 10)]));
    client.disease_bodies.insert(
        "10".to_string(),
        diseases_body(vec![json!({"disease-code": "O80", "patients": 5})]),
    );

    let calls = client.calls.clone();
    let pipeline = CachedPipeline::new(client);
    let query = params("rozrodcz");
    let first = pipeline.fetch(&query, &NullSink);
    let second = pipeline.fetch(&query, &NullSink);

    assert_eq!(first, second);
    assert_eq!(snapshot(&calls), (1, 1, 1));

    // a different triple is a different cache key
    let other = QueryParams {
        year: Year::new(2020).unwrap(),
        ..query
    };
    pipeline.fetch(&other, &NullSink);
    assert_eq!(snapshot(&calls), (2, 2, 2));
}

#[test]
fn progress_reaches_completion_for_both_looped_stages() {
    let mut client = MockNfz::new(Some(benefits_body(&["B1", "B2"])));
    for code in ["B1", "B2"] {
        client
            .table_bodies
            .insert(code.to_string(), table_index_body(&[("icd-10-diseases", 10)]));
    }
    client.disease_bodies.insert(
        "10".to_string(),
        diseases_body(vec![json!({"disease-code": "O80", "patients": 5})]),
    );

    let sink = RecordingSink {
        events: Mutex::new(Vec::new()),
    };
    run_pipeline(&client, &params("rozrodcz"), &sink);

    let events = sink.events.lock().unwrap();
    let index_fractions: Vec<f64> = events
        .iter()
        .filter(|event| event.message.contains("index-of-tables"))
        .filter_map(|event| event.fraction)
        .collect();
    assert_eq!(index_fractions, vec![0.5, 1.0]);
    let last_disease = events
        .iter()
        .filter(|event| event.message.contains("ICD-10"))
        .last()
        .unwrap();
    assert_eq!(last_disease.fraction, Some(1.0));
}
