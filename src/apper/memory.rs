use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use super::RecordClient;
use super::dto::{
    BatchResponse, DeleteParams, EQUAL_TO, FetchParams, FetchResponse, RecordResponse, RecordResult,
    RecordsParams, Row, WhereClause,
};
use crate::error::AppError;

/// Record store kept in process memory. Ids are assigned per table starting
/// at 1, the same way the hosted store numbers rows.
#[derive(Default)]
pub struct InMemoryRecordClient {
    tables: Mutex<HashMap<String, Table>>,
}

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, Row>,
}

impl InMemoryRecordClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.lock()
            .map(|tables| tables.get(table).map_or(0, |t| t.rows.len()))
            .unwrap_or(0)
    }

    /// The stored row exactly as written, without projection.
    pub fn raw_row(&self, table: &str, id: i64) -> Option<Row> {
        self.lock()
            .ok()?
            .get(table)
            .and_then(|t| t.rows.get(&id).cloned())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Table>>, AppError> {
        self.tables
            .lock()
            .map_err(|_| AppError::Transport("In-memory record store is poisoned".to_string()))
    }
}

fn project(row: &Row, params: &FetchParams) -> Row {
    if params.fields.is_empty() {
        return row.clone();
    }

    let mut projected = Row::new();
    if let Some(id) = row.get("Id") {
        projected.insert("Id".to_string(), id.clone());
    }
    for name in params.field_names() {
        if let Some(value) = row.get(name) {
            projected.insert(name.to_string(), value.clone());
        }
    }
    projected
}

fn loose_eq(stored: &Value, wanted: &Value) -> bool {
    let as_number = |v: &Value| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Object(o) => o.get("Id").and_then(|id| id.as_f64()),
        _ => None,
    };

    match (as_number(stored), as_number(wanted)) {
        (Some(a), Some(b)) => a == b,
        _ => stored == wanted,
    }
}

fn matches(row: &Row, clause: &WhereClause) -> bool {
    let stored = row.get(&clause.field_name).unwrap_or(&Value::Null);
    clause.values.iter().any(|wanted| loose_eq(stored, wanted))
}

#[async_trait]
impl RecordClient for InMemoryRecordClient {
    async fn fetch_records(&self, table: &str, params: &FetchParams) -> Result<FetchResponse, AppError> {
        if let Some(clause) = params.where_clauses.iter().find(|c| c.operator != EQUAL_TO) {
            return Ok(FetchResponse::failed(format!(
                "Unsupported operator: {}",
                clause.operator
            )));
        }

        let tables = self.lock()?;
        let rows: Vec<Row> = tables
            .get(table)
            .map(|t| {
                t.rows
                    .values()
                    .filter(|row| params.where_clauses.iter().all(|c| matches(row, c)))
                    .map(|row| project(row, params))
                    .collect()
            })
            .unwrap_or_default();

        Ok(FetchResponse::ok(rows))
    }

    async fn get_record_by_id(
        &self,
        table: &str,
        id: i64,
        params: &FetchParams,
    ) -> Result<RecordResponse, AppError> {
        let tables = self.lock()?;
        let row = tables
            .get(table)
            .and_then(|t| t.rows.get(&id))
            .map(|row| project(row, params));

        Ok(RecordResponse::ok(row))
    }

    async fn create_record(&self, table: &str, params: &RecordsParams) -> Result<BatchResponse, AppError> {
        let mut tables = self.lock()?;
        let store = tables.entry(table.to_string()).or_default();

        let results = params
            .records
            .iter()
            .map(|record| {
                store.next_id += 1;
                let id = store.next_id;
                let mut row = record.clone();
                row.insert("Id".to_string(), Value::from(id));
                store.rows.insert(id, row.clone());
                RecordResult::ok(Some(row))
            })
            .collect();

        Ok(BatchResponse::ok(results))
    }

    async fn update_record(&self, table: &str, params: &RecordsParams) -> Result<BatchResponse, AppError> {
        let mut tables = self.lock()?;
        let store = tables.entry(table.to_string()).or_default();

        let results = params
            .records
            .iter()
            .map(|record| {
                let Some(id) = record.get("Id").and_then(|id| id.as_i64()) else {
                    return RecordResult::failed(Some("Id is required".to_string()));
                };
                match store.rows.get_mut(&id) {
                    Some(row) => {
                        for (key, value) in record.iter().filter(|(k, _)| k.as_str() != "Id") {
                            row.insert(key.clone(), value.clone());
                        }
                        RecordResult::ok(Some(row.clone()))
                    }
                    None => RecordResult::failed(Some(format!("Record {} not found", id))),
                }
            })
            .collect();

        Ok(BatchResponse::ok(results))
    }

    async fn delete_record(&self, table: &str, params: &DeleteParams) -> Result<BatchResponse, AppError> {
        let mut tables = self.lock()?;
        let store = tables.entry(table.to_string()).or_default();

        let results = params
            .record_ids
            .iter()
            .map(|id| match store.rows.remove(id) {
                Some(_) => RecordResult::ok(None),
                None => RecordResult::failed(None),
            })
            .collect();

        Ok(BatchResponse::ok(results))
    }
}
