use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::apper::{
    BatchResponse, DeleteParams, FetchParams, RecordClient, RecordResult, RecordsParams, Row,
    WhereClause,
};
use crate::error::AppError;
use crate::schema::{self, Entity, IntoRecordId, Lookup};

/// CRUD over one remote table. Every failure is logged here before it is
/// returned to the caller.
pub struct RecordService<E> {
    client: Arc<dyn RecordClient>,
    entity: PhantomData<fn() -> E>,
}

impl<E> Clone for RecordService<E> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            entity: PhantomData,
        }
    }
}

impl<E: Entity> RecordService<E> {
    pub fn new(client: Arc<dyn RecordClient>) -> Self {
        Self {
            client,
            entity: PhantomData,
        }
    }

    pub async fn get_all(&self) -> Result<Vec<E>, AppError> {
        self.fetch_all()
            .await
            .inspect_err(|e| error!("Error fetching {}: {}", E::PLURAL, e))
    }

    /// Looks a record up by id, or by the entity's lookup field.
    pub async fn get_by_id(&self, id: impl IntoRecordId) -> Result<E, AppError> {
        let key = id
            .into_record_id()
            .inspect_err(|e| error!("Error fetching {}: {}", E::SINGULAR, e))?;

        self.find(key)
            .await
            .inspect_err(|e| error!("Error fetching {} {}: {}", E::SINGULAR, describe_key::<E>(key), e))
    }

    /// Returns the created record, or `None` when the store reports no
    /// successful result.
    pub async fn create<P>(&self, payload: &P) -> Result<Option<E>, AppError>
    where
        P: Serialize + Sync + ?Sized,
    {
        self.try_create(payload)
            .await
            .inspect_err(|e| error!("Error creating {}: {}", E::SINGULAR, e))
    }

    /// Applies only the fields present in `updates`.
    pub async fn update<P>(&self, id: impl IntoRecordId, updates: &P) -> Result<Option<E>, AppError>
    where
        P: Serialize + Sync + ?Sized,
    {
        let key = id.into_record_id();
        self.try_update(key, updates)
            .await
            .inspect_err(|e| error!("Error updating {}: {}", E::SINGULAR, e))
    }

    /// `Some(true)` when at least one row was deleted, `Some(false)` when none
    /// was, `None` when the store returned no per-record results.
    pub async fn delete(&self, id: impl IntoRecordId) -> Result<Option<bool>, AppError> {
        let key = id.into_record_id();
        self.try_delete(key)
            .await
            .inspect_err(|e| error!("Error deleting {}: {}", E::SINGULAR, e))
    }

    fn fetch_params() -> FetchParams {
        FetchParams::select(E::FIELDS.iter().map(|spec| spec.name))
    }

    fn decode(row: Row) -> Result<E, AppError> {
        let row = schema::decode_row(E::FIELDS, row);
        Ok(serde_json::from_value(Value::Object(row))?)
    }

    async fn fetch_all(&self) -> Result<Vec<E>, AppError> {
        let response = self.client.fetch_records(E::TABLE, &Self::fetch_params()).await?;
        if !response.success {
            return Err(operation_failure(response.message));
        }

        let rows = response.data.unwrap_or_default();
        debug!("Fetched {} {}", rows.len(), E::PLURAL);
        rows.into_iter().map(Self::decode).collect()
    }

    async fn find(&self, key: i64) -> Result<E, AppError> {
        let row = match E::LOOKUP {
            Lookup::Id => {
                let response = self
                    .client
                    .get_record_by_id(E::TABLE, key, &Self::fetch_params())
                    .await?;
                if !response.success {
                    return Err(operation_failure(response.message));
                }
                response.data
            }
            Lookup::Field(field) => {
                let params = Self::fetch_params().filter(WhereClause::equal_to(field, key));
                let response = self.client.fetch_records(E::TABLE, &params).await?;
                if !response.success {
                    return Err(operation_failure(response.message));
                }
                response.data.and_then(|rows| rows.into_iter().next())
            }
        };

        let row = row.ok_or_else(|| AppError::NotFound(not_found_message::<E>()))?;
        Self::decode(row)
    }

    /// Turns a caller key into the record's own id. Field lookups cost one
    /// extra fetch that must finish before the write is sent.
    async fn resolve_record_id(&self, key: i64) -> Result<i64, AppError> {
        match E::LOOKUP {
            Lookup::Id => Ok(key),
            Lookup::Field(_) => Ok(self.get_by_id(key).await?.id()),
        }
    }

    async fn try_create<P>(&self, payload: &P) -> Result<Option<E>, AppError>
    where
        P: Serialize + Sync + ?Sized,
    {
        let payload = schema::to_row(payload)?;
        let mut record = schema::map_fields(E::FIELDS, &payload);
        E::apply_create_defaults(&mut record);

        let params = RecordsParams {
            records: vec![record],
        };
        let response = self.client.create_record(E::TABLE, &params).await?;
        self.settle_write("create", response)
    }

    async fn try_update<P>(&self, key: Result<i64, AppError>, updates: &P) -> Result<Option<E>, AppError>
    where
        P: Serialize + Sync + ?Sized,
    {
        let key = key?;
        let payload = schema::to_row(updates)?;
        let mut record = schema::map_fields(E::FIELDS, &payload);

        let id = self.resolve_record_id(key).await?;
        record.insert("Id".to_string(), Value::from(id));

        let params = RecordsParams {
            records: vec![record],
        };
        let response = self.client.update_record(E::TABLE, &params).await?;
        self.settle_write("update", response)
    }

    async fn try_delete(&self, key: Result<i64, AppError>) -> Result<Option<bool>, AppError> {
        let id = self.resolve_record_id(key?).await?;

        let params = DeleteParams {
            record_ids: vec![id],
        };
        let response = self.client.delete_record(E::TABLE, &params).await?;
        if !response.success {
            return Err(operation_failure(response.message));
        }

        let Some(results) = response.results else {
            return Ok(None);
        };
        let (failed, succeeded): (Vec<_>, Vec<_>) = results.into_iter().partition(|r| !r.success);

        if !failed.is_empty() {
            log_failed_records::<E>("delete", &failed);
            if let Some(message) = failed.iter().find_map(|r| r.message.clone()) {
                return Err(AppError::Operation(message));
            }
        }

        Ok(Some(!succeeded.is_empty()))
    }

    fn settle_write(&self, verb: &str, response: BatchResponse) -> Result<Option<E>, AppError> {
        if !response.success {
            return Err(operation_failure(response.message));
        }

        let Some(results) = response.results else {
            return Ok(None);
        };
        let (failed, succeeded): (Vec<_>, Vec<_>) = results.into_iter().partition(|r| !r.success);

        if !failed.is_empty() {
            log_failed_records::<E>(verb, &failed);
            if let Some(message) = first_record_error(&failed) {
                return Err(AppError::Validation(message));
            }
        }

        succeeded
            .into_iter()
            .next()
            .and_then(|result| result.data)
            .map(Self::decode)
            .transpose()
    }
}

fn operation_failure(message: Option<String>) -> AppError {
    AppError::Operation(message.unwrap_or_else(|| "Request failed".to_string()))
}

fn not_found_message<E: Entity>() -> String {
    let mut chars = E::SINGULAR.chars();
    match chars.next() {
        Some(first) => format!("{}{} not found", first.to_uppercase(), chars.as_str()),
        None => "Record not found".to_string(),
    }
}

fn describe_key<E: Entity>(key: i64) -> String {
    match E::LOOKUP {
        Lookup::Id => format!("with ID {}", key),
        Lookup::Field(field) => format!("for {} {}", field, key),
    }
}

fn log_failed_records<E: Entity>(verb: &str, failed: &[RecordResult]) {
    error!(
        "Failed to {} {} {} records:{}",
        verb,
        E::PLURAL,
        failed.len(),
        serde_json::to_string(failed).unwrap_or_default()
    );
}

/// The first field error of the first rejected record, falling back to that
/// record's message. Records carrying neither are skipped.
pub(crate) fn first_record_error(failed: &[RecordResult]) -> Option<String> {
    failed.iter().find_map(|record| {
        record
            .errors
            .as_ref()
            .and_then(|errors| errors.first())
            .map(|e| format!("{}: {}", e.field_label, e.message))
            .or_else(|| record.message.clone())
    })
}
