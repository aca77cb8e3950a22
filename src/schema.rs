use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::apper::Row;
use crate::error::AppError;

/// How a field is stored remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Plain,
    /// Structured data kept as JSON text in the remote column.
    Json,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub encoding: Encoding,
}

impl FieldSpec {
    pub const fn plain(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self {
            name,
            aliases,
            encoding: Encoding::Plain,
        }
    }

    pub const fn json(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self {
            name,
            aliases,
            encoding: Encoding::Json,
        }
    }

    fn encode(&self, value: &Value) -> Value {
        match self.encoding {
            Encoding::Plain => value.clone(),
            Encoding::Json => Value::String(value.to_string()),
        }
    }

    fn decode(&self, value: Value) -> Value {
        match (self.encoding, value) {
            (Encoding::Json, Value::String(text)) if text.trim().is_empty() => Value::Null,
            (Encoding::Json, Value::String(text)) => {
                serde_json::from_str(&text).unwrap_or_else(|e| {
                    warn!("Failed to parse {} as JSON: {}", self.name, e);
                    Value::Null
                })
            }
            (_, value) => value,
        }
    }
}

/// How a caller-supplied key addresses a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The key is the record's own `Id`.
    Id,
    /// The key is matched against this field; the first matching row wins.
    Field(&'static str),
}

/// A record type stored in one remote table.
pub trait Entity: DeserializeOwned + Send + Sync + 'static {
    const TABLE: &'static str;
    const SINGULAR: &'static str;
    const PLURAL: &'static str;
    const FIELDS: &'static [FieldSpec];
    const LOOKUP: Lookup = Lookup::Id;

    fn id(&self) -> i64;

    /// Fills canonical fields a new record needs when the caller left them out.
    fn apply_create_defaults(_record: &mut Row) {}
}

/// `(source key, field)` pairs in precedence order: each field's canonical
/// name, then its aliases as listed.
pub fn alias_pairs(fields: &[FieldSpec]) -> Vec<(&'static str, &FieldSpec)> {
    fields
        .iter()
        .flat_map(|spec| {
            std::iter::once(spec.name)
                .chain(spec.aliases.iter().copied())
                .map(move |source| (source, spec))
        })
        .collect()
}

/// Present means the key exists and is not `null`.
pub fn present<'a>(payload: &'a Row, key: &str) -> Option<&'a Value> {
    payload.get(key).filter(|value| !value.is_null())
}

/// Resolves a loose payload into canonical fields. The first present source
/// for a field wins; later aliases for the same field are ignored.
pub fn map_fields(fields: &[FieldSpec], payload: &Row) -> Row {
    alias_pairs(fields)
        .into_iter()
        .fold(Row::new(), |mut record, (source, spec)| {
            if !record.contains_key(spec.name) {
                if let Some(value) = present(payload, source) {
                    record.insert(spec.name.to_string(), spec.encode(value));
                }
            }
            record
        })
}

/// Parses JSON-text columns back into structured values.
pub fn decode_row(fields: &[FieldSpec], mut row: Row) -> Row {
    for spec in fields.iter().filter(|s| s.encoding == Encoding::Json) {
        if let Some(value) = row.remove(spec.name) {
            row.insert(spec.name.to_string(), spec.decode(value));
        }
    }
    row
}

pub fn to_row<P: Serialize + ?Sized>(payload: &P) -> Result<Row, AppError> {
    match serde_json::to_value(payload)? {
        Value::Object(map) => Ok(map),
        other => Err(AppError::Validation(format!(
            "Payload must be a JSON object, got {}",
            other
        ))),
    }
}

/// Reads an integer the way `parseInt` does: optional sign, leading digits,
/// anything after them ignored.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Reads a record id out of a number, a numeric string or a lookup object
/// such as `{"Id": 5, "Name": "Physics"}`.
pub fn record_id_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => parse_leading_int(s),
        Value::Object(o) => o.get("Id").and_then(record_id_of),
        _ => None,
    }
}

pub trait IntoRecordId {
    fn into_record_id(self) -> Result<i64, AppError>;
}

impl IntoRecordId for i64 {
    fn into_record_id(self) -> Result<i64, AppError> {
        Ok(self)
    }
}

impl IntoRecordId for i32 {
    fn into_record_id(self) -> Result<i64, AppError> {
        Ok(i64::from(self))
    }
}

impl IntoRecordId for u32 {
    fn into_record_id(self) -> Result<i64, AppError> {
        Ok(i64::from(self))
    }
}

impl IntoRecordId for &str {
    fn into_record_id(self) -> Result<i64, AppError> {
        parse_leading_int(self)
            .ok_or_else(|| AppError::Validation(format!("Invalid record id: {}", self)))
    }
}

impl IntoRecordId for String {
    fn into_record_id(self) -> Result<i64, AppError> {
        self.as_str().into_record_id()
    }
}

impl IntoRecordId for &String {
    fn into_record_id(self) -> Result<i64, AppError> {
        self.as_str().into_record_id()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const FIELDS: &[FieldSpec] = &[
        FieldSpec::plain("Name", &["title"]),
        FieldSpec::plain("title_c", &["title"]),
        FieldSpec::json("schedule_c", &["schedule"]),
    ];

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn alias_pairs_put_canonical_first() {
        let pairs: Vec<_> = alias_pairs(FIELDS)
            .into_iter()
            .map(|(source, spec)| (source, spec.name))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Name", "Name"),
                ("title", "Name"),
                ("title_c", "title_c"),
                ("title", "title_c"),
                ("schedule_c", "schedule_c"),
                ("schedule", "schedule_c"),
            ]
        );
    }

    #[test]
    fn canonical_wins_over_alias() {
        let mapped = map_fields(FIELDS, &row(json!({ "title": "Friendly", "title_c": "Canonical" })));
        assert_eq!(mapped["title_c"], json!("Canonical"));
        assert_eq!(mapped["Name"], json!("Friendly"));
    }

    #[test]
    fn null_counts_as_absent() {
        let mapped = map_fields(FIELDS, &row(json!({ "title_c": null, "title": "Essay" })));
        assert_eq!(mapped["title_c"], json!("Essay"));
    }

    #[test]
    fn falsy_values_are_kept() {
        let fields = &[FieldSpec::plain("grade_c", &["grade"])];
        let mapped = map_fields(fields, &row(json!({ "grade_c": 0, "grade": 90 })));
        assert_eq!(mapped["grade_c"], json!(0));
    }

    #[test]
    fn json_fields_are_stored_as_text_and_read_back() {
        let schedule = json!({ "days": ["Mon", "Wed"], "time": "10:00" });
        let mapped = map_fields(FIELDS, &row(json!({ "schedule": schedule.clone() })));
        assert!(mapped["schedule_c"].is_string());

        let decoded = decode_row(FIELDS, mapped);
        assert_eq!(decoded["schedule_c"], schedule);
    }

    #[test]
    fn unparseable_json_text_decodes_to_null() {
        let decoded = decode_row(FIELDS, row(json!({ "schedule_c": "{not json" })));
        assert_eq!(decoded["schedule_c"], Value::Null);
    }

    #[test]
    fn parse_leading_int_follows_parse_int() {
        assert_eq!(parse_leading_int("42"), Some(42));
        assert_eq!(parse_leading_int("  7abc"), Some(7));
        assert_eq!(parse_leading_int("-3"), Some(-3));
        assert_eq!(parse_leading_int("12.9"), Some(12));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int(""), None);
    }

    #[test]
    fn record_id_reads_lookup_objects() {
        assert_eq!(record_id_of(&json!(5)), Some(5));
        assert_eq!(record_id_of(&json!("5")), Some(5));
        assert_eq!(record_id_of(&json!({ "Id": 9, "Name": "Physics" })), Some(9));
        assert_eq!(record_id_of(&json!(null)), None);
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let err = to_row(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
