use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single remote row, keyed by field name. `Id` is always present on rows
/// returned by the store.
pub type Row = Map<String, Value>;

pub const EQUAL_TO: &str = "EqualTo";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSelector {
    pub field: FieldName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldName {
    #[serde(rename = "Name")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereClause {
    #[serde(rename = "FieldName")]
    pub field_name: String,
    #[serde(rename = "Operator")]
    pub operator: String,
    #[serde(rename = "Values")]
    pub values: Vec<Value>,
}

impl WhereClause {
    pub fn equal_to(field_name: &str, value: impl Into<Value>) -> Self {
        Self {
            field_name: field_name.to_string(),
            operator: EQUAL_TO.to_string(),
            values: vec![value.into()],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchParams {
    pub fields: Vec<FieldSelector>,
    #[serde(rename = "where", default, skip_serializing_if = "Vec::is_empty")]
    pub where_clauses: Vec<WhereClause>,
}

impl FetchParams {
    pub fn select<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            fields: names
                .into_iter()
                .map(|name| FieldSelector {
                    field: FieldName {
                        name: name.to_string(),
                    },
                })
                .collect(),
            where_clauses: Vec::new(),
        }
    }

    pub fn filter(mut self, clause: WhereClause) -> Self {
        self.where_clauses.push(clause);
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.field.name.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordsParams {
    pub records: Vec<Row>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteParams {
    #[serde(rename = "RecordIds")]
    pub record_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Row>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FetchResponse {
    pub fn ok(rows: Vec<Row>) -> Self {
        Self {
            success: true,
            data: Some(rows),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RecordResponse {
    pub fn ok(row: Option<Row>) -> Self {
        Self {
            success: true,
            data: row,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Response to create, update and delete. `results` holds one entry per
/// submitted record when the store reports them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<RecordResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BatchResponse {
    pub fn ok(results: Vec<RecordResult>) -> Self {
        Self {
            success: true,
            results: Some(results),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            results: None,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl RecordResult {
    pub fn ok(row: Option<Row>) -> Self {
        Self {
            success: true,
            data: row,
            message: None,
            errors: None,
        }
    }

    pub fn failed(message: Option<String>) -> Self {
        Self {
            success: false,
            data: None,
            message,
            errors: None,
        }
    }

    pub fn rejected(errors: Vec<FieldError>) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            errors: Some(errors),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    #[serde(rename = "fieldLabel")]
    pub field_label: String,
    #[serde(default)]
    pub message: String,
}

impl FieldError {
    pub fn new(field_label: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field_label: field_label.into(),
            message: message.into(),
        }
    }
}
