use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::apper::Row;
use crate::schema::{Entity, FieldSpec};

use super::{lenient_number, lenient_text, lookup_id};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Name", default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(rename = "course_id_c", default, deserialize_with = "lookup_id")]
    pub course_id: Option<i64>,
    #[serde(rename = "title_c", default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(rename = "description_c", default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(rename = "due_date_c", default, deserialize_with = "lenient_text")]
    pub due_date: Option<String>,
    #[serde(rename = "priority_c", default, deserialize_with = "lenient_text")]
    pub priority: Option<String>,
    #[serde(rename = "status_c", default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
    #[serde(rename = "grade_c", default, deserialize_with = "lenient_number")]
    pub grade: Option<f64>,
    #[serde(rename = "category_c", default, deserialize_with = "lenient_text")]
    pub category: Option<String>,
}

pub const DEFAULT_STATUS: &str = "pending";

impl Entity for Assignment {
    const TABLE: &'static str = "assignment_c";
    const SINGULAR: &'static str = "assignment";
    const PLURAL: &'static str = "assignments";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::plain("Name", &["title"]),
        FieldSpec::plain("course_id_c", &["courseId"]),
        FieldSpec::plain("title_c", &["title"]),
        FieldSpec::plain("description_c", &["description"]),
        FieldSpec::plain("due_date_c", &["dueDate"]),
        FieldSpec::plain("priority_c", &["priority"]),
        FieldSpec::plain("status_c", &["status"]),
        FieldSpec::plain("grade_c", &["grade"]),
        FieldSpec::plain("category_c", &["category"]),
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn apply_create_defaults(record: &mut Row) {
        if !record.contains_key("Name") {
            if let Some(title) = record.get("title_c").cloned() {
                record.insert("Name".to_string(), title);
            }
        }
        record
            .entry("status_c")
            .or_insert_with(|| Value::from(DEFAULT_STATUS));
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssignmentRequest {
    pub title: String,
    pub course_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssignmentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}
