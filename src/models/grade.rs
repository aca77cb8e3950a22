use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::apper::Row;
use crate::schema::{Entity, FieldSpec, Lookup};

use super::{lenient_number, lenient_text, lookup_id};

/// One grade summary per course, addressed by `course_id` rather than `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Name", default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(rename = "course_id_c", default, deserialize_with = "lookup_id")]
    pub course_id: Option<i64>,
    #[serde(rename = "current_grade_c", default, deserialize_with = "lenient_number")]
    pub current_grade: Option<f64>,
    #[serde(rename = "letter_grade_c", default, deserialize_with = "lenient_text")]
    pub letter_grade: Option<String>,
    #[serde(rename = "categories_c", default)]
    pub categories: Option<Value>,
    #[serde(rename = "assignments_c", default)]
    pub assignments: Option<Value>,
}

impl Entity for Grade {
    const TABLE: &'static str = "grade_c";
    const SINGULAR: &'static str = "grade";
    const PLURAL: &'static str = "grades";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::plain("Name", &[]),
        FieldSpec::plain("course_id_c", &["courseId"]),
        FieldSpec::plain("current_grade_c", &["currentGrade"]),
        FieldSpec::plain("letter_grade_c", &["letterGrade"]),
        FieldSpec::json("categories_c", &["categories"]),
        FieldSpec::json("assignments_c", &["assignments"]),
    ];
    const LOOKUP: Lookup = Lookup::Field("course_id_c");

    fn id(&self) -> i64 {
        self.id
    }

    fn apply_create_defaults(record: &mut Row) {
        if record.contains_key("Name") {
            return;
        }
        let course = match record.get("course_id_c") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => return,
        };
        record.insert("Name".to_string(), Value::from(format!("Grade for Course {}", course)));
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGradeRequest {
    pub course_id: i64,
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_grade: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter_grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignments: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGradeRequest {
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_grade: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter_grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignments: Option<Value>,
}
