use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{Entity, FieldSpec};

use super::{lenient_number, lenient_text};

/// `schedule` and `grade_categories` are stored as JSON text remotely and
/// handed back parsed. Their inner shape belongs to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Name", default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(rename = "professor_c", default, deserialize_with = "lenient_text")]
    pub professor: Option<String>,
    #[serde(rename = "credits_c", default, deserialize_with = "lenient_number")]
    pub credits: Option<f64>,
    #[serde(rename = "color_c", default, deserialize_with = "lenient_text")]
    pub color: Option<String>,
    #[serde(rename = "schedule_c", default)]
    pub schedule: Option<Value>,
    #[serde(rename = "semester_c", default, deserialize_with = "lenient_text")]
    pub semester: Option<String>,
    #[serde(rename = "grade_categories_c", default)]
    pub grade_categories: Option<Value>,
}

impl Entity for Course {
    const TABLE: &'static str = "course_c";
    const SINGULAR: &'static str = "course";
    const PLURAL: &'static str = "courses";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::plain("Name", &["name"]),
        FieldSpec::plain("professor_c", &["professor"]),
        FieldSpec::plain("credits_c", &["credits"]),
        FieldSpec::plain("color_c", &["color"]),
        FieldSpec::json("schedule_c", &["schedule"]),
        FieldSpec::plain("semester_c", &["semester"]),
        FieldSpec::json("grade_categories_c", &["gradeCategories"]),
    ];

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourseRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_categories: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_categories: Option<Value>,
}
