pub mod assignment;
pub mod course;
pub mod grade;

pub use assignment::{Assignment, NewAssignmentRequest, UpdateAssignmentRequest};
pub use course::{Course, NewCourseRequest, UpdateCourseRequest};
pub use grade::{Grade, NewGradeRequest, UpdateGradeRequest};

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::schema::record_id_of;

/// Lookup columns come back as a bare id, a numeric string or `{Id, Name}`.
pub(crate) fn lookup_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(record_id_of))
}

pub(crate) fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().or_else(|| {
            warn!("Ignoring non-numeric value {:?} in numeric column", s);
            None
        }),
        Some(other) => {
            warn!("Ignoring non-numeric value {} in numeric column", other);
            None
        }
    })
}

/// Text columns accept whatever the store or a loose payload put there;
/// numbers and booleans are read back as their text.
pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => {
            warn!("Reading structured value {} in text column as JSON text", other);
            Some(other.to_string())
        }
    })
}
