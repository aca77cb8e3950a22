pub mod record_service;

pub use record_service::RecordService;

use crate::models::{Assignment, Course, Grade};

pub type AssignmentsService = RecordService<Assignment>;
pub type CoursesService = RecordService<Course>;
pub type GradesService = RecordService<Grade>;
