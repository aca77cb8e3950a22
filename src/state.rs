use std::sync::Arc;

use crate::apper::RecordClient;
use crate::services::{AssignmentsService, CoursesService, GradesService};

/// The three record services, sharing one client handle.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn RecordClient>,
    pub assignments: AssignmentsService,
    pub courses: CoursesService,
    pub grades: GradesService,
}

impl AppState {
    pub fn new(client: Arc<dyn RecordClient>) -> Self {
        Self {
            assignments: AssignmentsService::new(client.clone()),
            courses: CoursesService::new(client.clone()),
            grades: GradesService::new(client.clone()),
            client,
        }
    }
}
