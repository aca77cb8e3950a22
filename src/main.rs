use std::sync::Arc;

use coursework::AppState;
use coursework::apper::{ApperConfig, ApperHttpClient};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "coursework=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApperConfig::new_from_env()?;
    info!("connecting to {} (project {})", config.base_url, config.project_id);

    let client = ApperHttpClient::new(config)?;
    let state = AppState::new(Arc::new(client));

    let courses = state.courses.get_all().await?;
    let assignments = state.assignments.get_all().await?;
    let grades = state.grades.get_all().await?;

    info!(
        "{} courses, {} assignments, {} grades",
        courses.len(),
        assignments.len(),
        grades.len()
    );

    Ok(())
}
