pub mod apper;
pub mod error;
pub mod models;
pub mod schema;
pub mod services;
pub mod state;

pub use error::AppError;
pub use state::AppState;
