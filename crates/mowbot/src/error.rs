use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MowbotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Photo error: {0}")]
    Photo(#[from] crate::photos::PhotoError),

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] crate::lifecycle::LifecycleError),

    #[error("Assignment error: {0}")]
    Assignment(#[from] crate::assignment::AssignmentError),

    #[error("Render error: {0}")]
    Render(#[from] crate::router::RenderError),

    #[error("Weather error: {0}")]
    Weather(#[from] crate::weather::WeatherError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

pub type Result<T> = std::result::Result<T, MowbotError>;
