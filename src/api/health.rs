//! Health check

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::envelope::Request;
use crate::{error::AppResult, AppState};

#[derive(Serialize)]
pub struct HealthResponse {
    /// Current status of the service
    pub status: String,
    /// Version of the service
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// `health`: also proves the store answers
pub async fn health_check(state: &AppState, _request: &Request) -> AppResult<Value> {
    let mut conn = state.services.repository().acquire().await?;
    sqlx::query("SELECT 1").execute(&mut *conn).await?;

    Ok(serde_json::to_value(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })?)
}
