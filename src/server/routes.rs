use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};

use super::error::ApiError;
use super::{AppState, SERVICE_NAME};
use crate::error::LoreError;
use crate::lore::MAX_FACTIONS;
use crate::models::{FactionsResponse, HealthResponse, Quest, QuestRequest};

fn generation_failed(kind: &str, err: LoreError) -> ApiError {
    error!("Error generating {}: {}", kind, err);
    if let Some(raw) = err.raw_output() {
        error!("Raw model output: {}", raw);
    }
    ApiError::generation(kind, &err)
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn factions(
    State(state): State<Arc<AppState>>,
    Path(count): Path<String>,
) -> Result<Json<FactionsResponse>, ApiError> {
    let count = match count.parse::<usize>() {
        Ok(n) if (1..=MAX_FACTIONS).contains(&n) => n,
        _ => {
            return Err(ApiError::unprocessable(format!(
                "count must be an integer between 1 and {MAX_FACTIONS}, got '{count}'"
            )))
        }
    };
    info!("GET /factions/{}", count);

    let session = state
        .open_session()
        .await
        .map_err(|e| generation_failed("factions", e))?;
    let result = session.generator.generate_factions(count).await;
    session.close().await;

    let factions = result.map_err(|e| generation_failed("factions", e))?;
    Ok(Json(FactionsResponse { factions }))
}

/// The body is optional: an empty body behaves like `{}`.
pub async fn quests(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Quest>, ApiError> {
    let request: QuestRequest = if body.iter().all(u8::is_ascii_whitespace) {
        QuestRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::unprocessable(format!("Invalid request body: {e}")))?
    };
    let factions = request.factions.unwrap_or_default();
    info!("POST /quests with {} seed faction(s)", factions.len());

    let session = state
        .open_session()
        .await
        .map_err(|e| generation_failed("quest", e))?;
    let result = session.generator.generate_quest(Some(factions.as_slice())).await;
    session.close().await;

    let quest = result.map_err(|e| generation_failed("quest", e))?;
    Ok(Json(quest))
}
