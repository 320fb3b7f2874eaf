//! Classification Route

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use classifier::FEATURE_COUNT;

use crate::error::ApiError;
use crate::AppState;

/// Classification request body.
///
/// The fixed-size array rejects any body whose `values` is not exactly
/// 4 numbers before the inference path is reached.
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    #[serde(rename = "serialNumber")]
    pub serial_number: String,
    /// Sensor readings: dissolved oxygen, pH, salinity, temperature
    pub values: [f64; FEATURE_COUNT],
}

/// Classification response
#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    #[serde(rename = "serialNumber")]
    pub serial_number: String,
    pub class_name: String,
    pub confidence: f64,
}

/// Classify a sensor sample and persist the result.
///
/// The row is written only after inference succeeds; a failed insert
/// discards the classification and surfaces a server error.
pub async fn classify(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ClassifyRequest>, JsonRejection>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|e| ApiError::BadRequest(format!("Invalid input format: {e}")))?;

    let serial_number = request.serial_number.trim().to_string();
    if serial_number.is_empty() {
        return Err(ApiError::BadRequest(
            "serialNumber must be non-empty".to_string(),
        ));
    }
    if request.values.iter().any(|v| !v.is_finite()) {
        return Err(ApiError::BadRequest(
            "values must be finite numbers".to_string(),
        ));
    }

    let prediction = state.classifier.predict(&request.values)?;

    let record = state
        .repository
        .insert(&serial_number, prediction.class.as_str())
        .await?;

    info!(
        serial = %serial_number,
        class = prediction.class.as_str(),
        "Stored classification result {}",
        record.id
    );

    Ok(Json(ClassifyResponse {
        serial_number,
        class_name: prediction.class.as_str().to_string(),
        confidence: prediction.confidence,
    }))
}
