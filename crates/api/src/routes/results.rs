//! Latest-Result Lookup Route

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storage::ClassificationRecord;

use crate::error::ApiError;
use crate::AppState;

/// Query parameters for the lookup endpoint
#[derive(Debug, Deserialize)]
pub struct ResultQuery {
    /// When present, narrows the lookup to one device
    #[serde(rename = "serialNumber")]
    pub serial_number: Option<String>,
}

/// One row of the lookup response
#[derive(Debug, Serialize)]
pub struct ResultRow {
    #[serde(rename = "serialNumber")]
    pub serial_number: String,
    pub result: String,
    pub created_at: DateTime<Utc>,
}

impl From<ClassificationRecord> for ResultRow {
    fn from(record: ClassificationRecord) -> Self {
        Self {
            serial_number: record.serial_number,
            result: record.result,
            created_at: record.created_at,
        }
    }
}

/// Latest-result lookup.
///
/// With `?serialNumber=` the response is that device's most recent row
/// (404 when the device has none). Without it, the response lists the
/// most recent row per distinct serial number, newest-first.
pub async fn get_result(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResultQuery>,
) -> Result<Response, ApiError> {
    match params.serial_number {
        Some(serial) => {
            let serial = serial.trim();
            if serial.is_empty() {
                return Err(ApiError::BadRequest(
                    "serialNumber must be non-empty".to_string(),
                ));
            }

            match state.repository.latest_for_serial(serial).await? {
                Some(record) => Ok(Json(ResultRow::from(record)).into_response()),
                None => Err(ApiError::NotFound(format!(
                    "No results for serial number {serial}"
                ))),
            }
        }
        None => {
            let rows: Vec<ResultRow> = state
                .repository
                .latest_per_serial()
                .await?
                .into_iter()
                .map(ResultRow::from)
                .collect();

            Ok(Json(rows).into_response())
        }
    }
}
