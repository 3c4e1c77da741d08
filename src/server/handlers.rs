//! Read API endpoints over the stored product records.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::record::StoredRecord;
use crate::storage::{lock, RecordStore, SharedStorage, StorageError};

/// Records returned per API page.
pub const PAGE_SIZE: u64 = 10;

/// Query parameters for the records listing.
#[derive(Debug, Deserialize)]
pub struct RecordsQuery {
    /// Page number (1-indexed). Missing, non-numeric or zero means 1.
    pub page: Option<String>,
}

impl RecordsQuery {
    pub fn page_number(&self) -> u64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<u64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1)
    }
}

/// Paginated response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordsPage {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub data: Vec<StoredRecord>,
}

/// Which of the two queries failed.
#[derive(Debug)]
enum ReadError {
    Retrieve(StorageError),
    Count(StorageError),
    Task(String),
}

impl IntoResponse for ReadError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Retrieve(e) => {
                tracing::error!("Failed to retrieve products: {}", e);
                "Failed to retrieve products"
            }
            Self::Count(e) => {
                tracing::error!("Failed to count products: {}", e);
                "Failed to count products"
            }
            Self::Task(e) => {
                tracing::error!("Records query task failed: {}", e);
                "Failed to retrieve products"
            }
        };

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": message })),
        )
            .into_response()
    }
}

/// List stored records, ten per page.
pub async fn list_records<S>(
    State(state): State<AppState<S>>,
    Query(params): Query<RecordsQuery>,
) -> Response
where
    S: RecordStore + Send + 'static,
{
    let page = params.page_number();
    let storage = state.storage.clone();

    let result = tokio::task::spawn_blocking(move || read_page(&storage, page)).await;

    match result {
        Ok(Ok(body)) => Json(body).into_response(),
        Ok(Err(e)) => e.into_response(),
        Err(e) => ReadError::Task(e.to_string()).into_response(),
    }
}

fn read_page<S: RecordStore>(storage: &SharedStorage<S>, page: u64) -> Result<RecordsPage, ReadError> {
    let offset = (page - 1).saturating_mul(PAGE_SIZE);
    let storage = lock(storage).map_err(ReadError::Retrieve)?;

    let data = storage
        .fetch_records(offset, PAGE_SIZE)
        .map_err(ReadError::Retrieve)?;
    let total_items = storage.count_records().map_err(ReadError::Count)?;

    Ok(RecordsPage {
        current_page: page,
        total_pages: total_items.div_ceil(PAGE_SIZE),
        total_items,
        data,
    })
}
