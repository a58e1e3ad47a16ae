//! Level data handler
//!
//! `POST /leveldata` with `{"moduleLevelID": "12", "getSolution": false}`.

use axum::body::Bytes;
use axum::extract::State;
use tracing::{debug, error};

use crate::database::LevelStore;
use crate::lens::level::LevelLens;
use crate::server::handler::{ApiError, ApiResult};
use crate::server::protocol::{ApiResponse, LevelDataRequest};
use crate::server::ServerState;

const KEY_REQUIRED: &str = "moduleLevelID is required.";
const BAD_SOLUTION_FLAG: &str = "getSolution must be true or false.";
const NOT_FOUND: &str = "Level data not found.";
const STORE_FAILURE: &str = "Could not retrieve level data.";

/// Resolve a level data request against `store`
pub fn handle_level_data(store: &dyn LevelStore, body: &[u8]) -> ApiResponse {
    match level_data_response(store, body) {
        Ok(response) => response,
        Err(err) => err.into(),
    }
}

fn level_data_response(store: &dyn LevelStore, body: &[u8]) -> ApiResult<ApiResponse> {
    let request: LevelDataRequest =
        serde_json::from_slice(body).map_err(|_| ApiError::invalid_params(KEY_REQUIRED))?;
    let key = request
        .key()
        .ok_or_else(|| ApiError::invalid_params(KEY_REQUIRED))?;
    let get_solution = request
        .solution_requested()
        .ok_or_else(|| ApiError::invalid_params(BAD_SOLUTION_FLAG))?;

    let view = LevelLens::new(store)
        .view(&key, get_solution)
        .map_err(|e| {
            error!("Error fetching level {} from store: {}", key, e);
            ApiError::internal(STORE_FAILURE)
        })?;

    match view {
        Some(view) => Ok(ApiResponse::ok(view)),
        None => {
            debug!("Level {} requested but not stored", key);
            Err(ApiError::not_found(NOT_FOUND))
        }
    }
}

/// Axum handler for `POST /leveldata`
pub async fn level_data(State(state): State<ServerState>, body: Bytes) -> ApiResponse {
    handle_level_data(state.store.as_ref(), &body)
}
