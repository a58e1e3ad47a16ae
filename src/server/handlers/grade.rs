//! Grading handler
//!
//! `POST /playground` with `{"moduleId": 1, "levelId": 2, "sqlCode": "..."}`.

use axum::body::Bytes;
use axum::extract::State;
use tracing::error;

use crate::database::LevelStore;
use crate::lens::grade::GradeLens;
use crate::server::handler::ApiError;
use crate::server::protocol::{ApiResponse, GradeRequest, GradeResponse};
use crate::server::ServerState;

/// Validate a grading request and grade it
///
/// Blocks for the whole grading call.
pub fn handle_grade(store: &dyn LevelStore, grader: &GradeLens, body: &[u8]) -> ApiResponse {
    let request = match GradeRequest::parse(body) {
        Ok(request) => request,
        Err(err) => return err.into(),
    };

    let result = grader.grade_level(
        store,
        request.module_id,
        request.level_id,
        &request.sql_code,
    );
    let status = GradeResponse::status_for(&result.outcome);
    ApiResponse::new(status, GradeResponse::from(result))
}

/// Axum handler for `POST /playground`
pub async fn grade(State(state): State<ServerState>, body: Bytes) -> ApiResponse {
    let task = tokio::task::spawn_blocking(move || {
        handle_grade(state.store.as_ref(), &state.grader, &body)
    });

    match task.await {
        Ok(response) => response,
        Err(e) => {
            error!("Grading task failed: {}", e);
            ApiError::internal("An unexpected error occurred while grading your query.").into()
        }
    }
}
