//! Protocol types for the HTTP API
//!
//! Request bodies, response bodies and the status/body pair every handler
//! returns.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lens::grade::{GradeOutcome, GradeResult, OutputRow};
use crate::server::handler::ApiError;

// =============================================================================
// Response
// =============================================================================

/// Status code and JSON body produced by a handler
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    /// Create a response with the given status
    pub fn new(status: StatusCode, body: impl Serialize) -> Self {
        Self {
            status,
            body: serde_json::to_value(body).unwrap_or(Value::Null),
        }
    }

    /// Create a 200 response
    pub fn ok(body: impl Serialize) -> Self {
        Self::new(StatusCode::OK, body)
    }
}

impl From<ApiError> for ApiResponse {
    fn from(err: ApiError) -> Self {
        Self::new(err.code.status(), ErrorBody { error: err.message })
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

// =============================================================================
// Level data
// =============================================================================

/// Body of a level data request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelDataRequest {
    /// Composite level key; numbers are accepted and read as their digits
    #[serde(rename = "moduleLevelID", default)]
    pub module_level_id: Option<Value>,

    /// Return only the reference solution
    #[serde(default)]
    pub get_solution: Option<Value>,
}

impl LevelDataRequest {
    /// The level key, if present and not blank
    pub fn key(&self) -> Option<String> {
        match &self.module_level_id {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Whether only the solution is wanted; `None` when the flag is not a boolean
    ///
    /// Besides JSON booleans, `"true"`/`"false"` strings and `0`/`1` are read
    /// as booleans. A missing or null flag means `false`.
    pub fn solution_requested(&self) -> Option<bool> {
        match &self.get_solution {
            None | Some(Value::Null) => Some(false),
            Some(Value::Bool(b)) => Some(*b),
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            Some(Value::Number(n)) => match n.as_u64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            Some(_) => None,
        }
    }
}

// =============================================================================
// Grading
// =============================================================================

/// Validated body of a grading request
#[derive(Debug, Clone, PartialEq)]
pub struct GradeRequest {
    pub module_id: i64,
    pub level_id: i64,
    pub sql_code: String,
}

impl GradeRequest {
    /// Parse and validate a raw request body
    pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| ApiError::invalid_params(format!("Invalid input: {}", e)))?;
        let Value::Object(fields) = value else {
            return Err(ApiError::invalid_params(
                "Invalid input: request body must be a JSON object",
            ));
        };

        let module_id = integer_field(fields.get("moduleId"), "moduleId")?;
        let level_id = integer_field(fields.get("levelId"), "levelId")?;

        let sql_code = match fields.get("sqlCode") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            Some(Value::String(_)) | None | Some(Value::Null) => {
                return Err(ApiError::invalid_params(
                    "Invalid input: sqlCode must not be empty",
                ))
            }
            Some(_) => {
                return Err(ApiError::invalid_params(
                    "Invalid input: sqlCode must be a string",
                ))
            }
        };

        Ok(Self {
            module_id,
            level_id,
            sql_code,
        })
    }
}

/// Read an integer id given as a JSON integer or a string of digits
fn integer_field(value: Option<&Value>, name: &str) -> Result<i64, ApiError> {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        None | Some(Value::Null) => {
            return Err(ApiError::invalid_params(format!(
                "Invalid input: {} is required",
                name
            )))
        }
        Some(_) => None,
    };
    parsed.ok_or_else(|| {
        ApiError::invalid_params(format!("Invalid input: {} must be an integer", name))
    })
}

/// Body of a grading response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeResponse {
    pub output: Vec<OutputRow>,
    pub passed: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_solution: Option<bool>,
}

impl GradeResponse {
    /// HTTP status for a grading outcome
    pub fn status_for(outcome: &GradeOutcome) -> StatusCode {
        match outcome {
            GradeOutcome::InfraFault => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::OK,
        }
    }
}

impl From<GradeResult> for GradeResponse {
    fn from(result: GradeResult) -> Self {
        let passed = result.passed();
        let show_solution = result.show_solution().then_some(true);
        let error = result.error().map(str::to_string);
        Self {
            output: result.output,
            passed,
            message: result.message,
            error,
            hint: result.hint,
            show_solution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::handler::ErrorCode;
    use serde_json::json;

    #[test]
    fn test_grade_request_parse() {
        let body = br#"{"moduleId": 1, "levelId": 2, "sqlCode": "SELECT 1"}"#;
        let req = GradeRequest::parse(body).unwrap();
        assert_eq!(
            req,
            GradeRequest {
                module_id: 1,
                level_id: 2,
                sql_code: "SELECT 1".to_string(),
            }
        );
    }

    #[test]
    fn test_grade_request_accepts_numeric_strings() {
        let body = br#"{"moduleId": "3", "levelId": " 4 ", "sqlCode": "SELECT 1"}"#;
        let req = GradeRequest::parse(body).unwrap();
        assert_eq!((req.module_id, req.level_id), (3, 4));
    }

    #[test]
    fn test_grade_request_rejects_bad_ids() {
        for body in [
            r#"{"moduleId": "one", "levelId": 1, "sqlCode": "SELECT 1"}"#,
            r#"{"moduleId": 1.5, "levelId": 1, "sqlCode": "SELECT 1"}"#,
            r#"{"levelId": 1, "sqlCode": "SELECT 1"}"#,
            r#"{"moduleId": 1, "levelId": [1], "sqlCode": "SELECT 1"}"#,
        ] {
            let err = GradeRequest::parse(body.as_bytes()).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidParams);
            assert!(err.message.starts_with("Invalid input:"));
        }
    }

    #[test]
    fn test_grade_request_rejects_empty_sql() {
        for body in [
            r#"{"moduleId": 1, "levelId": 1, "sqlCode": "   "}"#,
            r#"{"moduleId": 1, "levelId": 1}"#,
            r#"{"moduleId": 1, "levelId": 1, "sqlCode": 5}"#,
        ] {
            let err = GradeRequest::parse(body.as_bytes()).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidParams);
        }
    }

    #[test]
    fn test_grade_request_rejects_non_object() {
        assert!(GradeRequest::parse(b"[1, 2]").is_err());
        assert!(GradeRequest::parse(b"not json").is_err());
    }

    #[test]
    fn test_level_data_request_key() {
        let req: LevelDataRequest = serde_json::from_str(r#"{"moduleLevelID": "12"}"#).unwrap();
        assert_eq!(req.key().as_deref(), Some("12"));
        assert_eq!(req.solution_requested(), Some(false));

        let req: LevelDataRequest =
            serde_json::from_str(r#"{"moduleLevelID": 12, "getSolution": true}"#).unwrap();
        assert_eq!(req.key().as_deref(), Some("12"));
        assert_eq!(req.solution_requested(), Some(true));

        let req: LevelDataRequest = serde_json::from_str(r#"{"moduleLevelID": ""}"#).unwrap();
        assert!(req.key().is_none());
    }

    #[test]
    fn test_level_data_request_solution_flag() {
        let flag = |body: &str| {
            serde_json::from_str::<LevelDataRequest>(body)
                .unwrap()
                .solution_requested()
        };
        assert_eq!(flag(r#"{"getSolution": "true"}"#), Some(true));
        assert_eq!(flag(r#"{"getSolution": "False"}"#), Some(false));
        assert_eq!(flag(r#"{"getSolution": 1}"#), Some(true));
        assert_eq!(flag(r#"{"getSolution": null}"#), Some(false));
        assert_eq!(flag(r#"{"getSolution": "yes"}"#), None);
        assert_eq!(flag(r#"{"getSolution": [true]}"#), None);
    }

    #[test]
    fn test_grade_response_for_sql_fault() {
        let result = GradeResult::sql_fault("no such column: y", "Check the columns");
        let status = GradeResponse::status_for(&result.outcome);
        let value = serde_json::to_value(GradeResponse::from(result)).unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            value,
            json!({
                "output": [],
                "passed": false,
                "message": "Error executing SQL: no such column: y",
                "error": "Error executing SQL: no such column: y",
                "hint": "Check the columns",
                "showSolution": true
            })
        );
    }

    #[test]
    fn test_grade_response_for_infra_fault() {
        let result = GradeResult::infra_fault();
        assert_eq!(
            GradeResponse::status_for(&result.outcome),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let value = serde_json::to_value(GradeResponse::from(result)).unwrap();
        assert!(value.get("showSolution").is_none());
        assert_eq!(value["passed"], false);
    }

    #[test]
    fn test_api_error_into_response() {
        let response = ApiResponse::from(ApiError::not_found("Level data not found."));
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body, json!({"error": "Level data not found."}));
    }
}
