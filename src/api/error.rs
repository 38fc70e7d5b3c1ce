//! 接口错误与 HTTP 状态码映射

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::error::WorkflowError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// 缺少或无法识别的身份请求头
    #[error("身份无效: {0}")]
    Unauthenticated(String),

    /// 路径参数不合法
    #[error("请求无效: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Workflow(err) => match err {
                WorkflowError::InvalidTransition { .. }
                | WorkflowError::AlreadyAssigned { .. }
                | WorkflowError::RecordFrozen { .. }
                | WorkflowError::DuplicateRecord { .. } => StatusCode::CONFLICT,
                WorkflowError::AssignmentLocked { .. } => StatusCode::LOCKED,
                WorkflowError::CeilingExceeded { .. }
                | WorkflowError::NegativeMarks { .. }
                | WorkflowError::IncompleteInput { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                WorkflowError::Unauthorized { .. } => StatusCode::FORBIDDEN,
                WorkflowError::RecordNotFound { .. } => StatusCode::NOT_FOUND,
                WorkflowError::PersistFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated(_) => "UNAUTHENTICATED",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Workflow(err) => err.code(),
        }
    }

    /// 冲突类错误附带结构化细节，方便前端提示
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::Workflow(WorkflowError::AlreadyAssigned { faculty_id, holder }) => {
                Some(serde_json::json!({ "facultyId": faculty_id, "holder": holder }))
            }
            ApiError::Workflow(WorkflowError::AssignmentLocked {
                external_id,
                dean_id,
            }) => Some(serde_json::json!({ "externalId": external_id, "deanId": dean_id })),
            ApiError::Workflow(WorkflowError::CeilingExceeded {
                field,
                value,
                ceiling,
            }) => Some(serde_json::json!({ "field": field, "value": value, "ceiling": ceiling })),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
            details: self.details(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
