//! 响应信封

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

/// 非实体响应统一使用的 `{status, message}` 信封
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: i16,
    pub message: String,
}

impl Envelope {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            // HTTP 状态码均在 100..=999 之间
            status: status.as_u16() as i16,
            message: message.into(),
        }
    }

    pub fn created(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CREATED, message)
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, message)
    }

    /// 信封中的状态码，同时作为 HTTP 响应状态
    pub fn status_code(&self) -> StatusCode {
        u16::try_from(self.status)
            .ok()
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}
