/// 도메인 오류 타입
/// (a) 검증 오류: 재시도 없이 호출자에게 메시지로 반환
/// (b) 일시적 저장소 오류: 로깅 후 반환, 호출자가 재시도 스케줄러로 재시도 가능
/// (c) 제약 위반: 저장소 충돌 코드를 도메인 오류 메시지로 변환
// region:    --- Imports
use crate::listing::transform::TransformError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Market Error

#[derive(Debug, Error)]
pub enum MarketError {
    /// 검증 오류 (재시도 대상 아님)
    #[error("{message}")]
    Validation {
        message: String,
        code: &'static str,
    },

    /// 동일 리스팅에 대한 중복 피드백 (저장소 고유 제약 위반에서 변환)
    #[error("이미 이 리스팅에 피드백을 남겼습니다.")]
    DuplicateFeedback,

    /// 일시적 저장소/네트워크 오류
    #[error(transparent)]
    Store(#[from] sqlx::Error),

    #[error(transparent)]
    Transform(#[from] TransformError),

    /// 내부 작업 실패 (동시 작업 join 실패 등)
    #[error("내부 오류: {0}")]
    Internal(String),
}

impl MarketError {
    pub fn validation(message: impl Into<String>, code: &'static str) -> Self {
        MarketError::Validation {
            message: message.into(),
            code,
        }
    }

    /// 응답 본문에 실리는 오류 코드
    pub fn code(&self) -> &'static str {
        match self {
            MarketError::Validation { code, .. } => code,
            MarketError::DuplicateFeedback => "DUPLICATE_FEEDBACK",
            MarketError::Store(_) => "STORE_ERROR",
            MarketError::Transform(_) => "TRANSFORM_ERROR",
            MarketError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// PostgreSQL 고유 제약 위반(23505) 여부
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let status = match &self {
            MarketError::Validation { .. } => StatusCode::BAD_REQUEST,
            MarketError::DuplicateFeedback => StatusCode::CONFLICT,
            MarketError::Store(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = serde_json::json!({
            "error": self.to_string(),
            "code": self.code(),
        });
        (status, Json(body)).into_response()
    }
}

// endregion: --- Market Error
