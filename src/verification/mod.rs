/// 판매자 인증 요청
/// 사용자당 대기 중(pending) 요청은 최대 1건. 스키마가 아니라
/// 서비스 계층에서 제출 시점에 확인한다.
// region:    --- Imports
use crate::error::MarketError;
use crate::store::VerificationStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Verification Model

pub const VERIFICATION_PENDING: &str = "pending";
pub const VERIFICATION_APPROVED: &str = "approved";
pub const VERIFICATION_REJECTED: &str = "rejected";

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub id: i64,
    pub user_id: i64,
    pub request_type: String,
    pub status: String,
    pub document_refs: Vec<String>,
    pub payment_status: String,
    pub document_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 인증 요청 제출 페이로드
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewVerificationRequest {
    pub user_id: i64,
    pub request_type: String,
    #[serde(default)]
    pub document_refs: Vec<String>,
}

/// 관리자 심사 페이로드
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VerificationDecision {
    pub approve: bool,
}

// endregion: --- Verification Model

// region:    --- Commands

/// 인증 요청 제출
pub async fn submit_request(
    store: &Arc<dyn VerificationStore>,
    new: NewVerificationRequest,
) -> Result<VerificationRequest, MarketError> {
    info!(
        "{:<12} --> 인증 요청 제출: user={} type={}",
        "Verify", new.user_id, new.request_type
    );

    if !matches!(new.request_type.as_str(), "verified" | "trader") {
        return Err(MarketError::validation(
            "알 수 없는 인증 요청 유형입니다.",
            "INVALID_REQUEST_TYPE",
        ));
    }

    if store.pending_for_user(new.user_id).await?.is_some() {
        return Err(MarketError::validation(
            "이미 심사 대기 중인 인증 요청이 있습니다.",
            "REQUEST_PENDING",
        ));
    }

    store.insert_request(new).await
}

/// 인증 요청 심사 (승인/거절)
pub async fn decide_request(
    store: &Arc<dyn VerificationStore>,
    request_id: i64,
    decision: VerificationDecision,
) -> Result<VerificationRequest, MarketError> {
    info!(
        "{:<12} --> 인증 요청 심사: id={} approve={}",
        "Verify", request_id, decision.approve
    );

    let request = store.get_request(request_id).await?;
    if request.status != VERIFICATION_PENDING {
        return Err(MarketError::validation(
            "이미 심사가 끝난 요청입니다.",
            "ALREADY_DECIDED",
        ));
    }

    let status = if decision.approve {
        VERIFICATION_APPROVED
    } else {
        VERIFICATION_REJECTED
    };
    store.set_request_status(request_id, status).await?;
    store.get_request(request_id).await
}

// endregion: --- Commands
