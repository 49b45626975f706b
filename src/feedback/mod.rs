/// 거래 피드백
/// (from_user, listing) 쌍당 최대 1건. 고유 제약 위반은 저장소 구현이
/// DuplicateFeedback 도메인 오류로 변환해 올린다.
// region:    --- Imports
use crate::error::MarketError;
use crate::store::FeedbackStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Feedback Model

pub const MAX_COMMENT_LEN: usize = 512;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: i64,
    pub from_user_id: i64,
    pub to_user_id: i64,
    pub listing_id: i64,
    pub rating: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 피드백 작성 요청
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewFeedback {
    pub from_user_id: i64,
    pub to_user_id: i64,
    pub listing_id: i64,
    pub rating: i32,
    pub message: Option<String>,
}

// endregion: --- Feedback Model

// region:    --- Commands

/// 피드백 작성
pub async fn leave_feedback(
    store: &Arc<dyn FeedbackStore>,
    new: NewFeedback,
) -> Result<Feedback, MarketError> {
    info!(
        "{:<12} --> 피드백 작성: from={} listing={}",
        "Feedback", new.from_user_id, new.listing_id
    );

    if !(1..=5).contains(&new.rating) {
        return Err(MarketError::validation(
            "평점은 1에서 5 사이여야 합니다.",
            "INVALID_RATING",
        ));
    }
    if let Some(comment) = &new.message {
        if comment.chars().count() > MAX_COMMENT_LEN {
            return Err(MarketError::validation(
                "코멘트는 512자를 넘을 수 없습니다.",
                "COMMENT_TOO_LONG",
            ));
        }
    }

    store.insert_feedback(new).await
}

// endregion: --- Commands
