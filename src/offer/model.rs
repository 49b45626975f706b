use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// region:    --- Offer Model

pub const OFFER_PENDING: &str = "pending";
pub const OFFER_ACCEPTED: &str = "accepted";
pub const OFFER_DECLINED: &str = "declined";
pub const OFFER_AUTO_DECLINED: &str = "auto_declined";

/// 가격 제안(베스트 오퍼) 모델
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: i64,
    pub listing_id: i64,
    pub buyer_id: i64,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 가격 제안 생성 요청
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewOffer {
    pub listing_id: i64,
    pub buyer_id: i64,
    pub amount: f64,
    pub message: Option<String>,
}

// endregion: --- Offer Model
