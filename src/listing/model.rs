use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// region:    --- Listing Model

/// 상품(리스팅) 모델
/// 저장된 status는 현재 입찰/구매 가능 여부를 보장하지 않는다.
/// 표시용 상태는 반드시 status::effective_status로 도출해야 한다.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: i64,
    pub seller_id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub listing_type: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserve_price: Option<f64>,
    pub location: String,
    pub condition: String,
    pub image_refs: Vec<String>,
    pub allow_best_offer: bool,
    pub status: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub views: i64,
    pub saves: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_buyer_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_listing_id: Option<i64>,
    pub relist_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relist_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relisted_at: Option<DateTime<Utc>>,
}

// 판매자/구매자 프로필 모델
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

// endregion: --- Listing Model
