use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// region:    --- Bid Model

pub const BID_ACTIVE: &str = "active";
pub const BID_OUTBID: &str = "outbid";
pub const BID_WITHDRAWN: &str = "withdrawn";

/// 입찰 모델
/// amount는 공개되는 현재 입찰가, maximum_bid는 숨겨진 대리 입찰 상한이다.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub id: i64,
    pub listing_id: i64,
    pub bidder_id: i64,
    pub amount: f64,
    pub maximum_bid: f64,
    pub bid_increment: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 입찰 생성 요청
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewBid {
    pub listing_id: i64,
    pub bidder_id: i64,
    pub maximum_bid: f64,
    pub bid_increment: f64,
}

// endregion: --- Bid Model
