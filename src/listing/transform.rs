/// 저장소 원본 레코드 변환
/// 실시간 변경 페이로드 등 JSON으로 들어오는 행(snake_case, 문자열 날짜,
/// 숫자/문자열 혼용 가격)을 뷰 모델로 정규화한다.
// region:    --- Imports
use crate::listing::model::Listing;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

// endregion: --- Imports

// region:    --- Transform Error

/// 레코드 변환 오류
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("잘못된 날짜 형식: {0}")]
    InvalidDate(String),
    #[error("잘못된 숫자 형식: {0}")]
    InvalidNumber(String),
}

// endregion: --- Transform Error

// region:    --- Listing Record

/// 저장소가 반환하는 원본 행 형태
/// 누락 필드와 null은 모두 None으로 수렴한다.
#[derive(Debug, Deserialize, Clone)]
pub struct ListingRecord {
    pub id: i64,
    pub seller_id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub listing_type: String,
    pub price: Value,
    pub reserve_price: Option<Value>,
    pub location: String,
    pub condition: String,
    #[serde(default)]
    pub image_refs: Vec<String>,
    #[serde(default)]
    pub allow_best_offer: bool,
    pub status: String,
    pub expires_at: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub saves: i64,
    pub sale_date: Option<String>,
    pub sale_amount: Option<Value>,
    pub sale_buyer_id: Option<i64>,
    pub original_listing_id: Option<i64>,
    #[serde(default)]
    pub relist_count: i64,
    pub relist_reason: Option<String>,
    pub relisted_at: Option<String>,
}

impl ListingRecord {
    /// 원본 레코드를 뷰 모델로 변환 (입력은 소비되며 변경되지 않는다)
    pub fn into_listing(self) -> Result<Listing, TransformError> {
        Ok(Listing {
            id: self.id,
            seller_id: self.seller_id,
            title: self.title,
            description: self.description,
            category: self.category,
            listing_type: self.listing_type,
            price: coerce_number(&self.price)?,
            reserve_price: self.reserve_price.as_ref().map(coerce_number).transpose()?,
            location: self.location,
            condition: self.condition,
            image_refs: self.image_refs,
            allow_best_offer: self.allow_best_offer,
            status: self.status,
            expires_at: parse_date(&self.expires_at)?,
            created_at: parse_date(&self.created_at)?,
            updated_at: parse_date(&self.updated_at)?,
            views: self.views,
            saves: self.saves,
            sale_date: self.sale_date.as_deref().map(parse_date).transpose()?,
            sale_amount: self.sale_amount.as_ref().map(coerce_number).transpose()?,
            sale_buyer_id: self.sale_buyer_id,
            original_listing_id: self.original_listing_id,
            relist_count: self.relist_count,
            relist_reason: self.relist_reason,
            relisted_at: self.relisted_at.as_deref().map(parse_date).transpose()?,
        })
    }
}

/// RFC3339 문자열 날짜 파싱
fn parse_date(raw: &str) -> Result<DateTime<Utc>, TransformError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| TransformError::InvalidDate(raw.to_string()))
}

/// 숫자 또는 문자열 형태의 가격을 f64로 강제 변환
fn coerce_number(raw: &Value) -> Result<f64, TransformError> {
    match raw {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| TransformError::InvalidNumber(n.to_string())),
        Value::String(s) => s
            .parse::<f64>()
            .map_err(|_| TransformError::InvalidNumber(s.clone())),
        other => Err(TransformError::InvalidNumber(other.to_string())),
    }
}

// endregion: --- Listing Record
