/// 리스팅 라이프사이클 커맨드
/// 1. 등록
/// 2. 판매자 직접 종료
/// 3. 재등록 (종료된 리스팅을 계보와 함께 새 리스팅으로)
// region:    --- Imports
use crate::error::MarketError;
use crate::listing::model::Listing;
use crate::listing::status;
use crate::store::{ListingStore, NewListing, OfferStore};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Commands

pub const MAX_IMAGES: usize = 10;

/// 재등록 시 새 리스팅에 적용되는 판매 기간
const RELIST_DURATION_DAYS: i64 = 7;

/// 리스팅 등록 요청
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingRequest {
    pub seller_id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(rename = "type")]
    pub listing_type: String,
    pub price: f64,
    pub reserve_price: Option<f64>,
    pub location: String,
    pub condition: String,
    #[serde(default)]
    pub image_refs: Vec<String>,
    #[serde(default)]
    pub allow_best_offer: bool,
    pub expires_at: DateTime<Utc>,
}

/// 1. 리스팅 등록
pub async fn create_listing(
    listings: &Arc<dyn ListingStore>,
    req: CreateListingRequest,
) -> Result<Listing, MarketError> {
    info!(
        "{:<12} --> 리스팅 등록: seller={} title={}",
        "Listing", req.seller_id, req.title
    );

    if req.title.trim().is_empty() {
        return Err(MarketError::validation(
            "제목은 비울 수 없습니다.",
            "EMPTY_TITLE",
        ));
    }
    if !matches!(req.listing_type.as_str(), "auction" | "sale") {
        return Err(MarketError::validation(
            "리스팅 유형은 auction 또는 sale이어야 합니다.",
            "INVALID_TYPE",
        ));
    }
    if req.price <= 0.0 {
        return Err(MarketError::validation(
            "가격은 0보다 커야 합니다.",
            "INVALID_PRICE",
        ));
    }
    if req.image_refs.len() > MAX_IMAGES {
        return Err(MarketError::validation(
            "이미지는 최대 10장까지 등록할 수 있습니다.",
            "TOO_MANY_IMAGES",
        ));
    }
    if req.reserve_price.is_some() && req.listing_type != "auction" {
        return Err(MarketError::validation(
            "최저 낙찰가는 경매 리스팅에만 설정할 수 있습니다.",
            "RESERVE_NOT_ALLOWED",
        ));
    }

    listings
        .insert_listing(NewListing {
            seller_id: req.seller_id,
            title: req.title,
            description: req.description,
            category: req.category,
            listing_type: req.listing_type,
            price: req.price,
            reserve_price: req.reserve_price,
            location: req.location,
            condition: req.condition,
            image_refs: req.image_refs,
            allow_best_offer: req.allow_best_offer,
            expires_at: req.expires_at,
            original_listing_id: None,
            relist_count: 0,
            relist_reason: None,
            relisted_at: None,
        })
        .await
}

/// 2. 판매자 직접 종료
/// 본인 리스팅이면서 표시용 상태가 active인 경우에만 가능하다.
/// 종료와 함께 대기 중이던 가격 제안은 전부 자동 거절 처리한다.
pub async fn end_listing(
    listings: &Arc<dyn ListingStore>,
    offers: &Arc<dyn OfferStore>,
    user_id: i64,
    listing_id: i64,
    now: DateTime<Utc>,
) -> Result<Listing, MarketError> {
    info!(
        "{:<12} --> 리스팅 종료 요청: user={} listing={}",
        "Listing", user_id, listing_id
    );

    let listing = listings.get_listing(listing_id).await?;
    if listing.seller_id != user_id {
        return Err(MarketError::validation(
            "본인의 리스팅만 종료할 수 있습니다.",
            "UNAUTHORIZED",
        ));
    }
    if !status::can_end(&listing, now) {
        return Err(MarketError::validation(
            "활성 상태의 리스팅만 종료할 수 있습니다.",
            "NOT_ACTIVE",
        ));
    }

    listings
        .set_listing_status(listing_id, status::STATUS_ENDED)
        .await?;
    let declined = offers.auto_decline_pending(listing_id, None).await?;
    if declined > 0 {
        info!(
            "{:<12} --> 대기 중 제안 {}건 자동 거절: listing={}",
            "Listing", declined, listing_id
        );
    }

    listings.get_listing(listing_id).await
}

/// 재등록 요청
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RelistRequest {
    pub user_id: i64,
    pub reason: Option<String>,
}

/// 3. 재등록
/// 종료 상태(sold/ended/expired)의 리스팅만 재등록할 수 있다.
/// 원본은 relisted로 전환되고 새 리스팅이 계보를 이어받는다.
pub async fn relist_listing(
    listings: &Arc<dyn ListingStore>,
    user_id: i64,
    listing_id: i64,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> Result<Listing, MarketError> {
    info!(
        "{:<12} --> 재등록 요청: user={} listing={}",
        "Listing", user_id, listing_id
    );

    let original = listings.get_listing(listing_id).await?;
    if original.seller_id != user_id {
        return Err(MarketError::validation(
            "본인의 리스팅만 재등록할 수 있습니다.",
            "UNAUTHORIZED",
        ));
    }
    if !status::is_ended(&original, now) {
        return Err(MarketError::validation(
            "종료된 리스팅만 재등록할 수 있습니다.",
            "NOT_ENDED",
        ));
    }

    let relisted = listings
        .insert_listing(NewListing {
            seller_id: original.seller_id,
            title: original.title.clone(),
            description: original.description.clone(),
            category: original.category.clone(),
            listing_type: original.listing_type.clone(),
            price: original.price,
            reserve_price: original.reserve_price,
            location: original.location.clone(),
            condition: original.condition.clone(),
            image_refs: original.image_refs.clone(),
            allow_best_offer: original.allow_best_offer,
            expires_at: now + Duration::days(RELIST_DURATION_DAYS),
            original_listing_id: Some(original.id),
            relist_count: original.relist_count + 1,
            relist_reason: reason,
            relisted_at: Some(now),
        })
        .await?;

    listings
        .set_listing_status(original.id, status::STATUS_RELISTED)
        .await?;

    Ok(relisted)
}

// endregion: --- Commands
