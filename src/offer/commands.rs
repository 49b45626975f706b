/// 가격 제안 커맨드 처리
/// 1. 제안 (베스트 오퍼)
/// 2. 판매자 응답 (수락/거절)
// region:    --- Imports
use crate::error::MarketError;
use crate::listing::status;
use crate::offer::model::{NewOffer, Offer, OFFER_ACCEPTED, OFFER_DECLINED, OFFER_PENDING};
use crate::store::{ListingStore, OfferStore};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Commands

/// 1. 가격 제안
/// allow_best_offer가 켜진 고정가 리스팅이 활성 상태일 때만 가능하다.
pub async fn make_offer(
    listings: &Arc<dyn ListingStore>,
    offers: &Arc<dyn OfferStore>,
    new: NewOffer,
    now: DateTime<Utc>,
) -> Result<Offer, MarketError> {
    info!(
        "{:<12} --> 가격 제안: listing={} buyer={} amount={}",
        "Offer", new.listing_id, new.buyer_id, new.amount
    );

    let listing = listings.get_listing(new.listing_id).await?;

    if listing.listing_type != "sale" {
        return Err(MarketError::validation(
            "고정가 리스팅에만 가격 제안을 할 수 있습니다.",
            "NOT_SALE",
        ));
    }
    if !listing.allow_best_offer {
        return Err(MarketError::validation(
            "이 리스팅은 가격 제안을 받지 않습니다.",
            "OFFERS_DISABLED",
        ));
    }
    if !status::is_active(&listing, now) {
        return Err(MarketError::validation(
            "이미 종료된 리스팅입니다.",
            "ALREADY_ENDED",
        ));
    }
    if new.buyer_id == listing.seller_id {
        return Err(MarketError::validation(
            "본인의 리스팅에는 제안할 수 없습니다.",
            "OWN_LISTING",
        ));
    }
    if new.amount <= 0.0 {
        return Err(MarketError::validation(
            "제안 금액은 0보다 커야 합니다.",
            "INVALID_AMOUNT",
        ));
    }

    offers.insert_offer(new).await
}

/// 제안 응답 페이로드
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OfferResponse {
    pub user_id: i64,
    pub accept: bool,
}

/// 2. 판매자 응답
/// 수락하면 리스팅은 제안 금액으로 판매 완료 처리되고,
/// 같은 리스팅의 나머지 대기 중 제안은 자동 거절된다.
pub async fn respond_to_offer(
    listings: &Arc<dyn ListingStore>,
    offers: &Arc<dyn OfferStore>,
    offer_id: i64,
    response: OfferResponse,
    now: DateTime<Utc>,
) -> Result<Offer, MarketError> {
    info!(
        "{:<12} --> 제안 응답: offer={} accept={}",
        "Offer", offer_id, response.accept
    );

    let offer = offers.get_offer(offer_id).await?;
    let listing = listings.get_listing(offer.listing_id).await?;

    if listing.seller_id != response.user_id {
        return Err(MarketError::validation(
            "본인의 리스팅에 대한 제안만 처리할 수 있습니다.",
            "UNAUTHORIZED",
        ));
    }
    if offer.status != OFFER_PENDING {
        return Err(MarketError::validation(
            "대기 중인 제안만 처리할 수 있습니다.",
            "NOT_PENDING",
        ));
    }

    if response.accept {
        listings
            .mark_sold(listing.id, offer.buyer_id, offer.amount, now)
            .await?;
        offers.set_offer_status(offer_id, OFFER_ACCEPTED).await?;
        let declined = offers
            .auto_decline_pending(listing.id, Some(offer_id))
            .await?;
        info!(
            "{:<12} --> 제안 수락: listing={} amount={} 자동 거절={}건",
            "Offer", listing.id, offer.amount, declined
        );
    } else {
        offers.set_offer_status(offer_id, OFFER_DECLINED).await?;
    }

    offers.get_offer(offer_id).await
}

// endregion: --- Commands
