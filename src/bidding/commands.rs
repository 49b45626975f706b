/// 입찰 커맨드 처리 (대리 입찰)
/// 공개 금액과 숨겨진 상한으로 입찰하고, 경쟁 입찰이 들어오면
/// 상한이 높은 쪽이 필요한 만큼만 금액을 올려 방어한다.
// region:    --- Imports
use crate::bidding::model::{Bid, NewBid, BID_ACTIVE, BID_OUTBID};
use crate::error::MarketError;
use crate::listing::status;
use crate::store::{BidStore, ListingStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Commands

/// 입찰 처리
/// 검증: 경매 리스팅, 표시용 상태 active, 본인 리스팅 금지, 증분 양수,
/// 상한이 최소 요구 금액(현재가 + 증분) 이상.
pub async fn place_bid(
    listings: &Arc<dyn ListingStore>,
    bids: &Arc<dyn BidStore>,
    new: NewBid,
    now: DateTime<Utc>,
) -> Result<Bid, MarketError> {
    info!(
        "{:<12} --> 입찰 요청: listing={} bidder={} max={}",
        "Bid", new.listing_id, new.bidder_id, new.maximum_bid
    );

    let listing = listings.get_listing(new.listing_id).await?;

    if listing.listing_type != "auction" {
        return Err(MarketError::validation(
            "경매 리스팅에만 입찰할 수 있습니다.",
            "NOT_AUCTION",
        ));
    }
    if !status::is_active(&listing, now) {
        return Err(MarketError::validation(
            "이미 종료된 경매입니다.",
            "ALREADY_ENDED",
        ));
    }
    if new.bidder_id == listing.seller_id {
        return Err(MarketError::validation(
            "본인의 리스팅에는 입찰할 수 없습니다.",
            "OWN_LISTING",
        ));
    }
    if new.bid_increment <= 0.0 {
        return Err(MarketError::validation(
            "입찰 증분은 0보다 커야 합니다.",
            "INVALID_INCREMENT",
        ));
    }

    match bids.highest_active_bid(new.listing_id).await? {
        None => {
            // 첫 입찰: 공개 금액은 시작가에서 출발
            let opening = listing.price;
            if new.maximum_bid < opening {
                return Err(MarketError::validation(
                    "입찰 상한이 시작가보다 낮습니다.",
                    "LOW_BID",
                ));
            }
            bids.insert_bid(new, opening).await
        }
        Some(current) => {
            let min_required = current.amount + new.bid_increment;
            if new.maximum_bid < min_required {
                return Err(MarketError::validation(
                    "입찰 상한이 최소 입찰 금액보다 낮습니다.",
                    "LOW_BID",
                ));
            }

            if new.maximum_bid > current.maximum_bid {
                // 새 입찰 승리: 기존 상한 + 증분까지만 공개 금액을 올린다
                let amount = (current.maximum_bid + new.bid_increment).min(new.maximum_bid);
                bids.update_bid(current.id, current.amount, BID_OUTBID)
                    .await?;
                let placed = bids.insert_bid(new, amount).await?;
                info!(
                    "{:<12} --> 최고 입찰 교체: listing={} amount={}",
                    "Bid", placed.listing_id, placed.amount
                );
                Ok(placed)
            } else {
                // 기존 상한이 방어 (동률이면 먼저 들어온 입찰이 이긴다)
                let defended = (new.maximum_bid + new.bid_increment).min(current.maximum_bid);
                let losing_amount = new.maximum_bid;
                bids.update_bid(current.id, defended, BID_ACTIVE).await?;
                let placed = bids.insert_bid(new, losing_amount).await?;
                bids.update_bid(placed.id, placed.amount, BID_OUTBID)
                    .await?;
                info!(
                    "{:<12} --> 기존 입찰 방어: listing={} defended={}",
                    "Bid", current.listing_id, defended
                );
                bids.highest_active_bid(current.listing_id)
                    .await?
                    .ok_or_else(|| {
                        MarketError::Internal("방어된 최고 입찰을 찾을 수 없습니다".to_string())
                    })
            }
        }
    }
}

// endregion: --- Commands
