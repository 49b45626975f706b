/// 입찰 집계
/// 리스팅 식별자 집합에 대해 리스팅별 최고 활성 입찰과 활성 입찰 수를
/// 동시에 조회해 두 개의 맵으로 조립한다.
// region:    --- Imports
use crate::bidding::model::Bid;
use crate::error::MarketError;
use crate::store::BidStore;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Bid Summary

/// 집계 결과
/// highest_bids는 활성 입찰이 하나라도 있는 리스팅만 키를 가진다.
/// bid_counts는 요청된 모든 리스팅에 대해 키를 가진다 (기본 0).
#[derive(Debug, Serialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BidSummary {
    pub highest_bids: HashMap<i64, Bid>,
    pub bid_counts: HashMap<i64, i64>,
}

/// 리스팅별 입찰 집계
/// 리스팅별 조회는 모두 동시 태스크로 실행되고 전체 성공/전체 실패로 합류한다.
/// 하나라도 실패하면 호출 전체가 오류로 끝나고 맵은 초기 빈 상태로 남는다.
pub async fn aggregate_bids(
    store: &Arc<dyn BidStore>,
    listing_ids: &[i64],
) -> Result<BidSummary, MarketError> {
    info!(
        "{:<12} --> 입찰 집계 시작: {}개 리스팅",
        "BidAggregate",
        listing_ids.len()
    );

    let mut handles = Vec::with_capacity(listing_ids.len());
    for &listing_id in listing_ids {
        let store = Arc::clone(store);
        handles.push(tokio::spawn(async move {
            let (highest, count) = tokio::try_join!(
                store.highest_active_bid(listing_id),
                store.active_bid_count(listing_id),
            )?;
            Ok::<(i64, Option<Bid>, i64), MarketError>((listing_id, highest, count))
        }));
    }

    let mut summary = BidSummary::default();
    for handle in handles {
        let (listing_id, highest, count) = handle
            .await
            .map_err(|e| MarketError::Internal(e.to_string()))??;
        if let Some(bid) = highest {
            summary.highest_bids.insert(listing_id, bid);
        }
        summary.bid_counts.insert(listing_id, count);
    }

    Ok(summary)
}

// endregion: --- Bid Summary
