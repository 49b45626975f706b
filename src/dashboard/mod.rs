/// 대시보드 탭 오케스트레이터
/// {active, ended, sold, all} x {selling, buying} 상태에 따라 어떤 리스팅
/// 부분집합을 조회할지 결정한다. 탭 정렬은 항상 created_at 내림차순.
///
/// 요청 세대 토큰: 조회마다 단조 증가 토큰을 받고, 응답 도착 시점에
/// 토큰이 더 이상 최신이 아니면 결과를 버린다(Ok(None)). 빠른 탭 전환이
/// 늦게 도착한 이전 결과로 덮이는 문제를 막는다.
// region:    --- Imports
use crate::error::MarketError;
use crate::listing::model::Listing;
use crate::listing::status;
use crate::store::{BidStore, ListingStore, SoldListing, SoldScope};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Tab Model

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DashboardTab {
    Active,
    Ended,
    Sold,
    All,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Selling,
    Buying,
}

/// 탭 조회 결과
/// sold 탭만 구매자 프로필이 조인된 별도 형태를 쓴다.
#[derive(Debug, Serialize, Clone)]
#[serde(untagged)]
pub enum TabListings {
    Listings(Vec<Listing>),
    Sold(Vec<SoldListing>),
}

// endregion: --- Tab Model

// region:    --- Orchestrator

pub struct DashboardOrchestrator {
    listings: Arc<dyn ListingStore>,
    bids: Arc<dyn BidStore>,
    generation: AtomicU64,
}

impl DashboardOrchestrator {
    pub fn new(listings: Arc<dyn ListingStore>, bids: Arc<dyn BidStore>) -> Self {
        Self {
            listings,
            bids,
            generation: AtomicU64::new(0),
        }
    }

    /// 활성 탭의 리스팅 부분집합 조회
    /// 조회 중 다른 load_tab 호출이 들어오면 이 호출의 결과는 버려진다.
    pub async fn load_tab(
        &self,
        user_id: i64,
        tab: DashboardTab,
        mode: ViewMode,
        now: DateTime<Utc>,
    ) -> Result<Option<TabListings>, MarketError> {
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            "{:<12} --> 탭 조회: user={} tab={:?} mode={:?} token={}",
            "Dashboard", user_id, tab, mode, token
        );

        let result = self.fetch_tab(user_id, tab, mode, now).await?;

        if self.generation.load(Ordering::SeqCst) != token {
            info!(
                "{:<12} --> 오래된 응답 폐기: token={}",
                "Dashboard", token
            );
            return Ok(None);
        }
        Ok(Some(result))
    }

    async fn fetch_tab(
        &self,
        user_id: i64,
        tab: DashboardTab,
        mode: ViewMode,
        now: DateTime<Utc>,
    ) -> Result<TabListings, MarketError> {
        if tab == DashboardTab::Sold {
            let scope = match mode {
                ViewMode::Selling => SoldScope::Seller(user_id),
                ViewMode::Buying => SoldScope::Buyer(user_id),
            };
            return Ok(TabListings::Sold(self.listings.sold_listings(scope).await?));
        }

        let candidates = match mode {
            ViewMode::Selling => {
                self.listings
                    .by_seller(user_id, candidate_statuses(tab))
                    .await?
            }
            ViewMode::Buying => {
                // 구매 모드: 사용자가 활성 입찰을 보유한 리스팅들
                let ids = self.bids.listings_with_active_bids(user_id).await?;
                self.listings.by_ids(&ids).await?
            }
        };

        let rows = candidates
            .into_iter()
            .filter(|l| belongs_to_tab(l, tab, now))
            .collect();
        Ok(TabListings::Listings(rows))
    }
}

/// 탭별 저장 상태 후보 집합 (코스 필터)
/// ended 탭은 아직 status가 active인 채 만료된 리스팅도 포함해야 하므로
/// active까지 가져온 뒤 belongs_to_tab에서 표시용 상태로 거른다.
fn candidate_statuses(tab: DashboardTab) -> &'static [&'static str] {
    match tab {
        DashboardTab::Active => &["active"],
        DashboardTab::Ended => &["ended", "expired", "relisted", "active"],
        DashboardTab::All => &[],
        // sold는 별도 경로로 처리
        DashboardTab::Sold => &["sold"],
    }
}

/// 탭 소속 판정
/// 만료 정의는 status 모듈의 effective_status 하나로 통일한다.
fn belongs_to_tab(listing: &Listing, tab: DashboardTab, now: DateTime<Utc>) -> bool {
    match tab {
        DashboardTab::Active => status::is_active(listing, now),
        DashboardTab::Ended => status::in_ended_tab(listing, now),
        DashboardTab::Sold => listing.status == status::STATUS_SOLD,
        DashboardTab::All => true,
    }
}

// endregion: --- Orchestrator
