/// 엔티티별 저장소 트레이트
/// 데이터 훅이 전역 클라이언트를 직접 쓰지 않도록 엔티티 단위의
/// 주입 가능한 저장소 인터페이스로 추상화한다. 테스트는 인메모리
/// 구현으로 대체한다.
// region:    --- Imports
use crate::bidding::model::{Bid, NewBid};
use crate::error::MarketError;
use crate::feedback::{Feedback, NewFeedback};
use crate::listing::model::{Listing, Profile};
use crate::offer::model::{NewOffer, Offer};
use crate::query::filter::QueryDescriptor;
use crate::verification::{NewVerificationRequest, VerificationRequest};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub mod postgres;

// endregion: --- Imports

// region:    --- View Types

/// 판매 완료 탭 전용 조회 결과 (구매자 프로필 조인 포함)
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SoldListing {
    #[serde(flatten)]
    pub listing: Listing,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer: Option<Profile>,
}

/// 판매 완료 조회 범위
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoldScope {
    Seller(i64),
    Buyer(i64),
}

/// 리스팅 생성 페이로드
#[derive(Debug, Clone)]
pub struct NewListing {
    pub seller_id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub listing_type: String,
    pub price: f64,
    pub reserve_price: Option<f64>,
    pub location: String,
    pub condition: String,
    pub image_refs: Vec<String>,
    pub allow_best_offer: bool,
    pub expires_at: DateTime<Utc>,
    pub original_listing_id: Option<i64>,
    pub relist_count: i64,
    pub relist_reason: Option<String>,
    pub relisted_at: Option<DateTime<Utc>>,
}

// endregion: --- View Types

// region:    --- Listing Store

#[async_trait]
pub trait ListingStore: Send + Sync {
    /// 쿼리 기술자(술어 + 정렬 + 페이지 범위)에 따른 검색
    async fn search(&self, query: &QueryDescriptor) -> Result<Vec<Listing>, MarketError>;

    async fn get_listing(&self, id: i64) -> Result<Listing, MarketError>;

    async fn insert_listing(&self, new: NewListing) -> Result<Listing, MarketError>;

    async fn set_listing_status(&self, id: i64, status: &str) -> Result<(), MarketError>;

    /// 판매 완료 처리 (판매 일시/금액/구매자 기록)
    async fn mark_sold(
        &self,
        id: i64,
        buyer_id: i64,
        amount: f64,
        sale_date: DateTime<Utc>,
    ) -> Result<(), MarketError>;

    /// 판매자 기준 조회 (statuses가 비어 있으면 전체), created_at 내림차순
    async fn by_seller(
        &self,
        seller_id: i64,
        statuses: &[&str],
    ) -> Result<Vec<Listing>, MarketError>;

    /// 식별자 집합 조회, created_at 내림차순
    async fn by_ids(&self, ids: &[i64]) -> Result<Vec<Listing>, MarketError>;

    /// 판매 완료 리스팅 조회 (구매자 프로필 조인 별도 경로)
    async fn sold_listings(&self, scope: SoldScope) -> Result<Vec<SoldListing>, MarketError>;
}

// endregion: --- Listing Store

// region:    --- Bid Store

#[async_trait]
pub trait BidStore: Send + Sync {
    /// 활성 입찰 중 최고가 1건 (금액 내림차순 limit 1)
    async fn highest_active_bid(&self, listing_id: i64) -> Result<Option<Bid>, MarketError>;

    /// 활성 입찰 수
    async fn active_bid_count(&self, listing_id: i64) -> Result<i64, MarketError>;

    async fn insert_bid(&self, new: NewBid, amount: f64) -> Result<Bid, MarketError>;

    /// 대리 입찰 해소용: 공개 금액과 상태를 갱신
    async fn update_bid(&self, id: i64, amount: f64, status: &str) -> Result<(), MarketError>;

    /// 사용자가 활성 입찰을 보유한 리스팅 식별자 집합
    async fn listings_with_active_bids(&self, bidder_id: i64) -> Result<Vec<i64>, MarketError>;
}

// endregion: --- Bid Store

// region:    --- Offer Store

#[async_trait]
pub trait OfferStore: Send + Sync {
    async fn insert_offer(&self, new: NewOffer) -> Result<Offer, MarketError>;

    async fn get_offer(&self, id: i64) -> Result<Offer, MarketError>;

    async fn set_offer_status(&self, id: i64, status: &str) -> Result<(), MarketError>;

    /// 리스팅의 대기 중 제안 일괄 자동 거절 (except_id 제외), 처리 건수 반환
    async fn auto_decline_pending(
        &self,
        listing_id: i64,
        except_id: Option<i64>,
    ) -> Result<u64, MarketError>;
}

// endregion: --- Offer Store

// region:    --- Feedback Store

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// 피드백 저장. (from_user, listing) 고유 제약 위반은
    /// MarketError::DuplicateFeedback으로 변환해야 한다.
    async fn insert_feedback(&self, new: NewFeedback) -> Result<Feedback, MarketError>;

    async fn feedback_for_user(&self, to_user_id: i64) -> Result<Vec<Feedback>, MarketError>;
}

// endregion: --- Feedback Store

// region:    --- Verification Store

#[async_trait]
pub trait VerificationStore: Send + Sync {
    async fn pending_for_user(
        &self,
        user_id: i64,
    ) -> Result<Option<VerificationRequest>, MarketError>;

    async fn insert_request(
        &self,
        new: NewVerificationRequest,
    ) -> Result<VerificationRequest, MarketError>;

    async fn get_request(&self, id: i64) -> Result<VerificationRequest, MarketError>;

    async fn set_request_status(&self, id: i64, status: &str) -> Result<(), MarketError>;
}

// endregion: --- Verification Store

// region:    --- View Store

#[async_trait]
pub trait ViewStore: Send + Sync {
    /// 같은 뷰어가 기준 시각 이후 조회한 기록이 있는지
    async fn recent_view_exists(
        &self,
        listing_id: i64,
        viewer_key: &str,
        since: DateTime<Utc>,
    ) -> Result<bool, MarketError>;

    async fn record_view(
        &self,
        listing_id: i64,
        viewer_key: &str,
        at: DateTime<Utc>,
    ) -> Result<(), MarketError>;

    /// 조회수 1 증가 후 갱신된 값 반환
    async fn increment_views(&self, listing_id: i64) -> Result<i64, MarketError>;

    async fn view_count(&self, listing_id: i64) -> Result<i64, MarketError>;
}

// endregion: --- View Store
