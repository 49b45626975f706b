// region:    --- Imports
use crate::bidding::aggregate::{aggregate_bids, BidSummary};
use crate::bidding::commands::place_bid;
use crate::bidding::model::{Bid, NewBid};
use crate::dashboard::{DashboardOrchestrator, DashboardTab, TabListings, ViewMode};
use crate::error::MarketError;
use crate::feedback::{self, Feedback, NewFeedback};
use crate::listing::commands::{
    create_listing, end_listing, relist_listing, CreateListingRequest, RelistRequest,
};
use crate::listing::model::Listing;
use crate::listing::status::{badge_for, effective_status, Badge};
use crate::offer::commands::{make_offer, respond_to_offer, OfferResponse};
use crate::offer::model::{NewOffer, Offer};
use crate::query::filter::{build_query, ListingFilterParams};
use crate::store::{
    BidStore, FeedbackStore, ListingStore, OfferStore, VerificationStore, ViewStore,
};
use crate::tracking::{track_view, TrackViewRequest, ViewOutcome};
use crate::verification::{
    self, NewVerificationRequest, VerificationDecision, VerificationRequest,
};
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- App State

#[derive(Clone)]
pub struct AppState {
    pub listings: Arc<dyn ListingStore>,
    pub bids: Arc<dyn BidStore>,
    pub offers: Arc<dyn OfferStore>,
    pub feedback: Arc<dyn FeedbackStore>,
    pub verification: Arc<dyn VerificationStore>,
    pub views: Arc<dyn ViewStore>,
    pub dashboard: Arc<DashboardOrchestrator>,
}

// endregion: --- App State

// region:    --- View Models

/// 리스팅 응답: 저장된 행 + 표시용 상태 + 배지
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ListingView {
    #[serde(flatten)]
    pub listing: Listing,
    pub effective_status: String,
    pub badge: Badge,
}

impl ListingView {
    fn new(listing: Listing, now: chrono::DateTime<Utc>) -> Self {
        let derived = effective_status(&listing.status, listing.expires_at, now).to_string();
        let badge = badge_for(&listing, now);
        Self {
            listing,
            effective_status: derived,
            badge,
        }
    }
}

/// 검색 응답: 리스팅 목록 + 경매 리스팅 입찰 집계
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub listings: Vec<ListingView>,
    pub bid_summary: BidSummary,
}

// endregion: --- View Models

// region:    --- Listing Handlers

/// 리스팅 검색
/// 필터 상태 -> 쿼리 기술자 -> 저장소 조회 -> 표시용 상태/배지 계산 ->
/// 경매 리스팅 입찰 집계 순서로 조립한다.
pub async fn handle_search_listings(
    State(state): State<AppState>,
    Query(params): Query<ListingFilterParams>,
) -> Result<Json<SearchResponse>, MarketError> {
    info!("{:<12} --> 리스팅 검색: {:?}", "Handler", params);
    let now = Utc::now();

    let descriptor = build_query(&params, now);
    let listings = state.listings.search(&descriptor).await?;

    let auction_ids: Vec<i64> = listings
        .iter()
        .filter(|l| l.listing_type == "auction")
        .map(|l| l.id)
        .collect();
    let bid_summary = aggregate_bids(&state.bids, &auction_ids).await?;

    let views = listings
        .into_iter()
        .map(|l| ListingView::new(l, now))
        .collect();
    Ok(Json(SearchResponse {
        listings: views,
        bid_summary,
    }))
}

/// 리스팅 단건 조회
pub async fn handle_get_listing(
    State(state): State<AppState>,
    Path(listing_id): Path<i64>,
) -> Result<Json<ListingView>, MarketError> {
    info!("{:<12} --> 리스팅 조회 id: {}", "Handler", listing_id);
    let listing = state.listings.get_listing(listing_id).await?;
    Ok(Json(ListingView::new(listing, Utc::now())))
}

/// 리스팅 등록
pub async fn handle_create_listing(
    State(state): State<AppState>,
    Json(req): Json<CreateListingRequest>,
) -> Result<Json<ListingView>, MarketError> {
    let listing = create_listing(&state.listings, req).await?;
    Ok(Json(ListingView::new(listing, Utc::now())))
}

/// 리스팅 종료 요청 본문
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndListingRequest {
    pub user_id: i64,
}

/// 판매자 리스팅 종료
pub async fn handle_end_listing(
    State(state): State<AppState>,
    Path(listing_id): Path<i64>,
    Json(req): Json<EndListingRequest>,
) -> Result<Json<ListingView>, MarketError> {
    let now = Utc::now();
    let listing = end_listing(&state.listings, &state.offers, req.user_id, listing_id, now).await?;
    Ok(Json(ListingView::new(listing, now)))
}

/// 리스팅 재등록
pub async fn handle_relist_listing(
    State(state): State<AppState>,
    Path(listing_id): Path<i64>,
    Json(req): Json<RelistRequest>,
) -> Result<Json<ListingView>, MarketError> {
    let now = Utc::now();
    let listing =
        relist_listing(&state.listings, req.user_id, listing_id, req.reason, now).await?;
    Ok(Json(ListingView::new(listing, now)))
}

// endregion: --- Listing Handlers

// region:    --- Bid Handlers

/// 입찰 요청 처리
pub async fn handle_place_bid(
    State(state): State<AppState>,
    Json(new): Json<NewBid>,
) -> Result<Json<Bid>, MarketError> {
    let bid = place_bid(&state.listings, &state.bids, new, Utc::now()).await?;
    Ok(Json(bid))
}

/// 입찰 집계 요청 본문
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidSummaryRequest {
    pub listing_ids: Vec<i64>,
}

/// 리스팅 집합 입찰 집계
pub async fn handle_bid_summaries(
    State(state): State<AppState>,
    Json(req): Json<BidSummaryRequest>,
) -> Result<Json<BidSummary>, MarketError> {
    let summary = aggregate_bids(&state.bids, &req.listing_ids).await?;
    Ok(Json(summary))
}

// endregion: --- Bid Handlers

// region:    --- Offer Handlers

/// 가격 제안 처리
pub async fn handle_make_offer(
    State(state): State<AppState>,
    Json(new): Json<NewOffer>,
) -> Result<Json<Offer>, MarketError> {
    let offer = make_offer(&state.listings, &state.offers, new, Utc::now()).await?;
    Ok(Json(offer))
}

/// 가격 제안 응답 처리
pub async fn handle_respond_offer(
    State(state): State<AppState>,
    Path(offer_id): Path<i64>,
    Json(response): Json<OfferResponse>,
) -> Result<Json<Offer>, MarketError> {
    let offer =
        respond_to_offer(&state.listings, &state.offers, offer_id, response, Utc::now()).await?;
    Ok(Json(offer))
}

// endregion: --- Offer Handlers

// region:    --- Dashboard Handlers

/// 대시보드 탭 쿼리
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    pub tab: DashboardTab,
    #[serde(default = "default_mode")]
    pub mode: ViewMode,
}

fn default_mode() -> ViewMode {
    ViewMode::Selling
}

/// 대시보드 탭 조회
/// 오래된 세대의 응답이 폐기된 경우 null을 돌려준다.
pub async fn handle_dashboard(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Option<TabListings>>, MarketError> {
    let result = state
        .dashboard
        .load_tab(user_id, query.tab, query.mode, Utc::now())
        .await?;
    Ok(Json(result))
}

// endregion: --- Dashboard Handlers

// region:    --- Tracking / Feedback / Verification Handlers

/// 조회수 추적
pub async fn handle_track_view(
    State(state): State<AppState>,
    Json(req): Json<TrackViewRequest>,
) -> Result<Json<ViewOutcome>, MarketError> {
    let outcome = track_view(&state.views, req.listing_id, &req.viewer_key, Utc::now()).await?;
    Ok(Json(outcome))
}

/// 피드백 작성
pub async fn handle_leave_feedback(
    State(state): State<AppState>,
    Json(new): Json<NewFeedback>,
) -> Result<Json<Feedback>, MarketError> {
    let feedback = feedback::leave_feedback(&state.feedback, new).await?;
    Ok(Json(feedback))
}

/// 사용자가 받은 피드백 조회
pub async fn handle_get_feedback(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Feedback>>, MarketError> {
    let rows = state.feedback.feedback_for_user(user_id).await?;
    Ok(Json(rows))
}

/// 인증 요청 제출
pub async fn handle_submit_verification(
    State(state): State<AppState>,
    Json(new): Json<NewVerificationRequest>,
) -> Result<Json<VerificationRequest>, MarketError> {
    let request = verification::submit_request(&state.verification, new).await?;
    Ok(Json(request))
}

/// 인증 요청 심사
pub async fn handle_decide_verification(
    State(state): State<AppState>,
    Path(request_id): Path<i64>,
    Json(decision): Json<VerificationDecision>,
) -> Result<Json<VerificationRequest>, MarketError> {
    let request = verification::decide_request(&state.verification, request_id, decision).await?;
    Ok(Json(request))
}

// endregion: --- Tracking / Feedback / Verification Handlers
