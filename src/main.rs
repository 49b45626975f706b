// region:    --- Imports
use crate::dashboard::DashboardOrchestrator;
use crate::database::DatabaseManager;
use crate::handlers::AppState;
use crate::realtime::ChangeHub;
use crate::store::postgres::MarketStore;
use crate::store::{
    BidStore, FeedbackStore, ListingStore, OfferStore, VerificationStore, ViewStore,
};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Modules
mod bidding;
mod dashboard;
mod database;
mod error;
mod feedback;
mod handlers;
mod listing;
mod offer;
mod query;
mod realtime;
mod scheduler;
mod store;
mod tracking;
mod verification;

// endregion: --- Modules

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // DatabaseManager 생성
    let db_manager = Arc::new(DatabaseManager::new().await);

    // 데이터베이스 초기화
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // 실시간 변경 허브 및 저장소 생성
    let hub = ChangeHub::new();
    let market = Arc::new(MarketStore::new(Arc::clone(&db_manager), Arc::clone(&hub)));

    let listings: Arc<dyn ListingStore> = market.clone();
    let bids: Arc<dyn BidStore> = market.clone();
    let offers: Arc<dyn OfferStore> = market.clone();
    let feedback: Arc<dyn FeedbackStore> = market.clone();
    let verification: Arc<dyn VerificationStore> = market.clone();
    let views: Arc<dyn ViewStore> = market.clone();

    // 대시보드 오케스트레이터 생성
    let dashboard = Arc::new(DashboardOrchestrator::new(
        Arc::clone(&listings),
        Arc::clone(&bids),
    ));

    let state = AppState {
        listings,
        bids,
        offers,
        feedback,
        verification,
        views,
        dashboard,
    };

    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정
    let routes_all = Router::new()
        .route(
            "/listings",
            get(handlers::handle_search_listings).post(handlers::handle_create_listing),
        )
        .route("/listings/:id", get(handlers::handle_get_listing))
        .route("/listings/:id/end", post(handlers::handle_end_listing))
        .route("/listings/:id/relist", post(handlers::handle_relist_listing))
        .route("/bids", post(handlers::handle_place_bid))
        .route("/bid-summaries", post(handlers::handle_bid_summaries))
        .route("/offers", post(handlers::handle_make_offer))
        .route("/offers/:id/response", post(handlers::handle_respond_offer))
        .route("/dashboard/:user_id", get(handlers::handle_dashboard))
        .route("/track-view", post(handlers::handle_track_view))
        .route("/feedback", post(handlers::handle_leave_feedback))
        .route("/users/:id/feedback", get(handlers::handle_get_feedback))
        .route(
            "/verification",
            post(handlers::handle_submit_verification),
        )
        .route(
            "/verification/:id/decision",
            post(handlers::handle_decide_verification),
        )
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 20))
        .with_state(state);

    // 리스너 생성(로컬 호스트의 3000번 포트를 사용)
    let listener = TcpListener::bind("0.0.0.0:3000").await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
