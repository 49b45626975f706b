/// 조회수 추적 서비스
/// 같은 뷰어(사용자/IP 키)의 반복 조회는 1시간 윈도우 안에서 중복 제거한다.
// region:    --- Imports
use crate::error::MarketError;
use crate::store::ViewStore;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- View Tracking

/// 중복 제거 윈도우 (1시간)
pub fn dedup_window() -> Duration {
    Duration::hours(1)
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TrackViewRequest {
    pub listing_id: i64,
    pub viewer_key: String,
}

/// 추적 결과: 이번 조회가 집계되었는지와 갱신된 조회수
#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ViewOutcome {
    pub counted: bool,
    pub views: i64,
}

/// 리스팅 조회 기록
pub async fn track_view(
    store: &Arc<dyn ViewStore>,
    listing_id: i64,
    viewer_key: &str,
    now: DateTime<Utc>,
) -> Result<ViewOutcome, MarketError> {
    let since = now - dedup_window();

    if store
        .recent_view_exists(listing_id, viewer_key, since)
        .await?
    {
        let views = store.view_count(listing_id).await?;
        info!(
            "{:<12} --> 중복 조회 무시: listing={} viewer={}",
            "ViewTrack", listing_id, viewer_key
        );
        return Ok(ViewOutcome {
            counted: false,
            views,
        });
    }

    store.record_view(listing_id, viewer_key, now).await?;
    let views = store.increment_views(listing_id).await?;
    info!(
        "{:<12} --> 조회 집계: listing={} views={}",
        "ViewTrack", listing_id, views
    );
    Ok(ViewOutcome {
        counted: true,
        views,
    })
}

// endregion: --- View Tracking
