/// 리스팅 상태 도출
/// 저장된 status와 만료 시각을 비교해 표시용 상태를 계산한다.
/// 화면 표시와 게이트 판정은 모두 이 모듈을 거쳐야 한다.
// region:    --- Imports
use crate::listing::model::Listing;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

// endregion: --- Imports

// region:    --- Status Constants

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_ENDED: &str = "ended";
pub const STATUS_EXPIRED: &str = "expired";
pub const STATUS_SOLD: &str = "sold";
pub const STATUS_RELISTED: &str = "relisted";

// endregion: --- Status Constants

// region:    --- Effective Status

/// 표시용 상태 계산
/// 저장된 상태가 active이고 만료 시각이 지났으면 expired로 도출한다.
/// 경계 조건: expires_at == now 는 만료가 아니다 (엄격한 < 비교).
pub fn effective_status<'a>(
    status: &'a str,
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> &'a str {
    if status == STATUS_ACTIVE && expires_at < now {
        STATUS_EXPIRED
    } else {
        status
    }
}

/// 현재 입찰/구매 가능 여부
pub fn is_active(listing: &Listing, now: DateTime<Utc>) -> bool {
    effective_status(&listing.status, listing.expires_at, now) == STATUS_ACTIVE
}

/// 종료 여부 (판매 완료, 만료, 판매자 종료)
pub fn is_ended(listing: &Listing, now: DateTime<Utc>) -> bool {
    matches!(
        effective_status(&listing.status, listing.expires_at, now),
        STATUS_SOLD | STATUS_EXPIRED | STATUS_ENDED
    )
}

/// 판매자가 직접 종료할 수 있는지 여부 (active이면서 아직 만료 전)
pub fn can_end(listing: &Listing, now: DateTime<Utc>) -> bool {
    is_active(listing, now)
}

/// 대시보드 종료 탭 포함 여부
/// 종료 탭 판정도 effective_status를 재사용한다 (만료 정의는 이 모듈이 유일한 기준).
pub fn in_ended_tab(listing: &Listing, now: DateTime<Utc>) -> bool {
    matches!(
        effective_status(&listing.status, listing.expires_at, now),
        STATUS_ENDED | STATUS_EXPIRED | STATUS_RELISTED
    )
}

// endregion: --- Effective Status

// region:    --- Badge

/// 배지 색상 톤
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTone {
    Green,
    Gray,
    Red,
    Blue,
    Neutral,
}

/// 리스팅 카드에 표시되는 상태 배지
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub label: String,
    pub tone: BadgeTone,
    pub pulse: bool,
}

/// 표시용 상태에 따른 배지 계산
/// active이면서 만료까지 24시간 미만 남은 경우 "Ending Soon" (빨강, 점멸)
pub fn badge_for(listing: &Listing, now: DateTime<Utc>) -> Badge {
    match effective_status(&listing.status, listing.expires_at, now) {
        STATUS_SOLD => Badge {
            label: "Sold".to_string(),
            tone: BadgeTone::Green,
            pulse: false,
        },
        STATUS_ENDED | STATUS_EXPIRED => Badge {
            label: "Ended".to_string(),
            tone: BadgeTone::Gray,
            pulse: false,
        },
        STATUS_ACTIVE => {
            let remaining = listing.expires_at - now;
            if remaining < Duration::hours(24) {
                Badge {
                    label: "Ending Soon".to_string(),
                    tone: BadgeTone::Red,
                    pulse: true,
                }
            } else {
                Badge {
                    label: "Active".to_string(),
                    tone: BadgeTone::Blue,
                    pulse: false,
                }
            }
        }
        other => Badge {
            label: capitalize(other),
            tone: BadgeTone::Neutral,
            pulse: false,
        },
    }
}

/// 첫 글자만 대문자로 변환 (알 수 없는 상태의 폴백 라벨)
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// endregion: --- Badge
