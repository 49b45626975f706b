/// 순수 로직 테스트: 상태 도출, 배지, 필터/정렬 빌더, 페이지 범위,
/// 레코드 변환, 백오프 지연 계산
// region:    --- Imports
use chrono::{Duration, TimeZone, Utc};
use marketplace_service::listing::status::{
    badge_for, can_end, effective_status, in_ended_tab, is_active, is_ended, BadgeTone,
};
use marketplace_service::listing::transform::ListingRecord;
use marketplace_service::query::filter::{
    build_query, normalize_condition, page_range, parse_sort, FilterValue, ListingFilterParams,
    Predicate,
};
use marketplace_service::scheduler::backoff_delay;

mod common;
use common::make_listing;

// endregion: --- Imports

// region:    --- Status Deriver

/// 활성 리스팅의 만료 도출: expires_at < now 일 때만 expired
#[test]
fn test_effective_status_expiry() {
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();

    let expired = effective_status("active", now - Duration::seconds(1), now);
    assert_eq!(expired, "expired");

    let active = effective_status("active", now + Duration::seconds(1), now);
    assert_eq!(active, "active");
}

/// 경계 조건: expires_at == now 는 만료가 아니다 (엄격한 < 비교)
#[test]
fn test_effective_status_boundary_not_expired() {
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    assert_eq!(effective_status("active", now, now), "active");
}

/// 종료 상태는 만료 시각과 무관하게 그대로 통과한다
#[test]
fn test_effective_status_terminal_passthrough() {
    let now = Utc::now();
    let past = now - Duration::days(30);
    assert_eq!(effective_status("sold", past, now), "sold");
    assert_eq!(effective_status("ended", past, now), "ended");
    assert_eq!(effective_status("relisted", past, now), "relisted");
}

#[test]
fn test_status_predicates() {
    let now = Utc::now();

    let active = make_listing(1, 1, "active", now + Duration::days(3));
    assert!(is_active(&active, now));
    assert!(can_end(&active, now));
    assert!(!is_ended(&active, now));

    let lapsed = make_listing(2, 1, "active", now - Duration::hours(1));
    assert!(!is_active(&lapsed, now));
    assert!(!can_end(&lapsed, now));
    assert!(is_ended(&lapsed, now));
    assert!(in_ended_tab(&lapsed, now));

    let sold = make_listing(3, 1, "sold", now + Duration::days(3));
    assert!(is_ended(&sold, now));
    assert!(!in_ended_tab(&sold, now));

    let relisted = make_listing(4, 1, "relisted", now + Duration::days(3));
    assert!(!is_ended(&relisted, now));
    assert!(in_ended_tab(&relisted, now));
}

// endregion: --- Status Deriver

// region:    --- Badge

#[test]
fn test_badge_sold_and_ended() {
    let now = Utc::now();

    let sold = make_listing(1, 1, "sold", now + Duration::days(1));
    let badge = badge_for(&sold, now);
    assert_eq!(badge.label, "Sold");
    assert_eq!(badge.tone, BadgeTone::Green);
    assert!(!badge.pulse);

    let ended = make_listing(2, 1, "ended", now + Duration::days(1));
    assert_eq!(badge_for(&ended, now).tone, BadgeTone::Gray);

    let lapsed = make_listing(3, 1, "active", now - Duration::hours(2));
    let badge = badge_for(&lapsed, now);
    assert_eq!(badge.label, "Ended");
    assert_eq!(badge.tone, BadgeTone::Gray);
}

/// Ending Soon: 0 <= 남은 시간 < 24시간인 활성 리스팅만 점멸 배지
#[test]
fn test_badge_ending_soon_window() {
    let now = Utc::now();

    let soon = make_listing(1, 1, "active", now + Duration::hours(23));
    let badge = badge_for(&soon, now);
    assert_eq!(badge.label, "Ending Soon");
    assert_eq!(badge.tone, BadgeTone::Red);
    assert!(badge.pulse);

    // 정확히 24시간 남은 경우는 일반 Active
    let exactly_24h = make_listing(2, 1, "active", now + Duration::hours(24));
    let badge = badge_for(&exactly_24h, now);
    assert_eq!(badge.label, "Active");
    assert_eq!(badge.tone, BadgeTone::Blue);
    assert!(!badge.pulse);

    // 만료 시각과 정확히 같으면 남은 시간 0으로 Ending Soon
    let at_boundary = make_listing(3, 1, "active", now);
    assert!(badge_for(&at_boundary, now).pulse);
}

/// 알 수 없는 상태는 첫 글자만 대문자로 바꾼 중립 배지
#[test]
fn test_badge_unknown_status_fallback() {
    let now = Utc::now();
    let odd = make_listing(1, 1, "pending_review", now + Duration::days(1));
    let badge = badge_for(&odd, now);
    assert_eq!(badge.label, "Pending_review");
    assert_eq!(badge.tone, BadgeTone::Neutral);
    assert!(!badge.pulse);
}

// endregion: --- Badge

// region:    --- Filter Builder

/// 기본값: status == active AND expires_at > now
#[test]
fn test_build_query_defaults() {
    let now = Utc::now();
    let descriptor = build_query(&ListingFilterParams::default(), now);

    assert_eq!(
        descriptor.predicates[0],
        Predicate::Eq {
            column: "status",
            value: FilterValue::Text("active".to_string()),
        }
    );
    assert_eq!(
        descriptor.predicates[1],
        Predicate::After {
            column: "expires_at",
            value: now,
        }
    );
    assert_eq!(descriptor.sort.column, "created_at");
    assert!(!descriptor.sort.ascending);
    assert_eq!(descriptor.range.start, 0);
    assert_eq!(descriptor.range.end, 8);
}

/// showCompleted == "true": 만료 술어 없이 네 가지 상태 포함
#[test]
fn test_build_query_show_completed() {
    let now = Utc::now();
    let params = ListingFilterParams {
        show_completed: Some("true".to_string()),
        ..Default::default()
    };
    let descriptor = build_query(&params, now);

    assert_eq!(
        descriptor.predicates[0],
        Predicate::In {
            column: "status",
            values: vec![
                "active".to_string(),
                "completed".to_string(),
                "expired".to_string(),
                "sold".to_string(),
            ],
        }
    );
    assert!(!descriptor
        .predicates
        .iter()
        .any(|p| matches!(p, Predicate::After { .. })));
}

/// 상태 표기 정규화: like_new 필터는 정확히 "Like New"와 비교해야 한다
#[test]
fn test_build_query_condition_normalization() {
    let now = Utc::now();
    let params = ListingFilterParams {
        condition: Some("like_new".to_string()),
        ..Default::default()
    };
    let descriptor = build_query(&params, now);

    assert!(descriptor.predicates.contains(&Predicate::Eq {
        column: "condition",
        value: FilterValue::Text("Like New".to_string()),
    }));

    // 인식되지 않는 값은 그대로 통과
    assert_eq!(normalize_condition("refurbished"), "refurbished");
}

/// "all_*" 센티널은 필터 없음을 뜻한다
#[test]
fn test_build_query_sentinels_and_prices() {
    let now = Utc::now();
    let params = ListingFilterParams {
        category: Some("all_categories".to_string()),
        location: Some("all_locations".to_string()),
        listing_type: Some("auction".to_string()),
        min_price: Some("100".to_string()),
        max_price: Some("500.5".to_string()),
        allow_best_offer: Some("true".to_string()),
        search_term: Some("Vintage".to_string()),
        ..Default::default()
    };
    let descriptor = build_query(&params, now);

    assert!(!descriptor
        .predicates
        .iter()
        .any(|p| matches!(p, Predicate::Eq { column: "category", .. })));
    assert!(descriptor.predicates.contains(&Predicate::Eq {
        column: "listing_type",
        value: FilterValue::Text("auction".to_string()),
    }));
    assert!(descriptor.predicates.contains(&Predicate::Gte {
        column: "price",
        value: FilterValue::Number(100.0),
    }));
    assert!(descriptor.predicates.contains(&Predicate::Lte {
        column: "price",
        value: FilterValue::Number(500.5),
    }));
    assert!(descriptor.predicates.contains(&Predicate::Eq {
        column: "allow_best_offer",
        value: FilterValue::Bool(true),
    }));
    assert!(descriptor.predicates.contains(&Predicate::ContainsIgnoreCase {
        column: "title",
        value: "Vintage".to_string(),
    }));
}

#[test]
fn test_parse_sort_presets_and_fallback() {
    assert_eq!(parse_sort(Some("newest")).column, "created_at");
    assert!(!parse_sort(Some("newest")).ascending);
    assert!(parse_sort(Some("oldest")).ascending);
    assert!(parse_sort(Some("price-low")).ascending);
    assert_eq!(parse_sort(Some("price-low")).column, "price");
    assert!(!parse_sort(Some("price-high")).ascending);
    assert_eq!(parse_sort(Some("popular")).column, "views");

    // 폴백: created_at/price 필드만 "필드-방향" 형태로 해석
    let fallback = parse_sort(Some("created_at-asc"));
    assert_eq!(fallback.column, "created_at");
    assert!(fallback.ascending);

    // 그 밖의 문자열은 기본값 (최신순)
    let unknown = parse_sort(Some("title-asc"));
    assert_eq!(unknown.column, "created_at");
    assert!(!unknown.ascending);
}

/// 페이지 범위: 1 기반, 양 끝 포함
#[test]
fn test_page_range() {
    let range = page_range(Some("2"), Some("9"));
    assert_eq!(range.start, 9);
    assert_eq!(range.end, 17);

    let default_range = page_range(None, None);
    assert_eq!(default_range.start, 0);
    assert_eq!(default_range.end, 8);

    // page 0은 의도적으로 보정하지 않는다 (SQL 계층이 클램프)
    let unclamped = page_range(Some("0"), None);
    assert_eq!(unclamped.start, -9);
    assert_eq!(unclamped.end, -1);
}

// endregion: --- Filter Builder

// region:    --- Listing Transformer

fn sample_record_json() -> serde_json::Value {
    serde_json::json!({
        "id": 7,
        "seller_id": 3,
        "title": "빈티지 카메라",
        "description": "필름 카메라입니다.",
        "category": "electronics",
        "listing_type": "sale",
        "price": "1250.50",
        "reserve_price": null,
        "location": "busan",
        "condition": "Like New",
        "image_refs": ["a.jpg"],
        "allow_best_offer": true,
        "status": "active",
        "expires_at": "2025-06-08T12:00:00Z",
        "created_at": "2025-06-01T12:00:00Z",
        "updated_at": "2025-06-01T12:00:00Z",
        "views": 4,
        "saves": 1,
        "sale_date": null,
        "sale_amount": null,
        "sale_buyer_id": null,
        "relist_reason": null
    })
}

/// 문자열 날짜/가격과 null 선택 필드 변환
#[test]
fn test_record_transform() {
    let record: ListingRecord = serde_json::from_value(sample_record_json()).unwrap();
    let listing = record.into_listing().unwrap();

    assert_eq!(listing.id, 7);
    assert_eq!(listing.price, 1250.5);
    assert_eq!(
        listing.expires_at,
        Utc.with_ymd_and_hms(2025, 6, 8, 12, 0, 0).unwrap()
    );
    // null과 누락 필드는 모두 None으로 수렴한다
    assert!(listing.reserve_price.is_none());
    assert!(listing.sale_date.is_none());
    assert!(listing.original_listing_id.is_none());
    assert_eq!(listing.relist_count, 0);
}

/// 직렬화 시 None 필드는 null 대신 생략된다
#[test]
fn test_view_model_omits_absent_fields() {
    let record: ListingRecord = serde_json::from_value(sample_record_json()).unwrap();
    let listing = record.into_listing().unwrap();

    let serialized = serde_json::to_value(&listing).unwrap();
    assert!(serialized.get("reservePrice").is_none());
    assert!(serialized.get("saleDate").is_none());
    assert_eq!(serialized["listingType"], "sale");
}

/// 숫자 형태 가격도 그대로 받아들인다
#[test]
fn test_record_transform_numeric_price() {
    let mut raw = sample_record_json();
    raw["price"] = serde_json::json!(990);
    let record: ListingRecord = serde_json::from_value(raw).unwrap();
    assert_eq!(record.into_listing().unwrap().price, 990.0);
}

/// 잘못된 날짜는 변환 오류
#[test]
fn test_record_transform_invalid_date() {
    let mut raw = sample_record_json();
    raw["expires_at"] = serde_json::json!("2025-06-99");
    let record: ListingRecord = serde_json::from_value(raw).unwrap();
    assert!(record.into_listing().is_err());
}

// endregion: --- Listing Transformer

// region:    --- Backoff

/// 지수 백오프: 2^count * 1000ms
#[test]
fn test_backoff_delay() {
    assert_eq!(backoff_delay(0).as_millis(), 1000);
    assert_eq!(backoff_delay(1).as_millis(), 2000);
    assert_eq!(backoff_delay(2).as_millis(), 4000);
    assert_eq!(backoff_delay(5).as_millis(), 32000);
}

/// 큰 카운트에서도 지연은 상한에서 멈춘다 (시프트 오버플로 금지)
#[test]
fn test_backoff_delay_capped() {
    let cap = backoff_delay(10);
    assert_eq!(cap.as_millis(), 1_024_000);
    assert_eq!(backoff_delay(11), cap);
    assert_eq!(backoff_delay(64), cap);
    assert_eq!(backoff_delay(u32::MAX), cap);
}

// endregion: --- Backoff

// region:    --- Lifecycle Scenario

/// 등록 직후 Active 배지, 만료 시각 경과 후 상태 변경 없이도 expired 도출
#[test]
fn test_listing_lifecycle_scenario() {
    let created = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    let listing = make_listing(1, 1, "active", created + Duration::days(7));

    let badge = badge_for(&listing, created);
    assert_eq!(badge.label, "Active");
    assert!(can_end(&listing, created));

    // 시간 경과 시뮬레이션: 저장된 상태는 그대로 active
    let later = created + Duration::days(7) + Duration::seconds(1);
    assert_eq!(
        effective_status(&listing.status, listing.expires_at, later),
        "expired"
    );
    assert!(!can_end(&listing, later));
    assert_eq!(badge_for(&listing, later).label, "Ended");
}

// endregion: --- Lifecycle Scenario
