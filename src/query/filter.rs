/// 검색 필터/정렬 빌더
/// UI 필터 상태(문자열 파라미터)를 저장소 중립적인 쿼리 기술자
/// (술어 목록 + 정렬 + 페이지 범위)로 변환하는 순수 함수 모음.
// region:    --- Imports
use chrono::{DateTime, Utc};
use serde::Deserialize;

// endregion: --- Imports

// region:    --- Query Descriptor

/// 필터 값
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

/// 쿼리 술어
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq {
        column: &'static str,
        value: FilterValue,
    },
    Gte {
        column: &'static str,
        value: FilterValue,
    },
    Lte {
        column: &'static str,
        value: FilterValue,
    },
    In {
        column: &'static str,
        values: Vec<String>,
    },
    /// 타임스탬프 컬럼이 기준 시각 이후인지 (엄격한 > 비교)
    After {
        column: &'static str,
        value: DateTime<Utc>,
    },
    /// 대소문자 무시 부분 문자열 일치
    ContainsIgnoreCase {
        column: &'static str,
        value: String,
    },
}

/// 정렬 기술자
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub column: &'static str,
    pub ascending: bool,
}

/// 페이지 범위 (양 끝 포함 인덱스)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: i64,
    pub end: i64,
}

/// 저장소에 전달되는 쿼리 기술자
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    pub predicates: Vec<Predicate>,
    pub sort: Sort,
    pub range: PageRange,
}

// endregion: --- Query Descriptor

// region:    --- Filter Params

/// UI에서 넘어오는 검색 필터 상태
/// 전부 문자열 파라미터이며 "all_*" 값은 필터 없음을 뜻하는 센티널이다.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ListingFilterParams {
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub listing_type: Option<String>,
    pub location: Option<String>,
    pub condition: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub allow_best_offer: Option<String>,
    pub search_term: Option<String>,
    pub show_completed: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

// endregion: --- Filter Params

// region:    --- Builder

pub const DEFAULT_PAGE_SIZE: i64 = 9;

/// 필터 상태를 쿼리 기술자로 변환
pub fn build_query(params: &ListingFilterParams, now: DateTime<Utc>) -> QueryDescriptor {
    let mut predicates = Vec::new();

    // 기본값: 활성 상태이면서 아직 만료되지 않은 리스팅만 노출
    // showCompleted == "true"인 경우 기존 동작을 그대로 보존한다:
    // completed는 저장된 상태 집합에 없는 값이지만 원래 그렇게 조회해 왔다.
    if params.show_completed.as_deref() == Some("true") {
        predicates.push(Predicate::In {
            column: "status",
            values: vec![
                "active".to_string(),
                "completed".to_string(),
                "expired".to_string(),
                "sold".to_string(),
            ],
        });
    } else {
        predicates.push(Predicate::Eq {
            column: "status",
            value: FilterValue::Text("active".to_string()),
        });
        predicates.push(Predicate::After {
            column: "expires_at",
            value: now,
        });
    }

    if let Some(category) = selected(&params.category) {
        predicates.push(Predicate::Eq {
            column: "category",
            value: FilterValue::Text(category.to_string()),
        });
    }

    if let Some(listing_type) = selected(&params.listing_type) {
        predicates.push(Predicate::Eq {
            column: "listing_type",
            value: FilterValue::Text(listing_type.to_string()),
        });
    }

    if let Some(location) = selected(&params.location) {
        predicates.push(Predicate::Eq {
            column: "location",
            value: FilterValue::Text(location.to_string()),
        });
    }

    if let Some(condition) = selected(&params.condition) {
        predicates.push(Predicate::Eq {
            column: "condition",
            value: FilterValue::Text(normalize_condition(condition)),
        });
    }

    if let Some(min_price) = parse_price(&params.min_price) {
        predicates.push(Predicate::Gte {
            column: "price",
            value: FilterValue::Number(min_price),
        });
    }

    if let Some(max_price) = parse_price(&params.max_price) {
        predicates.push(Predicate::Lte {
            column: "price",
            value: FilterValue::Number(max_price),
        });
    }

    if params.allow_best_offer.as_deref() == Some("true") {
        predicates.push(Predicate::Eq {
            column: "allow_best_offer",
            value: FilterValue::Bool(true),
        });
    }

    if let Some(term) = params.search_term.as_deref().filter(|t| !t.is_empty()) {
        predicates.push(Predicate::ContainsIgnoreCase {
            column: "title",
            value: term.to_string(),
        });
    }

    QueryDescriptor {
        predicates,
        sort: parse_sort(params.sort.as_deref()),
        range: page_range(params.page.as_deref(), params.page_size.as_deref()),
    }
}

/// 센티널("all_*") 및 빈 값 처리
fn selected(raw: &Option<String>) -> Option<&str> {
    raw.as_deref()
        .filter(|v| !v.is_empty() && !v.starts_with("all_"))
}

/// 가격 파라미터 숫자 변환 (파싱 불가 시 필터 없음)
fn parse_price(raw: &Option<String>) -> Option<f64> {
    raw.as_deref().and_then(|v| v.parse::<f64>().ok())
}

/// 상태 표기 정규화 (like_new -> "Like New" 등)
/// 인식되지 않는 값은 그대로 통과시킨다.
pub fn normalize_condition(raw: &str) -> String {
    match raw {
        "like_new" => "Like New".to_string(),
        "new" => "New".to_string(),
        "used" => "Used".to_string(),
        "fair" => "Fair".to_string(),
        other => other.to_string(),
    }
}

/// 정렬 프리셋 해석
/// 프리셋에 없는 "필드-방향" 문자열은 필드가 created_at/price인 경우에만 폴백으로 해석
pub fn parse_sort(raw: Option<&str>) -> Sort {
    const NEWEST: Sort = Sort {
        column: "created_at",
        ascending: false,
    };
    match raw {
        Some("newest") | None => NEWEST,
        Some("oldest") => Sort {
            column: "created_at",
            ascending: true,
        },
        Some("price-low") | Some("price-asc") => Sort {
            column: "price",
            ascending: true,
        },
        Some("price-high") | Some("price-desc") => Sort {
            column: "price",
            ascending: false,
        },
        Some("popular") => Sort {
            column: "views",
            ascending: false,
        },
        Some(other) => match other.rsplit_once('-') {
            Some(("created_at", order)) => Sort {
                column: "created_at",
                ascending: order == "asc",
            },
            Some(("price", order)) => Sort {
                column: "price",
                ascending: order == "asc",
            },
            _ => NEWEST,
        },
    }
}

/// 1 기반 페이지 번호를 양 끝 포함 인덱스 범위로 변환
/// page가 0이면 음수 범위가 나온다. 의도된 미보정 동작이며
/// SQL 계층이 OFFSET/LIMIT 직전에 0으로 클램프한다.
pub fn page_range(page: Option<&str>, page_size: Option<&str>) -> PageRange {
    let page = page.and_then(|p| p.parse::<i64>().ok()).unwrap_or(1);
    let page_size = page_size
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(DEFAULT_PAGE_SIZE);
    let start = (page - 1) * page_size;
    PageRange {
        start,
        end: start + page_size - 1,
    }
}

// endregion: --- Builder
