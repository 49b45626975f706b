/// PostgreSQL 저장소 구현
/// 모든 엔티티 저장소 트레이트를 하나의 MarketStore가 구현하고,
/// 쓰기 이후에는 변경 레코드를 실시간 허브에 발행한다.
// region:    --- Imports
use crate::bidding::model::{Bid, NewBid, BID_ACTIVE};
use crate::database::DatabaseManager;
use crate::error::{is_unique_violation, MarketError};
use crate::feedback::{Feedback, NewFeedback};
use crate::listing::model::{Listing, Profile};
use crate::listing::status::STATUS_SOLD;
use crate::offer::model::{NewOffer, Offer, OFFER_AUTO_DECLINED, OFFER_PENDING};
use crate::query::filter::{FilterValue, Predicate, QueryDescriptor};
use crate::realtime::{ChangeHub, ChangeKind, ChangeRecord};
use crate::store::{
    BidStore, FeedbackStore, ListingStore, NewListing, OfferStore, SoldListing, SoldScope,
    VerificationStore, ViewStore,
};
use crate::verification::{NewVerificationRequest, VerificationRequest, VERIFICATION_PENDING};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Postgres, QueryBuilder, Row};
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Queries

/// 리스팅 조회
const GET_LISTING: &str = "SELECT * FROM listings WHERE id = $1";

/// 리스팅 등록
const INSERT_LISTING: &str = r#"
    INSERT INTO listings (seller_id, title, description, category, listing_type, price,
        reserve_price, location, condition, image_refs, allow_best_offer, expires_at,
        original_listing_id, relist_count, relist_reason, relisted_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
    RETURNING *
"#;

/// 리스팅 상태 변경
const SET_LISTING_STATUS: &str =
    "UPDATE listings SET status = $1, updated_at = NOW() WHERE id = $2";

/// 판매 완료 처리
const MARK_SOLD: &str = r#"
    UPDATE listings
    SET status = 'sold', sale_date = $1, sale_amount = $2, sale_buyer_id = $3, updated_at = NOW()
    WHERE id = $4
"#;

/// 식별자 집합 조회
const GET_LISTINGS_BY_IDS: &str =
    "SELECT * FROM listings WHERE id = ANY($1) ORDER BY created_at DESC";

/// 판매 완료 리스팅 조회 (판매자 기준, 구매자 프로필 조인)
const GET_SOLD_BY_SELLER: &str = r#"
    SELECT l.*, p.id AS buyer_profile_id, p.username AS buyer_username, p.location AS buyer_location
    FROM listings l
    LEFT JOIN profiles p ON p.id = l.sale_buyer_id
    WHERE l.status = 'sold' AND l.seller_id = $1
    ORDER BY l.created_at DESC
"#;

/// 판매 완료 리스팅 조회 (구매자 기준, 구매자 프로필 조인)
const GET_SOLD_BY_BUYER: &str = r#"
    SELECT l.*, p.id AS buyer_profile_id, p.username AS buyer_username, p.location AS buyer_location
    FROM listings l
    LEFT JOIN profiles p ON p.id = l.sale_buyer_id
    WHERE l.status = 'sold' AND l.sale_buyer_id = $1
    ORDER BY l.created_at DESC
"#;

/// 최고 활성 입찰 조회 (금액 내림차순 1건)
const GET_HIGHEST_ACTIVE_BID: &str = r#"
    SELECT * FROM bids
    WHERE listing_id = $1 AND status = 'active'
    ORDER BY amount DESC
    LIMIT 1
"#;

/// 활성 입찰 수 조회
const GET_ACTIVE_BID_COUNT: &str =
    "SELECT COUNT(*) FROM bids WHERE listing_id = $1 AND status = 'active'";

/// 입찰 등록
const INSERT_BID: &str = r#"
    INSERT INTO bids (listing_id, bidder_id, amount, maximum_bid, bid_increment, status)
    VALUES ($1, $2, $3, $4, $5, $6)
    RETURNING *
"#;

/// 입찰 금액/상태 갱신
const UPDATE_BID: &str = "UPDATE bids SET amount = $1, status = $2, updated_at = NOW() WHERE id = $3";

/// 사용자의 활성 입찰 대상 리스팅 조회
const GET_BIDDING_LISTING_IDS: &str =
    "SELECT DISTINCT listing_id FROM bids WHERE bidder_id = $1 AND status = 'active'";

/// 가격 제안 등록
const INSERT_OFFER: &str = r#"
    INSERT INTO offers (listing_id, buyer_id, amount, message)
    VALUES ($1, $2, $3, $4)
    RETURNING *
"#;

/// 가격 제안 조회
const GET_OFFER: &str = "SELECT * FROM offers WHERE id = $1";

/// 가격 제안 상태 변경
const SET_OFFER_STATUS: &str =
    "UPDATE offers SET status = $1, updated_at = NOW() WHERE id = $2";

/// 대기 중 제안 일괄 자동 거절
const AUTO_DECLINE_PENDING: &str = r#"
    UPDATE offers SET status = $1, updated_at = NOW()
    WHERE listing_id = $2 AND status = $3 AND ($4::BIGINT IS NULL OR id <> $4)
"#;

/// 피드백 등록
const INSERT_FEEDBACK: &str = r#"
    INSERT INTO feedback (from_user_id, to_user_id, listing_id, rating, comment)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING *
"#;

/// 사용자가 받은 피드백 조회
const GET_FEEDBACK_FOR_USER: &str =
    "SELECT * FROM feedback WHERE to_user_id = $1 ORDER BY created_at DESC";

/// 대기 중 인증 요청 조회
const GET_PENDING_REQUEST: &str =
    "SELECT * FROM verification_requests WHERE user_id = $1 AND status = $2 LIMIT 1";

/// 인증 요청 등록
const INSERT_REQUEST: &str = r#"
    INSERT INTO verification_requests (user_id, request_type, document_refs)
    VALUES ($1, $2, $3)
    RETURNING *
"#;

/// 인증 요청 조회
const GET_REQUEST: &str = "SELECT * FROM verification_requests WHERE id = $1";

/// 인증 요청 상태 변경
const SET_REQUEST_STATUS: &str =
    "UPDATE verification_requests SET status = $1, updated_at = NOW() WHERE id = $2";

/// 중복 조회 여부 확인
const RECENT_VIEW_EXISTS: &str = r#"
    SELECT EXISTS (
        SELECT 1 FROM listing_views
        WHERE listing_id = $1 AND viewer_key = $2 AND viewed_at > $3
    )
"#;

/// 조회 기록 등록
const RECORD_VIEW: &str =
    "INSERT INTO listing_views (listing_id, viewer_key, viewed_at) VALUES ($1, $2, $3)";

/// 조회수 증가
const INCREMENT_VIEWS: &str =
    "UPDATE listings SET views = views + 1 WHERE id = $1 RETURNING views";

/// 조회수 조회
const GET_VIEW_COUNT: &str = "SELECT views FROM listings WHERE id = $1";

// endregion: --- Queries

// region:    --- Market Store

pub struct MarketStore {
    db: Arc<DatabaseManager>,
    hub: Arc<ChangeHub>,
}

impl MarketStore {
    pub fn new(db: Arc<DatabaseManager>, hub: Arc<ChangeHub>) -> Self {
        Self { db, hub }
    }

    fn publish(&self, table: &'static str, kind: ChangeKind, row: serde_json::Value) {
        self.hub.publish(ChangeRecord { table, kind, row });
    }
}

/// 술어를 SQL 조각으로 변환 (컬럼 이름은 빌더가 만든 정적 문자열이다)
fn push_predicate(qb: &mut QueryBuilder<Postgres>, predicate: &Predicate) {
    match predicate {
        Predicate::Eq { column, value } => {
            qb.push(format!(" AND {column} = "));
            push_value(qb, value);
        }
        Predicate::Gte { column, value } => {
            qb.push(format!(" AND {column} >= "));
            push_value(qb, value);
        }
        Predicate::Lte { column, value } => {
            qb.push(format!(" AND {column} <= "));
            push_value(qb, value);
        }
        Predicate::In { column, values } => {
            qb.push(format!(" AND {column} IN ("));
            let mut separated = qb.separated(", ");
            for value in values {
                separated.push_bind(value.clone());
            }
            qb.push(")");
        }
        Predicate::After { column, value } => {
            qb.push(format!(" AND {column} > "));
            qb.push_bind(*value);
        }
        Predicate::ContainsIgnoreCase { column, value } => {
            qb.push(format!(" AND {column} ILIKE "));
            qb.push_bind(format!("%{value}%"));
        }
    }
}

fn push_value(qb: &mut QueryBuilder<Postgres>, value: &FilterValue) {
    match value {
        FilterValue::Text(text) => qb.push_bind(text.clone()),
        FilterValue::Number(number) => qb.push_bind(*number),
        FilterValue::Bool(flag) => qb.push_bind(*flag),
    };
}

#[async_trait]
impl ListingStore for MarketStore {
    async fn search(&self, query: &QueryDescriptor) -> Result<Vec<Listing>, MarketError> {
        info!(
            "{:<12} --> 리스팅 검색: 술어 {}개",
            "Store",
            query.predicates.len()
        );
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM listings WHERE TRUE");
        for predicate in &query.predicates {
            push_predicate(&mut qb, predicate);
        }
        qb.push(format!(
            " ORDER BY {} {}",
            query.sort.column,
            if query.sort.ascending { "ASC" } else { "DESC" }
        ));
        // 미보정 페이지 범위는 OFFSET/LIMIT 직전에 0으로 클램프한다
        let offset = query.range.start.max(0);
        let limit = (query.range.end - query.range.start + 1).max(0);
        qb.push(" LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build_query_as::<Listing>()
            .fetch_all(self.db.pool())
            .await?;
        Ok(rows)
    }

    async fn get_listing(&self, id: i64) -> Result<Listing, MarketError> {
        let listing = sqlx::query_as::<_, Listing>(GET_LISTING)
            .bind(id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(listing)
    }

    async fn insert_listing(&self, new: NewListing) -> Result<Listing, MarketError> {
        let listing = sqlx::query_as::<_, Listing>(INSERT_LISTING)
            .bind(new.seller_id)
            .bind(&new.title)
            .bind(&new.description)
            .bind(&new.category)
            .bind(&new.listing_type)
            .bind(new.price)
            .bind(new.reserve_price)
            .bind(&new.location)
            .bind(&new.condition)
            .bind(&new.image_refs)
            .bind(new.allow_best_offer)
            .bind(new.expires_at)
            .bind(new.original_listing_id)
            .bind(new.relist_count)
            .bind(&new.relist_reason)
            .bind(new.relisted_at)
            .fetch_one(self.db.pool())
            .await?;
        self.publish(
            "listings",
            ChangeKind::Insert,
            serde_json::to_value(&listing).unwrap_or_default(),
        );
        Ok(listing)
    }

    async fn set_listing_status(&self, id: i64, status: &str) -> Result<(), MarketError> {
        let result = sqlx::query(SET_LISTING_STATUS)
            .bind(status)
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound.into());
        }
        self.publish(
            "listings",
            ChangeKind::Update,
            serde_json::json!({ "id": id, "status": status }),
        );
        Ok(())
    }

    async fn mark_sold(
        &self,
        id: i64,
        buyer_id: i64,
        amount: f64,
        sale_date: DateTime<Utc>,
    ) -> Result<(), MarketError> {
        let result = sqlx::query(MARK_SOLD)
            .bind(sale_date)
            .bind(amount)
            .bind(buyer_id)
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound.into());
        }
        self.publish(
            "listings",
            ChangeKind::Update,
            serde_json::json!({
                "id": id,
                "status": STATUS_SOLD,
                "saleBuyerId": buyer_id,
                "saleAmount": amount,
            }),
        );
        Ok(())
    }

    async fn by_seller(
        &self,
        seller_id: i64,
        statuses: &[&str],
    ) -> Result<Vec<Listing>, MarketError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM listings WHERE seller_id = ");
        qb.push_bind(seller_id);
        if !statuses.is_empty() {
            qb.push(" AND status IN (");
            let mut separated = qb.separated(", ");
            for status in statuses {
                separated.push_bind(status.to_string());
            }
            qb.push(")");
        }
        qb.push(" ORDER BY created_at DESC");

        let rows = qb
            .build_query_as::<Listing>()
            .fetch_all(self.db.pool())
            .await?;
        Ok(rows)
    }

    async fn by_ids(&self, ids: &[i64]) -> Result<Vec<Listing>, MarketError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, Listing>(GET_LISTINGS_BY_IDS)
            .bind(ids.to_vec())
            .fetch_all(self.db.pool())
            .await?;
        Ok(rows)
    }

    async fn sold_listings(&self, scope: SoldScope) -> Result<Vec<SoldListing>, MarketError> {
        let (sql, user_id) = match scope {
            SoldScope::Seller(id) => (GET_SOLD_BY_SELLER, id),
            SoldScope::Buyer(id) => (GET_SOLD_BY_BUYER, id),
        };
        let rows = sqlx::query(sql)
            .bind(user_id)
            .fetch_all(self.db.pool())
            .await?;

        let mut sold = Vec::with_capacity(rows.len());
        for row in rows {
            let listing = Listing::from_row(&row).map_err(MarketError::Store)?;
            let buyer = match row
                .try_get::<Option<i64>, _>("buyer_profile_id")
                .map_err(MarketError::Store)?
            {
                Some(profile_id) => Some(Profile {
                    id: profile_id,
                    username: row.try_get("buyer_username").map_err(MarketError::Store)?,
                    location: row.try_get("buyer_location").map_err(MarketError::Store)?,
                }),
                None => None,
            };
            sold.push(SoldListing { listing, buyer });
        }
        Ok(sold)
    }
}

#[async_trait]
impl BidStore for MarketStore {
    async fn highest_active_bid(&self, listing_id: i64) -> Result<Option<Bid>, MarketError> {
        let bid = sqlx::query_as::<_, Bid>(GET_HIGHEST_ACTIVE_BID)
            .bind(listing_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(bid)
    }

    async fn active_bid_count(&self, listing_id: i64) -> Result<i64, MarketError> {
        let count = sqlx::query_scalar::<_, i64>(GET_ACTIVE_BID_COUNT)
            .bind(listing_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    async fn insert_bid(&self, new: NewBid, amount: f64) -> Result<Bid, MarketError> {
        let bid = sqlx::query_as::<_, Bid>(INSERT_BID)
            .bind(new.listing_id)
            .bind(new.bidder_id)
            .bind(amount)
            .bind(new.maximum_bid)
            .bind(new.bid_increment)
            .bind(BID_ACTIVE)
            .fetch_one(self.db.pool())
            .await?;
        self.publish(
            "bids",
            ChangeKind::Insert,
            serde_json::to_value(&bid).unwrap_or_default(),
        );
        Ok(bid)
    }

    async fn update_bid(&self, id: i64, amount: f64, status: &str) -> Result<(), MarketError> {
        let result = sqlx::query(UPDATE_BID)
            .bind(amount)
            .bind(status)
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound.into());
        }
        self.publish(
            "bids",
            ChangeKind::Update,
            serde_json::json!({ "id": id, "amount": amount, "status": status }),
        );
        Ok(())
    }

    async fn listings_with_active_bids(&self, bidder_id: i64) -> Result<Vec<i64>, MarketError> {
        let ids = sqlx::query_scalar::<_, i64>(GET_BIDDING_LISTING_IDS)
            .bind(bidder_id)
            .fetch_all(self.db.pool())
            .await?;
        Ok(ids)
    }
}

#[async_trait]
impl OfferStore for MarketStore {
    async fn insert_offer(&self, new: NewOffer) -> Result<Offer, MarketError> {
        let offer = sqlx::query_as::<_, Offer>(INSERT_OFFER)
            .bind(new.listing_id)
            .bind(new.buyer_id)
            .bind(new.amount)
            .bind(&new.message)
            .fetch_one(self.db.pool())
            .await?;
        self.publish(
            "offers",
            ChangeKind::Insert,
            serde_json::to_value(&offer).unwrap_or_default(),
        );
        Ok(offer)
    }

    async fn get_offer(&self, id: i64) -> Result<Offer, MarketError> {
        let offer = sqlx::query_as::<_, Offer>(GET_OFFER)
            .bind(id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(offer)
    }

    async fn set_offer_status(&self, id: i64, status: &str) -> Result<(), MarketError> {
        let result = sqlx::query(SET_OFFER_STATUS)
            .bind(status)
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound.into());
        }
        self.publish(
            "offers",
            ChangeKind::Update,
            serde_json::json!({ "id": id, "status": status }),
        );
        Ok(())
    }

    async fn auto_decline_pending(
        &self,
        listing_id: i64,
        except_id: Option<i64>,
    ) -> Result<u64, MarketError> {
        let result = sqlx::query(AUTO_DECLINE_PENDING)
            .bind(OFFER_AUTO_DECLINED)
            .bind(listing_id)
            .bind(OFFER_PENDING)
            .bind(except_id)
            .execute(self.db.pool())
            .await?;
        let declined = result.rows_affected();
        if declined > 0 {
            self.publish(
                "offers",
                ChangeKind::Update,
                serde_json::json!({
                    "listingId": listing_id,
                    "status": OFFER_AUTO_DECLINED,
                }),
            );
        }
        Ok(declined)
    }
}

#[async_trait]
impl FeedbackStore for MarketStore {
    async fn insert_feedback(&self, new: NewFeedback) -> Result<Feedback, MarketError> {
        let feedback = sqlx::query_as::<_, Feedback>(INSERT_FEEDBACK)
            .bind(new.from_user_id)
            .bind(new.to_user_id)
            .bind(new.listing_id)
            .bind(new.rating)
            .bind(&new.message)
            .fetch_one(self.db.pool())
            .await
            .map_err(|e| {
                // (from_user, listing) 고유 제약 위반은 도메인 오류로 변환
                if is_unique_violation(&e) {
                    MarketError::DuplicateFeedback
                } else {
                    MarketError::Store(e)
                }
            })?;
        self.publish(
            "feedback",
            ChangeKind::Insert,
            serde_json::to_value(&feedback).unwrap_or_default(),
        );
        Ok(feedback)
    }

    async fn feedback_for_user(&self, to_user_id: i64) -> Result<Vec<Feedback>, MarketError> {
        let rows = sqlx::query_as::<_, Feedback>(GET_FEEDBACK_FOR_USER)
            .bind(to_user_id)
            .fetch_all(self.db.pool())
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl VerificationStore for MarketStore {
    async fn pending_for_user(
        &self,
        user_id: i64,
    ) -> Result<Option<VerificationRequest>, MarketError> {
        let request = sqlx::query_as::<_, VerificationRequest>(GET_PENDING_REQUEST)
            .bind(user_id)
            .bind(VERIFICATION_PENDING)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(request)
    }

    async fn insert_request(
        &self,
        new: NewVerificationRequest,
    ) -> Result<VerificationRequest, MarketError> {
        let request = sqlx::query_as::<_, VerificationRequest>(INSERT_REQUEST)
            .bind(new.user_id)
            .bind(&new.request_type)
            .bind(&new.document_refs)
            .fetch_one(self.db.pool())
            .await?;
        Ok(request)
    }

    async fn get_request(&self, id: i64) -> Result<VerificationRequest, MarketError> {
        let request = sqlx::query_as::<_, VerificationRequest>(GET_REQUEST)
            .bind(id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(request)
    }

    async fn set_request_status(&self, id: i64, status: &str) -> Result<(), MarketError> {
        let result = sqlx::query(SET_REQUEST_STATUS)
            .bind(status)
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound.into());
        }
        Ok(())
    }
}

#[async_trait]
impl ViewStore for MarketStore {
    async fn recent_view_exists(
        &self,
        listing_id: i64,
        viewer_key: &str,
        since: DateTime<Utc>,
    ) -> Result<bool, MarketError> {
        let exists = sqlx::query_scalar::<_, bool>(RECENT_VIEW_EXISTS)
            .bind(listing_id)
            .bind(viewer_key)
            .bind(since)
            .fetch_one(self.db.pool())
            .await?;
        Ok(exists)
    }

    async fn record_view(
        &self,
        listing_id: i64,
        viewer_key: &str,
        at: DateTime<Utc>,
    ) -> Result<(), MarketError> {
        sqlx::query(RECORD_VIEW)
            .bind(listing_id)
            .bind(viewer_key)
            .bind(at)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    async fn increment_views(&self, listing_id: i64) -> Result<i64, MarketError> {
        let views = sqlx::query_scalar::<_, i64>(INCREMENT_VIEWS)
            .bind(listing_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(views)
    }

    async fn view_count(&self, listing_id: i64) -> Result<i64, MarketError> {
        let views = sqlx::query_scalar::<_, i64>(GET_VIEW_COUNT)
            .bind(listing_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(views)
    }
}

// endregion: --- Market Store
