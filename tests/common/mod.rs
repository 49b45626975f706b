/// 테스트용 인메모리 저장소
/// 저장소 트레이트를 그대로 구현해 PostgreSQL 없이 커맨드/오케스트레이터를
/// 검증한다. 실패 주입 플래그로 집계 실패 경로도 재현한다.
// region:    --- Imports
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use marketplace_service::bidding::model::{Bid, NewBid, BID_ACTIVE};
use marketplace_service::error::MarketError;
use marketplace_service::feedback::{Feedback, NewFeedback};
use marketplace_service::listing::model::{Listing, Profile};
use marketplace_service::offer::model::{NewOffer, Offer, OFFER_AUTO_DECLINED, OFFER_PENDING};
use marketplace_service::query::filter::{FilterValue, Predicate, QueryDescriptor};
use marketplace_service::store::{
    BidStore, FeedbackStore, ListingStore, NewListing, OfferStore, SoldListing, SoldScope,
    VerificationStore, ViewStore,
};
use marketplace_service::verification::{
    NewVerificationRequest, VerificationRequest, VERIFICATION_PENDING,
};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;
use tokio::time::sleep;

// endregion: --- Imports

// region:    --- Memory Store

#[derive(Default)]
pub struct MemoryStore {
    pub listings: Mutex<Vec<Listing>>,
    pub profiles: Mutex<Vec<Profile>>,
    pub bids: Mutex<Vec<Bid>>,
    pub offers: Mutex<Vec<Offer>>,
    pub feedback: Mutex<Vec<Feedback>>,
    pub requests: Mutex<Vec<VerificationRequest>>,
    pub views: Mutex<Vec<(i64, String, DateTime<Utc>)>>,
    next_id: AtomicI64,
    /// 입찰 조회 실패 주입 (집계 전체 실패 경로 검증용)
    pub fail_bids: AtomicBool,
    /// 리스팅 조회 지연 주입 (밀리초, 세대 토큰 검증용)
    pub listing_delay_ms: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        let store = Self::default();
        // 수동으로 심은 행의 id와 겹치지 않도록 충분히 큰 값에서 시작
        store.next_id.store(100, Ordering::SeqCst);
        store
    }

    pub fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn add_listing(&self, listing: Listing) {
        self.listings.lock().unwrap().push(listing);
    }

    pub fn add_profile(&self, profile: Profile) {
        self.profiles.lock().unwrap().push(profile);
    }

    pub fn add_bid(&self, bid: Bid) {
        self.bids.lock().unwrap().push(bid);
    }

    async fn listing_delay(&self) {
        let ms = self.listing_delay_ms.load(Ordering::SeqCst);
        if ms > 0 {
            sleep(std::time::Duration::from_millis(ms as u64)).await;
        }
    }
}

/// 테스트용 리스팅 생성
pub fn make_listing(id: i64, seller_id: i64, status: &str, expires_at: DateTime<Utc>) -> Listing {
    let now = Utc::now();
    Listing {
        id,
        seller_id,
        title: format!("테스트 리스팅 {id}"),
        description: "테스트용 리스팅입니다.".to_string(),
        category: "electronics".to_string(),
        listing_type: "auction".to_string(),
        price: 10000.0,
        reserve_price: None,
        location: "seoul".to_string(),
        condition: "Used".to_string(),
        image_refs: Vec::new(),
        allow_best_offer: false,
        status: status.to_string(),
        expires_at,
        created_at: now - Duration::seconds(id),
        updated_at: now,
        views: 0,
        saves: 0,
        sale_date: None,
        sale_amount: None,
        sale_buyer_id: None,
        original_listing_id: None,
        relist_count: 0,
        relist_reason: None,
        relisted_at: None,
    }
}

/// 테스트용 입찰 생성
pub fn make_bid(id: i64, listing_id: i64, bidder_id: i64, amount: f64, status: &str) -> Bid {
    let now = Utc::now();
    Bid {
        id,
        listing_id,
        bidder_id,
        amount,
        maximum_bid: amount,
        bid_increment: 1000.0,
        status: status.to_string(),
        created_at: now,
        updated_at: now,
    }
}

/// 술어 평가 (인메모리 검색용 해석기)
fn matches_predicate(listing: &Listing, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Eq { column, value } => match (*column, value) {
            ("status", FilterValue::Text(v)) => listing.status == *v,
            ("category", FilterValue::Text(v)) => listing.category == *v,
            ("listing_type", FilterValue::Text(v)) => listing.listing_type == *v,
            ("location", FilterValue::Text(v)) => listing.location == *v,
            ("condition", FilterValue::Text(v)) => listing.condition == *v,
            ("allow_best_offer", FilterValue::Bool(v)) => listing.allow_best_offer == *v,
            _ => false,
        },
        Predicate::Gte { column, value } => match (*column, value) {
            ("price", FilterValue::Number(v)) => listing.price >= *v,
            _ => false,
        },
        Predicate::Lte { column, value } => match (*column, value) {
            ("price", FilterValue::Number(v)) => listing.price <= *v,
            _ => false,
        },
        Predicate::In { column, values } => match *column {
            "status" => values.contains(&listing.status),
            _ => false,
        },
        Predicate::After { column, value } => match *column {
            "expires_at" => listing.expires_at > *value,
            _ => false,
        },
        Predicate::ContainsIgnoreCase { column, value } => match *column {
            "title" => listing
                .title
                .to_lowercase()
                .contains(&value.to_lowercase()),
            _ => false,
        },
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn search(&self, query: &QueryDescriptor) -> Result<Vec<Listing>, MarketError> {
        self.listing_delay().await;
        let mut rows: Vec<Listing> = self
            .listings
            .lock()
            .unwrap()
            .iter()
            .filter(|l| query.predicates.iter().all(|p| matches_predicate(l, p)))
            .cloned()
            .collect();

        rows.sort_by(|a, b| {
            let ordering = match query.sort.column {
                "price" => a.price.partial_cmp(&b.price).unwrap_or(std::cmp::Ordering::Equal),
                "views" => a.views.cmp(&b.views),
                _ => a.created_at.cmp(&b.created_at),
            };
            if query.sort.ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });

        // PostgreSQL 구현과 같은 방식으로 클램프한다 (offset >= 0, limit >= 0)
        let offset = query.range.start.max(0) as usize;
        let limit = (query.range.end - query.range.start + 1).max(0) as usize;
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn get_listing(&self, id: i64) -> Result<Listing, MarketError> {
        self.listings
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or(MarketError::Store(sqlx::Error::RowNotFound))
    }

    async fn insert_listing(&self, new: NewListing) -> Result<Listing, MarketError> {
        let now = Utc::now();
        let listing = Listing {
            id: self.next_id(),
            seller_id: new.seller_id,
            title: new.title,
            description: new.description,
            category: new.category,
            listing_type: new.listing_type,
            price: new.price,
            reserve_price: new.reserve_price,
            location: new.location,
            condition: new.condition,
            image_refs: new.image_refs,
            allow_best_offer: new.allow_best_offer,
            status: "active".to_string(),
            expires_at: new.expires_at,
            created_at: now,
            updated_at: now,
            views: 0,
            saves: 0,
            sale_date: None,
            sale_amount: None,
            sale_buyer_id: None,
            original_listing_id: new.original_listing_id,
            relist_count: new.relist_count,
            relist_reason: new.relist_reason,
            relisted_at: new.relisted_at,
        };
        self.listings.lock().unwrap().push(listing.clone());
        Ok(listing)
    }

    async fn set_listing_status(&self, id: i64, status: &str) -> Result<(), MarketError> {
        let mut listings = self.listings.lock().unwrap();
        let listing = listings
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(MarketError::Store(sqlx::Error::RowNotFound))?;
        listing.status = status.to_string();
        listing.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_sold(
        &self,
        id: i64,
        buyer_id: i64,
        amount: f64,
        sale_date: DateTime<Utc>,
    ) -> Result<(), MarketError> {
        let mut listings = self.listings.lock().unwrap();
        let listing = listings
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(MarketError::Store(sqlx::Error::RowNotFound))?;
        listing.status = "sold".to_string();
        listing.sale_date = Some(sale_date);
        listing.sale_amount = Some(amount);
        listing.sale_buyer_id = Some(buyer_id);
        listing.updated_at = sale_date;
        Ok(())
    }

    async fn by_seller(
        &self,
        seller_id: i64,
        statuses: &[&str],
    ) -> Result<Vec<Listing>, MarketError> {
        self.listing_delay().await;
        let mut rows: Vec<Listing> = self
            .listings
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.seller_id == seller_id)
            .filter(|l| statuses.is_empty() || statuses.contains(&l.status.as_str()))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn by_ids(&self, ids: &[i64]) -> Result<Vec<Listing>, MarketError> {
        self.listing_delay().await;
        let mut rows: Vec<Listing> = self
            .listings
            .lock()
            .unwrap()
            .iter()
            .filter(|l| ids.contains(&l.id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn sold_listings(&self, scope: SoldScope) -> Result<Vec<SoldListing>, MarketError> {
        let profiles = self.profiles.lock().unwrap().clone();
        let mut rows: Vec<SoldListing> = self
            .listings
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.status == "sold")
            .filter(|l| match scope {
                SoldScope::Seller(id) => l.seller_id == id,
                SoldScope::Buyer(id) => l.sale_buyer_id == Some(id),
            })
            .cloned()
            .map(|listing| {
                let buyer = listing
                    .sale_buyer_id
                    .and_then(|id| profiles.iter().find(|p| p.id == id).cloned());
                SoldListing { listing, buyer }
            })
            .collect();
        rows.sort_by(|a, b| b.listing.created_at.cmp(&a.listing.created_at));
        Ok(rows)
    }
}

#[async_trait]
impl BidStore for MemoryStore {
    async fn highest_active_bid(&self, listing_id: i64) -> Result<Option<Bid>, MarketError> {
        if self.fail_bids.load(Ordering::SeqCst) {
            return Err(MarketError::Internal("모의 저장소 오류".to_string()));
        }
        let bids = self.bids.lock().unwrap();
        Ok(bids
            .iter()
            .filter(|b| b.listing_id == listing_id && b.status == BID_ACTIVE)
            .max_by(|a, b| {
                a.amount
                    .partial_cmp(&b.amount)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .cloned())
    }

    async fn active_bid_count(&self, listing_id: i64) -> Result<i64, MarketError> {
        if self.fail_bids.load(Ordering::SeqCst) {
            return Err(MarketError::Internal("모의 저장소 오류".to_string()));
        }
        let bids = self.bids.lock().unwrap();
        Ok(bids
            .iter()
            .filter(|b| b.listing_id == listing_id && b.status == BID_ACTIVE)
            .count() as i64)
    }

    async fn insert_bid(&self, new: NewBid, amount: f64) -> Result<Bid, MarketError> {
        let now = Utc::now();
        let bid = Bid {
            id: self.next_id(),
            listing_id: new.listing_id,
            bidder_id: new.bidder_id,
            amount,
            maximum_bid: new.maximum_bid,
            bid_increment: new.bid_increment,
            status: BID_ACTIVE.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.bids.lock().unwrap().push(bid.clone());
        Ok(bid)
    }

    async fn update_bid(&self, id: i64, amount: f64, status: &str) -> Result<(), MarketError> {
        let mut bids = self.bids.lock().unwrap();
        let bid = bids
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(MarketError::Store(sqlx::Error::RowNotFound))?;
        bid.amount = amount;
        bid.status = status.to_string();
        bid.updated_at = Utc::now();
        Ok(())
    }

    async fn listings_with_active_bids(&self, bidder_id: i64) -> Result<Vec<i64>, MarketError> {
        let bids = self.bids.lock().unwrap();
        let mut ids: Vec<i64> = bids
            .iter()
            .filter(|b| b.bidder_id == bidder_id && b.status == BID_ACTIVE)
            .map(|b| b.listing_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }
}

#[async_trait]
impl OfferStore for MemoryStore {
    async fn insert_offer(&self, new: NewOffer) -> Result<Offer, MarketError> {
        let now = Utc::now();
        let offer = Offer {
            id: self.next_id(),
            listing_id: new.listing_id,
            buyer_id: new.buyer_id,
            amount: new.amount,
            message: new.message,
            status: OFFER_PENDING.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.offers.lock().unwrap().push(offer.clone());
        Ok(offer)
    }

    async fn get_offer(&self, id: i64) -> Result<Offer, MarketError> {
        self.offers
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or(MarketError::Store(sqlx::Error::RowNotFound))
    }

    async fn set_offer_status(&self, id: i64, status: &str) -> Result<(), MarketError> {
        let mut offers = self.offers.lock().unwrap();
        let offer = offers
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(MarketError::Store(sqlx::Error::RowNotFound))?;
        offer.status = status.to_string();
        offer.updated_at = Utc::now();
        Ok(())
    }

    async fn auto_decline_pending(
        &self,
        listing_id: i64,
        except_id: Option<i64>,
    ) -> Result<u64, MarketError> {
        let mut offers = self.offers.lock().unwrap();
        let mut declined = 0;
        for offer in offers.iter_mut() {
            if offer.listing_id == listing_id
                && offer.status == OFFER_PENDING
                && Some(offer.id) != except_id
            {
                offer.status = OFFER_AUTO_DECLINED.to_string();
                offer.updated_at = Utc::now();
                declined += 1;
            }
        }
        Ok(declined)
    }
}

#[async_trait]
impl FeedbackStore for MemoryStore {
    async fn insert_feedback(&self, new: NewFeedback) -> Result<Feedback, MarketError> {
        let mut rows = self.feedback.lock().unwrap();
        // (from_user, listing) 고유 제약
        if rows
            .iter()
            .any(|f| f.from_user_id == new.from_user_id && f.listing_id == new.listing_id)
        {
            return Err(MarketError::DuplicateFeedback);
        }
        let feedback = Feedback {
            id: self.next_id(),
            from_user_id: new.from_user_id,
            to_user_id: new.to_user_id,
            listing_id: new.listing_id,
            rating: new.rating,
            comment: new.message,
            created_at: Utc::now(),
        };
        rows.push(feedback.clone());
        Ok(feedback)
    }

    async fn feedback_for_user(&self, to_user_id: i64) -> Result<Vec<Feedback>, MarketError> {
        Ok(self
            .feedback
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.to_user_id == to_user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl VerificationStore for MemoryStore {
    async fn pending_for_user(
        &self,
        user_id: i64,
    ) -> Result<Option<VerificationRequest>, MarketError> {
        Ok(self
            .requests
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.user_id == user_id && r.status == VERIFICATION_PENDING)
            .cloned())
    }

    async fn insert_request(
        &self,
        new: NewVerificationRequest,
    ) -> Result<VerificationRequest, MarketError> {
        let now = Utc::now();
        let request = VerificationRequest {
            id: self.next_id(),
            user_id: new.user_id,
            request_type: new.request_type,
            status: VERIFICATION_PENDING.to_string(),
            document_refs: new.document_refs,
            payment_status: "unpaid".to_string(),
            document_status: "missing".to_string(),
            created_at: now,
            updated_at: now,
        };
        self.requests.lock().unwrap().push(request.clone());
        Ok(request)
    }

    async fn get_request(&self, id: i64) -> Result<VerificationRequest, MarketError> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(MarketError::Store(sqlx::Error::RowNotFound))
    }

    async fn set_request_status(&self, id: i64, status: &str) -> Result<(), MarketError> {
        let mut requests = self.requests.lock().unwrap();
        let request = requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(MarketError::Store(sqlx::Error::RowNotFound))?;
        request.status = status.to_string();
        request.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl ViewStore for MemoryStore {
    async fn recent_view_exists(
        &self,
        listing_id: i64,
        viewer_key: &str,
        since: DateTime<Utc>,
    ) -> Result<bool, MarketError> {
        Ok(self
            .views
            .lock()
            .unwrap()
            .iter()
            .any(|(id, key, at)| *id == listing_id && key == viewer_key && *at > since))
    }

    async fn record_view(
        &self,
        listing_id: i64,
        viewer_key: &str,
        at: DateTime<Utc>,
    ) -> Result<(), MarketError> {
        self.views
            .lock()
            .unwrap()
            .push((listing_id, viewer_key.to_string(), at));
        Ok(())
    }

    async fn increment_views(&self, listing_id: i64) -> Result<i64, MarketError> {
        let mut listings = self.listings.lock().unwrap();
        let listing = listings
            .iter_mut()
            .find(|l| l.id == listing_id)
            .ok_or(MarketError::Store(sqlx::Error::RowNotFound))?;
        listing.views += 1;
        Ok(listing.views)
    }

    async fn view_count(&self, listing_id: i64) -> Result<i64, MarketError> {
        let listings = self.listings.lock().unwrap();
        listings
            .iter()
            .find(|l| l.id == listing_id)
            .map(|l| l.views)
            .ok_or(MarketError::Store(sqlx::Error::RowNotFound))
    }
}

// endregion: --- Memory Store
