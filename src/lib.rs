pub mod bidding;
pub mod dashboard;
pub mod database;
pub mod error;
pub mod feedback;
pub mod handlers;
pub mod listing;
pub mod offer;
pub mod query;
pub mod realtime;
pub mod scheduler;
pub mod store;
pub mod tracking;
pub mod verification;
