pub mod auth_service;
pub mod offer_service;
pub mod order_service;
pub mod profile_service;
pub mod review_service;
pub mod stats_service;
