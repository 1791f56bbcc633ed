use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::{offer_details::OfferType, profiles::ProfileType};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub user: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub file: Option<String>,
    pub location: String,
    pub tel: String,
    pub description: String,
    pub working_hours: String,
    #[serde(rename = "type")]
    pub profile_type: ProfileType,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BusinessProfile {
    pub user: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub file: Option<String>,
    pub location: String,
    pub tel: String,
    pub description: String,
    pub working_hours: String,
    #[serde(rename = "type")]
    pub profile_type: ProfileType,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomerProfile {
    pub user: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub file: Option<String>,
    #[serde(rename = "type")]
    pub profile_type: ProfileType,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OfferDetail {
    pub id: i32,
    pub title: String,
    pub revisions: i32,
    pub delivery_time_in_days: i32,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub features: Vec<String>,
    pub offer_type: OfferType,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OfferDetailLink {
    pub id: i32,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserDetails {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OfferListItem {
    pub id: i32,
    pub user: i32,
    pub title: String,
    pub image: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub details: Vec<OfferDetailLink>,
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub min_price: Option<Decimal>,
    pub min_delivery_time: Option<i32>,
    pub user_details: UserDetails,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OfferView {
    pub id: i32,
    pub user: i32,
    pub title: String,
    pub image: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub details: Vec<OfferDetailLink>,
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub min_price: Option<Decimal>,
    pub min_delivery_time: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OfferWithDetails {
    pub id: i32,
    pub user: i32,
    pub title: String,
    pub image: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub details: Vec<OfferDetail>,
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub min_price: Option<Decimal>,
    pub min_delivery_time: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: i32,
    pub customer_user: i32,
    pub business_user: i32,
    pub offer_detail: i32,
    pub title: String,
    pub revisions: i32,
    pub delivery_time_in_days: i32,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub features: Vec<String>,
    pub offer_type: OfferType,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderCount {
    pub order_count: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CompletedOrderCount {
    pub completed_order_count: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub id: i32,
    pub business_user: i32,
    pub reviewer: i32,
    pub rating: i32,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BaseInfo {
    pub review_count: u64,
    pub average_rating: f64,
    pub business_profile_count: u64,
    pub offer_count: u64,
}
