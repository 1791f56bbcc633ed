use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::entity::offer_details::OfferType;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OfferDetailInput {
    pub title: String,
    pub revisions: i32,
    pub delivery_time_in_days: i32,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
    #[serde(default)]
    pub features: Vec<String>,
    pub offer_type: OfferType,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OfferRequest {
    pub title: String,
    pub image: Option<String>,
    #[serde(default)]
    pub description: String,
    pub details: Vec<OfferDetailInput>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct OfferDetailPatch {
    pub title: Option<String>,
    pub revisions: Option<i32>,
    pub delivery_time_in_days: Option<i32>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    pub features: Option<Vec<String>>,
    pub offer_type: Option<OfferType>,
}

impl OfferDetailPatch {
    pub fn complete(&self) -> Option<OfferDetailInput> {
        Some(OfferDetailInput {
            title: self.title.clone()?,
            revisions: self.revisions?,
            delivery_time_in_days: self.delivery_time_in_days?,
            price: self.price?,
            features: self.features.clone().unwrap_or_default(),
            offer_type: self.offer_type?,
        })
    }
}

impl From<OfferDetailInput> for OfferDetailPatch {
    fn from(input: OfferDetailInput) -> Self {
        Self {
            title: Some(input.title),
            revisions: Some(input.revisions),
            delivery_time_in_days: Some(input.delivery_time_in_days),
            price: Some(input.price),
            features: Some(input.features),
            offer_type: Some(input.offer_type),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct OfferPatch {
    pub title: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub details: Option<Vec<OfferDetailPatch>>,
}

impl From<OfferRequest> for OfferPatch {
    fn from(req: OfferRequest) -> Self {
        Self {
            title: Some(req.title),
            image: req.image,
            description: Some(req.description),
            details: Some(req.details.into_iter().map(OfferDetailPatch::from).collect()),
        }
    }
}
