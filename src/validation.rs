use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    dto::{
        auth::RegisterRequest,
        offers::{OfferDetailInput, OfferDetailPatch},
    },
    entity::offer_details::OfferType,
};

pub const RATING_OUT_OF_RANGE: &str = "Rating muss zwischen 1 und 5 liegen.";
pub const DETAILS_COUNT: &str =
    "Ein Offer muss genau 3 Details enthalten (basic, standard, premium).";
pub const DETAILS_TYPES: &str =
    "Die Details müssen die Typen 'basic', 'standard' und 'premium' enthalten.";
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_STATUS_LEN: usize = 30;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    /// Records a message; the first message per field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

pub fn validate_registration(req: &RegisterRequest) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    if req.username.trim().is_empty() {
        errors.add("username", "This field may not be blank.");
    }
    let email = req.email.trim();
    if email.is_empty() {
        errors.add("email", "This field may not be blank.");
    } else if !email.contains('@') {
        errors.add("email", "Enter a valid email address.");
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            format!("Ensure this field has at least {MIN_PASSWORD_LEN} characters."),
        );
    }
    if req.password != req.repeated_password {
        errors.add("repeated_password", "Passwords do not match.");
    }
    errors.into_result()
}

pub fn validate_rating(rating: i32) -> Result<(), FieldErrors> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(FieldErrors::single("rating", RATING_OUT_OF_RANGE))
    }
}

pub fn validate_status(status: &str) -> Result<(), FieldErrors> {
    let status = status.trim();
    if status.is_empty() {
        return Err(FieldErrors::single("status", "This field may not be blank."));
    }
    if status.chars().count() > MAX_STATUS_LEN {
        return Err(FieldErrors::single(
            "status",
            format!("Ensure this field has no more than {MAX_STATUS_LEN} characters."),
        ));
    }
    Ok(())
}

pub fn validate_detail_set(details: &[OfferDetailInput]) -> Result<(), FieldErrors> {
    if details.len() != OfferType::ALL.len() {
        return Err(FieldErrors::single("details", DETAILS_COUNT));
    }
    let present: BTreeSet<OfferType> = details.iter().map(|d| d.offer_type).collect();
    let required: BTreeSet<OfferType> = OfferType::ALL.into_iter().collect();
    if present != required {
        return Err(FieldErrors::single("details", DETAILS_TYPES));
    }
    for detail in details {
        validate_detail_values(
            Some(&detail.title),
            Some(detail.revisions),
            Some(detail.delivery_time_in_days),
            Some(detail.price),
        )?;
    }
    Ok(())
}

pub fn validate_detail_patches(details: &[OfferDetailPatch]) -> Result<(), FieldErrors> {
    let mut seen = BTreeSet::new();
    for detail in details {
        let Some(offer_type) = detail.offer_type else {
            return Err(FieldErrors::single(
                "details",
                "Jedes Detail benötigt einen offer_type.",
            ));
        };
        if !seen.insert(offer_type) {
            return Err(FieldErrors::single(
                "details",
                "Jeder offer_type darf nur einmal vorkommen.",
            ));
        }
        validate_detail_values(
            detail.title.as_deref(),
            detail.revisions,
            detail.delivery_time_in_days,
            detail.price,
        )?;
    }
    Ok(())
}

fn validate_detail_values(
    title: Option<&str>,
    revisions: Option<i32>,
    delivery_time_in_days: Option<i32>,
    price: Option<Decimal>,
) -> Result<(), FieldErrors> {
    if title.is_some_and(|t| t.trim().is_empty()) {
        return Err(FieldErrors::single("details", "Titel darf nicht leer sein."));
    }
    if revisions.is_some_and(|r| r < 0) {
        return Err(FieldErrors::single(
            "details",
            "revisions darf nicht negativ sein.",
        ));
    }
    if delivery_time_in_days.is_some_and(|d| d < 0) {
        return Err(FieldErrors::single(
            "details",
            "delivery_time_in_days darf nicht negativ sein.",
        ));
    }
    if let Some(price) = price {
        // NUMERIC(10, 2)
        let limit = Decimal::new(99_999_999_99, 2);
        if price.is_sign_negative() || price > limit {
            return Err(FieldErrors::single("details", "Ungültiger Preis."));
        }
    }
    Ok(())
}
