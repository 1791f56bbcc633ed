use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};
use coderr_api::{
    dto::{
        auth::RegisterRequest,
        offers::{OfferDetailInput, OfferDetailPatch},
        profiles::UpdateProfileRequest,
    },
    entity::{offer_details::OfferType, profiles::ProfileType},
    error::AppError,
    services::{auth_service::generate_token, stats_service::round_rating},
    validation::{
        DETAILS_COUNT, DETAILS_TYPES, RATING_OUT_OF_RANGE, validate_detail_patches,
        validate_detail_set, validate_rating, validate_registration, validate_status,
    },
};
use rust_decimal::Decimal;
use serde_json::{Value, json};

fn tier(offer_type: OfferType, price: i64) -> OfferDetailInput {
    OfferDetailInput {
        title: format!("{offer_type:?}"),
        revisions: 1,
        delivery_time_in_days: 3,
        price: Decimal::from(price),
        features: vec!["Logo".into()],
        offer_type,
    }
}

async fn body_json(err: AppError) -> (StatusCode, Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[test]
fn rating_must_be_between_one_and_five() {
    for rating in 1..=5 {
        assert!(validate_rating(rating).is_ok());
    }
    for rating in [0, 6, -1] {
        let errors = validate_rating(rating).unwrap_err();
        assert_eq!(errors.get("rating"), Some(RATING_OUT_OF_RANGE));
    }
}

#[test]
fn detail_set_needs_exactly_one_tier_each() {
    let full = vec![
        tier(OfferType::Basic, 50),
        tier(OfferType::Standard, 100),
        tier(OfferType::Premium, 200),
    ];
    assert!(validate_detail_set(&full).is_ok());

    let errors = validate_detail_set(&full[..2]).unwrap_err();
    assert_eq!(errors.get("details"), Some(DETAILS_COUNT));

    let duplicated = vec![
        tier(OfferType::Basic, 50),
        tier(OfferType::Basic, 60),
        tier(OfferType::Premium, 200),
    ];
    let errors = validate_detail_set(&duplicated).unwrap_err();
    assert_eq!(errors.get("details"), Some(DETAILS_TYPES));

    let mut negative = full.clone();
    negative[1].price = Decimal::from(-5);
    assert!(validate_detail_set(&negative).is_err());
}

#[test]
fn detail_patches_must_name_distinct_tiers() {
    let basic = OfferDetailPatch {
        offer_type: Some(OfferType::Basic),
        price: Some(Decimal::from(40)),
        ..Default::default()
    };
    assert!(validate_detail_patches(std::slice::from_ref(&basic)).is_ok());
    assert!(validate_detail_patches(&[basic.clone(), basic.clone()]).is_err());

    let untyped = OfferDetailPatch {
        title: Some("No tier".into()),
        ..Default::default()
    };
    assert!(validate_detail_patches(&[untyped]).is_err());
}

#[test]
fn incomplete_patch_cannot_create_a_tier() {
    let partial = OfferDetailPatch {
        offer_type: Some(OfferType::Premium),
        price: Some(Decimal::from(300)),
        ..Default::default()
    };
    assert!(partial.complete().is_none());

    let full = OfferDetailPatch::from(tier(OfferType::Premium, 300));
    let created = full.complete().expect("complete tier");
    assert_eq!(created.offer_type, OfferType::Premium);
    assert_eq!(created.price, Decimal::from(300));
}

#[test]
fn registration_reports_every_problem() {
    let req = RegisterRequest {
        username: " ".into(),
        email: "nope".into(),
        password: "short".into(),
        repeated_password: "other".into(),
        profile_type: ProfileType::Customer,
    };
    let errors = validate_registration(&req).unwrap_err();
    assert!(errors.get("username").is_some());
    assert!(errors.get("email").is_some());
    assert!(errors.get("password").is_some());
    assert_eq!(errors.get("repeated_password"), Some("Passwords do not match."));

    let ok = RegisterRequest {
        username: "anna".into(),
        email: "anna@example.com".into(),
        password: "long-enough".into(),
        repeated_password: "long-enough".into(),
        profile_type: ProfileType::Business,
    };
    assert!(validate_registration(&ok).is_ok());
}

#[test]
fn registration_requires_an_email() {
    let req = RegisterRequest {
        username: "anna".into(),
        email: "  ".into(),
        password: "long-enough".into(),
        repeated_password: "long-enough".into(),
        profile_type: ProfileType::Customer,
    };
    let errors = validate_registration(&req).unwrap_err();
    assert_eq!(errors.get("email"), Some("This field may not be blank."));
    assert!(errors.get("username").is_none());
}

#[test]
fn registration_type_defaults_to_customer() {
    let req: RegisterRequest = serde_json::from_value(json!({
        "username": "max",
        "email": "max@example.com",
        "password": "secret123",
        "repeated_password": "secret123"
    }))
    .unwrap();
    assert_eq!(req.profile_type, ProfileType::Customer);
}

#[test]
fn status_must_be_short_and_non_blank() {
    assert!(validate_status("completed").is_ok());
    assert!(validate_status("   ").is_err());
    assert!(validate_status(&"x".repeat(31)).is_err());
}

#[test]
fn profile_updates_reject_read_only_fields() {
    let req: UpdateProfileRequest = serde_json::from_value(json!({
        "location": "Berlin",
        "username": "renamed",
        "email": "new@example.com"
    }))
    .unwrap();
    let errors = req.read_only_violations();
    assert_eq!(errors.get("username"), Some("This field is read-only."));
    assert_eq!(errors.get("email"), Some("This field is read-only."));
    assert_eq!(errors.get("location"), None);

    let clean: UpdateProfileRequest =
        serde_json::from_value(json!({ "tel": "123", "type": "business" })).unwrap();
    assert!(clean.read_only_violations().is_empty());
    assert_eq!(clean.profile_type, Some(ProfileType::Business));
}

#[test]
fn average_rating_is_rounded_to_one_decimal() {
    assert_eq!(round_rating(None), 0.0);
    assert_eq!(round_rating(Some(4.0)), 4.0);
    assert_eq!(round_rating(Some(4.26)), 4.3);
    assert_eq!(round_rating(Some(3.333_333)), 3.3);
}

#[test]
fn tokens_are_forty_hex_characters() {
    let token = generate_token();
    assert_eq!(token.len(), 40);
    assert!(token.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    assert_ne!(token, generate_token());
}

#[tokio::test]
async fn validation_errors_render_as_field_map() {
    let (status, body) = body_json(validate_rating(6).unwrap_err().into()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "rating": "Rating muss zwischen 1 und 5 liegen." }));
}

#[tokio::test]
async fn other_errors_render_as_detail() {
    let (status, body) = body_json(AppError::Forbidden).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body,
        json!({ "detail": "You do not have permission to perform this action." })
    );

    let (status, body) = body_json(AppError::not_found()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "detail": "Not found." }));

    let (status, body) = body_json(AppError::Internal(anyhow::anyhow!("boom"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "detail": "Internal server error." }));
}
