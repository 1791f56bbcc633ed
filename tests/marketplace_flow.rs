use coderr_api::{
    db::create_pool,
    dto::{
        auth::RegisterRequest,
        offers::{OfferDetailInput, OfferDetailPatch, OfferPatch, OfferRequest},
        orders::{CreateOrderRequest, UpdateOrderRequest},
        reviews::{CreateReviewRequest, UpdateReviewRequest},
    },
    entity::{
        offer_details::OfferType,
        orders::{STATUS_COMPLETED, STATUS_IN_PROGRESS},
        profiles::ProfileType,
    },
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::OfferListParams,
    services::{
        auth_service, offer_service, order_service, profile_service, review_service,
        stats_service,
    },
    state::AppState,
    validation::RATING_OUT_OF_RANGE,
};
use rust_decimal::Decimal;

// Full marketplace flow: business user publishes an offer, a customer orders
// and reviews it, counters and statistics follow.
#[tokio::test]
async fn offer_order_review_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let Some(state) = connect().await? else {
        return Ok(());
    };

    let suffix = &uuid::Uuid::new_v4().simple().to_string()[..8];
    let seller = register(&state, &format!("biz_{suffix}"), ProfileType::Business).await?;
    let buyer = register(&state, &format!("cus_{suffix}"), ProfileType::Customer).await?;

    // Login hands back the token issued at registration.
    let login = auth_service::login_user(
        &state.pool,
        coderr_api::dto::auth::LoginRequest {
            username: seller.username.clone(),
            password: "secret-pass".into(),
        },
    )
    .await?;
    assert_eq!(login.user_id, seller.user_id);

    // Offer with three tiers
    let offer = offer_service::create_offer(
        &state,
        &seller,
        OfferRequest {
            title: "Logo Design".into(),
            image: None,
            description: format!("Logo package {suffix}"),
            details: vec![
                tier(OfferType::Basic, 50, 7),
                tier(OfferType::Standard, 100, 5),
                tier(OfferType::Premium, 200, 3),
            ],
        },
    )
    .await?;
    assert_eq!(offer.user, seller.user_id);
    assert_eq!(offer.details.len(), 3);
    assert_eq!(offer.min_price, Some(Decimal::from(50)));
    assert_eq!(offer.min_delivery_time, Some(3));

    let listed = offer_service::list_offers(
        &state,
        OfferListParams {
            creator_id: Some(seller.user_id.to_string()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(listed.count, 1);
    assert_eq!(listed.results[0].min_price, Some(Decimal::from(50)));
    assert_eq!(listed.results[0].user_details.username, seller.username);

    let too_expensive = offer_service::list_offers(
        &state,
        OfferListParams {
            creator_id: Some(seller.user_id.to_string()),
            min_price: Some("60".into()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(too_expensive.count, 0);

    // Strangers cannot touch the offer
    let err = offer_service::delete_offer(&state, &buyer, offer.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    // Merge one tier by type, the others keep their values
    let updated = offer_service::update_offer(
        &state,
        &seller,
        offer.id,
        OfferPatch {
            details: Some(vec![OfferDetailPatch {
                offer_type: Some(OfferType::Basic),
                price: Some(Decimal::from(40)),
                ..Default::default()
            }]),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(updated.details.len(), 3);
    assert_eq!(updated.min_price, Some(Decimal::from(40)));
    let basic = updated
        .details
        .iter()
        .find(|d| d.offer_type == OfferType::Basic)
        .expect("basic tier");
    assert_eq!(basic.title, "Basic tier");

    // Order the basic tier
    let order = order_service::create_order(
        &state,
        &buyer,
        CreateOrderRequest {
            offer_detail_id: basic.id,
        },
    )
    .await?;
    assert_eq!(order.status, STATUS_IN_PROGRESS);
    assert_eq!(order.customer_user, buyer.user_id);
    assert_eq!(order.business_user, seller.user_id);
    assert_eq!(order.price, Decimal::from(40));

    let unknown = order_service::create_order(
        &state,
        &buyer,
        CreateOrderRequest {
            offer_detail_id: i32::MAX,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(unknown, AppError::Validation(ref e) if e.get("offer_detail_id").is_some()));

    assert_eq!(order_service::list_orders(&state, &buyer).await?.len(), 1);
    assert_eq!(order_service::list_orders(&state, &seller).await?.len(), 1);
    // Counters follow the buyer side; the seller placed no orders.
    assert_eq!(
        order_service::count_orders(&state, seller.user_id, STATUS_IN_PROGRESS).await?,
        0
    );
    let not_business = order_service::count_orders(&state, buyer.user_id, STATUS_IN_PROGRESS)
        .await
        .unwrap_err();
    assert!(matches!(not_business, AppError::NotFound(_)));

    // Only the seller moves the order forward
    let err = order_service::update_order(
        &state,
        &buyer,
        order.id,
        UpdateOrderRequest {
            status: STATUS_COMPLETED.into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let completed = order_service::update_order(
        &state,
        &seller,
        order.id,
        UpdateOrderRequest {
            status: STATUS_COMPLETED.into(),
        },
    )
    .await?;
    assert_eq!(completed.status, STATUS_COMPLETED);
    assert_eq!(
        order_service::count_orders(&state, seller.user_id, STATUS_COMPLETED).await?,
        0
    );

    // A business user buying from another seller shows up in their own count.
    let rival = register(&state, &format!("riv_{suffix}"), ProfileType::Business).await?;
    order_service::create_order(
        &state,
        &rival,
        CreateOrderRequest {
            offer_detail_id: basic.id,
        },
    )
    .await?;
    assert_eq!(
        order_service::count_orders(&state, rival.user_id, STATUS_IN_PROGRESS).await?,
        1
    );
    assert_eq!(
        order_service::count_orders(&state, rival.user_id, STATUS_COMPLETED).await?,
        0
    );

    // Reviews
    let err = review_service::create_review(
        &state,
        &buyer,
        CreateReviewRequest {
            business_user: seller.user_id,
            rating: 6,
            description: String::new(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(ref e) if e.get("rating") == Some(RATING_OUT_OF_RANGE)));

    let err = review_service::create_review(
        &state,
        &buyer,
        CreateReviewRequest {
            business_user: buyer.user_id,
            rating: 4,
            description: String::new(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(ref e) if e.get("business_user").is_some()));

    let review = review_service::create_review(
        &state,
        &buyer,
        CreateReviewRequest {
            business_user: seller.user_id,
            rating: 4,
            description: "Quick and friendly".into(),
        },
    )
    .await?;
    assert_eq!(review.reviewer, buyer.user_id);

    let duplicate = review_service::create_review(
        &state,
        &buyer,
        CreateReviewRequest {
            business_user: seller.user_id,
            rating: 5,
            description: String::new(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(duplicate, AppError::Validation(_)));

    let err = review_service::update_review(
        &state,
        &seller,
        review.id,
        UpdateReviewRequest {
            rating: Some(1),
            description: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let edited = review_service::update_review(
        &state,
        &buyer,
        review.id,
        UpdateReviewRequest {
            rating: Some(5),
            description: None,
        },
    )
    .await?;
    assert_eq!(edited.rating, 5);
    assert_eq!(edited.description, "Quick and friendly");

    let info = stats_service::base_info(&state).await?;
    assert!(info.review_count >= 1);
    assert!(info.offer_count >= 1);
    assert!(info.business_profile_count >= 1);
    assert!(info.average_rating >= 1.0 && info.average_rating <= 5.0);

    let profile = profile_service::get_profile(&state, seller.user_id).await?;
    assert_eq!(profile.profile_type, ProfileType::Business);
    assert_eq!(profile.location, "");

    // Cleanup
    review_service::delete_review(&state, &buyer, review.id).await?;
    offer_service::delete_offer(&state, &seller, offer.id).await?;

    Ok(())
}

#[tokio::test]
async fn duplicate_registration_is_rejected() -> anyhow::Result<()> {
    let Some(state) = connect().await? else {
        return Ok(());
    };

    let suffix = &uuid::Uuid::new_v4().simple().to_string()[..8];
    let username = format!("dup_{suffix}");
    register(&state, &username, ProfileType::Customer).await?;

    let same_username = auth_service::register_user(
        &state.pool,
        registration(&username, &format!("other_{suffix}@example.com"), ProfileType::Customer),
    )
    .await
    .unwrap_err();
    assert!(matches!(same_username, AppError::Validation(ref e) if e.get("username").is_some()));

    let same_email = auth_service::register_user(
        &state.pool,
        registration(
            &format!("dup2_{suffix}"),
            &format!("{username}@example.com"),
            ProfileType::Business,
        ),
    )
    .await
    .unwrap_err();
    assert!(matches!(same_email, AppError::Validation(ref e) if e.get("email").is_some()));

    let (users,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = $1")
        .bind(&username)
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(users, 1);
    let (users,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = $1")
        .bind(format!("dup2_{suffix}"))
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(users, 0);

    Ok(())
}

#[tokio::test]
async fn concurrent_reviews_of_one_business_user_keep_a_single_row() -> anyhow::Result<()> {
    let Some(state) = connect().await? else {
        return Ok(());
    };

    let suffix = &uuid::Uuid::new_v4().simple().to_string()[..8];
    let seller = register(&state, &format!("rbiz_{suffix}"), ProfileType::Business).await?;
    let buyer = register(&state, &format!("rcus_{suffix}"), ProfileType::Customer).await?;

    let review = |rating| CreateReviewRequest {
        business_user: seller.user_id,
        rating,
        description: String::new(),
    };
    let (first, second) = tokio::join!(
        review_service::create_review(&state, &buyer, review(4)),
        review_service::create_review(&state, &buyer, review(5)),
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    let rejected = outcomes
        .iter()
        .find_map(|r| r.as_ref().err())
        .expect("one create is rejected");
    assert!(
        matches!(rejected, AppError::Validation(e) if e.get("non_field_errors").is_some())
    );

    let (rows,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM reviews WHERE reviewer_id = $1 AND business_user_id = $2",
    )
    .bind(buyer.user_id)
    .bind(seller.user_id)
    .fetch_one(&state.pool)
    .await?;
    assert_eq!(rows, 1);

    Ok(())
}

async fn connect() -> anyhow::Result<Option<AppState>> {
    let Ok(database_url) =
        std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL"))
    else {
        eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests.");
        return Ok(None);
    };
    let pool = create_pool(&database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(Some(AppState::from_pool(pool)))
}

fn registration(username: &str, email: &str, profile_type: ProfileType) -> RegisterRequest {
    RegisterRequest {
        username: username.into(),
        email: email.into(),
        password: "secret-pass".into(),
        repeated_password: "secret-pass".into(),
        profile_type,
    }
}

async fn register(
    state: &AppState,
    username: &str,
    profile_type: ProfileType,
) -> anyhow::Result<AuthUser> {
    let resp = auth_service::register_user(
        &state.pool,
        registration(username, &format!("{username}@example.com"), profile_type),
    )
    .await?;
    assert_eq!(resp.token.len(), 40);
    Ok(AuthUser {
        user_id: resp.user_id,
        username: resp.username,
        profile_type: Some(profile_type),
        is_staff: false,
    })
}

fn tier(offer_type: OfferType, price: i64, days: i32) -> OfferDetailInput {
    let title = match offer_type {
        OfferType::Basic => "Basic tier",
        OfferType::Standard => "Standard tier",
        OfferType::Premium => "Premium tier",
    };
    OfferDetailInput {
        title: title.into(),
        revisions: 2,
        delivery_time_in_days: days,
        price: Decimal::from(price),
        features: vec!["Logo Design".into()],
        offer_type,
    }
}
