use coderr_api::{
    config::AppConfig,
    db::create_pool,
    dto::offers::{OfferDetailInput, OfferRequest},
    entity::{offer_details::OfferType, profiles::ProfileType},
    middleware::auth::AuthUser,
    services::{
        auth_service::{get_or_create_token, hash_password},
        offer_service::create_offer,
    },
    state::AppState,
};
use rust_decimal::Decimal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let customer_id =
        ensure_user(&pool, "demo_customer", "customer@example.com", ProfileType::Customer).await?;
    let business_id =
        ensure_user(&pool, "demo_business", "business@example.com", ProfileType::Business).await?;

    let state = AppState::from_pool(pool);
    seed_offer(&state, business_id).await?;

    println!("Seed completed. Customer ID: {customer_id}, Business ID: {business_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    profile_type: ProfileType,
) -> anyhow::Result<i32> {
    let password_hash = hash_password("demo12345")?;

    let (user_id,): (i32,) = sqlx::query_as(
        r#"
        INSERT INTO users (username, email, password_hash)
        VALUES ($1, $2, $3)
        ON CONFLICT (username) DO UPDATE SET email = EXCLUDED.email
        RETURNING id
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO profiles (user_id, type) VALUES ($1, $2)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(profile_type.as_str())
    .execute(pool)
    .await?;

    let token = get_or_create_token(pool, user_id).await?;
    println!("Ensured {profile_type} user {username} (token={token})");
    Ok(user_id)
}

async fn seed_offer(state: &AppState, business_id: i32) -> anyhow::Result<()> {
    let (existing,): (i64,) = sqlx::query_as("SELECT count(*) FROM offers WHERE owner_id = $1")
        .bind(business_id)
        .fetch_one(&state.pool)
        .await?;
    if existing > 0 {
        println!("Demo offer already present");
        return Ok(());
    }

    let owner = AuthUser {
        user_id: business_id,
        username: "demo_business".into(),
        profile_type: Some(ProfileType::Business),
        is_staff: false,
    };
    let tiers = [
        (OfferType::Basic, "Basic Logo", 2, 7, 50),
        (OfferType::Standard, "Standard Logo", 5, 5, 100),
        (OfferType::Premium, "Premium Logo", 10, 3, 200),
    ];
    let details = tiers
        .into_iter()
        .map(|(offer_type, title, revisions, days, price)| OfferDetailInput {
            title: title.into(),
            revisions,
            delivery_time_in_days: days,
            price: Decimal::from(price),
            features: vec!["Logo Design".into(), "Source files".into()],
            offer_type,
        })
        .collect();

    let offer = create_offer(
        state,
        &owner,
        OfferRequest {
            title: "Logo Design".into(),
            image: None,
            description: "A clean logo for your brand.".into(),
            details,
        },
    )
    .await?;

    println!("Seeded offer {}", offer.id);
    Ok(())
}
