use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::{OsRng, RngCore};

use crate::{
    audit::record,
    db::DbPool,
    dto::auth::{AuthResponse, LoginRequest, RegisterRequest},
    error::{AppError, AppResult},
    validation::{FieldErrors, validate_registration},
};

const INVALID_CREDENTIALS: &str = "Unable to log in with provided credentials.";
const TOKEN_BYTES: usize = 20;

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: i32,
    username: String,
    email: String,
    password_hash: String,
}

pub async fn register_user(pool: &DbPool, payload: RegisterRequest) -> AppResult<AuthResponse> {
    validate_registration(&payload)?;
    let RegisterRequest {
        username,
        email,
        password,
        profile_type,
        ..
    } = payload;
    let username = username.trim().to_string();
    let email = email.trim().to_string();

    let mut errors = FieldErrors::default();
    let taken: Option<(i32,)> = sqlx::query_as("SELECT id FROM users WHERE username = $1")
        .bind(username.as_str())
        .fetch_optional(pool)
        .await?;
    if taken.is_some() {
        errors.add("username", "A user with this username already exists.");
    }
    let taken: Option<(i32,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(pool)
        .await?;
    if taken.is_some() {
        errors.add("email", "A user with this email already exists.");
    }
    errors.into_result()?;

    let password_hash = hash_password(&password)?;

    let mut tx = pool.begin().await?;
    let inserted: Result<(i32,), sqlx::Error> = sqlx::query_as(
        "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(username.as_str())
    .bind(email.as_str())
    .bind(password_hash)
    .fetch_one(&mut *tx)
    .await;
    let (user_id,) = match inserted {
        Ok(row) => row,
        // Lost a race against a concurrent registration.
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            return Err(AppError::field(
                "username",
                "A user with this username or email already exists.",
            ));
        }
        Err(err) => return Err(err.into()),
    };

    sqlx::query("INSERT INTO profiles (user_id, type) VALUES ($1, $2)")
        .bind(user_id)
        .bind(profile_type.as_str())
        .execute(&mut *tx)
        .await?;

    let token = generate_token();
    sqlx::query("INSERT INTO auth_tokens (key, user_id) VALUES ($1, $2)")
        .bind(token.as_str())
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(user_id, %profile_type, "user registered");
    record(
        pool,
        user_id,
        "user_register",
        "users",
        serde_json::json!({ "user_id": user_id, "type": profile_type }),
    )
    .await;

    Ok(AuthResponse {
        token,
        username,
        email,
        user_id,
    })
}

pub async fn login_user(pool: &DbPool, payload: LoginRequest) -> AppResult<AuthResponse> {
    let LoginRequest { username, password } = payload;
    let user: Option<CredentialRow> = sqlx::query_as(
        "SELECT id, username, email, password_hash FROM users WHERE username = $1",
    )
    .bind(username.trim())
    .fetch_optional(pool)
    .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::field("non_field_errors", INVALID_CREDENTIALS)),
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    let argon2 = Argon2::default();
    if argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::field("non_field_errors", INVALID_CREDENTIALS));
    }

    let token = get_or_create_token(pool, user.id).await?;

    record(
        pool,
        user.id,
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(AuthResponse {
        token,
        username: user.username,
        email: user.email,
        user_id: user.id,
    })
}

pub async fn get_or_create_token(pool: &DbPool, user_id: i32) -> AppResult<String> {
    let existing: Option<(String,)> = sqlx::query_as("SELECT key FROM auth_tokens WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    if let Some((key,)) = existing {
        return Ok(key);
    }

    let (key,): (String,) = sqlx::query_as(
        r#"
        INSERT INTO auth_tokens (key, user_id) VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
        RETURNING key
        "#,
    )
    .bind(generate_token())
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(key)
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
