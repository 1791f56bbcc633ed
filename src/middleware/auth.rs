use axum::{
    extract::{FromRequestParts, MatchedPath, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::{
    db::DbPool,
    entity::profiles::ProfileType,
    error::{AppError, AppResult},
    permissions::{self, Action, Resource},
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
    pub profile_type: Option<ProfileType>,
    pub is_staff: bool,
}

#[derive(sqlx::FromRow)]
struct TokenOwnerRow {
    id: i32,
    username: String,
    is_staff: bool,
    profile_type: Option<String>,
}

/// Extracts the token key from `Authorization: Bearer <key>` (or `Token <key>`).
/// `Ok(None)` means no credentials were sent.
pub fn token_from_headers(headers: &HeaderMap) -> AppResult<Option<String>> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid token header.".into()))?;

    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("Token "))
        .ok_or_else(|| AppError::Unauthorized("Invalid token header.".into()))?
        .trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AppError::Unauthorized("Invalid token header.".into()));
    }
    Ok(Some(token.to_string()))
}

pub async fn resolve_caller(pool: &DbPool, headers: &HeaderMap) -> AppResult<Option<AuthUser>> {
    let Some(token) = token_from_headers(headers)? else {
        return Ok(None);
    };

    let row: Option<TokenOwnerRow> = sqlx::query_as(
        r#"
        SELECT u.id, u.username, u.is_staff, p.type AS profile_type
        FROM auth_tokens t
        JOIN users u ON u.id = t.user_id
        LEFT JOIN profiles p ON p.user_id = u.id
        WHERE t.key = $1
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    let row = row.ok_or_else(|| AppError::Unauthorized("Invalid token.".into()))?;
    Ok(Some(AuthUser {
        user_id: row.id,
        username: row.username,
        profile_type: row.profile_type.and_then(|t| t.parse().ok()),
        is_staff: row.is_staff,
    }))
}

pub async fn enforce_policy(
    State((state, resource)): State<(AppState, Resource)>,
    mut req: Request,
    next: Next,
) -> AppResult<Response> {
    let targets_object = req
        .extensions()
        .get::<MatchedPath>()
        .is_some_and(|path| path.as_str().contains('{'));
    let action = Action::from_request(req.method(), targets_object);

    let caller = resolve_caller(&state.pool, req.headers()).await?;
    permissions::check(permissions::required(resource, action), caller.as_ref())?;

    tracing::debug!(
        ?resource,
        ?action,
        user_id = caller.as_ref().map(|c| c.user_id),
        "access granted"
    );
    if let Some(caller) = caller {
        req.extensions_mut().insert(caller);
    }
    Ok(next.run(req).await)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(AppError::unauthenticated)
    }
}
