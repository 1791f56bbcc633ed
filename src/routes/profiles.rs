use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::profiles::UpdateProfileRequest,
    error::AppResult,
    middleware::auth::AuthUser,
    models::{BusinessProfile, CustomerProfile, Profile},
    response::AppJson,
    services::profile_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/profile/{user_id}/",
            get(get_profile).put(update_profile).patch(update_profile),
        )
        .route("/profiles/business/", get(list_business))
        .route("/profiles/customer/", get(list_customer))
}

#[utoipa::path(
    get,
    path = "/api/profile/{user_id}/",
    params(("user_id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Profile", body = Profile),
        (status = 404, description = "Profile not found")
    ),
    tag = "Profiles"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Profile>> {
    let profile = profile_service::get_profile(&state, user_id).await?;
    Ok(Json(profile))
}

#[utoipa::path(
    patch,
    path = "/api/profile/{user_id}/",
    params(("user_id" = i32, Path, description = "User ID")),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = Profile),
        (status = 400, description = "Read-only field supplied"),
        (status = 403, description = "Not the profile owner")
    ),
    tag = "Profiles"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<i32>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> AppResult<Json<Profile>> {
    let profile = profile_service::update_profile(&state, &user, user_id, payload).await?;
    Ok(Json(profile))
}

#[utoipa::path(
    get,
    path = "/api/profiles/business/",
    responses((status = 200, description = "Business profiles", body = [BusinessProfile])),
    tag = "Profiles"
)]
pub async fn list_business(State(state): State<AppState>) -> AppResult<Json<Vec<BusinessProfile>>> {
    let profiles = profile_service::list_business_profiles(&state).await?;
    Ok(Json(profiles))
}

#[utoipa::path(
    get,
    path = "/api/profiles/customer/",
    responses((status = 200, description = "Customer profiles", body = [CustomerProfile])),
    tag = "Profiles"
)]
pub async fn list_customer(State(state): State<AppState>) -> AppResult<Json<Vec<CustomerProfile>>> {
    let profiles = profile_service::list_customer_profiles(&state).await?;
    Ok(Json(profiles))
}
