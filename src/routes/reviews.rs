use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
};

use crate::{
    dto::reviews::{CreateReviewRequest, UpdateReviewRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Review,
    response::{AppJson, Created},
    routes::params::{ReviewListParams, ReviewQuery},
    services::review_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reviews/", get(list_reviews).post(create_review))
        .route("/reviews/{id}/", patch(update_review).delete(delete_review))
}

#[utoipa::path(
    get,
    path = "/api/reviews/",
    params(
        ("business_user_id" = Option<i32>, Query, description = "Reviews received by this user"),
        ("reviewer_id" = Option<i32>, Query, description = "Reviews written by this user"),
        ("ordering" = Option<String>, Query, description = "updated_at or rating, `-` prefix for descending"),
    ),
    responses((status = 200, description = "Reviews", body = [Review])),
    tag = "Reviews"
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    Query(params): Query<ReviewListParams>,
) -> AppResult<Json<Vec<Review>>> {
    let reviews = review_service::list_reviews(&state, &ReviewQuery::from(&params)).await?;
    Ok(Json(reviews))
}

#[utoipa::path(
    post,
    path = "/api/reviews/",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = Review),
        (status = 400, description = "Invalid rating or business user"),
        (status = 403, description = "Only customers can review")
    ),
    tag = "Reviews"
)]
pub async fn create_review(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateReviewRequest>,
) -> AppResult<Created<Review>> {
    let review = review_service::create_review(&state, &user, payload).await?;
    Ok(Created(review))
}

#[utoipa::path(
    patch,
    path = "/api/reviews/{id}/",
    params(("id" = i32, Path, description = "Review ID")),
    request_body = UpdateReviewRequest,
    responses(
        (status = 200, description = "Review updated", body = Review),
        (status = 403, description = "Not the reviewer"),
        (status = 404, description = "Review not found")
    ),
    tag = "Reviews"
)]
pub async fn update_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateReviewRequest>,
) -> AppResult<Json<Review>> {
    let review = review_service::update_review(&state, &user, id, payload).await?;
    Ok(Json(review))
}

#[utoipa::path(
    delete,
    path = "/api/reviews/{id}/",
    params(("id" = i32, Path, description = "Review ID")),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 403, description = "Not the reviewer"),
        (status = 404, description = "Review not found")
    ),
    tag = "Reviews"
)]
pub async fn delete_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    review_service::delete_review(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
