use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::offers::{OfferPatch, OfferRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{OfferDetail, OfferListItem, OfferView, OfferWithDetails},
    response::{AppJson, Created, Page},
    routes::params::OfferListParams,
    services::offer_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/offers/", get(list_offers).post(create_offer))
        .route(
            "/offers/{id}/",
            get(get_offer)
                .put(replace_offer)
                .patch(update_offer)
                .delete(delete_offer),
        )
}

pub fn detail_router() -> Router<AppState> {
    Router::new().route("/offerdetails/{id}/", get(get_offer_detail))
}

#[utoipa::path(
    get,
    path = "/api/offers/",
    params(
        ("creator_id" = Option<i32>, Query, description = "Only offers of this user"),
        ("min_price" = Option<f64>, Query, description = "Cheapest tier costs at least this much"),
        ("max_delivery_time" = Option<i32>, Query, description = "Fastest tier delivers within this many days"),
        ("search" = Option<String>, Query, description = "Case-insensitive match on title or description"),
        ("ordering" = Option<String>, Query, description = "Field name, `-` prefix for descending; default -created_at"),
        ("page" = Option<u64>, Query, description = "Page number, default 1"),
        ("page_size" = Option<u64>, Query, description = "Items per page, default 10, max 100"),
    ),
    responses(
        (status = 200, description = "Page of offers", body = Page<OfferListItem>),
        (status = 404, description = "Invalid page")
    ),
    security(()),
    tag = "Offers"
)]
pub async fn list_offers(
    State(state): State<AppState>,
    Query(params): Query<OfferListParams>,
) -> AppResult<Json<Page<OfferListItem>>> {
    let page = offer_service::list_offers(&state, params).await?;
    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/offers/",
    request_body = OfferRequest,
    responses(
        (status = 201, description = "Offer created", body = OfferWithDetails),
        (status = 400, description = "Invalid details"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Offers"
)]
pub async fn create_offer(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<OfferRequest>,
) -> AppResult<Created<OfferWithDetails>> {
    let offer = offer_service::create_offer(&state, &user, payload).await?;
    Ok(Created(offer))
}

#[utoipa::path(
    get,
    path = "/api/offers/{id}/",
    params(("id" = i32, Path, description = "Offer ID")),
    responses(
        (status = 200, description = "Offer", body = OfferView),
        (status = 404, description = "Offer not found")
    ),
    security(()),
    tag = "Offers"
)]
pub async fn get_offer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<OfferView>> {
    let offer = offer_service::get_offer(&state, id).await?;
    Ok(Json(offer))
}

#[utoipa::path(
    put,
    path = "/api/offers/{id}/",
    params(("id" = i32, Path, description = "Offer ID")),
    request_body = OfferRequest,
    responses(
        (status = 200, description = "Offer replaced", body = OfferWithDetails),
        (status = 400, description = "Invalid details"),
        (status = 403, description = "Not the owner")
    ),
    tag = "Offers"
)]
pub async fn replace_offer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<OfferRequest>,
) -> AppResult<Json<OfferWithDetails>> {
    let offer = offer_service::replace_offer(&state, &user, id, payload).await?;
    Ok(Json(offer))
}

#[utoipa::path(
    patch,
    path = "/api/offers/{id}/",
    params(("id" = i32, Path, description = "Offer ID")),
    request_body = OfferPatch,
    responses(
        (status = 200, description = "Offer updated", body = OfferWithDetails),
        (status = 400, description = "Invalid details"),
        (status = 403, description = "Not the owner")
    ),
    tag = "Offers"
)]
pub async fn update_offer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<OfferPatch>,
) -> AppResult<Json<OfferWithDetails>> {
    let offer = offer_service::update_offer(&state, &user, id, payload).await?;
    Ok(Json(offer))
}

#[utoipa::path(
    delete,
    path = "/api/offers/{id}/",
    params(("id" = i32, Path, description = "Offer ID")),
    responses(
        (status = 204, description = "Offer deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Offer not found")
    ),
    tag = "Offers"
)]
pub async fn delete_offer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    offer_service::delete_offer(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/offerdetails/{id}/",
    params(("id" = i32, Path, description = "Offer detail ID")),
    responses(
        (status = 200, description = "Offer tier", body = OfferDetail),
        (status = 404, description = "Offer detail not found")
    ),
    security(()),
    tag = "Offers"
)]
pub async fn get_offer_detail(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<OfferDetail>> {
    let detail = offer_service::get_offer_detail(&state, id).await?;
    Ok(Json(detail))
}
