use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
};

use crate::{
    dto::orders::{CreateOrderRequest, UpdateOrderRequest},
    entity::orders::{STATUS_COMPLETED, STATUS_IN_PROGRESS},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{CompletedOrderCount, Order, OrderCount},
    response::{AppJson, Created},
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders/", get(list_orders).post(create_order))
        .route("/orders/{id}/", patch(update_order).delete(delete_order))
}

pub fn count_router() -> Router<AppState> {
    Router::new()
        .route("/order-count/{business_user_id}/", get(order_count))
        .route(
            "/completed-order-count/{business_user_id}/",
            get(completed_order_count),
        )
}

#[utoipa::path(
    get,
    path = "/api/orders/",
    responses((status = 200, description = "Orders bought or sold by the caller", body = [Order])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<Order>>> {
    let orders = order_service::list_orders(&state, &user).await?;
    Ok(Json(orders))
}

#[utoipa::path(
    post,
    path = "/api/orders/",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = Order),
        (status = 400, description = "Unknown offer detail"),
        (status = 403, description = "Only customers can order")
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateOrderRequest>,
) -> AppResult<Created<Order>> {
    let order = order_service::create_order(&state, &user, payload).await?;
    Ok(Created(order))
}

#[utoipa::path(
    patch,
    path = "/api/orders/{id}/",
    params(("id" = i32, Path, description = "Order ID")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Status updated", body = Order),
        (status = 400, description = "Invalid status"),
        (status = 403, description = "Not the seller"),
        (status = 404, description = "Order not found")
    ),
    tag = "Orders"
)]
pub async fn update_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateOrderRequest>,
) -> AppResult<Json<Order>> {
    let order = order_service::update_order(&state, &user, id, payload).await?;
    Ok(Json(order))
}

#[utoipa::path(
    delete,
    path = "/api/orders/{id}/",
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Order not found")
    ),
    tag = "Orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    order_service::delete_order(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/order-count/{business_user_id}/",
    params(("business_user_id" = i32, Path, description = "Business user ID")),
    responses(
        (status = 200, description = "Orders in progress", body = OrderCount),
        (status = 404, description = "No business user with this ID")
    ),
    tag = "Orders"
)]
pub async fn order_count(
    State(state): State<AppState>,
    Path(business_user_id): Path<i32>,
) -> AppResult<Json<OrderCount>> {
    let order_count =
        order_service::count_orders(&state, business_user_id, STATUS_IN_PROGRESS).await?;
    Ok(Json(OrderCount { order_count }))
}

#[utoipa::path(
    get,
    path = "/api/completed-order-count/{business_user_id}/",
    params(("business_user_id" = i32, Path, description = "Business user ID")),
    responses(
        (status = 200, description = "Completed orders", body = CompletedOrderCount),
        (status = 404, description = "No business user with this ID")
    ),
    tag = "Orders"
)]
pub async fn completed_order_count(
    State(state): State<AppState>,
    Path(business_user_id): Path<i32>,
) -> AppResult<Json<CompletedOrderCount>> {
    let completed_order_count =
        order_service::count_orders(&state, business_user_id, STATUS_COMPLETED).await?;
    Ok(Json(CompletedOrderCount {
        completed_order_count,
    }))
}
