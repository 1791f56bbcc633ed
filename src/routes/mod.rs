use axum::{Json, Router, http::StatusCode, middleware, routing::get};

use crate::{
    middleware::auth::enforce_policy, permissions::Resource, response::ErrorBody,
    state::AppState,
};

pub mod auth;
pub mod base_info;
pub mod doc;
pub mod health;
pub mod offers;
pub mod orders;
pub mod params;
pub mod profiles;
pub mod reviews;

fn guarded(router: Router<AppState>, state: &AppState, resource: Resource) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(
        (state.clone(), resource),
        enforce_policy,
    ))
}

pub fn create_api_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(guarded(profiles::router(), state, Resource::Profiles))
        .merge(guarded(offers::router(), state, Resource::Offers))
        .merge(guarded(offers::detail_router(), state, Resource::OfferDetails))
        .merge(guarded(orders::router(), state, Resource::Orders))
        .merge(guarded(orders::count_router(), state, Resource::OrderCounts))
        .merge(guarded(reviews::router(), state, Resource::Reviews))
        .merge(base_info::router())
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", create_api_router(&state))
        .merge(doc::scalar_docs())
        .fallback(not_found)
        .with_state(state)
}

async fn not_found() -> (StatusCode, Json<ErrorBody>) {
    (StatusCode::NOT_FOUND, Json(ErrorBody::new("Not found.")))
}
