use axum::{Json, Router, extract::State, routing::get};

use crate::{error::AppResult, models::BaseInfo, services::stats_service, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/base-info/", get(base_info))
}

#[utoipa::path(
    get,
    path = "/api/base-info/",
    responses((status = 200, description = "Platform statistics", body = BaseInfo)),
    security(()),
    tag = "Statistics"
)]
pub async fn base_info(State(state): State<AppState>) -> AppResult<Json<BaseInfo>> {
    let info = stats_service::base_info(&state).await?;
    Ok(Json(info))
}
