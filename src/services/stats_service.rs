use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect};
use sea_orm::sea_query::Expr;

use crate::{
    entity::{
        Offers, Reviews,
        profiles::{Column as ProfileCol, Entity as Profiles, ProfileType},
    },
    error::AppResult,
    models::BaseInfo,
    state::AppState,
};

pub async fn base_info(state: &AppState) -> AppResult<BaseInfo> {
    let review_count = Reviews::find().count(&state.orm).await?;
    let average: Option<Option<f64>> = Reviews::find()
        .select_only()
        .expr_as(
            Expr::cust("CAST(AVG(reviews.rating) AS DOUBLE PRECISION)"),
            "average_rating",
        )
        .into_tuple()
        .one(&state.orm)
        .await?;
    let business_profile_count = Profiles::find()
        .filter(ProfileCol::ProfileType.eq(ProfileType::Business))
        .count(&state.orm)
        .await?;
    let offer_count = Offers::find().count(&state.orm).await?;

    Ok(BaseInfo {
        review_count,
        average_rating: round_rating(average.flatten()),
        business_profile_count,
        offer_count,
    })
}

/// Rounds to one decimal place; no reviews means `0.0`.
pub fn round_rating(average: Option<f64>) -> f64 {
    average.map_or(0.0, |avg| (avg * 10.0).round() / 10.0)
}
