use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, Order as SortDirection, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};

use crate::{
    audit::record,
    dto::reviews::{CreateReviewRequest, UpdateReviewRequest},
    entity::{
        profiles::{Column as ProfileCol, Entity as Profiles, ProfileType},
        reviews::{ActiveModel as ReviewActive, Column as ReviewCol, Entity as Reviews, Model},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Review,
    permissions::{Action, Target, ensure_can},
    routes::params::{ReviewQuery, ReviewSortBy, SortOrder},
    state::AppState,
    validation::validate_rating,
};

const NOT_A_BUSINESS_USER: &str = "Bewertungen sind nur für Geschäftsnutzer möglich.";
const ALREADY_REVIEWED: &str = "Du hast diesen Geschäftsnutzer bereits bewertet.";

pub async fn list_reviews(state: &AppState, query: &ReviewQuery) -> AppResult<Vec<Review>> {
    let mut finder = Reviews::find();
    if let Some(business_user_id) = query.business_user_id {
        finder = finder.filter(ReviewCol::BusinessUserId.eq(business_user_id));
    }
    if let Some(reviewer_id) = query.reviewer_id {
        finder = finder.filter(ReviewCol::ReviewerId.eq(reviewer_id));
    }

    let column = match query.sort_by {
        ReviewSortBy::UpdatedAt => ReviewCol::UpdatedAt,
        ReviewSortBy::Rating => ReviewCol::Rating,
    };
    let direction = match query.sort_order {
        SortOrder::Asc => SortDirection::Asc,
        SortOrder::Desc => SortDirection::Desc,
    };

    let rows = finder
        .order_by(column, direction)
        .order_by_asc(ReviewCol::Id)
        .all(&state.orm)
        .await?;
    Ok(rows.into_iter().map(review_from_entity).collect())
}

pub async fn create_review(
    state: &AppState,
    user: &AuthUser,
    payload: CreateReviewRequest,
) -> AppResult<Review> {
    let mut errors = validate_rating(payload.rating).err().unwrap_or_default();
    let is_business = Profiles::find()
        .filter(ProfileCol::UserId.eq(payload.business_user))
        .filter(ProfileCol::ProfileType.eq(ProfileType::Business))
        .count(&state.orm)
        .await?
        > 0;
    if !is_business {
        errors.add("business_user", NOT_A_BUSINESS_USER);
    }
    errors.into_result()?;

    let existing = Reviews::find()
        .filter(ReviewCol::ReviewerId.eq(user.user_id))
        .filter(ReviewCol::BusinessUserId.eq(payload.business_user))
        .count(&state.orm)
        .await?;
    if existing > 0 {
        return Err(AppError::field("non_field_errors", ALREADY_REVIEWED));
    }

    let inserted = ReviewActive {
        business_user_id: Set(payload.business_user),
        reviewer_id: Set(user.user_id),
        rating: Set(payload.rating),
        description: Set(payload.description),
        ..Default::default()
    }
    .insert(&state.orm)
    .await;
    let review = match inserted {
        Ok(review) => review,
        // Lost a race against a concurrent review of the same business user.
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return Err(AppError::field("non_field_errors", ALREADY_REVIEWED));
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!(
        review_id = review.id,
        business_user_id = review.business_user_id,
        "review created"
    );
    record(
        &state.pool,
        user.user_id,
        "review_create",
        "reviews",
        serde_json::json!({ "review_id": review.id, "business_user_id": review.business_user_id }),
    )
    .await;

    Ok(review_from_entity(review))
}

pub async fn update_review(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    payload: UpdateReviewRequest,
) -> AppResult<Review> {
    let review = find_review(state, id).await?;
    ensure_can(
        user,
        Action::PartialUpdate,
        &Target::Review {
            reviewer_id: review.reviewer_id,
        },
    )?;
    if let Some(rating) = payload.rating {
        validate_rating(rating)?;
    }

    let mut active: ReviewActive = review.into();
    if let Some(rating) = payload.rating {
        active.rating = Set(rating);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    active.updated_at = Set(Utc::now().into());
    let review = active.update(&state.orm).await?;

    record(
        &state.pool,
        user.user_id,
        "review_update",
        "reviews",
        serde_json::json!({ "review_id": review.id }),
    )
    .await;

    Ok(review_from_entity(review))
}

pub async fn delete_review(state: &AppState, user: &AuthUser, id: i32) -> AppResult<()> {
    let review = find_review(state, id).await?;
    ensure_can(
        user,
        Action::Destroy,
        &Target::Review {
            reviewer_id: review.reviewer_id,
        },
    )?;

    Reviews::delete_by_id(review.id).exec(&state.orm).await?;

    record(
        &state.pool,
        user.user_id,
        "review_delete",
        "reviews",
        serde_json::json!({ "review_id": id }),
    )
    .await;
    Ok(())
}

async fn find_review(state: &AppState, id: i32) -> AppResult<Model> {
    Reviews::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(AppError::not_found)
}

fn review_from_entity(review: Model) -> Review {
    Review {
        id: review.id,
        business_user: review.business_user_id,
        reviewer: review.reviewer_id,
        rating: review.rating,
        description: review.description,
        created_at: review.created_at.with_timezone(&Utc),
        updated_at: review.updated_at.with_timezone(&Utc),
    }
}
