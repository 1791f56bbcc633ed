use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait, TryIntoModel,
};
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;

use crate::{
    audit::record,
    dto::offers::{OfferDetailInput, OfferDetailPatch, OfferPatch, OfferRequest},
    entity::{
        offer_details::{
            self, ActiveModel as DetailActive, Column as DetailCol, Entity as OfferDetails,
            Model as DetailModel, OfferType,
        },
        offers::{ActiveModel as OfferActive, Column, Entity as Offers, Model as OfferModel},
        users::{Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{OfferDetail, OfferDetailLink, OfferListItem, OfferView, OfferWithDetails, UserDetails},
    permissions::{Action, Target, ensure_can},
    response::Page,
    routes::params::{OfferListParams, OfferQuery, OfferSortBy, SortOrder},
    state::AppState,
    validation::{validate_detail_patches, validate_detail_set},
};

const MIN_PRICE_SQL: &str =
    "(SELECT MIN(d.price) FROM offer_details d WHERE d.offer_id = offers.id)";
const MIN_DELIVERY_SQL: &str =
    "(SELECT MIN(d.delivery_time_in_days) FROM offer_details d WHERE d.offer_id = offers.id)";

pub async fn list_offers(
    state: &AppState,
    params: OfferListParams,
) -> AppResult<Page<OfferListItem>> {
    let query = OfferQuery::from(&params);
    let (page, page_size, offset) = params.pagination.normalize().ok_or_else(invalid_page)?;

    let finder = offer_finder(&query);
    let total = finder.clone().count(&state.orm).await?;
    if page > 1 && offset >= total {
        return Err(invalid_page());
    }

    let offers = finder
        .limit(page_size)
        .offset(offset)
        .all(&state.orm)
        .await?;

    let mut details = details_by_offer(&state.orm, offers.iter().map(|o| o.id).collect()).await?;
    let owners = owners_by_id(&state.orm, offers.iter().map(|o| o.owner_id).collect()).await?;

    let results = offers
        .into_iter()
        .map(|offer| {
            let tiers = details.remove(&offer.id).unwrap_or_default();
            let user_details = owners
                .get(&offer.owner_id)
                .map(user_details_from_entity)
                .unwrap_or_else(|| UserDetails {
                    first_name: String::new(),
                    last_name: String::new(),
                    username: String::new(),
                });
            let view = offer_view(offer, &tiers);
            OfferListItem {
                id: view.id,
                user: view.user,
                title: view.title,
                image: view.image,
                description: view.description,
                created_at: view.created_at,
                updated_at: view.updated_at,
                details: view.details,
                min_price: view.min_price,
                min_delivery_time: view.min_delivery_time,
                user_details,
            }
        })
        .collect();

    let link = |p: u64| -> AppResult<String> {
        let query = query
            .page_query(p, page_size)
            .map_err(|e| AppError::Internal(e.into()))?;
        Ok(format!("/api/offers/?{query}"))
    };
    let next = (offset + page_size < total).then(|| link(page + 1)).transpose()?;
    let previous = (page > 1).then(|| link(page - 1)).transpose()?;

    Ok(Page {
        count: total,
        next,
        previous,
        results,
    })
}

pub fn offer_finder(query: &OfferQuery) -> Select<Offers> {
    let mut condition = Condition::all();

    if let Some(creator_id) = query.creator_id {
        condition = condition.add(Column::OwnerId.eq(creator_id));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Expr::cust_with_values(
            format!("{MIN_PRICE_SQL} >= $1"),
            [min_price],
        ));
    }

    if let Some(max_delivery_time) = query.max_delivery_time {
        condition = condition.add(Expr::cust_with_values(
            format!("{MIN_DELIVERY_SQL} <= $1"),
            [max_delivery_time],
        ));
    }

    if let Some(search) = &query.search {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Title).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    let order = match query.sort_order {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    };

    let finder = Offers::find().filter(condition);
    let finder = match query.sort_by {
        OfferSortBy::Id => finder.order_by(Column::Id, order),
        OfferSortBy::Title => finder.order_by(Column::Title, order),
        OfferSortBy::Description => finder.order_by(Column::Description, order),
        OfferSortBy::Owner => finder.order_by(Column::OwnerId, order),
        OfferSortBy::CreatedAt => finder.order_by(Column::CreatedAt, order),
        OfferSortBy::UpdatedAt => finder.order_by(Column::UpdatedAt, order),
        OfferSortBy::MinPrice => finder.order_by(Expr::cust(MIN_PRICE_SQL), order),
        OfferSortBy::MinDeliveryTime => finder.order_by(Expr::cust(MIN_DELIVERY_SQL), order),
    };
    // stable pages
    if query.sort_by == OfferSortBy::Id {
        finder
    } else {
        finder.order_by_asc(Column::Id)
    }
}

pub async fn get_offer(state: &AppState, id: i32) -> AppResult<OfferView> {
    let offer = find_offer(&state.orm, id).await?;
    let tiers = tiers_of(&state.orm, offer.id).await?;
    Ok(offer_view(offer, &tiers))
}

pub async fn get_offer_detail(state: &AppState, id: i32) -> AppResult<OfferDetail> {
    let detail = OfferDetails::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(AppError::not_found)?;
    Ok(detail_from_entity(detail))
}

pub async fn create_offer(
    state: &AppState,
    user: &AuthUser,
    payload: OfferRequest,
) -> AppResult<OfferWithDetails> {
    validate_title(Some(&payload.title))?;
    validate_detail_set(&payload.details)?;

    let txn = state.orm.begin().await?;

    let offer = OfferActive {
        owner_id: Set(user.user_id),
        title: Set(payload.title),
        image: Set(payload.image.filter(|i| !i.is_empty())),
        description: Set(payload.description),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut tiers = Vec::with_capacity(payload.details.len());
    for detail in payload.details {
        tiers.push(insert_detail(&txn, offer.id, detail).await?);
    }

    txn.commit().await?;

    tracing::info!(offer_id = offer.id, owner_id = user.user_id, "offer created");
    record(
        &state.pool,
        user.user_id,
        "offer_create",
        "offers",
        serde_json::json!({ "offer_id": offer.id }),
    )
    .await;

    Ok(offer_with_details(offer, tiers))
}

pub async fn replace_offer(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    payload: OfferRequest,
) -> AppResult<OfferWithDetails> {
    validate_title(Some(&payload.title))?;
    validate_detail_set(&payload.details)?;
    update_offer(state, user, id, payload.into()).await
}

/// Partial update. Incoming tiers are matched to existing ones by
/// `offer_type`: matched tiers get the provided fields overwritten, unmatched
/// tiers are created.
pub async fn update_offer(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    patch: OfferPatch,
) -> AppResult<OfferWithDetails> {
    let offer = find_offer(&state.orm, id).await?;
    ensure_can(
        user,
        Action::PartialUpdate,
        &Target::Offer {
            owner_id: offer.owner_id,
        },
    )?;
    validate_title(patch.title.as_deref())?;
    if let Some(details) = &patch.details {
        validate_detail_patches(details)?;
    }

    let txn = state.orm.begin().await?;

    let mut active: OfferActive = offer.into();
    if let Some(title) = patch.title {
        active.title = Set(title);
    }
    if let Some(image) = patch.image {
        active.image = Set(Some(image).filter(|i| !i.is_empty()));
    }
    if let Some(description) = patch.description {
        active.description = Set(description);
    }
    active.updated_at = Set(Utc::now().into());
    let offer = active.update(&txn).await?;

    if let Some(patches) = patch.details {
        let mut existing: HashMap<OfferType, DetailModel> = tiers_of(&txn, offer.id)
            .await?
            .into_iter()
            .map(|d| (d.offer_type, d))
            .collect();

        for detail_patch in patches {
            let Some(offer_type) = detail_patch.offer_type else {
                continue;
            };
            match existing.remove(&offer_type) {
                Some(current) => {
                    merge_detail(&txn, current, detail_patch).await?;
                }
                None => {
                    let input = detail_patch.complete().ok_or_else(|| {
                        AppError::field(
                            "details",
                            "Ein neues Detail benötigt title, revisions, delivery_time_in_days und price.",
                        )
                    })?;
                    insert_detail(&txn, offer.id, input).await?;
                }
            }
        }
    }

    let tiers = tiers_of(&txn, offer.id).await?;
    txn.commit().await?;

    record(
        &state.pool,
        user.user_id,
        "offer_update",
        "offers",
        serde_json::json!({ "offer_id": offer.id }),
    )
    .await;

    Ok(offer_with_details(offer, tiers))
}

pub async fn delete_offer(state: &AppState, user: &AuthUser, id: i32) -> AppResult<()> {
    let offer = find_offer(&state.orm, id).await?;
    ensure_can(
        user,
        Action::Destroy,
        &Target::Offer {
            owner_id: offer.owner_id,
        },
    )?;

    let result = Offers::delete_by_id(offer.id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found());
    }

    record(
        &state.pool,
        user.user_id,
        "offer_delete",
        "offers",
        serde_json::json!({ "offer_id": id }),
    )
    .await;
    Ok(())
}

pub fn tier_minimums(tiers: &[DetailModel]) -> (Option<Decimal>, Option<i32>) {
    let min_price = tiers.iter().map(|d| d.price).min();
    let min_delivery_time = tiers.iter().map(|d| d.delivery_time_in_days).min();
    (min_price, min_delivery_time)
}

pub fn detail_url(id: i32) -> String {
    format!("/api/offerdetails/{id}/")
}

async fn find_offer<C: ConnectionTrait>(conn: &C, id: i32) -> AppResult<OfferModel> {
    Offers::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(AppError::not_found)
}

async fn tiers_of<C: ConnectionTrait>(conn: &C, offer_id: i32) -> AppResult<Vec<DetailModel>> {
    let tiers = OfferDetails::find()
        .filter(DetailCol::OfferId.eq(offer_id))
        .order_by_asc(DetailCol::Id)
        .all(conn)
        .await?;
    Ok(tiers)
}

async fn details_by_offer<C: ConnectionTrait>(
    conn: &C,
    offer_ids: Vec<i32>,
) -> AppResult<HashMap<i32, Vec<DetailModel>>> {
    let mut grouped: HashMap<i32, Vec<DetailModel>> = HashMap::new();
    if offer_ids.is_empty() {
        return Ok(grouped);
    }
    let rows = OfferDetails::find()
        .filter(DetailCol::OfferId.is_in(offer_ids))
        .order_by_asc(DetailCol::Id)
        .all(conn)
        .await?;
    for row in rows {
        grouped.entry(row.offer_id).or_default().push(row);
    }
    Ok(grouped)
}

async fn owners_by_id<C: ConnectionTrait>(
    conn: &C,
    mut owner_ids: Vec<i32>,
) -> AppResult<HashMap<i32, UserModel>> {
    owner_ids.sort_unstable();
    owner_ids.dedup();
    if owner_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let owners = Users::find()
        .filter(UserCol::Id.is_in(owner_ids))
        .all(conn)
        .await?;
    Ok(owners.into_iter().map(|u| (u.id, u)).collect())
}

async fn insert_detail<C: ConnectionTrait>(
    conn: &C,
    offer_id: i32,
    input: OfferDetailInput,
) -> AppResult<DetailModel> {
    let detail = DetailActive {
        offer_id: Set(offer_id),
        title: Set(input.title),
        revisions: Set(input.revisions),
        delivery_time_in_days: Set(input.delivery_time_in_days),
        price: Set(input.price.round_dp(2)),
        features: Set(serde_json::json!(input.features)),
        offer_type: Set(input.offer_type),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(detail)
}

async fn merge_detail<C: ConnectionTrait>(
    conn: &C,
    current: DetailModel,
    patch: OfferDetailPatch,
) -> AppResult<DetailModel> {
    let mut active: DetailActive = current.into();
    if let Some(title) = patch.title {
        active.title = Set(title);
    }
    if let Some(revisions) = patch.revisions {
        active.revisions = Set(revisions);
    }
    if let Some(delivery_time_in_days) = patch.delivery_time_in_days {
        active.delivery_time_in_days = Set(delivery_time_in_days);
    }
    if let Some(price) = patch.price {
        active.price = Set(price.round_dp(2));
    }
    if let Some(features) = patch.features {
        active.features = Set(serde_json::json!(features));
    }
    if !active.is_changed() {
        return Ok(active.try_into_model()?);
    }
    Ok(active.update(conn).await?)
}

fn validate_title(title: Option<&str>) -> AppResult<()> {
    match title {
        Some(t) if t.trim().is_empty() => {
            Err(AppError::field("title", "This field may not be blank."))
        }
        _ => Ok(()),
    }
}

fn invalid_page() -> AppError {
    AppError::NotFound("Invalid page.".into())
}

fn offer_view(offer: OfferModel, tiers: &[DetailModel]) -> OfferView {
    let (min_price, min_delivery_time) = tier_minimums(tiers);
    OfferView {
        id: offer.id,
        user: offer.owner_id,
        title: offer.title,
        image: offer.image,
        description: offer.description,
        created_at: offer.created_at.with_timezone(&Utc),
        updated_at: offer.updated_at.with_timezone(&Utc),
        details: tiers
            .iter()
            .map(|d| OfferDetailLink {
                id: d.id,
                url: detail_url(d.id),
            })
            .collect(),
        min_price,
        min_delivery_time,
    }
}

fn offer_with_details(offer: OfferModel, tiers: Vec<DetailModel>) -> OfferWithDetails {
    let (min_price, min_delivery_time) = tier_minimums(&tiers);
    OfferWithDetails {
        id: offer.id,
        user: offer.owner_id,
        title: offer.title,
        image: offer.image,
        description: offer.description,
        created_at: offer.created_at.with_timezone(&Utc),
        updated_at: offer.updated_at.with_timezone(&Utc),
        details: tiers.into_iter().map(detail_from_entity).collect(),
        min_price,
        min_delivery_time,
    }
}

fn user_details_from_entity(user: &UserModel) -> UserDetails {
    UserDetails {
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        username: user.username.clone(),
    }
}

pub(crate) fn detail_from_entity(model: offer_details::Model) -> OfferDetail {
    OfferDetail {
        id: model.id,
        title: model.title,
        revisions: model.revisions,
        delivery_time_in_days: model.delivery_time_in_days,
        price: model.price,
        features: features_from_json(model.features),
        offer_type: model.offer_type,
    }
}

pub(crate) fn features_from_json(value: serde_json::Value) -> Vec<String> {
    serde_json::from_value(value).unwrap_or_default()
}
