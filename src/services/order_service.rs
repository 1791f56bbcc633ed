use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use sea_orm::sea_query::{Expr, SimpleExpr};

use crate::{
    audit::record,
    dto::orders::{CreateOrderRequest, UpdateOrderRequest},
    entity::{
        offer_details::{Column as DetailCol, Entity as OfferDetails, Model as DetailModel},
        offers::Entity as Offers,
        orders::{
            self, ActiveModel as OrderActive, Column as OrderCol, Entity as Orders,
            Model as OrderModel, STATUS_IN_PROGRESS,
        },
        profiles::{Column as ProfileCol, Entity as Profiles, ProfileType},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Order,
    permissions::{Action, Target, ensure_can},
    services::offer_service::features_from_json,
    state::AppState,
    validation::validate_status,
};

const NO_BUSINESS_USER: &str = "Kein Geschäftsnutzer mit dieser ID gefunden.";

fn sold_by(seller_id: i32) -> SimpleExpr {
    Expr::cust_with_values(
        "orders.offer_detail_id IN (SELECT d.id FROM offer_details d \
         JOIN offers o ON o.id = d.offer_id WHERE o.owner_id = $1)",
        [seller_id],
    )
}

pub async fn list_orders(state: &AppState, user: &AuthUser) -> AppResult<Vec<Order>> {
    let mut finder = Orders::find();
    if !user.is_staff {
        finder = finder.filter(
            Condition::any()
                .add(OrderCol::BuyerId.eq(user.user_id))
                .add(sold_by(user.user_id)),
        );
    }
    let orders = finder
        .order_by_desc(OrderCol::CreatedAt)
        .order_by_asc(OrderCol::Id)
        .all(&state.orm)
        .await?;
    hydrate(&state.orm, orders).await
}

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<Order> {
    let detail = OfferDetails::find_by_id(payload.offer_detail_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| {
            AppError::field("offer_detail_id", "Invalid pk - object does not exist.")
        })?;

    let order = OrderActive {
        buyer_id: Set(user.user_id),
        offer_detail_id: Set(detail.id),
        status: Set(STATUS_IN_PROGRESS.to_string()),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(order_id = order.id, buyer_id = user.user_id, "order created");
    record(
        &state.pool,
        user.user_id,
        "order_create",
        "orders",
        serde_json::json!({ "order_id": order.id, "offer_detail_id": detail.id }),
    )
    .await;

    hydrate_one(&state.orm, order).await
}

pub async fn update_order(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    payload: UpdateOrderRequest,
) -> AppResult<Order> {
    validate_status(&payload.status)?;
    let order = find_order(state, id).await?;
    let seller_id = seller_of(&state.orm, order.offer_detail_id).await?;
    ensure_can(
        user,
        Action::PartialUpdate,
        &Target::Order { seller_id },
    )?;

    let previous = order.status.clone();
    let mut active: OrderActive = order.into();
    active.status = Set(payload.status.trim().to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    record(
        &state.pool,
        user.user_id,
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "from": previous, "to": order.status }),
    )
    .await;

    hydrate_one(&state.orm, order).await
}

pub async fn delete_order(state: &AppState, user: &AuthUser, id: i32) -> AppResult<()> {
    let order = find_order(state, id).await?;
    let seller_id = seller_of(&state.orm, order.offer_detail_id).await?;
    ensure_can(
        user,
        Action::Destroy,
        &Target::Order { seller_id },
    )?;

    Orders::delete_by_id(order.id).exec(&state.orm).await?;

    record(
        &state.pool,
        user.user_id,
        "order_delete",
        "orders",
        serde_json::json!({ "order_id": id }),
    )
    .await;
    Ok(())
}

/// Number of orders with `status` whose buyer is `business_user_id`.
/// Fails with 404 unless `business_user_id` has a business profile.
pub async fn count_orders(state: &AppState, business_user_id: i32, status: &str) -> AppResult<u64> {
    let is_business = Profiles::find()
        .filter(ProfileCol::UserId.eq(business_user_id))
        .filter(ProfileCol::ProfileType.eq(ProfileType::Business))
        .one(&state.orm)
        .await?
        .is_some();
    if !is_business {
        return Err(AppError::NotFound(NO_BUSINESS_USER.into()));
    }

    let count = Orders::find()
        .filter(OrderCol::Status.eq(status))
        .filter(OrderCol::BuyerId.eq(business_user_id))
        .count(&state.orm)
        .await?;
    Ok(count)
}

async fn find_order(state: &AppState, id: i32) -> AppResult<OrderModel> {
    Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(AppError::not_found)
}

async fn seller_of<C: ConnectionTrait>(conn: &C, offer_detail_id: i32) -> AppResult<i32> {
    let row = OfferDetails::find_by_id(offer_detail_id)
        .find_also_related(Offers)
        .one(conn)
        .await?;
    match row {
        Some((_, Some(offer))) => Ok(offer.owner_id),
        _ => Err(AppError::Internal(anyhow::anyhow!(
            "offer detail {offer_detail_id} has no offer"
        ))),
    }
}

async fn hydrate_one<C: ConnectionTrait>(conn: &C, order: OrderModel) -> AppResult<Order> {
    hydrate(conn, vec![order])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("order lost its offer detail")))
}

async fn hydrate<C: ConnectionTrait>(conn: &C, orders: Vec<orders::Model>) -> AppResult<Vec<Order>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }
    let mut detail_ids: Vec<i32> = orders.iter().map(|o| o.offer_detail_id).collect();
    detail_ids.sort_unstable();
    detail_ids.dedup();

    let tiers: HashMap<i32, (DetailModel, i32)> = OfferDetails::find()
        .filter(DetailCol::Id.is_in(detail_ids))
        .find_also_related(Offers)
        .all(conn)
        .await?
        .into_iter()
        .filter_map(|(detail, offer)| offer.map(|o| (detail.id, (detail, o.owner_id))))
        .collect();

    Ok(orders
        .into_iter()
        .filter_map(|order| {
            let (detail, seller_id) = tiers.get(&order.offer_detail_id)?;
            Some(Order {
                id: order.id,
                customer_user: order.buyer_id,
                business_user: *seller_id,
                offer_detail: detail.id,
                title: detail.title.clone(),
                revisions: detail.revisions,
                delivery_time_in_days: detail.delivery_time_in_days,
                price: detail.price,
                features: features_from_json(detail.features.clone()),
                offer_type: detail.offer_type,
                status: order.status,
                created_at: order.created_at.with_timezone(&Utc),
                updated_at: order.updated_at.with_timezone(&Utc),
            })
        })
        .collect())
}
