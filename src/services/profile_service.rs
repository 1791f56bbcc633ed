use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
    TryIntoModel,
};

use crate::{
    audit::record,
    dto::profiles::UpdateProfileRequest,
    entity::{
        profiles::{self, ActiveModel as ProfileActive, Entity as Profiles, ProfileType},
        users::{self, ActiveModel as UserActive, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{BusinessProfile, CustomerProfile, Profile},
    permissions::{Action, Target, ensure_can},
    state::AppState,
};

pub async fn get_profile(state: &AppState, user_id: i32) -> AppResult<Profile> {
    let (profile, user) = find_profile(state, user_id).await?;
    Ok(profile_from_entity(profile, user))
}

pub async fn update_profile(
    state: &AppState,
    caller: &AuthUser,
    user_id: i32,
    payload: UpdateProfileRequest,
) -> AppResult<Profile> {
    payload.read_only_violations().into_result()?;

    let (profile, user) = find_profile(state, user_id).await?;
    ensure_can(
        caller,
        Action::PartialUpdate,
        &Target::Profile {
            user_id: profile.user_id,
        },
    )?;

    let UpdateProfileRequest {
        first_name,
        last_name,
        file,
        location,
        tel,
        description,
        working_hours,
        profile_type,
        ..
    } = payload;

    let txn = state.orm.begin().await?;

    let user = if first_name.is_some() || last_name.is_some() {
        let mut active: UserActive = user.into();
        if let Some(first_name) = first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = last_name {
            active.last_name = Set(last_name);
        }
        active.update(&txn).await?
    } else {
        user
    };

    let mut active: ProfileActive = profile.into();
    if let Some(file) = file {
        active.file = Set(Some(file).filter(|f| !f.is_empty()));
    }
    if let Some(location) = location {
        active.location = Set(location);
    }
    if let Some(tel) = tel {
        active.tel = Set(tel);
    }
    if let Some(description) = description {
        active.description = Set(description);
    }
    if let Some(working_hours) = working_hours {
        active.working_hours = Set(working_hours);
    }
    if let Some(profile_type) = profile_type {
        active.profile_type = Set(profile_type);
    }
    let profile = if active.is_changed() {
        active.update(&txn).await?
    } else {
        active.try_into_model()?
    };

    txn.commit().await?;

    record(
        &state.pool,
        caller.user_id,
        "profile_update",
        "profiles",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(profile_from_entity(profile, user))
}

pub async fn list_business_profiles(state: &AppState) -> AppResult<Vec<BusinessProfile>> {
    let rows = list_by_type(state, ProfileType::Business).await?;
    Ok(rows
        .into_iter()
        .map(|(profile, user)| BusinessProfile {
            user: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            file: profile.file,
            location: profile.location,
            tel: profile.tel,
            description: profile.description,
            working_hours: profile.working_hours,
            profile_type: profile.profile_type,
        })
        .collect())
}

pub async fn list_customer_profiles(state: &AppState) -> AppResult<Vec<CustomerProfile>> {
    let rows = list_by_type(state, ProfileType::Customer).await?;
    Ok(rows
        .into_iter()
        .map(|(profile, user)| CustomerProfile {
            user: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            file: profile.file,
            profile_type: profile.profile_type,
        })
        .collect())
}

async fn find_profile(
    state: &AppState,
    user_id: i32,
) -> AppResult<(profiles::Model, users::Model)> {
    let row = Profiles::find()
        .filter(profiles::Column::UserId.eq(user_id))
        .find_also_related(Users)
        .one(&state.orm)
        .await?;
    match row {
        Some((profile, Some(user))) => Ok((profile, user)),
        _ => Err(AppError::not_found()),
    }
}

async fn list_by_type(
    state: &AppState,
    profile_type: ProfileType,
) -> AppResult<Vec<(profiles::Model, users::Model)>> {
    let rows = Profiles::find()
        .filter(profiles::Column::ProfileType.eq(profile_type))
        .find_also_related(Users)
        .order_by_asc(profiles::Column::UserId)
        .all(&state.orm)
        .await?;
    Ok(rows
        .into_iter()
        .filter_map(|(profile, user)| user.map(|user| (profile, user)))
        .collect())
}

fn profile_from_entity(profile: profiles::Model, user: users::Model) -> Profile {
    Profile {
        user: user.id,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        file: profile.file,
        location: profile.location,
        tel: profile.tel,
        description: profile.description,
        working_hours: profile.working_hours,
        profile_type: profile.profile_type,
        email: user.email,
        created_at: profile.created_at.with_timezone(&Utc),
    }
}
