use axum::http::Method;

use crate::{
    entity::profiles::ProfileType,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Profiles,
    Offers,
    OfferDetails,
    Orders,
    OrderCounts,
    Reviews,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    PartialUpdate,
    Destroy,
}

impl Action {
    pub fn from_request(method: &Method, targets_object: bool) -> Self {
        match *method {
            Method::POST => Action::Create,
            Method::PUT => Action::Update,
            Method::PATCH => Action::PartialUpdate,
            Method::DELETE => Action::Destroy,
            _ if targets_object => Action::Retrieve,
            _ => Action::List,
        }
    }

    pub fn is_read(self) -> bool {
        matches!(self, Action::List | Action::Retrieve)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Anyone,
    Authenticated,
    Business,
    Customer,
    Admin,
}

pub fn required(resource: Resource, action: Action) -> Capability {
    use Action::*;
    use Capability::*;

    match (resource, action) {
        (Resource::Profiles, _) => Authenticated,

        (Resource::Offers, List | Retrieve) => Anyone,
        (Resource::Offers, Create) => Business,
        (Resource::Offers, _) => Authenticated,

        (Resource::OfferDetails, List | Retrieve) => Anyone,
        (Resource::OfferDetails, _) => Admin,

        (Resource::Orders, List | Retrieve) => Authenticated,
        (Resource::Orders, Create) => Customer,
        (Resource::Orders, Update | PartialUpdate) => Business,
        (Resource::Orders, Destroy) => Admin,

        (Resource::OrderCounts, _) => Authenticated,

        (Resource::Reviews, Create) => Customer,
        (Resource::Reviews, _) => Authenticated,
    }
}

/// Evaluates a capability. Anonymous callers get 401, authenticated callers
/// lacking the capability get 403.
pub fn check(capability: Capability, caller: Option<&AuthUser>) -> AppResult<()> {
    if capability == Capability::Anyone {
        return Ok(());
    }
    let Some(caller) = caller else {
        return Err(AppError::unauthenticated());
    };
    let allowed = match capability {
        Capability::Anyone | Capability::Authenticated => true,
        Capability::Business => caller.profile_type == Some(ProfileType::Business),
        Capability::Customer => caller.profile_type == Some(ProfileType::Customer),
        Capability::Admin => caller.is_staff,
    };
    if allowed { Ok(()) } else { Err(AppError::Forbidden) }
}

#[derive(Debug, Clone, Copy)]
pub enum Target {
    Profile { user_id: i32 },
    Offer { owner_id: i32 },
    Order { seller_id: i32 },
    Review { reviewer_id: i32 },
}

pub fn can(caller: &AuthUser, action: Action, target: &Target) -> bool {
    if action.is_read() {
        return true;
    }
    match *target {
        Target::Profile { user_id } => caller.user_id == user_id,
        Target::Offer { owner_id } => caller.user_id == owner_id || caller.is_staff,
        Target::Order { seller_id } => match action {
            Action::Destroy => caller.is_staff,
            _ => caller.user_id == seller_id,
        },
        Target::Review { reviewer_id } => caller.user_id == reviewer_id,
    }
}

pub fn ensure_can(caller: &AuthUser, action: Action, target: &Target) -> AppResult<()> {
    if can(caller, action, target) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
