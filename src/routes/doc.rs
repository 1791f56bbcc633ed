use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{AuthResponse, LoginRequest, RegisterRequest},
        offers::{OfferDetailInput, OfferDetailPatch, OfferPatch, OfferRequest},
        orders::{CreateOrderRequest, UpdateOrderRequest},
        profiles::UpdateProfileRequest,
        reviews::{CreateReviewRequest, UpdateReviewRequest},
    },
    entity::{offer_details::OfferType, profiles::ProfileType},
    models::{
        BaseInfo, BusinessProfile, CompletedOrderCount, CustomerProfile, OfferDetail,
        OfferDetailLink, OfferListItem, OfferView, OfferWithDetails, Order, OrderCount, Profile,
        Review, UserDetails,
    },
    response::{ErrorBody, Page},
    routes::{auth, base_info, health, offers, orders, profiles, reviews},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("Token")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        profiles::get_profile,
        profiles::update_profile,
        profiles::list_business,
        profiles::list_customer,
        offers::list_offers,
        offers::create_offer,
        offers::get_offer,
        offers::replace_offer,
        offers::update_offer,
        offers::delete_offer,
        offers::get_offer_detail,
        orders::list_orders,
        orders::create_order,
        orders::update_order,
        orders::delete_order,
        orders::order_count,
        orders::completed_order_count,
        reviews::list_reviews,
        reviews::create_review,
        reviews::update_review,
        reviews::delete_review,
        base_info::base_info
    ),
    components(
        schemas(
            ErrorBody,
            ProfileType,
            OfferType,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            UpdateProfileRequest,
            Profile,
            BusinessProfile,
            CustomerProfile,
            OfferDetailInput,
            OfferDetailPatch,
            OfferRequest,
            OfferPatch,
            OfferDetail,
            OfferDetailLink,
            UserDetails,
            OfferListItem,
            OfferView,
            OfferWithDetails,
            Page<OfferListItem>,
            CreateOrderRequest,
            UpdateOrderRequest,
            Order,
            OrderCount,
            CompletedOrderCount,
            CreateReviewRequest,
            UpdateReviewRequest,
            Review,
            BaseInfo
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and login"),
        (name = "Profiles", description = "Customer and business profiles"),
        (name = "Offers", description = "Offers and their pricing tiers"),
        (name = "Orders", description = "Orders and order counters"),
        (name = "Reviews", description = "Reviews of business users"),
        (name = "Statistics", description = "Platform statistics"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
