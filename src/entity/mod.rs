pub mod offer_details;
pub mod offers;
pub mod orders;
pub mod profiles;
pub mod reviews;
pub mod users;

pub use offer_details::Entity as OfferDetails;
pub use offers::Entity as Offers;
pub use orders::Entity as Orders;
pub use profiles::Entity as Profiles;
pub use reviews::Entity as Reviews;
pub use users::Entity as Users;
