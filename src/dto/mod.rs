pub mod auth;
pub mod offers;
pub mod orders;
pub mod profiles;
pub mod reviews;
