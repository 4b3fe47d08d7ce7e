// Protected tier: bearer token required
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod membership;
pub mod utils;
pub mod wishlist;
