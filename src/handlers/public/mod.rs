// Public tier: no authentication required
pub mod artists;
pub mod artworks;
pub mod auth;
