pub mod artist;
pub mod artwork;
pub mod user;

pub use artist::Artist;
pub use artwork::Artwork;
pub use user::{MembershipTier, User};
