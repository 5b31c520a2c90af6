pub mod catalog;
pub mod claim;
pub mod csv;
pub mod model;
pub mod points;

pub use catalog::{Catalog, CategoryFilter, ListingQuery, SortOrder};
pub use claim::{ClaimFlow, ClaimPhase, ClaimTiming};
pub use model::{ListingId, RewardListing};
pub use points::Points;
