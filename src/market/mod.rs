//! Marketplace state: farmer listings, buyer requests and country markets.

pub mod grid;
pub mod store;

pub use grid::{ConsumerFilter, FarmerCard, GeoFilter, GridFilter, ModeFilter, SortBy};
pub use store::{require_positive_number, ListingForm, MarketStore};
