//! Catalog aggregation for a marketplace of auctions, tenders and direct sales:
//! category tree traversal, category-scoped filtering, cross-entity search and
//! live countdowns to listing close.

pub mod api;
pub mod catalog;
pub mod config;
pub mod countdown;
pub mod error;
pub mod events;
pub mod feeds;
pub mod state;

pub use error::{CatalogError, CatalogResult};
