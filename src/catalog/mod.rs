//! Category filtering, search and the catalog page state built on them.

pub mod filter;
pub mod navigation;
pub mod search;
mod view;

pub use filter::{compute_visible, count_by_category, partition_by_category, VisibleListings};
pub use navigation::Route;
pub use search::{search, CategoryHit, SearchHit, SearchQuery, SearchResults};
pub use view::{CatalogView, Displayed, FilterSelection};
