mod listing;
mod store;
pub(crate) mod tree;

pub use listing::{Listing, ListingDetails, ListingKind};
pub use store::{Collections, ListingStore, LoadState, LoadTicket, Section};
pub use tree::{CategoryNode, CategoryTree, CategoryType, Nodes};
