use tracing::{debug, info, warn};

use super::{CategoryTree, Listing, ListingKind};
use crate::error::CatalogResult;

/// One independently loaded piece of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Categories,
    Listings(ListingKind),
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Categories,
        Section::Listings(ListingKind::Auction),
        Section::Listings(ListingKind::Tender),
        Section::Listings(ListingKind::DirectSale),
    ];

    fn index(&self) -> usize {
        match self {
            Section::Categories => 0,
            Section::Listings(ListingKind::Auction) => 1,
            Section::Listings(ListingKind::Tender) => 2,
            Section::Listings(ListingKind::DirectSale) => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Section::Categories => "categories",
            Section::Listings(kind) => kind.label(),
        }
    }
}

/// Per-section load status, shown as a dedicated placeholder when not `Loaded`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Pending,
    Loaded,
    Failed(String),
}

impl LoadState {
    pub fn is_failed(&self) -> bool {
        matches!(self, LoadState::Failed(_))
    }
}

/// Handed out when a fetch starts. The result is applied only if no newer
/// load for the same section was started in the meantime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub section: Section,
    generation: u64,
}

/// Read-only view of the three listing collections taken in one borrow.
#[derive(Debug, Clone, Copy, Default)]
pub struct Collections<'a> {
    pub auctions: &'a [Listing],
    pub tenders: &'a [Listing],
    pub direct_sales: &'a [Listing],
}

impl<'a> Collections<'a> {
    pub fn get(&self, kind: ListingKind) -> &'a [Listing] {
        match kind {
            ListingKind::Auction => self.auctions,
            ListingKind::Tender => self.tenders,
            ListingKind::DirectSale => self.direct_sales,
        }
    }

    pub fn total(&self) -> usize {
        self.auctions.len() + self.tenders.len() + self.direct_sales.len()
    }
}

/// Owner of the category tree and the three listing collections.
///
/// Only fetch completion mutates it, and always by wholesale replacement.
#[derive(Debug, Default)]
pub struct ListingStore {
    tree: CategoryTree,
    auctions: Vec<Listing>,
    tenders: Vec<Listing>,
    direct_sales: Vec<Listing>,
    states: [LoadState; 4],
    generations: [u64; 4],
}

impl ListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tree(&self) -> &CategoryTree {
        &self.tree
    }

    pub fn listings(&self, kind: ListingKind) -> &[Listing] {
        match kind {
            ListingKind::Auction => &self.auctions,
            ListingKind::Tender => &self.tenders,
            ListingKind::DirectSale => &self.direct_sales,
        }
    }

    pub fn collections(&self) -> Collections<'_> {
        Collections {
            auctions: &self.auctions,
            tenders: &self.tenders,
            direct_sales: &self.direct_sales,
        }
    }

    pub fn state(&self, section: Section) -> &LoadState {
        &self.states[section.index()]
    }

    /// True once every section has either loaded or failed.
    pub fn is_settled(&self) -> bool {
        self.states.iter().all(|s| *s != LoadState::Pending)
    }

    /// Start a load for `section`, superseding any load still in flight.
    pub fn begin_load(&mut self, section: Section) -> LoadTicket {
        let idx = section.index();
        self.generations[idx] += 1;
        LoadTicket {
            section,
            generation: self.generations[idx],
        }
    }

    /// Drop every in-flight listing fetch, e.g. after the selected category
    /// changed or the catalog view was left. Loaded data stays in place.
    pub fn invalidate_listings(&mut self) {
        for kind in ListingKind::ALL {
            self.generations[Section::Listings(kind).index()] += 1;
        }
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        self.generations[ticket.section.index()] == ticket.generation
    }

    /// Apply a category tree load. Returns false when the ticket was stale.
    pub fn apply_categories(
        &mut self,
        ticket: LoadTicket,
        result: CatalogResult<CategoryTree>,
    ) -> bool {
        if !self.accept(&ticket) {
            return false;
        }
        match result {
            Ok(tree) => {
                info!(nodes = tree.len(), "category tree loaded");
                self.tree = tree;
                self.states[ticket.section.index()] = LoadState::Loaded;
            }
            Err(e) => {
                warn!(error = %e, "category tree load failed");
                self.tree = CategoryTree::default();
                self.states[ticket.section.index()] = LoadState::Failed(e.to_string());
            }
        }
        true
    }

    /// Apply a listing collection load. Returns false when the ticket was stale.
    pub fn apply_listings(
        &mut self,
        ticket: LoadTicket,
        result: CatalogResult<Vec<Listing>>,
    ) -> bool {
        let kind = match ticket.section {
            Section::Listings(kind) => kind,
            Section::Categories => {
                warn!("listing result delivered with a category ticket");
                return false;
            }
        };
        if !self.accept(&ticket) {
            return false;
        }
        let idx = ticket.section.index();
        let (listings, state) = match result {
            Ok(listings) => {
                info!(kind = kind.label(), count = listings.len(), "listings loaded");
                (listings, LoadState::Loaded)
            }
            Err(e) => {
                warn!(kind = kind.label(), error = %e, "listings load failed");
                (Vec::new(), LoadState::Failed(e.to_string()))
            }
        };
        match kind {
            ListingKind::Auction => self.auctions = listings,
            ListingKind::Tender => self.tenders = listings,
            ListingKind::DirectSale => self.direct_sales = listings,
        }
        self.states[idx] = state;
        true
    }

    fn accept(&self, ticket: &LoadTicket) -> bool {
        if self.is_current(ticket) {
            return true;
        }
        debug!(
            section = ticket.section.label(),
            generation = ticket.generation,
            "discarding stale response"
        );
        false
    }
}
