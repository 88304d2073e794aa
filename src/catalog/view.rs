use chrono::{DateTime, Utc};
use tracing::debug;

use super::filter::{compute_visible, VisibleListings};
use super::navigation::Route;
use super::search::{search, SearchHit, SearchQuery, SearchResults};
use crate::state::{Listing, ListingStore};

/// The two inputs that decide what the catalog shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    /// `None` is browse mode: no category scope.
    pub category_id: Option<String>,
    /// Raw text as typed. Non-blank takes precedence over the category view.
    pub search_query: String,
}

/// What is on screen right now.
#[derive(Debug, Clone, Copy)]
pub enum Displayed<'a> {
    Category(&'a VisibleListings),
    Search(&'a SearchResults),
}

/// Catalog page state: the category-filtered view plus an optional search
/// overlay that replaces it until the query is cleared.
#[derive(Debug, Default)]
pub struct CatalogView {
    selection: FilterSelection,
    category_view: VisibleListings,
    search: Option<SearchResults>,
    /// Store changed while a search was showing.
    stale: bool,
}

impl CatalogView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn category_view(&self) -> &VisibleListings {
        &self.category_view
    }

    pub fn search_results(&self) -> Option<&SearchResults> {
        self.search.as_ref()
    }

    /// True while search results replace the category view.
    pub fn results_visible(&self) -> bool {
        self.search.is_some()
    }

    /// Whether the kept category view predates the latest store change.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn displayed(&self) -> Displayed<'_> {
        match &self.search {
            Some(results) => Displayed::Search(results),
            None => Displayed::Category(&self.category_view),
        }
    }

    /// Listings currently on screen, for countdown subscription.
    pub fn visible_listings(&self) -> Box<dyn Iterator<Item = &Listing> + '_> {
        match &self.search {
            Some(results) => Box::new(
                results
                    .auctions
                    .iter()
                    .chain(results.tenders.iter())
                    .chain(results.direct_sales.iter()),
            ),
            None => Box::new(self.category_view.iter()),
        }
    }

    /// Recompute the category view after the tree or a collection changed.
    ///
    /// While a search is showing, the category view is left untouched so that
    /// clearing the query brings back exactly what was there before.
    pub fn refresh(&mut self, store: &ListingStore) {
        if self.search.is_some() {
            self.stale = true;
            return;
        }
        self.recompute(store);
    }

    /// Change the category scope. Clears any search.
    /// Returns the route to hand off when a category was chosen.
    pub fn select_category(
        &mut self,
        category_id: Option<&str>,
        store: &ListingStore,
    ) -> Option<Route> {
        self.selection.category_id = category_id.map(str::to_string);
        self.selection.search_query.clear();
        self.search = None;
        self.recompute(store);

        category_id.map(|id| {
            let name = store.tree().find_node(id).map(|n| n.name.as_str()).unwrap_or_default();
            Route::category(id, name)
        })
    }

    /// Update the search text. Blank input restores the category view as it was.
    pub fn set_query(&mut self, raw: &str, store: &ListingStore) {
        self.selection.search_query = raw.to_string();
        let Some(query) = SearchQuery::parse(raw) else {
            self.search = None;
            return;
        };

        let collections = if self.selection.category_id.is_some() {
            self.category_view.as_collections()
        } else {
            store.collections()
        };
        let results = search(&query, store.tree().iter(), collections);
        debug!(query = query.as_str(), hits = results.len(), "search");
        self.search = Some(results);
    }

    pub fn clear_search(&mut self) {
        self.selection.search_query.clear();
        self.search = None;
    }

    /// Activate the `position`-th (1-based) entry of what is displayed.
    ///
    /// A category hit selects that category and clears the query. A listing
    /// routes to its detail page unless it has ended.
    pub fn activate(
        &mut self,
        position: usize,
        store: &ListingStore,
        now: DateTime<Utc>,
    ) -> Option<Route> {
        let index = position.checked_sub(1)?;
        let Some(results) = &self.search else {
            let listing = self.category_view.iter().nth(index)?;
            return Route::for_listing(listing, now);
        };
        let category_id = match results.hits().nth(index)? {
            SearchHit::Category(hit) => hit.id.clone(),
            SearchHit::Listing(listing) => return Route::for_listing(listing, now),
        };
        self.select_category(Some(category_id.as_str()), store)
    }

    /// Tear down on leaving the catalog.
    pub fn leave(&mut self) {
        *self = Self::default();
    }

    fn recompute(&mut self, store: &ListingStore) {
        self.category_view = compute_visible(
            self.selection.category_id.as_deref(),
            store.tree(),
            store.collections(),
        );
        self.stale = false;
    }
}
