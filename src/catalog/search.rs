use crate::state::{CategoryNode, CategoryType, Collections, Listing, ListingKind};

/// A normalized, non-empty search query (trimmed, lower-cased).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery(String);

impl SearchQuery {
    /// Returns `None` when the input is blank.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive substring match on the title or the description.
    pub fn matches(&self, title: &str, description: Option<&str>) -> bool {
        title.to_lowercase().contains(&self.0)
            || description.is_some_and(|d| d.to_lowercase().contains(&self.0))
    }
}

/// A category that matched a search, without its subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryHit {
    pub id: String,
    pub name: String,
    pub kind: CategoryType,
    pub description: Option<String>,
}

impl From<&CategoryNode> for CategoryHit {
    fn from(node: &CategoryNode) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            kind: node.kind,
            description: node.description.clone(),
        }
    }
}

/// One selectable search result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchHit<'a> {
    Category(&'a CategoryHit),
    Listing(&'a Listing),
}

/// Matches per entity type, each in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults {
    pub query: SearchQuery,
    pub categories: Vec<CategoryHit>,
    pub auctions: Vec<Listing>,
    pub tenders: Vec<Listing>,
    pub direct_sales: Vec<Listing>,
}

impl SearchResults {
    pub fn get(&self, kind: ListingKind) -> &[Listing] {
        match kind {
            ListingKind::Auction => &self.auctions,
            ListingKind::Tender => &self.tenders,
            ListingKind::DirectSale => &self.direct_sales,
        }
    }

    /// Every hit in display order: categories, auctions, tenders, direct sales.
    pub fn hits(&self) -> impl Iterator<Item = SearchHit<'_>> {
        self.categories
            .iter()
            .map(SearchHit::Category)
            .chain(
                self.auctions
                    .iter()
                    .chain(self.tenders.iter())
                    .chain(self.direct_sales.iter())
                    .map(SearchHit::Listing),
            )
    }

    pub fn len(&self) -> usize {
        self.categories.len() + self.auctions.len() + self.tenders.len() + self.direct_sales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Filter categories and the three listing collections by `query`.
///
/// `categories` is the flat set to scan (every loaded node, regardless of any
/// type tab). `collections` is whatever is loaded in the current browsing
/// context. No ranking; input order is kept.
pub fn search<'a>(
    query: &SearchQuery,
    categories: impl IntoIterator<Item = &'a CategoryNode>,
    collections: Collections<'_>,
) -> SearchResults {
    let listings = |items: &[Listing]| -> Vec<Listing> {
        items
            .iter()
            .filter(|l| query.matches(&l.title, Some(l.description.as_str())))
            .cloned()
            .collect()
    };

    SearchResults {
        query: query.clone(),
        categories: categories
            .into_iter()
            .filter(|c| query.matches(&c.name, c.description.as_deref()))
            .map(CategoryHit::from)
            .collect(),
        auctions: listings(collections.auctions),
        tenders: listings(collections.tenders),
        direct_sales: listings(collections.direct_sales),
    }
}
