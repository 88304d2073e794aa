use std::collections::{HashMap, HashSet};

use crate::state::{CategoryNode, CategoryTree, Collections, Listing, ListingKind};

/// Listings shown for the current category scope, one vector per kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibleListings {
    pub auctions: Vec<Listing>,
    pub tenders: Vec<Listing>,
    pub direct_sales: Vec<Listing>,
}

impl VisibleListings {
    pub fn get(&self, kind: ListingKind) -> &[Listing] {
        match kind {
            ListingKind::Auction => &self.auctions,
            ListingKind::Tender => &self.tenders,
            ListingKind::DirectSale => &self.direct_sales,
        }
    }

    pub fn as_collections(&self) -> Collections<'_> {
        Collections {
            auctions: &self.auctions,
            tenders: &self.tenders,
            direct_sales: &self.direct_sales,
        }
    }

    /// All visible listings, auctions first, then tenders, then direct sales.
    pub fn iter(&self) -> impl Iterator<Item = &Listing> {
        self.auctions
            .iter()
            .chain(self.tenders.iter())
            .chain(self.direct_sales.iter())
    }

    pub fn len(&self) -> usize {
        self.auctions.len() + self.tenders.len() + self.direct_sales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Whether a listing belongs to the descendant set. Uncategorized never does.
pub fn belongs(listing: &Listing, id_set: &HashSet<String>) -> bool {
    listing
        .category_id
        .as_deref()
        .is_some_and(|id| id_set.contains(id))
}

/// Split a collection into (belongs, does not belong), both in input order.
pub fn partition_by_category<'a>(
    listings: &'a [Listing],
    id_set: &HashSet<String>,
) -> (Vec<&'a Listing>, Vec<&'a Listing>) {
    listings.iter().partition(|l| belongs(l, id_set))
}

/// Listings in the selected category or any of its descendants.
///
/// No category selected means nothing to show. The descendant set is computed
/// once and applied to all three collections as a stable filter.
pub fn compute_visible(
    category_id: Option<&str>,
    tree: &CategoryTree,
    collections: Collections<'_>,
) -> VisibleListings {
    let Some(category_id) = category_id else {
        return VisibleListings::default();
    };
    let id_set = tree.collect_descendant_ids(category_id);
    let keep = |listings: &[Listing]| -> Vec<Listing> {
        listings
            .iter()
            .filter(|l| belongs(l, &id_set))
            .cloned()
            .collect()
    };

    VisibleListings {
        auctions: keep(collections.auctions),
        tenders: keep(collections.tenders),
        direct_sales: keep(collections.direct_sales),
    }
}

/// Number of listings under each category's descendant set, across all kinds.
///
/// Listings whose category is not in the tree are not counted anywhere.
pub fn count_by_category(
    tree: &CategoryTree,
    collections: Collections<'_>,
) -> HashMap<String, usize> {
    let mut direct: HashMap<&str, usize> = HashMap::new();
    for kind in ListingKind::ALL {
        for listing in collections.get(kind) {
            if let Some(id) = listing.category_id.as_deref() {
                *direct.entry(id).or_default() += 1;
            }
        }
    }

    // Post-order accumulation with an explicit stack.
    let mut totals: HashMap<String, usize> = HashMap::new();
    let mut stack: Vec<(&CategoryNode, bool)> =
        tree.roots().iter().map(|n| (n, false)).collect();
    while let Some((node, expanded)) = stack.pop() {
        if expanded {
            let own = direct.get(node.id.as_str()).copied().unwrap_or(0);
            let below: usize = node
                .children
                .iter()
                .map(|c| totals.get(&c.id).copied().unwrap_or(0))
                .sum();
            totals.entry(node.id.clone()).or_insert(own + below);
        } else {
            stack.push((node, true));
            stack.extend(node.children.iter().map(|c| (c, false)));
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tree::tests::sample_tree;

    fn auction(id: &str, category: Option<&str>) -> Listing {
        let l = Listing::new(ListingKind::Auction, id, id);
        match category {
            Some(c) => l.with_category(c),
            None => l,
        }
    }

    fn ids(listings: &[Listing]) -> Vec<&str> {
        listings.iter().map(|l| l.id.as_str()).collect()
    }

    #[test]
    fn test_no_selection_shows_nothing() {
        let tree = sample_tree();
        let auctions = vec![auction("a1", Some("1"))];
        let visible = compute_visible(
            None,
            &tree,
            Collections {
                auctions: &auctions,
                ..Default::default()
            },
        );
        assert!(visible.is_empty());
    }

    #[test]
    fn test_descendant_membership_and_order() {
        let tree = sample_tree();
        let auctions = vec![
            auction("a1", Some("4")),
            auction("a2", Some("9")),
            auction("a3", Some("1")),
            auction("a4", None),
            auction("a5", Some("3")),
        ];
        let tenders = vec![Listing::new(ListingKind::Tender, "t1", "t").with_category("2")];
        let visible = compute_visible(
            Some("1"),
            &tree,
            Collections {
                auctions: &auctions,
                tenders: &tenders,
                direct_sales: &[],
            },
        );
        assert_eq!(ids(&visible.auctions), vec!["a1", "a3", "a5"]);
        assert_eq!(ids(&visible.tenders), vec!["t1"]);
        assert!(visible.direct_sales.is_empty());
    }

    #[test]
    fn test_unknown_category_exact_match_only() {
        let tree = sample_tree();
        let auctions = vec![auction("a1", Some("gone")), auction("a2", Some("1"))];
        let visible = compute_visible(
            Some("gone"),
            &tree,
            Collections {
                auctions: &auctions,
                ..Default::default()
            },
        );
        assert_eq!(ids(&visible.auctions), vec!["a1"]);
    }

    #[test]
    fn test_filter_matches_membership_everywhere() {
        let tree = sample_tree();
        let auctions: Vec<Listing> = ["1", "2", "3", "4", "9", "x"]
            .iter()
            .enumerate()
            .map(|(i, c)| auction(&format!("a{i}"), Some(*c)))
            .collect();
        for node in tree.iter() {
            let set = tree.collect_descendant_ids(&node.id);
            let visible = compute_visible(
                Some(node.id.as_str()),
                &tree,
                Collections {
                    auctions: &auctions,
                    ..Default::default()
                },
            );
            for l in &auctions {
                let shown = visible.auctions.iter().any(|v| v.id == l.id);
                assert_eq!(shown, set.contains(l.category_id.as_deref().unwrap_or_default()));
            }
        }
    }

    #[test]
    fn test_partition() {
        let tree = sample_tree();
        let auctions = vec![
            auction("a1", Some("2")),
            auction("a2", None),
            auction("a3", Some("9")),
        ];
        let (inside, outside) = partition_by_category(&auctions, &tree.collect_descendant_ids("2"));
        assert_eq!(inside.iter().map(|l| l.id.as_str()).collect::<Vec<_>>(), vec!["a1"]);
        assert_eq!(outside.iter().map(|l| l.id.as_str()).collect::<Vec<_>>(), vec!["a2", "a3"]);
    }

    #[test]
    fn test_count_by_category() {
        let tree = sample_tree();
        let auctions = vec![
            auction("a1", Some("4")),
            auction("a2", Some("3")),
            auction("a3", Some("x")),
        ];
        let sales = vec![Listing::new(ListingKind::DirectSale, "d1", "d").with_category("2")];
        let counts = count_by_category(
            &tree,
            Collections {
                auctions: &auctions,
                tenders: &[],
                direct_sales: &sales,
            },
        );
        assert_eq!(counts["1"], 3);
        assert_eq!(counts["2"], 2);
        assert_eq!(counts["4"], 1);
        assert_eq!(counts["3"], 1);
        assert_eq!(counts["9"], 0);
        assert!(!counts.contains_key("x"));
    }
}
