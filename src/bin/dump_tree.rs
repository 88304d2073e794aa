use std::collections::HashMap;

use anyhow::Result;
use futures_util::future::join_all;

use catalog_rs::api::ApiClient;
use catalog_rs::catalog::count_by_category;
use catalog_rs::config::{Config, CONFIG_PATH_ENV};
use catalog_rs::state::{CategoryNode, CategoryTree, Collections, ListingKind};

/// Fetch the category tree and all listings once, then print the tree with
/// the number of listings under each category.
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config.toml".to_string());
    let config = Config::load(&path)?;
    let client = ApiClient::new(config.api)?;

    println!("Fetching catalog from {}...", client.base_url());
    let tree = client.fetch_categories().await?;

    let fetches = ListingKind::ALL.map(|kind| {
        let client = client.clone();
        async move { (kind, client.fetch_listings(kind, None).await) }
    });
    let mut listings: HashMap<ListingKind, Vec<_>> = HashMap::new();
    for (kind, result) in join_all(fetches).await {
        match result {
            Ok(items) => {
                println!("{}s: {}", kind.label(), items.len());
                listings.insert(kind, items);
            }
            Err(e) => println!("{}s: failed ({})", kind.label(), e),
        }
    }

    let empty = Vec::new();
    let get = |kind: ListingKind| listings.get(&kind).unwrap_or(&empty).as_slice();
    let collections = Collections {
        auctions: get(ListingKind::Auction),
        tenders: get(ListingKind::Tender),
        direct_sales: get(ListingKind::DirectSale),
    };
    let counts = count_by_category(&tree, collections);

    println!("\n{} categories:", tree.len());
    let mut stack: Vec<(&CategoryNode, usize)> =
        tree.roots().iter().rev().map(|n| (n, 0)).collect();
    while let Some((node, depth)) = stack.pop() {
        let count = counts.get(&node.id).copied().unwrap_or(0);
        let indent = "  ".repeat(depth);
        println!("{}{} ({}) [{}] {}", indent, node.name, node.id, node.kind.as_str(), count);
        stack.extend(node.children.iter().rev().map(|c| (c, depth + 1)));
    }

    let uncategorized = collections.total() - categorized_count(&tree, collections);
    if uncategorized > 0 {
        println!("\n{} listings reference no known category", uncategorized);
    }

    Ok(())
}

/// Listings whose category id exists somewhere in the tree.
fn categorized_count(tree: &CategoryTree, collections: Collections<'_>) -> usize {
    let names = tree.names();
    ListingKind::ALL
        .iter()
        .flat_map(|kind| collections.get(*kind))
        .filter(|l| l.category_id.as_deref().is_some_and(|id| names.contains_key(id)))
        .count()
}
