use chrono::{Duration, TimeZone, Utc};
use serde_json::json;

use catalog_rs::api::envelope::unwrap_records;
use catalog_rs::api::records::{build_listings, build_tree};
use catalog_rs::catalog::{CatalogView, Displayed};
use catalog_rs::countdown::{tick, RemainingTime};
use catalog_rs::state::{Listing, ListingKind, ListingStore, Section};

/// Store loaded the way the API would deliver it: tree in a `{success, data}`
/// envelope, auctions as a bare array.
fn electronics_store() -> ListingStore {
    let tree_body = json!({
        "success": true,
        "data": [{
            "_id": "1", "name": "Electronics", "type": "PRODUCT",
            "children": [
                {"_id": "2", "name": "Phones", "type": "PRODUCT"},
                {"_id": "3", "name": "Laptops", "type": "PRODUCT"}
            ]
        }]
    });
    let auctions_body = json!([
        {"_id": "a1", "title": "Office Chair", "description": "", "productCategory": {"_id": "2"}},
        {"_id": "a2", "title": "Table", "description": "wooden", "productCategory": {"_id": "5"}}
    ]);

    let mut store = ListingStore::new();
    let t = store.begin_load(Section::Categories);
    let records = unwrap_records("/categories", tree_body).unwrap();
    assert!(store.apply_categories(t, Ok(build_tree("/categories", records))));

    let a = store.begin_load(Section::Listings(ListingKind::Auction));
    let records = unwrap_records("/auctions", auctions_body).unwrap();
    let auctions = build_listings("/auctions", ListingKind::Auction, records);
    assert!(store.apply_listings(a, Ok(auctions)));
    store
}

fn ids<'a>(listings: impl Iterator<Item = &'a Listing>) -> Vec<&'a str> {
    listings.map(|l| l.id.as_str()).collect()
}

fn fields(r: &RemainingTime) -> (&str, &str, &str, &str, bool) {
    (r.days.as_str(), r.hours.as_str(), r.minutes.as_str(), r.seconds.as_str(), r.has_ended)
}

#[test]
fn test_scenario_a_descendant_filter() {
    let store = electronics_store();
    let mut view = CatalogView::new();
    view.select_category(Some("1"), &store);
    assert_eq!(ids(view.category_view().auctions.iter()), vec!["a1"]);
}

#[test]
fn test_scenario_b_ninety_seconds() {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
    let r = tick(now, now + Duration::milliseconds(90_000));
    assert_eq!(
        fields(&r),
        ("00", "00", "01", "30", false)
    );
}

#[test]
fn test_scenario_c_already_ended() {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
    let r = tick(now, now - Duration::milliseconds(1_000));
    assert_eq!(
        fields(&r),
        ("00", "00", "00", "00", true)
    );
}

#[test]
fn test_scenario_d_case_insensitive_search() {
    let store = electronics_store();
    let mut view = CatalogView::new();
    view.set_query("chair", &store);
    match view.displayed() {
        Displayed::Search(results) => assert_eq!(ids(results.auctions.iter()), vec!["a1"]),
        Displayed::Category(_) => panic!("Expected search results"),
    }
}

#[test]
fn test_search_then_clear_restores_category_view() {
    let mut store = electronics_store();
    let mut view = CatalogView::new();
    view.select_category(Some("1"), &store);
    let before = view.category_view().clone();

    view.set_query("CHAIR", &store);
    assert!(view.results_visible());

    let refetch = store.begin_load(Section::Listings(ListingKind::Auction));
    store.apply_listings(refetch, Ok(Vec::new()));
    view.refresh(&store);

    view.set_query("", &store);
    assert!(!view.results_visible());
    assert_eq!(view.category_view(), &before);
}

#[test]
fn test_failed_section_does_not_blank_others() {
    let mut store = electronics_store();
    let t = store.begin_load(Section::Listings(ListingKind::Tender));
    let err = unwrap_records("/tenders", json!({"items": []})).unwrap_err();
    store.apply_listings(t, Err(err));

    let mut view = CatalogView::new();
    view.select_category(Some("2"), &store);
    assert_eq!(ids(view.category_view().auctions.iter()), vec!["a1"]);
    assert!(view.category_view().tenders.is_empty());
    assert!(store.state(Section::Listings(ListingKind::Tender)).is_failed());
}
