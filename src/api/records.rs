use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::warn;

use super::envelope::decode_each;
use crate::error::{CatalogError, CatalogResult};
use crate::state::{CategoryNode, CategoryTree, CategoryType, Listing, ListingDetails, ListingKind};

/// An id sent either as a string or as a number.
fn id_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(id_of(&Value::deserialize(deserializer)?))
}

/// Keep the field only if it decodes as `T`; anything else becomes `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(serde_json::from_value(Value::deserialize(deserializer)?).ok())
}

fn entity_ref<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<EntityRef>, D::Error> {
    Ok(EntityRef::from_value(&Value::deserialize(deserializer)?))
}

fn text(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

/// First usable URL in a string, a `{ url }` object or an array of either.
fn image_url(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(map) => text(map, "url"),
        Value::Array(items) => items.iter().find_map(image_url),
        _ => None,
    }
}

/// Reference to another entity: a populated object or a bare id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityRef {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl EntityRef {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self {
                id: map.get("_id").and_then(id_of),
                name: text(map, "name"),
            }),
            other => id_of(other).map(|id| Self {
                id: Some(id),
                name: None,
            }),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn label(&self) -> Option<&str> {
        self.name.as_deref().or(self.id.as_deref())
    }
}

/// Split one category record into its node and its child records.
///
/// Missing or mistyped fields leave the node with empty labels. Only a
/// record that is not an object is skipped.
fn category_parts(
    endpoint: &str,
    record: Value,
    parent_id: Option<&str>,
) -> Option<(CategoryNode, Vec<Value>)> {
    let Value::Object(mut map) = record else {
        warn!(endpoint, "skipping category record that is not an object");
        return None;
    };
    let children = match map.remove("children") {
        Some(Value::Array(children)) => children,
        _ => Vec::new(),
    };

    let mut node = CategoryNode::new(
        map.get("_id").and_then(id_of).unwrap_or_default(),
        text(&map, "name").unwrap_or_default(),
        CategoryType::from_api(map.get("type").and_then(Value::as_str)),
    );
    node.parent_id = parent_id.map(str::to_string);
    node.description = text(&map, "description");
    node.thumb_url = map.get("thumb").and_then(image_url);
    Some((node, children))
}

/// Build the forest from raw records, keeping the nesting they arrive with.
///
/// Works with an explicit stack, so nesting depth is not limited by the
/// call stack.
pub fn build_tree(endpoint: &str, records: Vec<Value>) -> CategoryTree {
    struct Frame {
        node: CategoryNode,
        pending: std::vec::IntoIter<Value>,
    }

    let mut roots = Vec::new();
    let mut skipped = 0usize;
    for record in records {
        let Some((node, children)) = category_parts(endpoint, record, None) else {
            skipped += 1;
            continue;
        };
        let mut stack = vec![Frame {
            node,
            pending: children.into_iter(),
        }];

        while let Some(top) = stack.last_mut() {
            if let Some(child) = top.pending.next() {
                match category_parts(endpoint, child, Some(top.node.id.as_str())) {
                    Some((node, children)) => stack.push(Frame {
                        node,
                        pending: children.into_iter(),
                    }),
                    None => skipped += 1,
                }
                continue;
            }
            let Some(done) = stack.pop() else { break };
            match stack.last_mut() {
                Some(parent) => parent.node.children.push(done.node),
                None => roots.push(done.node),
            }
        }
    }

    if skipped > 0 {
        warn!(endpoint, skipped, "some category records were skipped");
    }
    CategoryTree::new(roots)
}

/// Listing record as sent by any of the three listing endpoints.
///
/// Every field is optional and decoded on its own, so one mistyped field
/// never costs the whole listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawListing {
    #[serde(rename = "_id", default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "entity_ref")]
    pub product_category: Option<EntityRef>,
    #[serde(default, deserialize_with = "entity_ref")]
    pub category: Option<EntityRef>,
    #[serde(default, deserialize_with = "lenient")]
    pub ending_at: Option<String>,
    #[serde(
        default,
        alias = "createdBy",
        alias = "seller",
        deserialize_with = "entity_ref"
    )]
    pub owner: Option<EntityRef>,
    #[serde(default)]
    pub image: Option<Value>,
    #[serde(default)]
    pub images: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub starting_price: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient")]
    pub current_price: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient")]
    pub budget: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient")]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient")]
    pub quantity: Option<u32>,
}

impl RawListing {
    /// Normalize into the shared listing shape.
    ///
    /// Tenders reference their category through `category`, the other kinds
    /// through `productCategory`; either is accepted as a fallback.
    pub fn into_listing(self, kind: ListingKind) -> Listing {
        let category_ref = match kind {
            ListingKind::Tender => self.category.as_ref().or(self.product_category.as_ref()),
            _ => self.product_category.as_ref().or(self.category.as_ref()),
        };
        let category_id = category_ref.and_then(EntityRef::id).map(str::to_string);

        let ending_at = self.ending_at.as_deref().and_then(|raw| match parse_timestamp(raw) {
            Ok(ts) => Some(ts),
            Err(e) => {
                warn!(kind = kind.label(), error = %e, "ignoring end time");
                None
            }
        });

        let details = match kind {
            ListingKind::Auction => ListingDetails::Auction {
                starting_price: self.starting_price,
                current_price: self.current_price,
            },
            ListingKind::Tender => ListingDetails::Tender {
                budget: self.budget,
            },
            ListingKind::DirectSale => ListingDetails::DirectSale {
                price: self.price,
                quantity: self.quantity,
            },
        };

        let image = self
            .image
            .as_ref()
            .and_then(image_url)
            .or_else(|| self.images.as_ref().and_then(image_url));

        Listing {
            id: self.id.unwrap_or_default(),
            kind,
            title: self.title.or(self.name).unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            category_id,
            ending_at,
            owner: self.owner.as_ref().and_then(EntityRef::label).map(str::to_string),
            image,
            status: self.status,
            details,
        }
    }
}

/// Decode a listing endpoint's records into normalized listings.
pub fn build_listings(endpoint: &str, kind: ListingKind, records: Vec<Value>) -> Vec<Listing> {
    decode_each::<RawListing>(endpoint, records)
        .into_iter()
        .map(|raw| raw.into_listing(kind))
        .collect()
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"];

/// Parse an API timestamp: RFC 3339, or a naive ISO date-time taken as UTC.
pub fn parse_timestamp(raw: &str) -> CatalogResult<DateTime<Utc>> {
    let raw = raw.trim();
    let source = match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => return Ok(ts.with_timezone(&Utc)),
        Err(e) => e,
    };
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| CatalogError::InvalidTimestamp {
            value: raw.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_build_nested_tree() {
        let records = vec![
            json!({
                "_id": "1", "name": "Electronics", "type": "PRODUCT",
                "thumb": {"url": "/uploads/e.png"},
                "children": [
                    {"_id": "2", "name": "Phones", "type": "PRODUCT"},
                    {"_id": "3", "name": "Laptops", "type": "PRODUCT", "children": []}
                ]
            }),
            json!({"_id": 7, "name": "Repairs", "type": "SERVICE"}),
        ];
        let tree = build_tree("/categories", records);

        assert_eq!(tree.len(), 4);
        let phones = tree.find_node("2").unwrap();
        assert_eq!(phones.parent_id.as_deref(), Some("1"));
        assert_eq!(tree.find_node("1").unwrap().thumb_url.as_deref(), Some("/uploads/e.png"));
        assert_eq!(tree.find_node("7").unwrap().kind, CategoryType::Service);
    }

    #[test]
    fn test_missing_fields_tolerated() {
        let tree = build_tree("/categories", vec![json!({"children": [{"_id": "c"}]})]);
        let root = &tree.roots()[0];
        assert_eq!(root.id, "");
        assert_eq!(root.name, "");
        assert_eq!(tree.find_node("c").map(|n| n.name.as_str()), Some(""));
    }

    #[test]
    fn test_mistyped_child_kept_non_object_skipped() {
        let records = vec![json!({
            "_id": "1",
            "children": [{"_id": "2", "name": 5}, 42, {"_id": "3", "name": "ok"}]
        })];
        let tree = build_tree("/categories", records);
        assert_eq!(tree.find_node("2").map(|n| n.name.as_str()), Some(""));
        assert_eq!(tree.find_node("3").map(|n| n.name.as_str()), Some("ok"));
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_deep_nesting_builds_and_drops() {
        let depth = 50_000;
        let mut record = json!({"_id": depth.to_string(), "name": "leaf"});
        for i in (0..depth).rev() {
            record = json!({"_id": i.to_string(), "children": [record]});
        }
        let tree = build_tree("/categories", vec![record]);
        assert_eq!(tree.len(), depth + 1);
        assert_eq!(
            tree.find_node(&depth.to_string()).and_then(|n| n.parent_id.as_deref()),
            Some((depth - 1).to_string().as_str())
        );
    }

    #[test]
    fn test_mistyped_optional_fields_keep_listing() {
        let records = vec![
            json!({"_id": "a1", "title": "Chair", "productCategory": {"_id": "2"},
                   "images": [{"url": "/img/chair.png"}]}),
            json!({"_id": "a2", "title": "Desk", "productCategory": 2}),
            json!({"_id": "a3", "title": "Lamp", "productCategory": {"_id": "2"}, "quantity": 1.5}),
            json!({"_id": "a4", "title": "Rug", "productCategory": {"_id": "2"}, "owner": 42}),
            json!({"_id": "a5", "title": "Vase", "productCategory": {"_id": "2"}, "status": 1}),
        ];
        let listings = build_listings("/auctions", ListingKind::Auction, records);

        let ids: Vec<&str> = listings.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2", "a3", "a4", "a5"]);
        assert!(listings.iter().all(|l| l.category_id.as_deref() == Some("2")));
        assert_eq!(listings[0].image.as_deref(), Some("/img/chair.png"));
        assert_eq!(listings[3].owner.as_deref(), Some("42"));
        assert!(listings[4].status.is_none());
    }

    #[test]
    fn test_mistyped_quantity_dropped() {
        let listings = build_listings(
            "/direct-sales",
            ListingKind::DirectSale,
            vec![json!({"_id": "d1", "title": "Lamp", "price": "9.99", "quantity": 1.5})],
        );
        assert_eq!(
            listings[0].details,
            ListingDetails::DirectSale {
                price: Some(dec!(9.99)),
                quantity: None
            }
        );
    }

    #[test]
    fn test_non_object_listing_skipped() {
        let listings = build_listings(
            "/auctions",
            ListingKind::Auction,
            vec![json!("a1"), json!({"_id": "a2", "title": "ok"})],
        );
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].id, "a2");
    }

    #[test]
    fn test_auction_normalization() {
        let records = vec![json!({
            "_id": "a1",
            "title": "Office Chair",
            "description": "ergonomic",
            "productCategory": {"_id": "2", "name": "Phones"},
            "endingAt": "2024-01-01T12:00:00.000Z",
            "owner": {"_id": "u1", "name": "ACME"},
            "images": ["/img/1.png", "/img/2.png"],
            "startingPrice": 10,
            "currentPrice": "12.50"
        })];
        let listings = build_listings("/auctions", ListingKind::Auction, records);
        let a = &listings[0];
        assert_eq!(a.id, "a1");
        assert_eq!(a.category_id.as_deref(), Some("2"));
        assert_eq!(a.ending_at, Some(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()));
        assert_eq!(a.owner.as_deref(), Some("ACME"));
        assert_eq!(a.image.as_deref(), Some("/img/1.png"));
        assert_eq!(a.details.headline_price(), Some(dec!(12.50)));
    }

    #[test]
    fn test_tender_uses_category_field() {
        let records = vec![
            json!({"_id": "t1", "name": "Roof repair", "category": {"_id": "9"}}),
            json!({"_id": "t2", "title": "Paint", "category": "3", "budget": 500}),
        ];
        let listings = build_listings("/tenders", ListingKind::Tender, records);
        assert_eq!(listings[0].title, "Roof repair");
        assert_eq!(listings[0].category_id.as_deref(), Some("9"));
        assert_eq!(listings[1].category_id.as_deref(), Some("3"));
        assert_eq!(listings[1].details, ListingDetails::Tender { budget: Some(dec!(500)) });
    }

    #[test]
    fn test_direct_sale_without_end_or_category() {
        let listings = build_listings(
            "/direct-sales",
            ListingKind::DirectSale,
            vec![json!({"_id": "d1", "title": "Lamp", "price": 20, "quantity": 3})],
        );
        let d = &listings[0];
        assert!(d.category_id.is_none());
        assert!(d.ending_at.is_none());
        assert_eq!(
            d.details,
            ListingDetails::DirectSale {
                price: Some(dec!(20)),
                quantity: Some(3)
            }
        );
    }

    #[test]
    fn test_bad_end_time_dropped() {
        let listings = build_listings(
            "/auctions",
            ListingKind::Auction,
            vec![json!({"_id": "a1", "title": "x", "endingAt": "tomorrow"})],
        );
        assert!(listings[0].ending_at.is_none());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-01T08:30:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-01T10:30:00+02:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-01T08:30:00").unwrap(), expected);
        assert!(matches!(
            parse_timestamp("soon"),
            Err(CatalogError::InvalidTimestamp { .. })
        ));
    }
}
