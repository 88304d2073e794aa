use std::fmt;

use chrono::{DateTime, Utc};
use url::form_urlencoded;

use crate::state::{Listing, ListingKind};

/// Where the presentation layer should go next. Routing itself is not done here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Catalog scoped to a category.
    Category { id: String, name: String },
    /// Detail page of one listing.
    Listing { kind: ListingKind, id: String },
}

impl Route {
    pub fn category(id: impl Into<String>, name: impl Into<String>) -> Self {
        Route::Category {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Detail route for a listing, or `None` once it has ended.
    pub fn for_listing(listing: &Listing, now: DateTime<Utc>) -> Option<Self> {
        if !listing.is_interactive(now) {
            return None;
        }
        Some(Route::Listing {
            kind: listing.kind,
            id: listing.id.clone(),
        })
    }

    /// Query string for a category route: `category=<id>&name=<urlencoded name>`.
    pub fn query(&self) -> Option<String> {
        match self {
            Route::Category { id, name } => Some(
                form_urlencoded::Serializer::new(String::new())
                    .append_pair("category", id)
                    .append_pair("name", name)
                    .finish(),
            ),
            Route::Listing { .. } => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Category { .. } => format!("/catalog?{}", self.query().unwrap_or_default()),
            Route::Listing { kind, id } => {
                let id: String = form_urlencoded::byte_serialize(id.as_bytes()).collect();
                format!("/{}/{}", kind.route_segment(), id)
            }
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
