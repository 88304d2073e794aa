use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::countdown::{remaining, RemainingTime};

/// The three independently fetched listing collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingKind {
    Auction,
    Tender,
    DirectSale,
}

impl ListingKind {
    pub const ALL: [ListingKind; 3] = [Self::Auction, Self::Tender, Self::DirectSale];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Auction => "auction",
            Self::Tender => "tender",
            Self::DirectSale => "direct sale",
        }
    }

    /// Path segment used for the detail route.
    pub fn route_segment(&self) -> &'static str {
        match self {
            Self::Auction => "auctions",
            Self::Tender => "tenders",
            Self::DirectSale => "direct-sales",
        }
    }
}

/// Fields that only one listing kind carries.
#[derive(Debug, Clone, PartialEq)]
pub enum ListingDetails {
    Auction {
        starting_price: Option<Decimal>,
        current_price: Option<Decimal>,
    },
    Tender {
        budget: Option<Decimal>,
    },
    DirectSale {
        price: Option<Decimal>,
        quantity: Option<u32>,
    },
}

impl ListingDetails {
    pub fn empty(kind: ListingKind) -> Self {
        match kind {
            ListingKind::Auction => Self::Auction {
                starting_price: None,
                current_price: None,
            },
            ListingKind::Tender => Self::Tender { budget: None },
            ListingKind::DirectSale => Self::DirectSale {
                price: None,
                quantity: None,
            },
        }
    }

    /// The price worth showing on a card: current bid, budget, or sale price.
    pub fn headline_price(&self) -> Option<Decimal> {
        match self {
            Self::Auction {
                starting_price,
                current_price,
            } => current_price.or(*starting_price),
            Self::Tender { budget } => *budget,
            Self::DirectSale { price, .. } => *price,
        }
    }
}

/// One listing in the normalized internal shape shared by all three kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub id: String,
    pub kind: ListingKind,
    pub title: String,
    pub description: String,
    /// `None` listings never show up in a category-scoped view.
    pub category_id: Option<String>,
    pub ending_at: Option<DateTime<Utc>>,
    pub owner: Option<String>,
    /// Raw image path as sent by the API; resolve with [`crate::api::image::resolve`].
    pub image: Option<String>,
    /// Server-reported status. May lag real time; see [`Listing::is_interactive`].
    pub status: Option<String>,
    pub details: ListingDetails,
}

impl Listing {
    pub fn new(kind: ListingKind, id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            description: String::new(),
            category_id: None,
            ending_at: None,
            owner: None,
            image: None,
            status: None,
            details: ListingDetails::empty(kind),
        }
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_ending_at(mut self, ending_at: DateTime<Utc>) -> Self {
        self.ending_at = Some(ending_at);
        self
    }

    /// Remaining time until close, or `None` when the listing has no end time.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<RemainingTime> {
        self.ending_at.map(|end| remaining::tick(now, end))
    }

    /// Ended listings are not clickable and cannot be bid on,
    /// whatever the server's status field says.
    pub fn is_interactive(&self, now: DateTime<Utc>) -> bool {
        self.remaining(now).map_or(true, |r| !r.has_ended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[test]
    fn test_interactive_without_end_time() {
        let sale = Listing::new(ListingKind::DirectSale, "d1", "Lamp");
        assert!(sale.remaining(Utc::now()).is_none());
        assert!(sale.is_interactive(Utc::now()));
    }

    #[test]
    fn test_ended_listing_not_interactive_despite_status() {
        let now = Utc::now();
        let mut auction = Listing::new(ListingKind::Auction, "a1", "Vase")
            .with_ending_at(now - Duration::seconds(1));
        auction.status = Some("ACTIVE".to_string());
        assert!(!auction.is_interactive(now));
        assert!(auction.is_interactive(now - Duration::seconds(5)));
    }

    #[test]
    fn test_headline_price() {
        let auction = ListingDetails::Auction {
            starting_price: Some(dec!(10)),
            current_price: None,
        };
        assert_eq!(auction.headline_price(), Some(dec!(10)));

        let auction = ListingDetails::Auction {
            starting_price: Some(dec!(10)),
            current_price: Some(dec!(25.50)),
        };
        assert_eq!(auction.headline_price(), Some(dec!(25.50)));

        assert_eq!(ListingDetails::empty(ListingKind::Tender).headline_price(), None);
    }
}
