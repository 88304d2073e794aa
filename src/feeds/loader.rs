use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::api::ApiClient;
use crate::events::Event;
use crate::state::{ListingKind, LoadTicket, Section};

/// Spawns a one-shot fetch for the ticket's section and reports the outcome.
///
/// Loads are independent: each runs on its own task and a failure only
/// affects its own section. `category` scopes listing fetches when set.
pub fn spawn_load(
    client: ApiClient,
    ticket: LoadTicket,
    category: Option<String>,
    tx: mpsc::Sender<Event>,
) {
    tokio::spawn(async move {
        let event = match ticket.section {
            Section::Categories => Event::CategoriesLoaded {
                ticket,
                result: client.fetch_categories().await,
            },
            Section::Listings(kind) => Event::ListingsLoaded {
                ticket,
                result: client.fetch_listings(kind, category.as_deref()).await,
            },
        };
        // Receiver gone means we are shutting down.
        let _ = tx.send(event).await;
    });
}

/// Spawns a task that asks for every listing collection to be refetched
/// each `period`. The first refresh fires one period after start.
pub fn spawn_poller(period: Duration, tx: mpsc::Sender<Event>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            for kind in ListingKind::ALL {
                if tx.send(Event::Refresh(Section::Listings(kind))).await.is_err() {
                    return;
                }
            }
        }
    })
}
