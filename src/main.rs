use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use catalog_rs::api::{image, ApiClient};
use catalog_rs::catalog::{CatalogView, Displayed, Route, SearchHit};
use catalog_rs::config::{Config, CONFIG_PATH_ENV};
use catalog_rs::countdown::{CountdownEntry, CountdownScheduler, SystemClock};
use catalog_rs::events::{Command, Event};
use catalog_rs::feeds::{console, loader};
use catalog_rs::state::{
    CategoryNode, CategoryType, Listing, ListingKind, ListingStore, LoadState, Section,
};

const HELP: &str = "\
commands:
  select <id>     show listings in a category and its subcategories
  browse          drop the category scope
  search <text>   search categories and listings (empty clears)
  clear           clear the search
  open <n>        open the n-th entry shown
  tree            print the category tree
  products        show product categories only
  services        show service categories only
  quit";

/// Catalog page state plus what it needs to reload itself.
struct App {
    config: Config,
    client: ApiClient,
    tx: mpsc::Sender<Event>,
    store: ListingStore,
    view: CatalogView,
    countdown: CountdownScheduler,
    type_filter: Option<CategoryType>,
    ended: HashSet<(ListingKind, String)>,
}

impl App {
    fn new(config: Config, client: ApiClient, tx: mpsc::Sender<Event>) -> Self {
        let countdown =
            CountdownScheduler::new(config.refresh.countdown_period(), Arc::new(SystemClock));
        Self {
            config,
            client,
            tx,
            store: ListingStore::new(),
            view: CatalogView::new(),
            countdown,
            type_filter: None,
            ended: HashSet::new(),
        }
    }

    fn scope(&self) -> Option<String> {
        if self.config.api.scope_listing_fetches {
            self.view.selection().category_id.clone()
        } else {
            None
        }
    }

    fn load(&mut self, section: Section) {
        let ticket = self.store.begin_load(section);
        let scope = match section {
            Section::Categories => None,
            Section::Listings(_) => self.scope(),
        };
        loader::spawn_load(self.client.clone(), ticket, scope, self.tx.clone());
    }

    fn on_store_changed(&mut self) {
        self.view.refresh(&self.store);
        self.sync_countdown();
        if !self.view.results_visible() && self.store.is_settled() {
            self.print_view();
        }
    }

    fn sync_countdown(&mut self) {
        self.countdown.watch_visible(self.view.visible_listings());
        let visible: HashSet<(ListingKind, &str)> = self
            .view
            .visible_listings()
            .map(|l| (l.kind, l.id.as_str()))
            .collect();
        self.ended.retain(|(kind, id)| visible.contains(&(*kind, id.as_str())));
    }

    fn on_countdown(&mut self, entries: Vec<CountdownEntry>) {
        for entry in entries {
            if entry.remaining.has_ended && self.ended.insert((entry.kind, entry.id.clone())) {
                println!("  {} {} has ended", entry.kind.label(), entry.id);
            }
        }
    }

    /// Returns false when the loop should stop.
    fn on_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Select(id) => self.select(Some(id.as_str())),
            Command::Browse => self.select(None),
            Command::Search(text) => {
                self.view.set_query(&text, &self.store);
                self.sync_countdown();
                self.print_view();
            }
            Command::ClearSearch => {
                self.view.clear_search();
                self.sync_countdown();
                self.print_view();
            }
            Command::Open(n) => self.open(n),
            Command::Tree => self.print_tree(),
            Command::ShowType(kind) => {
                self.type_filter = Some(kind);
                self.print_tree();
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => return false,
        }
        true
    }

    fn select(&mut self, id: Option<&str>) {
        if let Some(route) = self.view.select_category(id, &self.store) {
            println!("-> {}", route);
        }
        self.on_category_changed();
    }

    /// Follow-up to any change of the selected category.
    fn on_category_changed(&mut self) {
        if self.config.api.scope_listing_fetches {
            // Responses for the previous selection must not land on this one.
            self.store.invalidate_listings();
            for kind in ListingKind::ALL {
                self.load(Section::Listings(kind));
            }
        }
        self.sync_countdown();
        self.print_view();
    }

    fn open(&mut self, n: usize) {
        match self.view.activate(n, &self.store, Utc::now()) {
            Some(route @ Route::Category { .. }) => {
                println!("-> {}", route);
                self.on_category_changed();
            }
            Some(route) => println!("-> {}", route),
            None => println!("nothing to open at {} (ended or out of range)", n),
        }
    }

    fn print_tree(&self) {
        let tree = self.store.tree();
        if let LoadState::Failed(msg) = self.store.state(Section::Categories) {
            println!("categories unavailable: {}", msg);
            return;
        }
        if tree.is_empty() {
            println!("no categories");
            return;
        }
        let mut stack: Vec<(&CategoryNode, usize)> = tree
            .roots()
            .iter()
            .filter(|n| self.type_filter.map_or(true, |t| n.kind == t))
            .rev()
            .map(|n| (n, 0))
            .collect();
        while let Some((node, depth)) = stack.pop() {
            let indent = "  ".repeat(depth);
            println!("{}{} ({}) [{}]", indent, node.name, node.id, node.kind.as_str());
            stack.extend(node.children.iter().rev().map(|c| (c, depth + 1)));
        }
    }

    fn print_view(&self) {
        let now = Utc::now();
        match self.view.displayed() {
            Displayed::Category(visible) => {
                let Some(id) = self.view.selection().category_id.as_deref() else {
                    println!("browse mode: `tree` to list categories, `select <id>` to pick one");
                    return;
                };
                let crumbs: Vec<&str> = self
                    .store
                    .tree()
                    .ancestors(id)
                    .iter()
                    .map(|n| n.name.as_str())
                    .collect();
                if crumbs.is_empty() {
                    println!("== {} ==", id);
                } else {
                    println!("== {} ==", crumbs.join(" > "));
                }
                let mut n = 0;
                for kind in ListingKind::ALL {
                    println!("[{}s]", kind.label());
                    let listings = visible.get(kind);
                    match self.store.state(Section::Listings(kind)) {
                        LoadState::Failed(msg) => println!("  unavailable: {}", msg),
                        LoadState::Pending if listings.is_empty() => println!("  loading..."),
                        _ if listings.is_empty() => println!("  none in this category"),
                        _ => {}
                    }
                    for listing in listings {
                        n += 1;
                        self.print_listing(n, listing, now);
                    }
                }
            }
            Displayed::Search(results) => {
                println!(
                    "== search: {:?} ({} results) ==",
                    results.query.as_str(),
                    results.len()
                );
                if results.is_empty() {
                    println!("  no matches");
                }
                for (i, hit) in results.hits().enumerate() {
                    match hit {
                        SearchHit::Category(c) => println!(
                            "{:>3}. [category] {} ({}) [{}]",
                            i + 1,
                            c.name,
                            c.id,
                            c.kind.as_str()
                        ),
                        SearchHit::Listing(listing) => self.print_listing(i + 1, listing, now),
                    }
                }
            }
        }
    }

    fn print_listing(&self, n: usize, listing: &Listing, now: DateTime<Utc>) {
        let price = listing
            .details
            .headline_price()
            .map(|p| format!(" {}", p))
            .unwrap_or_default();
        let remaining = listing
            .remaining(now)
            .map(|r| format!(" | {}", r))
            .unwrap_or_default();
        println!(
            "{:>3}. [{}] {}{}{} | {}",
            n,
            listing.kind.label(),
            listing.title,
            price,
            remaining,
            image::resolve(listing.image.as_deref(), self.client.base_url()),
        );
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config.toml".to_string());
    let config =
        Config::load(&path).with_context(|| format!("Failed to load config from {}", path))?;
    init_tracing(&config.general.log_level);
    info!(base_url = %config.api.base_url, "loaded config");

    let client = ApiClient::new(config.api.clone())?;
    let (tx, mut rx) = mpsc::channel::<Event>(100);

    let poll = config.refresh.listing_poll();
    let mut app = App::new(config, client, tx.clone());

    for section in Section::ALL {
        app.load(section);
    }
    let poller = poll.map(|period| loader::spawn_poller(period, tx.clone()));
    console::spawn(tx.clone());
    let ctrl_c_tx = tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = ctrl_c_tx.send(Event::Shutdown).await;
        }
    });
    app.countdown.start(tx.clone());
    drop(tx);

    println!("Loading catalog... (`help` for commands, Ctrl+C to quit)\n");
    while let Some(event) = rx.recv().await {
        match event {
            Event::CategoriesLoaded { ticket, result } => {
                if app.store.apply_categories(ticket, result) {
                    app.on_store_changed();
                }
            }
            Event::ListingsLoaded { ticket, result } => {
                if app.store.apply_listings(ticket, result) {
                    app.on_store_changed();
                }
            }
            Event::Refresh(section) => app.load(section),
            Event::Countdown { entries } => app.on_countdown(entries),
            Event::Command(cmd) => {
                if !app.on_command(cmd) {
                    break;
                }
            }
            Event::Shutdown => {
                println!("Shutting down...");
                break;
            }
        }
    }

    app.countdown.stop();
    app.countdown.clear();
    if let Some(handle) = poller {
        handle.abort();
    }
    app.store.invalidate_listings();
    app.view.leave();
    Ok(())
}
