use crate::countdown::CountdownEntry;
use crate::error::CatalogResult;
use crate::state::{CategoryTree, CategoryType, Listing, LoadTicket, Section};

/// Everything the main loop reacts to. Each producer runs on its own task.
#[derive(Debug)]
pub enum Event {
    /// Category tree fetch finished (or failed).
    CategoriesLoaded {
        ticket: LoadTicket,
        result: CatalogResult<CategoryTree>,
    },

    /// One listing collection fetch finished (or failed).
    ListingsLoaded {
        ticket: LoadTicket,
        result: CatalogResult<Vec<Listing>>,
    },

    /// Time to refetch a section.
    Refresh(Section),

    /// Countdown tick for every watched listing.
    Countdown { entries: Vec<CountdownEntry> },

    /// A command typed by the user.
    Command(Command),

    /// Input closed or Ctrl+C.
    Shutdown,
}

/// User commands that drive the catalog view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Scope the view to a category and its descendants.
    Select(String),
    /// Drop the category scope.
    Browse,
    /// Run a search; an empty query clears it.
    Search(String),
    /// Clear the search and restore the category view.
    ClearSearch,
    /// Activate the n-th entry (1-based) of what is currently shown.
    Open(usize),
    /// Print the category tree.
    Tree,
    /// Restrict the printed root categories to one type.
    ShowType(CategoryType),
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Returns `None` for blank or unrecognised input.
    pub fn parse(line: &str) -> Option<Command> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((w, r)) => (w, r.trim()),
            None => (line, ""),
        };
        match word {
            "select" | "cat" if !rest.is_empty() => Some(Command::Select(rest.to_string())),
            "browse" => Some(Command::Browse),
            "search" | "/" => Some(Command::Search(rest.to_string())),
            "clear" => Some(Command::ClearSearch),
            "open" => rest.parse::<usize>().ok().filter(|n| *n > 0).map(Command::Open),
            "tree" => Some(Command::Tree),
            "products" => Some(Command::ShowType(CategoryType::Product)),
            "services" => Some(Command::ShowType(CategoryType::Service)),
            "help" | "?" => Some(Command::Help),
            "quit" | "exit" | "q" => Some(Command::Quit),
            _ => None,
        }
    }
}
