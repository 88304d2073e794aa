pub mod console;
pub mod loader;
