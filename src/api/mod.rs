mod client;
pub mod envelope;
pub mod image;
pub mod records;

pub use client::ApiClient;
