use serde_json::Value;
use tracing::debug;
use url::Url;

use super::envelope::{parse_body, unwrap_records};
use super::records::{build_listings, build_tree};
use crate::config::ApiConfig;
use crate::error::{CatalogError, CatalogResult};
use crate::state::{CategoryTree, Listing, ListingKind};

/// HTTP collaborator for the four catalog loads. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> CatalogResult<Self> {
        Url::parse(&config.base_url).map_err(|e| {
            CatalogError::Config(format!("api.base_url {:?}: {}", config.base_url, e))
        })?;
        let http = reqwest::Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { http, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Fetch and build the category forest.
    pub async fn fetch_categories(&self) -> CatalogResult<CategoryTree> {
        let path = &self.config.categories_path;
        let records = self.get_records(path, &[]).await?;
        Ok(build_tree(path, records))
    }

    /// Fetch one listing collection, optionally asking for one category only.
    pub async fn fetch_listings(
        &self,
        kind: ListingKind,
        category: Option<&str>,
    ) -> CatalogResult<Vec<Listing>> {
        let path = self.config.listings_path(kind);
        let query: Vec<(&str, &str)> = category.map(|c| ("category", c)).into_iter().collect();
        let records = self.get_records(path, &query).await?;
        Ok(build_listings(path, kind, records))
    }

    async fn get_records(&self, path: &str, query: &[(&str, &str)]) -> CatalogResult<Vec<Value>> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        debug!(%url, ?query, "GET");

        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        unwrap_records(path, parse_body(path, &bytes)?)
    }
}
