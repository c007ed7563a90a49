use crate::domain::model::{CatalogItem, ModificationMarker, RatingLedger};
use crate::domain::ports::{ItemStore, LedgerStore, MarkerStore};
use crate::utils::error::{CatalogError, Result};
use crate::utils::validation::validate_url;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

/// Remote document store spoken over a JSON HTTP API. Markers are
/// stamped server-side on PUT so their timestamps are comparable across
/// clients regardless of local clock skew.
pub struct RestStore {
    client: Client,
    base_url: Url,
}

impl RestStore {
    pub fn new(base_url: &str) -> Result<Self> {
        validate_url("store_endpoint", base_url)?;
        // Url::join treats a base without a trailing slash as a file,
        // dropping the last path segment.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized).map_err(|e| CatalogError::InvalidConfigValue {
            field: "store_endpoint".to_string(),
            value: normalized.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| CatalogError::RemoteUnavailable(format!("bad path {}: {}", path, e)))
    }

    fn check_status(status: StatusCode, context: &str) -> Result<()> {
        if status.is_success() {
            Ok(())
        } else {
            Err(CatalogError::RemoteUnavailable(format!(
                "{} returned {}",
                context, status
            )))
        }
    }
}

#[async_trait]
impl ItemStore for RestStore {
    async fn all_items(&self) -> Result<Vec<CatalogItem>> {
        let url = self.endpoint("items?orderBy=ordinal")?;
        let response = self.client.get(url).send().await?;
        Self::check_status(response.status(), "list items")?;
        Ok(response.json().await?)
    }

    async fn elevated_items(&self) -> Result<Vec<CatalogItem>> {
        let url = self.endpoint("items?tier=elevated")?;
        let response = self.client.get(url).send().await?;
        Self::check_status(response.status(), "list elevated items")?;
        Ok(response.json().await?)
    }

    async fn insert_item(&self, item: CatalogItem) -> Result<()> {
        let url = self.endpoint("items")?;
        let response = self.client.post(url).json(&item).send().await?;
        Self::check_status(response.status(), "insert item")
    }

    async fn set_ordinal(&self, id: &str, ordinal: u32) -> Result<()> {
        let url = self.endpoint(&format!("items/{}", id))?;
        let response = self
            .client
            .patch(url)
            .json(&serde_json::json!({ "ordinal": ordinal }))
            .send()
            .await?;
        Self::check_status(response.status(), "set ordinal")
    }

    async fn delete_item(&self, id: &str) -> Result<()> {
        let url = self.endpoint(&format!("items/{}", id))?;
        let response = self.client.delete(url).send().await?;
        Self::check_status(response.status(), "delete item")
    }
}

#[async_trait]
impl LedgerStore for RestStore {
    async fn ledgers_for_item(&self, item_id: &str) -> Result<Vec<RatingLedger>> {
        let url = self.endpoint(&format!("ledgers?itemId={}", item_id))?;
        let response = self.client.get(url).send().await?;
        Self::check_status(response.status(), "query ledgers")?;
        Ok(response.json().await?)
    }

    async fn all_ledgers(&self) -> Result<Vec<RatingLedger>> {
        let url = self.endpoint("ledgers")?;
        let response = self.client.get(url).send().await?;
        Self::check_status(response.status(), "list ledgers")?;
        Ok(response.json().await?)
    }

    async fn upsert_ledger(&self, ledger: RatingLedger) -> Result<()> {
        let url = self.endpoint(&format!("ledgers/{}", ledger.item_id))?;
        let response = self.client.put(url).json(&ledger).send().await?;
        Self::check_status(response.status(), "upsert ledger")
    }

    async fn delete_ledger(&self, item_id: &str) -> Result<()> {
        let url = self.endpoint(&format!("ledgers/{}", item_id))?;
        let response = self.client.delete(url).send().await?;
        Self::check_status(response.status(), "delete ledger")
    }
}

#[async_trait]
impl MarkerStore for RestStore {
    async fn marker(&self, domain: &str) -> Result<Option<ModificationMarker>> {
        let url = self.endpoint(&format!("markers/{}", domain))?;
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::check_status(response.status(), "read marker")?;
        Ok(Some(response.json().await?))
    }

    async fn touch(&self, domain: &str) -> Result<()> {
        // Empty body: the store assigns its own timestamp.
        let url = self.endpoint(&format!("markers/{}", domain))?;
        let response = self.client.put(url).send().await?;
        Self::check_status(response.status(), "touch marker")
    }
}
