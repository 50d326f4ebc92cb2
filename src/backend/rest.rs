use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use super::traits::{EngagementSource, ListingStore, MediaStorage, SellerSession, SessionProvider};
use crate::config::Config;
use crate::error::{ConfigError, StoreError};
use crate::models::{EngagementEvent, ListingId, ListingRow, SellerId};

/// Client for the hosted backend-as-a-service: REST tables, object storage and auth
pub struct RestBackend {
    client: Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
    listings_table: String,
    events_table: String,
    bucket: String,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    email: Option<String>,
}

impl RestBackend {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let base_url = config.base_url().ok_or(ConfigError::MissingBackend)?;
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingBackend)?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("listing-desk/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            api_key,
            access_token: config.access_token.clone(),
            listings_table: config.listings_table.clone(),
            events_table: config.events_table.clone(),
            bucket: config.media_bucket.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path)
    }

    fn auth_url(&self) -> String {
        format!("{}/auth/v1/user", self.base_url)
    }

    /// Attach the api key and, when signed in, the seller's bearer token
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        request.header("apikey", &self.api_key).bearer_auth(bearer)
    }

    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!("Backend returned status: {}", status);
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn first_row(response: Response) -> Result<Option<ListingRow>, StoreError> {
        let rows: Vec<ListingRow> = response.json().await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl ListingStore for RestBackend {
    async fn insert(&self, row: &ListingRow) -> Result<ListingRow, StoreError> {
        debug!("POST {} ({})", self.listings_table, row.id);
        let response = self
            .authorize(self.client.post(self.table_url(&self.listings_table)))
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            return Err(StoreError::Conflict(row.id));
        }
        let response = Self::check(response).await?;
        Self::first_row(response)
            .await?
            .ok_or_else(|| StoreError::Unavailable("insert returned no row".to_string()))
    }

    async fn update(&self, row: &ListingRow) -> Result<ListingRow, StoreError> {
        debug!("PATCH {} ({})", self.listings_table, row.id);
        let response = self
            .authorize(self.client.patch(self.table_url(&self.listings_table)))
            .query(&[("id", format!("eq.{}", row.id))])
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;

        let response = Self::check(response).await?;
        Self::first_row(response)
            .await?
            .ok_or(StoreError::NotFound(row.id))
    }

    async fn fetch(&self, id: ListingId) -> Result<Option<ListingRow>, StoreError> {
        let response = self
            .authorize(self.client.get(self.table_url(&self.listings_table)))
            .query(&[("id", format!("eq.{}", id)), ("select", "*".to_string())])
            .send()
            .await?;

        Self::first_row(Self::check(response).await?).await
    }

    async fn list_by_seller(&self, seller: &SellerId) -> Result<Vec<ListingRow>, StoreError> {
        let response = self
            .authorize(self.client.get(self.table_url(&self.listings_table)))
            .query(&[
                ("seller_id", format!("eq.{}", seller)),
                ("deleted", "eq.false".to_string()),
                ("order", "updated_at.desc".to_string()),
            ])
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    fn backend_name(&self) -> &'static str {
        "rest"
    }
}

#[async_trait]
impl MediaStorage for RestBackend {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
        debug!("Uploading {} bytes to {}", bytes.len(), path);
        let response = self
            .authorize(self.client.post(self.object_url(path)))
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }
}

#[async_trait]
impl SessionProvider for RestBackend {
    async fn current_seller(&self) -> Result<Option<SellerSession>, StoreError> {
        if self.access_token.is_none() {
            return Ok(None);
        }

        let response = self.authorize(self.client.get(self.auth_url())).send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("Access token was rejected");
            return Ok(None);
        }

        let user: AuthUser = Self::check(response).await?.json().await?;
        Ok(Some(SellerSession {
            seller_id: SellerId(user.id),
            email: user.email,
        }))
    }
}

#[async_trait]
impl EngagementSource for RestBackend {
    async fn events_for(&self, listings: &[ListingId]) -> Result<Vec<EngagementEvent>, StoreError> {
        if listings.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = listings.iter().map(|id| id.to_string()).collect();
        let response = self
            .authorize(self.client.get(self.table_url(&self.events_table)))
            .query(&[
                ("listing_id", format!("in.({})", ids.join(","))),
                ("order", "occurred_at.asc".to_string()),
            ])
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            backend_url: Some("https://demo.example.co/".to_string()),
            api_key: Some("anon-key".to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn test_requires_url_and_key() {
        assert!(matches!(
            RestBackend::new(&Config::default()),
            Err(ConfigError::MissingBackend)
        ));

        let no_key = Config {
            api_key: Some(String::new()),
            ..config()
        };
        assert!(matches!(RestBackend::new(&no_key), Err(ConfigError::MissingBackend)));
    }

    #[test]
    fn test_endpoint_urls() {
        let backend = RestBackend::new(&config()).unwrap();
        assert_eq!(
            backend.table_url("listings"),
            "https://demo.example.co/rest/v1/listings"
        );
        assert_eq!(
            backend.object_url("listings/abc/primary.jpg"),
            "https://demo.example.co/storage/v1/object/listing-media/listings/abc/primary.jpg"
        );
        assert_eq!(
            backend.public_url("listings/abc/primary.jpg"),
            "https://demo.example.co/storage/v1/object/public/listing-media/listings/abc/primary.jpg"
        );
        assert_eq!(backend.auth_url(), "https://demo.example.co/auth/v1/user");
    }

    #[tokio::test]
    async fn test_no_token_means_signed_out() {
        let backend = RestBackend::new(&config()).unwrap();
        assert_eq!(backend.current_seller().await.unwrap(), None);
    }
}
