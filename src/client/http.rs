use anyhow::Result;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::logic::ImportReport;
use crate::model::{Entity, Id, MessageResponse, ValidationError};
use crate::store::traits::{EntityStore, Store};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with a status of 400 or above.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unreadable response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Banner text for a failed `action` ("Add", "Update", ...): the server's
    /// message when it sent one, otherwise "<action> failed".
    pub fn banner(&self, action: &str) -> String {
        match self {
            ClientError::Rejected { message, .. } if !message.is_empty() => message.clone(),
            _ => format!("{} failed", action),
        }
    }
}

/// Text from `err` that may be shown to a user: a server rejection or a
/// failed validation. Anything else, driver errors included, stays in the log.
pub fn user_message(err: &anyhow::Error) -> Option<String> {
    if let Some(ClientError::Rejected { message, .. }) = err.downcast_ref::<ClientError>() {
        return Some(message.clone()).filter(|m| !m.is_empty());
    }
    err.downcast_ref::<ValidationError>()
        .map(|ValidationError(message)| message.clone())
}

/// Typed client for the REST API.
///
/// It implements [`EntityStore`] for every entity, so the bulk import runner
/// and the entity panels can drive a remote server the same way they drive a
/// local store.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn collection_url<E: Entity>(&self) -> String {
        format!("{}/api/{}", self.base_url, E::RESOURCE)
    }

    fn record_url<E: Entity>(&self, id: Id) -> String {
        format!("{}/{}", self.collection_url::<E>(), id)
    }

    /// Turn a status >= 400 into [`ClientError::Rejected`], reading `{message}`
    /// from the body when there is one.
    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if !status.is_client_error() && !status.is_server_error() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<MessageResponse>(&body)
            .map(|m| m.message)
            .unwrap_or(body);
        Err(ClientError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let response = Self::check(response).await?;
        response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    pub async fn list<E: Entity>(&self, parent: Option<Id>) -> Result<Vec<E>, ClientError> {
        let mut request = self.http.get(self.collection_url::<E>());
        if let (Some(key), Some(parent)) = (E::FILTER_KEY, parent) {
            request = request.query(&[(key, parent)]);
        }
        Self::decode(request.send().await?).await
    }

    pub async fn create<E: Entity>(&self, draft: &E::Draft) -> Result<E, ClientError> {
        let response = self
            .http
            .post(self.collection_url::<E>())
            .json(draft)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// `Ok(None)` when the server has no such record.
    pub async fn update<E: Entity>(
        &self,
        id: Id,
        draft: &E::Draft,
    ) -> Result<Option<E>, ClientError> {
        let response = self
            .http
            .put(self.record_url::<E>(id))
            .json(draft)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::decode(response).await.map(Some)
    }

    /// `Ok(false)` when the server has no such record.
    pub async fn delete<E: Entity>(&self, id: Id) -> Result<bool, ClientError> {
        let response = self.http.delete(self.record_url::<E>(id)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::check(response).await?;
        Ok(true)
    }

    /// Download the server-side CSV export.
    pub async fn export_csv<E: Entity>(&self) -> Result<String, ClientError> {
        let url = format!("{}/export", self.collection_url::<E>());
        let response = Self::check(self.http.get(url).send().await?).await?;
        Ok(response.text().await?)
    }

    /// Run the import on the server, which reports every row.
    pub async fn import_csv<E: Entity>(&self, csv: String) -> Result<ImportReport, ClientError> {
        let url = format!("{}/import", self.collection_url::<E>());
        let response = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "text/csv")
            .body(csv)
            .send()
            .await?;
        Self::decode(response).await
    }
}

#[async_trait::async_trait]
impl<E: Entity> EntityStore<E> for ApiClient {
    async fn list(&self, parent: Option<Id>) -> Result<Vec<E>> {
        Ok(ApiClient::list::<E>(self, parent).await?)
    }

    async fn get(&self, id: Id) -> Result<Option<E>> {
        // No single-record endpoint; the lists are small.
        let records = ApiClient::list::<E>(self, None).await?;
        Ok(records.into_iter().find(|r| r.id() == id))
    }

    async fn create(&self, draft: E::Draft) -> Result<E> {
        Ok(ApiClient::create::<E>(self, &draft).await?)
    }

    async fn update(&self, id: Id, draft: E::Draft) -> Result<Option<E>> {
        Ok(ApiClient::update::<E>(self, id, &draft).await?)
    }

    async fn delete(&self, id: Id) -> Result<bool> {
        Ok(ApiClient::delete::<E>(self, id).await?)
    }
}

impl Store for ApiClient {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Brand, OrderItem};

    #[test]
    fn test_banner_prefers_server_message() {
        let rejected = ClientError::Rejected {
            status: 400,
            message: "Name is required".to_string(),
        };
        assert_eq!(rejected.banner("Add"), "Name is required");

        let decode = ClientError::Decode("expected value".to_string());
        assert_eq!(decode.banner("Update"), "Update failed");

        let empty = ClientError::Rejected {
            status: 500,
            message: String::new(),
        };
        assert_eq!(empty.banner("Delete"), "Delete failed");
    }

    #[test]
    fn test_user_message_hides_driver_errors() {
        let rejected = anyhow::Error::new(ClientError::Rejected {
            status: 400,
            message: "Name is required".to_string(),
        })
        .context("Failed to insert into brands");
        assert_eq!(user_message(&rejected).as_deref(), Some("Name is required"));

        let invalid = anyhow::Error::new(ValidationError::new("Missing required fields"));
        assert_eq!(
            user_message(&invalid).as_deref(),
            Some("Missing required fields")
        );

        let driver = anyhow::anyhow!("violates foreign key constraint \"products_brand_id_fkey\"")
            .context("Failed to insert into products");
        assert_eq!(user_message(&driver), None);
    }

    #[test]
    fn test_urls_use_resource_paths() {
        let client = ApiClient::new("http://localhost:5000/").unwrap();
        assert_eq!(
            client.collection_url::<Brand>(),
            "http://localhost:5000/api/brands"
        );
        assert_eq!(
            client.record_url::<OrderItem>(7),
            "http://localhost:5000/api/order_items/7"
        );
    }
}
