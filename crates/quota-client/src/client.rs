//! Quota service HTTP client implementation.

use reqwest::Client;
use std::time::Duration;

use quota_core::WalletAddress;

use crate::error::ClientError;
use crate::types::{ApiErrorResponse, PurchaseReport, StorageInfo};

/// Quota service API client.
///
/// Provides methods for reading storage totals and reporting purchases on
/// behalf of a wallet.
#[derive(Debug, Clone)]
pub struct QuotaClient {
    client: Client,
    base_url: String,
}

impl QuotaClient {
    /// Create a new quota client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the quota service (e.g., `"http://quota:8080"`)
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_options(base_url, ClientOptions::default())
    }

    /// Create a new quota client with custom options.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Get storage totals for a wallet.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn storage_info(&self, wallet: &WalletAddress) -> Result<StorageInfo, ClientError> {
        let url = format!("{}/api/storage/info", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("authorization", wallet.as_str())
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Report a submitted storage payment so the service credits the wallet.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn report_purchase(
        &self,
        wallet: &WalletAddress,
        report: &PurchaseReport,
    ) -> Result<StorageInfo, ClientError> {
        let url = format!("{}/api/storage/purchase", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("authorization", wallet.as_str())
            .json(report)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = match response.json::<ApiErrorResponse>().await {
            Ok(body) => body.error,
            Err(_) => format!("HTTP {status}"),
        };

        Err(ClientError::Api {
            message,
            status: status.as_u16(),
        })
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn wallet() -> WalletAddress {
        "0xabc0000000000000000000000000000000000001".parse().unwrap()
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = QuotaClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[tokio::test]
    async fn storage_info_sends_wallet_as_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/storage/info"))
            .and(header("authorization", wallet().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "totalStorageUsed": 10,
                "totalStoragePurchased": 0,
                "totalAvailableStorage": 100,
                "remainingStorage": 90,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = QuotaClient::new(server.uri()).unwrap();
        let info = client.storage_info(&wallet()).await.unwrap();

        assert_eq!(info.remaining_storage, 90);
    }

    #[tokio::test]
    async fn report_purchase_posts_camel_case_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/storage/purchase"))
            .and(body_json(serde_json::json!({
                "transactionHash": "0xfeed",
                "paymentMethod": "USDT",
                "network": "Base",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "totalStorageUsed": 0,
                "totalStoragePurchased": 10,
                "totalAvailableStorage": 20,
                "remainingStorage": 20,
            })))
            .mount(&server)
            .await;

        let client = QuotaClient::new(server.uri()).unwrap();
        let report = PurchaseReport {
            transaction_hash: "0xfeed".into(),
            payment_method: "USDT".into(),
            network: "Base".into(),
        };

        let info = client.report_purchase(&wallet(), &report).await.unwrap();
        assert_eq!(info.total_storage_purchased, 10);
    }

    #[tokio::test]
    async fn error_body_becomes_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(503)
                    .set_body_json(serde_json::json!({ "error": "Database connection failed" })),
            )
            .mount(&server)
            .await;

        let client = QuotaClient::new(server.uri()).unwrap();
        let err = client.storage_info(&wallet()).await.unwrap_err();

        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "Database connection failed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
