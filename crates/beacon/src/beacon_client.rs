use std::time::Duration;

use async_trait::async_trait;
use payloadscan_types::Slot;
use reqwest::StatusCode;
use tracing::{debug, warn};
use url::Url;

use crate::{
    error::{ApiError, BeaconClientError},
    traits::BeaconClientTrait,
    types::{ApiResult, BeaconHeader, BeaconResponse, SyncStatus},
};

#[derive(Clone, Debug)]
pub struct BeaconClient {
    pub http: reqwest::Client,
    pub endpoint: Url,
}

impl BeaconClient {
    pub fn new(http: reqwest::Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }

    /// Client whose every request is bounded by `timeout`.
    pub fn with_timeout(endpoint: Url, timeout: Duration) -> Result<Self, BeaconClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::new(http, endpoint))
    }

    pub fn from_endpoint_str(endpoint: &str) -> Result<Self, BeaconClientError> {
        let endpoint = Url::parse(endpoint)?;
        Ok(Self::new(reqwest::Client::new(), endpoint))
    }

    pub async fn get<T: serde::Serialize + serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, BeaconClientError> {
        let result = self.http_get(path).await?.json().await?;
        match result {
            ApiResult::Ok(result) => Ok(result),
            ApiResult::Err(err) => Err(err.into()),
        }
    }

    pub async fn http_get(&self, path: &str) -> Result<reqwest::Response, BeaconClientError> {
        let target = self.endpoint.join(path)?;
        Ok(self.http.get(target).send().await?)
    }
}

#[async_trait]
impl BeaconClientTrait for BeaconClient {
    async fn sync_status(&self) -> Result<SyncStatus, BeaconClientError> {
        let response: BeaconResponse<SyncStatus> = self.get("eth/v1/node/syncing").await?;
        Ok(response.data)
    }

    async fn header_for_slot(&self, slot: Slot) -> Result<BeaconHeader, BeaconClientError> {
        let response = self.http_get(&format!("eth/v1/beacon/headers/{slot}")).await?;

        let status = response.status();
        // Only a beacon API error body means the slot is empty. A bare 404 comes from a wrong
        // endpoint or a proxy in front of the node.
        if status == StatusCode::NOT_FOUND {
            return match response.json::<ApiError>().await {
                Ok(err) => {
                    debug!(slot, %err, "beacon node has no block for slot");
                    Err(BeaconClientError::BlockNotFound { slot })
                }
                Err(_) => {
                    warn!(slot, endpoint = %self.endpoint, "404 without beacon API error body");
                    Err(BeaconClientError::UnexpectedStatus { status: status.as_u16() })
                }
            }
        }

        match response.json::<ApiResult<BeaconResponse<BeaconHeader>>>().await {
            Ok(ApiResult::Ok(result)) => Ok(result.data),
            Ok(ApiResult::Err(err)) => Err(err.into()),
            Err(_) if !status.is_success() => {
                Err(BeaconClientError::UnexpectedStatus { status: status.as_u16() })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn get_uri(&self) -> String {
        self.endpoint.to_string()
    }
}
