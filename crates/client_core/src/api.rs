//! Remote roster collaborator: the read side used by refreshes and the two mutations.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use shared::{
    domain::Roster,
    error::ErrorDetail,
    protocol::{activities_url, signup_url, MutationAck},
};
use tracing::debug;
use url::Url;

use crate::error::{FetchError, MutationError};

#[async_trait]
pub trait RosterApi: Send + Sync {
    async fn fetch_roster(&self) -> Result<Roster, FetchError>;
    async fn signup(&self, activity: &str, email: &str) -> Result<MutationAck, MutationError>;
    async fn unregister(&self, activity: &str, email: &str) -> Result<MutationAck, MutationError>;
}

pub struct HttpRosterApi {
    http: Client,
    base_url: Url,
}

impl HttpRosterApi {
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// No timeout is applied unless one is given.
    pub fn with_timeout(base_url: Url, timeout: Option<Duration>) -> reqwest::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url,
        })
    }

    async fn send_mutation(
        &self,
        method: Method,
        activity: &str,
        email: &str,
    ) -> Result<MutationAck, MutationError> {
        let url = signup_url(&self.base_url, activity, email)?;
        debug!(%method, %url, "sending roster mutation");
        let response = self
            .http
            .request(method, url)
            .send()
            .await
            .map_err(|err| MutationError::Transport(err.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| MutationError::Transport(err.to_string()))?;

        if status.is_success() {
            return serde_json::from_slice(&body)
                .map_err(|err| MutationError::Decode(err.to_string()));
        }

        let rejection: ErrorDetail =
            serde_json::from_slice(&body).map_err(|err| MutationError::Decode(err.to_string()))?;
        Err(MutationError::Rejected {
            status: status.as_u16(),
            detail: rejection.message().map(str::to_owned),
        })
    }
}

#[async_trait]
impl RosterApi for HttpRosterApi {
    async fn fetch_roster(&self) -> Result<Roster, FetchError> {
        let url = activities_url(&self.base_url)?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        if response.status() != StatusCode::OK {
            return Err(FetchError::Status(response.status().as_u16()));
        }
        let body = response
            .bytes()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        serde_json::from_slice(&body).map_err(|err| FetchError::Decode(err.to_string()))
    }

    async fn signup(&self, activity: &str, email: &str) -> Result<MutationAck, MutationError> {
        self.send_mutation(Method::POST, activity, email).await
    }

    async fn unregister(&self, activity: &str, email: &str) -> Result<MutationAck, MutationError> {
        self.send_mutation(Method::DELETE, activity, email).await
    }
}
