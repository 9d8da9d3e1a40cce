//! Backend access: the `EventBackend` seam and its reqwest implementation.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Event, EventId, UserId},
    error::ErrorBody,
    protocol::{
        ActionResponse, Credentials, EventsResponse, LoginResponse, RegistrationToggleRequest,
        RegistrationsResponse,
    },
};
use tracing::debug;
use url::Url;

use crate::error::{BackendError, ClientError};

#[async_trait]
pub trait EventBackend: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<UserId, BackendError>;
    async fn register(&self, credentials: &Credentials) -> Result<(), BackendError>;
    async fn list_events(&self) -> Result<Vec<Event>, BackendError>;
    async fn user_registrations(&self, user_id: UserId) -> Result<Vec<EventId>, BackendError>;
    async fn register_for_event(
        &self,
        request: RegistrationToggleRequest,
    ) -> Result<(), BackendError>;
    async fn unregister_from_event(
        &self,
        request: RegistrationToggleRequest,
    ) -> Result<(), BackendError>;
}

/// Parses a server base such as `http://127.0.0.1:5000` into the URL every
/// endpoint path is joined onto.
pub fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&with_slash).map_err(|source| ClientError::InvalidBaseUrl {
        url: raw.to_string(),
        source,
    })
}

#[derive(Clone)]
pub struct HttpBackend {
    http: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        Ok(Self::with_client(Client::new(), parse_base_url(server_url)?))
    }

    pub fn with_client(http: Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // Joined relative so a path prefix on the base survives.
    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| BackendError::Network(format!("invalid endpoint {path}: {err}")))
    }

    /// Downloads raw bytes, used for chart PNGs and event images.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, BackendError> {
        let url = self
            .base_url
            .join(url)
            .map_err(|err| BackendError::Network(format!("invalid image url {url}: {err}")))?;
        debug!(%url, "fetching image bytes");
        let res = self.http.get(url).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(BackendError::Network(format!(
                "image request failed with status {status}"
            )));
        }
        Ok(res.bytes().await?.to_vec())
    }

    async fn post_toggle(
        &self,
        path: &str,
        request: RegistrationToggleRequest,
    ) -> Result<(), BackendError> {
        let res = self
            .http
            .post(self.endpoint(path)?)
            .json(&request)
            .send()
            .await?;
        let body: ActionResponse = read_json(res).await?;
        if body.success {
            Ok(())
        } else {
            Err(BackendError::Rejected {
                message: body.message,
            })
        }
    }
}

async fn read_json<T: DeserializeOwned>(res: Response) -> Result<T, BackendError> {
    let bytes = res.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|err| BackendError::Network(format!("undecodable response body: {err}")))
}

#[async_trait]
impl EventBackend for HttpBackend {
    async fn login(&self, credentials: &Credentials) -> Result<UserId, BackendError> {
        debug!(username = %credentials.username, "POST /login");
        let res = self
            .http
            .post(self.endpoint("/login")?)
            .json(credentials)
            .send()
            .await?;
        if res.status().is_success() {
            let body: LoginResponse = read_json(res).await?;
            Ok(body.user_id)
        } else {
            let body: ErrorBody = read_json(res).await?;
            Err(BackendError::Rejected {
                message: body.message,
            })
        }
    }

    async fn register(&self, credentials: &Credentials) -> Result<(), BackendError> {
        debug!(username = %credentials.username, "POST /register");
        let res = self
            .http
            .post(self.endpoint("/register")?)
            .json(credentials)
            .send()
            .await?;
        if res.status().is_success() {
            let _: serde_json::Value = read_json(res).await?;
            Ok(())
        } else {
            let body: ErrorBody = read_json(res).await?;
            Err(BackendError::Rejected {
                message: body.message,
            })
        }
    }

    async fn list_events(&self) -> Result<Vec<Event>, BackendError> {
        let res = self.http.get(self.endpoint("/api/events")?).send().await?;
        let body: EventsResponse = read_json(res).await?;
        if body.success {
            Ok(body.events)
        } else {
            Err(BackendError::Rejected {
                message: body.message,
            })
        }
    }

    async fn user_registrations(&self, user_id: UserId) -> Result<Vec<EventId>, BackendError> {
        let res = self
            .http
            .get(self.endpoint(&format!("/api/user/{user_id}/registrations"))?)
            .send()
            .await?;
        let body: RegistrationsResponse = read_json(res).await?;
        if body.success {
            Ok(body.event_ids)
        } else {
            Err(BackendError::Rejected {
                message: body.message,
            })
        }
    }

    async fn register_for_event(
        &self,
        request: RegistrationToggleRequest,
    ) -> Result<(), BackendError> {
        self.post_toggle("/api/events/register", request).await
    }

    async fn unregister_from_event(
        &self,
        request: RegistrationToggleRequest,
    ) -> Result<(), BackendError> {
        self.post_toggle("/api/events/unregister", request).await
    }
}

#[cfg(test)]
#[path = "tests/backend_tests.rs"]
mod tests;
