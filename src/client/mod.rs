//! Typed client for a remote users service.
//!
//! Wire contract (JSON bodies):
//!
//! | Call | Request | Success |
//! |---|---|---|
//! | [`list`](UsersClient::list) | `GET /users` | `200` |
//! | [`get`](UsersClient::get) | `GET /users/{id}` | `200` |
//! | [`get_by_email`](UsersClient::get_by_email) | `GET /users/{email}` | `200` |
//! | [`create`](UsersClient::create) | `POST /users` | `200` / `201`, `{"id": n}` |
//! | [`update`](UsersClient::update) | `PUT /users/{id}` | `200` |
//! | [`delete`](UsersClient::delete) | `DELETE /users/{id}` | `200` / `204` |
//! | [`health_check`](UsersClient::health_check) | `GET /health` | `200` |
//!
//! `404` maps to [`ClientError::NotFound`], `400` on a write to
//! [`ClientError::InvalidData`], anything else to
//! [`ClientError::UnexpectedStatus`]. No call is retried.

mod error;
mod user;

pub use error::ClientError;
pub use user::User;

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use user::Created;

/// Upper bound for a single call, connect to last body byte.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
/// Idle pooled connections kept per host.
pub const MAX_IDLE_CONNECTIONS: usize = 10;
/// How long an idle pooled connection is kept.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the users service.
///
/// Cheap to clone; clones share one connection pool.
///
/// ```rust,no_run
/// use trellis::client::{ClientError, UsersClient};
///
/// # async fn run() -> Result<(), ClientError> {
/// let users = UsersClient::connect("http://users.internal").await?;
/// match users.get(42).await {
///     Ok(user) => println!("{}", user.name),
///     Err(ClientError::NotFound) => println!("no such user"),
///     Err(e) => return Err(e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct UsersClient {
    base: Url,
    http: Client,
}

impl UsersClient {
    /// Builds a pooled HTTP client and probes `GET /health`.
    ///
    /// # Errors
    ///
    /// [`ClientError::ServiceUnavailable`] when the probe does not answer
    /// `200`, [`ClientError::Request`] when it cannot be sent at all.
    pub async fn connect(base_url: &str) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .pool_max_idle_per_host(MAX_IDLE_CONNECTIONS)
            .pool_idle_timeout(IDLE_TIMEOUT)
            .build()
            .map_err(ClientError::Request)?;
        Self::with_client(base_url, http).await
    }

    /// Like [`connect`](Self::connect) with a caller-supplied `reqwest::Client`.
    pub async fn with_client(base_url: &str, http: Client) -> Result<Self, ClientError> {
        let base = Url::parse(base_url.trim_end_matches('/'))
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ClientError::InvalidBaseUrl(base_url.to_owned()))?;

        let client = Self { base, http };
        client.health_check().await?;
        debug!(base = %client.base, "users client ready");
        Ok(client)
    }

    /// `GET /health`; anything but `200` is [`ClientError::ServiceUnavailable`].
    pub async fn health_check(&self) -> Result<(), ClientError> {
        let res = send(self.http.get(self.url(&["health"]))).await?;
        match res.status() {
            StatusCode::OK => Ok(()),
            status => {
                debug!(%status, "users service health probe failed");
                Err(ClientError::ServiceUnavailable)
            }
        }
    }

    pub async fn list(&self) -> Result<Vec<User>, ClientError> {
        let res = send(self.http.get(self.url(&["users"]))).await?;
        match res.status() {
            StatusCode::OK => decode(res).await,
            StatusCode::NOT_FOUND => Err(ClientError::NotFound),
            status => Err(ClientError::UnexpectedStatus(status.as_u16())),
        }
    }

    pub async fn get(&self, id: i64) -> Result<User, ClientError> {
        self.fetch(&id.to_string()).await
    }

    /// The email is sent as one percent-encoded path segment.
    pub async fn get_by_email(&self, email: &str) -> Result<User, ClientError> {
        self.fetch(email).await
    }

    /// Returns the id the service assigned.
    pub async fn create(&self, user: &User) -> Result<i64, ClientError> {
        let res = send(self.http.post(self.url(&["users"])).json(user)).await?;
        match res.status() {
            StatusCode::OK | StatusCode::CREATED => Ok(decode::<Created>(res).await?.id),
            StatusCode::BAD_REQUEST => Err(ClientError::InvalidData),
            status => Err(ClientError::UnexpectedStatus(status.as_u16())),
        }
    }

    /// Returns the user as stored after the update.
    pub async fn update(&self, id: i64, user: &User) -> Result<User, ClientError> {
        let url = self.url(&["users", &id.to_string()]);
        let res = send(self.http.put(url).json(user)).await?;
        match res.status() {
            StatusCode::OK => decode(res).await,
            StatusCode::NOT_FOUND => Err(ClientError::NotFound),
            StatusCode::BAD_REQUEST => Err(ClientError::InvalidData),
            status => Err(ClientError::UnexpectedStatus(status.as_u16())),
        }
    }

    pub async fn delete(&self, id: i64) -> Result<(), ClientError> {
        let res = send(self.http.delete(self.url(&["users", &id.to_string()]))).await?;
        match res.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
            StatusCode::NOT_FOUND => Err(ClientError::NotFound),
            status => Err(ClientError::UnexpectedStatus(status.as_u16())),
        }
    }

    async fn fetch(&self, key: &str) -> Result<User, ClientError> {
        let res = send(self.http.get(self.url(&["users", key]))).await?;
        match res.status() {
            StatusCode::OK => decode(res).await,
            StatusCode::NOT_FOUND => Err(ClientError::NotFound),
            status => Err(ClientError::UnexpectedStatus(status.as_u16())),
        }
    }

    /// Appends `segments` to the base path, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // Only fails for cannot-be-a-base URLs, rejected at construction.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

async fn send(req: RequestBuilder) -> Result<reqwest::Response, ClientError> {
    req.send().await.map_err(ClientError::Request)
}

async fn decode<T: DeserializeOwned>(res: reqwest::Response) -> Result<T, ClientError> {
    res.json().await.map_err(ClientError::Decode)
}
