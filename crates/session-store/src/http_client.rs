//! HTTP implementation of [`AuthServiceClient`] over reqwest.

use crate::client::{AuthServiceClient, AuthServiceResult};
use crate::error::AuthServiceError;
use crate::models::{AuthSession, Credentials, Registration, User};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Which auth call produced a response. Status codes mean different things
/// per endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOperation {
    Login,
    Register,
    Logout,
    Profile,
}

impl AuthOperation {
    fn as_str(&self) -> &'static str {
        match self {
            AuthOperation::Login => "login",
            AuthOperation::Register => "register",
            AuthOperation::Logout => "logout",
            AuthOperation::Profile => "profile",
        }
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
    display_name: &'a str,
}

#[derive(Deserialize)]
struct SessionResponse {
    user: UserPayload,
    #[serde(alias = "accessToken")]
    access_token: String,
    #[serde(alias = "refreshToken")]
    refresh_token: String,
}

#[derive(Deserialize)]
struct UserPayload {
    id: String,
    email: String,
    #[serde(default, alias = "displayName")]
    display_name: Option<String>,
    #[serde(default)]
    locale: Option<String>,
}

impl From<UserPayload> for User {
    fn from(payload: UserPayload) -> Self {
        User {
            id: payload.id,
            email: payload.email,
            display_name: payload.display_name,
            locale: payload.locale,
        }
    }
}

/// `/auth/me` answers either with the user object or with `{ "user": ... }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProfileResponse {
    Wrapped { user: UserPayload },
    Bare(UserPayload),
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Auth service client speaking JSON over HTTPS.
pub struct HttpAuthClient {
    api_url: Url,
    client: Client,
}

impl HttpAuthClient {
    /// Create a client for the API rooted at `api_url`.
    pub fn new(api_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { api_url, client })
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url.as_str().trim_end_matches('/'), path)
    }

    async fn send(
        &self,
        op: AuthOperation,
        request: reqwest::RequestBuilder,
    ) -> AuthServiceResult<Response> {
        let response = request.send().await.map_err(|e| {
            warn!(op = op.as_str(), error = %e, "Auth request failed");
            transport_error(&e)
        })?;

        let status = response.status();
        if status.is_success() {
            debug!(op = op.as_str(), status = status.as_u16(), "Auth request succeeded");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = classify_status(op, status, &body);
        warn!(
            op = op.as_str(),
            status = status.as_u16(),
            body_len = body.len(),
            kind = error.kind().as_str(),
            "Auth request rejected"
        );
        Err(error)
    }

    async fn decode<T: DeserializeOwned>(op: AuthOperation, response: Response) -> AuthServiceResult<T> {
        response.json::<T>().await.map_err(|e| {
            warn!(op = op.as_str(), error = %e, "Undecodable auth response");
            if e.is_decode() {
                AuthServiceError::Server(format!("unexpected response from {}", op.as_str()))
            } else {
                transport_error(&e)
            }
        })
    }

    fn session_from(payload: SessionResponse) -> AuthServiceResult<AuthSession> {
        let session = AuthSession {
            user: payload.user.into(),
            access_token: payload.access_token,
            refresh_token: payload.refresh_token,
        };
        if !session.is_complete() {
            return Err(AuthServiceError::Server(
                "auth response is missing user id or tokens".to_string(),
            ));
        }
        Ok(session)
    }
}

#[async_trait]
impl AuthServiceClient for HttpAuthClient {
    async fn login(&self, credentials: &Credentials) -> AuthServiceResult<AuthSession> {
        let op = AuthOperation::Login;
        let request = self.client.post(self.endpoint("auth/login")).json(&LoginRequest {
            email: &credentials.email,
            password: &credentials.password,
        });

        let response = self.send(op, request).await?;
        Self::session_from(Self::decode(op, response).await?)
    }

    async fn register(&self, registration: &Registration) -> AuthServiceResult<AuthSession> {
        let op = AuthOperation::Register;
        let request = self
            .client
            .post(self.endpoint("auth/register"))
            .json(&RegisterRequest {
                email: &registration.email,
                password: &registration.password,
                display_name: &registration.display_name,
            });

        let response = self.send(op, request).await?;
        Self::session_from(Self::decode(op, response).await?)
    }

    async fn logout(&self, access_token: &str) -> AuthServiceResult<()> {
        let request = self
            .client
            .post(self.endpoint("auth/logout"))
            .bearer_auth(access_token);

        self.send(AuthOperation::Logout, request).await?;
        Ok(())
    }

    async fn refresh_profile(&self, access_token: &str) -> AuthServiceResult<User> {
        let op = AuthOperation::Profile;
        let request = self
            .client
            .get(self.endpoint("auth/me"))
            .bearer_auth(access_token);

        let response = self.send(op, request).await?;
        let user = match Self::decode::<ProfileResponse>(op, response).await? {
            ProfileResponse::Wrapped { user } | ProfileResponse::Bare(user) => User::from(user),
        };
        if user.id.trim().is_empty() {
            return Err(AuthServiceError::Server("profile response has no user id".to_string()));
        }
        Ok(user)
    }
}

fn transport_error(e: &reqwest::Error) -> AuthServiceError {
    if e.is_timeout() {
        AuthServiceError::Network("request timed out".to_string())
    } else if e.is_connect() {
        AuthServiceError::Network("could not connect to auth service".to_string())
    } else if e.is_decode() {
        AuthServiceError::Server("undecodable response".to_string())
    } else {
        AuthServiceError::Network(e.to_string())
    }
}

/// Extract a human-readable message from an error body.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

/// Map a non-success status to an error for the given operation.
pub fn classify_status(op: AuthOperation, status: StatusCode, body: &str) -> AuthServiceError {
    let message = error_message(status, body);
    let code = status.as_u16();

    match (op, code) {
        (AuthOperation::Login, 400 | 401 | 403) => AuthServiceError::InvalidCredentials(message),
        (AuthOperation::Register, 409) => AuthServiceError::EmailTaken(message),
        (AuthOperation::Register, 400 | 422) => AuthServiceError::Validation(message),
        (AuthOperation::Profile | AuthOperation::Logout, 401 | 403) => {
            AuthServiceError::Unauthorized(message)
        }
        (_, 429) => AuthServiceError::RateLimited(message),
        _ => AuthServiceError::Server(message),
    }
}
