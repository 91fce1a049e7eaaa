use reqwest::{Client as HttpClient, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::api::models::{HistoryEntry, LoginResponse, PendingBatch, PendingResponse};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("authentication rejected (HTTP {0})")]
    Unauthorized(u16),
    #[error("server returned HTTP {status}: {detail}")]
    Server { status: u16, detail: String },
    #[error("invalid server URL: {0}")]
    BadUrl(#[from] url::ParseError),
    #[error("no session token")]
    MissingToken,
}

impl ApiError {
    /// True for the 401/403 class that tears the whole session down.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    agent: Option<&'a str>,
}

#[derive(Serialize)]
struct ChangePasswordRequest<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

// FastAPI-style error body.
#[derive(Deserialize)]
struct ErrorDetail {
    detail: String,
}

/// REST client for one server, carrying the session token when logged in.
#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_token(base_url, None)
    }

    pub fn with_token(base_url: &str, token: Option<String>) -> Self {
        Self {
            http: HttpClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_auth(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.header("Authorization", format!("Bearer {}", token)),
            None => req,
        }
    }

    /// Reject 401/403 outright; turn any other error status into the
    /// backend's detail string where one is present.
    async fn check(resp: Response) -> Result<Response, ApiError> {
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            let detail = resp
                .json::<ErrorDetail>()
                .await
                .map(|body| body.detail)
                .unwrap_or_else(|_| format!("HTTP {}", status));
            return Err(ApiError::Server {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(resp)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let resp = self
            .http
            .post(self.endpoint("/auth/login"))
            .json(&LoginRequest { username, password })
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    /// Fire-and-forget enqueue. A failure is terminal for this message;
    /// the caller reports it and the user resends.
    pub async fn send_message(&self, text: &str, agent: Option<&str>) -> Result<(), ApiError> {
        let resp = self
            .with_auth(self.http.post(self.endpoint("/messages/send")))
            .json(&SendRequest {
                message: text,
                agent,
            })
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    /// Full conversation history, oldest first.
    pub async fn history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
        let resp = self
            .with_auth(self.http.get(self.endpoint("/messages/history")))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    /// Replies produced since the last fetch.
    pub async fn pending(&self) -> Result<Vec<PendingResponse>, ApiError> {
        let resp = self
            .with_auth(self.http.get(self.endpoint("/messages/pending")))
            .send()
            .await?;
        let batch: PendingBatch = Self::check(resp).await?.json().await?;
        Ok(batch.responses)
    }

    pub async fn change_password(&self, current: &str, new: &str) -> Result<(), ApiError> {
        let resp = self
            .with_auth(self.http.post(self.endpoint("/auth/change-password")))
            .json(&ChangePasswordRequest {
                current_password: current,
                new_password: new,
            })
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    /// Cheap reachability probe.
    pub async fn health(&self) -> Result<(), ApiError> {
        let resp = self.http.get(self.endpoint("/health")).send().await?;
        Self::check(resp).await?;
        Ok(())
    }

    /// The push-channel request. The event stream authenticates through a
    /// query parameter rather than the bearer header.
    pub fn stream_request(&self) -> Result<RequestBuilder, ApiError> {
        let token = self.token.as_deref().ok_or(ApiError::MissingToken)?;
        let url = Url::parse_with_params(&self.endpoint("/messages/stream"), [("token", token)])?;
        Ok(self.http.get(url).header("Accept", "text/event-stream"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_request_carries_token_as_query() {
        let client = ApiClient::with_token("https://bot.example.com/", Some("tok123".into()));
        let req = client.stream_request().unwrap().build().unwrap();
        assert_eq!(
            req.url().as_str(),
            "https://bot.example.com/messages/stream?token=tok123"
        );
        assert_eq!(req.headers().get("Accept").unwrap(), "text/event-stream");
    }

    #[test]
    fn stream_request_requires_a_token() {
        let client = ApiClient::new("https://bot.example.com");
        assert!(matches!(
            client.stream_request(),
            Err(ApiError::MissingToken)
        ));
    }

    #[test]
    fn bearer_header_attached_when_token_present() {
        let client = ApiClient::with_token("https://bot.example.com", Some("tok".into()));
        let req = client
            .with_auth(client.http.get(client.endpoint("/messages/history")))
            .build()
            .unwrap();
        assert_eq!(req.headers().get("Authorization").unwrap(), "Bearer tok");
    }

    #[test]
    fn no_bearer_header_without_token() {
        let client = ApiClient::new("https://bot.example.com");
        let req = client
            .with_auth(client.http.get(client.endpoint("/messages/history")))
            .build()
            .unwrap();
        assert!(req.headers().get("Authorization").is_none());
    }

    #[test]
    fn trailing_slash_is_trimmed_from_the_base_url() {
        let client = ApiClient::new("https://bot.example.com/");
        assert_eq!(
            client.endpoint("/messages/send"),
            "https://bot.example.com/messages/send"
        );
    }

    #[test]
    fn only_401_and_403_are_auth_failures() {
        assert!(ApiError::Unauthorized(401).is_auth_failure());
        assert!(ApiError::Unauthorized(403).is_auth_failure());
        assert!(
            !ApiError::Server {
                status: 500,
                detail: "boom".into()
            }
            .is_auth_failure()
        );
        assert!(!ApiError::MissingToken.is_auth_failure());
    }
}
