//! Minimal ArchivesSpace HTTP client
//!
//! Holds the session token from `login` and sends it with every request.
//! Calls are issued one at a time; nothing here retries.

use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;
use reqwest::Client;
use serde_json::Value;

use super::error::ApiError;

const SESSION_HEADER: &str = "X-ArchivesSpace-Session";

/// Authenticated connection to the ArchivesSpace backend API
#[derive(Debug, Clone)]
pub struct ArchivesSpaceClient {
    http: Client,
    base_url: String,
    session: Option<String>,
}

impl ArchivesSpaceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Log in and keep the session token for later calls
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), ApiError> {
        let url = format!(
            "{}/users/{}/login?password={}",
            self.base_url,
            urlencoding::encode(username),
            urlencoding::encode(password)
        );
        // Never log the password-bearing URL
        let display_url = format!("{}/users/{}/login", self.base_url, username);

        let response = self
            .http
            .post(&url)
            .send()
            .await
            .map_err(|e| ApiError::transport(&display_url, &e.without_url()))?;

        let json = read_json(&display_url, response).await?;
        let token = json
            .get("session")
            .and_then(|s| s.as_str())
            .ok_or_else(|| ApiError::decode(&display_url, "login response has no session token"))?;

        self.session = Some(token.to_string());
        debug!("Login successful: {}", self.base_url);
        Ok(())
    }

    /// GET a path (relative to the API root) and decode the JSON body
    pub async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let url = self.url(path);
        debug!("GET {}", url);
        let response = self
            .authorized(self.http.get(&url))
            .send()
            .await
            .map_err(|e| ApiError::transport(&url, &e))?;
        read_json(&url, response).await
    }

    /// POST a JSON body to a path and decode the JSON response
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let url = self.url(path);
        debug!("POST {}", url);
        let response = self
            .authorized(self.http.post(&url))
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::transport(&url, &e))?;
        read_json(&url, response).await
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.session {
            Some(token) => request.header(SESSION_HEADER, token),
            None => request,
        }
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

async fn read_json(url: &str, response: reqwest::Response) -> Result<Value, ApiError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ApiError::transport(url, &e))?;

    if !status.is_success() {
        return Err(ApiError::from_response(url, status.as_u16(), &body));
    }

    serde_json::from_str(&body).map_err(|e| ApiError::decode(url, e.to_string()))
}
