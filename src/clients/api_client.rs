use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::clients::{ApiError, ApiResult};
use crate::config::Config;
use crate::models::{
    ChangePasswordRequest, CreateDocRequest, DocumentDetail, DocumentSummary, ErrorResponse,
    LoginRequest, LoginResponse, RegisterRequest, Session, ShareRequest, UpdateProfileRequest,
    UserProfile, VersionSnapshot,
};

/// Options of a single API request
#[derive(Debug, Clone)]
pub struct RequestOptions<'a> {
    pub method: Method,
    pub body: Option<Value>,
    pub token: Option<&'a str>,
}

impl<'a> RequestOptions<'a> {
    pub fn get(token: Option<&'a str>) -> Self {
        Self {
            method: Method::GET,
            body: None,
            token,
        }
    }

    pub fn with_method(method: Method, token: Option<&'a str>) -> Self {
        Self {
            method,
            body: None,
            token,
        }
    }

    pub fn json(mut self, body: &impl Serialize) -> ApiResult<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::UnexpectedPayload(format!("request body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }
}

/// Decoded body of a successful call. Empty or non-JSON bodies decode to `Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub data: Value,
    pub message: String,
}

/// Result of a call whose body carries nothing we need
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub message: String,
}

/// Client of the collaboration HTTP API
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| {
                warn!("Failed to build HTTP client: {}", e);
                ApiError::Network
            })?;
        Ok(Self::new(config.api_base_url.clone(), client))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The one primitive every endpoint goes through.
    ///
    /// Never retries, never caches. Attaches a bearer header when a token is given.
    pub async fn request(&self, path: &str, opts: RequestOptions<'_>) -> ApiResult<Payload> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", opts.method, path);

        let mut builder = self
            .client
            .request(opts.method.clone(), &url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(token) = opts.token {
            builder = builder.header(reqwest::header::AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(body) = &opts.body {
            builder = builder.body(body.to_string());
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("{} {} failed: {}", opts.method, path, e);
                return Err(ApiError::Network);
            }
        };

        let status = response.status();
        // Some endpoints answer with no body at all, that is not an error
        let data = match response.bytes().await {
            Ok(bytes) => serde_json::from_slice::<Value>(&bytes).unwrap_or(Value::Null),
            Err(e) => {
                debug!("Could not read body of {} {}: {}", opts.method, path, e);
                Value::Null
            }
        };

        if !status.is_success() {
            let message = serde_json::from_value::<ErrorResponse>(data)
                .ok()
                .and_then(|err| err.best_message().map(str::to_string))
                .unwrap_or_else(|| format!("Request failed (HTTP {})", status.as_u16()));
            warn!("{} {} returned {}: {}", opts.method, path, status.as_u16(), message);
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let message = data
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Success")
            .to_string();
        Ok(Payload { data, message })
    }

    /* -----------------------------
       User endpoints
    ------------------------------ */

    pub async fn register(&self, req: &RegisterRequest) -> ApiResult<Ack> {
        let opts = RequestOptions::with_method(Method::POST, None).json(req)?;
        self.request("/users/register", opts).await.map(ack)
    }

    pub async fn login(&self, req: &LoginRequest) -> ApiResult<Session> {
        let opts = RequestOptions::with_method(Method::POST, None).json(req)?;
        let res: LoginResponse = decode(self.request("/users/login", opts).await?)?;
        Ok(Session::from(res))
    }

    pub async fn me(&self, token: &str) -> ApiResult<UserProfile> {
        decode(self.request("/users/me", RequestOptions::get(Some(token))).await?)
    }

    pub async fn update_profile(&self, token: &str, email: &str) -> ApiResult<UserProfile> {
        let body = UpdateProfileRequest {
            email: email.to_string(),
        };
        let opts = RequestOptions::with_method(Method::PUT, Some(token)).json(&body)?;
        decode(self.request("/users/me", opts).await?)
    }

    pub async fn change_password(
        &self,
        token: &str,
        current_password: &str,
        new_password: &str,
    ) -> ApiResult<Ack> {
        let body = ChangePasswordRequest {
            current_password: current_password.to_string(),
            new_password: new_password.to_string(),
        };
        let opts = RequestOptions::with_method(Method::PUT, Some(token)).json(&body)?;
        self.request("/users/me/password", opts).await.map(ack)
    }

    pub async fn delete_account(&self, token: &str) -> ApiResult<Ack> {
        let opts = RequestOptions::with_method(Method::DELETE, Some(token));
        self.request("/users/me", opts).await.map(ack)
    }

    /* -----------------------------
       Document endpoints
    ------------------------------ */

    pub async fn list_documents(&self, token: &str) -> ApiResult<Vec<DocumentSummary>> {
        decode_or_default(self.request("/docs", RequestOptions::get(Some(token))).await?)
    }

    pub async fn create_document(
        &self,
        token: &str,
        title: &str,
        content: &str,
    ) -> ApiResult<Option<DocumentDetail>> {
        let body = CreateDocRequest {
            title: title.to_string(),
            content: content.to_string(),
        };
        let opts = RequestOptions::with_method(Method::POST, Some(token)).json(&body)?;
        decode_or_default(self.request("/docs", opts).await?)
    }

    pub async fn get_document(&self, token: &str, doc_id: Uuid) -> ApiResult<DocumentDetail> {
        let path = format!("/docs/{}", doc_id);
        decode(self.request(&path, RequestOptions::get(Some(token))).await?)
    }

    pub async fn update_document(
        &self,
        token: &str,
        doc_id: Uuid,
        title: &str,
        content: &str,
    ) -> ApiResult<Option<DocumentDetail>> {
        let body = CreateDocRequest {
            title: title.to_string(),
            content: content.to_string(),
        };
        let path = format!("/docs/{}", doc_id);
        let opts = RequestOptions::with_method(Method::PUT, Some(token)).json(&body)?;
        decode_or_default(self.request(&path, opts).await?)
    }

    pub async fn delete_document(&self, token: &str, doc_id: Uuid) -> ApiResult<Ack> {
        let path = format!("/docs/{}", doc_id);
        let opts = RequestOptions::with_method(Method::DELETE, Some(token));
        self.request(&path, opts).await.map(ack)
    }

    pub async fn share_document(
        &self,
        token: &str,
        doc_id: Uuid,
        collaborator_username: &str,
    ) -> ApiResult<Ack> {
        let body = ShareRequest {
            collaborator_username: collaborator_username.to_string(),
        };
        let path = format!("/docs/{}/share", doc_id);
        let opts = RequestOptions::with_method(Method::POST, Some(token)).json(&body)?;
        self.request(&path, opts).await.map(ack)
    }

    pub async fn revoke_access(
        &self,
        token: &str,
        doc_id: Uuid,
        collaborator_username: &str,
    ) -> ApiResult<Ack> {
        let path = format!("/docs/{}/share/{}", doc_id, path_segment(collaborator_username));
        let opts = RequestOptions::with_method(Method::DELETE, Some(token));
        self.request(&path, opts).await.map(ack)
    }

    /* -----------------------------
       Version endpoints
    ------------------------------ */

    pub async fn document_versions(
        &self,
        token: &str,
        doc_id: Uuid,
    ) -> ApiResult<Vec<VersionSnapshot>> {
        let path = format!("/docs/{}/versions", doc_id);
        decode_or_default(self.request(&path, RequestOptions::get(Some(token))).await?)
    }

    pub async fn get_version(
        &self,
        token: &str,
        doc_id: Uuid,
        version_id: i64,
    ) -> ApiResult<VersionSnapshot> {
        let path = format!("/docs/{}/versions/{}", doc_id, version_id);
        decode(self.request(&path, RequestOptions::get(Some(token))).await?)
    }

    pub async fn save_snapshot(&self, token: &str, doc_id: Uuid) -> ApiResult<Ack> {
        let path = format!("/docs/{}/snapshot", doc_id);
        let opts = RequestOptions::with_method(Method::POST, Some(token));
        self.request(&path, opts).await.map(ack)
    }
}

fn ack(payload: Payload) -> Ack {
    Ack {
        message: payload.message,
    }
}

fn decode<T: DeserializeOwned>(payload: Payload) -> ApiResult<T> {
    serde_json::from_value(payload.data).map_err(|e| {
        warn!("Unexpected response payload: {}", e);
        ApiError::UnexpectedPayload(e.to_string())
    })
}

/// Like `decode`, but an empty body yields the default value
fn decode_or_default<T: DeserializeOwned + Default>(payload: Payload) -> ApiResult<T> {
    if payload.data.is_null() {
        return Ok(T::default());
    }
    decode(payload)
}

/// Percent-encode a single path segment
fn path_segment(raw: &str) -> String {
    match url::Url::parse("http://localhost/") {
        Ok(mut url) => {
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.push(raw);
            }
            url.path().trim_start_matches('/').to_string()
        }
        Err(_) => raw.to_string(),
    }
}
