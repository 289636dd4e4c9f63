// Gateway client - the single choke point for backend calls
//
// Every request picks up the stored credential at dispatch time. Every response
// passes through `execute`, which turns a 401 into a cleared credential plus an
// `AuthRejected` event before the caller sees the error.

pub mod credentials;
pub mod rejection;

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::config::ApiConfig;
use crate::error::GatewayError;

pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use rejection::{AuthRejected, ListenerBox, RejectionListener};

pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
    listeners: RwLock<Vec<ListenerBox>>,
}

impl GatewayClient {
    pub fn new(api: &ApiConfig, credentials: Arc<dyn CredentialStore>) -> Result<Self, GatewayError> {
        let base_url = resolve_base_url(&api.base_url(), &api.origin)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.request_timeout_secs))
            .build()
            .map_err(GatewayError::Transport)?;

        tracing::debug!("Gateway base address resolved to {}", base_url);

        Ok(Self {
            http,
            base_url,
            credentials,
            listeners: RwLock::new(Vec::new()),
        })
    }

    /// Absolute API base, always ending in the `/api` prefix
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Register a listener for authentication rejections
    pub fn subscribe(&self, listener: ListenerBox) {
        match self.listeners.write() {
            Ok(mut listeners) => listeners.push(listener),
            Err(_) => tracing::error!("Rejection listener registry poisoned; listener dropped"),
        }
    }

    /// Full URL for an API path such as `/child/list`
    pub fn url(&self, path: &str) -> Result<Url, GatewayError> {
        let joined = if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        };
        Url::parse(&joined).map_err(|e| GatewayError::InvalidUrl(format!("{}: {}", joined, e)))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let builder = self.prepare(Method::GET, path)?;
        self.execute(Method::GET, path, builder).await
    }

    pub async fn get_with<Q, T>(&self, path: &str, query: &Q) -> Result<T, GatewayError>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.prepare(Method::GET, path)?.query(query);
        self.execute(Method::GET, path, builder).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.prepare(Method::POST, path)?.json(body);
        self.execute(Method::POST, path, builder).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.prepare(Method::PUT, path)?.json(body);
        self.execute(Method::PUT, path, builder).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let builder = self.prepare(Method::DELETE, path)?;
        self.execute(Method::DELETE, path, builder).await
    }

    /// Build a request with the credential attached, if one is stored.
    ///
    /// The credential is read exactly once; a value that cannot form a header
    /// aborts the request instead of sending it without authorization.
    fn prepare(&self, method: Method, path: &str) -> Result<RequestBuilder, GatewayError> {
        let url = self.url(path)?;
        let mut builder = self.http.request(method, url);

        if let Some(token) = self.credentials.get() {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| GatewayError::MalformedCredential)?;
            builder = builder.header(AUTHORIZATION, value);
        }

        Ok(builder)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<T, GatewayError> {
        tracing::debug!("{} {}", method, path);

        let response = builder.send().await.map_err(|e| {
            tracing::debug!("{} {} failed without a response: {}", method, path, e);
            GatewayError::Transport(e)
        })?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.reject(&method, path);
            let body = error_body(&method, path, response).await;
            return Err(GatewayError::from_response(status, &body));
        }

        if !status.is_success() {
            let body = error_body(&method, path, response).await;
            let error = GatewayError::from_response(status, &body);
            tracing::debug!("{} {} returned {}: {}", method, path, status, error);
            return Err(error);
        }

        let bytes = response.bytes().await.map_err(GatewayError::Transport)?;
        let body: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
        serde_json::from_slice(body).map_err(|e| GatewayError::Decode(e.to_string()))
    }

    /// Clear the credential and notify listeners; runs once per 401 response
    fn reject(&self, method: &Method, path: &str) {
        let cleared_credential = self.credentials.clear();
        tracing::warn!(
            "Credential rejected by {} {} (cleared: {})",
            method,
            path,
            cleared_credential
        );

        let event = AuthRejected {
            method: method.clone(),
            path: path.to_string(),
            cleared_credential,
        };

        // Snapshot so listeners may subscribe further listeners without deadlocking
        let listeners: Vec<ListenerBox> = match self.listeners.read() {
            Ok(listeners) => listeners.clone(),
            Err(_) => Vec::new(),
        };
        for listener in &listeners {
            listener.on_rejected(&event);
        }
    }
}

/// Body of a failed response; an unreadable body is logged and read as empty
async fn error_body(method: &Method, path: &str, response: reqwest::Response) -> String {
    match response.text().await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!("{} {} error body unreadable: {}", method, path, e);
            String::new()
        }
    }
}

/// Resolve a normalized base against the configured origin when it is relative
pub fn resolve_base_url(base: &str, origin: &str) -> Result<String, GatewayError> {
    let url = if base.starts_with("http://") || base.starts_with("https://") {
        Url::parse(base)
    } else {
        Url::parse(origin).and_then(|origin| origin.join(base))
    }
    .map_err(|e| GatewayError::InvalidUrl(format!("{}: {}", base, e)))?;

    Ok(url.as_str().trim_end_matches('/').to_string())
}
