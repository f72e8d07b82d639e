//! Transport Abstraction
//!
//! Provider-agnostic interface to the payment API. The response cache only
//! ever talks to an `ApiTransport`, so the HTTP client can be swapped for a
//! scripted one in tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// HTTP method of an outbound request
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
}

impl Method {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Everything that identifies an outbound request
///
/// Two descriptors that compare equal always map to the same `CacheKey`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<Value>,
}

impl RequestDescriptor {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn post_json(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: BTreeMap::from([("Content-Type".into(), "application/json".into())]),
            body: Some(body),
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::from_request(self)
    }
}

/// Deterministic identifier of a request's target and parameters
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key from method, URL, headers (sorted) and body
    pub fn from_request(request: &RequestDescriptor) -> Self {
        let mut key = format!("{} {}", request.method.as_str(), request.url);
        for (name, value) in &request.headers {
            key.push('\n');
            key.push_str(&name.to_lowercase());
            key.push(':');
            key.push_str(value);
        }
        if let Some(body) = &request.body {
            // Value's Display is compact JSON; object keys are ordered
            key.push('\n');
            key.push_str(&body.to_string());
        }
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transport trait (Strategy pattern)
///
/// Implementations perform exactly one outbound request per call and never
/// retry. Non-success statuses surface as `CheckoutError::HttpStatus`.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Execute a request and decode its JSON body
    async fn execute(&self, request: &RequestDescriptor) -> Result<Value>;

    /// Transport name, for logs
    fn name(&self) -> &str;
}
