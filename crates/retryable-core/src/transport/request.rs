//! Description of an outbound call.

use anyhow::{Context, Result};
use url::Url;

/// Method, URL and extra headers of a call. Cheap to clone; retries reuse it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub headers: Vec<(String, String)>,
}

impl Request {
    pub fn new(method: impl Into<String>, url: Url) -> Self {
        Self {
            method: method.into(),
            url,
            headers: Vec::new(),
        }
    }

    /// A GET request for the given URL string.
    pub fn get(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).with_context(|| format!("invalid request URL: {url}"))?;
        match parsed.scheme() {
            "http" | "https" => Ok(Self::new("GET", parsed)),
            other => anyhow::bail!("unsupported URL scheme {other:?} in {url}"),
        }
    }

    /// Add a header (kept in insertion order; duplicates are allowed).
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Parse a `Name: value` header argument and add it.
    pub fn with_raw_header(self, raw: &str) -> Result<Self> {
        let (name, value) = raw
            .split_once(':')
            .with_context(|| format!("header must look like 'Name: value', got {raw:?}"))?;
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("empty header name in {raw:?}");
        }
        Ok(self.with_header(name, value.trim()))
    }
}
