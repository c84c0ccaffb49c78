//! Declarative request matching.
//!
//! A [`MatchSpec`] describes the requests an adapter claims: an exact path, an
//! HTTP method and a set of required header values. Every condition must hold
//! for a request to match.

use std::fmt;

use axum::http::{HeaderName, HeaderValue, Method, header};

use super::request::WebhookRequest;

/// Matching specification for one provider adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSpec {
    method: Method,
    path: String,
    headers: Vec<(HeaderName, String)>,
}

impl MatchSpec {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
        }
    }

    /// Matches `POST` requests on `path`.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Requires `name` to carry `value`.
    ///
    /// Values compare ASCII case-insensitively. For `Content-Type` only the
    /// media type is compared, so `application/json; charset=utf-8` satisfies
    /// a requirement of `application/json`.
    pub fn header(mut self, name: HeaderName, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn content_type(self, value: impl Into<String>) -> Self {
        self.header(header::CONTENT_TYPE, value)
    }

    pub fn user_agent(self, value: impl Into<String>) -> Self {
        self.header(header::USER_AGENT, value)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn required_headers(&self) -> &[(HeaderName, String)] {
        &self.headers
    }

    /// Returns true when every condition holds for `request`.
    pub fn matches(&self, request: &WebhookRequest) -> bool {
        if *request.method() != self.method || request.path() != self.path {
            return false;
        }

        self.headers.iter().all(|(name, expected)| {
            request
                .headers()
                .get_all(name)
                .iter()
                .any(|actual| header_matches(name, expected, actual))
        })
    }
}

impl fmt::Display for MatchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)?;
        for (name, value) in &self.headers {
            write!(f, " [{}: {}]", name, value)?;
        }
        Ok(())
    }
}

fn header_matches(name: &HeaderName, expected: &str, actual: &HeaderValue) -> bool {
    let Ok(actual) = actual.to_str() else {
        return false;
    };

    if *name == header::CONTENT_TYPE {
        media_type(actual).eq_ignore_ascii_case(media_type(expected))
    } else {
        actual.trim().eq_ignore_ascii_case(expected.trim())
    }
}

fn media_type(value: &str) -> &str {
    value.split(';').next().unwrap_or_default().trim()
}
