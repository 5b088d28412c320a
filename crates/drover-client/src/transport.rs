//! Request construction and the blocking transport implementation.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, SET_COOKIE};
use reqwest::Method;
use serde_json::Value;
use thiserror::Error;

use drover_core::get_path_string;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = "drover-harness/0.1";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid header '{name}': {detail}")]
    InvalidHeader { name: String, detail: String },
}

/// One request to the remote service. Endpoint paths are relative to the
/// transport's base URL; `{key}` and `:key` placeholders are substituted from
/// `path_params`.
#[derive(Debug, Clone)]
pub struct ApiCall {
    pub method: Method,
    pub endpoint: String,
    pub body: Option<Value>,
    pub path_params: Vec<(String, String)>,
    pub query_params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub cookie: Option<String>,
}

impl ApiCall {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            body: None,
            path_params: Vec::new(),
            query_params: Vec::new(),
            headers: Vec::new(),
            cookie: None,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, endpoint).with_body(body)
    }

    pub fn put(endpoint: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, endpoint).with_body(body)
    }

    pub fn patch(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PATCH, endpoint)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_path_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push((key.into(), value.into()));
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((key.into(), value.into()));
        self
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }
}

/// Transport-level result of one call. `success` folds together HTTP-level
/// success and the body-level success flag; `set_cookies` carries the
/// `name=value` pairs the server asked to set, for the auth exchange.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub status_code: u16,
    pub body: Value,
    pub success: bool,
    pub set_cookies: Vec<String>,
}

impl CallOutcome {
    /// Joins the server-set cookie pairs into a `Cookie` header value.
    pub fn cookie_header(&self) -> Option<String> {
        if self.set_cookies.is_empty() {
            None
        } else {
            Some(self.set_cookies.join("; "))
        }
    }

    /// First failure message the service attached to the response, if any.
    pub fn error_message(&self) -> Option<String> {
        get_path_string(&self.body, "failed_entries.0.message")
    }
}

/// Seam between workflow code and the wire. Implemented by [`HttpClient`] for
/// real runs and by in-memory stubs in tests.
pub trait ApiTransport {
    fn execute(&self, call: ApiCall) -> Result<CallOutcome, TransportError>;
}

/// Blocking HTTP client with the harness's default headers and timeout.
#[derive(Debug)]
pub struct HttpClient {
    base_url: String,
    client: Client,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }
}

impl ApiTransport for HttpClient {
    fn execute(&self, call: ApiCall) -> Result<CallOutcome, TransportError> {
        let url = build_url(&self.base_url, &call.endpoint, &call.path_params);
        let headers = build_headers(&call.headers, call.cookie.as_deref())?;
        tracing::debug!(method = %call.method, %url, "api request");

        let mut request = self
            .client
            .request(call.method.clone(), &url)
            .headers(headers);
        if !call.query_params.is_empty() {
            request = request.query(&call.query_params);
        }
        if let Some(body) = &call.body {
            request = request.json(body);
        }

        let response = request.send()?;
        let status_code = response.status().as_u16();
        let set_cookies = collect_set_cookies(response.headers());
        let text = response.text().unwrap_or_default();
        let body = parse_body(&text);
        let success = (200..300).contains(&status_code) && body_reports_success(&body);
        tracing::debug!(status_code, success, "api response");

        Ok(CallOutcome {
            status_code,
            body,
            success,
            set_cookies,
        })
    }
}

/// Joins the base URL and endpoint, then substitutes `{key}`/`:key` path
/// placeholders.
pub fn build_url(base_url: &str, endpoint: &str, path_params: &[(String, String)]) -> String {
    let mut url = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    );
    for (key, value) in path_params {
        url = url.replace(&format!("{{{key}}}"), value);
        url = url.replace(&format!(":{key}"), value);
    }
    url
}

fn build_headers(
    extra: &[(String, String)],
    cookie: Option<&str>,
) -> Result<HeaderMap, TransportError> {
    let mut headers = HeaderMap::new();
    headers.insert("Content-Type", HeaderValue::from_static("application/json"));
    headers.insert("Accept", HeaderValue::from_static("application/json"));
    headers.insert("User-Agent", HeaderValue::from_static(USER_AGENT));

    if let Some(cookie) = cookie {
        let value = HeaderValue::from_str(cookie).map_err(|error| {
            TransportError::InvalidHeader {
                name: "Cookie".to_string(),
                detail: error.to_string(),
            }
        })?;
        headers.insert("Cookie", value);
    }

    for (name, value) in extra {
        let name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|error| {
                TransportError::InvalidHeader {
                    name: name.clone(),
                    detail: error.to_string(),
                }
            })?;
        let value = HeaderValue::from_str(value).map_err(|error| TransportError::InvalidHeader {
            name: name.to_string(),
            detail: error.to_string(),
        })?;
        headers.insert(name, value);
    }
    Ok(headers)
}

fn collect_set_cookies(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|raw| raw.split(';').next())
        .map(|pair| pair.trim().to_string())
        .filter(|pair| !pair.is_empty())
        .collect()
}

fn parse_body(text: &str) -> Value {
    if text.is_empty() {
        return Value::Object(serde_json::Map::new());
    }
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::json!({ "raw_response": text }))
}

/// Body-level success flag: a boolean `success` field, or one of the truthy
/// string spellings some endpoints answer with. One rule for every endpoint.
pub fn body_reports_success(body: &Value) -> bool {
    match body.get("success") {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(text)) => {
            matches!(text.to_lowercase().as_str(), "true" | "1" | "yes" | "success")
        }
        _ => false,
    }
}
