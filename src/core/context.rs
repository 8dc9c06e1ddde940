//! # Execution Context Module / 执行上下文模块
//!
//! Per-run, read-only connection settings for the API under test, and the
//! request templates built from them. A single `ExecutionContext` is shared
//! (behind an `Arc`) by every concurrently running case; it is never mutated
//! after construction, so it needs no locking.
//!
//! 被测 API 的每次运行只读连接设置，以及由此构建的请求模板。
//! 单个 `ExecutionContext` 被所有并发运行的用例共享（通过 `Arc`）；
//! 构建后从不修改，因此不需要加锁。

use anyhow::{bail, Context, Result};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Default per-request timeout when the config does not set one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The `[context]` table of `Harness.toml`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ContextConfig {
    pub base_url: String,
    #[serde(default)]
    pub base_path: String,
    /// Bearer token. `$VAR`/`${VAR}` references are expanded from the
    /// environment so secrets stay out of the file.
    #[serde(default)]
    pub auth_token: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Immutable settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    base_url: String,
    base_path: String,
    auth_token: String,
    timeout: Duration,
}

impl ExecutionContext {
    /// Validates and builds a context.
    ///
    /// # Errors
    /// Fails if `base_url` is blank or `timeout_secs` is zero.
    pub fn new(
        base_url: impl Into<String>,
        base_path: impl Into<String>,
        auth_token: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            bail!("base_url must not be empty");
        }
        if timeout_secs == 0 {
            bail!("timeout_secs must be greater than zero");
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            base_path: normalize_base_path(&base_path.into()),
            auth_token: auth_token.into(),
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Builds a context from its config table, expanding environment
    /// references in the URL and the token.
    pub fn from_config(config: &ContextConfig) -> Result<Self> {
        let base_url = shellexpand::env(&config.base_url)
            .with_context(|| format!("Failed to expand base_url '{}'", config.base_url))?;
        let auth_token = shellexpand::env(&config.auth_token)
            .context("Failed to expand auth_token")?;
        Self::new(
            base_url.into_owned(),
            config.base_path.clone(),
            auth_token.into_owned(),
            config.timeout_secs,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `base_url` followed by `base_path`.
    pub fn base_uri(&self) -> String {
        format!("{}{}", self.base_url, self.base_path)
    }

    /// Produces a fresh request template carrying the bearer token, JSON
    /// content negotiation headers, the base URI and the timeout. Each test
    /// case customizes its own copy.
    ///
    /// 生成一个新的请求模板，包含 bearer 令牌、JSON 内容协商头、基础 URI 和超时。
    /// 每个测试用例定制自己的副本。
    pub fn build_request_template(&self) -> RequestTemplate {
        let template = RequestTemplate {
            method: Method::GET,
            base_uri: self.base_uri(),
            path: String::new(),
            headers: BTreeMap::new(),
            query: Vec::new(),
            body: None,
            timeout: self.timeout,
        }
        .with_header("Accept", "application/json")
        .with_header("Content-Type", "application/json");
        if self.auth_token.is_empty() {
            template
        } else {
            template.with_header("Authorization", format!("Bearer {}", self.auth_token))
        }
    }
}

fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// A request description handed to the HTTP layer. Cheap to clone; built
/// with the `with_*` methods.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestTemplate {
    method: Method,
    base_uri: String,
    path: String,
    headers: BTreeMap<String, String>,
    query: Vec<(String, String)>,
    body: Option<Value>,
    timeout: Duration,
}

impl RequestTemplate {
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Full URL: base URI plus the case path, with exactly one `/` between.
    pub fn url(&self) -> String {
        let path = self.path.trim_start_matches('/');
        if path.is_empty() {
            self.base_uri.clone()
        } else {
            format!("{}/{}", self.base_uri.trim_end_matches('/'), path)
        }
    }
}
