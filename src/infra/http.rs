//! # HTTP Client Module / HTTP 客户端模块
//!
//! A thin `reqwest` adapter that sends a `RequestTemplate` and captures the
//! response status and body. It performs no retries; a failed or timed-out
//! call is returned as an error for the caller to record.
//!
//! 一个轻量的 `reqwest` 适配器，发送 `RequestTemplate` 并捕获响应状态和正文。
//! 不进行重试；失败或超时的调用作为错误返回，由调用方记录。

use anyhow::{Context, Result};
use serde_json::Value;

use crate::core::context::{ExecutionContext, RequestTemplate};

/// Status and body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn json(&self) -> Result<Value> {
        serde_json::from_str(&self.body).context("Response body is not valid JSON")
    }
}

/// Shared HTTP client. Cloning is cheap and clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(context: &ExecutionContext) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(context.timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    pub async fn send(&self, template: &RequestTemplate) -> Result<ApiResponse> {
        let url = template.url();
        let mut request = self
            .client
            .request(template.method().clone(), &url)
            .timeout(template.timeout());
        for (name, value) in template.headers() {
            request = request.header(name.as_str(), value.as_str());
        }
        if !template.query().is_empty() {
            request = request.query(template.query());
        }
        if let Some(body) = template.body() {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("{} {} failed", template.method(), url))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {url}"))?;
        Ok(ApiResponse { status, body })
    }
}
