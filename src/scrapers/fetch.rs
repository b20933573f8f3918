use crate::errors::{Result, SectorHubError};
use crate::scrapers::base::{HttpResponse, HttpTransport};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use std::time::Duration;

/// 基于 reqwest 的传输实现
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sectorhub/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SectorHubError::RequestError)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

/// 单次请求的重试策略：可重试状态码失败后等待一次再试
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub retry_statuses: Vec<u16>,
    pub delay: Duration,
}

impl RetryPolicy {
    /// 列表页：503 和 400 都可重试
    pub fn screener(delay: Duration) -> Self {
        Self { retry_statuses: vec![503, 400], delay }
    }

    /// 资料页：只有 503 可重试
    pub fn profile(delay: Duration) -> Self {
        Self { retry_statuses: vec![503], delay }
    }

    pub fn is_retryable(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success {
        body: String,
        retries: u32,
    },
    Failure {
        status: Option<u16>,
        message: String,
        retries: u32,
    },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }

    pub fn retries(&self) -> u32 {
        match self {
            FetchOutcome::Success { retries, .. } | FetchOutcome::Failure { retries, .. } => *retries,
        }
    }
}

pub(crate) fn describe_status(status: u16) -> String {
    let reason = reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown");
    let kind = if status >= 500 { "Server Error" } else { "Client Error" };
    format!("{} {}: {}", status, kind, reason)
}

/// 两次机会的请求：首次遇到可重试状态码时等待 `policy.delay` 后重试，
/// 第二次失败即放弃。不可重试的状态码和连接错误直接返回失败。
pub async fn fetch_with_retry(
    transport: &dyn HttpTransport,
    url: &str,
    policy: &RetryPolicy,
) -> FetchOutcome {
    let mut retries = 0;

    loop {
        let response = match transport.get(url).await {
            Ok(response) => response,
            Err(e) => {
                return FetchOutcome::Failure {
                    status: None,
                    message: format!("Request failed. Error was \"{}\"", e),
                    retries,
                };
            }
        };

        if response.is_success() {
            debug!("GET {} succeeded after {} retries", url, retries);
            return FetchOutcome::Success { body: response.body, retries };
        }

        let status = response.status;
        if !policy.is_retryable(status) {
            return FetchOutcome::Failure {
                status: Some(status),
                message: format!("Unexpected error. Error was \"{}\"", describe_status(status)),
                retries,
            };
        }

        if retries > 0 {
            return FetchOutcome::Failure {
                status: Some(status),
                message: format!("Back to back retryable errors. Error was \"{}\"", describe_status(status)),
                retries,
            };
        }

        warn!(
            "{}. Trying again in {:?}. If it fails again the request is abandoned.",
            describe_status(status),
            policy.delay
        );
        tokio::time::sleep(policy.delay).await;
        retries += 1;
    }
}
