//! Provider 공용 HTTP 클라이언트.
//!
//! 모든 HTTP 기반 어댑터가 공유하는 규칙:
//! - 전송 오류/5xx/429는 `RetryPolicy::max_attempts`까지 재시도
//! - 모든 시도는 Provider의 `RequestBudget`을 1건 소모
//! - 예산이 소진되면 이번 실행 동안 `BudgetExhausted`로 즉시 실패

use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ProviderError, Result};

/// 응답 본문을 오류 메시지에 포함할 때의 최대 길이.
const ERROR_BODY_PREVIEW: usize = 200;

/// 재시도 정책.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 최대 시도 횟수 (최초 시도 포함)
    pub max_attempts: u32,
    /// 시도 간 대기 시간
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}

/// 실행당 요청 예산.
///
/// 여러 어댑터가 같은 Provider 키를 공유하면 예산도 공유합니다.
#[derive(Debug)]
pub struct RequestBudget {
    limit: u32,
    used: AtomicU32,
}

impl RequestBudget {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            used: AtomicU32::new(0),
        }
    }

    /// 요청 1건을 예약합니다. 한도에 도달했으면 `false`.
    pub fn try_acquire(&self) -> bool {
        self.used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                (used < self.limit).then_some(used + 1)
            })
            .is_ok()
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn used(&self) -> u32 {
        self.used.load(Ordering::SeqCst)
    }

    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.used())
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// 새 실행을 위해 사용량을 0으로 되돌립니다.
    pub fn reset(&self) {
        self.used.store(0, Ordering::SeqCst);
    }
}

/// HTTP 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// 요청 타임아웃
    pub timeout: Duration,
    /// 재시도 정책
    pub retry: RetryPolicy,
    /// 실행당 요청 한도
    pub request_budget: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            request_budget: 100,
        }
    }
}

/// 예산을 소모하며 `op`를 재시도 정책에 따라 실행합니다.
pub async fn with_retry<T, F, Fut>(
    provider: &'static str,
    retry: &RetryPolicy,
    budget: &RequestBudget,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = retry.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        if !budget.try_acquire() {
            return Err(ProviderError::BudgetExhausted {
                provider,
                limit: budget.limit(),
            });
        }

        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                warn!(
                    provider,
                    attempt,
                    max_attempts,
                    error = %e,
                    "요청 실패, 재시도"
                );
                tokio::time::sleep(retry.delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Provider 하나에 대응하는 HTTP 클라이언트.
///
/// `Clone`은 내부 커넥션 풀과 예산을 공유합니다.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    provider: &'static str,
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
    budget: Arc<RequestBudget>,
}

impl ProviderClient {
    /// 새 클라이언트를 생성합니다.
    pub fn new(
        provider: &'static str,
        base_url: impl Into<String>,
        settings: &ClientSettings,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| ProviderError::from_reqwest(provider, e))?;

        Ok(Self {
            provider,
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry: settings.retry.clone(),
            budget: Arc::new(RequestBudget::new(settings.request_budget)),
        })
    }

    pub fn provider(&self) -> &'static str {
        self.provider
    }

    pub fn budget(&self) -> &RequestBudget {
        &self.budget
    }

    /// GET 요청 후 JSON 본문을 역직렬화합니다.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);

        let body = with_retry(self.provider, &self.retry, &self.budget, || {
            self.send(&url, query, headers)
        })
        .await?;

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::parse(
                self.provider,
                format!("{} (본문: {})", e, preview(&body)),
            )
        })
    }

    async fn send(&self, url: &str, query: &[(&str, &str)], headers: &[(&str, &str)]) -> Result<String> {
        debug!(provider = self.provider, url = %url, "Provider 요청");

        let mut request = self
            .http
            .get(url)
            .query(query)
            .header(reqwest::header::ACCEPT, "application/json");
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(self.provider, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::from_reqwest(self.provider, e))?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: self.provider,
                status: status.as_u16(),
                body: preview(&body),
            });
        }

        Ok(body)
    }
}

fn preview(body: &str) -> String {
    signal_core::truncate_chars(body, ERROR_BODY_PREVIEW)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn settings(budget: u32) -> ClientSettings {
        ClientSettings {
            timeout: Duration::from_secs(5),
            retry: RetryPolicy {
                max_attempts: 3,
                delay: Duration::from_millis(1),
            },
            request_budget: budget,
        }
    }

    #[test]
    fn test_budget_stops_at_limit() {
        let budget = RequestBudget::new(2);
        assert!(budget.try_acquire());
        assert!(budget.try_acquire());
        assert!(!budget.try_acquire());
        assert!(budget.is_exhausted());
        assert_eq!(budget.used(), 2);
    }

    #[test]
    fn test_budget_reset_restores_limit() {
        let budget = RequestBudget::new(1);
        assert!(budget.try_acquire());
        assert!(!budget.try_acquire());

        budget.reset();
        assert_eq!(budget.remaining(), 1);
        assert!(budget.try_acquire());
    }

    #[tokio::test]
    async fn test_retries_server_errors_then_succeeds() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("GET", "/data")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let client = ProviderClient::new("test", server.url(), &settings(10)).unwrap();
        let result: Result<Value> = client.get_json("/data", &[], &[]).await;

        // 3번 시도 모두 503 → 최종 실패, 예산 3건 소모
        assert!(matches!(result, Err(ProviderError::Status { status: 503, .. })));
        assert_eq!(client.budget().used(), 3);
        failing.assert_async().await;
        failing.remove_async().await;

        let ok = server
            .mock("GET", "/data")
            .with_status(200)
            .with_body(r#"{"ok": true}"#)
            .create_async()
            .await;
        let value: Value = client.get_json("/data", &[], &[]).await.unwrap();
        assert_eq!(value["ok"], true);
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let client = ProviderClient::new("test", server.url(), &settings(10)).unwrap();
        let result: Result<Value> = client.get_json("/missing", &[], &[]).await;

        assert!(matches!(result, Err(ProviderError::Status { status: 404, .. })));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_budget_exhaustion_short_circuits() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/quote")
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        let client = ProviderClient::new("test", server.url(), &settings(1)).unwrap();
        let _: Value = client.get_json("/quote", &[], &[]).await.unwrap();
        let second: Result<Value> = client.get_json("/quote", &[], &[]).await;

        assert!(matches!(
            second,
            Err(ProviderError::BudgetExhausted { limit: 1, .. })
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unroutable_host_is_transport_error() {
        let client = ProviderClient::new("test", "http://127.0.0.1:1", &settings(10)).unwrap();
        let result: Result<Value> = client.get_json("/", &[], &[]).await;

        assert!(matches!(result, Err(ProviderError::Transport { .. })));
        assert_eq!(client.budget().used(), 3);
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/broken")
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let client = ProviderClient::new("test", server.url(), &settings(10)).unwrap();
        let result: Result<Value> = client.get_json("/broken", &[], &[]).await;

        assert!(matches!(result, Err(ProviderError::Parse { .. })));
    }
}
