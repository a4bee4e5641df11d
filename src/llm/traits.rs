//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / Mock / Scripted）实现 LlmClient::complete（非流式）。
//! RetryingLlmClient 为任意后端加上单次请求超时与指数退避重试。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::memory::Message;

/// LLM 调用错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Request(String),

    #[error("LLM request timed out after {0:?}")]
    Timeout(Duration),

    /// 请求本身不合法（构造失败、无可用回复等），重试无意义
    #[error("Invalid LLM request: {0}")]
    InvalidRequest(String),
}

impl LlmError {
    /// 网络错误与超时可重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Request(_) | LlmError::Timeout(_))
    }
}

/// LLM 客户端 trait：system 消息承载指令，user/assistant 消息承载内容与历史
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 非流式完成
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}

/// 重试配置
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// 首次失败后的最大重试次数
    pub max_retries: u32,
    /// 首次重试前的等待时间，之后每次翻倍
    pub initial_backoff: Duration,
    /// 退避上限
    pub max_backoff: Duration,
    /// 单次请求超时
    pub request_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// 带超时与重试的 LLM 客户端装饰器
pub struct RetryingLlmClient {
    inner: Arc<dyn LlmClient>,
    config: RetryConfig,
}

impl RetryingLlmClient {
    pub fn new(inner: Arc<dyn LlmClient>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl LlmClient for RetryingLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        let mut attempt = 0u32;
        loop {
            let result = match tokio::time::timeout(
                self.config.request_timeout,
                self.inner.complete(messages),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(LlmError::Timeout(self.config.request_timeout)),
            };

            match result {
                Ok(content) => return Ok(content),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let backoff = self.config.backoff_for(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        "LLM call failed, retrying: {}",
                        e
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn token_usage(&self) -> (u64, u64, u64) {
        self.inner.token_usage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 前 N 次失败，之后成功
    struct FlakyClient {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmClient for FlakyClient {
        async fn complete(&self, _messages: &[Message]) -> Result<String, LlmError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(LlmError::Request("connection reset".to_string()))
            } else {
                Ok("ok".to_string())
            }
        }
    }

    struct SlowClient;

    #[async_trait]
    impl LlmClient for SlowClient {
        async fn complete(&self, _messages: &[Message]) -> Result<String, LlmError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late".to_string())
        }
    }

    fn fast_config(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
            request_timeout: Duration::from_millis(50),
        }
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let inner = Arc::new(FlakyClient {
            failures: 2,
            calls: AtomicUsize::new(0),
        });
        let client = RetryingLlmClient::new(inner.clone(), fast_config(2));
        let reply = client.complete(&[Message::user("hi")]).await;
        assert_eq!(reply, Ok("ok".to_string()));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_exhausted() {
        let inner = Arc::new(FlakyClient {
            failures: 10,
            calls: AtomicUsize::new(0),
        });
        let client = RetryingLlmClient::new(inner.clone(), fast_config(1));
        let reply = client.complete(&[Message::user("hi")]).await;
        assert!(matches!(reply, Err(LlmError::Request(_))));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_timeout() {
        let client = RetryingLlmClient::new(Arc::new(SlowClient), fast_config(0));
        let reply = client.complete(&[Message::user("hi")]).await;
        assert!(matches!(reply, Err(LlmError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_invalid_request_not_retried() {
        struct Rejecting(AtomicUsize);

        #[async_trait]
        impl LlmClient for Rejecting {
            async fn complete(&self, _messages: &[Message]) -> Result<String, LlmError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Err(LlmError::InvalidRequest("bad model".to_string()))
            }
        }

        let inner = Arc::new(Rejecting(AtomicUsize::new(0)));
        let client = RetryingLlmClient::new(inner.clone(), fast_config(3));
        let reply = client.complete(&[Message::user("hi")]).await;
        assert!(matches!(reply, Err(LlmError::InvalidRequest(_))));
        assert_eq!(inner.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_is_capped() {
        let cfg = fast_config(5);
        assert_eq!(cfg.backoff_for(0), Duration::from_millis(1));
        assert_eq!(cfg.backoff_for(1), Duration::from_millis(2));
        assert_eq!(cfg.backoff_for(10), Duration::from_millis(4));
    }
}
