//! 并行检索：多源扇出 / 扇入
//!
//! 两个来源通过 tokio::join! 并发执行并在返回前汇合；同一来源的多个子查询用 join_all 并发。
//! 每次调用都有独立超时；失败、超时或格式错误的调用只记录日志并贡献空列表，不影响另一来源。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use tokio::time::timeout;

use crate::retrieval::{RetrievalError, Retriever, SearchResult, SourceType};

/// 一次扇入后的结果
#[derive(Debug, Clone, Default)]
pub struct RetrievalOutcome {
    pub internal: Vec<SearchResult>,
    pub web: Vec<SearchResult>,
}

/// 并行检索器：持有两个来源与单次调用超时
pub struct ParallelRetriever {
    internal: Arc<dyn Retriever>,
    web: Arc<dyn Retriever>,
    timeout: Duration,
}

impl ParallelRetriever {
    pub fn new(internal: Arc<dyn Retriever>, web: Arc<dyn Retriever>, timeout: Duration) -> Self {
        Self {
            internal,
            web,
            timeout,
        }
    }

    /// 对启用的来源扇出所有子查询；未启用的来源不发起调用，直接返回空列表
    pub async fn retrieve(
        &self,
        sub_queries: &[String],
        use_internal: bool,
        use_web: bool,
    ) -> RetrievalOutcome {
        let (internal, web) = tokio::join!(
            self.search_source(self.internal.as_ref(), sub_queries, use_internal),
            self.search_source(self.web.as_ref(), sub_queries, use_web),
        );
        RetrievalOutcome { internal, web }
    }

    async fn search_source(
        &self,
        retriever: &dyn Retriever,
        sub_queries: &[String],
        enabled: bool,
    ) -> Vec<SearchResult> {
        if !enabled {
            return Vec::new();
        }
        let source = retriever.source();
        let start = Instant::now();

        let calls = sub_queries
            .iter()
            .map(|query| self.search_one(retriever, source, query));
        let per_query = join_all(calls).await;

        let results = merge_results(per_query.into_iter().flatten(), source);
        tracing::debug!(
            source = %source,
            sub_queries = sub_queries.len(),
            results = results.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "source retrieval finished"
        );
        results
    }

    async fn search_one(
        &self,
        retriever: &dyn Retriever,
        source: SourceType,
        query: &str,
    ) -> Vec<SearchResult> {
        let result = match timeout(self.timeout, retriever.search(query)).await {
            Ok(result) => result,
            Err(_) => Err(RetrievalError::Timeout),
        };
        match result {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(source = %source, query = %query, "retrieval call failed, using empty result: {}", e);
                Vec::new()
            }
        }
    }
}

/// 丢弃相关度不合法的记录，同一 URL 只保留相关度最高的一条（保持首次出现的顺序）
fn merge_results(
    results: impl IntoIterator<Item = SearchResult>,
    source: SourceType,
) -> Vec<SearchResult> {
    let mut merged: Vec<SearchResult> = Vec::new();
    let mut index_by_url: HashMap<String, usize> = HashMap::new();

    for result in results {
        if !result.is_well_formed() {
            tracing::warn!(source = %source, url = %result.url, relevance = result.relevance, "dropping malformed search result");
            continue;
        }
        match index_by_url.get(&result.url) {
            Some(&i) => {
                if result.relevance > merged[i].relevance {
                    merged[i] = result;
                }
            }
            None => {
                index_by_url.insert(result.url.clone(), merged.len());
                merged.push(result);
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record(url: &str, relevance: f64, source_type: SourceType) -> SearchResult {
        SearchResult {
            title: url.to_string(),
            url: url.to_string(),
            content: None,
            snippet: Some("snippet".to_string()),
            relevance,
            source_type,
        }
    }

    struct FixedRetriever {
        source: SourceType,
        results: Vec<SearchResult>,
        calls: AtomicUsize,
    }

    impl FixedRetriever {
        fn new(source: SourceType, results: Vec<SearchResult>) -> Arc<Self> {
            Arc::new(Self {
                source,
                results,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Retriever for FixedRetriever {
        fn source(&self) -> SourceType {
            self.source
        }

        async fn search(&self, _query: &str) -> Result<Vec<SearchResult>, RetrievalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.results.clone())
        }
    }

    struct BrokenRetriever;

    #[async_trait]
    impl Retriever for BrokenRetriever {
        fn source(&self) -> SourceType {
            SourceType::Internal
        }

        async fn search(&self, _query: &str) -> Result<Vec<SearchResult>, RetrievalError> {
            Err(RetrievalError::Status(503))
        }
    }

    struct HangingRetriever;

    #[async_trait]
    impl Retriever for HangingRetriever {
        fn source(&self) -> SourceType {
            SourceType::Web
        }

        async fn search(&self, _query: &str) -> Result<Vec<SearchResult>, RetrievalError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(Vec::new())
        }
    }

    /// 每次调用先睡眠固定时长再返回一条记录
    struct SlowRetriever {
        source: SourceType,
        delay: Duration,
    }

    #[async_trait]
    impl Retriever for SlowRetriever {
        fn source(&self) -> SourceType {
            self.source
        }

        async fn search(&self, query: &str) -> Result<Vec<SearchResult>, RetrievalError> {
            tokio::time::sleep(self.delay).await;
            Ok(vec![record(&format!("/{}/{}", self.source, query), 0.5, self.source)])
        }
    }

    fn queries(qs: &[&str]) -> Vec<String> {
        qs.iter().map(|q| q.to_string()).collect()
    }

    #[tokio::test]
    async fn test_one_call_per_sub_query_per_enabled_source() {
        let internal = FixedRetriever::new(
            SourceType::Internal,
            vec![record("/docs/a", 0.9, SourceType::Internal)],
        );
        let web = FixedRetriever::new(SourceType::Web, vec![record("https://w", 0.4, SourceType::Web)]);
        let retriever = ParallelRetriever::new(internal.clone(), web.clone(), Duration::from_secs(1));

        let outcome = retriever.retrieve(&queries(&["a", "b", "c"]), true, false).await;
        assert_eq!(internal.calls.load(Ordering::SeqCst), 3);
        assert_eq!(web.calls.load(Ordering::SeqCst), 0);
        // 三个子查询命中同一 URL，合并为一条
        assert_eq!(outcome.internal.len(), 1);
        assert!(outcome.web.is_empty());
    }

    #[tokio::test]
    async fn test_sources_and_sub_queries_run_concurrently() {
        let delay = Duration::from_millis(200);
        let retriever = ParallelRetriever::new(
            Arc::new(SlowRetriever {
                source: SourceType::Internal,
                delay,
            }),
            Arc::new(SlowRetriever {
                source: SourceType::Web,
                delay,
            }),
            Duration::from_secs(5),
        );

        let start = Instant::now();
        let outcome = retriever.retrieve(&queries(&["a", "b"]), true, true).await;
        let elapsed = start.elapsed();

        assert_eq!(outcome.internal.len(), 2);
        assert_eq!(outcome.web.len(), 2);
        // 串行需要 4 × 200ms
        assert!(elapsed < Duration::from_millis(600), "elapsed {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_failed_source_is_isolated() {
        let web = FixedRetriever::new(SourceType::Web, vec![record("https://w", 0.4, SourceType::Web)]);
        let retriever =
            ParallelRetriever::new(Arc::new(BrokenRetriever), web, Duration::from_secs(1));

        let outcome = retriever.retrieve(&queries(&["reset"]), true, true).await;
        assert!(outcome.internal.is_empty());
        assert_eq!(outcome.web.len(), 1);
    }

    #[tokio::test]
    async fn test_hanging_source_times_out() {
        let internal = FixedRetriever::new(
            SourceType::Internal,
            vec![record("/docs/a", 0.9, SourceType::Internal)],
        );
        let retriever =
            ParallelRetriever::new(internal, Arc::new(HangingRetriever), Duration::from_millis(20));

        let outcome = retriever.retrieve(&queries(&["reset"]), true, true).await;
        assert_eq!(outcome.internal.len(), 1);
        assert!(outcome.web.is_empty());
    }

    #[test]
    fn test_merge_drops_malformed_and_keeps_best_duplicate() {
        let merged = merge_results(
            vec![
                record("/a", 0.3, SourceType::Internal),
                record("/b", f64::NAN, SourceType::Internal),
                record("/c", 1.7, SourceType::Internal),
                record("/a", 0.8, SourceType::Internal),
            ],
            SourceType::Internal,
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].url, "/a");
        assert!((merged[0].relevance - 0.8).abs() < 1e-9);
    }
}
