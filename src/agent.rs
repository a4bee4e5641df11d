//! Headless 客服 Agent
//!
//! 供 CLI 与 HTTP 前端调用：create_llm_from_config / create_retrievers_from_config 按配置构建依赖，
//! SupportAgent::process 校验输入、裁剪历史、运行工作流并返回 QueryOutcome。

use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, RetrievalMode, SourceSection};
use crate::core::AgentError;
use crate::llm::{LlmClient, MockLlmClient, OpenAiClient, RetryConfig, RetryingLlmClient};
use crate::memory::{ConversationMemory, Message};
use crate::retrieval::{HttpRetriever, InternalDocsCatalog, Retriever, SourceType, WebSourceCatalog};
use crate::workflow::{QueryOutcome, QueryState, WorkflowBuilder, WorkflowEngine};

/// 单条查询的最大字符数
pub const MAX_QUERY_CHARS: usize = 4000;

/// 按配置创建 LLM 客户端：provider 为 mock 或没有 OPENAI_API_KEY 时使用 Mock；外层统一包超时与重试
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    let api_key = std::env::var("OPENAI_API_KEY").ok();

    let inner: Arc<dyn LlmClient> = match api_key {
        Some(key) if provider != "mock" => {
            let model = cfg
                .llm
                .openai
                .model
                .clone()
                .unwrap_or_else(|| cfg.llm.model.clone());
            tracing::info!("Using OpenAI LLM ({})", model);
            Arc::new(OpenAiClient::new(cfg.llm.base_url.as_deref(), &model, &key))
        }
        _ => {
            if provider != "mock" {
                tracing::warn!("OPENAI_API_KEY not set, using Mock LLM");
            }
            Arc::new(MockLlmClient)
        }
    };

    let retry = RetryConfig {
        max_retries: cfg.llm.retry.max_retries,
        initial_backoff: Duration::from_millis(cfg.llm.retry.initial_backoff_ms),
        request_timeout: Duration::from_secs(cfg.llm.timeouts.request.max(1)),
        ..RetryConfig::default()
    };
    Arc::new(RetryingLlmClient::new(inner, retry))
}

fn create_retriever(section: &SourceSection, source: SourceType, timeout_secs: u64) -> Arc<dyn Retriever> {
    if section.mode == RetrievalMode::Http {
        if let Some(endpoint) = section.endpoint.as_deref() {
            tracing::info!("{} retrieval via {}", source, endpoint);
            return Arc::new(HttpRetriever::new(endpoint, source, timeout_secs));
        }
        tracing::warn!("{} retrieval mode is http but no endpoint is set, using local catalog", source);
    }

    let path = section.data_path.as_deref();
    let retriever: Arc<dyn Retriever> = match source {
        SourceType::Internal => Arc::new(InternalDocsCatalog::load(path)),
        SourceType::Web => Arc::new(WebSourceCatalog::load(path)),
    };
    retriever
}

/// 按配置创建 (内部文档, Web) 检索器
pub fn create_retrievers_from_config(cfg: &AppConfig) -> (Arc<dyn Retriever>, Arc<dyn Retriever>) {
    let timeout = cfg.retrieval.timeout_secs;
    (
        create_retriever(&cfg.retrieval.internal, SourceType::Internal, timeout),
        create_retriever(&cfg.retrieval.web, SourceType::Web, timeout),
    )
}

/// 客服 Agent：持有可复用的工作流引擎，可被多个请求并发调用
#[derive(Clone)]
pub struct SupportAgent {
    engine: WorkflowEngine,
    llm: Arc<dyn LlmClient>,
    max_context_turns: usize,
}

impl SupportAgent {
    pub fn new(engine: WorkflowEngine, llm: Arc<dyn LlmClient>, max_context_turns: usize) -> Self {
        Self {
            engine,
            llm,
            max_context_turns,
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Result<Self, AgentError> {
        let llm = create_llm_from_config(cfg);
        let (internal, web) = create_retrievers_from_config(cfg);
        let engine = WorkflowBuilder::new()
            .llm(llm.clone())
            .internal_retriever(internal)
            .web_retriever(web)
            .retrieval_timeout(Duration::from_secs(cfg.retrieval.timeout_secs))
            .fast_match(cfg.workflow.fast_match)
            .build()?;
        Ok(Self::new(engine, llm, cfg.app.max_context_turns))
    }

    /// 处理一条查询；history 为此前的对话（超出轮数上限的部分被丢弃）
    pub async fn process(
        &self,
        query: &str,
        history: Option<Vec<Message>>,
    ) -> Result<QueryOutcome, AgentError> {
        self.process_in_session(None, query, history).await
    }

    /// 同 process，但沿用调用方给出的会话 ID
    pub async fn process_in_session(
        &self,
        session_id: Option<&str>,
        query: &str,
        history: Option<Vec<Message>>,
    ) -> Result<QueryOutcome, AgentError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AgentError::EmptyQuery);
        }
        let len = query.chars().count();
        if len > MAX_QUERY_CHARS {
            return Err(AgentError::QueryTooLong {
                len,
                max: MAX_QUERY_CHARS,
            });
        }

        let history = ConversationMemory::from_history(history.unwrap_or_default(), self.max_context_turns)
            .into_messages();
        let mut state = QueryState::new(query).with_history(history);
        if let Some(id) = session_id {
            state = state.with_session_id(id);
        }

        let final_state = self.engine.execute(state).await?;

        let (prompt, completion, total) = self.llm.token_usage();
        tracing::info!(
            session_id = %final_state.session_id(),
            refinements = final_state.refinement_count,
            sources = final_state.selected_sources.len(),
            nodes = final_state.visited.len(),
            prompt_tokens = prompt,
            completion_tokens = completion,
            total_tokens = total,
            "query processed"
        );
        Ok(final_state.into_outcome())
    }
}
