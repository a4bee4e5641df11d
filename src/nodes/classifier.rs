//! classify 节点
//!
//! 先做问候语快速匹配（不调用 LLM），未命中时发起一次分类调用。
//! 回复无法识别时按 product_specific 处理，走完整检索流程。

use std::sync::Arc;

use async_trait::async_trait;

use crate::llm::LlmClient;
use crate::nodes::{ask, parse, prompts};
use crate::workflow::{NodeError, NodeName, QueryCategory, QueryState, WorkflowNode};

/// 问候语前缀
const GREETINGS: &[&str] = &[
    "good afternoon",
    "good morning",
    "good evening",
    "greetings",
    "howdy",
    "hello",
    "hiya",
    "hey",
    "hi",
    "yo",
];

/// 查询是否是单纯的问候：以问候语开头，剩余部分只有尾字母的重复、标点或空白（"hiii"、"hello!!"）
pub fn is_greeting(query: &str) -> bool {
    let q = query.trim().to_lowercase();
    GREETINGS.iter().any(|greeting| {
        let Some(rest) = q.strip_prefix(*greeting) else {
            return false;
        };
        let rest = match greeting.chars().last() {
            Some(last) => rest.trim_start_matches(last),
            None => rest,
        };
        rest.chars()
            .all(|c| c.is_ascii_punctuation() || c.is_whitespace())
    })
}

pub struct Classifier {
    llm: Arc<dyn LlmClient>,
    fast_match: bool,
}

impl Classifier {
    pub fn new(llm: Arc<dyn LlmClient>, fast_match: bool) -> Self {
        Self { llm, fast_match }
    }
}

#[async_trait]
impl WorkflowNode for Classifier {
    fn name(&self) -> NodeName {
        NodeName::Classify
    }

    async fn run(&self, mut state: QueryState) -> Result<QueryState, NodeError> {
        let category = if self.fast_match && is_greeting(state.original_query()) {
            tracing::debug!("greeting matched, skipping classification call");
            QueryCategory::Conversational
        } else {
            let reply = ask(
                self.llm.as_ref(),
                prompts::CLASSIFY_SYSTEM,
                &[],
                state.original_query().to_string(),
            )
            .await?;
            parse::parse_category(&reply).unwrap_or_else(|| {
                tracing::warn!(reply = %reply.trim(), "unrecognized category, defaulting to product_specific");
                QueryCategory::ProductSpecific
            })
        };

        state.query_category = Some(category);
        state.query_type = category.query_type();
        tracing::info!(category = category.as_str(), query_type = ?state.query_type, "query classified");
        Ok(state)
    }
}
