//! 工作流节点
//!
//! 每个节点实现 WorkflowNode：取得 QueryState 所有权，最多发起一次 LLM 调用（retrieve 除外），
//! 返回更新后的状态。LLM 回复的解析集中在 parse 模块。

pub mod classifier;
pub mod evaluator;
pub mod fast_path;
pub mod generator;
pub mod parse;
pub mod prompts;
pub mod retrieve;
pub mod rewriter;
pub mod source_selector;

pub use classifier::{is_greeting, Classifier};
pub use evaluator::{overall_score, Evaluator};
pub use fast_path::FastPathResponder;
pub use generator::{select_top_sources, ResponseGenerator};
pub use retrieve::RetrieveNode;
pub use rewriter::QueryRewriter;
pub use source_selector::SourceSelector;

use crate::llm::{LlmClient, LlmError};
use crate::memory::Message;

/// 组装 system 指令 + 历史 + 本次 user 内容并调用 LLM
pub(crate) async fn ask(
    llm: &dyn LlmClient,
    system: &str,
    history: &[Message],
    user: String,
) -> Result<String, LlmError> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(system));
    messages.extend(history.iter().cloned());
    messages.push(Message::user(user));
    llm.complete(&messages).await
}
