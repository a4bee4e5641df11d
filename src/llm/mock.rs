//! Mock / Scripted LLM 客户端（用于离线运行与测试，无需 API）
//!
//! - MockLlmClient：按 system 指令识别调用节点，返回确定性的固定回复，便于本地跑通整个工作流。
//! - ScriptedLlmClient：测试桩，按 system 指令逐条脚本化回复，并记录每次调用。

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError};
use crate::memory::{Message, Role};
use crate::nodes::prompts;

fn system_of(messages: &[Message]) -> &str {
    messages
        .iter()
        .find(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .unwrap_or("")
}

fn last_user_of(messages: &[Message]) -> &str {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .unwrap_or("")
}

/// 取形如 `Query: xxx` / `Question: xxx` 的首行值
fn field<'a>(content: &'a str, name: &str) -> Option<&'a str> {
    content
        .lines()
        .find_map(|line| line.strip_prefix(name))
        .map(str::trim)
}

/// Mock 客户端：确定性回复，算术类问题归为 general_knowledge，其余归为 product_specific
#[derive(Debug, Default)]
pub struct MockLlmClient;

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        let system = system_of(messages);
        let user = last_user_of(messages);

        let reply = match system {
            s if s == prompts::CLASSIFY_SYSTEM => {
                let arithmetic = user.chars().any(|c| c.is_ascii_digit())
                    && user.chars().any(|c| matches!(c, '+' | '-' | '*' | '/'));
                if arithmetic {
                    "general_knowledge".to_string()
                } else {
                    "product_specific".to_string()
                }
            }
            s if s == prompts::REWRITE_SYSTEM => {
                format!("1. {}", field(user, "Query:").unwrap_or(user))
            }
            s if s == prompts::SELECT_SOURCES_SYSTEM => "both".to_string(),
            s if s == prompts::GENERATE_SYSTEM => format!(
                "Mock answer for: {}",
                field(user, "Question:").unwrap_or(user)
            ),
            s if s == prompts::EVALUATE_SYSTEM => "Score: 0.9".to_string(),
            _ => format!("Echo from Mock: {}", user),
        };
        Ok(reply)
    }
}

/// 一次被记录的调用
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: String,
    pub user: String,
}

struct ScriptRule {
    system: String,
    replies: VecDeque<Result<String, LlmError>>,
}

/// 脚本化测试桩：为每条 system 指令排队若干回复，依次弹出，最后一条重复使用；
/// 未配置的指令返回 InvalidRequest，测试可借此断言「不应调用 LLM」
#[derive(Default)]
pub struct ScriptedLlmClient {
    rules: Mutex<Vec<ScriptRule>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为指定 system 指令追加一条成功回复
    pub fn reply(self, system: &str, reply: impl Into<String>) -> Self {
        self.push(system, Ok(reply.into()))
    }

    /// 为指定 system 指令按顺序追加多条回复
    pub fn replies<I, S>(mut self, system: &str, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for reply in replies {
            self = self.push(system, Ok(reply.into()));
        }
        self
    }

    /// 为指定 system 指令追加一次失败
    pub fn fail(self, system: &str, error: LlmError) -> Self {
        self.push(system, Err(error))
    }

    fn push(mut self, system: &str, reply: Result<String, LlmError>) -> Self {
        let rules = self.rules.get_mut().unwrap_or_else(PoisonError::into_inner);
        match rules.iter_mut().find(|r| r.system == system) {
            Some(rule) => rule.replies.push_back(reply),
            None => rules.push(ScriptRule {
                system: system.to_string(),
                replies: VecDeque::from([reply]),
            }),
        }
        self
    }

    /// 全部调用记录
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// 使用指定 system 指令的调用次数
    pub fn calls_for(&self, system: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|c| c.system == system)
            .count()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        let system = system_of(messages).to_string();
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                system: system.clone(),
                user: last_user_of(messages).to_string(),
            });

        let mut rules = self.rules.lock().unwrap_or_else(PoisonError::into_inner);
        let rule = rules.iter_mut().find(|r| r.system == system);
        match rule {
            Some(rule) if rule.replies.len() > 1 => rule
                .replies
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::InvalidRequest("empty script".to_string()))),
            Some(rule) => rule
                .replies
                .front()
                .cloned()
                .unwrap_or_else(|| Err(LlmError::InvalidRequest("empty script".to_string()))),
            None => {
                let preview: String = system.chars().take(60).collect();
                Err(LlmError::InvalidRequest(format!(
                    "no scripted reply for system prompt: {}",
                    preview
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask(system: &str, user: &str) -> Vec<Message> {
        vec![Message::system(system), Message::user(user)]
    }

    #[tokio::test]
    async fn test_mock_classifies_arithmetic_as_general() {
        let mock = MockLlmClient;
        let reply = mock
            .complete(&ask(prompts::CLASSIFY_SYSTEM, "What's 15 * 7?"))
            .await
            .unwrap();
        assert_eq!(reply, "general_knowledge");

        let reply = mock
            .complete(&ask(prompts::CLASSIFY_SYSTEM, "How do I reset my password?"))
            .await
            .unwrap();
        assert_eq!(reply, "product_specific");
    }

    #[tokio::test]
    async fn test_mock_rewrite_is_numbered() {
        let reply = MockLlmClient
            .complete(&ask(
                prompts::REWRITE_SYSTEM,
                "Query: reset password\nQuery Type: complex",
            ))
            .await
            .unwrap();
        assert_eq!(reply, "1. reset password");
    }

    #[tokio::test]
    async fn test_scripted_replies_in_order_then_repeat_last() {
        let llm = ScriptedLlmClient::new().replies("sys", ["a", "b"]);
        assert_eq!(llm.complete(&ask("sys", "x")).await.unwrap(), "a");
        assert_eq!(llm.complete(&ask("sys", "x")).await.unwrap(), "b");
        assert_eq!(llm.complete(&ask("sys", "x")).await.unwrap(), "b");
        assert_eq!(llm.calls_for("sys"), 3);
    }

    #[tokio::test]
    async fn test_scripted_unknown_prompt_fails_and_is_recorded() {
        let llm = ScriptedLlmClient::new();
        let result = llm.complete(&ask("unknown", "hello")).await;
        assert!(matches!(result, Err(LlmError::InvalidRequest(_))));
        assert_eq!(llm.call_count(), 1);
        assert_eq!(llm.calls()[0].user, "hello");
    }
}
