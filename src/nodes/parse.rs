//! LLM 回复的启发式解析
//!
//! 每个解析器在无法识别时返回 None，由调用节点使用约定的回退值：
//! - 类别 → product_specific（complex）
//! - 子查询 → [原始查询]
//! - 来源需求 → 两者都用
//! - LLM 评分 → 0.8

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::workflow::QueryCategory;

/// 评分解析失败时的回退值
pub const DEFAULT_LLM_SCORE: f64 = 0.8;
/// 最多保留的子查询数
pub const MAX_SUB_QUERIES: usize = 3;

fn normalize_label(reply: &str) -> String {
    reply.trim().to_lowercase().replace(['-', ' '], "_")
}

/// 解析分类回复；恰好出现一个类别标签时才采纳
pub fn parse_category(reply: &str) -> Option<QueryCategory> {
    let normalized = normalize_label(reply);
    let found: Vec<QueryCategory> = [
        QueryCategory::Conversational,
        QueryCategory::GeneralKnowledge,
        QueryCategory::ProductSpecific,
    ]
    .into_iter()
    .filter(|c| normalized.contains(c.as_str()))
    .collect();

    match found.as_slice() {
        [only] => Some(*only),
        _ => None,
    }
}

fn numbered_line() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\d+[.)]\s+(.+)$").ok())
        .as_ref()
}

/// 解析编号列表（`1.` 或 `1)`），最多保留 3 项
pub fn parse_numbered_list(reply: &str) -> Option<Vec<String>> {
    let re = numbered_line()?;
    let items: Vec<String> = reply
        .lines()
        .filter_map(|line| re.captures(line))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
        .filter(|item| !item.is_empty())
        .take(MAX_SUB_QUERIES)
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// 解析来源需求，返回 (use_internal, use_web)
pub fn parse_source_need(reply: &str) -> Option<(bool, bool)> {
    let normalized = normalize_label(reply);
    if normalized.contains("both") {
        return Some((true, true));
    }
    let internal = normalized.contains("internal");
    let web = normalized.contains("web");
    match (internal, web) {
        (false, false) => None,
        pair => Some(pair),
    }
}

/// 解析评分：取第一个包含 "score" 与冒号、且冒号后以 [0,1] 内数字开头的行
pub fn parse_score(reply: &str) -> Option<f64> {
    reply.lines().find_map(|line| {
        if !line.to_lowercase().contains("score") {
            return None;
        }
        let (_, after) = line.split_once(':')?;
        let value = leading_number(after.trim())?;
        (0.0..=1.0).contains(&value).then_some(value)
    })
}

/// 解析字符串开头的十进制数（如 "0.75/1" → 0.75，"0.4." → 0.4）
fn leading_number(text: &str) -> Option<f64> {
    let end = text
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    text[..end].trim_end_matches('.').parse::<f64>().ok()
}

/// 关键词重合度：|查询词 ∩ 回答词| / max(1, |查询词|)，上限 1.0
pub fn keyword_score(query: &str, response: &str) -> f64 {
    let query_terms: HashSet<String> = query.to_lowercase().split_whitespace().map(String::from).collect();
    let response_terms: HashSet<String> = response
        .to_lowercase()
        .split_whitespace()
        .map(String::from)
        .collect();
    let overlap = query_terms.intersection(&response_terms).count();
    (overlap as f64 / query_terms.len().max(1) as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category() {
        assert_eq!(
            parse_category("general_knowledge"),
            Some(QueryCategory::GeneralKnowledge)
        );
        assert_eq!(
            parse_category("  Product-Specific\n"),
            Some(QueryCategory::ProductSpecific)
        );
        assert_eq!(
            parse_category("This is conversational."),
            Some(QueryCategory::Conversational)
        );
        assert_eq!(parse_category("general knowledge"), Some(QueryCategory::GeneralKnowledge));
        // 多个标签或没有标签都视为无法识别
        assert_eq!(parse_category("conversational or product_specific"), None);
        assert_eq!(parse_category("I am not sure"), None);
        assert_eq!(parse_category(""), None);
    }

    #[test]
    fn test_parse_numbered_list() {
        let reply = "Here are the sub-queries:\n1. reset account password\n2) password recovery email\n3. security questions\n4. extra";
        assert_eq!(
            parse_numbered_list(reply),
            Some(vec![
                "reset account password".to_string(),
                "password recovery email".to_string(),
                "security questions".to_string(),
            ])
        );
        assert_eq!(
            parse_numbered_list("  1. only one"),
            Some(vec!["only one".to_string()])
        );
        assert_eq!(parse_numbered_list("no list here"), None);
        assert_eq!(parse_numbered_list("1.missing space"), None);
    }

    #[test]
    fn test_parse_source_need() {
        assert_eq!(parse_source_need("internal_docs"), Some((true, false)));
        assert_eq!(parse_source_need("web_data"), Some((false, true)));
        assert_eq!(parse_source_need("both"), Some((true, true)));
        assert_eq!(parse_source_need("internal docs and web data"), Some((true, true)));
        assert_eq!(parse_source_need("no idea"), None);
    }

    #[test]
    fn test_parse_score() {
        assert_eq!(parse_score("Score: 0.85"), Some(0.85));
        assert_eq!(parse_score("The response is good.\nscore: 1"), Some(1.0));
        assert_eq!(parse_score("Final Score: 0.7/1.0"), Some(0.7));
        // 越界与无法解析的行被跳过
        assert_eq!(parse_score("Score: 8\nScore: 0.4"), Some(0.4));
        assert_eq!(parse_score("Score: 0.4."), Some(0.4));
        assert_eq!(parse_score("Score: 1.\nDone"), Some(1.0));
        assert_eq!(parse_score("Score: great"), None);
        assert_eq!(parse_score("0.9"), None);
        assert_eq!(parse_score("Rating: 0.9"), None);
    }

    #[test]
    fn test_keyword_score() {
        assert!((keyword_score("reset my password", "To reset your password") - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(keyword_score("reset", "RESET done"), 1.0);
        assert_eq!(keyword_score("", "anything"), 0.0);
        assert_eq!(keyword_score("a b", "c d"), 0.0);
    }
}
