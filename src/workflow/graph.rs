//! 工作流拓扑
//!
//! 静态路由表：节点完成后立即根据状态计算条件路由，再查出后继节点。
//! 唯一的环是 evaluate → rewrite → select_sources → retrieve → generate → evaluate，
//! 其出口由 evaluate 写入的 refinement_needed 决定（evaluate 保证 refinement_count ≥ R_MAX 时不再请求优化）。

use crate::workflow::types::*;

/// 入口节点
pub const ENTRY_NODE: NodeName = NodeName::Classify;

/// 后继：下一个节点或结束
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Node(NodeName),
    End,
}

/// classify 之后的条件边
pub fn route_after_classify(state: &QueryState) -> ClassifyRoute {
    match state.query_type {
        QueryType::Simple => ClassifyRoute::Simple,
        QueryType::Complex | QueryType::Unclassified => ClassifyRoute::Complex,
    }
}

/// evaluate 之后的条件边
pub fn route_after_evaluate(state: &QueryState) -> EvaluateRoute {
    if state.refinement_needed {
        EvaluateRoute::Refine
    } else {
        EvaluateRoute::Complete
    }
}

/// 工作流路由表
pub struct WorkflowGraph;

impl WorkflowGraph {
    /// 节点完成后的后继
    pub fn next(node: NodeName, state: &QueryState) -> Next {
        match node {
            NodeName::Classify => match route_after_classify(state) {
                ClassifyRoute::Simple => Next::Node(NodeName::FastPath),
                ClassifyRoute::Complex => Next::Node(NodeName::Rewrite),
            },
            NodeName::FastPath => Next::End,
            NodeName::Rewrite => Next::Node(NodeName::SelectSources),
            NodeName::SelectSources => Next::Node(NodeName::Retrieve),
            NodeName::Retrieve => Next::Node(NodeName::Generate),
            NodeName::Generate => Next::Node(NodeName::Evaluate),
            NodeName::Evaluate => match route_after_evaluate(state) {
                EvaluateRoute::Refine => Next::Node(NodeName::Rewrite),
                EvaluateRoute::Complete => Next::End,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_routes() {
        let mut state = QueryState::new("hi");
        state.query_type = QueryType::Simple;
        assert_eq!(
            WorkflowGraph::next(NodeName::Classify, &state),
            Next::Node(NodeName::FastPath)
        );

        state.query_type = QueryType::Complex;
        assert_eq!(
            WorkflowGraph::next(NodeName::Classify, &state),
            Next::Node(NodeName::Rewrite)
        );
    }

    #[test]
    fn test_linear_section() {
        let state = QueryState::new("q");
        assert_eq!(
            WorkflowGraph::next(NodeName::Rewrite, &state),
            Next::Node(NodeName::SelectSources)
        );
        assert_eq!(
            WorkflowGraph::next(NodeName::SelectSources, &state),
            Next::Node(NodeName::Retrieve)
        );
        assert_eq!(
            WorkflowGraph::next(NodeName::Retrieve, &state),
            Next::Node(NodeName::Generate)
        );
        assert_eq!(
            WorkflowGraph::next(NodeName::Generate, &state),
            Next::Node(NodeName::Evaluate)
        );
        assert_eq!(WorkflowGraph::next(NodeName::FastPath, &state), Next::End);
    }

    #[test]
    fn test_evaluate_routes() {
        let mut state = QueryState::new("q");
        state.refinement_needed = true;
        assert_eq!(
            WorkflowGraph::next(NodeName::Evaluate, &state),
            Next::Node(NodeName::Rewrite)
        );
        state.refinement_needed = false;
        assert_eq!(WorkflowGraph::next(NodeName::Evaluate, &state), Next::End);
    }
}
