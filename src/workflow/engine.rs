//! 工作流引擎
//!
//! 从入口节点开始，依次运行节点并按路由表转移，直到到达终止边。
//! 节点返回错误时立即终止本次调用，错误包装为携带节点名的 WorkflowFailure。

use std::sync::Arc;
use std::time::Instant;

use crate::workflow::graph::{Next, WorkflowGraph, ENTRY_NODE};
use crate::workflow::types::*;

/// 七个节点的实现
#[derive(Clone)]
pub struct WorkflowNodes {
    pub classify: Arc<dyn WorkflowNode>,
    pub fast_path: Arc<dyn WorkflowNode>,
    pub rewrite: Arc<dyn WorkflowNode>,
    pub select_sources: Arc<dyn WorkflowNode>,
    pub retrieve: Arc<dyn WorkflowNode>,
    pub generate: Arc<dyn WorkflowNode>,
    pub evaluate: Arc<dyn WorkflowNode>,
}

impl WorkflowNodes {
    fn get(&self, name: NodeName) -> &dyn WorkflowNode {
        match name {
            NodeName::Classify => self.classify.as_ref(),
            NodeName::FastPath => self.fast_path.as_ref(),
            NodeName::Rewrite => self.rewrite.as_ref(),
            NodeName::SelectSources => self.select_sources.as_ref(),
            NodeName::Retrieve => self.retrieve.as_ref(),
            NodeName::Generate => self.generate.as_ref(),
            NodeName::Evaluate => self.evaluate.as_ref(),
        }
    }
}

/// 工作流引擎：无共享可变状态，可被多个调用并发使用
#[derive(Clone)]
pub struct WorkflowEngine {
    nodes: WorkflowNodes,
}

impl WorkflowEngine {
    pub fn new(nodes: WorkflowNodes) -> Self {
        Self { nodes }
    }

    /// 运行一次查询直到终态
    pub async fn execute(&self, initial: QueryState) -> Result<QueryState, WorkflowFailure> {
        let mut state = initial;
        let mut current = ENTRY_NODE;
        let start = Instant::now();

        tracing::info!(session_id = %state.session_id(), "workflow started");

        loop {
            let node = self.nodes.get(current);
            let node_start = Instant::now();
            tracing::debug!(node = %node.name(), session_id = %state.session_id(), "node started");

            state = match node.run(state).await {
                Ok(next_state) => next_state,
                Err(cause) => {
                    tracing::error!(node = %current, "node failed: {}", cause);
                    return Err(WorkflowFailure::new(current, cause));
                }
            };
            state.record_transition(current);

            let next = WorkflowGraph::next(current, &state);
            tracing::info!(
                session_id = %state.session_id(),
                node = %current,
                elapsed_ms = node_start.elapsed().as_millis() as u64,
                next = ?next,
                "node finished"
            );

            match next {
                Next::Node(next) => current = next,
                Next::End => break,
            }
        }

        tracing::info!(
            session_id = %state.session_id(),
            query_type = ?state.query_type,
            refinements = state.refinement_count,
            overall_score = state.overall_score.unwrap_or(0.0),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "workflow completed"
        );
        Ok(state)
    }
}
