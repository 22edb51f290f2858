//! Per-call orchestration state

use serde::Serialize;

/// Snapshot of the orchestrator's state for the current (or last) call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Whether the tool servers are connected right now
    pub connected: bool,
    /// Tool executions performed so far in this call
    pub tool_call_count: usize,
    /// Budget for one call
    pub max_tool_calls: usize,
}

impl SessionState {
    pub fn new(max_tool_calls: usize) -> Self {
        Self {
            connected: false,
            tool_call_count: 0,
            max_tool_calls,
        }
    }

    /// Executions still allowed in this call
    pub fn remaining(&self) -> usize {
        self.max_tool_calls.saturating_sub(self.tool_call_count)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }
}
