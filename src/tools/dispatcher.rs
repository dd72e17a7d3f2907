use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{ClipsightError, Result};
use crate::llm::{FunctionCall, GenerationResponse};

use super::registry::ToolRegistry;
use super::result::ResultItem;
use super::tool::{ToolInvocation, ToolKind};

/// 响应中出现多个函数调用时的处理策略
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    #[default]
    FirstOnly,
    All,
}

pub const SELECTION_POLICY: SelectionPolicy = SelectionPolicy::FirstOnly;

#[derive(Clone, Debug, PartialEq)]
pub enum DispatchOutcome {
    Items(Vec<ResultItem>),
    NoOp,
}

impl DispatchOutcome {
    pub fn items(&self) -> Option<&[ResultItem]> {
        match self {
            DispatchOutcome::Items(items) => Some(items),
            DispatchOutcome::NoOp => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ToolCallDispatcher {
    policy: SelectionPolicy,
}

impl Default for ToolCallDispatcher {
    fn default() -> Self {
        Self::new(SELECTION_POLICY)
    }
}

impl ToolCallDispatcher {
    pub fn new(policy: SelectionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// 把模型返回的函数调用分发给本地处理器
    ///
    /// 空调用列表返回 `NoOp`；未声明的工具名属于契约错误，记录后返回。
    pub fn dispatch(
        &self,
        response: &GenerationResponse,
        tools: &ToolRegistry,
    ) -> Result<DispatchOutcome> {
        let calls = &response.function_calls;
        if calls.is_empty() {
            warn!("model returned no function call, leaving results unchanged");
            return Ok(DispatchOutcome::NoOp);
        }

        let selected: &[FunctionCall] = match self.policy {
            SelectionPolicy::FirstOnly => &calls[..1],
            SelectionPolicy::All => calls.as_slice(),
        };
        if selected.len() < calls.len() {
            debug!(
                ignored = calls.len() - selected.len(),
                "extra function calls ignored"
            );
        }

        let mut items = Vec::new();
        for call in selected {
            let invocation = Self::validate(call, tools)?;
            let handler = tools.handler(invocation.tool).ok_or_else(|| {
                ClipsightError::ContractViolation(format!(
                    "tool `{}` has no bound handler",
                    invocation.tool
                ))
            })?;
            let produced = handler.handle(&invocation)?;
            info!(tool = %invocation.tool, items = produced.len(), "tool call dispatched");
            items.extend(produced);
        }
        Ok(DispatchOutcome::Items(items))
    }

    fn validate(call: &FunctionCall, tools: &ToolRegistry) -> Result<ToolInvocation> {
        let declared = call
            .name
            .parse::<ToolKind>()
            .ok()
            .filter(|kind| tools.contains(*kind));
        match declared {
            Some(kind) => Ok(ToolInvocation::new(kind, call.args.clone())),
            None => {
                error!(
                    tool = %call.name,
                    declared = ?tools.kinds(),
                    "model called a tool that was not declared"
                );
                Err(ClipsightError::ContractViolation(format!(
                    "tool `{}` was not declared for this request",
                    call.name
                )))
            }
        }
    }
}
