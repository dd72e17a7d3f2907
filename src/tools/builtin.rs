use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::error::{ClipsightError, Result};

use super::result::{normalize_escaped_apostrophes, ResultItem};
use super::tool::{ToolHandler, ToolInvocation, ToolKind};

#[derive(Debug, Deserialize)]
struct TimecodeArgs {
    timecodes: Vec<TimecodeEntry>,
}

#[derive(Debug, Deserialize)]
struct TimecodeEntry {
    time: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default, alias = "objects")]
    labels: Option<Vec<String>>,
    #[serde(default)]
    value: Option<f64>,
}

/// 时间码工具：三种内置工具共享同一套结果归一化逻辑
pub struct TimecodeHandler {
    kind: ToolKind,
}

impl TimecodeHandler {
    pub fn new(kind: ToolKind) -> Self {
        Self { kind }
    }

    fn invalid(&self, reason: impl Into<String>) -> ClipsightError {
        ClipsightError::InvalidToolArguments {
            tool: self.kind.name().to_string(),
            reason: reason.into(),
        }
    }
}

impl ToolHandler for TimecodeHandler {
    fn kind(&self) -> ToolKind {
        self.kind
    }

    fn handle(&self, invocation: &ToolInvocation) -> Result<Vec<ResultItem>> {
        let args: TimecodeArgs = serde_json::from_value(invocation.args.clone())
            .map_err(|e| self.invalid(e.to_string()))?;

        let mut items = Vec::with_capacity(args.timecodes.len());
        for (index, entry) in args.timecodes.into_iter().enumerate() {
            if self.kind == ToolKind::SetTimecodesWithNumericValues && entry.value.is_none() {
                return Err(self.invalid(format!("timecode #{index} is missing `value`")));
            }

            let mut item = ResultItem::new(entry.time);
            item.text = entry.text.as_deref().map(normalize_escaped_apostrophes);
            item.labels = entry.labels;
            item.value = entry.value;
            items.push(item);
        }

        debug!(tool = %self.kind, items = items.len(), "timecodes normalized");
        Ok(items)
    }
}

pub fn builtin_handlers() -> Vec<Arc<dyn ToolHandler>> {
    ToolKind::ALL
        .into_iter()
        .map(|kind| Arc::new(TimecodeHandler::new(kind)) as Arc<dyn ToolHandler>)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn objects_become_labels() {
        let handler = TimecodeHandler::new(ToolKind::SetTimecodesWithObjects);
        let items = handler
            .handle(&ToolInvocation::new(
                ToolKind::SetTimecodesWithObjects,
                json!({ "timecodes": [{ "time": "00:03", "text": "Kitchen", "objects": ["🍳 pan", "🥚 egg"] }] }),
            ))
            .unwrap();
        assert_eq!(
            items[0].labels,
            Some(vec!["🍳 pan".to_string(), "🥚 egg".to_string()])
        );
        assert_eq!(items[0].seconds, Some(3.0));
    }

    #[test]
    fn numeric_tool_requires_values() {
        let handler = TimecodeHandler::new(ToolKind::SetTimecodesWithNumericValues);
        let err = handler
            .handle(&ToolInvocation::new(
                ToolKind::SetTimecodesWithNumericValues,
                json!({ "timecodes": [{ "time": "00:03" }] }),
            ))
            .unwrap_err();
        assert!(matches!(err, ClipsightError::InvalidToolArguments { .. }));
    }

    #[test]
    fn missing_timecodes_field_is_rejected() {
        let handler = TimecodeHandler::new(ToolKind::SetTimecodes);
        assert!(handler
            .handle(&ToolInvocation::new(ToolKind::SetTimecodes, json!({})))
            .is_err());
    }
}
