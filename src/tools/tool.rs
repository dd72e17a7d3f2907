use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ClipsightError, Result};

use super::result::ResultItem;

/// 可供模型调用的工具集合，封闭枚举
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    SetTimecodes,
    SetTimecodesWithObjects,
    SetTimecodesWithNumericValues,
}

impl ToolKind {
    pub const ALL: [ToolKind; 3] = [
        ToolKind::SetTimecodes,
        ToolKind::SetTimecodesWithObjects,
        ToolKind::SetTimecodesWithNumericValues,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::SetTimecodes => "set_timecodes",
            ToolKind::SetTimecodesWithObjects => "set_timecodes_with_objects",
            ToolKind::SetTimecodesWithNumericValues => "set_timecodes_with_numeric_values",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolKind::SetTimecodes => "Set the timecodes for the video with associated text",
            ToolKind::SetTimecodesWithObjects => {
                "Set the timecodes for the video with associated text and object list"
            }
            ToolKind::SetTimecodesWithNumericValues => {
                "Set the timecodes for the video with associated numeric values"
            }
        }
    }

    /// 参数 schema（Generative Language API 的 OpenAPI 子集）
    pub fn parameters(&self) -> Value {
        let item = match self {
            ToolKind::SetTimecodes => json!({
                "type": "OBJECT",
                "properties": {
                    "time": { "type": "STRING" },
                    "text": { "type": "STRING" }
                },
                "required": ["time", "text"]
            }),
            ToolKind::SetTimecodesWithObjects => json!({
                "type": "OBJECT",
                "properties": {
                    "time": { "type": "STRING" },
                    "text": { "type": "STRING" },
                    "objects": {
                        "type": "ARRAY",
                        "items": { "type": "STRING" }
                    }
                },
                "required": ["time", "text", "objects"]
            }),
            ToolKind::SetTimecodesWithNumericValues => json!({
                "type": "OBJECT",
                "properties": {
                    "time": { "type": "STRING" },
                    "value": { "type": "NUMBER" }
                },
                "required": ["time", "value"]
            }),
        };

        json!({
            "type": "OBJECT",
            "properties": {
                "timecodes": {
                    "type": "ARRAY",
                    "items": item
                }
            },
            "required": ["timecodes"]
        })
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ToolKind {
    type Err = ClipsightError;

    fn from_str(name: &str) -> Result<Self> {
        ToolKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| ClipsightError::ContractViolation(format!("unknown tool `{name}`")))
    }
}

/// 已通过名称校验的工具调用
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool: ToolKind,
    #[serde(default)]
    pub args: Value,
}

impl ToolInvocation {
    pub fn new(tool: ToolKind, args: Value) -> Self {
        Self { tool, args }
    }
}

/// 本地工具处理器，同步执行，只根据参数生成结果，不直接修改会话状态
pub trait ToolHandler: Send + Sync {
    fn kind(&self) -> ToolKind;
    fn handle(&self, invocation: &ToolInvocation) -> Result<Vec<ResultItem>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for kind in ToolKind::ALL {
            assert_eq!(kind.name().parse::<ToolKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_name_is_contract_violation() {
        assert!(matches!(
            "delete_everything".parse::<ToolKind>(),
            Err(ClipsightError::ContractViolation(_))
        ));
    }
}
