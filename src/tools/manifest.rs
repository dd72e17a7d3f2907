use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::tool::ToolKind;

/// 发送给模型的函数声明
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDeclaration {
    pub fn for_kind(kind: ToolKind) -> Self {
        Self {
            name: kind.name().to_string(),
            description: kind.description().to_string(),
            parameters: kind.parameters(),
        }
    }

    pub fn kind(&self) -> Option<ToolKind> {
        self.name.parse().ok()
    }
}
