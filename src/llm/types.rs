use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tools::ToolDeclaration;

/// 生成请求中引用的已上传资源
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetRef {
    pub uri: String,
    pub mime_type: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system_instruction: String,
    pub temperature: f32,
    pub asset: AssetRef,
    pub function_declarations: Vec<ToolDeclaration>,
}

/// 模型请求的一次函数调用，名称与参数在校验前均不可信
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub function_calls: Vec<FunctionCall>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl GenerationResponse {
    pub fn with_calls(function_calls: Vec<FunctionCall>) -> Self {
        Self {
            function_calls,
            ..Self::default()
        }
    }
}
