use serde::{Deserialize, Serialize};

use crate::error::{ClipsightError, Result};
use crate::tools::ToolKind;

use super::modes::{Mode, PromptTemplate};

/// 最近一次获得焦点的输入
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "focus", content = "name", rename_all = "snake_case")]
pub enum InputFocus {
    SubMode(String),
    Custom,
}

/// 用户在当前模式下的输入状态
///
/// 输入自定义文本不会改变焦点：只有聚焦自定义输入框后，自定义文本才优先于预设子模式；
/// 之后再选择预设子模式，优先级回到预设。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeInput {
    custom_text: String,
    focus: Option<InputFocus>,
}

impl ModeInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_custom_text(mut self, text: impl Into<String>) -> Self {
        self.custom_text = text.into();
        self
    }

    pub fn set_custom_text(&mut self, text: impl Into<String>) {
        self.custom_text = text.into();
    }

    pub fn select_sub_mode(&mut self, name: impl Into<String>) {
        self.focus = Some(InputFocus::SubMode(name.into()));
    }

    pub fn focus_custom(&mut self) {
        self.focus = Some(InputFocus::Custom);
    }

    pub fn custom_text(&self) -> &str {
        &self.custom_text
    }

    pub fn focus(&self) -> Option<&InputFocus> {
        self.focus.as_ref()
    }
}

/// 编译结果：最终 prompt、期望的工具以及图表类结果的标签
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompiledPrompt {
    pub mode: String,
    pub text: String,
    pub tool: ToolKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

pub struct PromptCompiler;

impl PromptCompiler {
    pub fn compile(mode: &Mode, input: &ModeInput) -> Result<CompiledPrompt> {
        let (text, label) = match &mode.prompt {
            PromptTemplate::Fixed(text) => (text.clone(), None),
            PromptTemplate::Template(_) if mode.is_custom() => {
                let custom = input.custom_text().to_string();
                (mode.prompt.render(&custom), Some(custom))
            }
            PromptTemplate::Template(_) => {
                let (fragment, label) = Self::resolve_sub_mode_input(mode, input)?;
                (mode.prompt.render(&fragment), Some(label))
            }
        };

        Ok(CompiledPrompt {
            mode: mode.name.clone(),
            text,
            tool: mode.tool,
            label,
        })
    }

    fn resolve_sub_mode_input(mode: &Mode, input: &ModeInput) -> Result<(String, String)> {
        let selected = match input.focus() {
            Some(InputFocus::Custom) => {
                let custom = input.custom_text().to_string();
                return Ok((custom.clone(), custom));
            }
            Some(InputFocus::SubMode(name)) => mode.sub_mode(name).ok_or_else(|| {
                ClipsightError::InvalidInput(format!(
                    "mode `{}` has no sub-mode `{name}`",
                    mode.name
                ))
            })?,
            None => mode.default_sub_mode().ok_or_else(|| {
                ClipsightError::InvalidInput(format!("mode `{}` has no sub-modes", mode.name))
            })?,
        };
        Ok((selected.prompt.clone(), selected.name.clone()))
    }
}
