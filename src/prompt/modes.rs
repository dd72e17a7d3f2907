use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{ClipsightError, Result};
use crate::tools::{ToolKind, ToolRegistry};

pub const INPUT_PLACEHOLDER: &str = "{input}";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum PromptTemplate {
    /// 固定文本，原样使用
    Fixed(String),
    /// 含 `{input}` 占位符的模板
    Template(String),
}

impl PromptTemplate {
    pub fn render(&self, input: &str) -> String {
        match self {
            PromptTemplate::Fixed(text) => text.clone(),
            PromptTemplate::Template(template) => template.replace(INPUT_PLACEHOLDER, input),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubMode {
    pub name: String,
    pub prompt: String,
}

impl SubMode {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mode {
    pub name: String,
    pub prompt: PromptTemplate,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_modes: Vec<SubMode>,
    pub tool: ToolKind,
    #[serde(default)]
    pub is_list: bool,
}

impl Mode {
    pub fn fixed(name: impl Into<String>, prompt: impl Into<String>, tool: ToolKind) -> Self {
        Self {
            name: name.into(),
            prompt: PromptTemplate::Fixed(prompt.into()),
            sub_modes: Vec::new(),
            tool,
            is_list: false,
        }
    }

    pub fn template(name: impl Into<String>, template: impl Into<String>, tool: ToolKind) -> Self {
        Self {
            name: name.into(),
            prompt: PromptTemplate::Template(template.into()),
            sub_modes: Vec::new(),
            tool,
            is_list: false,
        }
    }

    pub fn with_sub_mode(mut self, name: impl Into<String>, prompt: impl Into<String>) -> Self {
        self.sub_modes.push(SubMode::new(name, prompt));
        self
    }

    pub fn listed(mut self) -> Self {
        self.is_list = true;
        self
    }

    /// 模板且没有子模式：直接使用用户输入
    pub fn is_custom(&self) -> bool {
        matches!(self.prompt, PromptTemplate::Template(_)) && self.sub_modes.is_empty()
    }

    pub fn has_sub_modes(&self) -> bool {
        !self.sub_modes.is_empty()
    }

    pub fn sub_mode(&self, name: &str) -> Option<&SubMode> {
        self.sub_modes.iter().find(|sub| sub.name == name)
    }

    pub fn default_sub_mode(&self) -> Option<&SubMode> {
        self.sub_modes.first()
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ClipsightError::Config("mode name must not be empty".into()));
        }
        match &self.prompt {
            PromptTemplate::Fixed(_) if self.has_sub_modes() => Err(ClipsightError::Config(
                format!("mode `{}` has sub-modes but a fixed prompt", self.name),
            )),
            PromptTemplate::Template(template) if !template.contains(INPUT_PLACEHOLDER) => {
                Err(ClipsightError::Config(format!(
                    "template for mode `{}` has no {INPUT_PLACEHOLDER} placeholder",
                    self.name
                )))
            }
            _ => Ok(()),
        }
    }
}

/// 启动时加载一次的模式表，顺序即展示顺序
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModeCatalog {
    modes: Vec<Mode>,
}

static BUILTIN_MODES: Lazy<ModeCatalog> = Lazy::new(|| ModeCatalog {
    modes: vec![
        Mode::fixed(
            "A/V captions",
            "For each scene in this video, generate captions that describe the scene along with \
any spoken text placed in quotation marks. Place each caption into an object sent to \
set_timecodes with the timecode of the caption in the video.",
            ToolKind::SetTimecodes,
        )
        .listed(),
        Mode::fixed(
            "Paragraph",
            "Generate a paragraph that summarizes this video. Keep it to 3 to 5 sentences. Place \
each sentence of the summary into an object sent to set_timecodes with the timecode of the \
sentence in the video.",
            ToolKind::SetTimecodes,
        ),
        Mode::fixed(
            "Key moments",
            "Generate bullet points for the video. Place each bullet point into an object sent to \
set_timecodes with the timecode of the bullet point in the video.",
            ToolKind::SetTimecodes,
        )
        .listed(),
        Mode::fixed(
            "Table",
            "Choose 5 key shots from this video and call set_timecodes_with_objects with the \
timecode, text description of 10 words or less, and a list of objects visible in the scene \
(with representative emojis).",
            ToolKind::SetTimecodesWithObjects,
        ),
        Mode::fixed(
            "Haiku",
            "Generate a haiku for the video. Place each line of the haiku into an object sent to \
set_timecodes with the timecode of the line in the video. Make sure to follow the syllable \
count rules (5-7-5).",
            ToolKind::SetTimecodes,
        ),
        Mode::template(
            "Chart",
            "Generate chart data for this video based on the following instructions: {input}. \
Call set_timecodes_with_numeric_values once with the list of data values and timecodes.",
            ToolKind::SetTimecodesWithNumericValues,
        )
        .with_sub_mode(
            "Excitement",
            "for each scene, estimate the level of excitement on a scale of 1 to 10",
        )
        .with_sub_mode(
            "Importance",
            "for each scene, estimate the level of overall importance to the video on a scale \
of 1 to 10",
        )
        .with_sub_mode(
            "Number of people",
            "for each scene, count the number of people visible",
        ),
        Mode::template(
            "Custom",
            "Call set_timecodes once using the following instructions: {input}",
            ToolKind::SetTimecodes,
        )
        .listed(),
    ],
});

impl ModeCatalog {
    pub fn new(modes: Vec<Mode>) -> Result<Self> {
        let catalog = Self { modes };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn builtin() -> &'static ModeCatalog {
        &BUILTIN_MODES
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let modes: Vec<Mode> = serde_json::from_str(raw)
            .map_err(|e| ClipsightError::Config(format!("invalid modes file: {e}")))?;
        Self::new(modes)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    pub fn get(&self, name: &str) -> Option<&Mode> {
        self.modes.iter().find(|mode| mode.name == name)
    }

    pub fn require(&self, name: &str) -> Result<&Mode> {
        self.get(name)
            .ok_or_else(|| ClipsightError::InvalidInput(format!("unknown mode `{name}`")))
    }

    pub fn names(&self) -> Vec<&str> {
        self.modes.iter().map(|mode| mode.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mode> {
        self.modes.iter()
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    /// 检查每个模式的目标工具都已在注册表中声明
    pub fn check_tools(&self, tools: &ToolRegistry) -> Result<()> {
        for mode in &self.modes {
            if !tools.contains(mode.tool) {
                return Err(ClipsightError::Config(format!(
                    "mode `{}` expects tool `{}` which is not declared",
                    mode.name, mode.tool
                )));
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for mode in &self.modes {
            mode.validate()?;
            if !seen.insert(mode.name.as_str()) {
                return Err(ClipsightError::Config(format!(
                    "mode `{}` defined more than once",
                    mode.name
                )));
            }
            let mut sub_seen = HashSet::new();
            for sub in &mode.sub_modes {
                if !sub_seen.insert(sub.name.as_str()) {
                    return Err(ClipsightError::Config(format!(
                        "sub-mode `{}` defined more than once in `{}`",
                        sub.name, mode.name
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = ModeCatalog::builtin();
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.len(), 7);
        assert!(catalog.get("Custom").unwrap().is_custom());
        assert_eq!(
            catalog.get("Chart").unwrap().default_sub_mode().unwrap().name,
            "Excitement"
        );
        assert!(catalog.check_tools(&ToolRegistry::builtin().unwrap()).is_ok());
    }

    #[test]
    fn loads_modes_from_json() {
        let raw = r#"[
            { "name": "Summary", "prompt": { "kind": "fixed", "text": "Summarize." }, "tool": "set_timecodes" },
            { "name": "Ask", "prompt": { "kind": "template", "text": "Answer: {input}" }, "tool": "set_timecodes", "is_list": true }
        ]"#;
        let catalog = ModeCatalog::from_json_str(raw).unwrap();
        assert_eq!(catalog.names(), vec!["Summary", "Ask"]);
        assert!(catalog.get("Ask").unwrap().is_list);
    }

    #[test]
    fn rejects_duplicate_modes_and_missing_placeholder() {
        let dup = vec![
            Mode::fixed("A", "x", ToolKind::SetTimecodes),
            Mode::fixed("A", "y", ToolKind::SetTimecodes),
        ];
        assert!(matches!(ModeCatalog::new(dup), Err(ClipsightError::Config(_))));
        let bad = vec![Mode::template("B", "no slot", ToolKind::SetTimecodes)];
        assert!(ModeCatalog::new(bad).is_err());
    }

    #[test]
    fn partial_registry_fails_tool_check() {
        let tools = ToolRegistry::declare(vec![std::sync::Arc::new(
            crate::tools::TimecodeHandler::new(ToolKind::SetTimecodes),
        ) as std::sync::Arc<dyn crate::tools::ToolHandler>])
        .unwrap();
        assert!(ModeCatalog::builtin().check_tools(&tools).is_err());
    }
}
