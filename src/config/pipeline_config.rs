use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::asset::PollConfig;
use crate::error::{ClipsightError, Result};
use crate::llm::{GenerationSettings, DEFAULT_SYSTEM_INSTRUCTION, DEFAULT_TEMPERATURE};
use crate::tools::SelectionPolicy;
use crate::utils::validation::ConfigValidator;

use super::env::EnvConfig;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_UPLOAD_BASE: &str = "https://generativelanguage.googleapis.com/upload/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    pub interval_ms: u64,
    pub max_attempts: Option<u32>,
    pub max_duration_secs: Option<u64>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_ms: 5_000,
            max_attempts: None,
            max_duration_secs: None,
        }
    }
}

/// 流水线配置，JSON 文件中缺省的字段使用默认值
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// 直接的 key、`${VAR}` 或留空（读取 GEMINI_API_KEY / GOOGLE_API_KEY）
    pub api_key: String,
    pub api_base: String,
    pub upload_base: String,
    pub model: String,
    pub poll: PollSettings,
    pub temperature: f32,
    pub system_instruction: String,
    pub selection_policy: SelectionPolicy,
    pub modes_file: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            upload_base: DEFAULT_UPLOAD_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            poll: PollSettings::default(),
            temperature: DEFAULT_TEMPERATURE,
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            selection_policy: SelectionPolicy::default(),
            modes_file: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| ClipsightError::Config(format!("invalid config: {e}")))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading pipeline config");
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// 默认配置叠加环境变量
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// 读取 `CLIPSIGHT_*` 环境变量覆盖文件中的配置
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = EnvConfig::get_env_optional("CLIPSIGHT_API_BASE") {
            self.api_base = value;
        }
        if let Some(value) = EnvConfig::get_env_optional("CLIPSIGHT_UPLOAD_BASE") {
            self.upload_base = value;
        }
        if let Some(value) = EnvConfig::get_env_optional("CLIPSIGHT_MODEL") {
            self.model = value;
        }
        if let Some(value) = EnvConfig::get_env_parsed("CLIPSIGHT_POLL_INTERVAL_MS")? {
            self.poll.interval_ms = value;
        }
        if let Some(value) = EnvConfig::get_env_parsed("CLIPSIGHT_POLL_MAX_ATTEMPTS")? {
            self.poll.max_attempts = Some(value);
        }
        if let Some(value) = EnvConfig::get_env_parsed("CLIPSIGHT_POLL_MAX_DURATION_SECS")? {
            self.poll.max_duration_secs = Some(value);
        }
        if let Some(value) = EnvConfig::get_env_parsed("CLIPSIGHT_TEMPERATURE")? {
            self.temperature = value;
        }
        Ok(())
    }

    pub fn resolve_api_key(&self) -> Result<String> {
        let key = EnvConfig::get_api_key(&self.api_key)?;
        ConfigValidator::validate_api_key(&key)?;
        Ok(key)
    }

    pub fn validate(&self) -> Result<()> {
        ConfigValidator::validate_url(&self.api_base)?;
        ConfigValidator::validate_url(&self.upload_base)?;
        ConfigValidator::validate_model_name(&self.model)?;
        ConfigValidator::validate_temperature(self.temperature)?;
        if self.poll.interval_ms == 0 {
            return Err(ClipsightError::Config("poll.interval_ms must be positive".into()));
        }
        if self.poll.max_attempts == Some(0) {
            return Err(ClipsightError::Config("poll.max_attempts must be at least 1".into()));
        }
        Ok(())
    }

    pub fn poll_config(&self) -> PollConfig {
        let mut config = PollConfig::default().with_interval(Duration::from_millis(self.poll.interval_ms));
        if let Some(attempts) = self.poll.max_attempts {
            config = config.with_max_attempts(attempts);
        }
        if let Some(secs) = self.poll.max_duration_secs {
            config = config.with_max_duration(Duration::from_secs(secs));
        }
        config
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            system_instruction: self.system_instruction.clone(),
            temperature: self.temperature,
        }
    }
}
