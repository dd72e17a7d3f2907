use crate::error::{ClipsightError, Result};
use std::env;

pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];
pub const DEBUG_ENV_VAR: &str = "CLIPSIGHT_DEBUG";

/// 环境变量配置管理
pub struct EnvConfig;

impl EnvConfig {
    /// 获取 API Key
    ///
    /// 优先级：
    /// 1. 直接传入的值（非 `${VAR}` 形式）
    /// 2. `${VAR_NAME}` 形式时读取对应环境变量
    /// 3. 为空时依次读取 `GEMINI_API_KEY`、`GOOGLE_API_KEY`
    pub fn get_api_key(api_key: &str) -> Result<String> {
        let trimmed = api_key.trim();
        if trimmed.starts_with("${") && trimmed.ends_with('}') {
            let env_var_name = &trimmed[2..trimmed.len() - 1];
            Self::get_env(env_var_name)
        } else if trimmed.is_empty() {
            API_KEY_ENV_VARS
                .iter()
                .find_map(|key| Self::get_env_optional(key))
                .ok_or_else(|| {
                    ClipsightError::Config(format!(
                        "no API key configured; set one of {}",
                        API_KEY_ENV_VARS.join(", ")
                    ))
                })
        } else {
            Ok(trimmed.to_string())
        }
    }

    pub fn get_env(key: &str) -> Result<String> {
        Self::get_env_optional(key).ok_or_else(|| {
            ClipsightError::Config(format!("environment variable '{key}' is not set"))
        })
    }

    /// 获取可选的环境变量，空字符串视为未设置
    pub fn get_env_optional(key: &str) -> Option<String> {
        env::var(key)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    pub fn get_env_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
        match Self::get_env_optional(key) {
            Some(raw) => raw.parse::<T>().map(Some).map_err(|_| {
                ClipsightError::Config(format!("environment variable '{key}' has invalid value '{raw}'"))
            }),
            None => Ok(None),
        }
    }

    pub fn is_debug_mode() -> bool {
        env::var(DEBUG_ENV_VAR).is_ok()
    }
}
