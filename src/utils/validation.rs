use crate::error::{ClipsightError, Result};

/// 配置验证器
pub struct ConfigValidator;

impl ConfigValidator {
    /// 验证 API Key 格式
    pub fn validate_api_key(api_key: &str) -> Result<()> {
        if api_key.trim().is_empty() {
            return Err(ClipsightError::Config("API key must not be empty".into()));
        }

        if api_key.starts_with("your_") || api_key.contains("placeholder") {
            return Err(ClipsightError::Config(
                "API key looks like a placeholder, provide a real key".into(),
            ));
        }

        Ok(())
    }

    /// 验证 URL 格式
    pub fn validate_url(url: &str) -> Result<()> {
        if url.is_empty() {
            return Err(ClipsightError::Config("URL must not be empty".into()));
        }

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ClipsightError::Config(format!(
                "URL '{url}' must start with http:// or https://"
            )));
        }

        Ok(())
    }

    /// 验证模型名称
    pub fn validate_model_name(model: &str) -> Result<()> {
        let trimmed = model.trim();
        if trimmed.is_empty() {
            return Err(ClipsightError::Config("model name must not be empty".into()));
        }

        if trimmed.chars().any(char::is_whitespace) {
            return Err(ClipsightError::Config(format!(
                "model name '{trimmed}' must not contain whitespace"
            )));
        }

        if !trimmed.trim_start_matches("models/").starts_with("gemini") {
            tracing::warn!(model = %trimmed, "model name does not look like a Gemini model");
        }

        Ok(())
    }

    pub fn validate_temperature(temperature: f32) -> Result<()> {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ClipsightError::Config(format!(
                "temperature {temperature} is outside 0.0..=2.0"
            )));
        }
        Ok(())
    }
}
