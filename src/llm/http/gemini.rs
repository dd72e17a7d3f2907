use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::asset::{Asset, AssetHandle, ProcessingState};
use crate::config::{PipelineConfig, DEFAULT_API_BASE, DEFAULT_UPLOAD_BASE};
use crate::error::{ClipsightError, Result};
use crate::llm::client::{AssetStore, ContentGenerator};
use crate::llm::types::{FunctionCall, GenerationRequest, GenerationResponse};

/// Generative Language REST API 客户端
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_base: String,
    upload_base: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// 创建 HTTP 客户端
    ///
    /// 上传大文件耗时较长，因此整体超时放宽到 10 分钟。
    fn create_client() -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(600))
            .build()
            .map_err(|e| ClipsightError::Config(format!("failed to build HTTP client: {e}")))
    }

    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::with_base_urls(DEFAULT_API_BASE, DEFAULT_UPLOAD_BASE, api_key, model)
    }

    pub fn with_base_urls(
        api_base: impl Into<String>,
        upload_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            client: Self::create_client()?,
            api_base: trim_base(api_base.into()),
            upload_base: trim_base(upload_base.into()),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let api_key = config.resolve_api_key()?;
        Self::with_base_urls(
            config.api_base.clone(),
            config.upload_base.clone(),
            api_key,
            config.model.clone(),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_url(&self) -> String {
        let trimmed = self.model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    fn status_url(&self, id: &str) -> String {
        format!("{}/{}", self.api_base, id.trim_start_matches('/'))
    }

    async fn read_json(response: reqwest::Response, action: &str) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClipsightError::Transport(format!(
                "{action} failed with status {status}: {body}"
            )));
        }
        response
            .json()
            .await
            .map_err(|e| ClipsightError::Transport(format!("{action} response parse error: {e}")))
    }

    /// 构建 generateContent 请求体
    pub fn build_generate_body(request: &GenerationRequest) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "text": request.prompt },
                    {
                        "fileData": {
                            "mimeType": request.asset.mime_type,
                            "fileUri": request.asset.uri,
                        }
                    }
                ]
            }],
            "systemInstruction": {
                "parts": [{ "text": request.system_instruction }]
            },
            "generationConfig": {
                "temperature": request.temperature,
            },
            "tools": [{
                "functionDeclarations": request.function_declarations,
            }],
        })
    }

    pub fn parse_state(state: &str) -> ProcessingState {
        match state {
            "ACTIVE" => ProcessingState::Ready,
            "FAILED" => ProcessingState::Failed,
            _ => ProcessingState::Pending,
        }
    }

    pub fn parse_file(file: &Value, asset: Option<&Asset>) -> Result<AssetHandle> {
        let id = file["name"]
            .as_str()
            .ok_or_else(|| ClipsightError::Transport("file response missing `name`".into()))?;
        let uri = file["uri"]
            .as_str()
            .ok_or_else(|| ClipsightError::Transport("file response missing `uri`".into()))?;
        let mime_type = file["mimeType"]
            .as_str()
            .map(str::to_string)
            .or_else(|| asset.map(|a| a.mime_type.clone()))
            .unwrap_or_default();
        let display_name = file["displayName"]
            .as_str()
            .map(str::to_string)
            .or_else(|| asset.map(|a| a.display_name.clone()))
            .unwrap_or_default();
        Ok(AssetHandle {
            id: id.to_string(),
            uri: uri.to_string(),
            mime_type,
            display_name,
            state: Self::parse_state(file["state"].as_str().unwrap_or_default()),
        })
    }

    pub fn parse_generate_response(payload: Value) -> GenerationResponse {
        let parts = payload["candidates"]
            .get(0)
            .and_then(|candidate| candidate["content"]["parts"].as_array())
            .cloned()
            .unwrap_or_default();

        let mut function_calls = Vec::new();
        let mut text = String::new();
        for part in &parts {
            if let Some(call) = part.get("functionCall") {
                if let Some(name) = call["name"].as_str() {
                    let args = call.get("args").cloned().unwrap_or_else(|| json!({}));
                    function_calls.push(FunctionCall::new(name, args));
                }
            } else if let Some(chunk) = part["text"].as_str() {
                text.push_str(chunk);
            }
        }

        GenerationResponse {
            function_calls,
            text: (!text.is_empty()).then_some(text),
            metadata: Some(payload),
        }
    }
}

fn trim_base(base: String) -> String {
    base.trim().trim_end_matches('/').to_string()
}

#[async_trait]
impl AssetStore for GeminiClient {
    #[instrument(skip_all, fields(name = %asset.display_name))]
    async fn submit_asset(&self, asset: &Asset) -> Result<AssetHandle> {
        let metadata = json!({ "file": { "display_name": asset.display_name } }).to_string();
        let metadata_part = reqwest::multipart::Part::text(metadata)
            .mime_str("application/json")
            .map_err(|e| ClipsightError::Transport(format!("invalid metadata part: {e}")))?;
        let file_part = reqwest::multipart::Part::bytes(asset.bytes.clone())
            .file_name(asset.display_name.clone())
            .mime_str(&asset.mime_type)
            .map_err(|e| ClipsightError::InvalidInput(format!("invalid mime type: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .part("metadata", metadata_part)
            .part("file", file_part);

        let response = self
            .client
            .post(format!("{}/files", self.upload_base))
            .header("x-goog-api-key", &self.api_key)
            .header("X-Goog-Upload-Protocol", "multipart")
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClipsightError::Transport(format!("upload request error: {e}")))?;

        let payload = Self::read_json(response, "upload").await?;
        Self::parse_file(&payload["file"], Some(asset))
    }

    #[instrument(skip_all, fields(asset = %handle.id))]
    async fn query_asset_status(&self, handle: &AssetHandle) -> Result<ProcessingState> {
        let response = self
            .client
            .get(self.status_url(&handle.id))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| ClipsightError::Transport(format!("status request error: {e}")))?;

        let payload = Self::read_json(response, "status query").await?;
        let state = Self::parse_state(payload["state"].as_str().unwrap_or_default());
        debug!(raw = ?payload["state"], ?state, "file status");
        Ok(state)
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        let body = Self::build_generate_body(&request);
        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClipsightError::Transport(format!("generate request error: {e}")))?;

        let payload = Self::read_json(response, "generate").await?;
        Ok(Self::parse_generate_response(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::AssetRef;
    use crate::tools::ToolRegistry;

    #[test]
    fn maps_remote_file_states() {
        assert_eq!(GeminiClient::parse_state("ACTIVE"), ProcessingState::Ready);
        assert_eq!(GeminiClient::parse_state("FAILED"), ProcessingState::Failed);
        assert_eq!(GeminiClient::parse_state("PROCESSING"), ProcessingState::Pending);
        assert_eq!(
            GeminiClient::parse_state("STATE_UNSPECIFIED"),
            ProcessingState::Pending
        );
    }

    #[test]
    fn parses_uploaded_file() {
        let file = json!({
            "name": "files/abc123",
            "uri": "https://generativelanguage.googleapis.com/v1beta/files/abc123",
            "mimeType": "video/mp4",
            "state": "PROCESSING"
        });
        let handle = GeminiClient::parse_file(&file, None).unwrap();
        assert_eq!(handle.id, "files/abc123");
        assert_eq!(handle.state, ProcessingState::Pending);
        assert!(GeminiClient::parse_file(&json!({ "uri": "x" }), None).is_err());
    }

    #[test]
    fn generate_body_carries_tools_and_settings() {
        let tools = ToolRegistry::builtin().unwrap();
        let request = GenerationRequest {
            prompt: "Describe".into(),
            system_instruction: "call one function".into(),
            temperature: 0.5,
            asset: AssetRef {
                uri: "https://example.test/files/1".into(),
                mime_type: "video/mp4".into(),
            },
            function_declarations: tools.declarations(),
        };
        let body = GeminiClient::build_generate_body(&request);
        assert_eq!(body["generationConfig"]["temperature"], json!(0.5));
        assert_eq!(
            body["contents"][0]["parts"][1]["fileData"]["fileUri"],
            "https://example.test/files/1"
        );
        let declared = body["tools"][0]["functionDeclarations"].as_array().unwrap();
        assert_eq!(declared.len(), 3);
        assert_eq!(declared[0]["name"], "set_timecodes");
    }

    #[test]
    fn extracts_function_calls_in_order() {
        let payload = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "Here you go" },
                        { "functionCall": { "name": "set_timecodes", "args": { "timecodes": [] } } },
                        { "functionCall": { "name": "set_timecodes_with_objects" } }
                    ]
                }
            }]
        });
        let response = GeminiClient::parse_generate_response(payload);
        assert_eq!(response.function_calls.len(), 2);
        assert_eq!(response.function_calls[0].name, "set_timecodes");
        assert_eq!(response.function_calls[1].args, json!({}));
        assert_eq!(response.text.as_deref(), Some("Here you go"));
    }

    #[test]
    fn model_path_is_normalized() {
        let client = GeminiClient::new("key", "models/gemini-2.0-flash-exp").unwrap();
        assert_eq!(
            client.generate_url(),
            format!("{DEFAULT_API_BASE}/models/gemini-2.0-flash-exp:generateContent")
        );
    }
}
