use tracing::{debug, info, instrument};

use crate::asset::ReadyAsset;
use crate::error::Result;
use crate::tools::ToolRegistry;

use super::client::DynContentGenerator;
use super::types::{AssetRef, GenerationRequest, GenerationResponse};

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "When given a video and a query, call the relevant \
function only once with the appropriate timecodes and text for the video";
pub const DEFAULT_TEMPERATURE: f32 = 0.5;

#[derive(Clone, Debug, PartialEq)]
pub struct GenerationSettings {
    pub system_instruction: String,
    pub temperature: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// 生成客户端：单次请求，不做内部重试
#[derive(Clone)]
pub struct GenerationClient {
    backend: DynContentGenerator,
    settings: GenerationSettings,
}

impl GenerationClient {
    pub fn new(backend: DynContentGenerator) -> Self {
        Self::with_settings(backend, GenerationSettings::default())
    }

    pub fn with_settings(backend: DynContentGenerator, settings: GenerationSettings) -> Self {
        Self { backend, settings }
    }

    pub fn backend(&self) -> DynContentGenerator {
        std::sync::Arc::clone(&self.backend)
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn build_request(
        &self,
        prompt: &str,
        tools: &ToolRegistry,
        asset: &ReadyAsset,
    ) -> GenerationRequest {
        GenerationRequest {
            prompt: prompt.to_string(),
            system_instruction: self.settings.system_instruction.clone(),
            temperature: self.settings.temperature,
            asset: AssetRef {
                uri: asset.uri.clone(),
                mime_type: asset.mime_type.clone(),
            },
            function_declarations: tools.declarations(),
        }
    }

    #[instrument(skip_all, fields(asset = %asset.id, tools = tools.len()))]
    pub async fn generate(
        &self,
        prompt: &str,
        tools: &ToolRegistry,
        asset: &ReadyAsset,
    ) -> Result<GenerationResponse> {
        let request = self.build_request(prompt, tools, asset);
        debug!(prompt = %request.prompt, temperature = request.temperature, "sending generation request");
        let response = self.backend.generate(request).await?;
        info!(calls = response.function_calls.len(), "generation response received");
        Ok(response)
    }
}
