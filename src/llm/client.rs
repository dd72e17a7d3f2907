use std::sync::Arc;

use async_trait::async_trait;

use crate::asset::{Asset, AssetHandle, ProcessingState};
use crate::error::Result;

use super::types::{GenerationRequest, GenerationResponse};

/// 远端资源存储：提交文件与查询处理状态
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn submit_asset(&self, asset: &Asset) -> Result<AssetHandle>;
    async fn query_asset_status(&self, handle: &AssetHandle) -> Result<ProcessingState>;
}

/// 远端生成服务：一次请求，返回模型选择的函数调用
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse>;
}

pub type DynAssetStore = Arc<dyn AssetStore>;
pub type DynContentGenerator = Arc<dyn ContentGenerator>;
