use std::sync::Arc;

use tracing::{info, instrument};

use crate::error::Result;
use crate::llm::DynAssetStore;

use super::types::{Asset, AssetHandle};

/// 资源上传器：校验媒体类型后提交到远端存储，不做重试
#[derive(Clone)]
pub struct AssetUploader {
    store: DynAssetStore,
}

impl AssetUploader {
    pub fn new(store: DynAssetStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> DynAssetStore {
        Arc::clone(&self.store)
    }

    #[instrument(skip(self, asset), fields(name = %asset.display_name, mime = %asset.mime_type))]
    pub async fn submit(&self, asset: Asset) -> Result<AssetHandle> {
        asset.validate()?;
        let handle = self.store.submit_asset(&asset).await?;
        info!(
            asset = %handle.id,
            bytes = asset.size_bytes(),
            state = ?handle.state,
            "asset accepted by remote store"
        );
        Ok(handle)
    }
}
