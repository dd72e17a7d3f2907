use std::time::Duration;

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{ClipsightError, Result};
use crate::llm::DynAssetStore;

use super::types::{AssetHandle, ProcessingState, ReadyAsset};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// 轮询配置，默认与远端行为一致：固定间隔、无上限
#[derive(Clone, Debug, PartialEq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
    pub max_duration: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
            max_duration: None,
        }
    }
}

impl PollConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts.max(1));
        self
    }

    pub fn with_max_duration(mut self, duration: Duration) -> Self {
        self.max_duration = Some(duration);
        self
    }
}

#[derive(Clone)]
pub struct AssetReadinessPoller {
    store: DynAssetStore,
    config: PollConfig,
}

impl AssetReadinessPoller {
    pub fn new(store: DynAssetStore, config: PollConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// 等待资源进入 Ready 状态
    ///
    /// 每次查询前检查取消令牌；查询严格串行，上一次响应返回前不会发出下一次查询。
    pub async fn await_ready(
        &self,
        mut handle: AssetHandle,
        cancel: &CancellationToken,
    ) -> Result<ReadyAsset> {
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                debug!(asset = %handle.id, attempts, "polling abandoned");
                return Err(ClipsightError::Cancelled);
            }

            attempts += 1;
            handle.state = self.store.query_asset_status(&handle).await?;
            debug!(asset = %handle.id, attempt = attempts, state = ?handle.state, "status query");

            match handle.state {
                ProcessingState::Ready => {
                    info!(asset = %handle.id, attempts, "asset ready");
                    return ReadyAsset::try_from(handle);
                }
                ProcessingState::Failed => {
                    warn!(asset = %handle.id, attempts, "asset processing failed");
                    return Err(ClipsightError::ProcessingFailed(handle.id));
                }
                ProcessingState::Pending => {}
            }

            if self.bound_reached(attempts, started) {
                warn!(asset = %handle.id, attempts, "polling bound reached");
                return Err(ClipsightError::PollTimeout {
                    asset: handle.id,
                    attempts,
                });
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(asset = %handle.id, attempts, "polling cancelled during backoff");
                    return Err(ClipsightError::Cancelled);
                }
                _ = sleep(self.config.interval) => {}
            }
        }
    }

    fn bound_reached(&self, attempts: u32, started: Instant) -> bool {
        if let Some(max) = self.config.max_attempts {
            if attempts >= max {
                return true;
            }
        }
        if let Some(limit) = self.config.max_duration {
            if started.elapsed() + self.config.interval > limit {
                return true;
            }
        }
        false
    }
}
