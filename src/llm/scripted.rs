use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::asset::{Asset, AssetHandle, ProcessingState};
use crate::error::{ClipsightError, Result};

use super::client::{AssetStore, ContentGenerator};
use super::types::{GenerationRequest, GenerationResponse};

/// 本地脚本化后端
///
/// 按预设顺序回放处理状态和生成响应，并记录每一次调用。
/// 状态队列只剩最后一项时会一直返回该项；队列为空时视为 Ready。
/// 响应队列耗尽后返回不含函数调用的空响应。
#[derive(Default)]
pub struct ScriptedBackend {
    inner: Mutex<ScriptState>,
}

#[derive(Default)]
struct ScriptState {
    statuses: VecDeque<ProcessingState>,
    responses: VecDeque<(GenerationResponse, Option<Duration>)>,
    submit_failure: Option<String>,
    generate_failure: Option<String>,
    generate_delay: Option<Duration>,
    submitted: Vec<String>,
    status_queries: usize,
    requests: Vec<GenerationRequest>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_statuses(self, statuses: impl IntoIterator<Item = ProcessingState>) -> Self {
        self.inner.lock().statuses.extend(statuses);
        self
    }

    pub fn with_response(self, response: GenerationResponse) -> Self {
        self.inner.lock().responses.push_back((response, None));
        self
    }

    pub fn with_delayed_response(self, response: GenerationResponse, delay: Duration) -> Self {
        self.inner.lock().responses.push_back((response, Some(delay)));
        self
    }

    pub fn with_submit_failure(self, reason: impl Into<String>) -> Self {
        self.inner.lock().submit_failure = Some(reason.into());
        self
    }

    pub fn with_generate_failure(self, reason: impl Into<String>) -> Self {
        self.inner.lock().generate_failure = Some(reason.into());
        self
    }

    /// 每次生成调用（无论成功失败）返回前的等待时间
    pub fn with_generate_delay(self, delay: Duration) -> Self {
        self.inner.lock().generate_delay = Some(delay);
        self
    }

    pub fn submit_count(&self) -> usize {
        self.inner.lock().submitted.len()
    }

    pub fn submitted_names(&self) -> Vec<String> {
        self.inner.lock().submitted.clone()
    }

    pub fn status_query_count(&self) -> usize {
        self.inner.lock().status_queries
    }

    pub fn generate_count(&self) -> usize {
        self.inner.lock().requests.len()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.inner.lock().requests.clone()
    }
}

#[async_trait]
impl AssetStore for ScriptedBackend {
    async fn submit_asset(&self, asset: &Asset) -> Result<AssetHandle> {
        let mut state = self.inner.lock();
        if let Some(reason) = &state.submit_failure {
            return Err(ClipsightError::Transport(reason.clone()));
        }
        state.submitted.push(asset.display_name.clone());
        let id = format!("files/scripted-{}", state.submitted.len());
        Ok(AssetHandle {
            uri: format!("scripted://{id}"),
            id,
            mime_type: asset.mime_type.clone(),
            display_name: asset.display_name.clone(),
            state: ProcessingState::Pending,
        })
    }

    async fn query_asset_status(&self, _handle: &AssetHandle) -> Result<ProcessingState> {
        let mut state = self.inner.lock();
        state.status_queries += 1;
        let next = if state.statuses.len() > 1 {
            state.statuses.pop_front()
        } else {
            state.statuses.front().copied()
        };
        Ok(next.unwrap_or(ProcessingState::Ready))
    }
}

#[async_trait]
impl ContentGenerator for ScriptedBackend {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        let (outcome, delay) = {
            let mut state = self.inner.lock();
            state.requests.push(request);
            match &state.generate_failure {
                Some(reason) => (
                    Err(ClipsightError::Transport(reason.clone())),
                    state.generate_delay,
                ),
                None => {
                    let (response, delay) = state.responses.pop_front().unwrap_or_default();
                    (Ok(response), delay.or(state.generate_delay))
                }
            }
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        outcome
    }
}
