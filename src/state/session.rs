use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::asset::{AssetHandle, ProcessingState, ReadyAsset};
use crate::error::{ClipsightError, Result};
use crate::tools::ResultItem;

/// 提供给 UI 层的流水线状态
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum PipelineState {
    #[default]
    Idle,
    UploadingAsset,
    WaitingForProcessing,
    AwaitingGeneration,
    Ready,
    Errored(String),
}

impl PipelineState {
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            PipelineState::UploadingAsset
                | PipelineState::WaitingForProcessing
                | PipelineState::AwaitingGeneration
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => f.write_str("idle"),
            PipelineState::UploadingAsset => f.write_str("uploading asset"),
            PipelineState::WaitingForProcessing => f.write_str("waiting for processing"),
            PipelineState::AwaitingGeneration => f.write_str("awaiting generation"),
            PipelineState::Ready => f.write_str("ready"),
            PipelineState::Errored(reason) => write!(f, "error: {reason}"),
        }
    }
}

/// 每次用户操作对应的代号，只有最新的代号可以修改会话
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RunToken(u64);

impl RunToken {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionSnapshot {
    pub generation: u64,
    pub state: PipelineState,
    pub asset: Option<AssetHandle>,
    pub results: Option<Vec<ResultItem>>,
    pub active_mode: Option<String>,
    pub label: Option<String>,
}

struct SessionInner {
    snapshot: SessionSnapshot,
    cancel: CancellationToken,
}

/// 进程内唯一的"当前资源 + 当前结果"状态机
pub struct PipelineSession {
    inner: RwLock<SessionInner>,
    state_tx: watch::Sender<PipelineState>,
}

impl Default for PipelineSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineSession {
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(PipelineState::Idle);
        Self {
            inner: RwLock::new(SessionInner {
                snapshot: SessionSnapshot::default(),
                cancel: CancellationToken::new(),
            }),
            state_tx,
        }
    }

    /// 开始新的一次操作：取消上一操作的令牌并返回新的代号
    pub fn begin_run(&self) -> (RunToken, CancellationToken) {
        let mut inner = self.inner.write();
        inner.cancel.cancel();
        inner.cancel = CancellationToken::new();
        inner.snapshot.generation += 1;
        let token = RunToken(inner.snapshot.generation);
        debug!(generation = token.0, "run started");
        (token, inner.cancel.clone())
    }

    pub fn is_current(&self, token: RunToken) -> bool {
        self.inner.read().snapshot.generation == token.0
    }

    /// 取消当前操作并作废其代号
    ///
    /// 已提交的资源与结果保留；资源已就绪时回到 Ready，否则回到 Idle。
    pub fn cancel_current(&self) {
        let state = {
            let mut inner = self.inner.write();
            inner.cancel.cancel();
            inner.cancel = CancellationToken::new();
            inner.snapshot.generation += 1;
            let ready = inner
                .snapshot
                .asset
                .as_ref()
                .is_some_and(|asset| asset.state == ProcessingState::Ready);
            inner.snapshot.state = if ready {
                PipelineState::Ready
            } else {
                PipelineState::Idle
            };
            debug!(generation = inner.snapshot.generation, "current run cancelled");
            inner.snapshot.state.clone()
        };
        self.state_tx.send_replace(state);
    }

    fn apply<F>(&self, token: RunToken, f: F) -> Result<()>
    where
        F: FnOnce(&mut SessionSnapshot),
    {
        let state = {
            let mut inner = self.inner.write();
            if inner.snapshot.generation != token.0 {
                debug!(
                    stale = token.0,
                    current = inner.snapshot.generation,
                    "discarding stale update"
                );
                return Err(ClipsightError::StaleRun(token.0));
            }
            f(&mut inner.snapshot);
            inner.snapshot.state.clone()
        };
        self.state_tx.send_replace(state);
        Ok(())
    }

    pub fn set_state(&self, token: RunToken, state: PipelineState) -> Result<()> {
        self.apply(token, |snapshot| snapshot.state = state)
    }

    /// 新资源开始上传：旧资源与旧结果一并作废
    pub fn start_upload(&self, token: RunToken) -> Result<()> {
        self.apply(token, |snapshot| {
            snapshot.asset = None;
            snapshot.results = None;
            snapshot.active_mode = None;
            snapshot.label = None;
            snapshot.state = PipelineState::UploadingAsset;
        })
    }

    pub fn set_asset(&self, token: RunToken, asset: AssetHandle, state: PipelineState) -> Result<()> {
        self.apply(token, |snapshot| {
            snapshot.asset = Some(asset);
            snapshot.state = state;
        })
    }

    pub fn start_generation(&self, token: RunToken, mode: &str, label: Option<String>) -> Result<()> {
        let mode = mode.to_string();
        self.apply(token, |snapshot| {
            snapshot.active_mode = Some(mode);
            snapshot.label = label;
            snapshot.state = PipelineState::AwaitingGeneration;
        })
    }

    /// 整体替换结果列表
    pub fn replace_results(&self, token: RunToken, results: Vec<ResultItem>) -> Result<()> {
        self.apply(token, |snapshot| {
            snapshot.results = Some(results);
            snapshot.state = PipelineState::Ready;
        })
    }

    pub fn fail(&self, token: RunToken, reason: impl Into<String>) -> Result<()> {
        let reason = reason.into();
        self.apply(token, |snapshot| snapshot.state = PipelineState::Errored(reason))
    }

    pub fn ready_asset(&self) -> Option<ReadyAsset> {
        self.inner
            .read()
            .snapshot
            .asset
            .clone()
            .and_then(|handle| ReadyAsset::try_from(handle).ok())
    }

    pub fn state(&self) -> PipelineState {
        self.inner.read().snapshot.state.clone()
    }

    pub fn results(&self) -> Option<Vec<ResultItem>> {
        self.inner.read().snapshot.results.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.read().snapshot.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.state_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_run_invalidates_older_token() {
        let session = PipelineSession::new();
        let (first, first_cancel) = session.begin_run();
        let (second, _) = session.begin_run();

        assert!(first_cancel.is_cancelled());
        assert!(!session.is_current(first));
        assert!(session.is_current(second));
        assert!(matches!(
            session.replace_results(first, vec![ResultItem::new("00:01")]),
            Err(ClipsightError::StaleRun(1))
        ));
        assert_eq!(session.results(), None);

        session
            .replace_results(second, vec![ResultItem::new("00:02")])
            .unwrap();
        assert_eq!(session.results().unwrap()[0].time, "00:02");
        assert_eq!(session.state(), PipelineState::Ready);
    }

    #[test]
    fn subscribers_observe_transitions() {
        let session = PipelineSession::new();
        let rx = session.subscribe();
        let (token, _) = session.begin_run();
        session.start_upload(token).unwrap();
        assert_eq!(*rx.borrow(), PipelineState::UploadingAsset);
        session.fail(token, "boom").unwrap();
        assert_eq!(*rx.borrow(), PipelineState::Errored("boom".into()));
    }

    #[test]
    fn cancel_current_leaves_no_busy_state() {
        let session = PipelineSession::new();
        let (token, cancel) = session.begin_run();
        session.start_upload(token).unwrap();

        session.cancel_current();

        assert!(cancel.is_cancelled());
        assert!(!session.is_current(token));
        assert_eq!(session.state(), PipelineState::Idle);
        assert!(matches!(
            session.set_state(token, PipelineState::Ready),
            Err(ClipsightError::StaleRun(_))
        ));
    }
}
