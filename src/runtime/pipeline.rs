use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::asset::{Asset, AssetReadinessPoller, AssetUploader, PollConfig, ReadyAsset};
use crate::config::PipelineConfig;
use crate::error::{ClipsightError, Result};
use crate::llm::{DynAssetStore, DynContentGenerator, GenerationClient, GenerationSettings};
use crate::prompt::{Mode, ModeInput, PromptCompiler};
use crate::state::{PipelineSession, PipelineState, RunToken};
use crate::tools::{DispatchOutcome, SelectionPolicy, ToolCallDispatcher, ToolRegistry};

/// 上传 → 轮询 → 生成 → 分发 的串行流水线
///
/// 每个用户操作获得一个 `RunToken`；新操作开始时旧操作被取消，
/// 旧操作完成后也不会再写入会话状态。
#[derive(Clone)]
pub struct Pipeline {
    uploader: AssetUploader,
    poller: AssetReadinessPoller,
    generation: GenerationClient,
    tools: Arc<ToolRegistry>,
    dispatcher: ToolCallDispatcher,
    session: Arc<PipelineSession>,
}

impl Pipeline {
    pub fn new(store: DynAssetStore, generator: DynContentGenerator, tools: ToolRegistry) -> Self {
        Self {
            uploader: AssetUploader::new(Arc::clone(&store)),
            poller: AssetReadinessPoller::new(store, PollConfig::default()),
            generation: GenerationClient::new(generator),
            tools: Arc::new(tools),
            dispatcher: ToolCallDispatcher::default(),
            session: Arc::new(PipelineSession::new()),
        }
    }

    pub fn from_config(
        store: DynAssetStore,
        generator: DynContentGenerator,
        tools: ToolRegistry,
        config: &PipelineConfig,
    ) -> Self {
        Self::new(store, generator, tools)
            .with_poll_config(config.poll_config())
            .with_generation_settings(config.generation_settings())
            .with_selection_policy(config.selection_policy)
    }

    pub fn with_poll_config(mut self, config: PollConfig) -> Self {
        self.poller = AssetReadinessPoller::new(self.uploader.store(), config);
        self
    }

    pub fn with_generation_settings(mut self, settings: GenerationSettings) -> Self {
        self.generation = GenerationClient::with_settings(self.generation.backend(), settings);
        self
    }

    pub fn with_selection_policy(mut self, policy: SelectionPolicy) -> Self {
        self.dispatcher = ToolCallDispatcher::new(policy);
        self
    }

    pub fn with_session(mut self, session: Arc<PipelineSession>) -> Self {
        self.session = session;
        self
    }

    pub fn session(&self) -> Arc<PipelineSession> {
        Arc::clone(&self.session)
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// 上传新资源并等待其可用；会取代任何进行中的操作
    pub async fn ingest(&self, asset: Asset) -> Result<ReadyAsset> {
        let (token, cancel) = self.session.begin_run();
        let outcome = self.ingest_with(token, &cancel, asset).await;
        self.finish(token, outcome)
    }

    /// 使用会话中已就绪的资源执行一次分析
    pub async fn analyze(&self, mode: &Mode, input: &ModeInput) -> Result<DispatchOutcome> {
        let asset = self.session.ready_asset().ok_or_else(|| {
            ClipsightError::AssetNotReady("no processed asset in session".to_string())
        })?;
        let (token, _cancel) = self.session.begin_run();
        let outcome = self.analyze_with(token, &asset, mode, input).await;
        self.finish(token, outcome)
    }

    /// 完整流程：上传、轮询、生成、分发
    pub async fn run(
        &self,
        asset: Asset,
        mode: &Mode,
        input: &ModeInput,
    ) -> Result<DispatchOutcome> {
        let (token, cancel) = self.session.begin_run();
        let outcome = match self.ingest_with(token, &cancel, asset).await {
            Ok(ready) => self.analyze_with(token, &ready, mode, input).await,
            Err(err) => Err(err),
        };
        self.finish(token, outcome)
    }

    #[instrument(skip_all, fields(run = token.generation(), name = %asset.display_name))]
    async fn ingest_with(
        &self,
        token: RunToken,
        cancel: &CancellationToken,
        asset: Asset,
    ) -> Result<ReadyAsset> {
        asset.validate()?;
        self.session.start_upload(token)?;

        let handle = self.uploader.submit(asset).await?;
        self.session
            .set_asset(token, handle.clone(), PipelineState::WaitingForProcessing)?;

        let ready = self.poller.await_ready(handle, cancel).await?;
        self.session
            .set_asset(token, ready.handle().clone(), PipelineState::Ready)?;
        Ok(ready)
    }

    #[instrument(skip_all, fields(run = token.generation(), mode = %mode.name))]
    async fn analyze_with(
        &self,
        token: RunToken,
        asset: &ReadyAsset,
        mode: &Mode,
        input: &ModeInput,
    ) -> Result<DispatchOutcome> {
        let prompt = PromptCompiler::compile(mode, input)?;
        if !self.tools.contains(prompt.tool) {
            error!(tool = %prompt.tool, mode = %mode.name, "mode expects an undeclared tool");
            return Err(ClipsightError::ContractViolation(format!(
                "mode `{}` expects tool `{}` which is not declared",
                mode.name, prompt.tool
            )));
        }
        self.session
            .start_generation(token, &prompt.mode, prompt.label.clone())?;

        let response = self
            .generation
            .generate(&prompt.text, &self.tools, asset)
            .await?;
        if !self.session.is_current(token) {
            return Err(ClipsightError::StaleRun(token.generation()));
        }

        let outcome = self.dispatcher.dispatch(&response, &self.tools)?;
        match &outcome {
            DispatchOutcome::Items(items) => {
                self.session.replace_results(token, items.clone())?;
            }
            DispatchOutcome::NoOp => {
                self.session.set_state(token, PipelineState::Ready)?;
            }
        }
        Ok(outcome)
    }

    fn finish<T>(&self, token: RunToken, outcome: Result<T>) -> Result<T> {
        match outcome {
            Err(err) if !self.session.is_current(token) => {
                warn!(run = token.generation(), error = %err, "run superseded");
                Err(ClipsightError::StaleRun(token.generation()))
            }
            Ok(value) => {
                info!(run = token.generation(), "run completed");
                Ok(value)
            }
            Err(err) if err.is_abandoned() => {
                warn!(run = token.generation(), error = %err, "run abandoned");
                Err(err)
            }
            Err(err) => {
                error!(run = token.generation(), error = %err, "run failed");
                let _ = self.session.fail(token, err.to_string());
                Err(err)
            }
        }
    }
}
