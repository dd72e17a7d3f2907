pub mod asset;
pub mod config;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod runtime;
pub mod state;
pub mod tools;
pub mod utils;

pub use asset::{
    Asset, AssetHandle, AssetReadinessPoller, AssetUploader, PollConfig, ProcessingState,
    ReadyAsset,
};
pub use config::{EnvConfig, PipelineConfig};
pub use error::{ClipsightError, Result};
#[cfg(feature = "gemini-client")]
pub use llm::GeminiClient;
pub use llm::{
    AssetStore, ContentGenerator, DynAssetStore, DynContentGenerator, FunctionCall,
    GenerationClient, GenerationRequest, GenerationResponse, GenerationSettings, ScriptedBackend,
    DEFAULT_SYSTEM_INSTRUCTION, DEFAULT_TEMPERATURE,
};
pub use prompt::{CompiledPrompt, InputFocus, Mode, ModeCatalog, ModeInput, PromptCompiler};
pub use runtime::Pipeline;
pub use state::{PipelineSession, PipelineState, RunToken, SessionSnapshot};
pub use tools::{
    DispatchOutcome, ResultItem, SelectionPolicy, ToolCallDispatcher, ToolDeclaration,
    ToolHandler, ToolInvocation, ToolKind, ToolRegistry,
};
pub use utils::{logging, validation};
