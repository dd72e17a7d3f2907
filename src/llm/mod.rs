pub mod client;
pub mod generation;
pub mod http;
pub mod scripted;
pub mod types;

pub use client::{AssetStore, ContentGenerator, DynAssetStore, DynContentGenerator};
pub use generation::{
    GenerationClient, GenerationSettings, DEFAULT_SYSTEM_INSTRUCTION, DEFAULT_TEMPERATURE,
};
#[cfg(feature = "gemini-client")]
pub use http::GeminiClient;
pub use scripted::ScriptedBackend;
pub use types::{AssetRef, FunctionCall, GenerationRequest, GenerationResponse};
