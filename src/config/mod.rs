pub mod env;
pub mod pipeline_config;

pub use env::EnvConfig;
pub use pipeline_config::{
    PipelineConfig, PollSettings, DEFAULT_API_BASE, DEFAULT_MODEL, DEFAULT_UPLOAD_BASE,
};
