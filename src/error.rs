use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClipsightError>;

#[derive(Debug, Error)]
pub enum ClipsightError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("asset `{0}` failed remote processing")]
    ProcessingFailed(String),
    #[error("tool call contract violated: {0}")]
    ContractViolation(String),
    #[error("tool `{0}` declared more than once")]
    DuplicateTool(String),
    #[error("invalid arguments for tool `{tool}`: {reason}")]
    InvalidToolArguments { tool: String, reason: String },
    #[error("asset `{0}` is not ready for generation")]
    AssetNotReady(String),
    #[error("asset `{asset}` still pending after {attempts} status queries")]
    PollTimeout { asset: String, attempts: u32 },
    #[error("operation cancelled")]
    Cancelled,
    #[error("run {0} was superseded by a newer action")]
    StaleRun(u64),
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ClipsightError {
    /// 是否为调用方主动放弃的结果（取消或被新操作取代），这类错误不进入 Errored 状态
    pub fn is_abandoned(&self) -> bool {
        matches!(self, ClipsightError::Cancelled | ClipsightError::StaleRun(_))
    }
}
