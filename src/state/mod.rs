pub mod session;

pub use session::{PipelineSession, PipelineState, RunToken, SessionSnapshot};
