pub mod builtin;
pub mod dispatcher;
pub mod manifest;
pub mod registry;
pub mod result;
pub mod tool;

pub use builtin::{builtin_handlers, TimecodeHandler};
pub use dispatcher::{DispatchOutcome, SelectionPolicy, ToolCallDispatcher, SELECTION_POLICY};
pub use manifest::ToolDeclaration;
pub use registry::ToolRegistry;
pub use result::{normalize_escaped_apostrophes, timecode_to_seconds, ResultItem};
pub use tool::{ToolHandler, ToolInvocation, ToolKind};
