pub mod compiler;
pub mod modes;

pub use compiler::{CompiledPrompt, InputFocus, ModeInput, PromptCompiler};
pub use modes::{Mode, ModeCatalog, PromptTemplate, SubMode, INPUT_PLACEHOLDER};
