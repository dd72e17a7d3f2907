#[cfg(feature = "gemini-client")]
pub mod gemini;

#[cfg(feature = "gemini-client")]
pub use gemini::GeminiClient;
