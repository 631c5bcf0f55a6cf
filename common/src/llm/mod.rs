pub mod model;
pub mod ollama;
pub mod scripted;

pub use model::{LanguageModel, Message, MessageRole};
pub use ollama::{OllamaConfig, OllamaModel};
pub use scripted::ScriptedModel;
