pub mod completion;
pub mod health;
pub mod orchestrator;
pub mod prompt_store;

pub use completion::{CompletionBackend, CompletionClient, CompletionError};
pub use health::HealthReporter;
pub use orchestrator::RequestOrchestrator;
pub use prompt_store::{PromptStore, PromptStoreError};
