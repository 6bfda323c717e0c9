pub mod ai;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod framework;
pub mod logging;
pub mod notify;
pub mod preview;
pub mod prompt;
pub mod provider;
pub mod session;

// Re-export main types for convenience
pub use ai::GenerationClient;
pub use config::Config;
pub use error::{ActionError, SubmitError};
pub use extract::extract_code;
pub use framework::Framework;
pub use prompt::GenerationRequest;
pub use provider::Provider;
pub use session::{Completion, GenerationResult, Phase, RequestToken, Session, Tab, ViewState};
