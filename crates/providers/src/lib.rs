pub mod coordinator;
pub mod lead;
pub mod openai;
pub mod prompts;
pub mod registry;
pub mod retry;
pub mod traits;
pub(crate) mod util;

// Re-exports for convenience.
pub use coordinator::RequestCoordinator;
pub use openai::OpenAiAdapter;
pub use registry::{ProviderRegistry, ProviderStatus};
pub use retry::RetryPolicy;
pub use traits::{ChatResponse, ProviderAdapter};
