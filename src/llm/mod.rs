pub mod client;
pub mod completion;
pub mod extract;
pub mod prompt;
pub mod secrets;

pub use client::{ensure_client, test_configured_api_key};
pub use completion::{ChatCompletionClient, TextGenerator, parse_completion_envelope};
pub use extract::extract_flashcards;
pub use prompt::{CARD_COUNT, GenerationRequest, Topic};
pub use secrets::{AuthStore, provider_for};
