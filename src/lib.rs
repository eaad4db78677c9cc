pub mod card;
pub mod commands;
pub mod config;
pub mod crud;
pub mod entitlement;
pub mod error;
pub mod llm;
pub mod logging;
pub mod palette;
pub mod pipeline;
pub mod tui;
pub mod utils;

pub use card::{Flashcard, FlashcardSet};
pub use error::{GenerateError, GenerateResult};
pub use pipeline::{CardSource, FallbackPolicy, FallbackReason, Generation, Generator, Session};
