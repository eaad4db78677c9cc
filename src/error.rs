/// Failures of a single flashcard generation.
///
/// Only [`GenerateError::EmptyTopic`] ever reaches callers of the pipeline;
/// the other two are converted into a fallback deck.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("topic is empty")]
    EmptyTopic,
    #[error("generation failed: {0}")]
    GenerationFailed(String),
    #[error("could not extract flashcards: {0}")]
    ExtractionFailed(String),
}

pub type GenerateResult<T> = Result<T, GenerateError>;
