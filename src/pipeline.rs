//! Topic in, flashcards out.
//!
//! [`Generator::generate`] runs prompt building, the completion call and
//! extraction. Generation and extraction failures are logged and replaced
//! with the configured fallback deck, so the only error a caller can see is
//! [`GenerateError::EmptyTopic`].

use std::fmt;
use std::str::FromStr;

use tracing::{info, warn};

use crate::card::{Flashcard, FlashcardSet};
use crate::config::GenerationSettings;
use crate::error::{GenerateError, GenerateResult};
use crate::llm::completion::TextGenerator;
use crate::llm::extract::extract_flashcards;
use crate::llm::prompt::{GenerationRequest, Topic};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FallbackReason {
    Generation,
    Extraction,
}

impl FallbackReason {
    fn from_error(err: &GenerateError) -> Self {
        match err {
            GenerateError::ExtractionFailed(_) => FallbackReason::Extraction,
            _ => FallbackReason::Generation,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FallbackReason::Generation => "generation",
            FallbackReason::Extraction => "extraction",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardSource {
    Generated,
    Fallback { reason: FallbackReason },
}

impl CardSource {
    pub fn label(&self) -> &'static str {
        match self {
            CardSource::Generated => "generated",
            CardSource::Fallback { reason } => match reason {
                FallbackReason::Generation => "fallback:generation",
                FallbackReason::Extraction => "fallback:extraction",
            },
        }
    }
}

/// The outcome of one generation: always a renderable, non-empty deck.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Generation {
    pub topic: Topic,
    pub cards: FlashcardSet,
    pub source: CardSource,
}

impl Generation {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, CardSource::Fallback { .. })
    }
}

/// What to show when the model can't be reached or its answer can't be read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// A fixed sample deck.
    #[default]
    DefaultDeck,
    /// A single card describing what went wrong.
    FailureNotice,
}

impl FallbackPolicy {
    pub fn cards_for(&self, reason: FallbackReason) -> FlashcardSet {
        let (question, answer) = match self {
            FallbackPolicy::DefaultDeck => ("What is the tallest mountain?", "Mount Everest"),
            FallbackPolicy::FailureNotice => (
                "Flashcards could not be generated",
                match reason {
                    FallbackReason::Generation => "The generation service did not respond.",
                    FallbackReason::Extraction => {
                        "The generation service returned an answer that could not be read."
                    }
                },
            ),
        };
        Flashcard::new(question, answer)
            .map(|card| FlashcardSet::new(vec![card]))
            .unwrap_or_default()
    }
}

impl FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" | "deck" => Ok(FallbackPolicy::DefaultDeck),
            "notice" => Ok(FallbackPolicy::FailureNotice),
            other => Err(format!(
                "unknown fallback '{other}' (expected default or notice)"
            )),
        }
    }
}

pub struct Generator<G> {
    client: G,
    settings: GenerationSettings,
    fallback: FallbackPolicy,
}

impl<G: TextGenerator> Generator<G> {
    pub fn new(client: G, settings: GenerationSettings, fallback: FallbackPolicy) -> Self {
        Self {
            client,
            settings,
            fallback,
        }
    }

    pub fn client(&self) -> &G {
        &self.client
    }

    pub async fn generate(&self, topic: &str) -> GenerateResult<Generation> {
        let topic = Topic::parse(topic)?;
        let request = GenerationRequest::new(topic.clone(), &self.settings);

        let outcome = match self.client.complete(&request).await {
            Ok(raw) => extract_flashcards(&raw),
            Err(err) => Err(err),
        };

        let generation = match outcome {
            Ok(cards) => {
                info!(topic = topic.as_str(), cards = cards.len(), "generated flashcards");
                Generation {
                    topic,
                    cards,
                    source: CardSource::Generated,
                }
            }
            Err(err) => {
                let reason = FallbackReason::from_error(&err);
                warn!(
                    topic = topic.as_str(),
                    reason = reason.label(),
                    error = %err,
                    "using fallback flashcards"
                );
                Generation {
                    topic,
                    cards: self.fallback.cards_for(reason),
                    source: CardSource::Fallback { reason },
                }
            }
        };

        Ok(generation)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum GenerationState {
    #[default]
    Idle,
    Requesting,
    Ready(Generation),
}

impl fmt::Display for GenerationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationState::Idle => f.write_str("idle"),
            GenerationState::Requesting => f.write_str("requesting"),
            GenerationState::Ready(generation) => {
                write!(f, "ready ({})", generation.source.label())
            }
        }
    }
}

/// Holds the latest deck for one caller. `generate` takes `&mut self`, so a
/// second request cannot start while one is in flight.
pub struct Session<G> {
    generator: Generator<G>,
    state: GenerationState,
}

impl<G: TextGenerator> Session<G> {
    pub fn new(generator: Generator<G>) -> Self {
        Self {
            generator,
            state: GenerationState::Idle,
        }
    }

    pub fn state(&self) -> &GenerationState {
        &self.state
    }

    pub fn current(&self) -> Option<&Generation> {
        match &self.state {
            GenerationState::Ready(generation) => Some(generation),
            _ => None,
        }
    }

    /// Returns `None` for a blank topic, in which case nothing is sent and
    /// the previous state is kept.
    pub async fn generate(&mut self, topic: &str) -> Option<&Generation> {
        if Topic::parse(topic).is_err() {
            return None;
        }

        let previous = std::mem::replace(&mut self.state, GenerationState::Requesting);
        match self.generator.generate(topic).await {
            Ok(generation) => self.state = GenerationState::Ready(generation),
            Err(_) => self.state = previous,
        }
        self.current()
    }
}
