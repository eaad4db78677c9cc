use crate::config::GenerationSettings;
use crate::error::{GenerateError, GenerateResult};
use crate::utils::trim_line;

pub const CARD_COUNT: usize = 10;

const SYSTEM_PROMPT: &str = "You are a helpful assistant that creates flashcards.";

/// A topic with surrounding whitespace removed. Never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topic(String);

impl Topic {
    pub fn parse(raw: &str) -> GenerateResult<Self> {
        trim_line(raw)
            .map(|topic| Self(topic.to_string()))
            .ok_or(GenerateError::EmptyTopic)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    System,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
    pub topic: Topic,
    pub count: usize,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    system_prompt: bool,
}

impl GenerationRequest {
    pub fn new(topic: Topic, settings: &GenerationSettings) -> Self {
        Self {
            topic,
            count: CARD_COUNT,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            system_prompt: settings.system_prompt,
        }
    }

    pub fn user_prompt(&self) -> String {
        format!(
            "Create {count} flashcards about {topic}. \
             Format each flashcard as a JSON object with 'question' and 'answer' fields. \
             Return the flashcards as a JSON array.",
            count = self.count,
            topic = self.topic.as_str(),
        )
    }

    pub fn messages(&self) -> Vec<PromptMessage> {
        let mut messages = Vec::with_capacity(2);
        if self.system_prompt {
            messages.push(PromptMessage {
                role: Role::System,
                content: SYSTEM_PROMPT.to_string(),
            });
        }
        messages.push(PromptMessage {
            role: Role::User,
            content: self.user_prompt(),
        });
        messages
    }
}
