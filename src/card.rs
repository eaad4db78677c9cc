use blake3::Hasher;
use serde::{Deserialize, Serialize};

use crate::utils::trim_line;

/// A single question/answer pair. Both sides are non-empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Flashcard {
    question: String,
    answer: String,
}

impl Flashcard {
    /// Returns `None` when either side is blank.
    pub fn new(question: &str, answer: &str) -> Option<Self> {
        let question = trim_line(question)?;
        let answer = trim_line(answer)?;
        Some(Self {
            question: question.to_string(),
            answer: answer.to_string(),
        })
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }
}

#[derive(Deserialize)]
struct RawFlashcard {
    question: String,
    answer: String,
}

impl<'de> Deserialize<'de> for Flashcard {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawFlashcard::deserialize(deserializer)?;
        Flashcard::new(&raw.question, &raw.answer)
            .ok_or_else(|| serde::de::Error::custom("flashcard question and answer must be non-empty"))
    }
}

/// Cards in the order they were generated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlashcardSet {
    cards: Vec<Flashcard>,
}

impl FlashcardSet {
    pub fn new(cards: Vec<Flashcard>) -> Self {
        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Flashcard> {
        self.cards.iter()
    }

    pub fn cards(&self) -> &[Flashcard] {
        &self.cards
    }

    pub fn get(&self, idx: usize) -> Option<&Flashcard> {
        self.cards.get(idx)
    }

    /// Stable digest of the deck contents. Case and whitespace runs are
    /// ignored so a re-generated deck with cosmetic differences hashes the same.
    pub fn content_hash(&self) -> String {
        let mut hasher = Hasher::new();
        for card in &self.cards {
            hasher.update(normalize(&card.question).as_bytes());
            hasher.update(b"\x1f");
            hasher.update(normalize(&card.answer).as_bytes());
            hasher.update(b"\x1e");
        }
        hasher.finalize().to_string()
    }
}

impl From<Vec<Flashcard>> for FlashcardSet {
    fn from(cards: Vec<Flashcard>) -> Self {
        Self::new(cards)
    }
}

impl IntoIterator for FlashcardSet {
    type Item = Flashcard;
    type IntoIter = std::vec::IntoIter<Flashcard>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.into_iter()
    }
}

impl<'a> IntoIterator for &'a FlashcardSet {
    type Item = &'a Flashcard;
    type IntoIter = std::slice::Iter<'a, Flashcard>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.iter()
    }
}

fn normalize(s: &str) -> String {
    s.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_sides_are_rejected() {
        assert!(Flashcard::new("", "A").is_none());
        assert!(Flashcard::new("Q", "   ").is_none());
        assert!(Flashcard::new("\n\t", "\n").is_none());
    }

    #[test]
    fn sides_are_trimmed() {
        let card = Flashcard::new("  What?  ", "\nThat.\n").unwrap();
        assert_eq!(card.question(), "What?");
        assert_eq!(card.answer(), "That.");
    }

    #[test]
    fn deserialize_rejects_empty_answer() {
        let err = serde_json::from_str::<Flashcard>(r#"{"question":"Q","answer":""}"#);
        assert!(err.is_err());

        let err = serde_json::from_str::<Flashcard>(r#"{"question":"Q"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn set_serializes_as_plain_array() {
        let set = FlashcardSet::new(vec![Flashcard::new("Q", "A").unwrap()]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"[{"question":"Q","answer":"A"}]"#);

        let back: FlashcardSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn content_hash_ignores_case_and_spacing() {
        let a = FlashcardSet::new(vec![Flashcard::new("What  is Rust?", "A language").unwrap()]);
        let b = FlashcardSet::new(vec![Flashcard::new("what is rust?", "a   LANGUAGE").unwrap()]);
        let c = FlashcardSet::new(vec![Flashcard::new("What is Go?", "A language").unwrap()]);

        assert_eq!(a.content_hash(), b.content_hash());
        assert_ne!(a.content_hash(), c.content_hash());
    }

    #[test]
    fn content_hash_depends_on_order() {
        let q1 = Flashcard::new("Q1", "A1").unwrap();
        let q2 = Flashcard::new("Q2", "A2").unwrap();
        let forward = FlashcardSet::new(vec![q1.clone(), q2.clone()]);
        let reversed = FlashcardSet::new(vec![q2, q1]);
        assert_ne!(forward.content_hash(), reversed.content_hash());
    }
}
