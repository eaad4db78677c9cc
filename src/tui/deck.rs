use crate::card::{Flashcard, FlashcardSet};

/// Which card is showing and which side is up.
#[derive(Clone, Debug)]
pub struct DeckView {
    cards: FlashcardSet,
    current_idx: usize,
    flipped: bool,
}

impl DeckView {
    pub fn new(cards: FlashcardSet) -> Self {
        Self {
            cards,
            current_idx: 0,
            flipped: false,
        }
    }

    pub fn current(&self) -> Option<&Flashcard> {
        self.cards.get(self.current_idx)
    }

    pub fn position(&self) -> usize {
        self.current_idx
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    /// Text on the side currently facing up.
    pub fn face_text(&self) -> &str {
        match self.current() {
            Some(card) if self.flipped => card.answer(),
            Some(card) => card.question(),
            None => "",
        }
    }

    pub fn flip(&mut self) {
        if !self.is_empty() {
            self.flipped = !self.flipped;
        }
    }

    /// Moves forward; a new card always starts question-side up.
    pub fn next(&mut self) -> bool {
        if self.current_idx + 1 >= self.cards.len() {
            return false;
        }
        self.current_idx += 1;
        self.flipped = false;
        true
    }

    pub fn previous(&mut self) -> bool {
        if self.current_idx == 0 {
            return false;
        }
        self.current_idx -= 1;
        self.flipped = false;
        true
    }
}
