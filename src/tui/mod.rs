pub mod deck;
pub mod theme;

pub use deck::DeckView;
pub use theme::Theme;
