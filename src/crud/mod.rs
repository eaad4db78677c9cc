pub mod db;
pub mod sets;
pub mod usage;

pub use db::DB;
pub use sets::{SavedSet, SavedSetSummary};
