pub mod generate;
pub mod history;
pub mod plan;
pub mod view;
