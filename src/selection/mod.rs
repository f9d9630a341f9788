//! Choosing what to practice next.

pub mod difficulty;
pub mod selector;

pub use difficulty::{DifficultyEstimator, RankMode};
pub use selector::{next_text, selector_for, welcome_text, SelectMethod, TextSelector};
