//! Turning prose and word lists into practice texts.

pub mod drill;
pub mod packing;
pub mod sentences;

pub use drill::{generate_drill, plain_lessons, review_text, DrillOptions, Mix};
pub use packing::{mine_lessons, pack_lessons, LessonPacker, Piece};
pub use sentences::{paragraphs, split_sentences, SentenceSplitter};
