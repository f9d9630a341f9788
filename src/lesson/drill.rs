use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How repeated copies of a word group are arranged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
pub enum Mix {
    /// `a b a b a b`
    Concatenate,
    /// copies shuffled together
    Commingle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrillOptions {
    pub copies: usize,
    /// Words per group; 0 takes the whole list at once
    pub take: usize,
    pub mix: Mix,
}

impl Default for DrillOptions {
    fn default() -> Self {
        Self {
            copies: 3,
            take: 2,
            mix: Mix::Concatenate,
        }
    }
}

/// One drill sentence per group of `take` words, each holding `copies`
/// repetitions of the group
pub fn generate_drill<R: Rng + ?Sized>(
    words: &[String],
    opts: DrillOptions,
    rng: &mut R,
) -> Vec<String> {
    let take = if opts.take == 0 { words.len().max(1) } else { opts.take };
    words
        .chunks(take)
        .map(|group| {
            let mut sentence: Vec<&str> = Vec::with_capacity(group.len() * opts.copies);
            for _ in 0..opts.copies {
                sentence.extend(group.iter().map(String::as_str));
            }
            if opts.mix == Mix::Commingle {
                sentence.shuffle(rng);
            }
            sentence.join(" ")
        })
        .collect()
}

/// Text for a review lesson built from words that need practice
pub fn review_text<R: Rng + ?Sized>(words: &[String], opts: DrillOptions, rng: &mut R) -> String {
    generate_drill(words, opts, rng).join(" ")
}

/// Splits `words` into lessons of roughly `per_lesson` words, each repeated
/// `repeats` times and shuffled. `per_lesson` grows until the last lesson is
/// at least half full.
pub fn plain_lessons<R: Rng + ?Sized>(
    words: &[String],
    mut per_lesson: usize,
    repeats: usize,
    rng: &mut R,
) -> Vec<String> {
    if words.is_empty() {
        return Vec::new();
    }
    per_lesson = per_lesson.max(1);
    while {
        let rem = words.len() % per_lesson;
        rem > 0 && rem * 2 < per_lesson
    } {
        per_lesson += 1;
    }

    words
        .chunks(per_lesson)
        .map(|chunk| {
            let mut lesson: Vec<&str> = Vec::with_capacity(chunk.len() * repeats);
            for _ in 0..repeats {
                lesson.extend(chunk.iter().map(String::as_str));
            }
            lesson.shuffle(rng);
            lesson.join(" ")
        })
        .collect()
}
