//! Turns a completed session into a result row, per-unit statistics and
//! mistake counts, and decides whether the text should be repeated.

use crate::aggregate::Statistic;
use crate::engine::{CompletedSession, StartMode};
use crate::error::ScoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// `wpm = WPM_FACTOR / seconds_per_char`: five characters plus a space per
/// word, sixty seconds per minute
pub const WPM_FACTOR: f64 = 12.0;

/// Words shorter than this many characters are not tracked
const MIN_WORD_LEN: usize = 4;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
pub enum UnitKind {
    Char,
    Trigram,
    Word,
}

impl UnitKind {
    pub fn as_i64(self) -> i64 {
        match self {
            UnitKind::Char => 0,
            UnitKind::Trigram => 1,
            UnitKind::Word => 2,
        }
    }

    pub fn from_i64(v: i64) -> Option<Self> {
        match v {
            0 => Some(UnitKind::Char),
            1 => Some(UnitKind::Trigram),
            2 => Some(UnitKind::Word),
            _ => None,
        }
    }
}

/// One completed session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub w: f64,
    pub text_id: String,
    pub source: i64,
    pub wpm: f64,
    pub accuracy: f64,
    pub viscosity: f64,
}

/// Aggregated timing for one unit observed during one session, or a merge of
/// several such rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatBucket {
    pub w: f64,
    pub unit: String,
    pub kind: UnitKind,
    /// median seconds per character
    pub time: f64,
    /// median rhythm irregularity, scaled by 100
    pub viscosity: f64,
    pub count: u32,
    pub mistakes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MistakeRecord {
    pub w: f64,
    pub expected: String,
    pub typed: String,
    pub count: u32,
}

/// What the caller should do next
#[derive(Debug, Clone, PartialEq)]
pub enum PassFail {
    /// Below the minimum speed or accuracy
    Repeat,
    NewText,
    /// Passed, and these words deserve a review lesson
    Review(Vec<String>),
}

/// Minimum speed and accuracy (0..1) for a session to count as passed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub min_wpm: f64,
    pub min_acc: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringPolicy {
    pub text: Thresholds,
    pub lesson: Thresholds,
    /// Keep unit statistics from lesson texts too
    pub use_lesson_stats: bool,
    pub auto_review: bool,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            text: Thresholds {
                min_wpm: 0.0,
                min_acc: 0.0,
            },
            lesson: Thresholds {
                min_wpm: 0.0,
                min_acc: 0.97,
            },
            use_lesson_stats: false,
            auto_review: false,
        }
    }
}

impl ScoringPolicy {
    pub fn thresholds(&self, is_lesson: bool) -> Thresholds {
        if is_lesson {
            self.lesson
        } else {
            self.text
        }
    }

    pub fn should_persist_stats(&self, is_lesson: bool) -> bool {
        self.use_lesson_stats || !is_lesson
    }
}

/// The text a session was typed against
#[derive(Debug, Clone, Copy)]
pub struct TextRef<'a> {
    pub id: &'a str,
    pub source: i64,
    pub text: &'a str,
    pub is_lesson: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSession {
    pub result: ResultRow,
    pub buckets: Vec<StatBucket>,
    pub mistakes: Vec<MistakeRecord>,
    pub verdict: PassFail,
    /// Whether `buckets` and `mistakes` should reach the store
    pub persist_stats: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SessionScorer {
    policy: ScoringPolicy,
}

impl SessionScorer {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// `history` returns the most recent stored time for a character, used
    /// to estimate how long reaching the first character took when the clock
    /// started on the first keystroke.
    pub fn score<H>(
        &self,
        session: &CompletedSession,
        text: TextRef<'_>,
        history: H,
        now: f64,
    ) -> Result<ScoredSession, ScoreError>
    where
        H: Fn(char) -> Option<f64>,
    {
        let chars: Vec<char> = text.text.chars().collect();
        let n = session.char_count;
        assert_eq!(chars.len(), n, "session does not belong to this text");
        assert_eq!(session.inter_char.len(), n);
        assert_eq!(session.is_mistake.len(), n);

        let mut times = session.inter_char.clone();
        let start = session_start(session, &mut times, history(chars[0]))?;
        let end = session.when_completed[n].ok_or(ScoreError::Unstamped(n))?;
        let elapsed = end - start;
        if elapsed.is_nan() || elapsed <= 0.0 {
            return Err(ScoreError::NonPositiveElapsed(elapsed));
        }

        let spc = elapsed / n as f64;
        let accuracy = 1.0 - session.mistake_count() as f64 / n as f64;
        let wpm = WPM_FACTOR / spc;
        let viscosity = times.iter().map(|t| (t / spc - 1.0).powi(2)).sum::<f64>() / n as f64;

        let result = ResultRow {
            w: now,
            text_id: text.id.to_string(),
            source: text.source,
            wpm,
            accuracy,
            viscosity,
        };
        let buckets = unit_buckets(&chars, &times, &session.is_mistake, spc, now);
        let mistakes = mistake_records(session, now);

        let verdict = self.verdict(&result, &buckets, text.is_lesson);
        debug!(wpm, accuracy, viscosity, ?verdict, "scored session");

        Ok(ScoredSession {
            result,
            buckets,
            mistakes,
            verdict,
            persist_stats: self.policy.should_persist_stats(text.is_lesson),
        })
    }

    fn verdict(&self, result: &ResultRow, buckets: &[StatBucket], is_lesson: bool) -> PassFail {
        let mins = self.policy.thresholds(is_lesson);
        if result.wpm < mins.min_wpm || result.accuracy < mins.min_acc {
            return PassFail::Repeat;
        }
        if !is_lesson && self.policy.auto_review {
            let words = review_words(buckets);
            if !words.is_empty() {
                return PassFail::Review(words);
            }
        }
        PassFail::NewText
    }
}

/// Start of the session in clock seconds. When the clock started on the
/// first keystroke, `times[0]` is back-filled with an estimate.
fn session_start(
    session: &CompletedSession,
    times: &mut [f64],
    history: Option<f64>,
) -> Result<f64, ScoreError> {
    if session.start_mode == StartMode::Space {
        if let Some(start) = session.when_completed[0] {
            return Ok(start);
        }
    }

    let mut tail: Vec<f64> = times[1..].to_vec();
    tail.sort_by(|a, b| b.total_cmp(a));
    let percentile = tail.get(tail.len() / 5).copied();
    let first = history.or(percentile).unwrap_or(0.0);
    times[0] = first;

    let (stamped, at) = session
        .when_completed
        .iter()
        .enumerate()
        .skip(1)
        .find_map(|(i, w)| w.map(|t| (i, t)))
        .ok_or(ScoreError::Unstamped(1))?;
    Ok(at - first - times[1..stamped].iter().sum::<f64>())
}

fn unit_buckets(
    chars: &[char],
    times: &[f64],
    is_mistake: &[bool],
    spc: f64,
    now: f64,
) -> Vec<StatBucket> {
    let mut stats: BTreeMap<(UnitKind, String), (Statistic, Statistic)> = BTreeMap::new();

    for (i, c) in chars.iter().enumerate() {
        let (time, visc) = stats.entry((UnitKind::Char, c.to_string())).or_default();
        time.push(times[i], is_mistake[i]);
        visc.push((times[i] / spc - 1.0).powi(2), false);
    }

    let mut push_span = |kind: UnitKind, start: usize, end: usize| {
        let span = &times[start..end];
        let avg = span.iter().sum::<f64>() / span.len() as f64;
        let visc = if avg > 0.0 {
            span.iter().map(|t| (t / avg - 1.0).powi(2)).sum::<f64>() / span.len() as f64
        } else {
            0.0
        };
        let flawed = is_mistake[start..end].iter().any(|m| *m);
        let unit: String = chars[start..end].iter().collect();
        let (time, viscs) = stats.entry((kind, unit)).or_default();
        time.push(avg, flawed);
        viscs.push(visc, false);
    };

    for i in 0..chars.len().saturating_sub(2) {
        push_span(UnitKind::Trigram, i, i + 3);
    }
    for (start, end) in word_spans(chars) {
        if end - start >= MIN_WORD_LEN {
            push_span(UnitKind::Word, start, end);
        }
    }

    stats
        .into_iter()
        .map(|((kind, unit), (time, visc))| StatBucket {
            w: now,
            unit,
            kind,
            time: time.median().unwrap_or(0.0),
            viscosity: visc.median().unwrap_or(0.0) * 100.0,
            count: time.len() as u32,
            mistakes: time.flawed(),
        })
        .collect()
}

fn mistake_records(session: &CompletedSession, now: f64) -> Vec<MistakeRecord> {
    let mut counts: BTreeMap<(char, char), u32> = BTreeMap::new();
    for pair in session.mistake_log.values() {
        *counts.entry(*pair).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|((expected, typed), count)| MistakeRecord {
            w: now,
            expected: expected.to_string(),
            typed: typed.to_string(),
            count,
        })
        .collect()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Spans of words: runs of word characters and apostrophes (an apostrophe
/// before a capital letter ends the word), optionally joined by hyphens
pub fn word_spans(chars: &[char]) -> Vec<(usize, usize)> {
    let len = chars.len();
    let mut spans = Vec::new();
    let mut i = 0;
    while i < len {
        let mut j = i;
        while j < len {
            let c = chars[j];
            let apostrophe = c == '\''
                && !chars
                    .get(j + 1)
                    .is_some_and(|next| next.is_ascii_uppercase());
            if is_word_char(c) || apostrophe {
                j += 1;
            } else {
                break;
            }
        }
        if j == i {
            i += 1;
            continue;
        }
        while j + 1 < len && chars[j] == '-' && is_word_char(chars[j + 1]) {
            j += 2;
            while j < len && (is_word_char(chars[j]) || chars[j] == '\'') {
                j += 1;
            }
        }
        spans.push((i, j));
        i = j;
    }
    spans
}

/// Words worth reviewing: all mistyped words, then the slowest quarter of the
/// rest
pub fn review_words(buckets: &[StatBucket]) -> Vec<String> {
    let mut words: Vec<&StatBucket> = buckets
        .iter()
        .filter(|b| b.kind == UnitKind::Word)
        .collect();
    words.sort_by(|a, b| {
        b.mistakes
            .cmp(&a.mistakes)
            .then_with(|| b.time.total_cmp(&a.time))
    });
    let flawed = words.iter().take_while(|b| b.mistakes != 0).count();
    let take = flawed + (words.len() - flawed) / 4;
    words[..take].iter().map(|b| b.unit.clone()).collect()
}
