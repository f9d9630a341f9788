use super::difficulty::{DifficultyEstimator, RankMode};
use crate::error::StoreResult;
use crate::stats::{StatsDb, Text};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the next practice text is chosen
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SelectMethod {
    #[default]
    Random,
    InOrder,
    Difficult,
    Easy,
}

/// Trait for different text selection strategies
pub trait TextSelector {
    fn select(&self, db: &StatsDb) -> StoreResult<Option<Text>>;
}

/// First of a random sample of enabled texts
pub struct RandomSelector {
    pub sample: usize,
}

impl TextSelector for RandomSelector {
    fn select(&self, db: &StatsDb) -> StoreResult<Option<Text>> {
        Ok(db.random_texts(self.sample)?.into_iter().next())
    }
}

/// The text stored after the one typed last
pub struct InOrderSelector;

impl TextSelector for InOrderSelector {
    fn select(&self, db: &StatsDb) -> StoreResult<Option<Text>> {
        db.next_text_after_last()
    }
}

/// Ranks a random sample by expected speed using trigram history since
/// `since`
pub struct DifficultySelector {
    pub sample: usize,
    pub since: f64,
    pub mode: RankMode,
}

impl TextSelector for DifficultySelector {
    fn select(&self, db: &StatsDb) -> StoreResult<Option<Text>> {
        let estimator = DifficultyEstimator::new(db.trigram_history(self.since)?);
        let candidates = db.random_texts(self.sample)?;
        debug!(
            candidates = candidates.len(),
            known_trigrams = !estimator.is_empty(),
            mode = ?self.mode,
            "ranking texts"
        );
        Ok(estimator.rank(candidates, self.mode))
    }
}

pub fn selector_for(method: SelectMethod, sample: usize, since: f64) -> Box<dyn TextSelector> {
    match method {
        SelectMethod::Random => Box::new(RandomSelector { sample }),
        SelectMethod::InOrder => Box::new(InOrderSelector),
        SelectMethod::Difficult => Box::new(DifficultySelector {
            sample,
            since,
            mode: RankMode::Min,
        }),
        SelectMethod::Easy => Box::new(DifficultySelector {
            sample,
            since,
            mode: RankMode::Max,
        }),
    }
}

/// Shown when the store holds nothing to practice
pub fn welcome_text() -> Text {
    Text {
        id: String::new(),
        source: 0,
        text: "Welcome to typestat! A typing tutor that not only measures your speed and \
               progress, but also gives you detailed statistics about problem keys, words, \
               common mistakes, and so on. Import some text to get started."
            .to_string(),
    }
}

/// Next text to practice, falling back to the welcome text
pub fn next_text(db: &StatsDb, selector: &dyn TextSelector) -> StoreResult<Text> {
    Ok(selector.select(db)?.unwrap_or_else(welcome_text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::{PassFail, ResultRow, ScoredSession, StatBucket, UnitKind};

    fn trigram_session(w: f64, unit: &str, time: f64) -> ScoredSession {
        ScoredSession {
            result: ResultRow {
                w,
                text_id: "x".into(),
                source: 1,
                wpm: 50.0,
                accuracy: 1.0,
                viscosity: 0.0,
            },
            buckets: vec![StatBucket {
                w,
                unit: unit.into(),
                kind: UnitKind::Trigram,
                time,
                viscosity: 0.0,
                count: 1,
                mistakes: 0,
            }],
            mistakes: Vec::new(),
            verdict: PassFail::NewText,
            persist_stats: true,
        }
    }

    #[test]
    fn empty_store_yields_welcome_text() {
        let db = StatsDb::open_in_memory().unwrap();
        for method in [
            SelectMethod::Random,
            SelectMethod::InOrder,
            SelectMethod::Difficult,
            SelectMethod::Easy,
        ] {
            let text = next_text(&db, selector_for(method, 10, 0.0).as_ref()).unwrap();
            assert_eq!(text, welcome_text());
        }
    }

    #[test]
    fn difficult_and_easy_use_trigram_history() {
        let mut db = StatsDb::open_in_memory().unwrap();
        db.add_texts("book", ["sloooow", "fast"], None).unwrap();
        db.record_session(&trigram_session(100.0, "loo", 1.0)).unwrap();
        db.record_session(&trigram_session(100.0, "ooo", 1.0)).unwrap();
        db.record_session(&trigram_session(100.0, "fas", 0.05)).unwrap();
        db.record_session(&trigram_session(100.0, "ast", 0.05)).unwrap();

        let hard = next_text(&db, selector_for(SelectMethod::Difficult, 10, 0.0).as_ref()).unwrap();
        assert_eq!(hard.text, "sloooow");
        let easy = next_text(&db, selector_for(SelectMethod::Easy, 10, 0.0).as_ref()).unwrap();
        assert_eq!(easy.text, "fast");
    }

    #[test]
    fn in_order_starts_from_the_first_text() {
        let mut db = StatsDb::open_in_memory().unwrap();
        db.add_texts("book", ["one", "two"], None).unwrap();
        let text = next_text(&db, &InOrderSelector).unwrap();
        assert_eq!(text.text, "one");
    }

    #[test]
    fn select_method_parses_from_config_names() {
        let method: SelectMethod = serde_json::from_str("\"in-order\"").unwrap();
        assert_eq!(method, SelectMethod::InOrder);
        assert_eq!(SelectMethod::Difficult.to_string(), "difficult");
    }
}
