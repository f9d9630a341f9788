use crate::scorer::WPM_FACTOR;
use crate::stats::Text;
use std::collections::HashMap;

/// Which end of the expected-speed range to pick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankMode {
    /// Slowest expected text, for practicing difficult material
    Min,
    /// Fastest expected text
    Max,
}

/// Predicts how fast a text will be typed from historical trigram speeds
#[derive(Debug, Clone, Default)]
pub struct DifficultyEstimator {
    history: HashMap<String, f64>,
    default_time: Option<f64>,
}

impl DifficultyEstimator {
    /// `history` maps trigrams to median seconds per character. Unknown
    /// trigrams count as the value a quarter of the way down the slowest-first
    /// ordering of known ones.
    pub fn new(history: HashMap<String, f64>) -> Self {
        let mut times: Vec<f64> = history.values().copied().collect();
        times.sort_by(|a, b| b.total_cmp(a));
        let default_time = times.get(times.len() / 4).copied();
        Self {
            history,
            default_time,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Time assumed for trigrams without history
    pub fn default_time(&self) -> Option<f64> {
        self.default_time
    }

    /// Expected words per minute for `text`, `None` without any history
    pub fn expected_wpm(&self, text: &str) -> Option<f64> {
        let default = self.default_time?;
        let chars: Vec<char> = text.chars().collect();
        if chars.len() < 3 {
            return Some(WPM_FACTOR / default);
        }

        let mut trigram = String::with_capacity(12);
        let total: f64 = chars
            .windows(3)
            .map(|w| {
                trigram.clear();
                trigram.extend(w);
                self.history.get(&trigram).copied().unwrap_or(default)
            })
            .sum();
        let avg = total / (chars.len() - 2) as f64;
        Some(WPM_FACTOR / avg)
    }

    /// The candidate with the lowest or highest expected speed. Ties, and an
    /// empty history, go to the earliest candidate.
    pub fn rank(&self, candidates: Vec<Text>, mode: RankMode) -> Option<Text> {
        let mut best: Option<(Text, f64)> = None;
        for text in candidates {
            let score = self.expected_wpm(&text.text).unwrap_or(1.0);
            let better = match &best {
                None => true,
                Some((_, current)) => match mode {
                    RankMode::Min => score < *current,
                    RankMode::Max => score > *current,
                },
            };
            if better {
                best = Some((text, score));
            }
        }
        best.map(|(text, _)| text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(id: &str, body: &str) -> Text {
        Text {
            id: id.to_string(),
            source: 1,
            text: body.to_string(),
        }
    }

    fn history(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn default_time_is_quarter_from_slowest() {
        let est = DifficultyEstimator::new(history(&[
            ("aaa", 0.1),
            ("bbb", 0.2),
            ("ccc", 0.3),
            ("ddd", 0.4),
            ("eee", 0.5),
        ]));
        // slowest first: 0.5 0.4 0.3 0.2 0.1, index 5 / 4 = 1
        assert_eq!(est.default_time(), Some(0.4));
    }

    #[test]
    fn expected_wpm_averages_trigram_times() {
        let est = DifficultyEstimator::new(history(&[("abc", 0.1), ("bcd", 0.3)]));
        // default: slowest first [0.3, 0.1], index 0
        assert_eq!(est.default_time(), Some(0.3));
        let wpm = est.expected_wpm("abcd").unwrap();
        assert!((wpm - 12.0 / 0.2).abs() < 1e-9);
        let unknown = est.expected_wpm("xyz").unwrap();
        assert!((unknown - 40.0).abs() < 1e-9);
    }

    #[test]
    fn rank_picks_extremes() {
        let est = DifficultyEstimator::new(history(&[("fas", 0.1), ("slo", 0.5), ("mid", 0.2)]));
        let candidates = vec![text("1", "mid"), text("2", "fas"), text("3", "slo")];
        assert_eq!(est.rank(candidates.clone(), RankMode::Max).unwrap().id, "2");
        assert_eq!(est.rank(candidates, RankMode::Min).unwrap().id, "3");
    }

    #[test]
    fn ties_go_to_first_candidate() {
        let est = DifficultyEstimator::new(history(&[("abc", 0.2)]));
        let candidates = vec![text("1", "abc"), text("2", "abc")];
        assert_eq!(est.rank(candidates.clone(), RankMode::Max).unwrap().id, "1");
        assert_eq!(est.rank(candidates, RankMode::Min).unwrap().id, "1");
    }

    #[test]
    fn empty_history_returns_first_candidate() {
        let est = DifficultyEstimator::new(HashMap::new());
        assert!(est.is_empty());
        assert_eq!(est.expected_wpm("anything"), None);
        let candidates = vec![text("1", "one"), text("2", "two")];
        assert_eq!(est.rank(candidates, RankMode::Min).unwrap().id, "1");
        assert_eq!(est.rank(Vec::new(), RankMode::Max), None);
    }
}
