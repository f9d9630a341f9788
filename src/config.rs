use crate::app_dirs::AppDirs;
use crate::lesson::{DrillOptions, Mix};
use crate::scorer::{ScoringPolicy, Thresholds};
use crate::selection::SelectMethod;
use crate::stats::{CompactionPolicy, Grouping};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Persistent user settings. Missing keys take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Recency window for statistics, in days
    pub history_days: f64,
    pub min_chars: usize,
    pub max_chars: usize,
    pub select_method: SelectMethod,
    /// Candidates sampled per selection
    pub num_rand: usize,
    /// Wait for a space before starting the clock
    pub req_space: bool,
    pub minutes_in_sitting: f64,
    pub def_group_by: usize,
    pub use_lesson_stats: bool,
    pub auto_review: bool,
    pub min_wpm: f64,
    /// percent
    pub min_acc: f64,
    pub min_lesson_wpm: f64,
    /// percent
    pub min_lesson_acc: f64,
    pub group_month: f64,
    pub group_week: f64,
    pub group_day: f64,
    pub gen_copies: usize,
    pub gen_take: usize,
    pub gen_mix: Mix,
    pub dampen_average: usize,
    pub perf_items: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_days: 30.0,
            min_chars: 220,
            max_chars: 600,
            select_method: SelectMethod::Random,
            num_rand: 50,
            req_space: true,
            minutes_in_sitting: 60.0,
            def_group_by: 10,
            use_lesson_stats: false,
            auto_review: false,
            min_wpm: 0.0,
            min_acc: 0.0,
            min_lesson_wpm: 0.0,
            min_lesson_acc: 97.0,
            group_month: 365.0,
            group_week: 30.0,
            group_day: 7.0,
            gen_copies: 3,
            gen_take: 2,
            gen_mix: Mix::Concatenate,
            dampen_average: 10,
            perf_items: 100,
        }
    }
}

impl Settings {
    pub fn scoring_policy(&self) -> ScoringPolicy {
        ScoringPolicy {
            text: Thresholds {
                min_wpm: self.min_wpm,
                min_acc: self.min_acc / 100.0,
            },
            lesson: Thresholds {
                min_wpm: self.min_lesson_wpm,
                min_acc: self.min_lesson_acc / 100.0,
            },
            use_lesson_stats: self.use_lesson_stats,
            auto_review: self.auto_review,
        }
    }

    pub fn drill_options(&self) -> DrillOptions {
        DrillOptions {
            copies: self.gen_copies,
            take: self.gen_take,
            mix: self.gen_mix,
        }
    }

    pub fn compaction_policy(&self) -> CompactionPolicy {
        CompactionPolicy {
            month_after_days: self.group_month,
            week_after_days: self.group_week,
            day_after_days: self.group_day,
        }
    }

    /// Oldest timestamp inside the statistics window
    pub fn history_since(&self, now: f64) -> f64 {
        now - self.history_days * 86_400.0
    }

    pub fn sitting(&self) -> Grouping {
        Grouping::Sitting(self.minutes_in_sitting * 60.0)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Settings;
    fn save(&self, cfg: &Settings) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("typestat_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Settings {
        let Ok(bytes) = fs::read(&self.path) else {
            return Settings::default();
        };
        match serde_json::from_slice::<Settings>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "ignoring invalid config");
                Settings::default()
            }
        }
    }

    fn save(&self, cfg: &Settings) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
