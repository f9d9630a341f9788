pub mod functions;

use crate::aggregate::{FirstReducer, MedianReducer, Reducer, TimeGrouper};
use crate::app_dirs::AppDirs;
use crate::error::StoreResult;
use crate::scorer::{ScoredSession, UnitKind};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS source (name TEXT, disabled INTEGER, discount INTEGER);
CREATE TABLE IF NOT EXISTS text (id TEXT PRIMARY KEY, source INTEGER, text TEXT, disabled INTEGER);
CREATE TABLE IF NOT EXISTS result (
    w REAL, text_id TEXT, source INTEGER, wpm REAL, accuracy REAL, viscosity REAL
);
CREATE TABLE IF NOT EXISTS statistic (
    w REAL, data TEXT, type INTEGER, time REAL, count INTEGER, mistakes INTEGER, viscosity REAL
);
CREATE TABLE IF NOT EXISTS mistake (w REAL, target TEXT, mistake TEXT, count INTEGER);
CREATE INDEX IF NOT EXISTS idx_result_w ON result(w);
CREATE INDEX IF NOT EXISTS idx_statistic_data_type ON statistic(data, type);
CREATE INDEX IF NOT EXISTS idx_statistic_w ON statistic(w);
"#;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Name of the source that holds generated review lessons
pub const REVIEW_SOURCE: &str = "<Reviews>";

/// Why a source exists besides plain imported text. Stored in
/// `source.discount` as 1 and 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LessonKind {
    Lesson,
    /// Review texts are stored disabled so random selection skips them
    Review,
}

impl LessonKind {
    fn as_i64(self) -> i64 {
        match self {
            LessonKind::Lesson => 1,
            LessonKind::Review => 2,
        }
    }
}

/// A practice text as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Text {
    pub id: String,
    pub source: i64,
    pub text: String,
}

/// Content hash used as the text's identity
pub fn text_id(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

/// Which results a history read covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultFilter {
    All,
    /// Every result of the most recently typed text
    LastText,
    /// Results of ordinary (non-lesson) sources
    Texts,
    Lessons,
    Source(i64),
}

/// How consecutive results are folded together, newest first
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Grouping {
    None,
    /// Every `n` sessions
    Sessions(usize),
    /// Sessions less than this many seconds apart
    Sitting(f64),
    /// Calendar days, rolling over at 04:00 UTC
    Day,
}

/// One row of result history; grouped rows carry medians
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub text_id: String,
    pub w: f64,
    pub source: String,
    pub sessions: usize,
    pub wpm: f64,
    /// 0..1
    pub accuracy: f64,
    pub viscosity: f64,
}

/// Ordering of the per-unit summary
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum UnitOrder {
    Slowest,
    Fastest,
    LeastFluid,
    MostFluid,
    LeastAccurate,
    MostMistyped,
    MostCommon,
    MostDamaging,
}

impl UnitOrder {
    fn order_by(self) -> &'static str {
        match self {
            UnitOrder::Slowest => "wpm ASC",
            UnitOrder::Fastest => "wpm DESC",
            UnitOrder::LeastFluid => "viscosity DESC",
            UnitOrder::MostFluid => "viscosity ASC",
            UnitOrder::LeastAccurate => "accuracy ASC",
            UnitOrder::MostMistyped => "misses DESC",
            UnitOrder::MostCommon => "total DESC",
            UnitOrder::MostDamaging => "damage DESC",
        }
    }
}

/// Per-unit totals over a recency window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitSummary {
    pub unit: String,
    pub wpm: f64,
    /// percent
    pub accuracy: f64,
    pub viscosity: f64,
    pub total: i64,
    pub misses: i64,
    /// frequency times squared duration, inflated by the miss rate
    pub damage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MistakeSummary {
    pub expected: String,
    pub typed: String,
    pub count: i64,
}

/// Age thresholds (days) past which statistics are merged into month, week
/// and day bins
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompactionPolicy {
    pub month_after_days: f64,
    pub week_after_days: f64,
    pub day_after_days: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompactionReport {
    pub rows_before: i64,
    pub rows_after: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct StoreCounts {
    pub texts: i64,
    pub results: i64,
    pub keys: i64,
    pub trigrams: i64,
    pub words: i64,
    pub chars_typed: i64,
    pub words_typed: i64,
    pub first_result: Option<f64>,
}

/// Typing statistics persisted in SQLite
#[derive(Debug)]
pub struct StatsDb {
    conn: Connection,
    grouper: Arc<Mutex<TimeGrouper>>,
}

impl StatsDb {
    /// Open (or create) the store at `path`, creating parent directories
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        info!(path = %path.display(), "opening statistics store");
        Self::init(Connection::open(path)?)
    }

    /// Open the store at the platform default location
    pub fn open_default() -> StoreResult<Self> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("typestat.db"));
        Self::open(path)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        let grouper = Arc::new(Mutex::new(TimeGrouper::new(0.0)));
        functions::register(&conn, Arc::clone(&grouper))?;
        conn.execute_batch(SCHEMA)?;
        Ok(StatsDb { conn, grouper })
    }

    /// Row id of the source called `name`, re-enabling it if it exists
    pub fn add_source(&self, name: &str, kind: Option<LessonKind>) -> StoreResult<i64> {
        Ok(source_id(&self.conn, name, kind)?)
    }

    /// Store `texts` under the source `name`. Returns the ids of the texts
    /// that were new; duplicates are skipped.
    pub fn add_texts<I, S>(
        &mut self,
        name: &str,
        texts: I,
        kind: Option<LessonKind>,
    ) -> StoreResult<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tx = self.conn.transaction()?;
        let source = source_id(&tx, name, kind)?;
        let disabled = (kind == Some(LessonKind::Review)).then_some(1);
        let mut added = Vec::new();
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO text (id, source, text, disabled) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for text in texts {
                let text = text.as_ref();
                let id = text_id(text);
                if stmt.execute(params![id, source, text, disabled])? == 1 {
                    added.push(id);
                } else {
                    debug!(%id, "skipping duplicate text");
                }
            }
        }
        tx.commit()?;
        info!(source = name, added = added.len(), "added texts");
        Ok(added)
    }

    pub fn text(&self, id: &str) -> StoreResult<Option<Text>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, source, text FROM text WHERE id = ?1",
                [id],
                read_text,
            )
            .optional()?)
    }

    /// Up to `limit` enabled texts in random order
    pub fn random_texts(&self, limit: usize) -> StoreResult<Vec<Text>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, source, text FROM text WHERE disabled IS NULL ORDER BY random() LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit as i64], read_text)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// The enabled text stored right after the most recently typed
    /// non-review text, or the first one
    pub fn next_text_after_last(&self) -> StoreResult<Option<Text>> {
        let last: Option<String> = self
            .conn
            .query_row(
                r#"
                SELECT r.text_id FROM result AS r LEFT JOIN source AS s ON (r.source = s.rowid)
                WHERE s.discount IS NULL OR s.discount = 1
                ORDER BY r.w DESC LIMIT 1
                "#,
                [],
                |row| row.get(0),
            )
            .optional()?;
        let prev: i64 = match last {
            Some(id) => self
                .conn
                .query_row("SELECT rowid FROM text WHERE id = ?1", [id], |row| row.get(0))
                .optional()?
                .unwrap_or(0),
            None => 0,
        };
        Ok(self
            .conn
            .query_row(
                r#"
                SELECT id, source, text FROM text
                WHERE rowid > ?1 AND disabled IS NULL ORDER BY rowid ASC LIMIT 1
                "#,
                [prev],
                read_text,
            )
            .optional()?)
    }

    /// Whether texts of `source` are generated lessons or reviews
    pub fn is_lesson_source(&self, source: i64) -> StoreResult<bool> {
        let discount: Option<Option<i64>> = self
            .conn
            .query_row(
                "SELECT discount FROM source WHERE rowid = ?1",
                [source],
                |row| row.get(0),
            )
            .optional()?;
        Ok(matches!(discount, Some(Some(_))))
    }

    /// Persist one scored session. Either every row lands or none does.
    pub fn record_session(&mut self, scored: &ScoredSession) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        let r = &scored.result;
        tx.execute(
            r#"
            INSERT INTO result (w, text_id, source, wpm, accuracy, viscosity)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![r.w, r.text_id, r.source, r.wpm, r.accuracy, r.viscosity],
        )?;

        if scored.persist_stats {
            {
                let mut stmt = tx.prepare(
                    r#"
                    INSERT INTO statistic (w, data, type, time, count, mistakes, viscosity)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    "#,
                )?;
                for b in &scored.buckets {
                    stmt.execute(params![
                        b.w,
                        b.unit,
                        b.kind.as_i64(),
                        b.time,
                        b.count,
                        b.mistakes,
                        b.viscosity
                    ])?;
                }
            }
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO mistake (w, target, mistake, count) VALUES (?1, ?2, ?3, ?4)",
                )?;
                for m in &scored.mistakes {
                    stmt.execute(params![m.w, m.expected, m.typed, m.count])?;
                }
            }
        }

        tx.commit()?;
        debug!(
            text_id = %r.text_id,
            buckets = scored.buckets.len(),
            persisted_stats = scored.persist_stats,
            "recorded session"
        );
        Ok(())
    }

    /// Most recently stored time for the character `c`
    pub fn latest_char_time(&self, c: char) -> StoreResult<Option<f64>> {
        Ok(self
            .conn
            .query_row(
                r#"
                SELECT time FROM statistic WHERE type = ?1 AND data = ?2
                ORDER BY rowid DESC LIMIT 1
                "#,
                params![UnitKind::Char.as_i64(), c.to_string()],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Median seconds per character of every trigram seen since `since`
    pub fn trigram_history(&self, since: f64) -> StoreResult<HashMap<String, f64>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT data, agg_median(time) FROM statistic
            WHERE w >= ?1 AND type = ?2
            GROUP BY data
            "#,
        )?;
        let rows = stmt.query_map(params![since, UnitKind::Trigram.as_i64()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<f64>>(1)?))
        })?;
        let mut history = HashMap::new();
        for row in rows {
            if let (data, Some(time)) = row? {
                history.insert(data, time);
            }
        }
        Ok(history)
    }

    /// Median wpm and accuracy of the last `limit` results
    pub fn recent_median(&self, limit: usize) -> StoreResult<Option<(f64, f64)>> {
        let (wpm, acc): (Option<f64>, Option<f64>) = self.conn.query_row(
            r#"
            SELECT agg_median(wpm), agg_median(accuracy)
            FROM (SELECT wpm, accuracy FROM result ORDER BY w DESC LIMIT ?1)
            "#,
            [limit as i64],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(wpm.zip(acc))
    }

    /// Result history, newest first, at most `limit` entries after grouping
    pub fn results(
        &self,
        filter: ResultFilter,
        grouping: Grouping,
        limit: usize,
    ) -> StoreResult<Vec<HistoryEntry>> {
        let (clause, args): (&str, Vec<i64>) = match filter {
            ResultFilter::All => ("", vec![]),
            ResultFilter::LastText => (
                "WHERE r.text_id = (SELECT text_id FROM result ORDER BY w DESC LIMIT 1)",
                vec![],
            ),
            ResultFilter::Texts => ("WHERE s.discount IS NULL", vec![]),
            ResultFilter::Lessons => ("WHERE s.discount IS NOT NULL", vec![]),
            ResultFilter::Source(id) => ("WHERE r.source = ?1", vec![id]),
        };
        let sql = format!(
            r#"
            SELECT r.text_id, r.w, coalesce(s.name, ''), r.wpm, r.accuracy, r.viscosity
            FROM result AS r LEFT JOIN source AS s ON (r.source = s.rowid)
            {clause}
            ORDER BY r.w DESC
            "#
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args), |row| {
            Ok(HistoryEntry {
                text_id: row.get(0)?,
                w: row.get(1)?,
                source: row.get(2)?,
                sessions: 1,
                wpm: row.get(3)?,
                accuracy: row.get(4)?,
                viscosity: row.get(5)?,
            })
        })?;

        if grouping == Grouping::None {
            return Ok(rows
                .take(limit)
                .collect::<rusqlite::Result<Vec<_>>>()?);
        }

        let mut sitting = TimeGrouper::new(match grouping {
            Grouping::Sitting(secs) => secs,
            _ => 0.0,
        });
        let mut out = Vec::new();
        let mut group: Option<(i64, HistoryGroup)> = None;
        for (idx, row) in rows.enumerate() {
            let row = row?;
            let key = match grouping {
                Grouping::Sessions(n) => (idx / n.max(1)) as i64,
                Grouping::Sitting(_) => sitting.next(row.w) as i64,
                Grouping::Day => ((row.w + 4.0 * 3600.0) / SECONDS_PER_DAY).floor() as i64,
                Grouping::None => unreachable!("ungrouped history returns early"),
            };
            match &mut group {
                Some((current, acc)) if *current == key => acc.push(row),
                _ => {
                    if let Some((_, done)) = group.take() {
                        out.extend(done.finish());
                        if out.len() >= limit {
                            return Ok(out);
                        }
                    }
                    let mut acc = HistoryGroup::default();
                    acc.push(row);
                    group = Some((key, acc));
                }
            }
        }
        if let Some((_, done)) = group {
            out.extend(done.finish());
        }
        out.truncate(limit);
        Ok(out)
    }

    /// Per-unit speed, accuracy and damage over units seen since `since`
    pub fn unit_summary(
        &self,
        kind: UnitKind,
        since: f64,
        min_count: i64,
        order: UnitOrder,
        limit: usize,
    ) -> StoreResult<Vec<UnitSummary>> {
        let sql = format!(
            r#"
            SELECT data, 12.0 / time AS wpm,
                100.0 - 100.0 * misses / CAST(total AS REAL) AS accuracy,
                viscosity, total, misses,
                total * time * time * (1.0 + misses / CAST(total AS REAL)) AS damage
            FROM (
                SELECT data, agg_mean(time, count) AS time, agg_median(viscosity) AS viscosity,
                    sum(count) AS total, sum(mistakes) AS misses
                FROM statistic WHERE w >= ?1 AND type = ?2 GROUP BY data
            )
            WHERE total >= ?3 AND total > 0 AND time > 0
            ORDER BY {} LIMIT ?4
            "#,
            order.order_by()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![since, kind.as_i64(), min_count, limit as i64],
            |row| {
                Ok(UnitSummary {
                    unit: row.get(0)?,
                    wpm: row.get(1)?,
                    accuracy: row.get(2)?,
                    viscosity: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
                    total: row.get(4)?,
                    misses: row.get(5)?,
                    damage: row.get(6)?,
                })
            },
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Most frequent `(expected, typed)` confusions
    pub fn mistake_summary(&self, limit: usize) -> StoreResult<Vec<MistakeSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT target, mistake, sum(count) AS total FROM mistake
            GROUP BY target, mistake
            ORDER BY total DESC, target ASC LIMIT ?1
            "#,
        )?;
        let rows = stmt.query_map([limit as i64], |row| {
            Ok(MistakeSummary {
                expected: row.get(0)?,
                typed: row.get(1)?,
                count: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Merge old statistic rows into month, week and day bins. Each age band
    /// is disjoint; merged rows replace their originals in one transaction.
    pub fn compact(&mut self, policy: &CompactionPolicy, now: f64) -> StoreResult<CompactionReport> {
        let rows_before = self.statistic_rows()?;
        let month = now - policy.month_after_days * SECONDS_PER_DAY;
        let week = now - policy.week_after_days * SECONDS_PER_DAY;
        let day = now - policy.day_after_days * SECONDS_PER_DAY;
        let bands = [
            (f64::MIN, month, 30.0),
            (month, week, 7.0),
            (week, day, 1.0),
        ];

        let tx = self.conn.transaction()?;
        for (older, newer, bin_days) in bands {
            if newer <= older {
                continue;
            }
            let merged = {
                let mut stmt = tx.prepare(
                    r#"
                    SELECT avg(w), data, type, agg_mean(time, count), sum(count), sum(mistakes),
                        agg_median(viscosity)
                    FROM statistic WHERE w <= ?1 AND w > ?2
                    GROUP BY data, type, CAST(w / ?3 AS INTEGER)
                    "#,
                )?;
                let rows = stmt.query_map(params![newer, older, bin_days * SECONDS_PER_DAY], |row| {
                    Ok((
                        row.get::<_, f64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
                        row.get::<_, i64>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, Option<f64>>(6)?.unwrap_or(0.0),
                    ))
                })?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            };
            tx.execute(
                "DELETE FROM statistic WHERE w <= ?1 AND w > ?2",
                params![newer, older],
            )?;
            let mut insert = tx.prepare(
                r#"
                INSERT INTO statistic (w, data, type, time, count, mistakes, viscosity)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;
            for (w, data, kind, time, count, mistakes, viscosity) in merged {
                insert.execute(params![w, data, kind, time, count, mistakes, viscosity])?;
            }
        }
        tx.commit()?;

        let report = CompactionReport {
            rows_before,
            rows_after: self.statistic_rows()?,
        };
        info!(before = report.rows_before, after = report.rows_after, "compacted statistics");
        Ok(report)
    }

    fn statistic_rows(&self) -> StoreResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT count(*) FROM statistic", [], |row| row.get(0))?)
    }

    /// Number of sittings: runs of results less than `gap` seconds apart
    pub fn sittings(&self, gap: f64) -> StoreResult<i64> {
        if let Ok(mut grouper) = self.grouper.lock() {
            grouper.reset();
        }
        let count: Option<i64> = self.conn.query_row(
            "SELECT max(time_group(?1, w)) FROM (SELECT w FROM result ORDER BY w ASC)",
            [gap],
            |row| row.get(0),
        )?;
        Ok(count.unwrap_or(0))
    }

    pub fn counts(&self) -> StoreResult<StoreCounts> {
        let mut counts = StoreCounts {
            texts: self
                .conn
                .query_row("SELECT count(*) FROM text", [], |row| row.get(0))?,
            results: self
                .conn
                .query_row("SELECT count(*) FROM result", [], |row| row.get(0))?,
            first_result: self
                .conn
                .query_row("SELECT min(w) FROM result", [], |row| row.get(0))?,
            ..StoreCounts::default()
        };
        let mut stmt = self.conn.prepare(
            "SELECT type, count(*), coalesce(sum(count), 0) FROM statistic GROUP BY type",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?))
        })?;
        for row in rows {
            let (kind, rows, typed) = row?;
            match UnitKind::from_i64(kind) {
                Some(UnitKind::Char) => {
                    counts.keys = rows;
                    counts.chars_typed = typed;
                }
                Some(UnitKind::Trigram) => counts.trigrams = rows,
                Some(UnitKind::Word) => {
                    counts.words = rows;
                    counts.words_typed = typed;
                }
                None => {}
            }
        }
        Ok(counts)
    }
}

fn source_id(conn: &Connection, name: &str, kind: Option<LessonKind>) -> rusqlite::Result<i64> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT rowid FROM source WHERE name = ?1 LIMIT 1",
            [name],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        conn.execute("UPDATE source SET disabled = NULL WHERE rowid = ?1", [id])?;
        return Ok(id);
    }
    conn.execute(
        "INSERT INTO source (name, discount) VALUES (?1, ?2)",
        params![name, kind.map(LessonKind::as_i64)],
    )?;
    Ok(conn.last_insert_rowid())
}

fn read_text(row: &rusqlite::Row<'_>) -> rusqlite::Result<Text> {
    Ok(Text {
        id: row.get(0)?,
        source: row.get(1)?,
        text: row.get(2)?,
    })
}

/// Accumulates one group of history rows
#[derive(Default)]
struct HistoryGroup {
    text_id: FirstReducer<String>,
    source: FirstReducer<String>,
    w_sum: f64,
    sessions: usize,
    wpm: MedianReducer,
    accuracy: MedianReducer,
    viscosity: MedianReducer,
}

impl HistoryGroup {
    fn push(&mut self, row: HistoryEntry) {
        self.text_id.step(Some(row.text_id));
        self.source.step(Some(row.source));
        self.w_sum += row.w;
        self.sessions += 1;
        self.wpm.step(Some(row.wpm));
        self.accuracy.step(Some(row.accuracy));
        self.viscosity.step(Some(row.viscosity));
    }

    fn finish(self) -> Option<HistoryEntry> {
        if self.sessions == 0 {
            return None;
        }
        Some(HistoryEntry {
            text_id: self.text_id.finalize()?,
            w: self.w_sum / self.sessions as f64,
            source: self.source.finalize().unwrap_or_default(),
            sessions: self.sessions,
            wpm: self.wpm.finalize()?,
            accuracy: self.accuracy.finalize()?,
            viscosity: self.viscosity.finalize()?,
        })
    }
}

#[cfg(test)]
impl StatsDb {
    pub(crate) fn drop_table(&self, table: &str) {
        self.conn
            .execute_batch(&format!("DROP TABLE {table}"))
            .unwrap();
    }
}
