//! One practice run against one text: feeds input to the diff engine, scores
//! the finished session and hands the rows to the store.

use crate::clock::Clock;
use crate::engine::{DiffEngine, DiffEvent, EngineState};
use crate::error::SessionError;
use crate::lesson::{review_text, DrillOptions};
use crate::scorer::{PassFail, ScoredSession, SessionScorer, TextRef};
use crate::stats::{LessonKind, StatsDb, Text, REVIEW_SOURCE};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub require_leading_space: bool,
    pub scorer: SessionScorer,
    pub review: DrillOptions,
}

/// What happened after a buffer change
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    AwaitingStart,
    CorrectSoFar,
    HasError,
    Finished(SessionSummary),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub scored: ScoredSession,
    /// Review lesson queued for a passing session with slow or mistyped words
    pub review: Option<Text>,
}

#[derive(Debug)]
pub struct PracticeSession<C: Clock> {
    engine: DiffEngine,
    text: Text,
    is_lesson: bool,
    config: SessionConfig,
    clock: C,
    /// Scored but not yet persisted
    pending: Option<ScoredSession>,
}

impl<C: Clock> PracticeSession<C> {
    /// Start practicing `text`; lesson status is looked up in `db`
    pub fn start(
        db: &StatsDb,
        text: Text,
        config: SessionConfig,
        clock: C,
    ) -> Result<Self, SessionError> {
        let is_lesson = db.is_lesson_source(text.source)?;
        let engine = DiffEngine::new(&text.text, config.require_leading_space)?;
        debug!(text_id = %text.id, is_lesson, "session started");
        Ok(Self {
            engine,
            text,
            is_lesson,
            config,
            clock,
            pending: None,
        })
    }

    pub fn text(&self) -> &Text {
        &self.text
    }

    pub fn is_lesson(&self) -> bool {
        self.is_lesson
    }

    pub fn state(&self) -> EngineState {
        self.engine.state()
    }

    pub fn cursor(&self) -> usize {
        self.engine.cursor()
    }

    /// A scored session whose save failed, kept for `retry_save`
    pub fn pending(&self) -> Option<&ScoredSession> {
        self.pending.as_ref()
    }

    pub fn on_text_changed(
        &mut self,
        db: &mut StatsDb,
        buffer: &str,
    ) -> Result<Progress, SessionError> {
        let now = self.clock.now();
        match self.engine.on_text_changed(buffer, now) {
            DiffEvent::AwaitingStart => Ok(Progress::AwaitingStart),
            DiffEvent::CorrectSoFar => Ok(Progress::CorrectSoFar),
            DiffEvent::HasError => Ok(Progress::HasError),
            DiffEvent::Completed(session) => {
                let first = self.engine.target().chars()[0];
                let history = db.latest_char_time(first)?;
                let text = TextRef {
                    id: &self.text.id,
                    source: self.text.source,
                    text: &self.text.text,
                    is_lesson: self.is_lesson,
                };
                let scored = self
                    .config
                    .scorer
                    .score(&session, text, |_| history, now)?;
                self.pending = Some(scored);
                self.save(db)
            }
        }
    }

    /// Persist the pending session again after a store failure
    pub fn retry_save(&mut self, db: &mut StatsDb) -> Result<Progress, SessionError> {
        self.save(db)
    }

    fn save(&mut self, db: &mut StatsDb) -> Result<Progress, SessionError> {
        let Some(scored) = self.pending.take() else {
            return Ok(Progress::CorrectSoFar);
        };
        if let Err(err) = db.record_session(&scored) {
            warn!(%err, "failed to record session, keeping it for retry");
            self.pending = Some(scored);
            return Err(err.into());
        }
        info!(
            wpm = scored.result.wpm,
            accuracy = scored.result.accuracy,
            "session recorded"
        );

        let review = match &scored.verdict {
            PassFail::Review(words) => self.queue_review(db, words)?,
            _ => None,
        };
        Ok(Progress::Finished(SessionSummary { scored, review }))
    }

    fn queue_review(
        &self,
        db: &mut StatsDb,
        words: &[String],
    ) -> Result<Option<Text>, SessionError> {
        let body = review_text(words, self.config.review, &mut rand::thread_rng());
        let added = db.add_texts(REVIEW_SOURCE, [body.as_str()], Some(LessonKind::Review))?;
        match added.first() {
            Some(id) => Ok(db.text(id)?),
            None => Ok(None),
        }
    }

    /// Abort and start over, on the same text or on `next`
    pub fn restart(&mut self, db: &StatsDb, next: Option<Text>) -> Result<(), SessionError> {
        self.pending = None;
        match next {
            Some(text) => {
                self.engine.restart(Some(&text.text))?;
                self.is_lesson = db.is_lesson_source(text.source)?;
                self.text = text;
            }
            None => self.engine.restart(None)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::scorer::ScoringPolicy;
    use assert_matches::assert_matches;

    fn config(policy: ScoringPolicy) -> SessionConfig {
        SessionConfig {
            require_leading_space: false,
            scorer: SessionScorer::new(policy),
            review: DrillOptions::default(),
        }
    }

    fn type_out(
        session: &mut PracticeSession<&ManualClock>,
        clock: &ManualClock,
        db: &mut StatsDb,
        body: &str,
    ) -> Progress {
        let mut buffer = String::new();
        let mut last = Progress::AwaitingStart;
        for c in body.chars() {
            clock.advance(0.2);
            buffer.push(c);
            last = session.on_text_changed(db, &buffer).unwrap();
        }
        last
    }

    #[test]
    fn finished_session_is_recorded() {
        let mut db = StatsDb::open_in_memory().unwrap();
        db.add_texts("book", ["hello world"], None).unwrap();
        let text = db.random_texts(1).unwrap().remove(0);
        let clock = ManualClock::new(1000.0);
        let mut session =
            PracticeSession::start(&db, text, config(ScoringPolicy::default()), &clock).unwrap();

        let progress = type_out(&mut session, &clock, &mut db, "hello world");
        let summary = assert_matches!(progress, Progress::Finished(s) => s);
        assert!((summary.scored.result.wpm - 60.0).abs() < 1e-6);
        assert_eq!(summary.review, None);
        assert_eq!(db.counts().unwrap().results, 1);
        assert_eq!(session.state(), EngineState::Done);
    }

    #[test]
    fn store_failure_keeps_the_session_for_retry() {
        let mut db = StatsDb::open_in_memory().unwrap();
        let text = crate::selection::welcome_text();
        let clock = ManualClock::new(1000.0);
        let mut session =
            PracticeSession::start(&db, text.clone(), config(ScoringPolicy::default()), &clock)
                .unwrap();
        // the first save goes to a store whose result table is gone
        let mut failing = StatsDb::open_in_memory().unwrap();
        failing.drop_table("result");
        let mut buffer = String::new();
        let mut result = Ok(Progress::AwaitingStart);
        for c in text.text.chars() {
            clock.advance(0.1);
            buffer.push(c);
            result = session.on_text_changed(&mut failing, &buffer);
        }
        assert_matches!(result, Err(SessionError::Store(_)));
        assert!(session.pending().is_some());

        let progress = session.retry_save(&mut db).unwrap();
        assert_matches!(progress, Progress::Finished(_));
        assert!(session.pending().is_none());
        assert_eq!(db.counts().unwrap().results, 1);
    }

    #[test]
    fn auto_review_queues_a_review_text() {
        let mut db = StatsDb::open_in_memory().unwrap();
        db.add_texts("book", ["quick brown foxes"], None).unwrap();
        let text = db.random_texts(1).unwrap().remove(0);
        let clock = ManualClock::new(50.0);
        let policy = ScoringPolicy {
            auto_review: true,
            ..ScoringPolicy::default()
        };
        let mut session = PracticeSession::start(&db, text, config(policy), &clock).unwrap();

        // one typo in "brown"
        let mut buffer = String::new();
        for c in "quick bx".chars() {
            clock.advance(0.2);
            buffer.push(c);
            session.on_text_changed(&mut db, &buffer).unwrap();
        }
        buffer.pop();
        let mut progress = session.on_text_changed(&mut db, &buffer).unwrap();
        for c in "rown foxes".chars() {
            clock.advance(0.2);
            buffer.push(c);
            progress = session.on_text_changed(&mut db, &buffer).unwrap();
        }

        let summary = assert_matches!(progress, Progress::Finished(s) => s);
        let review = summary.review.expect("review queued");
        assert!(review.text.starts_with("brown"));
        assert!(db.is_lesson_source(review.source).unwrap());
        // reviews never show up in random selection
        assert!(db.random_texts(10).unwrap().iter().all(|t| t.id != review.id));
    }

    #[test]
    fn restart_switches_text_and_lesson_status() {
        let mut db = StatsDb::open_in_memory().unwrap();
        db.add_texts("drills", ["aaa bbb"], Some(LessonKind::Lesson))
            .unwrap();
        let lesson = db.random_texts(1).unwrap().remove(0);
        let clock = ManualClock::new(0.0);
        let mut session = PracticeSession::start(
            &db,
            crate::selection::welcome_text(),
            config(ScoringPolicy::default()),
            &clock,
        )
        .unwrap();
        assert!(!session.is_lesson());

        session.on_text_changed(&mut db, "W").unwrap();
        assert_eq!(session.cursor(), 1);
        session.restart(&db, Some(lesson.clone())).unwrap();
        assert!(session.is_lesson());
        assert_eq!(session.text(), &lesson);
        assert_eq!(session.state(), EngineState::AwaitingStart);
    }
}
