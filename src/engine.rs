use crate::error::DiffError;
use std::collections::BTreeMap;
use tracing::debug;

/// Text the user is asked to type; never empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    chars: Vec<char>,
}

impl Target {
    pub fn new(text: &str) -> Result<Self, DiffError> {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return Err(DiffError::InvalidTarget);
        }
        Ok(Self { chars })
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn as_string(&self) -> String {
        self.chars.iter().collect()
    }
}

/// How the session clock was started
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartMode {
    /// A leading space was typed; position 0 carries a real timestamp
    Space,
    /// The first keystroke was part of the text; the time to reach the
    /// first character has to be estimated after the fact
    FirstKeystroke,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    AwaitingStart,
    Typing,
    Done,
}

/// Per-position timing and mistake data for one session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionTrace {
    /// `n + 1` entries; `when_completed[i]` is the time position `i` was first reached
    pub when_completed: Vec<Option<f64>>,
    /// `n` entries; seconds spent reaching position `i + 1` from position `i`
    pub inter_char: Vec<f64>,
    pub is_mistake: Vec<bool>,
    /// First wrong character seen at each position, as `(expected, typed)`
    pub mistake_log: BTreeMap<usize, (char, char)>,
    pub start_mode: Option<StartMode>,
}

impl SessionTrace {
    fn new(len: usize) -> Self {
        Self {
            when_completed: vec![None; len + 1],
            inter_char: vec![0.0; len],
            is_mistake: vec![false; len],
            mistake_log: BTreeMap::new(),
            start_mode: None,
        }
    }

    /// Stamp position `upto`, filling any positions skipped since the last stamp
    fn stamp(&mut self, upto: usize, now: f64) {
        self.when_completed[upto] = Some(now);
        if upto == 0 {
            return;
        }
        let previous = (0..upto)
            .rev()
            .find_map(|i| self.when_completed[i].map(|t| (i, t)));
        if let Some((from, at)) = previous {
            let step = (now - at) / (upto - from) as f64;
            for i in from..upto {
                self.inter_char[i] = step;
                if i > from {
                    self.when_completed[i] = Some(at + step * (i - from) as f64);
                }
            }
        }
    }

    fn record_mistake(&mut self, position: usize, expected: char, typed: char) {
        self.is_mistake[position] = true;
        self.mistake_log
            .entry(position)
            .or_insert((expected, typed));
    }
}

/// Arrays of a finished session, handed over to the scorer
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedSession {
    pub char_count: usize,
    pub when_completed: Vec<Option<f64>>,
    pub inter_char: Vec<f64>,
    pub is_mistake: Vec<bool>,
    pub mistake_log: BTreeMap<usize, (char, char)>,
    pub start_mode: StartMode,
}

impl CompletedSession {
    /// Elapsed seconds when the start was observed directly
    pub fn measured_elapsed(&self) -> Option<f64> {
        match (self.when_completed[0], self.when_completed[self.char_count]) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    pub fn mistake_count(&self) -> usize {
        self.is_mistake.iter().filter(|m| **m).count()
    }
}

/// What the caller should show after a buffer change
#[derive(Debug, Clone, PartialEq)]
pub enum DiffEvent {
    AwaitingStart,
    CorrectSoFar,
    HasError,
    Completed(CompletedSession),
}

/// Compares the live input buffer against the target after every change
#[derive(Debug, Clone)]
pub struct DiffEngine {
    target: Target,
    trace: SessionTrace,
    cursor: usize,
    state: EngineState,
    require_leading_space: bool,
}

impl DiffEngine {
    pub fn new(target: &str, require_leading_space: bool) -> Result<Self, DiffError> {
        let target = Target::new(target)?;
        let trace = SessionTrace::new(target.len());
        Ok(Self {
            target,
            trace,
            cursor: 0,
            state: EngineState::AwaitingStart,
            require_leading_space,
        })
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn trace(&self) -> &SessionTrace {
        &self.trace
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Length of the correct prefix at the last diff
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Abort the current session, optionally switching target
    pub fn restart(&mut self, target: Option<&str>) -> Result<(), DiffError> {
        if let Some(text) = target {
            self.target = Target::new(text)?;
        }
        self.trace = SessionTrace::new(self.target.len());
        self.cursor = 0;
        self.state = EngineState::AwaitingStart;
        Ok(())
    }

    pub fn on_text_changed(&mut self, buffer: &str, now: f64) -> DiffEvent {
        match self.state {
            EngineState::Done => return DiffEvent::CorrectSoFar,
            EngineState::AwaitingStart => {
                if buffer.ends_with(' ') {
                    // the buffer is cleared by the caller; typing starts now
                    self.trace.when_completed[0] = Some(now);
                    self.trace.start_mode = Some(StartMode::Space);
                    self.state = EngineState::Typing;
                    return DiffEvent::CorrectSoFar;
                }
                if self.require_leading_space || buffer.is_empty() {
                    return DiffEvent::AwaitingStart;
                }
                self.trace.start_mode = Some(StartMode::FirstKeystroke);
                self.state = EngineState::Typing;
            }
            EngineState::Typing => {}
        }

        self.diff(buffer, now)
    }

    fn diff(&mut self, buffer: &str, now: f64) -> DiffEvent {
        let typed: Vec<char> = buffer.chars().collect();
        let target = self.target.chars();
        let upto = typed
            .iter()
            .zip(target.iter())
            .take_while(|(a, b)| a == b)
            .count();
        self.cursor = upto;

        if upto > 0 && upto == typed.len() && self.trace.when_completed[upto].is_none() {
            self.trace.stamp(upto, now);
        }

        if upto == target.len() {
            if self.trace.when_completed[upto].is_none() {
                self.trace.stamp(upto, now);
            }
            self.state = EngineState::Done;
            return DiffEvent::Completed(self.complete());
        }

        if upto < typed.len() {
            self.trace.record_mistake(upto, target[upto], typed[upto]);
        }

        if upto == typed.len() {
            DiffEvent::CorrectSoFar
        } else {
            DiffEvent::HasError
        }
    }

    fn complete(&self) -> CompletedSession {
        let trace = &self.trace;
        debug_assert_eq!(trace.inter_char.len(), self.target.len());
        debug_assert_eq!(trace.is_mistake.len(), self.target.len());
        debug!(
            chars = self.target.len(),
            mistakes = trace.mistake_log.len(),
            "typing session completed"
        );
        CompletedSession {
            char_count: self.target.len(),
            when_completed: trace.when_completed.clone(),
            inter_char: trace.inter_char.clone(),
            is_mistake: trace.is_mistake.clone(),
            mistake_log: trace.mistake_log.clone(),
            start_mode: trace.start_mode.unwrap_or(StartMode::FirstKeystroke),
        }
    }
}
