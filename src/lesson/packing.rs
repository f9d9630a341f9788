use super::sentences::{paragraphs, SentenceSplitter};

/// Items fed to the packer: sentences, and paragraph breaks that survive
/// into the lesson as line breaks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    Sentence(String),
    Break,
}

/// Length above which a sentence is cut at the next space
pub fn sweet_size(min_chars: usize, max_chars: usize) -> usize {
    3 * (min_chars + max_chars) / 4
}

/// Cut `sentence` at the first space at or after `sweet` characters, as long
/// as it stays longer than that. A remainder without spaces stays oversized.
pub fn split_oversized(sentence: &str, sweet: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut rest: Vec<char> = sentence.chars().collect();
    while rest.len() > sweet {
        let Some(idx) = rest[sweet..].iter().position(|c| *c == ' ').map(|i| i + sweet) else {
            break;
        };
        parts.push(rest[..idx].iter().collect());
        rest = rest[idx + 1..].to_vec();
    }
    parts.push(rest.into_iter().collect());
    parts
}

/// Accumulates sentences until `min_chars` is reached and emits them as one
/// lesson. Lazily driven by the underlying iterator.
#[derive(Debug, Clone)]
pub struct LessonPacker<I> {
    pieces: I,
    min_chars: usize,
    sweet: usize,
    pending: Vec<String>,
    backlog: Vec<Option<String>>,
    backlen: usize,
    finished: bool,
}

impl<I: Iterator<Item = Piece>> LessonPacker<I> {
    pub fn new(pieces: I, min_chars: usize, max_chars: usize) -> Self {
        Self {
            pieces,
            min_chars,
            sweet: sweet_size(min_chars, max_chars),
            pending: Vec::new(),
            backlog: Vec::new(),
            backlen: 0,
            finished: false,
        }
    }

    /// Joins the backlog: spaces within a paragraph, newlines between them
    fn flush(&mut self) -> String {
        let mut paragraphs: Vec<String> = Vec::new();
        let mut part: Vec<String> = Vec::new();
        for item in self.backlog.drain(..) {
            match item {
                Some(sentence) => part.push(sentence),
                None => {
                    paragraphs.push(part.join(" "));
                    part.clear();
                }
            }
        }
        if !part.is_empty() {
            paragraphs.push(part.join(" "));
        }
        self.backlen = 0;
        paragraphs.join("\n")
    }
}

impl<I: Iterator<Item = Piece>> Iterator for LessonPacker<I> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(part) = self.pending.pop() {
                self.backlen += part.chars().count();
                self.backlog.push(Some(part));
                if self.backlen >= self.min_chars {
                    return Some(self.flush());
                }
                continue;
            }
            if self.finished {
                return None;
            }
            match self.pieces.next() {
                Some(Piece::Sentence(sentence)) => {
                    let mut parts = split_oversized(&sentence, self.sweet);
                    parts.reverse();
                    self.pending = parts;
                }
                Some(Piece::Break) => {
                    if !self.backlog.is_empty() {
                        self.backlog.push(None);
                    }
                }
                None => {
                    self.finished = true;
                    if self.backlen > 0 {
                        return Some(self.flush());
                    }
                    return None;
                }
            }
        }
    }
}

/// Packs ready-made sentences into lessons of at least `min_chars`
pub fn pack_lessons<I>(
    sentences: I,
    min_chars: usize,
    max_chars: usize,
) -> LessonPacker<impl Iterator<Item = Piece>>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    LessonPacker::new(
        sentences.into_iter().map(|s| Piece::Sentence(s.into())),
        min_chars,
        max_chars,
    )
}

/// Splits a whole document into paragraphs and sentences and packs them into
/// lessons; paragraph breaks inside a lesson become line breaks
pub fn mine_lessons(text: &str, min_chars: usize, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    for paragraph in paragraphs(text) {
        pieces.push(Piece::Break);
        pieces.extend(
            SentenceSplitter::new(&paragraph)
                .iter()
                .map(|s| Piece::Sentence(s.to_string())),
        );
    }
    LessonPacker::new(pieces.into_iter(), min_chars, max_chars).collect()
}
