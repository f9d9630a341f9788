use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Words that may precede a period without ending a sentence
const ABBREVIATIONS: &[&str] = &[
    "1", "10", "11", "12", "2", "3", "4", "5", "6", "7", "8", "9", "Ala", "Alta", "Ariz", "Ark",
    "Cal", "Calif", "Col", "Colo", "Conn", "Dak", "Del", "Fed", "Fla", "Ga", "Ia", "Id", "Ida",
    "Ill", "Ind", "Is", "Kan", "Kans", "Ken", "Ky", "La", "Man", "Mass", "Md", "Me", "Mex",
    "Mich", "Minn", "Miss", "Mo", "Mont", "Neb", "Nebr", "Nev", "Ok", "Okla", "Ont", "Ore", "Pa",
    "Penn", "Penna", "Qué", "Sask", "Tenn", "Tex", "USAFA", "Ut", "Va", "Vt", "Wash", "Wis",
    "Wisc", "Wy", "Wyo", "Yuk", "adm", "al", "apr", "arc", "assn", "atty", "attys", "aug", "ave",
    "avg", "bld", "blvd", "bros", "capt", "cl", "cmdr", "co", "col", "corp", "cpl", "cres", "ct",
    "dec", "dept", "det", "dist", "dr", "eg", "esp", "etc", "exp", "expy", "feb", "ft", "fwy",
    "fy", "gen", "gov", "hway", "hwy", "ie", "inc", "jan", "jr", "jul", "jun", "la", "lt", "ltd",
    "m", "maj", "mar", "may", "mme", "mr", "mrs", "ms", "mt", "no", "nov", "oct", "pd", "pde",
    "pl", "plz", "prof", "rd", "rep", "reps", "rev", "sen", "sens", "sep", "sept", "sgt", "sr",
    "st", "supt", "tce", "univ", "viz", "vs",
];

fn abbreviations() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| ABBREVIATIONS.iter().copied().collect())
}

/// Lowercase entries match in any case; capitalised entries only as written
pub fn is_abbreviation(word: &str) -> bool {
    let set = abbreviations();
    set.contains(word) || set.contains(word.to_lowercase().as_str())
}

fn terminator() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?:(?: |^)[^\w. ]*(?P<pre>\w+)[^ .]*\.+|[?!]+)['"]?|$"#)
            .expect("sentence terminator pattern is valid")
    })
}

/// A terminator only counts when followed by spaces and then either the end
/// of the text or something other than a lowercase letter
fn opens_sentence(rest: &str) -> bool {
    if !rest.starts_with(' ') {
        return false;
    }
    match rest.trim_start_matches(' ').chars().next() {
        None => true,
        Some(c) => !c.is_ascii_lowercase(),
    }
}

/// Splits one paragraph into sentences. Iterating twice yields the same
/// sentences again.
#[derive(Debug, Clone)]
pub struct SentenceSplitter<'a> {
    text: &'a str,
}

impl<'a> SentenceSplitter<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    pub fn iter(&self) -> Sentences<'a> {
        Sentences {
            text: self.text,
            search_from: 0,
            cut: 0,
            done: false,
        }
    }
}

impl<'a> IntoIterator for &SentenceSplitter<'a> {
    type Item = &'a str;
    type IntoIter = Sentences<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct Sentences<'a> {
    text: &'a str,
    search_from: usize,
    cut: usize,
    done: bool,
}

impl<'a> Sentences<'a> {
    /// Next accepted sentence end, if any
    fn next_boundary(&mut self) -> Option<usize> {
        let re = terminator();
        let mut at = self.search_from;
        while at <= self.text.len() {
            let caps = re.captures_at(self.text, at)?;
            let m = caps.get(0)?;
            if m.is_empty() {
                // only the end of the text matches empty
                self.done = true;
                return Some(m.end());
            }
            if !opens_sentence(&self.text[m.end()..]) {
                at = next_char_boundary(self.text, m.start());
                continue;
            }
            self.search_from = m.end();
            let abbreviated = caps
                .name("pre")
                .is_some_and(|pre| is_abbreviation(pre.as_str()));
            if abbreviated {
                at = m.end();
                continue;
            }
            return Some(m.end());
        }
        None
    }
}

fn next_char_boundary(text: &str, from: usize) -> usize {
    text[from..]
        .chars()
        .next()
        .map_or(text.len() + 1, |c| from + c.len_utf8())
}

impl<'a> Iterator for Sentences<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        while !self.done {
            let end = match self.next_boundary() {
                Some(end) => end,
                None => {
                    self.done = true;
                    return None;
                }
            };
            let sentence = self.text[self.cut..end].trim();
            self.cut = end;
            if !sentence.is_empty() {
                return Some(sentence);
            }
        }
        None
    }
}

pub fn split_sentences(paragraph: &str) -> Vec<String> {
    SentenceSplitter::new(paragraph)
        .iter()
        .map(str::to_string)
        .collect()
}

/// Blocks of non-blank lines, each joined into a single line
pub fn paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut lines: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim) {
        if !line.is_empty() {
            lines.push(line);
        } else if !lines.is_empty() {
            out.push(lines.join(" "));
            lines.clear();
        }
    }
    if !lines.is_empty() {
        out.push(lines.join(" "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviation_does_not_split() {
        let sentences = split_sentences("Dr. Smith went home. He was tired.");
        assert_eq!(sentences, vec!["Dr. Smith went home.", "He was tired."]);
    }

    #[test]
    fn lowercase_continuation_does_not_split() {
        let sentences = split_sentences("It cost 5 dollars. and more. Then it ended");
        assert_eq!(sentences, vec!["It cost 5 dollars. and more.", "Then it ended"]);
    }

    #[test]
    fn question_and_exclamation_marks_split() {
        let sentences = split_sentences("Really?! Yes! \"Quoted.\" Done");
        assert_eq!(sentences, vec!["Really?!", "Yes!", "\"Quoted.\"", "Done"]);
    }

    #[test]
    fn ellipsis_is_one_terminator() {
        let sentences = split_sentences("Wait... Then go.");
        assert_eq!(sentences, vec!["Wait...", "Then go."]);
    }

    #[test]
    fn abbreviation_case_rules() {
        assert!(is_abbreviation("Dr"));
        assert!(is_abbreviation("MRS"));
        assert!(is_abbreviation("Mass"));
        assert!(!is_abbreviation("mass"));
        assert!(!is_abbreviation("home"));
    }

    #[test]
    fn splitter_is_restartable() {
        let splitter = SentenceSplitter::new("One. Two. Three.");
        let first: Vec<&str> = splitter.iter().collect();
        let second: Vec<&str> = (&splitter).into_iter().collect();
        assert_eq!(first, vec!["One.", "Two.", "Three."]);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_text_has_no_sentences() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn paragraphs_join_lines_and_split_on_blanks() {
        let text = "first line\nsecond line\n\n\n  third  \n";
        assert_eq!(paragraphs(text), vec!["first line second line", "third"]);
    }
}
