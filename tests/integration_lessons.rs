use rand::rngs::StdRng;
use rand::SeedableRng;
use typestat::lesson::{generate_drill, mine_lessons, plain_lessons, DrillOptions, Mix};
use typestat::selection::{next_text, selector_for, SelectMethod};
use typestat::stats::{LessonKind, StatsDb};

const DOCUMENT: &str = "The cat sat. Mr. Smith came home.

A new paragraph starts here. It ends.";

fn words_of(texts: &[String]) -> Vec<String> {
    texts
        .iter()
        .flat_map(|t| t.split_whitespace())
        .map(str::to_string)
        .collect()
}

#[test]
fn mined_lessons_keep_every_word_in_order() {
    let lessons = mine_lessons(DOCUMENT, 20, 40);
    assert_eq!(
        lessons,
        vec![
            "The cat sat. Mr. Smith came home.",
            "A new paragraph starts here.",
            "It ends.",
        ]
    );
    assert_eq!(
        words_of(&lessons),
        DOCUMENT
            .split_whitespace()
            .map(str::to_string)
            .collect::<Vec<_>>()
    );
}

#[test]
fn paragraph_breaks_inside_a_lesson_become_newlines() {
    let lessons = mine_lessons(DOCUMENT, 40, 80);
    assert_eq!(lessons.len(), 2);
    assert_eq!(
        lessons[0],
        "The cat sat. Mr. Smith came home.\nA new paragraph starts here."
    );
    // only the last lesson may fall short of the minimum
    assert!(lessons[0].chars().count() >= 40);
    assert_eq!(lessons[1], "It ends.");
}

#[test]
fn mined_lessons_are_practiced_in_order() {
    let mut db = StatsDb::open_in_memory().unwrap();
    let lessons = mine_lessons(DOCUMENT, 20, 40);
    let ids = db
        .add_texts("story", &lessons, Some(LessonKind::Lesson))
        .unwrap();
    assert_eq!(ids.len(), 3);

    let first = next_text(&db, selector_for(SelectMethod::InOrder, 10, 0.0).as_ref()).unwrap();
    assert_eq!(first.text, lessons[0]);
    assert!(db.is_lesson_source(first.source).unwrap());

    // importing the same document again adds nothing
    let again = db
        .add_texts("story", &lessons, Some(LessonKind::Lesson))
        .unwrap();
    assert!(again.is_empty());
    assert_eq!(db.counts().unwrap().texts, 3);
}

#[test]
fn commingled_drill_keeps_the_same_words() {
    let words: Vec<String> = ["alpha", "beta", "gamma"].map(String::from).to_vec();
    let opts = DrillOptions {
        copies: 2,
        take: 2,
        mix: Mix::Commingle,
    };
    let drill = generate_drill(&words, opts, &mut StdRng::seed_from_u64(3));
    assert_eq!(drill.len(), 2);

    let mut first: Vec<&str> = drill[0].split(' ').collect();
    first.sort_unstable();
    assert_eq!(first, vec!["alpha", "alpha", "beta", "beta"]);
    assert_eq!(drill[1], "gamma gamma");
}

#[test]
fn plain_lessons_cover_every_word() {
    let words: Vec<String> = (0..7).map(|i| format!("w{i}")).collect();
    let lessons = plain_lessons(&words, 3, 2, &mut StdRng::seed_from_u64(11));
    let mut typed = words_of(&lessons);
    typed.sort();
    typed.dedup();
    assert_eq!(typed.len(), 7);
    assert!(lessons.iter().all(|l| l.split(' ').count() % 2 == 0));
}
