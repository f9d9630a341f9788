use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand, ValueEnum};
use itertools::Itertools;
use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use typestat::{
    clock::{Clock, ManualClock, SystemClock},
    config::{ConfigStore, FileConfigStore, Settings},
    lesson::{generate_drill, mine_lessons, pack_lessons, plain_lessons, Mix},
    logging,
    scorer::{PassFail, SessionScorer, UnitKind},
    selection::{next_text, selector_for, SelectMethod},
    session::{PracticeSession, Progress, SessionConfig},
    stats::{text_id, Grouping, LessonKind, ResultFilter, StatsDb, UnitOrder},
    util::{dampen, format_when, mean, std_dev},
};

/// typing performance analytics over a local statistics store
#[derive(Parser, Debug)]
#[clap(
    version,
    about,
    long_about = "Mine practice lessons from text, score recorded typing sessions, pick the next text by expected difficulty and report on speed, accuracy and rhythm over time."
)]
struct Cli {
    /// statistics database (default: per-user state directory)
    #[clap(long, global = true)]
    db: Option<PathBuf>,

    /// settings file (default: per-user config directory)
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// split a text file into lessons and store them
    Import {
        file: PathBuf,
        /// source name (default: the file path)
        #[clap(long)]
        source: Option<String>,
        /// store the texts as lessons
        #[clap(long)]
        lesson: bool,
    },
    /// print the lessons a text file would be split into, without storing
    Pack {
        file: PathBuf,
        #[clap(long)]
        min_chars: Option<usize>,
        #[clap(long)]
        max_chars: Option<usize>,
    },
    /// build drill lessons from a word list
    Drill {
        words: Vec<String>,
        /// read words from this file as well
        #[clap(long)]
        file: Option<PathBuf>,
        #[clap(long)]
        copies: Option<usize>,
        /// words per group, 0 for all
        #[clap(long)]
        take: Option<usize>,
        #[clap(long, value_enum)]
        mix: Option<Mix>,
        /// shuffled lessons of this many words instead of drills
        #[clap(long)]
        plain: Option<usize>,
        /// store the packed lessons under this source name
        #[clap(long)]
        add: Option<String>,
    },
    /// score a recorded keystroke log (csv with `time,buffer` columns)
    Replay {
        log: PathBuf,
        /// id of a stored text
        #[clap(long, conflicts_with = "text")]
        text_id: Option<String>,
        /// the target text itself; stored if unknown
        #[clap(long)]
        text: Option<String>,
        #[clap(long, default_value = "<Replays>")]
        source: String,
    },
    /// show the next text to practice
    Next {
        #[clap(long, value_enum)]
        method: Option<SelectMethod>,
    },
    /// result history, newest first
    History {
        #[clap(long, value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,
        /// only results from this source id
        #[clap(long)]
        source_id: Option<i64>,
        #[clap(long, value_enum, default_value_t = GroupArg::None)]
        group: GroupArg,
        #[clap(long)]
        limit: Option<usize>,
        /// write csv instead of a table
        #[clap(long)]
        csv: bool,
    },
    /// per key, trigram or word statistics
    Units {
        #[clap(long, value_enum, default_value_t = UnitKind::Trigram)]
        kind: UnitKind,
        #[clap(long, value_enum, default_value_t = UnitOrder::Slowest)]
        order: UnitOrder,
        #[clap(long, default_value_t = 20)]
        limit: usize,
        /// hide units seen fewer times
        #[clap(long, default_value_t = 1)]
        min_count: i64,
    },
    /// most common mistyped characters
    Mistakes {
        #[clap(long, default_value_t = 20)]
        limit: usize,
    },
    /// merge old statistics into coarser time bins
    Compact,
    /// database totals
    Stats,
    /// show or change settings
    Config {
        #[clap(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    Show,
    Path,
    /// set one key; the value is parsed as JSON, falling back to a string
    Set {
        key: String,
        value: String,
    },
    Reset,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum FilterArg {
    All,
    LastText,
    Texts,
    Lessons,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum GroupArg {
    None,
    Sessions,
    Sitting,
    Day,
}

/// One line of a keystroke log: the input buffer as the engine sees it
#[derive(Debug, Deserialize)]
struct KeystrokeRow {
    time: f64,
    buffer: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    logging::init();
    let cli = Cli::parse();
    debug!(command = ?cli.command, "starting");

    let store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let settings = store.load();

    match cli.command {
        Command::Import {
            ref file,
            ref source,
            lesson,
        } => {
            let content = fs::read_to_string(file)?;
            let lessons = mine_lessons(&content, settings.min_chars, settings.max_chars);
            let name = source.clone().unwrap_or_else(|| file.display().to_string());
            let kind = lesson.then_some(LessonKind::Lesson);
            let mut db = open_db(cli.db.as_deref())?;
            let added = db.add_texts(&name, &lessons, kind)?;
            println!("added {} of {} texts to {name}", added.len(), lessons.len());
        }
        Command::Pack {
            ref file,
            min_chars,
            max_chars,
        } => {
            let content = fs::read_to_string(file)?;
            let lessons = mine_lessons(
                &content,
                min_chars.unwrap_or(settings.min_chars),
                max_chars.unwrap_or(settings.max_chars),
            );
            println!("{}", lessons.iter().join("\n\n"));
        }
        Command::Drill {
            ref words,
            ref file,
            copies,
            take,
            mix,
            plain,
            ref add,
        } => {
            let mut list = words.clone();
            if let Some(path) = file {
                list.extend(fs::read_to_string(path)?.split_whitespace().map(str::to_string));
            }
            if list.is_empty() {
                return Err("no words given".into());
            }
            let mut opts = settings.drill_options();
            opts.copies = copies.unwrap_or(opts.copies);
            opts.take = take.unwrap_or(opts.take);
            opts.mix = mix.unwrap_or(opts.mix);

            let mut rng = rand::thread_rng();
            let lessons: Vec<String> = match plain {
                Some(per_lesson) => plain_lessons(&list, per_lesson, opts.copies, &mut rng),
                None => pack_lessons(
                    generate_drill(&list, opts, &mut rng),
                    settings.min_chars,
                    settings.max_chars,
                )
                .collect(),
            };
            match add {
                Some(name) => {
                    let mut db = open_db(cli.db.as_deref())?;
                    let added = db.add_texts(name, &lessons, Some(LessonKind::Lesson))?;
                    println!("added {} lessons to {name}", added.len());
                }
                None => println!("{}", lessons.iter().join("\n\n")),
            }
        }
        Command::Replay {
            ref log,
            ref text_id,
            ref text,
            ref source,
        } => {
            let mut db = open_db(cli.db.as_deref())?;
            replay(&mut db, &settings, log, text_id.as_deref(), text.as_deref(), source)?;
        }
        Command::Next { method } => {
            let db = open_db(cli.db.as_deref())?;
            let method = method.unwrap_or(settings.select_method);
            let since = settings.history_since(SystemClock.now());
            let selector = selector_for(method, settings.num_rand, since);
            let text = next_text(&db, selector.as_ref())?;
            info!(%method, text_id = %text.id, "selected text");
            println!("{}\n{}", text.id, text.text);
        }
        Command::History {
            filter,
            source_id,
            group,
            limit,
            csv,
        } => {
            let db = open_db(cli.db.as_deref())?;
            let filter = match (source_id, filter) {
                (Some(id), _) => ResultFilter::Source(id),
                (None, FilterArg::All) => ResultFilter::All,
                (None, FilterArg::LastText) => ResultFilter::LastText,
                (None, FilterArg::Texts) => ResultFilter::Texts,
                (None, FilterArg::Lessons) => ResultFilter::Lessons,
            };
            let grouping = match group {
                GroupArg::None => Grouping::None,
                GroupArg::Sessions => Grouping::Sessions(settings.def_group_by.max(1)),
                GroupArg::Sitting => settings.sitting(),
                GroupArg::Day => Grouping::Day,
            };
            let entries = db.results(filter, grouping, limit.unwrap_or(settings.perf_items))?;
            if csv {
                let mut writer = ::csv::Writer::from_writer(io::stdout());
                for entry in &entries {
                    writer.serialize(entry)?;
                }
                writer.flush()?;
            } else {
                print_history(&entries, &settings);
            }
        }
        Command::Units {
            kind,
            order,
            limit,
            min_count,
        } => {
            let db = open_db(cli.db.as_deref())?;
            let since = settings.history_since(SystemClock.now());
            println!(
                "{:<16} {:>8} {:>8} {:>10} {:>7} {:>7} {:>9}",
                kind.to_string().to_lowercase(),
                "wpm",
                "acc%",
                "viscosity",
                "count",
                "misses",
                "damage"
            );
            for unit in db.unit_summary(kind, since, min_count, order, limit)? {
                println!(
                    "{:<16} {:>8.1} {:>8.1} {:>10.2} {:>7} {:>7} {:>9.3}",
                    format!("{:?}", unit.unit),
                    unit.wpm,
                    unit.accuracy,
                    unit.viscosity,
                    unit.total,
                    unit.misses,
                    unit.damage
                );
            }
        }
        Command::Mistakes { limit } => {
            let db = open_db(cli.db.as_deref())?;
            for m in db.mistake_summary(limit)? {
                println!("{:?} typed as {:?}: {}", m.expected, m.typed, m.count);
            }
        }
        Command::Compact => {
            let mut db = open_db(cli.db.as_deref())?;
            let report = db.compact(&settings.compaction_policy(), SystemClock.now())?;
            println!(
                "statistic rows: {} before, {} after",
                report.rows_before, report.rows_after
            );
        }
        Command::Stats => {
            let db = open_db(cli.db.as_deref())?;
            let counts = db.counts()?;
            println!("texts: {}", counts.texts);
            println!("results: {}", counts.results);
            println!(
                "analysis rows: {} ({} keys, {} trigrams, {} words)",
                counts.keys + counts.trigrams + counts.words,
                counts.keys,
                counts.trigrams,
                counts.words
            );
            println!(
                "typed: {} characters, {} words",
                counts.chars_typed, counts.words_typed
            );
            println!(
                "sittings: {}",
                db.sittings(settings.minutes_in_sitting * 60.0)?
            );
            if let Some((wpm, acc)) = db.recent_median(settings.def_group_by.max(1))? {
                println!(
                    "last {} median: {wpm:.1} wpm, {:.1}% accuracy",
                    settings.def_group_by,
                    acc * 100.0
                );
            }
            if let Some(first) = counts.first_result {
                println!(
                    "first result: {} ({} ago)",
                    format_date(first),
                    format_when(SystemClock.now() - first)
                );
            }
        }
        Command::Config { ref action } => match action.as_ref().unwrap_or(&ConfigAction::Show) {
            ConfigAction::Show => println!("{}", serde_json::to_string_pretty(&settings)?),
            ConfigAction::Path => println!("{}", store.path().display()),
            ConfigAction::Set { key, value } => {
                let updated = set_key(&settings, key, value)?;
                store.save(&updated)?;
                info!(key = %key, "setting updated");
            }
            ConfigAction::Reset => store.save(&Settings::default())?,
        },
    }

    Ok(())
}

fn open_db(path: Option<&Path>) -> Result<StatsDb, Box<dyn Error>> {
    Ok(match path {
        Some(path) => StatsDb::open(path)?,
        None => StatsDb::open_default()?,
    })
}

fn session_config(settings: &Settings) -> SessionConfig {
    SessionConfig {
        require_leading_space: settings.req_space,
        scorer: SessionScorer::new(settings.scoring_policy()),
        review: settings.drill_options(),
    }
}

fn replay(
    db: &mut StatsDb,
    settings: &Settings,
    log: &Path,
    id: Option<&str>,
    body: Option<&str>,
    source: &str,
) -> Result<(), Box<dyn Error>> {
    let text = match (id, body) {
        (Some(id), _) => db.text(id)?.ok_or("unknown text id")?,
        (None, Some(body)) => {
            db.add_texts(source, [body], None)?;
            db.text(&text_id(body))?.ok_or("text was not stored")?
        }
        (None, None) => return Err("either --text-id or --text is required".into()),
    };

    let clock = ManualClock::new(0.0);
    let mut session = PracticeSession::start(db, text, session_config(settings), &clock)?;
    let mut reader = ::csv::Reader::from_path(log)?;
    for row in reader.deserialize() {
        let row: KeystrokeRow = row?;
        clock.set(row.time);
        if let Progress::Finished(summary) = session.on_text_changed(db, &row.buffer)? {
            let r = &summary.scored.result;
            println!(
                "{:.1} wpm, {:.1}% accuracy, viscosity {:.2}",
                r.wpm,
                r.accuracy * 100.0,
                r.viscosity
            );
            match &summary.scored.verdict {
                PassFail::Repeat => println!("below target, repeat this text"),
                PassFail::NewText => println!("passed"),
                PassFail::Review(words) => println!("passed, review: {}", words.join(" ")),
            }
            if let Some(review) = summary.review {
                println!("queued review text {}", review.id);
            }
            return Ok(());
        }
    }
    Err("log ended before the text was completed".into())
}

fn print_history(entries: &[typestat::stats::HistoryEntry], settings: &Settings) {
    let now = SystemClock.now();
    println!(
        "{:<17} {:>7} {:<24} {:>8} {:>7} {:>9} {:>4}",
        "date", "age", "source", "wpm", "acc%", "viscosity", "n"
    );
    for e in entries {
        println!(
            "{:<17} {:>7} {:<24} {:>8.1} {:>7.1} {:>9.2} {:>4}",
            format_date(e.w),
            format_when(now - e.w),
            e.source.chars().take(24).collect::<String>(),
            e.wpm,
            e.accuracy * 100.0,
            e.viscosity,
            e.sessions
        );
    }

    let wpm: Vec<f64> = entries.iter().rev().map(|e| e.wpm).collect();
    if let (Some(avg), Some(dev)) = (mean(&wpm), std_dev(&wpm)) {
        println!("wpm {avg:.1} ± {dev:.1}");
    }
    let trend = dampen(&wpm, settings.dampen_average);
    if let (Some(first), Some(last)) = (trend.first(), trend.last()) {
        println!(
            "moving average over {} entries: {first:.1} -> {last:.1}",
            settings.dampen_average
        );
    }
}

fn format_date(w: f64) -> String {
    Local
        .timestamp_opt(w as i64, 0)
        .single()
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

/// Replace one settings key, keeping the result type-checked
fn set_key(settings: &Settings, key: &str, value: &str) -> Result<Settings, Box<dyn Error>> {
    let mut json = serde_json::to_value(settings)?;
    let map = json.as_object_mut().ok_or("settings are not an object")?;
    if !map.contains_key(key) {
        return Err(format!("unknown setting {key:?}").into());
    }
    let parsed = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    map.insert(key.to_string(), parsed);
    Ok(serde_json::from_value(json)?)
}
