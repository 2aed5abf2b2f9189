use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use quiz_core::model::{Category, Question};
use storage::repository::Storage;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    per_category: usize,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidPerCategory { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidPerCategory { raw } => {
                write!(f, "invalid --per-category value: {raw}")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "sqlite:quiz.sqlite3".into());
        let mut per_category = std::env::var("QUIZ_SEED_PER_CATEGORY")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(usize::MAX);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--per-category" => {
                    let value = require_value(&mut args, "--per-category")?;
                    per_category = value
                        .parse::<usize>()
                        .map_err(|_| ArgsError::InvalidPerCategory { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            per_category,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:quiz.sqlite3)");
    eprintln!("  --per-category <n>        Sample questions per category (default: all)");
    eprintln!("  --now <rfc3339>           Fixed creation time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  QUIZ_DB_URL, QUIZ_SEED_PER_CATEGORY");
}

// (category, question, options, answer)
const SAMPLES: &[(&str, &str, [&str; 4], usize)] = &[
    (
        "geography",
        "What is the capital of France?",
        ["Berlin", "London", "Paris", "Madrid"],
        2,
    ),
    (
        "geography",
        "Which river flows through Cairo?",
        ["Nile", "Danube", "Amazon", "Volga"],
        0,
    ),
    (
        "geography",
        "Which is the largest ocean?",
        ["Atlantic", "Indian", "Arctic", "Pacific"],
        3,
    ),
    (
        "science",
        "What is the chemical symbol for gold?",
        ["Ag", "Au", "Gd", "Go"],
        1,
    ),
    (
        "science",
        "How many planets orbit the Sun?",
        ["7", "8", "9", "10"],
        1,
    ),
    (
        "history",
        "In which year did the Berlin Wall fall?",
        ["1985", "1987", "1989", "1991"],
        2,
    ),
    (
        "history",
        "Who was the first emperor of Rome?",
        ["Augustus", "Nero", "Caesar", "Trajan"],
        0,
    ),
];

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let mut inserted = 0_usize;
    let mut seen_per_category: HashMap<&str, usize> = HashMap::new();
    for (category, text, options, answer) in SAMPLES {
        let seen = seen_per_category.entry(*category).or_insert(0);
        if *seen >= args.per_category {
            continue;
        }
        *seen += 1;

        let question = Question::new(
            *text,
            options.iter().map(|o| (*o).to_owned()).collect(),
            *answer,
            Category::new(*category)?,
        )?;
        storage.questions.insert_question(&question, now).await?;
        inserted += 1;
    }

    println!("Seeded {inserted} questions into {}", args.db_url);

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
