use std::fmt;
use std::str::FromStr;

use quiz_core::model::{QuestionDraft, QuestionId, QuizSettings, UserId};
use services::session::parse_option;
use services::{AccessPolicy, AppServices, Clock, Role};

mod take;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { what: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidNumber { flag: &'static str, raw: String },
    InvalidAnswer { raw: String },
    InvalidQuestionId { raw: String },
    MissingUser,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { what } => write!(f, "missing {what}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidAnswer { raw } => {
                write!(f, "invalid --answer value (expected A-D or 1-4): {raw}")
            }
            ArgsError::InvalidQuestionId { raw } => write!(f, "invalid question id: {raw}"),
            ArgsError::MissingUser => write!(f, "--user (or QUIZ_USER) is required"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug)]
struct Forbidden {
    user: UserId,
    command: &'static str,
}

impl fmt::Display for Forbidden {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is not allowed to {}", self.user, self.command)
    }
}

impl std::error::Error for Forbidden {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number<T: FromStr>(raw: String, flag: &'static str) -> Result<T, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz [take]   --user <email> [options]        take a timed quiz");
    eprintln!("  quiz results  --user <email> [options]        show saved scores");
    eprintln!("  quiz list     [options]                       list stored questions");
    eprintln!("  quiz export   [options]                       print questions as JSON");
    eprintln!("  quiz import   <file.json> --user <admin>      bulk-import questions");
    eprintln!("  quiz add      --user <admin> --question <text> --option <text> (x4)");
    eprintln!("                --answer <A-D> --category <name>");
    eprintln!("  quiz delete   <id> --user <admin>");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>      default: sqlite:quiz.sqlite3");
    eprintln!("  --duration <secs>      quiz length, default: 3600");
    eprintln!("  --page-size <n>        questions per page, default: 10");
    eprintln!("  --admin <emails>       comma separated admin addresses");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_USER, QUIZ_DURATION_SECS, QUIZ_PAGE_SIZE, QUIZ_ADMIN_EMAILS");
    eprintln!("  RUST_LOG (default: warn)");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandKind {
    Take,
    Results,
    List,
    Export,
    Import,
    Add,
    Delete,
}

impl CommandKind {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "take" => Some(Self::Take),
            "results" => Some(Self::Results),
            "list" => Some(Self::List),
            "export" => Some(Self::Export),
            "import" => Some(Self::Import),
            "add" => Some(Self::Add),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    fn needs_user(self) -> bool {
        !matches!(self, Self::List | Self::Export)
    }

    fn admin_action(self) -> Option<&'static str> {
        match self {
            Self::Import => Some("import questions"),
            Self::Add => Some("add questions"),
            Self::Delete => Some("delete questions"),
            Self::Take | Self::Results | Self::List | Self::Export => None,
        }
    }
}

#[derive(Debug)]
enum Command {
    Take,
    Results,
    List,
    Export,
    Import { path: String },
    Add { draft: QuestionDraft },
    Delete { id: QuestionId },
}

struct Args {
    db_url: String,
    user: Option<UserId>,
    duration_secs: u32,
    page_size: usize,
    admins: String,
    command: Command,
}

#[derive(Default)]
struct DraftArgs {
    question: Option<String>,
    options: Vec<String>,
    answer: Option<usize>,
    category: Option<String>,
}

impl DraftArgs {
    fn into_draft(self) -> Result<QuestionDraft, ArgsError> {
        let answer = self.answer.ok_or(ArgsError::MissingArgument { what: "--answer" })?;
        Ok(QuestionDraft {
            question: self
                .question
                .ok_or(ArgsError::MissingArgument { what: "--question" })?,
            options: self.options,
            answer: i64::try_from(answer).unwrap_or(i64::MAX),
            category: self
                .category
                .ok_or(ArgsError::MissingArgument { what: "--category" })?,
        })
    }
}

impl Args {
    fn parse(kind: CommandKind, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| normalize_sqlite_url("sqlite:quiz.sqlite3".into()), normalize_sqlite_url);
        let mut user = std::env::var("QUIZ_USER").ok();
        let mut duration_secs = std::env::var("QUIZ_DURATION_SECS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(QuizSettings::DEFAULT_DURATION_SECS);
        let mut page_size = std::env::var("QUIZ_PAGE_SIZE")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(QuizSettings::DEFAULT_PAGE_SIZE);
        let mut admins = std::env::var("QUIZ_ADMIN_EMAILS").unwrap_or_default();
        let mut draft = DraftArgs::default();
        let mut positional: Vec<String> = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--user" => user = Some(require_value(args, "--user")?),
                "--duration" => {
                    duration_secs = parse_number(require_value(args, "--duration")?, "--duration")?;
                }
                "--page-size" => {
                    page_size = parse_number(require_value(args, "--page-size")?, "--page-size")?;
                }
                "--admin" => admins = require_value(args, "--admin")?,
                "--question" if kind == CommandKind::Add => {
                    draft.question = Some(require_value(args, "--question")?);
                }
                "--option" if kind == CommandKind::Add => {
                    draft.options.push(require_value(args, "--option")?);
                }
                "--answer" if kind == CommandKind::Add => {
                    let value = require_value(args, "--answer")?;
                    draft.answer =
                        Some(parse_option(&value).ok_or(ArgsError::InvalidAnswer { raw: value })?);
                }
                "--category" if kind == CommandKind::Add => {
                    draft.category = Some(require_value(args, "--category")?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if arg.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positional.push(arg),
            }
        }

        let mut positional = positional.into_iter();
        let command = match kind {
            CommandKind::Take => Command::Take,
            CommandKind::Results => Command::Results,
            CommandKind::List => Command::List,
            CommandKind::Export => Command::Export,
            CommandKind::Import => Command::Import {
                path: positional.next().ok_or(ArgsError::MissingArgument {
                    what: "import file",
                })?,
            },
            CommandKind::Add => Command::Add {
                draft: draft.into_draft()?,
            },
            CommandKind::Delete => {
                let raw = positional
                    .next()
                    .ok_or(ArgsError::MissingArgument { what: "question id" })?;
                let id = raw
                    .parse::<QuestionId>()
                    .map_err(|_| ArgsError::InvalidQuestionId { raw: raw.clone() })?;
                Command::Delete { id }
            }
        };
        if let Some(extra) = positional.next() {
            return Err(ArgsError::UnknownArg(extra));
        }

        let user = user.and_then(UserId::new);
        if kind.needs_user() && user.is_none() {
            return Err(ArgsError::MissingUser);
        }

        Ok(Self {
            db_url,
            user,
            duration_secs,
            page_size,
            admins,
            command,
        })
    }

    fn settings(&self) -> Result<QuizSettings, quiz_core::Error> {
        Ok(QuizSettings::new(self.duration_secs, self.page_size)?)
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw.starts_with("sqlite::memory:") || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_dir(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = db_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }
    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1).peekable();

    // Default behavior: start a quiz when no subcommand is provided.
    let kind = match argv.peek().map(String::as_str) {
        None => CommandKind::Take,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => CommandKind::Take,
        Some(first) => {
            let kind = CommandKind::from_arg(first).ok_or_else(|| {
                eprintln!("unknown subcommand: {first}");
                print_usage();
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
            })?;
            argv.next();
            kind
        }
    };

    let parsed = Args::parse(kind, &mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let settings = parsed.settings()?;
    let access = AccessPolicy::from_list(&parsed.admins);

    prepare_sqlite_dir(&parsed.db_url)?;
    let services =
        AppServices::new_sqlite(&parsed.db_url, Clock::default(), settings, access).await?;
    log::debug!("using {} with {settings:?}", parsed.db_url);

    if let (Some(command), Some(user)) = (kind.admin_action(), parsed.user.as_ref()) {
        if services.role_for(user) != Role::Admin {
            return Err(Forbidden {
                user: user.clone(),
                command,
            }
            .into());
        }
    }

    match parsed.command {
        Command::Take => {
            let Some(user) = parsed.user else {
                return Err(ArgsError::MissingUser.into());
            };
            if services.role_for(&user) == Role::Admin {
                println!("Signed in as admin; use `quiz add`, `import` or `delete` to manage questions.");
            }
            let sessions = services.sessions();
            let mut session = sessions.new_session(user);
            sessions.load(&mut session).await?;
            take::run(&sessions, session).await
        }
        Command::Results => {
            let Some(user) = parsed.user else {
                return Err(ArgsError::MissingUser.into());
            };
            let rows = services.sessions().history(&user).await?;
            if rows.is_empty() {
                println!("No results for {user}.");
            }
            for row in rows {
                println!(
                    "{:<24} {:>3}/{:<3} {} ({})",
                    row.score.category,
                    row.score.correct,
                    row.score.total,
                    row.completed_at.format("%Y-%m-%d %H:%M"),
                    row.ended_by.as_str()
                );
            }
            Ok(())
        }
        Command::List => {
            for record in services.questions().list_questions().await? {
                let question = &record.question;
                println!(
                    "{:>5}  [{}] {} (answer {})",
                    record.id,
                    question.category(),
                    question.text(),
                    services::session::option_label(question.correct_option())
                );
            }
            Ok(())
        }
        Command::Export => {
            println!("{}", services.questions().export_json().await?);
            Ok(())
        }
        Command::Import { path } => {
            let text = tokio::fs::read_to_string(&path).await?;
            let report = services.questions().import_json(&text).await?;
            for failure in &report.failures {
                eprintln!("skipped {failure}");
            }
            println!("{report}");
            Ok(())
        }
        Command::Add { draft } => {
            let id = services.questions().create_question(draft).await?;
            println!("Added question {id}.");
            Ok(())
        }
        Command::Delete { id } => {
            services.questions().delete_question(id).await?;
            println!("Deleted question {id}.");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(kind: CommandKind, raw: &[&str]) -> Result<Args, ArgsError> {
        let mut args = raw.iter().map(|s| (*s).to_string());
        Args::parse(kind, &mut args)
    }

    #[test]
    fn add_builds_a_draft() {
        let args = parse(
            CommandKind::Add,
            &[
                "--user", "admin@example.com", "--question", "2 + 2?", "--option", "3",
                "--option", "4", "--option", "5", "--option", "22", "--answer", "B",
                "--category", "Math",
            ],
        )
        .unwrap();
        let Command::Add { draft } = args.command else {
            panic!("expected add");
        };
        assert_eq!(draft.answer, 1);
        assert_eq!(draft.options.len(), 4);
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn delete_needs_a_numeric_id() {
        assert!(matches!(
            parse(CommandKind::Delete, &["abc", "--user", "a@b.c"]),
            Err(ArgsError::InvalidQuestionId { .. })
        ));
        let args = parse(CommandKind::Delete, &["7", "--user", "a@b.c"]).unwrap();
        assert!(matches!(args.command, Command::Delete { id } if id.value() == 7));
    }

    #[test]
    fn rejects_unknown_flags_and_bad_numbers() {
        assert!(matches!(
            parse(CommandKind::List, &["--question", "x"]),
            Err(ArgsError::UnknownArg(_))
        ));
        assert!(matches!(
            parse(CommandKind::List, &["--page-size", "ten"]),
            Err(ArgsError::InvalidNumber { flag: "--page-size", .. })
        ));
    }

    #[test]
    fn settings_reject_zero_page_size() {
        let args = parse(CommandKind::List, &["--page-size", "0"]).unwrap();
        assert!(args.settings().is_err());
    }

    #[test]
    fn normalizes_relative_sqlite_paths() {
        let url = normalize_sqlite_url("sqlite:data/quiz.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/quiz.sqlite3"));
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:".into()),
            "sqlite::memory:"
        );
    }
}
