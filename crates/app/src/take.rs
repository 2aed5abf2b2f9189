//! Interactive quiz in the terminal.
//!
//! The loop races stdin against the session ticker so the countdown keeps
//! running while the player thinks. Category fetches race the ticker too; if
//! time runs out first the fetch is abandoned and the session is submitted.

use std::fmt;

use quiz_core::format_remaining;
use quiz_core::model::Category;
use services::session::{option_label, parse_option};
use services::{QuizSession, QuizSessionService, SessionError, Submission, Ticker};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Answer { question: usize, option: usize },
    Next,
    Prev,
    Category(String),
    Submit,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActionError(String);

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn parse_action(line: &str) -> Result<Action, ActionError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(Action::Status);
    };
    match head.to_ascii_lowercase().as_str() {
        "a" | "answer" => {
            let number = words
                .next()
                .and_then(|w| w.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .ok_or_else(|| ActionError("usage: a <question number> <A-D>".into()))?;
            let option = words
                .next()
                .and_then(parse_option)
                .ok_or_else(|| ActionError("option must be A-D or 1-4".into()))?;
            Ok(Action::Answer {
                question: number - 1,
                option,
            })
        }
        "n" | "next" => Ok(Action::Next),
        "p" | "prev" => Ok(Action::Prev),
        "c" | "category" => {
            let name = words.collect::<Vec<_>>().join(" ");
            if name.is_empty() {
                return Err(ActionError("usage: c <category>".into()));
            }
            Ok(Action::Category(name))
        }
        "s" | "submit" => Ok(Action::Submit),
        "t" | "time" => Ok(Action::Status),
        "h" | "help" | "?" => Ok(Action::Help),
        "q" | "quit" => Ok(Action::Quit),
        other => Err(ActionError(format!("unknown command: {other} (h for help)"))),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  a <n> <A-D>     answer question n");
    println!("  n / p           next / previous page");
    println!("  c <category>    switch category");
    println!("  s               submit");
    println!("  t               show time and progress");
    println!("  q               quit without submitting");
}

fn print_status(session: &QuizSession) {
    let progress = session.overall_progress();
    println!(
        "{} left, answered {}/{}",
        format_remaining(session.remaining_time()),
        progress.answered,
        progress.total
    );
}

fn render(session: &QuizSession) {
    let names: Vec<&str> = session.categories().iter().map(Category::as_str).collect();
    println!();
    println!("Categories: {}", names.join(", "));
    let Some(current) = session.current_category() else {
        println!("No questions available yet.");
        print_status(session);
        return;
    };

    let (page, pages) = session.page_position();
    let progress = session.progress(current);
    println!(
        "── {current} ── page {}/{} ── {}/{} answered",
        page + 1,
        pages,
        progress.answered,
        progress.total
    );
    let visible = session.visible_questions();
    if visible.is_empty() {
        println!("This category has no questions.");
    }
    for question in visible {
        println!("{:>3}. {}", question.index + 1, question.text);
        for (i, option) in question.options.iter().enumerate() {
            let mark = if question.selected == Some(i) { '*' } else { ' ' };
            println!("     {mark} {}) {option}", option_label(i));
        }
    }
    print_status(session);
}

fn print_submission(submission: &Submission) {
    println!();
    println!("Quiz finished ({}).", submission.ended_by.as_str());
    for category in submission.score.per_category() {
        println!(
            "  {:<24} {}/{}",
            category.category, category.correct, category.total
        );
    }
    println!(
        "Score: {} / {} ({}%)",
        submission.score.total(),
        submission.score.answerable(),
        submission.score.percent()
    );
    if let Some(err) = &submission.persistence_error {
        eprintln!("warning: {err}");
    }
}

/// Switch category, racing the fetch against the countdown.
async fn switch_category(
    sessions: &QuizSessionService,
    session: &mut QuizSession,
    ticker: &mut Ticker,
    category: Category,
) -> Result<Option<Submission>, SessionError> {
    if !sessions.needs_fetch(session, &category)? {
        return Ok(None);
    }

    let fetch = sessions.fetch_category(&category);
    tokio::pin!(fetch);
    let fetched = loop {
        tokio::select! {
            fetched = &mut fetch => break fetched,
            tick = ticker.tick() => {
                if tick.is_none() {
                    return Ok(None);
                }
                if let Some(submission) = sessions.tick(session).await? {
                    return Ok(Some(submission));
                }
            }
        }
    };
    sessions.apply_category(session, category.clone(), fetched)?;
    Ok(None)
}

enum Step {
    Continue,
    Finished(Submission),
    Quit,
}

async fn handle_line(
    sessions: &QuizSessionService,
    session: &mut QuizSession,
    ticker: &mut Ticker,
    line: &str,
) -> Result<Step, SessionError> {
    let action = match parse_action(line) {
        Ok(action) => action,
        Err(err) => {
            println!("{err}");
            return Ok(Step::Continue);
        }
    };

    match action {
        Action::Answer { question, option } => {
            session.answer_current(question, option)?;
            render(session);
        }
        Action::Next => {
            session.next_page();
            render(session);
        }
        Action::Prev => {
            session.prev_page();
            render(session);
        }
        Action::Category(name) => {
            let Ok(category) = Category::new(name) else {
                println!("category name cannot be blank");
                return Ok(Step::Continue);
            };
            if let Some(submission) = switch_category(sessions, session, ticker, category).await? {
                return Ok(Step::Finished(submission));
            }
            render(session);
        }
        Action::Submit => {
            if let Some(submission) = sessions.submit(session).await? {
                return Ok(Step::Finished(submission));
            }
        }
        Action::Status => print_status(session),
        Action::Help => print_help(),
        Action::Quit => return Ok(Step::Quit),
    }
    Ok(Step::Continue)
}

/// Run one quiz for `session`, which must already be loaded.
///
/// # Errors
///
/// Returns an error if stdin cannot be read or the result cannot be built.
pub async fn run(
    sessions: &QuizSessionService,
    mut session: QuizSession,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = Ticker::every_second();
    print_help();
    render(&session);

    loop {
        tokio::select! {
            tick = ticker.tick() => {
                if tick.is_none() {
                    break;
                }
                if let Some(submission) = sessions.tick(&mut session).await? {
                    println!("\nTime is up.");
                    print_submission(&submission);
                    break;
                }
                if session.remaining_time() == 60 {
                    println!("\n1:00 left.");
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    session.dispose();
                    break;
                };
                match handle_line(sessions, &mut session, &mut ticker, &line).await {
                    Ok(Step::Continue) => {}
                    Ok(Step::Finished(submission)) => {
                        print_submission(&submission);
                        break;
                    }
                    Ok(Step::Quit) => {
                        session.dispose();
                        println!("Quit without submitting.");
                        break;
                    }
                    Err(SessionError::Result(err)) => return Err(err.into()),
                    Err(err) => println!("{err}"),
                }
            }
        }
    }

    ticker.dispose();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_answer_with_letter_or_digit() {
        assert_eq!(
            parse_action("a 3 b"),
            Ok(Action::Answer {
                question: 2,
                option: 1
            })
        );
        assert_eq!(
            parse_action("answer 1 4"),
            Ok(Action::Answer {
                question: 0,
                option: 3
            })
        );
        assert!(parse_action("a 0 A").is_err());
        assert!(parse_action("a 2 E").is_err());
        assert!(parse_action("a").is_err());
    }

    #[test]
    fn category_names_keep_spaces() {
        assert_eq!(
            parse_action("c  World  History "),
            Ok(Action::Category("World History".into()))
        );
        assert!(parse_action("c").is_err());
    }

    #[test]
    fn blank_line_shows_status() {
        assert_eq!(parse_action("   "), Ok(Action::Status));
        assert_eq!(parse_action("S"), Ok(Action::Submit));
        assert!(parse_action("jump").is_err());
    }
}
