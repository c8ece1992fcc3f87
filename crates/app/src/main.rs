use std::fmt;

use chrono::NaiveDate;
use codeclimb_core::model::{
    CourseId, LessonSlot, ProgressRule, QuizStep, describe_streak, parse_study_date,
};
use log::debug;
use serde::Serialize;
use services::{AppServices, Clock, EngineConfig};

const DEFAULT_DB_URL: &str = "sqlite://codeclimb.sqlite3";

/// Longest activity grid the CLI will render.
const MAX_ACTIVITY_WINDOW: usize = 366;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidDate { raw: String },
    InvalidRule { raw: String },
    InvalidWindow { raw: String },
    InvalidCourse { raw: String },
    InvalidLesson { raw: String },
    InvalidAnswers { raw: String },
    AnswerCount { expected: usize, got: usize },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required for this command"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidDate { raw } => write!(f, "invalid --today value (YYYY-MM-DD): {raw}"),
            ArgsError::InvalidRule { raw } => {
                write!(f, "invalid --progress-rule value (legacy|lessons): {raw}")
            }
            ArgsError::InvalidWindow { raw } => {
                write!(f, "invalid --window value (0..={MAX_ACTIVITY_WINDOW}): {raw}")
            }
            ArgsError::InvalidCourse { raw } => write!(f, "invalid --course value: {raw}"),
            ArgsError::InvalidLesson { raw } => write!(f, "invalid --lesson value: {raw}"),
            ArgsError::InvalidAnswers { raw } => {
                write!(f, "invalid --answers value (comma-separated option numbers): {raw}")
            }
            ArgsError::AnswerCount { expected, got } => {
                write!(f, "quiz has {expected} questions but {got} answers were given")
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

fn required<T>(value: Option<T>, flag: &'static str) -> Result<T, ArgsError> {
    value.ok_or(ArgsError::MissingFlag { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  codeclimb [status]  [options]");
    eprintln!("  codeclimb courses   [--query <text>] [options]");
    eprintln!("  codeclimb lessons   --course <id> [options]");
    eprintln!("  codeclimb lesson    --course <id> --lesson <n> [options]");
    eprintln!("  codeclimb complete  --course <id> --lesson <n> --answers <0,2,1> [options]");
    eprintln!("  codeclimb note      --course <id> --lesson <n> [--text <note>] [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>              default {DEFAULT_DB_URL}");
    eprintln!("  --today <YYYY-MM-DD>           pin the calendar day");
    eprintln!("  --progress-rule legacy|lessons default legacy");
    eprintln!("  --window <days>                default 28, at most {MAX_ACTIVITY_WINDOW}");
    eprintln!("  --json                         print results as JSON");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  CODECLIMB_DB_URL, CODECLIMB_TODAY, CODECLIMB_PROGRESS_RULE, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Status,
    Courses,
    Lessons,
    Lesson,
    Complete,
    Note,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "status" => Some(Self::Status),
            "courses" => Some(Self::Courses),
            "lessons" => Some(Self::Lessons),
            "lesson" => Some(Self::Lesson),
            "complete" => Some(Self::Complete),
            "note" => Some(Self::Note),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    today: Option<NaiveDate>,
    config: EngineConfig,
    json: bool,
    course: Option<CourseId>,
    lesson: Option<LessonSlot>,
    answers: Option<Vec<usize>>,
    query: String,
    text: Option<String>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        Self::parse_with_env(args, |key| std::env::var(key).ok())
    }

    fn parse_with_env(
        args: &mut impl Iterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url = env("CODECLIMB_DB_URL")
            .map_or_else(|| DEFAULT_DB_URL.to_string(), normalize_sqlite_url);
        let mut today = env("CODECLIMB_TODAY").map(|raw| parse_day(&raw)).transpose()?;
        let mut config = EngineConfig::default();
        if let Some(raw) = env("CODECLIMB_PROGRESS_RULE") {
            config = config.with_progress_rule(parse_rule(&raw)?);
        }

        let mut parsed = Self {
            db_url: String::new(),
            today: None,
            config,
            json: false,
            course: None,
            lesson: None,
            answers: None,
            query: String::new(),
            text: None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--today" => today = Some(parse_day(&require_value(args, "--today")?)?),
                "--progress-rule" => {
                    let rule = parse_rule(&require_value(args, "--progress-rule")?)?;
                    parsed.config = parsed.config.with_progress_rule(rule);
                }
                "--window" => {
                    let value = require_value(args, "--window")?;
                    let days: usize = value
                        .parse()
                        .ok()
                        .filter(|days| *days <= MAX_ACTIVITY_WINDOW)
                        .ok_or_else(|| ArgsError::InvalidWindow { raw: value.clone() })?;
                    parsed.config = parsed.config.with_activity_window(days);
                }
                "--json" => parsed.json = true,
                "--course" => {
                    let value = require_value(args, "--course")?;
                    parsed.course = Some(
                        value
                            .parse()
                            .map_err(|_| ArgsError::InvalidCourse { raw: value.clone() })?,
                    );
                }
                "--lesson" => {
                    let value = require_value(args, "--lesson")?;
                    parsed.lesson = Some(
                        value
                            .parse()
                            .map_err(|_| ArgsError::InvalidLesson { raw: value.clone() })?,
                    );
                }
                "--answers" => {
                    parsed.answers = Some(parse_answers(&require_value(args, "--answers")?)?);
                }
                "--query" => parsed.query = require_value(args, "--query")?,
                "--text" => parsed.text = Some(require_value(args, "--text")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        parsed.db_url = db_url;
        parsed.today = today;
        Ok(parsed)
    }

    fn clock(&self) -> Clock {
        self.today.map_or_else(Clock::local, Clock::on_day)
    }
}

fn parse_day(raw: &str) -> Result<NaiveDate, ArgsError> {
    parse_study_date(raw).map_err(|_| ArgsError::InvalidDate {
        raw: raw.to_string(),
    })
}

fn parse_rule(raw: &str) -> Result<ProgressRule, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidRule {
        raw: raw.to_string(),
    })
}

fn parse_answers(raw: &str) -> Result<Vec<usize>, ArgsError> {
    raw.split(',')
        .map(|part| part.trim().parse::<usize>())
        .collect::<Result<_, _>>()
        .map_err(|_| ArgsError::InvalidAnswers {
            raw: raw.to_string(),
        })
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") || raw.starts_with("sqlite:file:")
    {
        return raw;
    }

    let trimmed = raw.trim();
    let path = std::path::Path::new(trimmed.strip_prefix("sqlite:").unwrap_or(trimmed));
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Creates the directory holding a file-backed database.
fn ensure_db_dir(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
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

fn print_json(value: &impl Serialize) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn show_status(app: &AppServices, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let dashboard = app.dashboard().load().await?;
    if json {
        return print_json(&dashboard);
    }
    let grid: String = dashboard
        .calendar
        .iter()
        .map(|day| if day.studied { '#' } else { '.' })
        .collect();
    println!("Overall  {}", dashboard.overall_label());
    println!("Streak   {}", dashboard.streak_label());
    println!("Activity {grid}");
    Ok(())
}

async fn list_courses(
    app: &AppServices,
    query: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let items = app.progress().course_list(query).await?;
    if json {
        return print_json(&items);
    }
    if items.is_empty() {
        println!("no courses match {query:?}");
    }
    for item in &items {
        println!(
            "{:<12} {:>4}  {}",
            item.course.id().as_str(),
            item.percent.to_string(),
            item.course.title()
        );
    }
    Ok(())
}

async fn list_lessons(
    app: &AppServices,
    course: &CourseId,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let detail = app.dashboard().course_detail(course).await?;
    if json {
        return print_json(&detail);
    }
    println!("{} ({})", detail.course.title(), detail.percent);
    for row in &detail.lessons {
        let mark = if row.completed { "x" } else { " " };
        let quiz = if row.has_quiz { "" } else { "  (no quiz)" };
        println!("  [{mark}] {}. {}{quiz}", row.slot, row.title);
    }
    Ok(())
}

async fn read_lesson(
    app: &AppServices,
    course: &CourseId,
    slot: LessonSlot,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let view = app.dashboard().lesson_view(course, slot).await?;
    if json {
        return print_json(&view);
    }
    println!(
        "{} (lesson {} of {}, {:.0}% read)",
        view.title,
        view.slot,
        view.total,
        view.reading_progress * 100.0
    );
    println!();
    println!("{}", view.markdown);
    println!();
    let prev = view.previous().map_or_else(|| "-".to_string(), |s| s.to_string());
    let next = view.next().map_or_else(|| "-".to_string(), |s| s.to_string());
    let quiz = if view.has_quiz { "quiz available" } else { "no quiz" };
    println!("prev {prev}  next {next}  {quiz}");
    if !view.note.is_empty() {
        println!("Note: {}", view.note);
    }
    Ok(())
}

async fn complete_quiz(
    app: &AppServices,
    course: &CourseId,
    slot: LessonSlot,
    answers: &[usize],
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let flow = app.quiz_flow();
    let mut attempt = flow.start(course, slot)?;
    if answers.len() != attempt.len() {
        return Err(ArgsError::AnswerCount {
            expected: attempt.len(),
            got: answers.len(),
        }
        .into());
    }

    for &option in answers {
        let position = attempt.position();
        attempt.select(option)?;
        let feedback = attempt.submit()?;
        if !json {
            let verdict = if feedback.correct { "correct" } else { "wrong" };
            let expected = &attempt.current_question().options()[feedback.correct_index];
            println!("Q{position}: {verdict} (answer: {expected})");
        }
        if attempt.advance()? == QuizStep::Finished {
            break;
        }
    }

    let done = flow.finish(course, slot, &attempt).await?;
    debug!("quiz result {done:?}");
    if json {
        return print_json(&done);
    }
    println!(
        "Score {}/{}. {course} is now {}. Streak {}.",
        done.score.correct,
        done.score.total,
        done.percent,
        describe_streak(done.streak)
    );
    Ok(())
}

async fn note(
    app: &AppServices,
    course: &CourseId,
    slot: LessonSlot,
    text: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let notes = app.notes();
    match text {
        Some(text) => {
            notes.save(course, slot, text).await?;
            println!("saved note for {course} lesson {slot}");
        }
        None => {
            let saved = notes.load(course, slot).await?;
            if saved.is_empty() {
                println!("(no note)");
            } else {
                println!("{saved}");
            }
        }
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Status,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Status,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(&mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    ensure_db_dir(&parsed.db_url)?;
    let app = AppServices::new_sqlite(&parsed.db_url, parsed.clock(), parsed.config).await?;

    match cmd {
        Command::Status => show_status(&app, parsed.json).await,
        Command::Courses => list_courses(&app, &parsed.query, parsed.json).await,
        Command::Lessons => {
            let course = required(parsed.course.as_ref(), "--course")?;
            list_lessons(&app, course, parsed.json).await
        }
        Command::Lesson => {
            let course = required(parsed.course.as_ref(), "--course")?;
            let slot = required(parsed.lesson, "--lesson")?;
            read_lesson(&app, course, slot, parsed.json).await
        }
        Command::Complete => {
            let course = required(parsed.course.as_ref(), "--course")?;
            let slot = required(parsed.lesson, "--lesson")?;
            let answers = required(parsed.answers.as_deref(), "--answers")?;
            complete_quiz(&app, course, slot, answers, parsed.json).await
        }
        Command::Note => {
            let course = required(parsed.course.as_ref(), "--course")?;
            let slot = required(parsed.lesson, "--lesson")?;
            note(&app, course, slot, parsed.text.as_deref()).await
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(|s| (*s).to_string());
        Args::parse_with_env(&mut iter, |_| None)
    }

    #[test]
    fn subcommands_by_name() {
        assert_eq!(Command::from_arg("lesson"), Some(Command::Lesson));
        assert_eq!(Command::from_arg("lessons"), Some(Command::Lessons));
        assert_eq!(Command::from_arg("read"), None);
    }

    #[test]
    fn defaults_without_flags() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.db_url, DEFAULT_DB_URL);
        assert_eq!(args.config, EngineConfig::default());
        assert!(args.clock().is_local());
        assert!(!args.json);
    }

    #[test]
    fn parses_quiz_flags() {
        let args = parse(&[
            "--course",
            "py-intro",
            "--lesson",
            "2",
            "--answers",
            "1, 0,2",
            "--today",
            "2024-03-01",
            "--progress-rule",
            "lessons",
            "--window",
            "7",
        ])
        .unwrap();
        assert_eq!(args.course.as_ref().unwrap().as_str(), "py-intro");
        assert_eq!(args.lesson.unwrap().value(), 2);
        assert_eq!(args.answers.clone().unwrap(), [1, 0, 2]);
        assert_eq!(
            args.clock().today(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert_eq!(args.config.progress_rule, ProgressRule::CompletedLessons);
        assert_eq!(args.config.activity_window, 7);
    }

    #[test]
    fn env_supplies_defaults_and_flags_win() {
        let env = |key: &str| match key {
            "CODECLIMB_DB_URL" => Some("sqlite::memory:".to_string()),
            "CODECLIMB_PROGRESS_RULE" => Some("lessons".to_string()),
            _ => None,
        };
        let mut iter = ["--progress-rule", "legacy"].iter().map(|s| (*s).to_string());
        let args = Args::parse_with_env(&mut iter, env).unwrap();
        assert_eq!(args.db_url, "sqlite::memory:");
        assert_eq!(args.config.progress_rule, ProgressRule::StoredPercent);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(parse(&["--lesson", "0"]), Err(ArgsError::InvalidLesson { .. })));
        assert!(matches!(parse(&["--today", "2024-02-30"]), Err(ArgsError::InvalidDate { .. })));
        assert!(matches!(parse(&["--answers", "1,x"]), Err(ArgsError::InvalidAnswers { .. })));
        assert!(matches!(parse(&["--progress-rule", "fast"]), Err(ArgsError::InvalidRule { .. })));
        assert!(matches!(parse(&["--course"]), Err(ArgsError::MissingValue { flag: "--course" })));
        assert!(matches!(parse(&["--bogus"]), Err(ArgsError::UnknownArg(_))));
        assert!(matches!(parse(&["--window", "367"]), Err(ArgsError::InvalidWindow { .. })));
        assert!(matches!(
            parse(&["--window", "100000000000"]),
            Err(ArgsError::InvalidWindow { .. })
        ));
        assert_eq!(parse(&["--window", "366"]).unwrap().config.activity_window, 366);
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/progress.sqlite3".to_string());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/progress.sqlite3"));
        assert_eq!(normalize_sqlite_url("sqlite::memory:".to_string()), "sqlite::memory:");
    }

    #[test]
    fn shared_memory_urls_pass_through() {
        let url = "sqlite:file:codeclimb_cli?mode=memory&cache=shared";
        assert_eq!(normalize_sqlite_url(url.to_string()), url);
        let argv = ["--db", url];
        let mut iter = argv.iter().map(|s| (*s).to_string());
        let args = Args::parse_with_env(&mut iter, |_| None).unwrap();
        assert_eq!(args.db_url, url);
        assert!(ensure_db_dir(&args.db_url).is_ok());
    }
}
