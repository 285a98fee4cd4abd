//! The `facename train` command.
//!
//! Drives the quiz state machines from the terminal: a one-second ticker
//! advances the memorization countdown while stdin lines carry the user's
//! commands and answers.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use comfy_table::{Cell, Table};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::{interval_at, Instant};

use facename_core::history::ProgressHistory;
use facename_core::model::{Age, FacePairRecord, Gender};
use facename_core::quiz::{
    Course, CourseAQuiz, CourseBQuiz, MemorizationSession, MemorizeState, QuestionState,
    SessionState, Submission, TestResults, TestSettings, TickEvent,
};
use facename_report::write_results_report;

use super::conditions;
use crate::app::App;

type Input = Lines<BufReader<Stdin>>;

/// Countdown values at or below this are announced.
const ANNOUNCE_BELOW: u32 = 3;

pub struct TrainOptions {
    pub count: Option<usize>,
    pub display_time: Option<u32>,
    pub course: Option<Course>,
    pub questions: Option<usize>,
    pub age: Option<Age>,
    pub gender: Option<Gender>,
    pub html: Option<PathBuf>,
}

pub async fn execute(config_path: Option<PathBuf>, options: TrainOptions) -> Result<()> {
    let app = App::load(config_path.as_deref())?;
    let root = app.config.app_root.clone();
    let count = options.count.unwrap_or(app.config.trainer.person_count);
    let display_time = options
        .display_time
        .unwrap_or(app.config.trainer.display_time_secs);

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut history = ProgressHistory::load(app.config.history_path())?;
    let mut session = SessionState::new();

    loop {
        eprintln!("Preparing {count} pair(s)...");
        let pairs = app
            .service
            .get_random_pairs(count, conditions(options.age, options.gender))
            .await?;
        let mut memorization = MemorizationSession::new(display_time);
        memorization.load(pairs)?;
        if !memorize(&mut memorization, &mut input, &root).await? {
            return Ok(());
        }
        session.set_face_ids(memorization.face_ids());
        let pairs = memorization.pairs().to_vec();

        loop {
            let remembered = options
                .course
                .or_else(|| session.test_settings().map(|s| s.course));
            let course = match remembered {
                Some(course) => course,
                None => match ask_course(&mut input).await? {
                    Some(course) => course,
                    None => return Ok(()),
                },
            };
            let memorized = session.face_ids().unwrap_or(&[]);
            let settings = TestSettings::new(
                course,
                options.questions.unwrap_or(memorized.len()),
                memorized,
            )?;
            let targets: Vec<FacePairRecord> = settings
                .face_ids
                .iter()
                .filter_map(|id| pairs.iter().find(|p| &p.id == id).cloned())
                .collect();
            session.set_test_settings(settings);

            let results = match course {
                Course::A => run_course_a(targets, &pairs, &mut input, &root).await?,
                Course::B => run_course_b(targets, &mut input, &root).await?,
            };
            let Some(results) = results else {
                return Ok(());
            };

            show_results(&results, &pairs, &root, options.html.as_deref())?;
            history.record(&results);
            history.save()?;
            session.set_test_results(results);

            let choice = prompt(&mut input, "\n[r]etry the test, [n]ew session or [q]uit? ").await?;
            match choice.as_deref().map(str::to_lowercase).as_deref() {
                Some("r") => session.retry(),
                Some("n") => {
                    session.clear();
                    break;
                }
                _ => return Ok(()),
            }
        }
    }
}

/// Print `question` and read one trimmed line. `None` once stdin is closed.
async fn prompt(input: &mut Input, question: &str) -> Result<Option<String>> {
    print!("{question}");
    std::io::stdout().flush()?;
    Ok(input.next_line().await?.map(|line| line.trim().to_string()))
}

async fn ask_course(input: &mut Input) -> Result<Option<Course>> {
    loop {
        let Some(answer) = prompt(input, "Course? [a] name to face, [b] face to name: ").await? else {
            return Ok(None);
        };
        match answer.parse() {
            Ok(course) => return Ok(Some(course)),
            Err(e) => println!("{e}"),
        }
    }
}

fn show_pair(session: &MemorizationSession, root: &Path) {
    if let Some(pair) = session.current() {
        println!(
            "[{}/{}] {}  ({}, {})  {}",
            session.index() + 1,
            session.len(),
            pair.full_name(),
            pair.age,
            pair.gender,
            root.join(&pair.image_uri).display()
        );
    }
}

/// Run the slideshow. Returns `false` when the user quits.
async fn memorize(session: &mut MemorizationSession, input: &mut Input, root: &Path) -> Result<bool> {
    println!(
        "Memorize {} faces, {}s each. Enter or n = next, b = back, p = pause, q = quit",
        session.len(),
        session.display_time()
    );
    show_pair(session, root);

    let period = Duration::from_secs(1);
    let mut ticker = interval_at(Instant::now() + period, period);

    loop {
        if session.state() == MemorizeState::Completed {
            let Some(answer) = prompt(input, "Done. [r]eview or [t]est? ").await? else {
                return Ok(false);
            };
            match answer.to_lowercase().as_str() {
                "r" => {
                    session.review();
                    show_pair(session, root);
                    ticker.reset();
                }
                "t" => return Ok(true),
                "q" => return Ok(false),
                _ => {}
            }
            continue;
        }

        tokio::select! {
            _ = ticker.tick() => match session.tick() {
                TickEvent::Counted(left) if left <= ANNOUNCE_BELOW => println!("  {left}..."),
                TickEvent::Advanced(_) => show_pair(session, root),
                TickEvent::Completed => println!("Time is up."),
                _ => {}
            },
            line = input.next_line() => {
                let Some(line) = line? else {
                    return Ok(false);
                };
                let before = session.index();
                match line.trim().to_lowercase().as_str() {
                    "" | "n" => session.next(),
                    "b" => session.prev(),
                    "p" => {
                        session.toggle_pause();
                        if session.state() == MemorizeState::Paused {
                            println!("Paused.");
                        } else {
                            println!("Resumed.");
                        }
                    }
                    "q" => return Ok(false),
                    other => println!("Unknown command: {other}"),
                }
                if session.index() != before && session.state() != MemorizeState::Completed {
                    show_pair(session, root);
                    ticker.reset();
                }
            }
        }
    }
}

/// Course A: a name is shown, pick the matching face.
async fn run_course_a(
    targets: Vec<FacePairRecord>,
    pool: &[FacePairRecord],
    input: &mut Input,
    root: &Path,
) -> Result<Option<TestResults>> {
    let mut quiz = CourseAQuiz::new(targets, pool, &mut rand::thread_rng())?;

    while quiz.state() != QuestionState::Finished {
        let Some(name) = quiz.target_name() else {
            break;
        };
        println!("\nQuestion {}/{}: which face is {name}?", quiz.index() + 1, quiz.len());
        for (i, option) in quiz.options().iter().enumerate() {
            println!("  {}) {}", i + 1, root.join(&option.face.image_uri).display());
        }

        let Some(answer) = prompt(input, "Your choice: ").await? else {
            return Ok(None);
        };
        let outcome = answer
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|choice| quiz.select(choice));
        match outcome {
            Some(outcome) if outcome.is_correct => println!("Correct!"),
            Some(outcome) => println!("Incorrect. The answer was {}.", outcome.correct_index + 1),
            None => {
                println!("Enter a number between 1 and {}.", quiz.options().len());
                continue;
            }
        }
        quiz.next();
    }

    Ok(Some(quiz.results()))
}

/// Course B: a face is shown, type the name.
async fn run_course_b(
    targets: Vec<FacePairRecord>,
    input: &mut Input,
    root: &Path,
) -> Result<Option<TestResults>> {
    let mut quiz = CourseBQuiz::new(targets)?;

    while let Some(face) = quiz.current() {
        println!(
            "\nQuestion {}/{}: who is this? {}",
            quiz.index() + 1,
            quiz.len(),
            root.join(&face.image_uri).display()
        );
        let Some(answer) = prompt(input, "Name: ").await? else {
            return Ok(None);
        };
        match quiz.submit(&answer) {
            Submission::Empty => {
                println!("Type a name.");
                continue;
            }
            Submission::Ignored => break,
            Submission::Checked {
                match_level,
                correct_name,
            } => {
                if match_level.is_correct() {
                    println!("Correct! ({})", match_level.as_str());
                } else {
                    println!(
                        "Incorrect ({}). The answer was {correct_name}.",
                        match_level.as_str()
                    );
                }
            }
        }
        quiz.next();
    }

    Ok(Some(quiz.results()))
}

fn show_results(
    results: &TestResults,
    pairs: &[FacePairRecord],
    root: &Path,
    html: Option<&Path>,
) -> Result<()> {
    let details = results.details(|id| pairs.iter().find(|p| p.id == id).cloned());

    let mut table = Table::new();
    table.set_header(vec!["#", "Name", "Your answer", "Result"]);
    for detail in &details {
        table.add_row(vec![
            Cell::new(detail.answer.question_index + 1),
            Cell::new(detail.face.full_name()),
            Cell::new(&detail.answer.user_answer),
            Cell::new(if detail.answer.is_correct { "OK" } else { "MISS" }),
        ]);
    }
    println!("\n{table}");
    println!(
        "Score: {}/{}  Accuracy: {}%",
        results.correct_count,
        results.question_count,
        results.accuracy()
    );

    if let Some(path) = html {
        let image_root = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        write_results_report(results, &details, &image_root, path)?;
        eprintln!("HTML report: {}", path.display());
    }
    Ok(())
}
