//! `quizgen`: parse a plain-text quiz and create it, unpublished, in Canvas.

mod config;
mod transport;

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use log::{debug, info, warn};
use quiz_core::{
    parse_with, CanvasClient, CanvasRemote, HttpTransport, ItemPayload, ParsedQuiz, QuizBuilder,
    QuizPayload, QuizSettings, RemoteQuizHandle,
};

use config::{Connection, FileConfig};
use transport::UreqTransport;

#[derive(Parser, Debug)]
#[command(name = "quizgen")]
#[command(version, about = "Create an unpublished Canvas quiz from a plain-text quiz file", long_about = None)]
struct Cli {
    /// Quiz text file
    file: PathBuf,

    /// Parse and print the payloads without contacting Canvas
    #[arg(long)]
    dry_run: bool,

    /// Append the questions to an existing quiz instead of creating one
    #[arg(long, value_name = "QUIZ_ID")]
    append_to: Option<String>,

    /// TOML file with [parse], [quiz] and [retry] tables
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Per-request timeout
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

fn main() -> Result<()> {
    // A missing .env file is fine; the variables may come from the shell.
    let env_file = dotenv().ok();
    let filters = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    pretty_env_logger::formatted_builder().parse_filters(&filters).init();

    match env_file {
        Some(path) => debug!("loaded environment from {}", path.display()),
        None => debug!("no .env file found"),
    }

    let cli = Cli::parse();
    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    let text = fs::read_to_string(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;
    let parsed = parse_with(&text, &config.parse)
        .with_context(|| format!("{} is not a valid quiz", cli.file.display()))?;
    for warning in &parsed.warnings {
        warn!("{warning}");
    }

    if cli.dry_run {
        print!("{}", dry_run_report(&parsed, &config.quiz, cli.append_to.is_some())?);
        return Ok(());
    }

    let conn = Connection::from_env()?;
    let client = CanvasClient::new(&conn.base_url, conn.course_id, &conn.token);
    let mut remote = CanvasRemote::new(client, UreqTransport::new(Duration::from_secs(cli.timeout_secs)));

    let mut builder = QuizBuilder::new()
        .settings(config.quiz.clone())
        .retry(config.retry.clone());
    if let Some(quiz_id) = &cli.append_to {
        builder = builder.append_to(quiz_id.clone());
    }
    let handle = builder.build(&parsed.quiz, &mut remote).context("quiz build failed")?;

    verify_order(&mut remote, &handle);

    let quiz = &parsed.quiz;
    println!("Title:     {}", quiz.title());
    println!("Quiz id:   {}", handle.quiz_id);
    println!("Points:    {}", quiz.total_points());
    println!("Questions: {}", handle.item_ids.len());
    println!("URL:       {}", remote.client().assignment_url(&handle.quiz_id));
    println!("The quiz is unpublished; review it in Canvas before publishing.");
    Ok(())
}

/// Summary plus the JSON bodies the build would send.
fn dry_run_report(parsed: &ParsedQuiz, settings: &QuizSettings, appending: bool) -> Result<String> {
    let quiz = &parsed.quiz;
    let mut out = format!(
        "{:?}: {} question(s), {} point(s), {} warning(s)\n",
        quiz.title(),
        quiz.questions().len(),
        quiz.total_points(),
        parsed.warnings.len()
    );
    if !appending {
        out.push_str(&serde_json::to_string_pretty(&QuizPayload::new(quiz, settings))?);
        out.push('\n');
    }
    for question in quiz.questions() {
        let mut payload = ItemPayload::from_question(question, settings.shuffle_answers);
        if appending {
            payload.item.position = None;
        }
        out.push_str(&serde_json::to_string_pretty(&payload)?);
        out.push('\n');
    }
    Ok(out)
}

/// Read the items back and check the created ones appear in file order.
/// Only logs: the quiz exists either way and a human reviews it next.
fn verify_order<T: HttpTransport>(remote: &mut CanvasRemote<T>, handle: &RemoteQuizHandle) {
    let listed = match remote.list_items(&handle.quiz_id) {
        Ok(items) => items,
        Err(err) => {
            warn!("could not list items of quiz {}: {err}", handle.quiz_id);
            return;
        }
    };
    let ours: Vec<&str> = listed
        .iter()
        .map(|item| item.id.as_str())
        .filter(|id| handle.item_ids.iter().any(|created| created == id))
        .collect();
    if ours.len() == handle.item_ids.len() && ours.iter().zip(&handle.item_ids).all(|(a, b)| a == b) {
        info!("remote order of quiz {} matches the file", handle.quiz_id);
    } else {
        warn!(
            "quiz {}: remote items do not match the file order; check the quiz before publishing",
            handle.quiz_id
        );
    }
}
