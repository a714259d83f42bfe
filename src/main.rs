#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # sheetgrade
//! ## Introduction
//!
//! Grades a spreadsheet quiz with a language model and writes per-question
//! feedback and a total grade back into the sheet.
//!
//! ## Configuration
//!
//! Settings come from the environment (a `.env` file is loaded first):
//! `SPREADSHEET_ID`, `SHEET_TAB`, `GOOGLE_SERVICE_ACCOUNT_FILE`,
//! `COMMON_MISTAKES_SHEET_ID`, `LLM_URL`, `LLM_MODEL`, `LLM_KEY`,
//! `LLM_TIMEOUT_SECS`, `GRADER_ROW_DELAY_MS` and `GRADER_EXPORT_PATH`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bpaf::*;
use dotenvy::dotenv;
use sheetgrade::{
    GraderConfig, GradingSession,
    constants::SUMMARY_TOP_N,
    report::{grading_overview, tag_summary},
};
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Options of the `grade` command.
#[derive(Debug, Clone)]
struct GradeOpts {
    /// Local CSV file used instead of the Google sheet.
    local:        Option<PathBuf>,
    /// Overrides the CSV export path.
    export:       Option<PathBuf>,
    /// Skips the CSV export.
    no_export:    bool,
    /// JSON answer key replacing the built-in quiz.
    answer_key:   Option<PathBuf>,
    /// Adds mined hints to the rubric prompt.
    inject_hints: bool,
}

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Grade every student row
    Grade(GradeOpts),
    /// Connect and print the sheet title and header row
    Check(Option<PathBuf>),
}

/// Parsed command line.
#[derive(Debug, Clone)]
struct Cli {
    /// Enables debug logging.
    verbose: bool,
    /// Command to run.
    cmd:     Cmd,
}

/// Parse the command line arguments and return a `Cli`
fn options() -> Cli {
    /// parses the local CSV path
    fn local_csv() -> impl Parser<Option<PathBuf>> {
        long("local")
            .help("Use a local CSV file as the sheet instead of Google Sheets")
            .argument::<PathBuf>("CSV")
            .optional()
    }

    let local = local_csv();
    let export = long("export")
        .help("Where to write the CSV export (default: $GRADER_EXPORT_PATH or grading_log.csv)")
        .argument::<PathBuf>("PATH")
        .optional();
    let no_export = long("no-export").help("Do not write the CSV export").switch();
    let answer_key = long("answer-key")
        .help("JSON file with the questions and canonical answers")
        .argument::<PathBuf>("JSON")
        .optional();
    let inject_hints = long("inject-hints")
        .help("Add common mistakes mined from the historical sheet to every prompt")
        .switch();

    let grade = construct!(GradeOpts {
        local,
        export,
        no_export,
        answer_key,
        inject_hints
    })
    .to_options()
    .command("grade")
    .help("Grade every student and write Feedback and Grade back to the sheet")
    .map(Cmd::Grade);

    let check_local = local_csv();
    let check = construct!(Cmd::Check(check_local))
        .to_options()
        .command("check")
        .help("Connect to the sheet and print its title and header row");

    let verbose = short('v')
        .long("verbose")
        .help("Log debug output")
        .switch();
    let cmd = construct!([grade, check]);

    construct!(Cli { verbose, cmd })
        .to_options()
        .descr("Grade a spreadsheet quiz with a language model")
        .run()
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let cli = options();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::registry()
        .with(fmt)
        .with(LevelFilter::from_level(level))
        .init();

    let mut config = GraderConfig::from_env().context("Invalid configuration")?;

    match cli.cmd {
        Cmd::Grade(opts) => {
            if let Some(path) = opts.local {
                config.use_local_sheet(path);
            }
            if opts.no_export {
                config.export_path = None;
            } else if let Some(path) = opts.export {
                config.export_path = Some(path);
            }
            config.answer_key = opts.answer_key;
            config.inject_hints = opts.inject_hints;

            let session = GradingSession::new(config)?;
            let summary = session.run().await?;

            eprintln!("{}", grading_overview(&summary.records));
            if summary.tally.is_empty() {
                eprintln!("No mistake tags were recorded this run.");
            } else {
                eprintln!("{}", tag_summary(&summary.tally, SUMMARY_TOP_N));
            }
        }
        Cmd::Check(local) => {
            if let Some(path) = local {
                config.use_local_sheet(path);
            }
            let session = GradingSession::new(config)?;
            let (title, header) = session.check().await?;
            println!("Connected to sheet: {title}");
            println!("First row: {header:?}");
        }
    };

    Ok(())
}
