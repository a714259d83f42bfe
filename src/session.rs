#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use reqwest::Client;

use crate::{
    answer_key::AnswerKey,
    config::{GraderConfig, SheetSource},
    grade::{GradeRecord, GradingLoop, MistakeTally},
    mining::mine_common_mistakes,
    oracle::{HttpOracle, Rubric, ScoringOracle},
    report::export_csv,
    sheet::{
        CsvSheet, GoogleSheet, ServiceAccountAuth, SheetSnapshot, SheetStore, TokenSource,
        resolve_output_columns,
    },
};

/// What a finished run produced.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// One record per student row, in row order.
    pub records: Vec<GradeRecord>,
    /// Mistake tags counted across the run.
    pub tally:   MistakeTally,
    /// Hints mined from the historical sheet.
    pub hints:   Vec<String>,
}

/// Reads `store` once, makes sure the output columns exist, and grades every
/// row with `oracle`.
pub async fn grade_sheet(
    store: &dyn SheetStore,
    oracle: &dyn ScoringOracle,
    answer_key: &AnswerKey,
    row_delay: Duration,
) -> Result<(Vec<GradeRecord>, MistakeTally)> {
    let snapshot: SheetSnapshot = store.read_all().await.context("Could not read the sheet")?;
    tracing::info!("Headers: {:?}", snapshot.header);

    let columns = resolve_output_columns(store, &snapshot.header)
        .await
        .context("Could not create the Feedback/Grade columns")?;

    let mut tally = MistakeTally::new();
    let records = GradingLoop::builder()
        .answer_key(answer_key)
        .oracle(oracle)
        .store(store)
        .row_delay(row_delay)
        .build()
        .run(&snapshot, columns, &mut tally)
        .await;

    Ok((records, tally))
}

/// Explicit context of one grading run: configuration, the shared HTTP
/// client, the answer key and, once needed, the sheet credentials.
pub struct GradingSession {
    /// Resolved configuration.
    config:     GraderConfig,
    /// HTTP client shared by the oracle and the sheet backends.
    client:     Client,
    /// Questions being graded.
    answer_key: AnswerKey,
}

impl GradingSession {
    /// Validates the sheet settings and loads the answer key. Nothing touches
    /// the network yet.
    pub fn new(config: GraderConfig) -> Result<Self> {
        config.validate_sheets()?;

        let answer_key = match &config.answer_key {
            Some(path) => AnswerKey::from_file(path)?,
            None => AnswerKey::builtin(),
        };

        let client = Client::builder()
            .build()
            .context("Failed to construct shared HTTP client")?;

        Ok(Self {
            config,
            client,
            answer_key,
        })
    }

    /// Returns the answer key in use.
    pub fn answer_key(&self) -> &AnswerKey {
        &self.answer_key
    }

    /// Loads the service-account credentials.
    fn auth(&self) -> Result<Arc<dyn TokenSource>> {
        let auth = ServiceAccountAuth::from_file(&self.config.credentials).with_context(|| {
            format!(
                "Could not load service account credentials from {}",
                self.config.credentials.display()
            )
        })?;
        tracing::debug!("Using service account {}", auth.client_email());
        Ok(Arc::new(auth))
    }

    /// Opens the grading sheet.
    pub fn open_store(&self) -> Result<Box<dyn SheetStore>> {
        match &self.config.sheet {
            SheetSource::Google {
                spreadsheet_id,
                tab,
            } => Ok(Box::new(GoogleSheet::new(
                self.client.clone(),
                &self.config.sheets_api_base,
                spreadsheet_id,
                tab,
                self.auth()?,
            ))),
            SheetSource::Local(path) => {
                let sheet = CsvSheet::open(path)
                    .with_context(|| format!("Could not open {}", path.display()))?;
                Ok(Box::new(sheet))
            }
        }
    }

    /// Opens the historical sheet, if one is configured. Failures are logged
    /// and treated as no history.
    async fn open_history(&self) -> Option<GoogleSheet> {
        let id = self.config.history_sheet.as_ref()?;
        let auth = match self.auth() {
            Ok(auth) => auth,
            Err(e) => {
                tracing::warn!("Could not read historical sheet: {e:#}");
                return None;
            }
        };
        match GoogleSheet::open_first_tab(
            self.client.clone(),
            &self.config.sheets_api_base,
            id,
            auth,
        )
        .await
        {
            Ok(sheet) => Some(sheet),
            Err(e) => {
                tracing::warn!("Could not read historical sheet: {e}");
                None
            }
        }
    }

    /// Connects to the grading sheet and returns its title and header row.
    pub async fn check(&self) -> Result<(String, Vec<String>)> {
        let store = self.open_store()?;
        let title = store.title().await.context("Could not reach the sheet")?;
        let snapshot = store.read_all().await.context("Could not read the sheet")?;
        Ok((title, snapshot.header))
    }

    /// Runs the whole batch: mine hints, grade every row, export the CSV.
    pub async fn run(&self) -> Result<RunSummary> {
        self.config.oracle.validate()?;

        let store = self.open_store()?;
        let title = store.title().await.context("Could not reach the sheet")?;
        tracing::info!("Connected to sheet: {title}");

        let history = self.open_history().await;
        let hints = mine_common_mistakes(history.as_ref().map(|h| h as &dyn SheetStore)).await;

        let mut rubric = Rubric::new();
        if self.config.inject_hints {
            rubric = rubric.with_hints(hints.clone());
        } else if !hints.is_empty() {
            tracing::info!("Mined hints are not injected into prompts (use --inject-hints)");
        }
        let oracle = HttpOracle::new(self.client.clone(), &self.config.oracle, rubric);

        let (records, tally) = grade_sheet(
            store.as_ref(),
            &oracle,
            &self.answer_key,
            self.config.row_delay,
        )
        .await?;

        if let Some(path) = &self.config.export_path {
            export_csv(&records, path)?;
            tracing::info!("Wrote {} row(s) to {}", records.len(), path.display());
        }

        Ok(RunSummary {
            records,
            tally,
            hints,
        })
    }
}
