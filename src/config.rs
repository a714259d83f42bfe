#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{path::PathBuf, time::Duration};

use crate::constants::{
    DEFAULT_CREDENTIALS_FILE, DEFAULT_EXPORT_PATH, DEFAULT_ORACLE_MODEL, DEFAULT_ORACLE_TIMEOUT,
    DEFAULT_ROW_DELAY, DEFAULT_TAB, SHEETS_API_BASE,
};

/// Fatal configuration problems detected before the run starts.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A required environment variable is unset or blank.
    #[error("{0} must be set")]
    Missing(&'static str),
    /// The service-account key file does not exist.
    #[error("service account credentials not found at {}", .0.display())]
    CredentialsNotFound(PathBuf),
    /// The spreadsheet identifier is not a plausible Sheets id.
    #[error("`{0}` is not a valid spreadsheet id")]
    InvalidSpreadsheetId(String),
    /// A numeric variable could not be parsed.
    #[error("{var} must be a non-negative integer, got `{value}`")]
    InvalidNumber {
        /// Variable name.
        var:   &'static str,
        /// Offending value.
        value: String,
    },
}

/// Credentials and tuning for the scoring oracle endpoint.
#[derive(Clone, Debug)]
pub struct OracleEnv {
    /// Chat-completions URL.
    endpoint: String,
    /// Model identifier.
    model:    String,
    /// Bearer token.
    api_key:  String,
    /// Per-request timeout.
    timeout:  Duration,
}

impl OracleEnv {
    /// Creates an oracle configuration directly.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            timeout,
        }
    }

    /// Returns the chat-completions URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the bearer token.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Returns the per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Where student answers are read from and grades written to.
#[derive(Clone, Debug, PartialEq)]
pub enum SheetSource {
    /// A tab of a Google spreadsheet.
    Google {
        /// Spreadsheet identifier.
        spreadsheet_id: String,
        /// Tab name.
        tab:            String,
    },
    /// A local CSV file standing in for the sheet.
    Local(PathBuf),
}

/// Everything a grading run needs, resolved once at start-up.
#[derive(Clone, Debug)]
pub struct GraderConfig {
    /// Grading sheet.
    pub sheet:           SheetSource,
    /// Optional historical spreadsheet mined for common mistakes.
    pub history_sheet:   Option<String>,
    /// Service-account key used for every Google sheet.
    pub credentials:     PathBuf,
    /// Sheets REST base URL.
    pub sheets_api_base: String,
    /// Oracle endpoint settings.
    pub oracle:          OracleEnv,
    /// Pause between student rows.
    pub row_delay:       Duration,
    /// CSV export destination; `None` disables the export.
    pub export_path:     Option<PathBuf>,
    /// JSON answer key; `None` uses the built-in quiz.
    pub answer_key:      Option<PathBuf>,
    /// Whether mined hints are added to the rubric prompt.
    pub inject_hints:    bool,
}

/// Reads a trimmed, non-empty value.
fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Reads a non-negative integer, falling back to `default` when unset.
fn read_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    match non_empty(lookup, key) {
        None => Ok(default),
        Some(value) => value
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { var: key, value }),
    }
}

/// Accepts ids made of letters, digits, `-` and `_`.
pub fn validate_spreadsheet_id(id: &str) -> Result<(), ConfigError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidSpreadsheetId(id.to_string()))
    }
}

impl OracleEnv {
    /// Builds the oracle settings from `LLM_*` variables. Missing endpoint or
    /// key are left blank and reported by [`OracleEnv::validate`].
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let endpoint = non_empty(lookup, "LLM_URL").unwrap_or_default();
        let api_key = non_empty(lookup, "LLM_KEY").unwrap_or_default();
        let model =
            non_empty(lookup, "LLM_MODEL").unwrap_or_else(|| DEFAULT_ORACLE_MODEL.to_string());
        let timeout = read_u64(lookup, "LLM_TIMEOUT_SECS", DEFAULT_ORACLE_TIMEOUT.as_secs())?;

        Ok(Self::new(endpoint, model, api_key, Duration::from_secs(timeout)))
    }

    /// Fails when the endpoint or the bearer token is missing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.is_empty() {
            return Err(ConfigError::Missing("LLM_URL"));
        }
        if self.api_key.is_empty() {
            return Err(ConfigError::Missing("LLM_KEY"));
        }
        Ok(())
    }
}

impl GraderConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps variable names to
    /// values.
    ///
    /// The Google source is assumed; call [`GraderConfig::use_local_sheet`]
    /// afterwards to grade a CSV file instead.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let oracle = OracleEnv::from_lookup(&lookup)?;
        let credentials = PathBuf::from(
            non_empty(&lookup, "GOOGLE_SERVICE_ACCOUNT_FILE")
                .unwrap_or_else(|| DEFAULT_CREDENTIALS_FILE.to_string()),
        );
        let tab = non_empty(&lookup, "SHEET_TAB").unwrap_or_else(|| DEFAULT_TAB.to_string());
        let spreadsheet_id = non_empty(&lookup, "SPREADSHEET_ID").unwrap_or_default();

        let history_sheet = non_empty(&lookup, "COMMON_MISTAKES_SHEET_ID");
        let sheets_api_base = non_empty(&lookup, "SHEETS_API_BASE")
            .unwrap_or_else(|| SHEETS_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let row_delay = Duration::from_millis(read_u64(
            &lookup,
            "GRADER_ROW_DELAY_MS",
            DEFAULT_ROW_DELAY.as_millis() as u64,
        )?);
        let export_path = Some(PathBuf::from(
            non_empty(&lookup, "GRADER_EXPORT_PATH")
                .unwrap_or_else(|| DEFAULT_EXPORT_PATH.to_string()),
        ));

        Ok(Self {
            sheet: SheetSource::Google {
                spreadsheet_id,
                tab,
            },
            history_sheet,
            credentials,
            sheets_api_base,
            oracle,
            row_delay,
            export_path,
            answer_key: None,
            inject_hints: false,
        })
    }

    /// Switches the grading sheet to a local CSV file.
    pub fn use_local_sheet(&mut self, path: impl Into<PathBuf>) {
        self.sheet = SheetSource::Local(path.into());
    }

    /// Checks everything a grading run needs before any network call.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.oracle.validate()?;
        self.validate_sheets()
    }

    /// Checks the sheet settings alone: spreadsheet ids are well formed and
    /// the credential file exists whenever a Google sheet is involved.
    pub fn validate_sheets(&self) -> Result<(), ConfigError> {
        let mut needs_credentials = false;
        if let SheetSource::Google { spreadsheet_id, .. } = &self.sheet {
            if spreadsheet_id.is_empty() {
                return Err(ConfigError::Missing("SPREADSHEET_ID"));
            }
            validate_spreadsheet_id(spreadsheet_id)?;
            needs_credentials = true;
        }
        if let Some(history) = &self.history_sheet {
            validate_spreadsheet_id(history)?;
            needs_credentials = true;
        }
        if needs_credentials && !self.credentials.is_file() {
            return Err(ConfigError::CredentialsNotFound(self.credentials.clone()));
        }
        Ok(())
    }
}
