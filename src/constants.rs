#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::time::Duration;

/// Header label of the column receiving per-question feedback.
pub const FEEDBACK_COLUMN: &str = "Feedback";

/// Header label of the column receiving the total grade.
pub const GRADE_COLUMN: &str = "Grade";

/// Separator placed between per-question feedback fragments.
pub const FEEDBACK_DELIMITER: &str = " | ";

/// Fragment recorded for a question whose oracle call failed.
pub const API_ERROR_FRAGMENT: &str = "API error";

/// Tag counted when the oracle leaves `mistake_tag` empty.
pub const UNSPECIFIED_TAG: &str = "unspecified";

/// Points available for each question unless the answer key says otherwise.
pub const DEFAULT_MAX_POINTS: f64 = 0.5;

/// Pause between student rows, to stay under the spreadsheet API rate limit.
pub const DEFAULT_ROW_DELAY: Duration = Duration::from_millis(400);

/// Upper bound on a single oracle request.
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Model requested from the oracle endpoint when none is configured.
pub const DEFAULT_ORACLE_MODEL: &str = "gpt-oss:20b";

/// Number of mistake tags shown in the end-of-run summary.
pub const SUMMARY_TOP_N: usize = 10;

/// Maximum number of hints the mistake miner returns.
pub const MAX_HINTS: usize = 6;

/// Characters of a failed oracle response body kept in the error message.
pub const ERROR_BODY_TRUNCATE: usize = 500;

/// Default location of the CSV export.
pub const DEFAULT_EXPORT_PATH: &str = "grading_log.csv";

/// Default service-account key location.
pub const DEFAULT_CREDENTIALS_FILE: &str = "service_account.json";

/// Default tab read from the grading spreadsheet.
pub const DEFAULT_TAB: &str = "Sheet1";

/// Base URL of the Google Sheets REST API.
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

/// OAuth scope granting read/write access to spreadsheets.
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Built-in quiz: question column name paired with its canonical answer, in
/// grading order.
pub const BUILTIN_QUIZ: [(&str, &str); 4] = [
    (
        "Bits answer",
        "01010111 01101000 01100001 01110100 00100111 01110011 00100000 01110101 01110000 \
         00111111",
    ),
    ("Decimal answer", "087 104 097 116 039 115 032 117 112 063"),
    ("Hex answer", "57 68 61 74 27 73 20 75 70 3F"),
    ("Base64 answer", "V2hhdCdzIHVwPw=="),
];
