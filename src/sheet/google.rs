#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{CellWrite, SheetError, SheetSnapshot, SheetStore, auth::TokenSource};

/// Converts a 0-based column index to its letter form (`0` → `A`, `26` →
/// `AA`).
pub fn column_letters(column: usize) -> String {
    let mut n = column + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Quotes a tab name for A1 notation when it holds anything beyond letters,
/// digits and underscores.
pub fn quote_tab(tab: &str) -> String {
    if !tab.is_empty() && tab.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        tab.to_string()
    } else {
        format!("'{}'", tab.replace('\'', "''"))
    }
}

/// A1 reference of a 0-based cell on `tab`.
pub fn a1_cell(tab: &str, row: usize, column: usize) -> String {
    format!("{}!{}{}", quote_tab(tab), column_letters(column), row + 1)
}

/// `values` payload of a range read.
#[derive(Deserialize)]
struct ValueRange {
    /// Rows of cells; absent for an empty sheet.
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// One range of a batch update.
#[derive(Serialize)]
struct RangeUpdate {
    /// A1 range.
    range:  String,
    /// A single row holding a single cell.
    values: [[String; 1]; 1],
}

/// Body of `values:batchUpdate`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdate {
    /// Always `RAW`: values are stored exactly as sent.
    value_input_option: &'static str,
    /// Ranges to overwrite.
    data:               Vec<RangeUpdate>,
}

/// Renders a cell as the text shown in the sheet.
fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// One tab of a Google spreadsheet, accessed through the Sheets v4 REST API.
pub struct GoogleSheet {
    /// Shared HTTP client.
    client:         reqwest::Client,
    /// API base URL, without trailing slash.
    api_base:       String,
    /// Spreadsheet identifier.
    spreadsheet_id: String,
    /// Tab name.
    tab:            String,
    /// Bearer token provider.
    auth:           Arc<dyn TokenSource>,
}

impl GoogleSheet {
    /// Addresses `tab` of `spreadsheet_id`.
    pub fn new(
        client: reqwest::Client,
        api_base: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        tab: impl Into<String>,
        auth: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            tab: tab.into(),
            auth,
        }
    }

    /// Addresses the first tab of `spreadsheet_id`, looking its name up.
    pub async fn open_first_tab(
        client: reqwest::Client,
        api_base: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        auth: Arc<dyn TokenSource>,
    ) -> Result<Self, SheetError> {
        let mut sheet = Self::new(client, api_base, spreadsheet_id, String::new(), auth);
        let mut url = sheet.url(&[])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");
        let meta: Value = sheet.send(sheet.client.get(url)).await?.json().await?;
        sheet.tab = meta
            .pointer("/sheets/0/properties/title")
            .and_then(Value::as_str)
            .ok_or_else(|| SheetError::Malformed(format!("spreadsheet has no tabs: {meta}")))?
            .to_string();
        Ok(sheet)
    }

    /// Tab name.
    pub fn tab(&self) -> &str {
        &self.tab
    }

    /// `{api_base}/v4/spreadsheets/{id}` followed by `segments`, each
    /// percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url, SheetError> {
        let mut url = Url::parse(&format!("{}/v4/spreadsheets", self.api_base))
            .map_err(|e| SheetError::Malformed(format!("bad Sheets API base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| SheetError::Malformed("Sheets API base URL cannot hold a path".into()))?
            .push(&self.spreadsheet_id)
            .extend(segments);
        Ok(url)
    }

    /// Attaches a bearer token, sends, and turns error statuses into
    /// [`SheetError::Api`].
    async fn send(&self, request: RequestBuilder) -> Result<Response, SheetError> {
        let token = self.auth.access_token(&self.client).await?;
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl SheetStore for GoogleSheet {
    async fn title(&self) -> Result<String, SheetError> {
        let mut url = self.url(&[])?;
        url.query_pairs_mut()
            .append_pair("fields", "properties.title");
        let meta: Value = self.send(self.client.get(url)).await?.json().await?;
        let title = meta
            .pointer("/properties/title")
            .and_then(Value::as_str)
            .unwrap_or(self.spreadsheet_id.as_str());
        Ok(format!("{title} / {}", self.tab))
    }

    async fn read_all(&self) -> Result<SheetSnapshot, SheetError> {
        let range = quote_tab(&self.tab);
        let url = self.url(&["values", range.as_str()])?;
        let values: ValueRange = self.send(self.client.get(url)).await?.json().await?;
        let grid = values
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect();
        Ok(SheetSnapshot::from_grid(grid))
    }

    async fn write_cells(&self, cells: &[CellWrite]) -> Result<(), SheetError> {
        if cells.is_empty() {
            return Ok(());
        }
        let body = BatchUpdate {
            value_input_option: "RAW",
            data:               cells
                .iter()
                .map(|c| RangeUpdate {
                    range:  a1_cell(&self.tab, c.row, c.column),
                    values: [[c.value.clone()]],
                })
                .collect(),
        };
        let url = self.url(&["values:batchUpdate"])?;
        self.send(self.client.post(url).json(&body)).await?;
        Ok(())
    }
}
