//! Google Sheets v4 values client.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{OffsetDateTime, PrimitiveDateTime};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::sink::RowSink;
use crate::error::SheetsError;
use crate::row::{CellValue, PriceRow};

/// Values payload for reads and writes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValueRange {
    /// A1 range the values belong to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    /// Rows of cells.
    #[serde(default)]
    pub values: Vec<Vec<serde_json::Value>>,
}

/// Appends price rows to one tab of a spreadsheet.
#[derive(Debug, Clone)]
pub struct GoogleSheetsClient {
    http: reqwest::Client,
    base_url: String,
    sheet_id: String,
    sheet_name: String,
    access_token: String,
}

impl GoogleSheetsClient {
    /// Create a client over a shared HTTP session.
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        sheet_id: impl Into<String>,
        sheet_name: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            sheet_id: sheet_id.into(),
            sheet_name: sheet_name.into(),
            access_token: access_token.into(),
        }
    }

    /// Spreadsheet id.
    pub fn sheet_id(&self) -> &str {
        &self.sheet_id
    }

    /// Quoted tab name; as a range it covers every column of the tab.
    pub fn tab(&self) -> String {
        format!("'{}'", self.sheet_name.replace('\'', "''"))
    }

    /// A1 range on this client's tab, e.g. `'Polymarket Prices'!A:A`.
    pub fn range(&self, cells: &str) -> String {
        format!("{}!{}", self.tab(), cells)
    }

    /// Values endpoint for a range, with an optional `:verb` suffix.
    fn values_url(&self, range: &str, verb: Option<&str>) -> Result<Url, SheetsError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| SheetsError::Parse {
            range: range.to_string(),
            reason: format!("invalid base URL {}: {}", self.base_url, e),
        })?;

        let last = match verb {
            Some(verb) => format!("{range}:{verb}"),
            None => range.to_string(),
        };

        url.path_segments_mut()
            .map_err(|_| SheetsError::Parse {
                range: range.to_string(),
                reason: format!("base URL {} cannot take a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(["spreadsheets", self.sheet_id.as_str(), "values", last.as_str()]);

        Ok(url)
    }

    async fn send(
        &self,
        range: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, SheetsError> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|source| SheetsError::Transport {
                range: range.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::HttpStatus {
                range: range.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    /// Read a range.
    #[instrument(skip(self))]
    pub async fn get_values(&self, range: &str) -> Result<Vec<Vec<serde_json::Value>>, SheetsError> {
        let url = self.values_url(range, None)?;
        let response = self.send(range, self.http.get(url)).await?;

        let body: ValueRange = response.json().await.map_err(|e| SheetsError::Parse {
            range: range.to_string(),
            reason: e.to_string(),
        })?;

        Ok(body.values)
    }

    /// Overwrite a range.
    #[instrument(skip(self, rows))]
    pub async fn update_values(
        &self,
        range: &str,
        rows: Vec<Vec<serde_json::Value>>,
    ) -> Result<(), SheetsError> {
        let url = self.values_url(range, None)?;
        let count = rows.len();
        let body = ValueRange {
            range: Some(range.to_string()),
            values: rows,
        };

        self.send(
            range,
            self.http
                .put(url)
                .query(&[("valueInputOption", "RAW")])
                .json(&body),
        )
        .await?;

        info!(rows = count, "Wrote rows to sheet");
        Ok(())
    }

    /// Append rows after the last non-empty row of the tab.
    #[instrument(skip(self, rows))]
    pub async fn append_values(&self, rows: Vec<Vec<serde_json::Value>>) -> Result<(), SheetsError> {
        let range = self.tab();
        let url = self.values_url(&range, Some("append"))?;
        let count = rows.len();
        let body = ValueRange {
            range: None,
            values: rows,
        };

        self.send(
            &range,
            self.http
                .post(url)
                .query(&[
                    ("valueInputOption", "RAW"),
                    ("insertDataOption", "INSERT_ROWS"),
                ])
                .json(&body),
        )
        .await?;

        info!(rows = count, "Appended rows to sheet");
        Ok(())
    }

    /// Write the header row if the tab has none.
    ///
    /// An existing header row is left alone; a different column set is
    /// only reported.
    pub async fn ensure_headers(&self, headers: &[String]) -> Result<(), SheetsError> {
        let existing = self.get_values(&self.range("1:1")).await?;

        match check_headers(&existing, headers) {
            HeaderCheck::Missing => {
                info!(columns = headers.len(), "Creating header row");
                let row: Vec<serde_json::Value> = headers
                    .iter()
                    .map(|h| serde_json::Value::String(h.clone()))
                    .collect();
                self.update_values(&self.range("A1"), vec![row]).await
            }
            HeaderCheck::Matches => Ok(()),
            HeaderCheck::Differs(found) => {
                warn!(
                    existing = ?found,
                    expected = ?headers,
                    "Existing headers don't match expected headers"
                );
                Ok(())
            }
        }
    }
}

/// Header row of a tab compared with the columns about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderCheck {
    /// Row 1 is empty.
    Missing,
    /// Same column set, in any order.
    Matches,
    /// A different column set; carries the headers found.
    Differs(Vec<String>),
}

/// Compare the values read from row 1 with the expected headers.
pub fn check_headers(existing: &[Vec<serde_json::Value>], expected: &[String]) -> HeaderCheck {
    let Some(row) = existing.first().filter(|row| !row.is_empty()) else {
        return HeaderCheck::Missing;
    };

    let found: Vec<String> = row.iter().map(cell_text).collect();
    let current: HashSet<&str> = found.iter().map(String::as_str).collect();
    let wanted: HashSet<&str> = expected.iter().map(String::as_str).collect();

    if current == wanted {
        HeaderCheck::Matches
    } else {
        HeaderCheck::Differs(found)
    }
}

/// Timestamp of the last data row in column A.
///
/// Row 1 is the header. Blank cells are skipped; an unparsable last value
/// yields `None`.
pub fn last_timestamp(column: &[Vec<serde_json::Value>]) -> Option<OffsetDateTime> {
    let text = column
        .iter()
        .skip(1)
        .rev()
        .filter_map(|row| row.first())
        .map(cell_text)
        .find(|text| !text.trim().is_empty())?;

    let parsed = parse_timestamp(&text);
    if parsed.is_none() {
        warn!(value = %text, "Could not parse timestamp");
    }
    parsed
}

#[async_trait]
impl RowSink for GoogleSheetsClient {
    fn name(&self) -> &'static str {
        "sheets"
    }

    async fn write_row(&self, row: &PriceRow) -> Result<(), SheetsError> {
        self.ensure_headers(&row.headers()).await?;
        let values: Vec<serde_json::Value> = row.values().iter().map(cell_json).collect();
        self.append_values(vec![values]).await
    }

    async fn last_update_time(&self) -> Result<Option<OffsetDateTime>, SheetsError> {
        let column = self.get_values(&self.range("A:A")).await?;
        let last = last_timestamp(&column);
        debug!(last_update = ?last, rows = column.len(), "Read last update time");
        Ok(last)
    }
}

/// JSON value for a RAW write.
fn cell_json(cell: &CellValue) -> serde_json::Value {
    serde_json::to_value(cell).unwrap_or_else(|_| serde_json::Value::String(cell.to_string()))
}

/// Text of a cell read back from the API.
fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse an RFC 3339 timestamp; values without an offset are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<OffsetDateTime> {
    let value = value.trim();
    OffsetDateTime::parse(value, &Rfc3339)
        .ok()
        .or_else(|| {
            PrimitiveDateTime::parse(value, &Iso8601::DEFAULT)
                .ok()
                .map(PrimitiveDateTime::assume_utc)
        })
}
