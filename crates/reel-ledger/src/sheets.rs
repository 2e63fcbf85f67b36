//! Google Sheets ledger backend.
//!
//! Layout: header in row 1, one ledger row per sheet row from row 2, the
//! 16 columns in `A..P`. Updates locate the row by scanning column `A` and
//! write each changed cell with a single `values:batchUpdate`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reel_models::{LedgerColumn, LedgerRow, NewLedgerEntry};
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::store::{require_id, Ledger, LedgerUpdate};
use crate::token_cache::{BearerAuth, TokenCache};

/// Sheets REST API base.
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// First sheet row holding data.
const FIRST_DATA_ROW: usize = 2;

// =============================================================================
// Configuration
// =============================================================================

/// Sheets ledger configuration.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    /// Spreadsheet id from the sheet URL
    pub spreadsheet_id: String,
    /// Tab holding the ledger
    pub sheet_name: String,
    /// Service-account key JSON
    pub credentials_json: Option<String>,
    /// API base URL
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            sheet_name: "prompts".to_string(),
            credentials_json: None,
            base_url: SHEETS_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl SheetsConfig {
    /// Create config from environment variables.
    pub fn from_env() -> LedgerResult<Self> {
        let spreadsheet_id = std::env::var("SPREADSHEET_ID")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| LedgerError::config_error("SPREADSHEET_ID must be set"))?;

        Ok(Self {
            spreadsheet_id,
            sheet_name: std::env::var("SHEET_NAME").unwrap_or_else(|_| "prompts".to_string()),
            credentials_json: std::env::var("GOOGLE_CREDENTIALS_JSON")
                .ok()
                .filter(|s| !s.is_empty()),
            base_url: std::env::var("SHEETS_API_URL")
                .unwrap_or_else(|_| SHEETS_API_BASE.to_string()),
            timeout: Duration::from_secs(
                std::env::var("SHEETS_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        })
    }

    /// Same spreadsheet, different tab.
    pub fn for_sheet(&self, sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// =============================================================================
// Client
// =============================================================================

/// Ledger stored in a Google Sheets tab.
pub struct SheetsLedger {
    http: Client,
    config: SheetsConfig,
    auth: Arc<dyn BearerAuth>,
}

impl SheetsLedger {
    /// Create a ledger authenticated with the configured service account.
    pub fn new(config: SheetsConfig) -> LedgerResult<Self> {
        let json = config.credentials_json.as_deref().ok_or_else(|| {
            LedgerError::config_error("GOOGLE_CREDENTIALS_JSON must be set to access the ledger")
        })?;
        let auth = Arc::new(TokenCache::from_service_account_json(json)?);
        Self::with_auth(config, auth)
    }

    /// Create a ledger with an explicit token source.
    pub fn with_auth(config: SheetsConfig, auth: Arc<dyn BearerAuth>) -> LedgerResult<Self> {
        if config.spreadsheet_id.is_empty() {
            return Err(LedgerError::config_error("spreadsheet id is empty"));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("reel-ledger/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(LedgerError::Network)?;

        Ok(Self { http, config, auth })
    }

    pub fn sheet_name(&self) -> &str {
        &self.config.sheet_name
    }

    fn range(&self, cells: &str) -> String {
        format!("{}!{}", self.config.sheet_name, cells)
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/{}/values/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.spreadsheet_id,
            urlencoding::encode(range)
        )
    }

    async fn request(&self, method: Method, url: &str) -> LedgerResult<RequestBuilder> {
        let token = self.auth.bearer_token().await?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> LedgerResult<reqwest::Response> {
        let response = builder.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::request_failed(format!(
                "{} returned {}: {}",
                what, status, body
            )));
        }
        Ok(response)
    }

    async fn read_range(&self, range: &str) -> LedgerResult<Vec<Vec<String>>> {
        let url = self.values_url(range);
        let builder = self.request(Method::GET, &url).await?;
        let response = self.send(builder, "values.get").await?;
        let body: ValueRange = response.json().await?;

        Ok(body
            .values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }

    async fn write_range(&self, range: &str, values: Vec<Vec<String>>) -> LedgerResult<()> {
        let url = self.values_url(range);
        let builder = self
            .request(Method::PUT, &url)
            .await?
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({ "values": values }));
        self.send(builder, "values.update").await?;
        Ok(())
    }

    /// Raw data rows, padded to the full column count.
    async fn data_rows(&self) -> LedgerResult<Vec<Vec<String>>> {
        let mut rows = self.read_range(&self.range("A2:P")).await?;
        for row in &mut rows {
            row.resize(LedgerColumn::COUNT, String::new());
        }
        Ok(rows)
    }

    /// Sheet row number holding identifier `id`.
    async fn locate(&self, id: &str) -> LedgerResult<Option<usize>> {
        let rows = self.data_rows().await?;
        Ok(rows
            .iter()
            .position(|cells| cells[LedgerColumn::Id.index()] == id)
            .map(|i| i + FIRST_DATA_ROW))
    }
}

#[async_trait]
impl Ledger for SheetsLedger {
    async fn init(&self) -> LedgerResult<()> {
        let header_range = self.range("A1:P1");
        let existing = self.read_range(&header_range).await?;
        if existing.first().is_some_and(|row| !row.is_empty()) {
            debug!(sheet = %self.config.sheet_name, "Ledger header already present");
            return Ok(());
        }

        self.write_range(&header_range, vec![LedgerColumn::headers()])
            .await?;
        info!(sheet = %self.config.sheet_name, "Ledger header written");
        Ok(())
    }

    async fn all_rows(&self) -> LedgerResult<Vec<LedgerRow>> {
        let rows = self.data_rows().await?;
        let mut parsed = Vec::with_capacity(rows.len());

        for (i, cells) in rows.iter().enumerate() {
            if cells.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            match LedgerRow::from_cells(cells) {
                Ok(row) => parsed.push(row),
                Err(e) => warn!(
                    sheet = %self.config.sheet_name,
                    sheet_row = i + FIRST_DATA_ROW,
                    error = %e,
                    "Skipping unreadable ledger row"
                ),
            }
        }

        Ok(parsed)
    }

    async fn append(&self, entries: &[NewLedgerEntry]) -> LedgerResult<Vec<String>> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let next_id = self.data_rows().await?.len() + 1;
        let now = Utc::now();

        let mut ids = Vec::with_capacity(entries.len());
        let mut values = Vec::with_capacity(entries.len());
        for (offset, entry) in entries.iter().enumerate() {
            let id = (next_id + offset).to_string();
            values.push(LedgerRow::from_entry(id.clone(), entry, now).to_cells());
            ids.push(id);
        }

        let url = format!("{}:append", self.values_url(&self.range("A:P")));
        let builder = self
            .request(Method::POST, &url)
            .await?
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&json!({ "values": values }));
        self.send(builder, "values.append").await?;

        info!(
            sheet = %self.config.sheet_name,
            count = ids.len(),
            "Appended ledger rows"
        );
        Ok(ids)
    }

    async fn update_fields(&self, id: &str, update: &LedgerUpdate) -> LedgerResult<bool> {
        require_id(id)?;
        if update.is_empty() {
            return Ok(self.locate(id).await?.is_some());
        }

        let Some(sheet_row) = self.locate(id).await? else {
            return Ok(false);
        };

        let data: Vec<Value> = update
            .fields()
            .iter()
            .map(|(column, value)| {
                json!({
                    "range": self.range(&format!("{}{}", column.letter(), sheet_row)),
                    "values": [[value]],
                })
            })
            .collect();

        let url = format!(
            "{}/{}/values:batchUpdate",
            self.config.base_url.trim_end_matches('/'),
            self.config.spreadsheet_id
        );
        let builder = self
            .request(Method::POST, &url)
            .await?
            .json(&json!({ "valueInputOption": "RAW", "data": data }));
        self.send(builder, "values.batchUpdate").await?;

        debug!(row_id = %id, sheet_row = sheet_row, fields = update.fields().len(), "Updated ledger row");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_cache::StaticToken;
    use reel_models::LedgerStage;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ledger_for(server: &MockServer) -> SheetsLedger {
        let config = SheetsConfig {
            spreadsheet_id: "sheet-123".into(),
            base_url: server.uri(),
            ..Default::default()
        };
        SheetsLedger::with_auth(config, Arc::new(StaticToken("token".into()))).unwrap()
    }

    fn values_path(range: &str) -> String {
        format!("/sheet-123/values/{}", urlencoding::encode(range))
    }

    async fn mount_rows(server: &MockServer, rows: Value) {
        Mock::given(method("GET"))
            .and(path(values_path("prompts!A2:P")))
            .and(header("authorization", "Bearer token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "values": rows })))
            .mount(server)
            .await;
    }

    #[test]
    fn test_missing_credentials_is_config_error() {
        let config = SheetsConfig {
            spreadsheet_id: "sheet-123".into(),
            ..Default::default()
        };
        assert!(matches!(
            SheetsLedger::new(config),
            Err(LedgerError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_rows_are_padded_and_unknown_stages_skipped() {
        let server = MockServer::start().await;
        mount_rows(
            &server,
            json!([
                ["1", "2026-01-01T00:00:00Z", "first", "comedy", "generated"],
                ["2", "2026-01-01T00:00:00Z", "second", "comedy", "archived"],
                ["3", "2026-01-01T00:00:00Z", "third", "", "pending"],
                ["4", "2026-01-01T00:00:00Z", "fourth"]
            ]),
        )
        .await;

        let ledger = ledger_for(&server);
        let rows = ledger.all_rows().await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].status, LedgerStage::Generated);
        assert_eq!(rows[1].id, "3");
        assert_eq!(rows[1].status, LedgerStage::Pending);
        assert_eq!(rows[1].error, "");
    }

    #[tokio::test]
    async fn test_blank_rows_are_never_read_or_written() {
        let server = MockServer::start().await;
        mount_rows(
            &server,
            json!([
                ["1", "2026-01-01T00:00:00Z", "first", "comedy", "generated"],
                [],
                ["3", "2026-01-01T00:00:00Z", "other", "comedy", "pending"]
            ]),
        )
        .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let ledger = Arc::new(ledger_for(&server));
        let pending = ledger.rows_with_stage(LedgerStage::Pending).await.unwrap();
        let ids: Vec<_> = pending.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["3"]);

        assert!(matches!(ledger.get("").await, Err(LedgerError::InvalidRow(_))));
        let update = LedgerUpdate::new().set(LedgerColumn::Error, "boom");
        assert!(matches!(
            ledger.update_fields(" ", &update).await,
            Err(LedgerError::InvalidRow(_))
        ));

        let writer = crate::writer::LedgerWriter::new(ledger);
        assert!(writer.mark_error("", "boom").await.is_err());
    }

    #[tokio::test]
    async fn test_append_numbers_rows_after_existing() {
        let server = MockServer::start().await;
        mount_rows(&server, json!([["1"], ["2"]])).await;

        Mock::given(method("POST"))
            .and(path(format!("{}:append", values_path("prompts!A:P"))))
            .and(query_param("valueInputOption", "RAW"))
            .and(query_param("insertDataOption", "INSERT_ROWS"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let ledger = ledger_for(&server);
        let ids = ledger
            .append(&[
                NewLedgerEntry {
                    prompt: "a".into(),
                    hashtags: vec!["x".into(), "y".into()],
                    ..Default::default()
                },
                NewLedgerEntry {
                    prompt: "b".into(),
                    ..Default::default()
                },
            ])
            .await
            .unwrap();

        assert_eq!(ids, vec!["3", "4"]);
    }

    #[tokio::test]
    async fn test_update_writes_cells_of_matching_row() {
        let server = MockServer::start().await;
        mount_rows(&server, json!([["1"], ["2"], ["3"]])).await;

        Mock::given(method("POST"))
            .and(path("/sheet-123/values:batchUpdate"))
            .and(body_partial_json(json!({
                "valueInputOption": "RAW",
                "data": [
                    {"range": "prompts!E3", "values": [["generating"]]},
                    {"range": "prompts!F3", "values": [["job-7"]]}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let ledger = ledger_for(&server);
        let update = LedgerUpdate::new()
            .stage(LedgerStage::Generating)
            .set(LedgerColumn::JobId, "job-7");

        assert!(ledger.update_fields("2", &update).await.unwrap());
        assert!(!ledger.update_fields("42", &update).await.unwrap());
    }

    #[tokio::test]
    async fn test_init_writes_header_only_when_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(values_path("prompts!A1:P1")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"range": "prompts!A1:P1"})))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(values_path("prompts!A1:P1")))
            .and(body_partial_json(json!({"values": [LedgerColumn::headers()]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        ledger_for(&server).init().await.unwrap();
    }

    #[tokio::test]
    async fn test_error_status_is_request_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let err = ledger_for(&server).all_rows().await.unwrap_err();
        assert!(matches!(err, LedgerError::RequestFailed(_)));
    }
}
