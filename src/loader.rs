// src/loader.rs
use std::future::Future;

use chrono::Local;
use serde_json::Value;
use tokio::task;
use tracing::{info, warn};

use crate::cloud_handler::GoogleConnector;
use crate::data_types::{LoadedTable, SheetRef, Table};
use crate::error::{ApiError, LoadError, LoadResult};
use crate::settings::LoaderConfig;

/// One tab of a spreadsheet, as listed in its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorksheetMeta {
    pub title: String,
    pub sheet_id: Option<i32>,
    pub index: Option<i32>,
}

/// Spreadsheet metadata returned when a key resolves.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpreadsheetMeta {
    pub title: Option<String>,
    pub worksheets: Vec<WorksheetMeta>,
}

impl SpreadsheetMeta {
    /// Exact, case-sensitive title match.
    pub fn worksheet(&self, title: &str) -> Option<&WorksheetMeta> {
        self.worksheets.iter().find(|w| w.title == title)
    }
}

/// Authenticated access to a spreadsheet service.
pub trait SheetsApi: Send + Sync {
    /// Resolves a spreadsheet by key and lists its tabs.
    fn open_by_key(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<SpreadsheetMeta, ApiError>> + Send;

    /// Reads every populated row of one tab, header row included.
    fn read_values(
        &self,
        key: &str,
        worksheet: &str,
    ) -> impl Future<Output = Result<Vec<Vec<Value>>, ApiError>> + Send;
}

/// Turns credential material into a [`SheetsApi`].
///
/// Implementations must fail with [`LoadError::CredentialsUnavailable`] when
/// the material cannot be found or parsed, without touching the network.
pub trait Connector: Send + Sync {
    type Api: SheetsApi;

    fn connect(
        &self,
        config: &LoaderConfig,
    ) -> impl Future<Output = Result<Self::Api, LoadError>> + Send;
}

/// Loads one worksheet into a normalized [`Table`].
///
/// Each call authenticates, resolves the spreadsheet, resolves the tab and
/// reads its values exactly once. Nothing is cached or retried, and the
/// remote sheet is never written.
pub struct SheetLoader<C = GoogleConnector> {
    connector: C,
    config: LoaderConfig,
}

impl SheetLoader<GoogleConnector> {
    pub fn new(config: LoaderConfig) -> Self {
        SheetLoader::with_connector(GoogleConnector, config)
    }
}

impl<C: Connector> SheetLoader<C> {
    pub fn with_connector(connector: C, config: LoaderConfig) -> Self {
        SheetLoader { connector, config }
    }

    #[tracing::instrument(skip_all, fields(sheet = %sheet))]
    pub async fn load(&self, sheet: &SheetRef) -> LoadResult<LoadedTable> {
        let result = self.load_inner(sheet).await;
        if let Err(err) = &result {
            warn!(error = %err, "Worksheet load failed");
        }
        result
    }

    async fn load_inner(&self, sheet: &SheetRef) -> LoadResult<LoadedTable> {
        let key = sheet.spreadsheet_key.as_str();
        let worksheet = sheet.worksheet.as_str();

        if key.trim().is_empty() {
            return Err(LoadError::unexpected("spreadsheet key must not be empty"));
        }
        if worksheet.trim().is_empty() {
            return Err(LoadError::unexpected("worksheet name must not be empty"));
        }

        info!("Authenticating with Google Sheets");
        let api = self.connector.connect(&self.config).await?;

        info!(key, "Opening spreadsheet");
        let meta = api
            .open_by_key(key)
            .await
            .map_err(|err| classify_open_error(key, err))?;

        info!(worksheet, "Accessing worksheet");
        let tab = meta
            .worksheet(worksheet)
            .ok_or_else(|| LoadError::SubResourceNotFound {
                worksheet: worksheet.to_string(),
            })?;

        info!("Fetching values");
        let values = api
            .read_values(key, &tab.title)
            .await
            .map_err(|err| classify_read_error(worksheet, err))?;

        let table = task::spawn_blocking(move || Table::from_values(&values))
            .await
            .map_err(|err| LoadError::unexpected(format!("table build task failed: {}", err)))?;

        info!(
            rows = table.row_count(),
            columns = table.column_count(),
            "Data loaded successfully"
        );

        Ok(LoadedTable {
            source: sheet.clone(),
            spreadsheet_title: meta.title.clone(),
            fetched_at: Local::now(),
            table,
        })
    }
}

/// 404 and 403 look the same from here: the key is not visible to us.
fn classify_open_error(key: &str, err: ApiError) -> LoadError {
    match err.status {
        Some(403) | Some(404) => LoadError::ResourceNotFound {
            key: key.to_string(),
        },
        _ => LoadError::UnexpectedFailure(err.message),
    }
}

/// A tab deleted between the metadata and the values request surfaces as a
/// range parse failure.
fn classify_read_error(worksheet: &str, err: ApiError) -> LoadError {
    match err.status {
        Some(400) if err.message.contains("Unable to parse range") => {
            LoadError::SubResourceNotFound {
                worksheet: worksheet.to_string(),
            }
        }
        _ => LoadError::UnexpectedFailure(err.message),
    }
}
