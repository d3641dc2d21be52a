// src/cloud_handler.rs
use std::io::ErrorKind;
use std::path::Path;

use google_sheets4::api::Spreadsheet;
use google_sheets4::{hyper, hyper_rustls, Sheets};
use serde_json::{from_str, Value};
use tracing::debug;
use yup_oauth2::{ServiceAccountAuthenticator, ServiceAccountKey};

use crate::error::{ApiError, LoadError};
use crate::loader::{Connector, SheetsApi, SpreadsheetMeta, WorksheetMeta};
use crate::settings::{DateTimeRender, LoaderConfig, ValueRender};

type HttpsConnector = hyper_rustls::HttpsConnector<hyper::client::HttpConnector>;

/// Fields requested from `spreadsheets.get`; grid data is never fetched there.
const METADATA_FIELDS: &str = "properties.title,sheets.properties(sheetId,title,index)";

/// Connects to Google Sheets with a service-account key file.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoogleConnector;

impl Connector for GoogleConnector {
    type Api = GoogleSheetsApi;

    async fn connect(&self, config: &LoaderConfig) -> Result<GoogleSheetsApi, LoadError> {
        let path = config.credentials_path.as_path();
        let service_account_key = read_service_account_key(path).await?;
        debug!(client_email = %service_account_key.client_email, "Service account key loaded");

        // No token is requested until the first API call.
        let auth = ServiceAccountAuthenticator::builder(service_account_key)
            .build()
            .await
            .map_err(|e| LoadError::CredentialsUnavailable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let client = hyper::Client::builder().build(
            hyper_rustls::HttpsConnectorBuilder::new()
                .with_native_roots()
                .https_or_http()
                .enable_http1()
                .build(),
        );

        Ok(GoogleSheetsApi {
            hub: Sheets::new(client, auth),
            scopes: config.scopes.clone(),
            value_render: config.value_render,
            date_time_render: config.date_time_render,
        })
    }
}

async fn read_service_account_key(path: &Path) -> Result<ServiceAccountKey, LoadError> {
    let unavailable = |reason: String| LoadError::CredentialsUnavailable {
        path: path.to_path_buf(),
        reason,
    };

    let json = tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => unavailable("file not found".to_string()),
        _ => unavailable(e.to_string()),
    })?;

    from_str::<ServiceAccountKey>(&json)
        .map_err(|e| unavailable(format!("not a service account key: {}", e)))
}

/// Authenticated Sheets v4 client.
pub struct GoogleSheetsApi {
    hub: Sheets<HttpsConnector>,
    scopes: Vec<String>,
    value_render: ValueRender,
    date_time_render: DateTimeRender,
}

impl SheetsApi for GoogleSheetsApi {
    async fn open_by_key(&self, key: &str) -> Result<SpreadsheetMeta, ApiError> {
        let mut call = self
            .hub
            .spreadsheets()
            .get(key)
            .include_grid_data(false)
            .param("fields", METADATA_FIELDS);
        for scope in &self.scopes {
            call = call.add_scope(scope);
        }

        let (_, spreadsheet) = call.doit().await.map_err(api_error)?;
        Ok(spreadsheet_meta(spreadsheet))
    }

    async fn read_values(&self, key: &str, worksheet: &str) -> Result<Vec<Vec<Value>>, ApiError> {
        let range = quote_sheet_title(worksheet);
        let mut call = self
            .hub
            .spreadsheets()
            .values_get(key, &range)
            .major_dimension("ROWS")
            .value_render_option(self.value_render.as_api_str())
            .date_time_render_option(self.date_time_render.as_api_str());
        for scope in &self.scopes {
            call = call.add_scope(scope);
        }

        let (_, response) = call.doit().await.map_err(api_error)?;
        Ok(response.values.unwrap_or_default())
    }
}

fn spreadsheet_meta(spreadsheet: Spreadsheet) -> SpreadsheetMeta {
    let worksheets = spreadsheet
        .sheets
        .unwrap_or_default()
        .into_iter()
        .filter_map(|sheet| {
            let properties = sheet.properties?;
            Some(WorksheetMeta {
                title: properties.title?,
                sheet_id: properties.sheet_id,
                index: properties.index,
            })
        })
        .collect();

    SpreadsheetMeta {
        title: spreadsheet.properties.and_then(|p| p.title),
        worksheets,
    }
}

/// A1 range covering a whole tab: the title in single quotes, inner quotes doubled.
pub fn quote_sheet_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

fn api_error(err: google_sheets4::Error) -> ApiError {
    match err {
        google_sheets4::Error::BadRequest(body) => error_from_body(&body),
        google_sheets4::Error::Failure(response) => {
            let status = response.status();
            ApiError::new(Some(status.as_u16()), format!("HTTP {}", status))
        }
        google_sheets4::Error::MissingToken(e) => {
            ApiError::transport(format!("could not obtain an access token: {}", e))
        }
        other => ApiError::transport(other.to_string()),
    }
}

/// Reads a Google API error document: `{"error": {"code": .., "message": ..}}`.
fn error_from_body(body: &Value) -> ApiError {
    let error = &body["error"];
    let status = error["code"].as_u64().and_then(|c| u16::try_from(c).ok());
    let message = error["message"]
        .as_str()
        .map(String::from)
        .unwrap_or_else(|| body.to_string());
    ApiError::new(status, message)
}
