//! Load a Google Sheets worksheet into a normalized table and ask an
//! LLM-backed agent questions about it.
//!
//! [`SheetLoader`] is the entry point shared by both binaries: the
//! `sheet_agent` CLI, which feeds the table to a [`TableAgent`], and the
//! `sheet_viewer` desktop app, which renders it.

pub mod agent;
pub mod cloud_handler;
pub mod csv_handler;
pub mod data_types;
pub mod error;
pub mod loader;
pub mod logging;
pub mod settings;

pub use agent::{AgentError, AgentReply, GeminiAgent, TableAgent};
pub use cloud_handler::GoogleConnector;
pub use data_types::{CellValue, LoadedTable, SheetRef, Table};
pub use error::{ApiError, LoadError, LoadResult};
pub use loader::{Connector, SheetLoader, SheetsApi, SpreadsheetMeta, WorksheetMeta};
pub use settings::{AppConfig, LoaderConfig};
