//! Worksheet loading against an in-memory spreadsheet service.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use sheet_agent::{
    ApiError, CellValue, Connector, LoadError, LoaderConfig, SheetLoader, SheetRef, SheetsApi,
    SpreadsheetMeta, WorksheetMeta,
};

#[derive(Clone, Default)]
struct FakeSpreadsheet {
    title: String,
    tabs: Vec<(String, Vec<Vec<Value>>)>,
}

#[derive(Default)]
struct Calls {
    connect: AtomicUsize,
    open: AtomicUsize,
    read: AtomicUsize,
}

/// Fake service. Keys in `forbidden` answer 403, keys in `failing` answer 500,
/// keys absent from `spreadsheets` answer 404.
#[derive(Clone, Default)]
struct FakeService {
    spreadsheets: HashMap<String, FakeSpreadsheet>,
    forbidden: Vec<String>,
    failing: Vec<String>,
    credentials_present: bool,
    calls: Arc<Calls>,
}

impl FakeService {
    fn with_sheet(key: &str, tab: &str, values: Value) -> Self {
        let mut service = FakeService {
            credentials_present: true,
            ..FakeService::default()
        };
        service.add_tab(key, tab, values);
        service
    }

    fn add_tab(&mut self, key: &str, tab: &str, values: Value) {
        let rows: Vec<Vec<Value>> = serde_json::from_value(values).unwrap();
        self.spreadsheets
            .entry(key.to_string())
            .or_insert_with(|| FakeSpreadsheet {
                title: format!("Spreadsheet {}", key),
                tabs: Vec::new(),
            })
            .tabs
            .push((tab.to_string(), rows));
    }

    fn network_calls(&self) -> usize {
        self.calls.open.load(Ordering::SeqCst) + self.calls.read.load(Ordering::SeqCst)
    }
}

impl Connector for FakeService {
    type Api = FakeService;

    async fn connect(&self, config: &LoaderConfig) -> Result<FakeService, LoadError> {
        self.calls.connect.fetch_add(1, Ordering::SeqCst);
        if !self.credentials_present {
            return Err(LoadError::CredentialsUnavailable {
                path: config.credentials_path.clone(),
                reason: "file not found".into(),
            });
        }
        Ok(self.clone())
    }
}

impl SheetsApi for FakeService {
    async fn open_by_key(&self, key: &str) -> Result<SpreadsheetMeta, ApiError> {
        self.calls.open.fetch_add(1, Ordering::SeqCst);
        if self.forbidden.iter().any(|k| k == key) {
            return Err(ApiError::new(Some(403), "The caller does not have permission"));
        }
        if self.failing.iter().any(|k| k == key) {
            return Err(ApiError::new(Some(500), "Internal error encountered."));
        }
        let spreadsheet = self
            .spreadsheets
            .get(key)
            .ok_or_else(|| ApiError::new(Some(404), "Requested entity was not found."))?;

        Ok(SpreadsheetMeta {
            title: Some(spreadsheet.title.clone()),
            worksheets: spreadsheet
                .tabs
                .iter()
                .enumerate()
                .map(|(i, (title, _))| WorksheetMeta {
                    title: title.clone(),
                    sheet_id: Some(i as i32),
                    index: Some(i as i32),
                })
                .collect(),
        })
    }

    async fn read_values(&self, key: &str, worksheet: &str) -> Result<Vec<Vec<Value>>, ApiError> {
        self.calls.read.fetch_add(1, Ordering::SeqCst);
        self.spreadsheets
            .get(key)
            .and_then(|s| s.tabs.iter().find(|(title, _)| title == worksheet))
            .map(|(_, values)| values.clone())
            .ok_or_else(|| {
                ApiError::new(Some(400), format!("Unable to parse range: '{}'", worksheet))
            })
    }
}

fn loader(service: &FakeService) -> SheetLoader<FakeService> {
    SheetLoader::with_connector(service.clone(), LoaderConfig::default())
}

fn staff_service() -> FakeService {
    FakeService::with_sheet(
        "ABC123",
        "Sheet1",
        json!([["EmpID", "Name"], [1, "Alice"], ["", ""], [2, "Bob"]]),
    )
}

#[tokio::test]
async fn loads_and_drops_empty_rows() {
    let service = staff_service();
    let loaded = loader(&service)
        .load(&SheetRef::new("ABC123", "Sheet1"))
        .await
        .unwrap();

    let table = &loaded.table;
    assert_eq!(table.columns(), ["EmpID", "Name"]);
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.get(0, "EmpID"), Some(&CellValue::Number(1.0)));
    assert_eq!(table.get(0, "Name"), Some(&CellValue::Text("Alice".into())));
    assert_eq!(table.get(1, "EmpID"), Some(&CellValue::Number(2.0)));
    assert_eq!(table.get(1, "Name"), Some(&CellValue::Text("Bob".into())));

    assert_eq!(loaded.source, SheetRef::new("ABC123", "Sheet1"));
    assert_eq!(loaded.spreadsheet_title.as_deref(), Some("Spreadsheet ABC123"));
}

#[tokio::test]
async fn unknown_key_is_resource_not_found() {
    let service = staff_service();
    let err = loader(&service)
        .load(&SheetRef::new("MISSING", "Sheet1"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        LoadError::ResourceNotFound {
            key: "MISSING".into()
        }
    );
    assert_eq!(service.calls.read.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unshared_key_is_also_resource_not_found() {
    let mut service = staff_service();
    service.forbidden.push("PRIVATE".into());

    let err = loader(&service)
        .load(&SheetRef::new("PRIVATE", "Sheet1"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        LoadError::ResourceNotFound {
            key: "PRIVATE".into()
        }
    );
}

#[tokio::test]
async fn unknown_tab_is_sub_resource_not_found() {
    let service = staff_service();
    let err = loader(&service)
        .load(&SheetRef::new("ABC123", "NoSuchTab"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        LoadError::SubResourceNotFound {
            worksheet: "NoSuchTab".into()
        }
    );
    assert!(err.to_string().contains("NoSuchTab"));
    assert_eq!(service.calls.read.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_credentials_fail_before_any_request() {
    let service = FakeService {
        credentials_present: false,
        ..staff_service()
    };
    let err = loader(&service)
        .load(&SheetRef::new("ABC123", "Sheet1"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        LoadError::CredentialsUnavailable {
            path: PathBuf::from("credentials.json"),
            reason: "file not found".into(),
        }
    );
    assert_eq!(service.network_calls(), 0);
}

#[tokio::test]
async fn server_failure_is_unexpected_with_message() {
    let mut service = staff_service();
    service.failing.push("ABC123".into());

    let err = loader(&service)
        .load(&SheetRef::new("ABC123", "Sheet1"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        LoadError::UnexpectedFailure("Internal error encountered.".into())
    );
}

#[tokio::test]
async fn empty_arguments_are_rejected_locally() {
    let service = staff_service();
    let loader = loader(&service);

    for sheet in [SheetRef::new("", "Sheet1"), SheetRef::new("ABC123", "  ")] {
        let err = loader.load(&sheet).await.unwrap_err();
        assert!(matches!(err, LoadError::UnexpectedFailure(_)));
    }
    assert_eq!(service.calls.connect.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn repeated_loads_are_row_identical() {
    let service = FakeService::with_sheet(
        "ABC123",
        "Creating_Tables",
        json!([
            ["Emp ID", "Last Name", "Dept", "Hire Date"],
            [1075, "Smith", "HR", "3/14/1998"],
            [1080, "Stone", "AC", "7/01/2004"],
            [],
            [1002, "Turner", "AC", "1/20/1995"],
        ]),
    );
    let loader = loader(&service);
    let sheet = SheetRef::new("ABC123", "Creating_Tables");

    let first = loader.load(&sheet).await.unwrap();
    let second = loader.load(&sheet).await.unwrap();

    assert_eq!(first.table, second.table);
    let ids: Vec<String> = (0..first.table.row_count())
        .map(|i| first.table.get(i, "Emp ID").unwrap().to_string())
        .collect();
    assert_eq!(ids, ["1075", "1080", "1002"]);
    assert_eq!(service.calls.connect.load(Ordering::SeqCst), 2);
    assert_eq!(service.calls.read.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn normalization_keeps_partially_empty_rows() {
    // 6 data rows, 2 of them fully empty
    let service = FakeService::with_sheet(
        "K",
        "Data",
        json!([
            ["A", "B", "C"],
            ["x", "", ""],
            ["", "", ""],
            ["", "y"],
            [],
            ["", "", "z"],
            [null, false, null],
        ]),
    );

    let table = loader(&service)
        .load(&SheetRef::new("K", "Data"))
        .await
        .unwrap()
        .table;

    assert_eq!(table.row_count(), 4);
    for row in table.rows() {
        assert_eq!(row.len(), 3);
        assert!(row.iter().any(|cell| !cell.is_empty()));
    }
    assert_eq!(table.get(3, "B"), Some(&CellValue::Bool(false)));
}

#[tokio::test]
async fn header_only_tab_yields_columns_without_rows() {
    let service = FakeService::with_sheet("K", "Empty", json!([["EmpID", "Name"]]));
    let table = loader(&service)
        .load(&SheetRef::new("K", "Empty"))
        .await
        .unwrap()
        .table;

    assert_eq!(table.column_count(), 2);
    assert_eq!(table.row_count(), 0);
}

#[tokio::test]
async fn picks_the_named_tab_among_several() {
    let mut service = staff_service();
    service.add_tab("ABC123", "Other", json!([["Code"], ["Z9"]]));

    let table = loader(&service)
        .load(&SheetRef::new("ABC123", "Other"))
        .await
        .unwrap()
        .table;

    assert_eq!(table.columns(), ["Code"]);
    assert_eq!(table.get(0, "Code"), Some(&CellValue::Text("Z9".into())));
}

#[tokio::test]
async fn concurrent_loads_run_independently() {
    let mut service = staff_service();
    service.add_tab("ABC123", "Other", json!([["Code"], ["Z9"]]));
    let loader = loader(&service);

    let first = SheetRef::new("ABC123", "Sheet1");
    let second = SheetRef::new("ABC123", "NoSuchTab");
    let (a, b) = tokio::join!(loader.load(&first), loader.load(&second));

    assert_eq!(a.unwrap().table.row_count(), 2);
    assert!(matches!(b, Err(LoadError::SubResourceNotFound { .. })));
    assert_eq!(service.calls.connect.load(Ordering::SeqCst), 2);
}
