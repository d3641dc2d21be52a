// src/main.rs
use std::path::PathBuf;

use iced::alignment::Horizontal;
use iced::widget::{button, column, container, row, scrollable, text, text_input, Column, Row, Space};
use iced::{executor, window, Application, Command, Element, Length, Settings, Theme};
use rfd::FileDialog;
use tracing::warn;

use sheet_agent::{logging, settings, AppConfig, LoadError, LoadedTable, SheetLoader, SheetRef, Table};

mod ui;

use ui::{AccentButton, Panel, Styles};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const CELL_WIDTH: f32 = 140.0;
const SIDEBAR_WIDTH: f32 = 320.0;

pub fn main() -> iced::Result {
    logging::init(tracing::Level::INFO);
    if let Err(e) = settings::load_env_file(None) {
        warn!(error = %e, "Ignoring unreadable environment file");
    }

    let config = AppConfig::load(None).unwrap_or_else(|e| {
        warn!(error = %e, "Falling back to default configuration");
        AppConfig::default()
    });

    SheetViewer::run(Settings {
        window: window::Settings {
            size: (1200, 800),
            resizable: true,
            ..Default::default()
        },
        ..Settings::with_flags(config)
    })
}

#[derive(Debug, Clone, PartialEq)]
enum Status {
    Idle,
    Loading,
    Warning(String),
    Failed(String),
    Loaded,
}

struct SheetViewer {
    config: AppConfig,
    is_dark_mode: bool,
    sheet_key_input: String,
    worksheet_input: String,
    credentials_path: PathBuf,
    status: Status,
    last_data: Option<LoadedTable>,
}

#[derive(Debug, Clone)]
enum Message {
    SheetKeyChanged(String),
    WorksheetChanged(String),
    PickCredentials,
    CredentialsPicked(Option<PathBuf>),
    LoadData,
    DataLoaded(Result<LoadedTable, LoadError>),
    ToggleTheme,
}

impl Application for SheetViewer {
    type Executor = executor::Default;
    type Message = Message;
    type Theme = Theme;
    type Flags = AppConfig;

    fn new(config: AppConfig) -> (Self, Command<Message>) {
        (
            SheetViewer {
                sheet_key_input: config.sheet_key.clone(),
                worksheet_input: config.worksheet.clone(),
                credentials_path: config.loader.credentials_path.clone(),
                config,
                is_dark_mode: true,
                status: Status::Idle,
                last_data: None,
            },
            Command::none(),
        )
    }

    fn title(&self) -> String {
        format!("Google Sheets Data Loader v{}", VERSION)
    }

    fn theme(&self) -> Theme {
        if self.is_dark_mode {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::SheetKeyChanged(key) => {
                self.sheet_key_input = key;
                Command::none()
            }

            Message::WorksheetChanged(name) => {
                self.worksheet_input = name;
                Command::none()
            }

            Message::PickCredentials => Command::perform(
                async {
                    FileDialog::new()
                        .set_title("Select service account key")
                        .add_filter("JSON key", &["json"])
                        .pick_file()
                },
                Message::CredentialsPicked,
            ),

            Message::CredentialsPicked(path) => {
                if let Some(path) = path {
                    self.credentials_path = path;
                }
                Command::none()
            }

            Message::LoadData => {
                if self.status == Status::Loading {
                    return Command::none();
                }

                let key = self.sheet_key_input.trim();
                let worksheet = self.worksheet_input.trim();
                if key.is_empty() || worksheet.is_empty() {
                    self.status = Status::Warning(
                        "Please provide both a Sheet Key and a Worksheet Name.".to_string(),
                    );
                    return Command::none();
                }

                let sheet = SheetRef::new(key, worksheet);
                let mut loader_config = self.config.loader.clone();
                loader_config.credentials_path = self.credentials_path.clone();
                self.status = Status::Loading;

                Command::perform(
                    async move { SheetLoader::new(loader_config).load(&sheet).await },
                    Message::DataLoaded,
                )
            }

            Message::DataLoaded(result) => {
                match result {
                    Ok(data) => {
                        self.last_data = Some(data);
                        self.status = Status::Loaded;
                    }
                    Err(err) => {
                        self.last_data = None;
                        self.status = Status::Failed(err.report());
                    }
                }
                Command::none()
            }

            Message::ToggleTheme => {
                self.is_dark_mode = !self.is_dark_mode;
                Command::none()
            }
        }
    }

    fn view(&self) -> Element<'_, Message> {
        let styles = ui::styles(self.is_dark_mode);

        let mut main = Column::new()
            .push(text("📊 Google Sheets Data Loader").size(30))
            .push(
                text("This app connects to a Google Sheet using a service account and displays the data as a table.")
                    .size(16),
            );
        if let Some(banner) = self.banner(&styles) {
            main = main.push(banner);
        }
        let main = main
            .push(self.content(&styles))
            .spacing(12)
            .padding(20)
            .width(Length::Fill)
            .height(Length::Fill);

        let layout = row![self.sidebar(&styles), main];

        container(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .style(Panel::new(styles.bg, styles.fg).into_style())
            .into()
    }
}

impl SheetViewer {
    fn sidebar(&self, styles: &Styles) -> Element<'_, Message> {
        let loading = self.status == Status::Loading;

        let load_button = button(
            text(if loading { "Loading..." } else { "Load Data" })
                .horizontal_alignment(Horizontal::Center)
                .size(16),
        )
        .width(Length::Fill)
        .padding(10)
        .style(AccentButton::from_styles(styles).into_style());
        let load_button = if loading {
            load_button
        } else {
            load_button.on_press(Message::LoadData)
        };

        let how_to = container(
            text(
                "How to use:\n\
                 1. Enter the unique 'key' from your Google Sheet's URL.\n\
                 2. Enter the name of the specific tab (worksheet).\n\
                 3. Click 'Load Data'.",
            )
            .size(14),
        )
        .padding(10)
        .width(Length::Fill)
        .style(Panel::bordered(styles.sidebar_bg, styles.fg, styles.accent).into_style());

        let content = column![
            text("Connection Details").size(22),
            Space::with_height(Length::Fixed(10.0)),
            text("Enter Google Sheet Key").size(14),
            text_input("Google Sheet Key", &self.sheet_key_input)
                .on_input(Message::SheetKeyChanged)
                .on_submit(Message::LoadData)
                .padding(8),
            text("Enter Worksheet Name").size(14),
            text_input("Worksheet Name", &self.worksheet_input)
                .on_input(Message::WorksheetChanged)
                .on_submit(Message::LoadData)
                .padding(8),
            text("Service account key").size(14),
            text(self.credentials_path.display().to_string()).size(13),
            button(text("Choose file...").size(14))
                .on_press(Message::PickCredentials)
                .padding(6),
            Space::with_height(Length::Fixed(10.0)),
            load_button,
            Space::with_height(Length::Fill),
            how_to,
            row![
                text(format!("v{}", VERSION)).size(12),
                Space::with_width(Length::Fill),
                button(text("💡").size(16))
                    .on_press(Message::ToggleTheme)
                    .style(AccentButton::from_styles(styles).into_style()),
            ],
        ]
        .spacing(8)
        .padding(16);

        container(content)
            .width(Length::Fixed(SIDEBAR_WIDTH))
            .height(Length::Fill)
            .style(Panel::new(styles.sidebar_bg, styles.fg).into_style())
            .into()
    }

    fn banner(&self, styles: &Styles) -> Option<Element<'_, Message>> {
        let (message, bg) = match &self.status {
            Status::Idle => return None,
            Status::Loading => (
                "Connecting to Google Sheets and fetching data...".to_string(),
                styles.header_bg,
            ),
            Status::Warning(msg) => (msg.clone(), styles.warning_bg),
            Status::Failed(msg) => (msg.clone(), styles.error_bg),
            Status::Loaded => {
                let data = self.last_data.as_ref()?;
                (success_message(data), styles.success_bg)
            }
        };

        Some(
            container(text(message).size(16))
                .padding(12)
                .width(Length::Fill)
                .style(Panel::new(bg, styles.banner_fg).into_style())
                .into(),
        )
    }

    fn content(&self, styles: &Styles) -> Element<'_, Message> {
        match &self.last_data {
            Some(data) if self.status == Status::Loaded => column![
                text("Here is a preview of your data:").size(16),
                render_table(&data.table, styles),
            ]
            .spacing(8)
            .into(),
            _ => container(
                text("No data loaded. Enter a sheet key and worksheet name, then click 'Load Data'.")
                    .size(20)
                    .horizontal_alignment(Horizontal::Center),
            )
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x()
            .center_y()
            .into(),
        }
    }
}

fn success_message(data: &LoadedTable) -> String {
    let title = data
        .spreadsheet_title
        .as_deref()
        .unwrap_or(&data.source.spreadsheet_key);
    format!(
        "Data loaded successfully! {} rows × {} columns from '{}' / '{}' at {}",
        data.table.row_count(),
        data.table.column_count(),
        title,
        data.source.worksheet,
        data.fetched_at.format("%H:%M:%S"),
    )
}

fn render_table<'a>(table: &'a Table, styles: &Styles) -> Element<'a, Message> {
    let cell = |value: String, bg, fg| -> Element<'a, Message> {
        container(text(value).size(15))
            .width(Length::Fixed(CELL_WIDTH))
            .padding(5)
            .style(Panel::new(bg, fg).into_style())
            .into()
    };

    let headers = Row::with_children(
        table
            .columns()
            .iter()
            .map(|header| cell(header.clone(), styles.header_bg, styles.header_fg))
            .collect(),
    )
    .spacing(1);

    let rows: Vec<Element<'a, Message>> = table
        .rows()
        .iter()
        .map(|row| {
            Row::with_children(
                row.iter()
                    .map(|value| cell(value.to_string(), styles.bg, styles.fg))
                    .collect(),
            )
            .spacing(1)
            .into()
        })
        .collect();

    let body = Column::with_children(rows).spacing(1);

    let grid = container(column![headers, scrollable(body).height(Length::Fill)].spacing(1))
        .style(Panel::new(styles.grid, styles.fg).into_style());

    grid.into()
}
