// src/csv_handler.rs
use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::{Writer, WriterBuilder};

use crate::data_types::Table;

pub struct CSVHandler {
    delimiter: u8,
}

impl Default for CSVHandler {
    fn default() -> Self {
        CSVHandler::new()
    }
}

impl CSVHandler {
    pub fn new() -> Self {
        CSVHandler { delimiter: b',' }
    }

    pub fn with_delimiter(delimiter: char) -> Self {
        CSVHandler {
            delimiter: delimiter as u8,
        }
    }

    /// Writes the header row followed by every data row.
    pub fn write_table<W: Write>(&self, table: &Table, writer: W) -> csv::Result<()> {
        if table.columns().is_empty() {
            return Ok(());
        }

        let mut csv_writer = self.writer(writer);
        csv_writer.write_record(table.columns())?;
        for row in table.rows() {
            csv_writer.write_record(row.iter().map(|cell| cell.to_string()))?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self, table: &Table) -> csv::Result<String> {
        let mut buffer = Vec::new();
        self.write_table(table, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    pub fn export<P: AsRef<Path>>(&self, table: &Table, path: P) -> csv::Result<()> {
        let file = File::create(path)?;
        self.write_table(table, file)
    }

    fn writer<W: Write>(&self, writer: W) -> Writer<W> {
        WriterBuilder::new()
            .delimiter(self.delimiter)
            .flexible(false)
            .from_writer(writer)
    }
}
