use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use csv::Writer;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResultErrors {
    #[error("{0}")]
    Csv(#[from] csv::Error),
    #[error("entry '{name}' expected {expected} values, got {found}")]
    EntryLength {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("result entry {0} not found")]
    NotFound(usize),
    #[error("cannot register '{0}' after the first row has been written")]
    RegistrationClosed(String),
}

/// Handle to the columns a component registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResultId(usize);

#[derive(Debug)]
struct ResultEntry {
    name: String,
    offset: usize,
    len: usize,
}

/// A single result table. Components register column groups once, then
/// fill their slots every logged step. Columns appear in registration order.
pub struct ResultManager<W: Write = BufWriter<File>> {
    writer: Writer<W>,
    headers: Vec<String>,
    entries: Vec<ResultEntry>,
    row: Vec<String>,
    header_written: bool,
}

impl ResultManager<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, ResultErrors> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            // Ensure the directory exists
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        log::info!("writing results to '{}'", path.display());
        Ok(Self::from_writer(BufWriter::new(file)))
    }
}

impl<W: Write> ResultManager<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: Writer::from_writer(writer),
            headers: Vec::new(),
            entries: Vec::new(),
            row: Vec::new(),
            header_written: false,
        }
    }

    /// Registers a column group; each header is prefixed with `name`.
    pub fn new_entry(&mut self, name: &str, headers: &[&str]) -> Result<ResultId, ResultErrors> {
        if self.header_written {
            return Err(ResultErrors::RegistrationClosed(name.to_string()));
        }
        let id = ResultId(self.entries.len());
        self.entries.push(ResultEntry {
            name: name.to_string(),
            offset: self.headers.len(),
            len: headers.len(),
        });
        self.headers
            .extend(headers.iter().map(|header| format!("{name}_{header}")));
        self.row.resize(self.headers.len(), String::new());
        log::debug!("registered {} result columns for '{name}'", headers.len());
        Ok(id)
    }

    /// Fills the slots of entry `id` for the current row.
    pub fn write_record(&mut self, id: ResultId, content: &[String]) -> Result<(), ResultErrors> {
        let entry = self.entries.get(id.0).ok_or(ResultErrors::NotFound(id.0))?;
        if content.len() != entry.len {
            return Err(ResultErrors::EntryLength {
                name: entry.name.clone(),
                expected: entry.len,
                found: content.len(),
            });
        }
        self.row[entry.offset..entry.offset + entry.len].clone_from_slice(content);
        Ok(())
    }

    /// Writes the current row, preceded by the header row the first time.
    pub fn write_row(&mut self) -> Result<(), ResultErrors> {
        if !self.header_written {
            self.writer.write_record(&self.headers)?;
            self.header_written = true;
        }
        self.writer.write_record(&self.row)?;
        self.row.iter_mut().for_each(String::clear);
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), ResultErrors> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn into_inner(self) -> Result<W, ResultErrors> {
        self.writer
            .into_inner()
            .map_err(|e| ResultErrors::Io(e.into_error()))
    }
}

pub trait FfResult {
    /// Registers this component's columns with the result table
    fn new_result<W: Write>(&mut self, results: &mut ResultManager<W>) -> Result<(), ResultErrors>;
    // Fills this component's slots in the current row
    fn write_result<W: Write>(&self, results: &mut ResultManager<W>) -> Result<(), ResultErrors>;
}
