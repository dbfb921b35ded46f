//! Reading and writing tables: CSV/TSV and spreadsheet workbooks.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use calamine::{Data, Reader, open_workbook_auto};
use thiserror::Error;

use orderflow_core::{DomainError, Table};

/// Table file read/write error.
#[derive(Debug, Error)]
pub enum TableIoError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read workbook {}: {source}", .path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("workbook {} has no worksheets", .path.display())]
    EmptyWorkbook { path: PathBuf },

    #[error("unsupported file type for {} (expected csv, tsv, xlsx, xlsm, xls, xlsb or ods)", .path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Input formats recognised by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Tsv,
    Workbook,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "tsv" | "tab" => Some(Self::Tsv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(Self::Workbook),
            _ => None,
        }
    }
}

/// Read a table from `path`, naming it `name` for error messages.
///
/// The first row is the header. Rows whose cells are all blank are skipped,
/// as spreadsheet-exported CSVs pad with them; such rows are not part of the
/// table, so they also never reach a rewritten channel feed.
/// Workbooks are read from their first worksheet.
pub fn read_table(path: &Path, name: &str) -> Result<Table, TableIoError> {
    let format = TableFormat::from_path(path).ok_or_else(|| TableIoError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;

    let table = match format {
        TableFormat::Csv => read_delimited(path, name, b',')?,
        TableFormat::Tsv => read_delimited(path, name, b'\t')?,
        TableFormat::Workbook => read_workbook(path, name)?,
    };

    tracing::debug!(
        path = %path.display(),
        table = name,
        rows = table.len(),
        columns = table.headers().len(),
        "read table"
    );
    Ok(table)
}

fn read_delimited(path: &Path, name: &str, delimiter: u8) -> Result<Table, TableIoError> {
    let content = read_file_as_utf8(path)?;
    parse_delimited(&content, name, delimiter).map_err(|err| match err {
        ParseError::Csv(source) => TableIoError::Csv {
            path: path.to_path_buf(),
            source,
        },
        ParseError::Domain(err) => TableIoError::Domain(err),
    })
}

enum ParseError {
    Csv(csv::Error),
    Domain(DomainError),
}

/// Parse delimited text into a table.
fn parse_delimited(content: &str, name: &str, delimiter: u8) -> Result<Table, ParseError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(ParseError::Csv)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(ParseError::Csv)?;
        let row: Vec<String> = record.iter().map(str::to_string).collect();
        if row.iter().any(|cell| !cell.trim().is_empty()) {
            rows.push(row);
        }
    }

    Table::new(name, headers, rows).map_err(ParseError::Domain)
}

/// Read a file as UTF-8, falling back to Windows-1252 (common for
/// spreadsheet-exported CSVs).
fn read_file_as_utf8(path: &Path) -> Result<String, TableIoError> {
    let bytes = fs::read(path).map_err(|source| TableIoError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn read_workbook(path: &Path, name: &str) -> Result<Table, TableIoError> {
    let workbook_err = |source| TableIoError::Workbook {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = open_workbook_auto(path).map_err(workbook_err)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| TableIoError::EmptyWorkbook {
            path: path.to_path_buf(),
        })?
        .map_err(workbook_err)?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()));

    let headers = rows.next().unwrap_or_default();
    Ok(Table::new(name, headers, rows.collect())?)
}

/// Render a workbook cell the way it would appear in a CSV export.
///
/// Whole floats render without a fraction so numeric SKUs (`12345.0`) match
/// their text form.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Write a table as CSV.
pub fn write_table<W: Write>(writer: W, table: &Table) -> Result<(), csv::Error> {
    let mut out = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    out.write_record(table.headers())?;
    for row in table.rows() {
        out.write_record(row.cells())?;
    }
    out.flush()?;
    Ok(())
}

/// Write `table` to `path` as CSV, replacing any existing file.
///
/// The data is written to a sibling temporary file first and renamed into
/// place, so readers never observe a half-written file.
pub fn write_table_file(path: &Path, table: &Table) -> Result<(), TableIoError> {
    write_file_atomically(path, |file| {
        write_table(file, table).map_err(|source| TableIoError::Csv {
            path: path.to_path_buf(),
            source,
        })
    })
}

pub(crate) fn write_file_atomically<F>(path: &Path, write: F) -> Result<(), TableIoError>
where
    F: FnOnce(&mut fs::File) -> Result<(), TableIoError>,
{
    let io_err = |source| TableIoError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    let mut file = fs::File::create(&tmp).map_err(io_err)?;
    write(&mut file)?;
    file.sync_all().map_err(io_err)?;
    drop(file);

    fs::rename(&tmp, path).map_err(io_err)
}
