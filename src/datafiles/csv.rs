// Lectura de archivos CSV de oferta.
use std::fs;
use std::path::Path;

use crate::datafiles::layout::{self, Layout, SimpleColumns};
use crate::error::LoadError;
use crate::models::CourseOffering;

/// Comilla abierta sin cerrar al terminar el archivo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnterminatedQuote {
    /// Línea física (desde 1) donde se abrió la comilla.
    pub line: usize,
}

/// Separa texto CSV en registros. Soporta campos entre comillas con comas,
/// saltos de línea y comillas dobladas (`""`). Las líneas vacías se descartan.
pub fn parse_records(text: &str) -> Result<Vec<Vec<String>>, UnterminatedQuote> {
    let text = text.trim_start_matches('\u{feff}');
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut quote_line = 0;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' {
            line += 1;
        }
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => {
                in_quotes = true;
                quote_line = line;
            }
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }
    if in_quotes {
        return Err(UnterminatedQuote { line: quote_line });
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    records.retain(|r| !r.iter().all(|f| f.trim().is_empty()));
    Ok(records)
}

/// Lee todos los registros de un CSV (encabezado incluido).
pub fn read_records(path: &Path) -> Result<Vec<Vec<String>>, LoadError> {
    if !path.is_file() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records = parse_records(&text).map_err(|e| LoadError::InvalidRow {
        path: path.to_path_buf(),
        row: e.line,
        message: "unterminated quoted field".into(),
    })?;
    if records.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }
    Ok(records)
}

/// Formato del CSV según su encabezado.
pub fn detect_csv_layout(path: &Path) -> Result<Layout, LoadError> {
    let records = read_records(path)?;
    Ok(layout::detect_layout(&records[0]))
}

/// CSV en formato simple con nombres de columna a elección.
pub fn load_simple_csv(path: &Path, columns: &SimpleColumns) -> Result<Vec<CourseOffering>, LoadError> {
    let records = read_records(path)?;
    layout::simple_courses(path, &records, columns)
}

/// CSV con detección automática de formato (una sola lectura del archivo).
pub fn load_csv(path: &Path) -> Result<Vec<CourseOffering>, LoadError> {
    let records = read_records(path)?;
    layout::courses_from_rows(path, &records)
}
