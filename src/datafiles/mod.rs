//! Módulo `datafiles`: carga de ofertas de ramos desde disco.
//!
//! Submódulos:
//! - `csv`: lector de CSV (campos entre comillas incluidos)
//! - `workbook`: planillas vía calamine
//! - `layout`: interpretación de filas (formato simple / real)
//! - `synthetic`: generador de problemas sintéticos y archivos de problema JSON

pub mod csv;
pub mod layout;
pub mod synthetic;
pub mod workbook;

pub use layout::{Layout, SimpleColumns};

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::LoadError;
use crate::models::CourseOffering;

/// Variable de entorno con el directorio de datos.
pub const DATAFILES_ENV: &str = "QUICKSLOT_DATAFILES_DIR";

/// Directorio por defecto, relativo al directorio de trabajo.
pub const DATAFILES_DIR: &str = "datafiles";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFormat {
    SimpleCsv,
    RealCsv,
    Spreadsheet,
    ProblemJson,
}

/// Resuelve el directorio de datafiles: primero `QUICKSLOT_DATAFILES_DIR`,
/// luego `./datafiles`.
pub fn datafiles_dir() -> PathBuf {
    if let Ok(path) = std::env::var(DATAFILES_ENV) {
        let p = PathBuf::from(path);
        if p.is_dir() {
            return p;
        }
        warn!(dir = %p.display(), "{} no es un directorio, usando ./{}", DATAFILES_ENV, DATAFILES_DIR);
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    cwd.join(DATAFILES_DIR)
}

fn is_spreadsheet_ext(ext: &str) -> bool {
    matches!(ext, "xlsx" | "xlsm" | "xlsb" | "xls" | "ods")
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// Detecta el formato por extensión y, para CSV, por encabezado.
pub fn detect_format(path: &Path) -> Result<DataFormat, LoadError> {
    let ext = extension(path);
    match ext.as_str() {
        "csv" => Ok(match csv::detect_csv_layout(path)? {
            Layout::Real => DataFormat::RealCsv,
            Layout::Simple => DataFormat::SimpleCsv,
        }),
        "json" => Ok(DataFormat::ProblemJson),
        e if is_spreadsheet_ext(e) => Ok(DataFormat::Spreadsheet),
        _ => Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Carga ramos desde cualquier formato soportado. El formato de un CSV se
/// decide sobre los mismos registros que se cargan.
pub fn load_courses(path: &Path) -> Result<Vec<CourseOffering>, LoadError> {
    let ext = extension(path);
    debug!(path = %path.display(), ext = %ext, "cargando oferta");
    let courses = match ext.as_str() {
        "csv" => csv::load_csv(path)?,
        "json" => synthetic::load_problem(path)?,
        e if is_spreadsheet_ext(e) => workbook::load_workbook(path, None)?,
        _ => return Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    };
    tracing::info!(
        path = %path.display(),
        courses = courses.len(),
        sections = courses.iter().map(|c| c.sections.len()).sum::<usize>(),
        "oferta cargada"
    );
    Ok(courses)
}

/// Resuelve un nombre de dataset dentro del directorio de datafiles.
/// Sólo se aceptan nombres simples (sin `..` ni rutas absolutas).
pub fn resolve_dataset(name: &str) -> Result<PathBuf, LoadError> {
    let candidate = Path::new(name);
    let plain = candidate
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if name.is_empty() || !plain {
        return Err(LoadError::NotFound(candidate.to_path_buf()));
    }
    let path = datafiles_dir().join(candidate);
    if path.is_file() {
        Ok(path)
    } else {
        Err(LoadError::NotFound(path))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DatafileEntry {
    pub name: String,
    pub format: Option<DataFormat>,
    pub size_bytes: u64,
}

/// Lista los archivos cargables del directorio, ordenados por nombre.
/// Ignora ocultos y temporales de editores (`.~x.xlsx`, `x~`).
pub fn list_datafiles_in(dir: &Path) -> Result<Vec<DatafileEntry>, LoadError> {
    let read = fs::read_dir(dir).map_err(|source| LoadError::Io { path: dir.to_path_buf(), source })?;
    let mut out = Vec::new();
    for entry in read.flatten() {
        let p = entry.path();
        if !p.is_file() {
            continue;
        }
        let Some(name) = p.file_name().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };
        if name.starts_with('.') || name.starts_with('~') || name.ends_with('~') {
            continue;
        }
        let ext = extension(&p);
        if ext != "csv" && ext != "json" && !is_spreadsheet_ext(&ext) {
            continue;
        }
        // un CSV ilegible igual se lista, sin formato
        let format = detect_format(&p).ok();
        let size_bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
        out.push(DatafileEntry { name, format, size_bytes });
    }
    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
}

pub fn list_datafiles() -> Result<Vec<DatafileEntry>, LoadError> {
    list_datafiles_in(&datafiles_dir())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_rejects_traversal() {
        assert!(resolve_dataset("../secret.csv").is_err());
        assert!(resolve_dataset("/etc/passwd").is_err());
        assert!(resolve_dataset("").is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            detect_format(Path::new("oferta.txt")),
            Err(LoadError::UnsupportedFormat(_))
        ));
        assert_eq!(detect_format(Path::new("p.json")).unwrap(), DataFormat::ProblemJson);
        assert_eq!(detect_format(Path::new("OA.XLSX")).unwrap(), DataFormat::Spreadsheet);
    }
}
