use calamine::{Data, Reader, open_workbook_auto};
use std::path::Path;

use crate::datafiles::layout;
use crate::error::LoadError;
use crate::models::CourseOffering;

/// Texto de una celda tal como lo espera `layout` (grupos y cupos llegan como float).
pub fn cell_to_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => (*f as i64).to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Empty | Data::Error(_) => String::new(),
        Data::DateTime(d) => d.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

/// Lee una hoja completa como filas de texto. Sin `sheet` (o si no existe) usa
/// la primera hoja que tenga contenido.
pub fn read_sheet_rows(path: &Path, sheet: Option<&str>) -> Result<Vec<Vec<String>>, LoadError> {
    if !path.is_file() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let spreadsheet_err = |e: calamine::Error| LoadError::Spreadsheet {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let mut workbook = open_workbook_auto(path).map_err(spreadsheet_err)?;

    let names = workbook.sheet_names().to_owned();
    let mut ordered: Vec<String> = Vec::with_capacity(names.len());
    if let Some(wanted) = sheet {
        if let Some(found) = names.iter().find(|n| n.as_str() == wanted) {
            ordered.push(found.clone());
        }
    }
    ordered.extend(names.iter().filter(|n| Some(n.as_str()) != sheet).cloned());

    for name in ordered {
        let range = workbook.worksheet_range(&name).map_err(spreadsheet_err)?;
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|r| r.iter().map(cell_to_string).collect::<Vec<_>>())
            .filter(|r| r.iter().any(|c| !c.is_empty()))
            .collect();
        if !rows.is_empty() {
            tracing::debug!(sheet = %name, rows = rows.len(), "hoja leída");
            return Ok(rows);
        }
    }
    Err(LoadError::Empty(path.to_path_buf()))
}

/// Lee la oferta desde una planilla (.xlsx/.xls/.ods) con el mismo esquema
/// de columnas que los CSV.
pub fn load_workbook(path: &Path, sheet: Option<&str>) -> Result<Vec<CourseOffering>, LoadError> {
    let rows = read_sheet_rows(path, sheet)?;
    layout::courses_from_rows(path, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_to_string_numbers() {
        assert_eq!(cell_to_string(&Data::Float(101.0)), "101");
        assert_eq!(cell_to_string(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_to_string(&Data::Int(7)), "7");
        assert_eq!(cell_to_string(&Data::String("  MW 09:00 AM - 10:00 AM ".into())), "MW 09:00 AM - 10:00 AM");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }

    #[test]
    fn test_missing_workbook() {
        assert!(matches!(
            load_workbook(Path::new("/no/such/oferta.xlsx"), None),
            Err(LoadError::NotFound(_))
        ));
    }
}
