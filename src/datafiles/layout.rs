// Interpretación de filas ya leídas (CSV o planilla) como ramos + secciones.
//
// Dos formatos de oferta:
// - simple: group, schedule, enrolled, status   (ramo = group / 100)
// - real:   Course Code, Course Name, Group, Schedule, Enrolled   (ramo = código)

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use strsim::jaro_winkler;
use tracing::debug;

use crate::algorithm::parsing::ScheduleCache;
use crate::error::LoadError;
use crate::models::{CourseOffering, Section};

/// Similitud mínima para aceptar un encabezado aproximado.
const HEADER_SIMILARITY: f64 = 0.92;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    Simple,
    Real,
}

/// Nombres de columna del formato simple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleColumns {
    pub group: String,
    pub schedule: String,
    pub enrolled: String,
    pub status: String,
}

impl Default for SimpleColumns {
    fn default() -> Self {
        Self {
            group: "group".to_string(),
            schedule: "schedule".to_string(),
            enrolled: "enrolled".to_string(),
            status: "status".to_string(),
        }
    }
}

const REAL_COLUMNS: [&str; 5] = ["Course Code", "Course Name", "Group", "Schedule", "Enrolled"];

/// Normaliza encabezados eliminando espacios/guiones bajos y pasando a minúsculas.
pub fn normalize_header(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .collect()
}

/// Busca la columna `wanted`: primero por nombre normalizado exacto, luego por
/// Jaro-Winkler (la mejor sobre el umbral).
pub fn find_column(headers: &[String], wanted: &str) -> Option<usize> {
    let target = normalize_header(wanted);
    if let Some(idx) = headers.iter().position(|h| normalize_header(h) == target) {
        return Some(idx);
    }
    let mut best: Option<(usize, f64)> = None;
    for (idx, h) in headers.iter().enumerate() {
        let score = jaro_winkler(&normalize_header(h), &target);
        if score >= HEADER_SIMILARITY && best.is_none_or(|(_, s)| score > s) {
            best = Some((idx, score));
        }
    }
    if let Some((idx, score)) = best {
        debug!(wanted, found = %headers[idx], score, "encabezado aproximado");
    }
    best.map(|(idx, _)| idx)
}

/// Formato según encabezados: una columna "Course Code" implica el formato real.
pub fn detect_layout(headers: &[String]) -> Layout {
    if headers.iter().any(|h| normalize_header(h) == "coursecode") {
        Layout::Real
    } else {
        Layout::Simple
    }
}

fn resolve_columns(
    path: &Path,
    headers: &[String],
    wanted: &[&str],
) -> Result<Vec<usize>, LoadError> {
    let mut found = Vec::with_capacity(wanted.len());
    let mut missing = Vec::new();
    for w in wanted {
        match find_column(headers, w) {
            Some(idx) => found.push(idx),
            None => missing.push(w.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns {
            path: path.to_path_buf(),
            missing,
            available: headers.to_vec(),
        });
    }
    Ok(found)
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|s| s.trim()).unwrap_or("")
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

fn parse_group(path: &Path, row_no: usize, raw: &str, column: &str) -> Result<u32, LoadError> {
    raw.parse::<u32>().map_err(|_| LoadError::InvalidRow {
        path: path.to_path_buf(),
        row: row_no,
        message: format!("column '{}' must contain integers, got '{}'", column, raw),
    })
}

/// Formato simple. `rows[0]` es el encabezado; los ramos salen ordenados por
/// `group / 100` y las secciones en orden de aparición.
pub fn simple_courses(
    path: &Path,
    rows: &[Vec<String>],
    columns: &SimpleColumns,
) -> Result<Vec<CourseOffering>, LoadError> {
    let (headers, body) = rows.split_first().ok_or_else(|| LoadError::Empty(path.to_path_buf()))?;
    let idx = resolve_columns(
        path,
        headers,
        &[&columns.group, &columns.schedule, &columns.enrolled, &columns.status],
    )?;

    let mut cache = ScheduleCache::new();
    let mut by_course: BTreeMap<u32, Vec<Section>> = BTreeMap::new();
    for (i, row) in body.iter().enumerate() {
        if is_blank(row) {
            continue;
        }
        // fila 1 = encabezado
        let row_no = i + 2;
        let group = parse_group(path, row_no, cell(row, idx[0]), &columns.group)?;
        let schedule = cell(row, idx[1]);
        let enrolled = cell(row, idx[2]);
        let status = cell(row, idx[3]);
        if schedule.is_empty() || enrolled.is_empty() || status.is_empty() {
            return Err(LoadError::InvalidRow {
                path: path.to_path_buf(),
                row: row_no,
                message: "schedule, enrolled and status must not be empty".to_string(),
            });
        }
        by_course
            .entry(group / 100)
            .or_default()
            .push(cache.section(group, schedule, enrolled, status));
    }

    if by_course.is_empty() {
        return Err(LoadError::NoSections(path.to_path_buf()));
    }
    let (hits, misses, _) = cache.stats();
    debug!(courses = by_course.len(), hits, misses, "formato simple cargado");
    Ok(by_course
        .into_iter()
        .map(|(id, sections)| CourseOffering::new(id.to_string(), sections))
        .collect())
}

/// Formato real. El estado se infiere: "full" si `current == total`, si no "open".
pub fn real_courses(path: &Path, rows: &[Vec<String>]) -> Result<Vec<CourseOffering>, LoadError> {
    let (headers, body) = rows.split_first().ok_or_else(|| LoadError::Empty(path.to_path_buf()))?;
    let idx = resolve_columns(path, headers, &REAL_COLUMNS)?;

    let mut cache = ScheduleCache::new();
    let mut by_code: BTreeMap<String, CourseOffering> = BTreeMap::new();
    for (i, row) in body.iter().enumerate() {
        if is_blank(row) {
            continue;
        }
        let row_no = i + 2;
        let code = cell(row, idx[0]);
        let name = cell(row, idx[1]);
        let group = parse_group(path, row_no, cell(row, idx[2]), "Group")?;
        let schedule = cell(row, idx[3]);
        let enrolled = cell(row, idx[4]);
        if schedule.is_empty() || enrolled.is_empty() {
            return Err(LoadError::InvalidRow {
                path: path.to_path_buf(),
                row: row_no,
                message: "Schedule and Enrolled must not be empty".to_string(),
            });
        }
        let (current, total) = split_enrolled(enrolled).ok_or_else(|| LoadError::InvalidRow {
            path: path.to_path_buf(),
            row: row_no,
            message: format!("invalid Enrolled '{}', expected current/total (e.g. 25/30)", enrolled),
        })?;
        let status = if current == total { "full" } else { "open" };

        let course = by_code.entry(code.to_string()).or_insert_with(|| {
            let mut c = CourseOffering::new(code, Vec::new());
            c.name = (!name.is_empty()).then(|| name.to_string());
            c
        });
        course.sections.push(cache.section(group, schedule, enrolled, status));
    }

    if by_code.is_empty() {
        return Err(LoadError::NoSections(path.to_path_buf()));
    }
    debug!(courses = by_code.len(), "formato real cargado");
    Ok(by_code.into_values().collect())
}

fn split_enrolled(text: &str) -> Option<(u32, u32)> {
    let (current, total) = text.split_once('/')?;
    Some((current.trim().parse().ok()?, total.trim().parse().ok()?))
}

/// Interpreta filas según el formato detectado en su encabezado.
pub fn courses_from_rows(path: &Path, rows: &[Vec<String>]) -> Result<Vec<CourseOffering>, LoadError> {
    let headers = rows.first().ok_or_else(|| LoadError::Empty(path.to_path_buf()))?;
    match detect_layout(headers) {
        Layout::Real => real_courses(path, rows),
        Layout::Simple => simple_courses(path, rows, &SimpleColumns::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(lines: &[&[&str]]) -> Vec<Vec<String>> {
        lines.iter().map(|l| l.iter().map(|s| s.to_string()).collect()).collect()
    }

    #[test]
    fn test_find_column_exact_and_fuzzy() {
        let headers: Vec<String> = vec!["Course_Code".into(), "Grup".into(), "Schedule ".into()];
        assert_eq!(find_column(&headers, "Course Code"), Some(0));
        assert_eq!(find_column(&headers, "schedule"), Some(2));
        assert_eq!(find_column(&headers, "status"), None);
    }

    #[test]
    fn test_simple_groups_by_hundreds() {
        let data = rows(&[
            &["group", "schedule", "enrolled", "status"],
            &["201", "TTh 09:00 AM - 10:30 AM", "10/30", "OK"],
            &["101", "MW 09:00 AM - 10:30 AM", "25/30", "OK"],
            &["102", "MW 11:00 AM - 12:30 PM", "30/30", "FULL"],
        ]);
        let courses = simple_courses(Path::new("t.csv"), &data, &SimpleColumns::default()).unwrap();
        assert_eq!(courses.len(), 2);
        assert_eq!(courses[0].code, "1");
        assert_eq!(courses[0].sections.len(), 2);
        assert_eq!(courses[1].sections[0].group(), 201);
    }

    #[test]
    fn test_simple_rejects_bad_group() {
        let data = rows(&[
            &["group", "schedule", "enrolled", "status"],
            &["abc", "MW 09:00 AM - 10:30 AM", "25/30", "OK"],
        ]);
        let err = simple_courses(Path::new("t.csv"), &data, &SimpleColumns::default()).unwrap_err();
        assert!(matches!(err, LoadError::InvalidRow { row: 2, .. }));
    }

    #[test]
    fn test_real_infers_status() {
        let data = rows(&[
            &["Course Code", "Course Name", "Group", "Schedule", "Enrolled"],
            &["CIS 3100", "Programming", "1", "MW 09:00 AM - 10:30 AM", "30/30"],
            &["CIS 3100", "Programming", "2", "TTh 09:00 AM - 10:30 AM", "12/30"],
            &["ACC 2101", "Accounting", "1", "F 09:00 AM - 12:00 PM", "5/40"],
        ]);
        assert_eq!(detect_layout(&data[0]), Layout::Real);
        let courses = real_courses(Path::new("t.csv"), &data).unwrap();
        assert_eq!(courses[0].code, "ACC 2101");
        assert_eq!(courses[1].name.as_deref(), Some("Programming"));
        assert_eq!(courses[1].sections[0].status(), "full");
        assert_eq!(courses[1].sections[1].status(), "open");
    }

    #[test]
    fn test_real_rejects_bad_enrolled() {
        let data = rows(&[
            &["Course Code", "Course Name", "Group", "Schedule", "Enrolled"],
            &["CIS 3100", "Programming", "1", "MW 09:00 AM - 10:30 AM", "lots"],
        ]);
        assert!(matches!(
            real_courses(Path::new("t.csv"), &data),
            Err(LoadError::InvalidRow { .. })
        ));
    }

    #[test]
    fn test_missing_columns_lists_available() {
        let data = rows(&[&["group", "schedule"], &["101", "MW 09:00 AM - 10:30 AM"]]);
        match simple_courses(Path::new("t.csv"), &data, &SimpleColumns::default()) {
            Err(LoadError::MissingColumns { missing, available, .. }) => {
                assert_eq!(missing, vec!["enrolled".to_string(), "status".to_string()]);
                assert_eq!(available.len(), 2);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
