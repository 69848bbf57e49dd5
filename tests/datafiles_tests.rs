use std::fs;
use std::path::PathBuf;

use quickslot::algorithm::search;
use quickslot::datafiles::synthetic::{ProblemConfig, generate_problem, load_problem, save_problem};
use quickslot::datafiles::csv::load_simple_csv;
use quickslot::datafiles::workbook::{load_workbook, read_sheet_rows};
use quickslot::datafiles::{DataFormat, SimpleColumns, detect_format, list_datafiles_in, load_courses};
use quickslot::error::LoadError;
use quickslot::models::{Constraints, course_options};

fn sample(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("datafiles").join(name)
}

/// Directorio temporal propio de cada test (se limpia al inicio).
fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("quickslot-{}-{}", test, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

#[test]
fn test_sample_simple_csv_end_to_end() {
    let path = sample("sample_simple.csv");
    assert_eq!(detect_format(&path).expect("detect"), DataFormat::SimpleCsv);
    let courses = load_courses(&path).expect("load sample_simple.csv");
    let codes: Vec<&str> = courses.iter().map(|c| c.code.as_str()).collect();
    assert_eq!(codes, vec!["1", "2", "3"]);
    assert_eq!(courses[0].sections.len(), 3);
    // campo entre comillas
    assert_eq!(courses[2].sections[1].schedule(), "MWF 08:00 AM - 08:50 AM");

    let out = search(&course_options(&courses), &Constraints::default(), false).expect("search");
    let groups: Vec<Vec<u32>> = out
        .results
        .iter()
        .map(|r| r.selections.iter().map(|s| s.group()).collect())
        .collect();
    assert_eq!(
        groups,
        vec![vec![101, 201, 301], vec![101, 202, 301], vec![103, 201, 301], vec![103, 202, 301]]
    );
    assert_eq!(out.stats.pruned_by_viability, 2);
}

#[test]
fn test_sample_real_csv() {
    let path = sample("sample_real.csv");
    assert_eq!(detect_format(&path).expect("detect"), DataFormat::RealCsv);
    let courses = load_courses(&path).expect("load sample_real.csv");
    let codes: Vec<&str> = courses.iter().map(|c| c.code.as_str()).collect();
    assert_eq!(codes, vec!["ACC 2101", "CIS 3100", "ENG 2100"]);
    assert_eq!(courses[1].name.as_deref(), Some("Programming, Intro"));
    assert_eq!(courses[1].sections[1].status(), "full");
    assert_eq!(courses[1].sections[0].status(), "open");
}

#[test]
fn test_sample_offer_xlsx() {
    let path = sample("sample_offer.xlsx");
    assert_eq!(detect_format(&path).expect("detect"), DataFormat::Spreadsheet);

    // la primera hoja ("Portada") está vacía: se usa "Oferta"
    let courses = load_courses(&path).expect("load sample_offer.xlsx");
    let codes: Vec<&str> = courses.iter().map(|c| c.code.as_str()).collect();
    assert_eq!(codes, vec!["CIS 3100", "MAT 2200"]);
    assert_eq!(courses[0].name.as_deref(), Some("Programming, Intro"));
    // grupos numéricos en la planilla
    let groups: Vec<u32> = courses[1].sections.iter().map(|s| s.group()).collect();
    assert_eq!(groups, vec![1, 2, 3]);
    assert_eq!(courses[1].sections[0].schedule(), "MW 10:30 AM - 12:00 PM");
    assert_eq!(courses[1].sections[2].status(), "full");
    assert_eq!(load_workbook(&path, Some("Oferta")).expect("named sheet"), courses);

    let rows = read_sheet_rows(&path, Some("Oferta")).expect("rows");
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[0][0], "Course Code");
    assert_eq!(rows[1][2], "1");
    // hoja inexistente: se cae a la primera con contenido
    assert_eq!(read_sheet_rows(&path, Some("Nope")).expect("fallback"), rows);
}

#[test]
fn test_broken_workbook_is_spreadsheet_error() {
    let dir = scratch_dir("broken-xlsx");
    let path = dir.join("broken.xlsx");
    fs::write(&path, "not a zip").expect("write");
    assert!(matches!(load_courses(&path).unwrap_err(), LoadError::Spreadsheet { .. }));
}

#[test]
fn test_missing_file_and_bad_extension() {
    let dir = scratch_dir("missing");
    let err = load_courses(&dir.join("nope.csv")).unwrap_err();
    assert!(matches!(err, LoadError::NotFound(_)), "got {:?}", err);

    let txt = dir.join("notes.txt");
    fs::write(&txt, "hello").expect("write");
    assert!(matches!(load_courses(&txt).unwrap_err(), LoadError::UnsupportedFormat(_)));
}

#[test]
fn test_csv_errors() {
    let dir = scratch_dir("csv-errors");

    let empty = dir.join("empty.csv");
    fs::write(&empty, "").expect("write");
    assert!(matches!(load_courses(&empty).unwrap_err(), LoadError::Empty(_)));

    let missing_cols = dir.join("cols.csv");
    fs::write(&missing_cols, "group,schedule\n101,MW 09:00 AM - 10:00 AM\n").expect("write");
    match load_courses(&missing_cols).unwrap_err() {
        LoadError::MissingColumns { missing, .. } => assert!(missing.contains(&"enrolled".to_string())),
        other => panic!("unexpected error {:?}", other),
    }

    let bad_group = dir.join("group.csv");
    fs::write(&bad_group, "group,schedule,enrolled,status\nabc,MW 09:00 AM - 10:00 AM,1/30,OK\n").expect("write");
    match load_courses(&bad_group).unwrap_err() {
        LoadError::InvalidRow { row, .. } => assert_eq!(row, 2),
        other => panic!("unexpected error {:?}", other),
    }

    let header_only = dir.join("header.csv");
    fs::write(&header_only, "group,schedule,enrolled,status\n\n").expect("write");
    assert!(matches!(load_courses(&header_only).unwrap_err(), LoadError::NoSections(_)));
}

#[test]
fn test_unterminated_quote_is_rejected() {
    let dir = scratch_dir("quote");
    let path = dir.join("quote.csv");
    fs::write(
        &path,
        "group,schedule,enrolled,status\n101,MW 09:00 AM - 10:00 AM,1/30,OK\n102,\"TTh 09:00 AM - 10:00 AM,1/30,OK\n",
    )
    .expect("write");
    match load_courses(&path).unwrap_err() {
        LoadError::InvalidRow { row, message, .. } => {
            assert_eq!(row, 3);
            assert!(message.contains("unterminated"));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(detect_format(&path).is_err());
}

#[test]
fn test_simple_csv_with_custom_columns() {
    let dir = scratch_dir("columns");
    let path = dir.join("oferta.csv");
    fs::write(&path, "seccion,horario,inscritos,estado\n101,MW 09:00 AM - 10:00 AM,1/30,OK\n").expect("write");
    let columns = SimpleColumns {
        group: "seccion".into(),
        schedule: "horario".into(),
        enrolled: "inscritos".into(),
        status: "estado".into(),
    };
    let courses = load_simple_csv(&path, &columns).expect("load with custom columns");
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0].sections[0].group(), 101);
    // con los nombres por defecto faltan columnas
    assert!(matches!(load_courses(&path).unwrap_err(), LoadError::MissingColumns { .. }));
}

#[test]
fn test_unparseable_schedule_is_loaded_but_not_viable() {
    let dir = scratch_dir("tba");
    let path = dir.join("tba.csv");
    fs::write(
        &path,
        "group,schedule,enrolled,status\n101,TBA,5/30,OK\n102,MW 09:00 AM - 10:00 AM,5/30,OK\n",
    )
    .expect("write");
    let courses = load_courses(&path).expect("load");
    assert_eq!(courses[0].sections.len(), 2);
    let out = search(&course_options(&courses), &Constraints::default(), false).expect("search");
    assert_eq!(out.results.len(), 1);
    assert_eq!(out.stats.pruned_by_viability, 1);
}

#[test]
fn test_saved_problem_loads_back() {
    let dir = scratch_dir("problem");
    let problem = generate_problem("small_tight".parse::<ProblemConfig>().expect("config"), Some(11));
    let path = dir.join("small_tight.json");
    save_problem(&path, &problem).expect("save");

    assert_eq!(detect_format(&path).expect("detect"), DataFormat::ProblemJson);
    let loaded = load_problem(&path).expect("load");
    assert_eq!(loaded, problem.courses);
    assert_eq!(load_courses(&path).expect("load via dispatcher"), problem.courses);
}

#[test]
fn test_list_datafiles_in() {
    let dir = scratch_dir("listing");
    fs::write(dir.join("b.csv"), "group,schedule,enrolled,status\n101,MW 09:00 AM - 10:00 AM,1/30,OK\n").expect("write");
    fs::write(dir.join("a.csv"), "Course Code,Course Name,Group,Schedule,Enrolled\n").expect("write");
    fs::write(dir.join(".hidden.csv"), "x").expect("write");
    fs::write(dir.join("~lock.xlsx"), "x").expect("write");
    fs::write(dir.join("readme.md"), "x").expect("write");

    let entries = list_datafiles_in(&dir).expect("list");
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["a.csv", "b.csv"]);
    assert_eq!(entries[0].format, Some(DataFormat::RealCsv));
    assert_eq!(entries[1].format, Some(DataFormat::SimpleCsv));
    assert!(entries[1].size_bytes > 0);

    assert!(matches!(list_datafiles_in(&dir.join("nope")).unwrap_err(), LoadError::Io { .. }));
}

#[test]
fn test_bundled_datafiles_are_listed() {
    let entries = list_datafiles_in(&sample("")).expect("list bundled");
    assert!(entries.iter().any(|e| e.name == "sample_simple.csv"));
    assert!(entries.iter().any(|e| e.name == "sample_real.csv"));
    let xlsx = entries.iter().find(|e| e.name == "sample_offer.xlsx").expect("xlsx listed");
    assert_eq!(xlsx.format, Some(DataFormat::Spreadsheet));
}
