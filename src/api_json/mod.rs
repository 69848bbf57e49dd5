use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::algorithm::parsing::{ScheduleCache, clock_to_minutes, minutes_to_clock};
use crate::algorithm::stats::SearchStatistics;
use crate::algorithm::verify::VerificationReport;
use crate::datafiles::synthetic::ProblemConfig;
use crate::error::{RequestError, SchedulerError};
use crate::models::{Constraints, CourseOffering, GeneratedSchedule, ScheduleMeta, SectionRecord, StatusTag};

/// Parámetros de entrada de `POST /solve`
///
/// # Estructura del JSON esperado:
/// ```json
/// {
///   "courses": [
///     { "code": "MATH101", "sections": [
///       { "group": 1, "schedule": "MW 09:00 AM - 10:30 AM", "enrolled": "25/30", "status": "OK" }
///     ]}
///   ],
///   "constraints": { "earliestStart": "08:00", "latestEnd": "18:00", "maxSchedules": 10 },
///   "trace": false,
///   "verify": true
/// }
/// ```
///
/// # Campos:
/// - `courses`: ramos con sus secciones (en el orden en que se deben asignar)
/// - `dataset`: alternativa a `courses`, nombre de un archivo dentro del directorio de datafiles
/// - `generate`: alternativa a `courses`, problema sintético (`{"config": "small_loose", "seed": 42}`)
/// - `constraints`: opcional; cada campo ausente toma el valor por defecto del servidor
/// - `trace`: devuelve la traza de la búsqueda
/// - `verify`: corre además el verificador independiente
/// - `report`: agrega el resumen en texto plano (tablas ASCII)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolveRequest {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub courses: Vec<CourseInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate: Option<GenerateInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<ConstraintsInput>,
    #[serde(default)]
    pub trace: bool,
    #[serde(default)]
    pub verify: bool,
    #[serde(default)]
    pub report: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseInput {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub sections: Vec<SectionRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateInput {
    pub config: ProblemConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Restricciones parciales; lo ausente se completa con la base del servidor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintsInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earliest_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_full: Option<bool>,
    #[serde(default, alias = "allowAt_risk", skip_serializing_if = "Option::is_none")]
    pub allow_at_risk: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_schedules: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_full_per_schedule: Option<usize>,
}

impl ConstraintsInput {
    pub fn apply(&self, base: &Constraints) -> Result<Constraints, SchedulerError> {
        let clock = |text: &Option<String>, fallback: u16| match text {
            Some(t) => clock_to_minutes(t).ok_or_else(|| SchedulerError::InvalidClock(t.clone())),
            None => Ok(fallback),
        };
        let constraints = Constraints {
            earliest_minute: clock(&self.earliest_start, base.earliest_minute)?,
            latest_minute: clock(&self.latest_end, base.latest_minute)?,
            allow_full: self.allow_full.unwrap_or(base.allow_full),
            allow_at_risk: self.allow_at_risk.unwrap_or(base.allow_at_risk),
            max_schedules: self.max_schedules.unwrap_or(base.max_schedules),
            max_full_per_schedule: self.max_full_per_schedule.unwrap_or(base.max_full_per_schedule),
        };
        constraints.validate()?;
        Ok(constraints)
    }
}

/// De dónde sale el problema de una petición.
#[derive(Debug, Clone)]
pub enum ProblemSource {
    Inline(Vec<CourseInput>),
    Dataset(String),
    Generate(GenerateInput),
}

impl SolveRequest {
    /// Exactamente una fuente de problema.
    pub fn problem_source(&self) -> Result<ProblemSource, RequestError> {
        match (!self.courses.is_empty(), &self.dataset, &self.generate) {
            (true, None, None) => Ok(ProblemSource::Inline(self.courses.clone())),
            (false, Some(name), None) => Ok(ProblemSource::Dataset(name.clone())),
            (false, None, Some(g)) => Ok(ProblemSource::Generate(g.clone())),
            _ => Err(RequestError::ProblemSource),
        }
    }

    pub fn effective_constraints(&self, base: &Constraints) -> Result<Constraints, RequestError> {
        match &self.constraints {
            Some(input) => Ok(input.apply(base)?),
            None => Ok(base.clone()),
        }
    }
}

/// Ramos en línea -> `CourseOffering`, compartiendo una caché de parseo.
pub fn courses_from_input(inputs: Vec<CourseInput>) -> Vec<CourseOffering> {
    let mut cache = ScheduleCache::new();
    inputs
        .into_iter()
        .map(|c| CourseOffering {
            code: c.code,
            name: c.name,
            sections: c.sections.into_iter().map(|s| s.into_section(&mut cache)).collect(),
        })
        .collect()
}

pub fn parse_json_input(json_str: &str) -> Result<SolveRequest, serde_json::Error> {
    serde_json::from_str::<SolveRequest>(json_str)
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseSummary {
    pub code: String,
    pub name: Option<String>,
    pub sections: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConstraintsOutput {
    pub earliest_start: String,
    pub latest_end: String,
    #[serde(flatten)]
    pub raw: Constraints,
}

impl From<&Constraints> for ConstraintsOutput {
    fn from(c: &Constraints) -> Self {
        Self {
            earliest_start: minutes_to_clock(c.earliest_minute),
            latest_end: minutes_to_clock(c.latest_minute),
            raw: c.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectedSection {
    pub course: String,
    pub group: u32,
    pub schedule: String,
    pub enrolled: String,
    pub status: StatusTag,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleOutput {
    pub index: usize,
    pub sections: Vec<SelectedSection>,
    pub meta: ScheduleMeta,
}

impl ScheduleOutput {
    pub fn from_schedule(index: usize, schedule: &GeneratedSchedule, courses: &[CourseOffering]) -> Self {
        let sections = schedule
            .selections
            .iter()
            .zip(courses)
            .map(|(s, c)| SelectedSection {
                course: c.code.clone(),
                group: s.group(),
                schedule: s.schedule().to_string(),
                enrolled: s.enrolled().to_string(),
                status: s.status_tag(),
            })
            .collect();
        Self { index, sections, meta: schedule.meta }
    }
}

/// Respuesta de `/solve`.
#[derive(Debug, Clone, Serialize)]
pub struct SolveResponse {
    pub timestamp: DateTime<Utc>,
    pub courses: Vec<CourseSummary>,
    pub constraints: ConstraintsOutput,
    pub schedules_count: usize,
    pub schedules: Vec<ScheduleOutput>,
    pub stats: SearchStatistics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationReport>,
    /// `Some(true)` si búsqueda y verificador coinciden en factibilidad.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agreement: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inline_request() {
        let json = r#"{
            "courses": [{"code": "MATH101", "sections": [
                {"group": 1, "schedule": "MW 09:00 AM - 10:30 AM", "enrolled": "25/30", "status": "OK"},
                {"group": 2, "schedule": "TTh 09:00 AM - 10:30 AM", "enrolled": "30/30"}
            ]}],
            "constraints": {"latestEnd": "17:00", "allowAt_risk": false},
            "verify": true
        }"#;
        let req = parse_json_input(json).unwrap();
        assert!(req.verify);
        assert!(!req.trace);
        assert_eq!(req.courses[0].sections[1].status, "open");

        let c = req.effective_constraints(&Constraints::default()).unwrap();
        assert_eq!(c.latest_minute, 17 * 60);
        assert_eq!(c.earliest_minute, 8 * 60);
        assert!(!c.allow_at_risk);

        match req.problem_source().unwrap() {
            ProblemSource::Inline(courses) => {
                let offerings = courses_from_input(courses);
                assert_eq!(offerings[0].sections.len(), 2);
                assert_eq!(offerings[0].sections[1].status_tag(), StatusTag::Full);
            }
            other => panic!("unexpected source {:?}", other),
        }
    }

    #[test]
    fn test_problem_source_must_be_unique() {
        let none = SolveRequest::default();
        assert!(matches!(none.problem_source(), Err(RequestError::ProblemSource)));

        let both: SolveRequest =
            parse_json_input(r#"{"dataset": "a.csv", "generate": {"config": "small_tight"}}"#).unwrap();
        assert!(matches!(both.problem_source(), Err(RequestError::ProblemSource)));

        let generate: SolveRequest =
            parse_json_input(r#"{"generate": {"config": "small_tight", "seed": 9}}"#).unwrap();
        assert!(matches!(generate.problem_source(), Ok(ProblemSource::Generate(g)) if g.seed == Some(9)));
    }

    #[test]
    fn test_inverted_constraints_rejected() {
        let input = ConstraintsInput {
            earliest_start: Some("17:00".into()),
            latest_end: Some("09:00".into()),
            ..Default::default()
        };
        assert!(matches!(
            input.apply(&Constraints::default()),
            Err(SchedulerError::InvertedWindow { .. })
        ));
    }
}
