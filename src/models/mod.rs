// Estructuras de datos principales

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::algorithm::conflict::{is_at_capacity, is_at_risk};
use crate::algorithm::parsing::{ScheduleCache, clock_to_minutes, parse_enrollment, parse_schedule};
use crate::error::SchedulerError;

/// Minutos en un día; cota superior (inclusiva) para `end_minute`.
pub const MINUTES_PER_DAY: u16 = 1440;

/// Mediodía en minutos. Una sección que parte a esta hora o después cuenta como "tarde".
pub const NOON_MINUTE: u16 = 720;

/// Día de la semana tal como aparece en los horarios ("M", "T", "W", "Th", "F", "S", "Su").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    M,
    T,
    W,
    Th,
    F,
    S,
    Su,
}

impl Day {
    pub fn code(self) -> &'static str {
        match self {
            Day::M => "M",
            Day::T => "T",
            Day::W => "W",
            Day::Th => "Th",
            Day::F => "F",
            Day::S => "S",
            Day::Su => "Su",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Horario semanal ya parseado: conjunto de días + rango `[start, end)` en minutos.
///
/// Sólo se construye a través de `parse_schedule` o `ParsedSchedule::new`, que
/// garantizan `start_minute < end_minute <= 1440`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ParsedSchedule {
    days: BTreeSet<Day>,
    start_minute: u16,
    end_minute: u16,
}

impl ParsedSchedule {
    pub fn new(days: BTreeSet<Day>, start_minute: u16, end_minute: u16) -> Option<Self> {
        if start_minute >= end_minute || end_minute > MINUTES_PER_DAY {
            return None;
        }
        Some(Self { days, start_minute, end_minute })
    }

    pub fn days(&self) -> &BTreeSet<Day> {
        &self.days
    }

    pub fn start_minute(&self) -> u16 {
        self.start_minute
    }

    pub fn end_minute(&self) -> u16 {
        self.end_minute
    }

    pub fn shares_day_with(&self, other: &ParsedSchedule) -> bool {
        // ambos sets son pequeños (<= 7); intersección directa
        self.days.iter().any(|d| other.days.contains(d))
    }

    /// Solapamiento estricto: rangos contiguos (`a.end == b.start`) no chocan.
    pub fn overlaps(&self, other: &ParsedSchedule) -> bool {
        self.shares_day_with(other)
            && self.start_minute < other.end_minute
            && other.start_minute < self.end_minute
    }
}

/// Inscritos / cupo extraídos del texto "current/capacity".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Enrollment {
    pub current: u32,
    pub capacity: u32,
}

/// Estado declarado de una sección. Se deriva desde la inscripción cuando
/// ésta se puede leer; la etiqueta original sólo se usa como respaldo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusTag {
    Ok,
    Full,
    AtRisk,
}

impl StatusTag {
    /// Interpreta etiquetas de los archivos de oferta ("OK", "open", "FULL", "AT-RISK", ...).
    pub fn from_label(label: &str) -> Self {
        let norm: String = label
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c })
            .collect();
        match norm.as_str() {
            "full" | "closed" => StatusTag::Full,
            "at_risk" | "atrisk" => StatusTag::AtRisk,
            _ => StatusTag::Ok,
        }
    }
}

/// Una sección (oferta concreta) de un ramo.
///
/// Inmutable: todos los campos son privados y el horario se parsea una sola vez
/// en el constructor, de modo que las ramas de la búsqueda pueden compartirla
/// sin riesgo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    group: u32,
    schedule: String,
    enrolled: String,
    status: String,
    status_tag: StatusTag,
    enrollment: Option<Enrollment>,
    #[serde(skip)]
    parsed: Option<ParsedSchedule>,
}

impl Section {
    pub fn new(
        group: u32,
        schedule: impl Into<String>,
        enrolled: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        let schedule = schedule.into();
        let enrolled = enrolled.into();
        let status = status.into();
        let parsed = parse_schedule(&schedule);
        Self::assemble(group, schedule, enrolled, status, parsed)
    }

    /// Igual que `new` pero con un horario ya parseado (p. ej. desde `ScheduleCache`).
    pub fn with_parsed(
        group: u32,
        schedule: impl Into<String>,
        enrolled: impl Into<String>,
        status: impl Into<String>,
        parsed: Option<ParsedSchedule>,
    ) -> Self {
        Self::assemble(group, schedule.into(), enrolled.into(), status.into(), parsed)
    }

    fn assemble(
        group: u32,
        schedule: String,
        enrolled: String,
        status: String,
        parsed: Option<ParsedSchedule>,
    ) -> Self {
        let enrollment = parse_enrollment(&enrolled);
        let mut section = Self {
            group,
            schedule,
            enrolled,
            status,
            status_tag: StatusTag::Ok,
            enrollment,
            parsed,
        };
        section.status_tag = match section.enrollment {
            Some(_) if is_at_capacity(&section) => StatusTag::Full,
            Some(_) if is_at_risk(&section) => StatusTag::AtRisk,
            Some(_) => StatusTag::Ok,
            None => StatusTag::from_label(&section.status),
        };
        section
    }

    pub fn group(&self) -> u32 {
        self.group
    }

    pub fn schedule(&self) -> &str {
        &self.schedule
    }

    pub fn enrolled(&self) -> &str {
        &self.enrolled
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn status_tag(&self) -> StatusTag {
        self.status_tag
    }

    pub fn enrollment(&self) -> Option<Enrollment> {
        self.enrollment
    }

    pub fn parsed(&self) -> Option<&ParsedSchedule> {
        self.parsed.as_ref()
    }
}

/// Forma serializable de una sección (archivos de problema, API).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRecord {
    pub group: u32,
    pub schedule: String,
    pub enrolled: String,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "open".to_string()
}

impl SectionRecord {
    pub fn into_section(self, cache: &mut ScheduleCache) -> Section {
        cache.section(self.group, &self.schedule, &self.enrolled, &self.status)
    }
}

impl From<&Section> for SectionRecord {
    fn from(s: &Section) -> Self {
        Self {
            group: s.group,
            schedule: s.schedule.clone(),
            enrolled: s.enrolled.clone(),
            status: s.status.clone(),
        }
    }
}

/// Restricciones de una invocación de búsqueda (sólo lectura durante la búsqueda).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraints {
    pub earliest_minute: u16,
    pub latest_minute: u16,
    pub allow_full: bool,
    pub allow_at_risk: bool,
    pub max_schedules: usize,
    pub max_full_per_schedule: usize,
}

impl Constraints {
    /// Construye restricciones a partir de horas "HH:MM" (24h).
    pub fn from_clock(
        earliest: &str,
        latest: &str,
        allow_full: bool,
        allow_at_risk: bool,
        max_schedules: usize,
        max_full_per_schedule: usize,
    ) -> Result<Self, SchedulerError> {
        let earliest_minute = clock_to_minutes(earliest)
            .ok_or_else(|| SchedulerError::InvalidClock(earliest.to_string()))?;
        let latest_minute = clock_to_minutes(latest)
            .ok_or_else(|| SchedulerError::InvalidClock(latest.to_string()))?;
        let constraints = Self {
            earliest_minute,
            latest_minute,
            allow_full,
            allow_at_risk,
            max_schedules,
            max_full_per_schedule,
        };
        constraints.validate()?;
        Ok(constraints)
    }

    /// Rechaza ventanas imposibles antes de iniciar la búsqueda.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.latest_minute > MINUTES_PER_DAY {
            return Err(SchedulerError::WindowOutOfRange(self.latest_minute));
        }
        if self.earliest_minute > self.latest_minute {
            return Err(SchedulerError::InvertedWindow {
                earliest: self.earliest_minute,
                latest: self.latest_minute,
            });
        }
        Ok(())
    }
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            earliest_minute: 8 * 60,
            latest_minute: 18 * 60,
            allow_full: false,
            allow_at_risk: true,
            max_schedules: 50,
            max_full_per_schedule: 0,
        }
    }
}

/// Metadatos descriptivos de un horario generado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduleMeta {
    pub full_count: usize,
    pub ends_by_preferred: bool,
    pub has_afternoon_or_later: bool,
    pub latest_end_minute: u16,
}

/// Un horario completo y sin conflictos: una sección por ramo, en el orden de los ramos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedSchedule {
    pub selections: Vec<Section>,
    pub parsed_selections: Vec<ParsedSchedule>,
    pub meta: ScheduleMeta,
}

/// Ramo con sus secciones candidatas, tal como lo entregan los cargadores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseOffering {
    pub code: String,
    pub name: Option<String>,
    pub sections: Vec<Section>,
}

impl CourseOffering {
    pub fn new(code: impl Into<String>, sections: Vec<Section>) -> Self {
        Self { code: code.into(), name: None, sections }
    }
}

/// Convierte ramos cargados a la lista ordenada de opciones que consume la búsqueda.
pub fn course_options(courses: &[CourseOffering]) -> Vec<Vec<Section>> {
    courses.iter().map(|c| c.sections.clone()).collect()
}
