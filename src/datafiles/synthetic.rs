//! Generador de problemas sintéticos para pruebas de escala y benchmarks.
//!
//! Cada problema es una lista de ramos `COURSE_001..` con 2 a 5 secciones de
//! una hora (8 AM a 4 PM) sobre patrones de días fijos. Con la misma semilla
//! el resultado es idéntico en cualquier plataforma (`ChaCha8Rng`).

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::algorithm::conflict::{is_at_capacity, is_at_risk};
use crate::algorithm::parsing::{ScheduleCache, minutes_to_12h};
use crate::error::LoadError;
use crate::models::{CourseOffering, SectionRecord};

const DAY_PATTERNS: [&str; 5] = ["MW", "TTh", "MWF", "T", "Th"];
const CAPACITY: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemSize {
    Small,
    Medium,
    Large,
}

impl ProblemSize {
    pub fn course_count(self) -> usize {
        match self {
            ProblemSize::Small => 5,
            ProblemSize::Medium => 20,
            ProblemSize::Large => 50,
        }
    }

    fn label(self) -> &'static str {
        match self {
            ProblemSize::Small => "small",
            ProblemSize::Medium => "medium",
            ProblemSize::Large => "large",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tightness {
    /// 3 a 5 secciones por ramo.
    Loose,
    /// 2 secciones por ramo.
    Tight,
    /// 2 a 4 secciones por ramo.
    Mixed,
}

impl Tightness {
    /// Rango inclusivo de secciones por ramo.
    pub fn sections_range(self) -> (usize, usize) {
        match self {
            Tightness::Loose => (3, 5),
            Tightness::Tight => (2, 2),
            Tightness::Mixed => (2, 4),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Tightness::Loose => "loose",
            Tightness::Tight => "tight",
            Tightness::Mixed => "mixed",
        }
    }
}

/// Par (tamaño, holgura), escrito como `"small_loose"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProblemConfig {
    pub size: ProblemSize,
    pub tightness: Tightness,
}

impl ProblemConfig {
    pub fn new(size: ProblemSize, tightness: Tightness) -> Self {
        Self { size, tightness }
    }

    pub fn key(&self) -> String {
        format!("{}_{}", self.size.label(), self.tightness.label())
    }
}

impl fmt::Display for ProblemConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl FromStr for ProblemConfig {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LoadError::InvalidProblemSpec(s.to_string());
        let norm = s.trim().to_lowercase();
        let (size, tightness) = norm.split_once('_').ok_or_else(invalid)?;
        let size = match size {
            "small" => ProblemSize::Small,
            "medium" => ProblemSize::Medium,
            "large" => ProblemSize::Large,
            _ => return Err(invalid()),
        };
        let tightness = match tightness {
            "loose" => Tightness::Loose,
            "tight" => Tightness::Tight,
            "mixed" => Tightness::Mixed,
            _ => return Err(invalid()),
        };
        Ok(Self { size, tightness })
    }
}

impl TryFrom<String> for ProblemConfig {
    type Error = LoadError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProblemConfig> for String {
    fn from(value: ProblemConfig) -> Self {
        value.key()
    }
}

/// Problema generado junto con la semilla que lo reproduce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntheticProblem {
    pub seed: u64,
    pub config: ProblemConfig,
    pub courses: Vec<CourseOffering>,
}

/// Genera un problema. Sin semilla se usa una aleatoria (queda registrada en el resultado).
pub fn generate_problem(config: ProblemConfig, seed: Option<u64>) -> SyntheticProblem {
    let seed = seed.unwrap_or_else(|| rand::rng().random());
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut cache = ScheduleCache::new();
    let (min_sections, max_sections) = config.tightness.sections_range();

    let mut courses = Vec::with_capacity(config.size.course_count());
    for course_no in 1..=config.size.course_count() {
        let count = rng.random_range(min_sections..=max_sections);
        let mut sections = Vec::with_capacity(count);
        for group in 1..=count {
            let pattern = DAY_PATTERNS[rng.random_range(0..DAY_PATTERNS.len())];
            let start_hour: u16 = rng.random_range(8..=15);
            let schedule = format!(
                "{} {} - {}",
                pattern,
                minutes_to_12h(start_hour * 60),
                minutes_to_12h((start_hour + 1) * 60)
            );
            let current: u32 = rng.random_range(0..=CAPACITY);
            let enrolled = format!("{}/{}", current, CAPACITY);
            let status = if current == CAPACITY { "full" } else { "open" };
            sections.push(cache.section(group as u32, &schedule, &enrolled, status));
        }
        courses.push(CourseOffering::new(format!("COURSE_{:03}", course_no), sections));
    }

    info!(config = %config, seed, courses = courses.len(), "[synthetic] problema generado");
    SyntheticProblem { seed, config, courses }
}

/// Genera varios problemas; el i-ésimo usa `seed + i`.
pub fn generate_problem_batch(configs: &[ProblemConfig], seed: Option<u64>) -> Vec<SyntheticProblem> {
    let base = seed.unwrap_or_else(|| rand::rng().random_range(1..=1_000_000));
    configs
        .iter()
        .enumerate()
        .map(|(i, cfg)| generate_problem(*cfg, Some(base.wrapping_add(i as u64))))
        .collect()
}

/// Resumen de tamaño y composición de un problema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProblemStats {
    pub courses: usize,
    pub sections: usize,
    pub min_sections: usize,
    pub max_sections: usize,
    pub avg_sections: f64,
    pub full_sections: usize,
    pub at_risk_sections: usize,
    pub unparseable_schedules: usize,
    /// Producto de secciones por ramo (cota superior de combinaciones).
    pub combinations: f64,
}

pub fn problem_stats(courses: &[CourseOffering]) -> ProblemStats {
    let counts: Vec<usize> = courses.iter().map(|c| c.sections.len()).collect();
    let sections: usize = counts.iter().sum();
    let all = || courses.iter().flat_map(|c| c.sections.iter());
    ProblemStats {
        courses: courses.len(),
        sections,
        min_sections: counts.iter().copied().min().unwrap_or(0),
        max_sections: counts.iter().copied().max().unwrap_or(0),
        avg_sections: if courses.is_empty() { 0.0 } else { sections as f64 / courses.len() as f64 },
        full_sections: all().filter(|s| is_at_capacity(s)).count(),
        at_risk_sections: all().filter(|s| is_at_risk(s)).count(),
        unparseable_schedules: all().filter(|s| s.parsed().is_none()).count(),
        combinations: counts.iter().map(|&n| n as f64).product(),
    }
}

/// Problemas encontrados; vacío si el problema es válido.
pub fn validate_problem(courses: &[CourseOffering]) -> Vec<String> {
    let mut issues = Vec::new();
    if courses.is_empty() {
        issues.push("problem has no courses".to_string());
    }
    for course in courses {
        if course.sections.is_empty() {
            issues.push(format!("{}: no sections", course.code));
        }
        for s in &course.sections {
            if s.parsed().is_none() {
                issues.push(format!("{}: group {} has unparseable schedule '{}'", course.code, s.group(), s.schedule()));
            }
        }
    }
    issues
}

#[derive(Debug, Serialize, Deserialize)]
struct ProblemFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    config: Option<ProblemConfig>,
    courses: Vec<CourseRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CourseRecord {
    code: String,
    #[serde(default)]
    name: Option<String>,
    sections: Vec<SectionRecord>,
}

/// Guarda el problema como JSON.
pub fn save_problem(path: &Path, problem: &SyntheticProblem) -> Result<(), LoadError> {
    let file = ProblemFile {
        seed: Some(problem.seed),
        config: Some(problem.config),
        courses: problem
            .courses
            .iter()
            .map(|c| CourseRecord {
                code: c.code.clone(),
                name: c.name.clone(),
                sections: c.sections.iter().map(SectionRecord::from).collect(),
            })
            .collect(),
    };
    let json = serde_json::to_string_pretty(&file)?;
    fs::write(path, json).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })
}

/// Carga un problema guardado con `save_problem` (o escrito a mano con el mismo esquema).
pub fn load_problem(path: &Path) -> Result<Vec<CourseOffering>, LoadError> {
    if !path.is_file() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
    let file: ProblemFile = serde_json::from_str(&text)?;
    if file.courses.is_empty() {
        return Err(LoadError::NoSections(path.to_path_buf()));
    }
    let mut cache = ScheduleCache::new();
    Ok(file
        .courses
        .into_iter()
        .map(|c| {
            let sections = c.sections.into_iter().map(|s| s.into_section(&mut cache)).collect();
            CourseOffering { code: c.code, name: c.name, sections }
        })
        .collect())
}
