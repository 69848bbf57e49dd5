// config.rs - Configuración: restricciones desde JSON y parámetros del servidor desde el entorno.
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::error::ConfigError;
use crate::models::Constraints;

/// Bloque `constraints` del archivo de configuración. Todos los campos son obligatorios.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintsFile {
    pub earliest_start: String,
    pub latest_end: String,
    pub allow_full: bool,
    #[serde(alias = "allowAt_risk")]
    pub allow_at_risk: bool,
    pub max_schedules: usize,
    pub max_full_per_schedule: usize,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    constraints: ConstraintsFile,
}

/// Parsea el contenido de un archivo de configuración.
pub fn parse_config(text: &str, path: &Path) -> Result<Constraints, ConfigError> {
    let file: ConfigFile = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let c = file.constraints;
    Constraints::from_clock(
        &c.earliest_start,
        &c.latest_end,
        c.allow_full,
        c.allow_at_risk,
        c.max_schedules,
        c.max_full_per_schedule,
    )
    .map_err(|source| ConfigError::Invalid { path: path.to_path_buf(), source })
}

/// Lee restricciones desde un archivo JSON:
///
/// ```json
/// { "constraints": { "earliestStart": "08:00", "latestEnd": "18:00",
///   "allowFull": false, "allowAtRisk": true,
///   "maxSchedules": 5, "maxFullPerSchedule": 1 } }
/// ```
pub fn load_config(path: &Path) -> Result<Constraints, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&text, path)
}

/// Sin archivo se usan los valores por defecto (08:00-18:00, sin llenas, 50 horarios).
pub fn load_config_with_defaults(path: Option<&Path>) -> Result<Constraints, ConfigError> {
    match path {
        Some(p) => load_config(p),
        None => Ok(Constraints::default()),
    }
}

pub const BIND_ENV: &str = "QUICKSLOT_BIND";
pub const MAX_SEARCHES_ENV: &str = "QUICKSLOT_MAX_CONCURRENT_SEARCHES";
pub const VERIFY_BUDGET_ENV: &str = "QUICKSLOT_VERIFY_BUDGET_MS";
pub const CONSTRAINTS_ENV: &str = "QUICKSLOT_CONSTRAINTS";
pub const SEARCH_TIMEOUT_ENV: &str = "QUICKSLOT_SEARCH_TIMEOUT_MS";

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_VERIFY_BUDGET_MS: u64 = 2_000;
pub const DEFAULT_SEARCH_TIMEOUT_MS: u64 = 30_000;

/// Parámetros del servidor HTTP.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    /// Búsquedas bloqueantes simultáneas (tamaño del semáforo).
    pub max_concurrent_searches: usize,
    pub verify_budget: Duration,
    /// Plazo de una petición a `/solve` (carga + búsqueda + verificación).
    pub search_timeout: Duration,
    /// Restricciones usadas cuando la petición no trae las suyas.
    pub default_constraints: Constraints,
    pub constraints_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            max_concurrent_searches: num_cpus::get().max(1),
            verify_budget: Duration::from_millis(DEFAULT_VERIFY_BUDGET_MS),
            search_timeout: Duration::from_millis(DEFAULT_SEARCH_TIMEOUT_MS),
            default_constraints: Constraints::default(),
            constraints_path: None,
        }
    }
}

fn env_number<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(var = name, value = %raw, "valor inválido, usando el valor por defecto");
            None
        }
    }
}

impl ServerConfig {
    /// Lee la configuración desde el entorno (cargar `.env` antes con `dotenv`).
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Ok(bind) = std::env::var(BIND_ENV) {
            if !bind.trim().is_empty() {
                cfg.bind = bind.trim().to_string();
            }
        }
        if let Some(n) = env_number::<usize>(MAX_SEARCHES_ENV) {
            cfg.max_concurrent_searches = n.max(1);
        }
        if let Some(ms) = env_number::<u64>(VERIFY_BUDGET_ENV) {
            cfg.verify_budget = Duration::from_millis(ms);
        }
        if let Some(ms) = env_number::<u64>(SEARCH_TIMEOUT_ENV) {
            cfg.search_timeout = Duration::from_millis(ms.max(1));
        }
        if let Ok(path) = std::env::var(CONSTRAINTS_ENV) {
            let path = PathBuf::from(path);
            cfg.default_constraints = load_config(&path)?;
            cfg.constraints_path = Some(path);
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_and_alias() {
        let text = r#"{"constraints": {"earliestStart": "09:30", "latestEnd": "17:00",
            "allowFull": true, "allowAt_risk": false, "maxSchedules": 5, "maxFullPerSchedule": 1}}"#;
        let c = parse_config(text, Path::new("c.json")).unwrap();
        assert_eq!(c.earliest_minute, 570);
        assert_eq!(c.latest_minute, 1020);
        assert!(c.allow_full);
        assert!(!c.allow_at_risk);
        assert_eq!(c.max_schedules, 5);
        assert_eq!(c.max_full_per_schedule, 1);
    }

    #[test]
    fn test_missing_field_is_parse_error() {
        let text = r#"{"constraints": {"earliestStart": "09:30", "latestEnd": "17:00"}}"#;
        assert!(matches!(parse_config(text, Path::new("c.json")), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_negative_count_is_rejected() {
        let text = r#"{"constraints": {"earliestStart": "09:30", "latestEnd": "17:00",
            "allowFull": true, "allowAtRisk": false, "maxSchedules": -1, "maxFullPerSchedule": 1}}"#;
        assert!(matches!(parse_config(text, Path::new("c.json")), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_bad_clock_is_invalid() {
        let text = r#"{"constraints": {"earliestStart": "9am", "latestEnd": "17:00",
            "allowFull": true, "allowAtRisk": false, "maxSchedules": 1, "maxFullPerSchedule": 1}}"#;
        assert!(matches!(parse_config(text, Path::new("c.json")), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_defaults() {
        let c = load_config_with_defaults(None).unwrap();
        assert_eq!(c, Constraints::default());
        assert_eq!(c.earliest_minute, 480);
        assert_eq!(c.latest_minute, 1080);
        assert!(!c.allow_full);
        assert!(c.allow_at_risk);
        assert_eq!(c.max_schedules, 50);
        assert_eq!(c.max_full_per_schedule, 0);
    }
}
