use std::path::PathBuf;

/// Errores del motor. Sólo cubren restricciones mal formadas: los datos de
/// entrada defectuosos nunca abortan la búsqueda (se descartan candidatos).
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("invalid clock value '{0}', expected HH:MM (24h)")]
    InvalidClock(String),

    #[error("earliest minute {earliest} is after latest minute {latest}")]
    InvertedWindow { earliest: u16, latest: u16 },

    #[error("latest minute {0} is past the end of the day")]
    WindowOutOfRange(u16),
}

/// Errores de los cargadores de datos (CSV, planillas, problemas en JSON).
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("data file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("data file is empty: {0}")]
    Empty(PathBuf),

    #[error("missing required columns in {path}: {missing:?} (available: {available:?})")]
    MissingColumns {
        path: PathBuf,
        missing: Vec<String>,
        available: Vec<String>,
    },

    #[error("{path}, row {row}: {message}")]
    InvalidRow {
        path: PathBuf,
        row: usize,
        message: String,
    },

    #[error("no sections found in {0}")]
    NoSections(PathBuf),

    #[error("unsupported data file format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("spreadsheet error in {path}: {message}")]
    Spreadsheet { path: PathBuf, message: String },

    #[error("invalid problem JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid problem spec '{0}', expected <size>_<tightness> (e.g. small_loose)")]
    InvalidProblemSpec(String),
}

/// Errores al leer archivos de configuración de restricciones.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parsing error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid constraints in {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: SchedulerError,
    },
}

/// Errores de una petición a la API (problema mal especificado o imposible de cargar).
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("request must provide exactly one of 'courses', 'dataset' or 'generate'")]
    ProblemSource,

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("invalid constraints: {0}")]
    Constraints(#[from] SchedulerError),

    #[error("search exceeded the {0} ms time limit")]
    Timeout(u64),

    #[error("search was cancelled")]
    Cancelled,
}
