// Biblioteca raíz del crate `quickslot`.
// Generación de horarios sin topes por backtracking sobre las secciones de cada ramo.
pub mod algorithm;
pub mod api_json;
pub mod config;
pub mod datafiles;
pub mod error;
pub mod models;
pub mod report;
pub mod server;
pub mod server_handlers;

/// Ejecuta el servidor HTTP (reexport para facilitar uso desde `main`)
pub use server::run_server;

pub use algorithm::{SearchOutcome, search};
pub use error::{ConfigError, LoadError, RequestError, SchedulerError};
pub use models::{Constraints, CourseOffering, GeneratedSchedule, Section};
