// Módulo de alto nivel para la generación de horarios
// Declarar submódulos (archivos en la carpeta `src/algorithm`)
pub mod backtrack;
pub mod conflict;
pub mod parsing;
pub mod stats;
pub mod trace;
pub mod verify;

// Reexportar sólo la API pública que usa el resto del crate
pub use backtrack::{SearchOutcome, build_schedule, search, search_cancellable, search_with_sink};
pub use conflict::{conflicts, is_at_capacity, is_at_risk, is_viable};
pub use parsing::{ScheduleCache, clock_to_minutes, minutes_to_clock, parse_clock_12h, parse_schedule};
pub use stats::SearchStatistics;
pub use trace::{NullSink, PruneReason, SearchTrace, TraceEvent, TraceSink};
pub use verify::{VerificationReport, VerificationStatus, verify_feasibility};
