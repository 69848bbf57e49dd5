//! Traza opcional de decisiones de la búsqueda.
//!
//! La traza es un canal lateral: el motor llama al sink en los mismos puntos
//! esté o no habilitada, así que activarla no cambia ni el orden de poda ni
//! los contadores.

use std::fmt;

use serde::Serialize;

/// Motivo por el que se descartó un candidato.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PruneReason {
    Conflict,
    Viability,
    FullLimit,
}

impl fmt::Display for PruneReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PruneReason::Conflict => "CONFLICT",
            PruneReason::Viability => "VIABILITY",
            PruneReason::FullLimit => "FULL_LIMIT",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TraceEvent {
    Try {
        course: usize,
        group: u32,
        schedule: String,
    },
    Prune {
        reason: PruneReason,
        detail: String,
    },
    Accept {
        schedule_index: usize,
    },
    Exhausted {
        course: usize,
    },
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceEvent::Try { course, group, schedule } => {
                write!(f, "[TRY] Course {}: Group {} - {}", course, group, schedule)
            }
            TraceEvent::Prune { reason, detail } => write!(f, "[PRUNE] {}: {}", reason, detail),
            TraceEvent::Accept { schedule_index } => {
                write!(f, "[ACCEPT] Schedule {} found", schedule_index)
            }
            TraceEvent::Exhausted { course } => write!(f, "[EXHAUSTED] Course {}", course),
        }
    }
}

/// Receptor de eventos de traza.
pub trait TraceSink {
    fn record(&mut self, event: TraceEvent);

    /// Permite al motor evitar formatear detalles cuando nadie los va a leer.
    fn enabled(&self) -> bool {
        true
    }
}

/// Sink que descarta todo.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TraceSink for NullSink {
    fn record(&mut self, _event: TraceEvent) {}

    fn enabled(&self) -> bool {
        false
    }
}

/// Sink en memoria, en orden de emisión.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SearchTrace {
    events: Vec<TraceEvent>,
}

impl SearchTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Una línea por evento, útil para reconstruir el árbol a mano.
    pub fn lines(&self) -> Vec<String> {
        self.events.iter().map(|e| e.to_string()).collect()
    }

    pub fn render(&self) -> String {
        self.lines().join("\n")
    }
}

impl TraceSink for SearchTrace {
    fn record(&mut self, event: TraceEvent) {
        tracing::trace!(target: "quickslot::search", "{}", event);
        self.events.push(event);
    }
}
