use std::time::{Duration, Instant};

use serde::Serialize;

/// Contadores de una invocación de búsqueda.
///
/// Se crea al inicio de `search`, se pasa explícitamente por la recursión y se
/// sella con `finish` al terminar. No hay estado global: dos búsquedas en hilos
/// distintos nunca comparten contadores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchStatistics {
    pub nodes_visited: u64,
    pub accepted: u64,
    pub pruned_by_conflict: u64,
    pub pruned_by_viability: u64,
    pub pruned_by_full_limit: u64,
    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,
    #[serde(skip)]
    started: Option<Instant>,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1000.0)
}

impl Default for SearchStatistics {
    fn default() -> Self {
        Self {
            nodes_visited: 0,
            accepted: 0,
            pruned_by_conflict: 0,
            pruned_by_viability: 0,
            pruned_by_full_limit: 0,
            duration: Duration::ZERO,
            started: None,
        }
    }
}

impl SearchStatistics {
    /// Contadores en cero con el reloj ya corriendo.
    pub fn start() -> Self {
        Self { started: Some(Instant::now()), ..Self::default() }
    }

    pub fn record_node(&mut self) {
        self.nodes_visited += 1;
    }

    pub fn record_accepted(&mut self) {
        self.accepted += 1;
    }

    pub fn record_conflict_prune(&mut self) {
        self.pruned_by_conflict += 1;
    }

    pub fn record_viability_prune(&mut self) {
        self.pruned_by_viability += 1;
    }

    pub fn record_full_limit_prune(&mut self) {
        self.pruned_by_full_limit += 1;
    }

    /// Detiene el reloj y guarda la duración total.
    pub fn finish(&mut self) {
        if let Some(started) = self.started.take() {
            self.duration = started.elapsed();
        }
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration.as_secs_f64() * 1000.0
    }

    /// Total de candidatos descartados por cualquier motivo.
    pub fn total_pruned(&self) -> u64 {
        self.pruned_by_conflict + self.pruned_by_viability + self.pruned_by_full_limit
    }

    /// Igualdad de contadores ignorando el tiempo medido.
    pub fn same_counts(&self, other: &SearchStatistics) -> bool {
        self.nodes_visited == other.nodes_visited
            && self.accepted == other.accepted
            && self.pruned_by_conflict == other.pruned_by_conflict
            && self.pruned_by_viability == other.pruned_by_viability
            && self.pruned_by_full_limit == other.pruned_by_full_limit
    }
}
