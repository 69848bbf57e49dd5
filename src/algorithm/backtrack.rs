// backtrack.rs - Búsqueda exhaustiva (backtracking) de horarios sin conflictos.
//
// Estados: índice de ramo `index` en [0, n]; ramos 0..index-1 ya tienen sección,
// el ramo `index` está pendiente. `index == n` es un candidato completo.
//
// Orden de los resultados: lexicográfico según el orden de las secciones dentro
// de cada ramo (ya filtradas) y el orden de los ramos que entrega quien llama.
// No hay aleatoriedad ni reordenamiento.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::algorithm::conflict::{conflicts, is_at_capacity, is_viable};
use crate::algorithm::stats::SearchStatistics;
use crate::algorithm::trace::{NullSink, PruneReason, SearchTrace, TraceEvent, TraceSink};
use crate::error::SchedulerError;
use crate::models::{Constraints, GeneratedSchedule, NOON_MINUTE, ScheduleMeta, Section};

/// Resultado de una invocación de `search`.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub results: Vec<GeneratedSchedule>,
    pub stats: SearchStatistics,
    pub trace: Option<SearchTrace>,
    /// La búsqueda se detuvo por una señal externa; `results` es un prefijo.
    pub cancelled: bool,
}

/// Genera todos los horarios válidos (hasta `max_schedules`).
///
/// `courses[i]` son las secciones candidatas del ramo `i`. El único error posible
/// es un `Constraints` mal formado; un problema infactible devuelve una lista vacía.
pub fn search(
    courses: &[Vec<Section>],
    constraints: &Constraints,
    trace_enabled: bool,
) -> Result<SearchOutcome, SchedulerError> {
    run(courses, constraints, trace_enabled, None)
}

/// Igual que `search`, pero revisa `cancel` antes de cada nodo. Quien llama
/// pone la bandera en `true` (p. ej. al vencer un plazo) y la búsqueda termina
/// con `cancelled = true` y los horarios aceptados hasta ese momento.
pub fn search_cancellable(
    courses: &[Vec<Section>],
    constraints: &Constraints,
    trace_enabled: bool,
    cancel: &AtomicBool,
) -> Result<SearchOutcome, SchedulerError> {
    run(courses, constraints, trace_enabled, Some(cancel))
}

fn run(
    courses: &[Vec<Section>],
    constraints: &Constraints,
    trace_enabled: bool,
    cancel: Option<&AtomicBool>,
) -> Result<SearchOutcome, SchedulerError> {
    if trace_enabled {
        let mut trace = SearchTrace::new();
        let (results, stats, cancelled) = run_with_sink(courses, constraints, &mut trace, cancel)?;
        Ok(SearchOutcome { results, stats, trace: Some(trace), cancelled })
    } else {
        let (results, stats, cancelled) = run_with_sink(courses, constraints, &mut NullSink, cancel)?;
        Ok(SearchOutcome { results, stats, trace: None, cancelled })
    }
}

/// Igual que `search` pero con un receptor de traza arbitrario.
pub fn search_with_sink(
    courses: &[Vec<Section>],
    constraints: &Constraints,
    sink: &mut dyn TraceSink,
) -> Result<(Vec<GeneratedSchedule>, SearchStatistics), SchedulerError> {
    let (results, stats, _) = run_with_sink(courses, constraints, sink, None)?;
    Ok((results, stats))
}

fn run_with_sink(
    courses: &[Vec<Section>],
    constraints: &Constraints,
    sink: &mut dyn TraceSink,
    cancel: Option<&AtomicBool>,
) -> Result<(Vec<GeneratedSchedule>, SearchStatistics, bool), SchedulerError> {
    constraints.validate()?;
    let mut stats = SearchStatistics::start();
    info!(
        courses = courses.len(),
        sections = courses.iter().map(Vec::len).sum::<usize>(),
        max_schedules = constraints.max_schedules,
        "[search] iniciando backtracking"
    );

    // Pre-filtro por ramo: sólo secciones viables entran al árbol.
    let mut viable: Vec<Vec<&Section>> = Vec::with_capacity(courses.len());
    for (course_idx, sections) in courses.iter().enumerate() {
        let mut keep = Vec::with_capacity(sections.len());
        for section in sections {
            if is_viable(section, constraints) {
                keep.push(section);
            } else {
                stats.record_viability_prune();
                if sink.enabled() {
                    sink.record(TraceEvent::Prune {
                        reason: PruneReason::Viability,
                        detail: format!("Course {}: Group {}", course_idx, section.group()),
                    });
                }
            }
        }
        viable.push(keep);
    }

    if let Some(empty_idx) = viable.iter().position(Vec::is_empty) {
        debug!(course = empty_idx, "[search] ramo sin secciones viables: problema infactible");
        stats.finish();
        return Ok((Vec::new(), stats, false));
    }

    let mut bt = Backtracker {
        viable,
        constraints,
        stats,
        sink,
        results: Vec::new(),
        selection: Vec::with_capacity(courses.len()),
        cancel,
        cancelled: false,
    };
    bt.descend(0);

    let Backtracker { results, mut stats, cancelled, .. } = bt;
    stats.finish();
    if cancelled {
        warn!(accepted = stats.accepted, nodes = stats.nodes_visited, "[search] cancelada");
    }
    info!(
        accepted = stats.accepted,
        nodes = stats.nodes_visited,
        pruned = stats.total_pruned(),
        elapsed_ms = stats.duration_ms(),
        "[search] terminado"
    );
    Ok((results, stats, cancelled))
}

struct Backtracker<'a, 's> {
    viable: Vec<Vec<&'a Section>>,
    constraints: &'a Constraints,
    stats: SearchStatistics,
    sink: &'s mut dyn TraceSink,
    results: Vec<GeneratedSchedule>,
    selection: Vec<&'a Section>,
    cancel: Option<&'a AtomicBool>,
    cancelled: bool,
}

impl<'a, 's> Backtracker<'a, 's> {
    fn cap_reached(&self) -> bool {
        self.results.len() >= self.constraints.max_schedules
    }

    /// Tope alcanzado o cancelación pedida: no se abre ningún nodo más.
    fn should_stop(&mut self) -> bool {
        if !self.cancelled && self.cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
            self.cancelled = true;
        }
        self.cancelled || self.cap_reached()
    }

    fn descend(&mut self, index: usize) {
        if index == self.viable.len() {
            self.complete();
            return;
        }

        for pos in 0..self.viable[index].len() {
            // corte global: ninguna rama sigue una vez alcanzado el tope
            if self.should_stop() {
                return;
            }
            let candidate = self.viable[index][pos];
            self.stats.record_node();
            if self.sink.enabled() {
                self.sink.record(TraceEvent::Try {
                    course: index,
                    group: candidate.group(),
                    schedule: candidate.schedule().to_string(),
                });
            }

            let clash = self
                .selection
                .iter()
                .copied()
                .find(|prior| conflicts(candidate, prior));
            if let Some(prior) = clash {
                self.stats.record_conflict_prune();
                if self.sink.enabled() {
                    self.sink.record(TraceEvent::Prune {
                        reason: PruneReason::Conflict,
                        detail: format!(
                            "Course {}: Group {} overlaps Group {}",
                            index,
                            candidate.group(),
                            prior.group()
                        ),
                    });
                }
                continue;
            }

            self.selection.push(candidate);
            self.descend(index + 1);
            self.selection.pop();
        }

        if !self.cancelled && !self.cap_reached() {
            self.sink.record(TraceEvent::Exhausted { course: index });
        }
    }

    fn complete(&mut self) {
        if self.should_stop() {
            return;
        }
        let full_count = self.selection.iter().filter(|s| is_at_capacity(s)).count();
        if full_count > self.constraints.max_full_per_schedule {
            self.stats.record_full_limit_prune();
            if self.sink.enabled() {
                self.sink.record(TraceEvent::Prune {
                    reason: PruneReason::FullLimit,
                    detail: format!(
                        "Too many full sections: {} > {}",
                        full_count, self.constraints.max_full_per_schedule
                    ),
                });
            }
            return;
        }

        self.results.push(build_schedule(&self.selection, self.constraints));
        self.stats.record_accepted();
        self.sink.record(TraceEvent::Accept { schedule_index: self.results.len() });
    }
}

/// Arma el `GeneratedSchedule` (con metadatos) para una selección completa.
pub fn build_schedule(selection: &[&Section], constraints: &Constraints) -> GeneratedSchedule {
    let parsed_selections: Vec<_> = selection.iter().filter_map(|s| s.parsed().cloned()).collect();
    let full_count = selection.iter().filter(|s| is_at_capacity(s)).count();
    let latest_end_minute = parsed_selections.iter().map(|p| p.end_minute()).max().unwrap_or(0);
    let has_afternoon_or_later = parsed_selections.iter().any(|p| p.start_minute() >= NOON_MINUTE);

    GeneratedSchedule {
        selections: selection.iter().map(|s| (*s).clone()).collect(),
        parsed_selections,
        meta: ScheduleMeta {
            full_count,
            ends_by_preferred: latest_end_minute <= constraints.latest_minute,
            has_afternoon_or_later,
            latest_end_minute,
        },
    }
}
