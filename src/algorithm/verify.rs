// verify.rs - Verificador independiente de factibilidad.
//
// No usa el motor de backtracking: arma un grafo de conflictos entre secciones
// viables (petgraph), ordena los ramos por menor cantidad de opciones y busca
// UNA selección válida con forward checking, bajo un presupuesto de tiempo.
// Sirve para contrastar el veredicto de `search` sobre el mismo problema.

use std::time::{Duration, Instant};

use petgraph::graph::{NodeIndex, UnGraph};
use serde::Serialize;
use tracing::{debug, info};

use crate::algorithm::conflict::{conflicts, is_at_capacity, is_viable};
use crate::error::SchedulerError;
use crate::models::{Constraints, Section};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Feasible,
    Infeasible,
    /// Se agotó el presupuesto sin veredicto.
    Unknown,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub status: VerificationStatus,
    pub feasible: bool,
    /// Índice elegido dentro de la lista original de cada ramo.
    pub solution: Option<Vec<usize>>,
    pub nodes: u64,
    pub runtime_ms: f64,
}

impl VerificationReport {
    /// `Some(true)` si coincide con lo que encontró la búsqueda, `None` si no hay veredicto.
    pub fn agrees_with(&self, search_found_any: bool) -> Option<bool> {
        match self.status {
            VerificationStatus::Unknown => None,
            _ => Some(self.feasible == search_found_any),
        }
    }

    /// Como `agrees_with`, pero sin comparación cuando `max_schedules == 0`:
    /// ahí la búsqueda no devuelve horarios aunque el problema sea factible.
    pub fn agrees_with_search(&self, search_found_any: bool, constraints: &Constraints) -> Option<bool> {
        if constraints.max_schedules == 0 {
            return None;
        }
        self.agrees_with(search_found_any)
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    index: usize,
    full: bool,
}

struct Verifier {
    graph: UnGraph<Candidate, ()>,
    domains: Vec<Vec<NodeIndex>>,
    order: Vec<usize>,
    blocked: Vec<u32>,
    chosen: Vec<Option<NodeIndex>>,
    full_used: usize,
    max_full: usize,
    started: Instant,
    budget: Duration,
    timed_out: bool,
    nodes: u64,
}

impl Verifier {
    fn future_domains_alive(&self, from: usize) -> bool {
        self.order[from..]
            .iter()
            .all(|&c| self.domains[c].iter().any(|v| self.blocked[v.index()] == 0))
    }

    fn dfs(&mut self, depth: usize) -> bool {
        if depth == self.order.len() {
            return true;
        }
        if self.started.elapsed() > self.budget {
            self.timed_out = true;
            return false;
        }
        let course = self.order[depth];
        for k in 0..self.domains[course].len() {
            let v = self.domains[course][k];
            if self.blocked[v.index()] > 0 {
                continue;
            }
            let full = self.graph[v].full;
            if full && self.full_used >= self.max_full {
                continue;
            }
            self.nodes += 1;

            let neighbors: Vec<NodeIndex> = self.graph.neighbors(v).collect();
            for u in &neighbors {
                self.blocked[u.index()] += 1;
            }
            if full {
                self.full_used += 1;
            }
            self.chosen[course] = Some(v);

            if self.future_domains_alive(depth + 1) && self.dfs(depth + 1) {
                return true;
            }

            for u in &neighbors {
                self.blocked[u.index()] -= 1;
            }
            if full {
                self.full_used -= 1;
            }
            self.chosen[course] = None;
            if self.timed_out {
                return false;
            }
        }
        false
    }
}

/// Decide si existe al menos un horario válido para `(courses, constraints)`.
///
/// Respeta viabilidad y `max_full_per_schedule`; ignora `max_schedules`
/// (sólo interesa la existencia).
pub fn verify_feasibility(
    courses: &[Vec<Section>],
    constraints: &Constraints,
    budget: Duration,
) -> Result<VerificationReport, SchedulerError> {
    constraints.validate()?;
    let started = Instant::now();

    let mut graph: UnGraph<Candidate, ()> = UnGraph::new_undirected();
    let mut domains: Vec<Vec<NodeIndex>> = vec![Vec::new(); courses.len()];
    for (c, sections) in courses.iter().enumerate() {
        for (i, s) in sections.iter().enumerate() {
            if is_viable(s, constraints) {
                let node = graph.add_node(Candidate { index: i, full: is_at_capacity(s) });
                domains[c].push(node);
            }
        }
    }

    if domains.iter().any(Vec::is_empty) {
        debug!("[verify] ramo sin secciones viables");
        return Ok(VerificationReport {
            status: VerificationStatus::Infeasible,
            feasible: false,
            solution: None,
            nodes: 0,
            runtime_ms: started.elapsed().as_secs_f64() * 1000.0,
        });
    }

    // aristas de conflicto sólo entre ramos distintos
    for a in 0..courses.len() {
        for b in (a + 1)..courses.len() {
            for &na in &domains[a] {
                for &nb in &domains[b] {
                    let sa = &courses[a][graph[na].index];
                    let sb = &courses[b][graph[nb].index];
                    if conflicts(sa, sb) {
                        graph.add_edge(na, nb, ());
                    }
                }
            }
        }
    }
    debug!(nodes = graph.node_count(), edges = graph.edge_count(), "[verify] grafo de conflictos");

    let mut order: Vec<usize> = (0..courses.len()).collect();
    order.sort_by_key(|&c| (domains[c].len(), c));

    let node_count = graph.node_count();
    let mut verifier = Verifier {
        graph,
        domains,
        order,
        blocked: vec![0; node_count],
        chosen: vec![None; courses.len()],
        full_used: 0,
        max_full: constraints.max_full_per_schedule,
        started,
        budget,
        timed_out: false,
        nodes: 0,
    };

    let found = verifier.dfs(0);
    let status = if found {
        VerificationStatus::Feasible
    } else if verifier.timed_out {
        VerificationStatus::Unknown
    } else {
        VerificationStatus::Infeasible
    };
    let solution = found.then(|| {
        verifier
            .chosen
            .iter()
            .map(|v| v.map(|n| verifier.graph[n].index).unwrap_or_default())
            .collect()
    });

    let runtime_ms = started.elapsed().as_secs_f64() * 1000.0;
    info!(?status, nodes = verifier.nodes, runtime_ms, "[verify] terminado");
    Ok(VerificationReport { status, feasible: found, solution, nodes: verifier.nodes, runtime_ms })
}
