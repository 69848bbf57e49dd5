use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use actix_web::{HttpRequest, HttpResponse, Responder, web};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::algorithm::{search_cancellable, verify_feasibility};
use crate::api_json::{
    ConstraintsInput, CourseSummary, GenerateInput, ProblemSource, ScheduleOutput, SolveRequest,
    SolveResponse, courses_from_input,
};
use crate::datafiles::synthetic::generate_problem;
use crate::datafiles::{load_courses, resolve_dataset};
use crate::error::{LoadError, RequestError};
use crate::models::{Constraints, course_options};
use crate::report::{format_results_summary, format_solution_table, format_verification_comparison};
use crate::server::AppState;

/// Filas de la tabla de horarios en el reporte de texto.
const REPORT_MAX_ROWS: usize = 10;

/// Pipeline completo de una petición (bloqueante): cargar, buscar y, si se
/// pidió, verificar. Si `cancel` se activa durante la búsqueda devuelve
/// `RequestError::Cancelled`.
pub fn solve_blocking(
    request: SolveRequest,
    defaults: &Constraints,
    verify_budget: Duration,
    cancel: &AtomicBool,
) -> Result<SolveResponse, RequestError> {
    let constraints = request.effective_constraints(defaults)?;
    let courses = match request.problem_source()? {
        ProblemSource::Inline(inputs) => courses_from_input(inputs),
        ProblemSource::Dataset(name) => load_courses(&resolve_dataset(&name)?)?,
        ProblemSource::Generate(g) => generate_problem(g.config, g.seed).courses,
    };
    let options = course_options(&courses);

    let outcome = search_cancellable(&options, &constraints, request.trace, cancel)?;
    if outcome.cancelled {
        return Err(RequestError::Cancelled);
    }
    let verification = if request.verify {
        Some(verify_feasibility(&options, &constraints, verify_budget)?)
    } else {
        None
    };
    let agreement = verification
        .as_ref()
        .and_then(|v| v.agrees_with_search(!outcome.results.is_empty(), &constraints));
    if agreement == Some(false) {
        warn!(
            found = outcome.results.len(),
            "búsqueda y verificador no coinciden en factibilidad"
        );
    }
    let report = request.report.then(|| {
        let mut text = format_results_summary(&outcome.results, &outcome.stats, courses.len());
        text.push_str(&format_solution_table(&outcome.results, REPORT_MAX_ROWS));
        if let Some(v) = &verification {
            text.push_str(&format_verification_comparison(&outcome.results, &outcome.stats, v, &constraints));
        }
        text
    });

    Ok(SolveResponse {
        timestamp: Utc::now(),
        courses: courses
            .iter()
            .map(|c| CourseSummary { code: c.code.clone(), name: c.name.clone(), sections: c.sections.len() })
            .collect(),
        constraints: (&constraints).into(),
        schedules_count: outcome.results.len(),
        schedules: outcome
            .results
            .iter()
            .enumerate()
            .map(|(i, s)| ScheduleOutput::from_schedule(i + 1, s, &courses))
            .collect(),
        stats: outcome.stats,
        trace: outcome.trace.map(|t| t.lines()),
        verification,
        agreement,
        report,
    })
}

fn error_response(err: &RequestError) -> HttpResponse {
    let body = json!({"error": err.to_string()});
    match err {
        RequestError::Load(LoadError::NotFound(_)) => HttpResponse::NotFound().json(body),
        RequestError::Load(LoadError::Io { .. }) => HttpResponse::InternalServerError().json(body),
        RequestError::Timeout(_) => HttpResponse::GatewayTimeout().json(body),
        RequestError::Cancelled => HttpResponse::ServiceUnavailable().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

/// Corre `solve_blocking` en el pool bloqueante, respetando el semáforo y el
/// plazo `search_timeout`. Al vencer el plazo se cancela la búsqueda, con lo
/// que el hilo termina y libera su permiso.
async fn run_limited(state: &AppState, request: SolveRequest, client: String) -> HttpResponse {
    let permit = match state.semaphore.clone().acquire_owned().await {
        Ok(p) => p,
        Err(_) => return HttpResponse::InternalServerError().json(json!({"error": "failed to acquire semaphore"})),
    };
    let defaults = state.config.default_constraints.clone();
    let budget = state.config.verify_budget;
    let timeout = state.config.search_timeout;
    let cancel = Arc::new(AtomicBool::new(false));
    let start = Instant::now();

    let flag = Arc::clone(&cancel);
    let blocking_handle = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        solve_blocking(request, &defaults, budget, &flag)
    });

    let result = match tokio::time::timeout(timeout, blocking_handle).await {
        Ok(Ok(res)) => res,
        Ok(Err(e)) => return HttpResponse::InternalServerError().json(json!({"error": format!("task join error: {}", e)})),
        Err(_) => {
            cancel.store(true, Ordering::Relaxed);
            Err(RequestError::Timeout(timeout.as_millis() as u64))
        }
    };

    match result {
        Ok(resp) => {
            info!(
                client = %client,
                schedules = resp.schedules_count,
                nodes = resp.stats.nodes_visited,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "/solve"
            );
            HttpResponse::Ok().json(resp)
        }
        Err(e) => {
            warn!(client = %client, error = %e, "/solve rechazado");
            error_response(&e)
        }
    }
}

/// POST /solve
pub async fn solve_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<serde_json::Value>,
) -> impl Responder {
    let request: SolveRequest = match serde_json::from_value(body.into_inner()) {
        Ok(r) => r,
        Err(e) => return HttpResponse::BadRequest().json(json!({"error": format!("failed to parse input: {}", e)})),
    };
    let client = req.connection_info().realip_remote_addr().unwrap_or("unknown").to_string();
    run_limited(&state, request, client).await
}

/// Parámetros de `GET /solve` (versión liviana: sólo `dataset` o `generate`).
#[derive(Debug, Default, Deserialize)]
pub struct SolveQuery {
    pub dataset: Option<String>,
    pub generate: Option<String>,
    pub seed: Option<u64>,
    pub earliest: Option<String>,
    pub latest: Option<String>,
    pub allow_full: Option<bool>,
    pub allow_at_risk: Option<bool>,
    pub max_schedules: Option<usize>,
    pub max_full: Option<usize>,
    #[serde(default)]
    pub trace: bool,
    #[serde(default)]
    pub verify: bool,
    #[serde(default)]
    pub report: bool,
}

impl SolveQuery {
    pub fn into_request(self) -> Result<SolveRequest, LoadError> {
        let generate = match self.generate {
            Some(spec) if !spec.trim().is_empty() => Some(GenerateInput { config: spec.parse()?, seed: self.seed }),
            _ => None,
        };
        Ok(SolveRequest {
            courses: Vec::new(),
            dataset: self.dataset.filter(|d| !d.trim().is_empty()),
            generate,
            constraints: Some(ConstraintsInput {
                earliest_start: self.earliest,
                latest_end: self.latest,
                allow_full: self.allow_full,
                allow_at_risk: self.allow_at_risk,
                max_schedules: self.max_schedules,
                max_full_per_schedule: self.max_full,
            }),
            trace: self.trace,
            verify: self.verify,
            report: self.report,
        })
    }
}

/// GET /solve?dataset=oferta.csv&max_schedules=5
/// GET /solve?generate=small_loose&seed=42&verify=true
pub async fn solve_get_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<SolveQuery>,
) -> impl Responder {
    let request = match query.into_inner().into_request() {
        Ok(r) => r,
        Err(e) => return HttpResponse::BadRequest().json(json!({"error": e.to_string()})),
    };
    let client = req.connection_info().realip_remote_addr().unwrap_or("unknown").to_string();
    run_limited(&state, request, client).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_blocking_generated() {
        let request = SolveRequest {
            generate: Some(GenerateInput { config: "small_loose".parse().unwrap(), seed: Some(42) }),
            constraints: Some(ConstraintsInput { allow_full: Some(true), max_full_per_schedule: Some(5), ..Default::default() }),
            verify: true,
            ..Default::default()
        };
        let cancel = AtomicBool::new(false);
        let resp = solve_blocking(request, &Constraints::default(), Duration::from_secs(5), &cancel).unwrap();
        assert_eq!(resp.courses.len(), 5);
        assert_eq!(resp.schedules_count, resp.schedules.len());
        assert_ne!(resp.agreement, Some(false));
    }

    #[test]
    fn test_solve_blocking_cancelled() {
        let request = SolveRequest {
            dataset: Some("sample_simple.csv".into()),
            ..Default::default()
        };
        let cancel = AtomicBool::new(true);
        let err = solve_blocking(request, &Constraints::default(), Duration::from_secs(5), &cancel).unwrap_err();
        assert!(matches!(err, RequestError::Cancelled));
        assert_eq!(error_response(&err).status(), actix_web::http::StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            error_response(&RequestError::Timeout(10)).status(),
            actix_web::http::StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn test_query_rejects_bad_generate_spec() {
        let q = SolveQuery { generate: Some("giant_loose".into()), ..Default::default() };
        assert!(q.into_request().is_err());
    }
}
